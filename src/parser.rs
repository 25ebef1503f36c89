use crate::types::*;

struct Parser<'a> {
	line: &'a str,
	i: usize,
}

impl<'a> Parser<'a> {
	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(c) = self.line.as_bytes().get(self.i) {
			if !f(*c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		match c {
			b' ' | b'\t' => true,
			_ => false,
		}
	}

	fn is_quote(c: u8) -> bool {
		c == b'"' || c == b'\''
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Parser::is_whitespace);
	}

	/// Reads up to the next unquoted delimiter. Token boundaries always sit on
	/// ASCII bytes, so the slice stays valid UTF-8.
	fn read_word(&mut self) -> Option<&'a str> {
		self.skip_whitespaces();
		let orig = self.i;
		let mut quote: Option<u8> = None;
		while let Some(&c) = self.line.as_bytes().get(self.i) {
			match quote {
				Some(q) => if c == q { quote = None; },
				None => if Parser::is_whitespace(c) {
					break;
				} else if Parser::is_quote(c) {
					quote = Some(c);
				},
			}
			self.i += 1;
		}
		if orig == self.i { None } else { Some(&self.line[orig .. self.i]) }
	}

	fn read_words(&mut self) -> Vec<&'a str> {
		let mut words = vec![];
		while let Some(word) = self.read_word() {
			words.push(word);
		}
		words
	}
}

fn trim(text: &str) -> &str {
	text.trim_matches(|c| c == ' ' || c == '\t')
}

fn unquote(word: &str) -> &str {
	let bytes = word.as_bytes();
	let len = bytes.len();
	if len >= 2 && Parser::is_quote(bytes[0]) && bytes[0] == bytes[len - 1] {
		&word[1 .. len - 1]
	} else {
		word
	}
}

fn redirect_marker(word: &str) -> Option<(RedirectType, &str)> {
	if let Some(target) = word.strip_prefix(">>") {
		Some((RedirectType::Append, target))
	} else if let Some(target) = word.strip_prefix('>') {
		Some((RedirectType::Output, target))
	} else if let Some(target) = word.strip_prefix('<') {
		Some((RedirectType::Input, target))
	} else {
		None
	}
}

/// Builds one stage from `words`, returning the words after a `|` if any.
fn parse_stage<'w, 'a>(words: &'w [&'a str]) -> (Stage, &'w [&'a str]) {
	let mut stage = Stage::default();
	let name = match words.first() {
		Some(name) => name,
		None => return (stage, &[]),
	};
	stage.name = name.to_string();

	let mut i = 1;
	while i < words.len() {
		let word = words[i];
		i += 1;
		match word {
			"|" => return (stage, &words[i ..]),
			"&" => continue,
			_ => {},
		}
		if let Some((typ, target)) = redirect_marker(word) {
			let target = if target.is_empty() {
				match words.get(i) {
					Some(&next) if next != "|" && next != "&" => { i += 1; next },
					_ => "",
				}
			} else {
				target
			};
			let slot = match typ {
				RedirectType::Input => &mut stage.input,
				RedirectType::Output | RedirectType::Append => &mut stage.output,
			};
			if slot.is_none() {
				*slot = Some(Redirect::new(typ, unquote(target)));
			}
			continue;
		}
		stage.arguments.push(unquote(word).to_string());
	}
	(stage, &[])
}

/// Turns one input line into a pipeline. Total: every input yields at least one
/// stage, possibly with an empty name.
pub fn parse(line: &str) -> Pipeline {
	let mut text = trim(line);
	let mut needs_completion = false;
	let mut background = false;
	if let Some(rest) = text.strip_suffix('?') {
		needs_completion = true;
		text = trim(rest);
	} else if let Some(rest) = text.strip_suffix('&') {
		background = true;
		text = trim(rest);
	}

	let mut parser = Parser { line: text, i: 0 };
	let words = parser.read_words();

	let mut stages = vec![];
	let mut rest = &words[..];
	loop {
		let (stage, next) = parse_stage(rest);
		stages.push(stage);
		if next.is_empty() { break; }
		rest = next;
	}

	let mut pipeline = Pipeline { stages: stages };
	pipeline.stages[0].needs_completion = needs_completion;
	pipeline.set_background(background);
	pipeline
}

#[cfg(test)]
mod tests {
	use super::*;

	fn args(stage: &Stage) -> Vec<&str> {
		stage.arguments.iter().map(|s| s.as_str()).collect()
	}

	#[test]
	fn whitespace_only_is_one_empty_stage() {
		for line in &["", " ", "\t \t", "   "] {
			let p = parse(line);
			assert_eq!(p.stages.len(), 1);
			assert_eq!(p.head().name, "");
			assert!(p.head().arguments.is_empty());
			assert!(!p.is_background());
		}
	}

	#[test]
	fn name_and_arguments() {
		let p = parse("  ls   -l\t\t-a  /tmp ");
		assert_eq!(p.stages.len(), 1);
		assert_eq!(p.head().name, "ls");
		assert_eq!(args(p.head()), vec!["-l", "-a", "/tmp"]);
	}

	#[test]
	fn quoted_arguments() {
		let p = parse("echo \"a b\"");
		assert_eq!(args(p.head()), vec!["a b"]);
		let p = parse("echo 'x'");
		assert_eq!(args(p.head()), vec!["x"]);
		let p = parse("echo '' \"it's\" a\"b c\"d");
		assert_eq!(args(p.head()), vec!["", "it's", "a\"b c\"d"]);
	}

	#[test]
	fn unterminated_quote_is_kept() {
		let p = parse("echo 'a b");
		assert_eq!(args(p.head()), vec!["'a b"]);
	}

	#[test]
	fn redirects_attached_and_separate() {
		let p = parse("sort < in.txt > out.txt");
		assert_eq!(p.head().redirect_in(), Some("in.txt"));
		assert_eq!(p.head().redirect_out(), Some("out.txt"));
		assert_eq!(p.head().redirect_append(), None);
		assert!(p.head().arguments.is_empty());

		let p = parse("sort <in.txt >>out.txt -r");
		assert_eq!(p.head().redirect_in(), Some("in.txt"));
		assert_eq!(p.head().redirect_append(), Some("out.txt"));
		assert_eq!(p.head().redirect_out(), None);
		assert_eq!(args(p.head()), vec!["-r"]);
	}

	#[test]
	fn first_output_redirect_wins() {
		let p = parse("cmd > a >> b");
		assert_eq!(p.head().redirect_out(), Some("a"));
		assert_eq!(p.head().redirect_append(), None);
		let p = parse("cmd >>b >a <x <y");
		assert_eq!(p.head().redirect_append(), Some("b"));
		assert_eq!(p.head().redirect_out(), None);
		assert_eq!(p.head().redirect_in(), Some("x"));
	}

	#[test]
	fn dangling_redirect_records_empty_path() {
		let p = parse("cat <");
		assert_eq!(p.head().redirect_in(), Some(""));
		let p = parse("cat > | wc");
		assert_eq!(p.head().redirect_out(), Some(""));
		assert_eq!(p.stages.len(), 2);
		assert_eq!(p.stages[1].name, "wc");
	}

	#[test]
	fn pipeline_stages_in_order() {
		let p = parse("cat file | grep -v x | wc -l");
		let names: Vec<&str> = p.stages.iter().map(|s| s.name.as_str()).collect();
		assert_eq!(names, vec!["cat", "grep", "wc"]);
		assert_eq!(args(&p.stages[1]), vec!["-v", "x"]);
		assert_eq!(args(&p.stages[2]), vec!["-l"]);
	}

	#[test]
	fn pipe_with_redirects_on_ends() {
		let p = parse("a < in | b > out");
		assert_eq!(p.stages.len(), 2);
		assert_eq!(p.stages[0].redirect_in(), Some("in"));
		assert_eq!(p.stages[0].output, None);
		assert_eq!(p.stages[1].input, None);
		assert_eq!(p.stages[1].redirect_out(), Some("out"));
	}

	#[test]
	fn dangling_pipe_has_no_successor() {
		let p = parse("ls |");
		assert_eq!(p.stages.len(), 1);
		assert_eq!(p.head().name, "ls");
		assert!(p.head().arguments.is_empty());
	}

	#[test]
	fn background_goes_on_last_stage() {
		let p = parse("sleep 5 | cat &");
		assert!(p.is_background());
		assert!(!p.stages[0].background);
		assert!(p.stages[1].background);
		assert!(p.stages[1].arguments.is_empty());

		let p = parse("sleep 5&");
		assert!(p.is_background());
		assert_eq!(args(p.head()), vec!["5"]);
	}

	#[test]
	fn stray_ampersand_is_skipped() {
		let p = parse("a & | b");
		assert!(!p.is_background());
		assert!(p.stages[0].arguments.is_empty());
	}

	#[test]
	fn completion_marker_is_consumed() {
		let p = parse("ls?");
		assert!(p.needs_completion());
		assert_eq!(p.head().name, "ls");

		let p = parse("cat fi?");
		assert!(p.needs_completion());
		assert_eq!(args(p.head()), vec!["fi"]);
	}

	#[test]
	fn completion_marker_wins_over_background() {
		let p = parse("sleep 1 &?");
		assert!(p.needs_completion());
		assert!(!p.is_background());
		assert_eq!(args(p.head()), vec!["1"]);
	}

	#[test]
	fn quoted_pipe_is_an_argument() {
		let p = parse("echo '|' x");
		assert_eq!(p.stages.len(), 1);
		assert_eq!(args(p.head()), vec!["|", "x"]);
	}

	#[test]
	fn non_ascii_text_survives() {
		let p = parse("echo héllo \"wörld x\"");
		assert_eq!(args(p.head()), vec!["héllo", "wörld x"]);
	}
}
