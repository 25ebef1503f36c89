use std::fs;
use std::path::Path;

use crate::builtin;
use crate::editor::COMPLETION_MARKER;
use crate::search;

#[derive(Debug, PartialEq, Eq)]
pub struct Completion {
	/// The line with its last word completed as far as it is unambiguous.
	pub line: String,
	pub candidates: Vec<String>,
}

fn is_delimiter(c: char) -> bool {
	c == ' ' || c == '\t'
}

fn common_prefix(candidates: &[String]) -> String {
	let first = match candidates.first() {
		Some(first) => first,
		None => return String::new(),
	};
	let mut len = first.len();
	for c in &candidates[1 ..] {
		len = first.char_indices()
			.zip(c.chars())
			.take_while(|&((_, a), b)| a == b)
			.last()
			.map_or(0, |((i, a), _)| i + a.len_utf8())
			.min(len);
	}
	first[.. len].to_string()
}

/// Entries of the word's directory that start with its file-name part.
fn complete_file(word: &str) -> Vec<String> {
	let (dir_part, prefix) = match word.rfind('/') {
		Some(i) => (&word[.. i + 1], &word[i + 1 ..]),
		None => ("", word),
	};
	let dir = if dir_part.is_empty() { Path::new(".") } else { Path::new(dir_part) };
	let entries = match fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(_) => return vec![],
	};
	entries.filter_map(|e| e.ok())
		.filter_map(|e| {
			let name = e.file_name().to_string_lossy().into_owned();
			if !name.starts_with(prefix) || (name.starts_with('.') && !prefix.starts_with('.')) {
				return None;
			}
			let slash = if e.path().is_dir() { "/" } else { "" };
			Some(format!("{}{}{}", dir_part, name, slash))
		})
		.collect()
}

/// Completes `line` (as returned by the editor, marker included) using
/// `commands` to list executables for a prefix.
pub fn complete_with<F>(line: &str, commands: F) -> Completion where F: Fn(&str) -> Vec<String> {
	let text = line.strip_suffix(COMPLETION_MARKER as char).unwrap_or(line);
	let word_start = text.rfind(is_delimiter).map_or(0, |i| i + 1);
	let (before, word) = text.split_at(word_start);
	let previous = before.split(is_delimiter).filter(|w| !w.is_empty()).last();
	let command_position = previous.map_or(true, |w| w == "|") && !word.contains('/');

	let mut candidates: Vec<String> = if command_position {
		builtin::NAMES.iter()
			.filter(|name| name.starts_with(word))
			.map(|name| name.to_string())
			.chain(commands(word))
			.collect()
	} else {
		complete_file(word)
	};
	candidates.sort();
	candidates.dedup();

	let completed = match candidates.len() {
		0 => word.to_string(),
		1 if candidates[0].ends_with('/') => candidates[0].clone(),
		1 => format!("{} ", candidates[0]),
		_ => common_prefix(&candidates),
	};
	Completion { line: format!("{}{}", before, completed), candidates: candidates }
}

pub fn complete(line: &str) -> Completion {
	complete_with(line, search::executables_with_prefix)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs::File;

	fn commands(prefix: &str) -> Vec<String> {
		["grep", "gzip", "ls", "less"].iter()
			.filter(|c| c.starts_with(prefix))
			.map(|c| c.to_string())
			.collect()
	}

	#[test]
	fn single_command_gets_a_space() {
		let c = complete_with("gr?", commands);
		assert_eq!(c.candidates, vec!["grep"]);
		assert_eq!(c.line, "grep ");
	}

	#[test]
	fn ambiguous_command_extends_to_common_prefix() {
		let c = complete_with("l?", commands);
		assert_eq!(c.candidates, vec!["less", "ls"]);
		assert_eq!(c.line, "l");
		let c = complete_with("g?", commands);
		assert_eq!(c.line, "g");
	}

	#[test]
	fn builtins_are_candidates() {
		let c = complete_with("boo?", commands);
		assert_eq!(c.candidates, vec!["bookmark"]);
		assert_eq!(c.line, "bookmark ");
	}

	#[test]
	fn command_position_after_pipe() {
		let c = complete_with("cat x | gz?", commands);
		assert_eq!(c.line, "cat x | gzip ");
	}

	#[test]
	fn no_match_leaves_line() {
		let c = complete_with("zzz?", commands);
		assert!(c.candidates.is_empty());
		assert_eq!(c.line, "zzz");
	}

	#[test]
	fn file_arguments() {
		let dir = tempfile::tempdir().unwrap();
		File::create(dir.path().join("notes.txt")).unwrap();
		File::create(dir.path().join("notebook.md")).unwrap();
		File::create(dir.path().join(".hidden")).unwrap();
		fs::create_dir(dir.path().join("nested")).unwrap();
		let base = dir.path().to_str().unwrap();

		let c = complete_with(&format!("cat {}/note?", base), commands);
		assert_eq!(c.candidates, vec![format!("{}/notebook.md", base), format!("{}/notes.txt", base)]);
		assert_eq!(c.line, format!("cat {}/note", base));

		let c = complete_with(&format!("cat {}/nes?", base), commands);
		assert_eq!(c.line, format!("cat {}/nested/", base));

		let c = complete_with(&format!("cat {}/?", base), commands);
		assert_eq!(c.candidates.len(), 3);

		let c = complete_with(&format!("cat {}/.h?", base), commands);
		assert_eq!(c.line, format!("cat {}/.hidden ", base));
	}

	#[test]
	fn common_prefix_respects_char_boundaries() {
		let v = vec!["héllo".to_string(), "hélp".to_string()];
		assert_eq!(common_prefix(&v), "hél");
		let v = vec!["abc".to_string(), "xyz".to_string()];
		assert_eq!(common_prefix(&v), "");
	}
}
