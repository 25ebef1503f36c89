use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::ExecError;
use crate::eval::{self, Eval};
use crate::parser;
use crate::session::Session;

const BOOKMARK_FILE: &str = "bookmarktxt";

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Bookmark {
	pub index: usize,
	pub command: String,
}

impl Bookmark {
	/// `<index> "<command>"`
	fn parse(line: &str) -> Option<Bookmark> {
		let (index, command) = line.split_once(' ')?;
		let index = index.parse().ok()?;
		let command = command.strip_prefix('"').and_then(|c| c.strip_suffix('"')).unwrap_or(command);
		Some(Bookmark { index: index, command: command.to_string() })
	}

	fn record(&self) -> String {
		format!("{} \"{}\"", self.index, self.command)
	}
}

pub struct Bookmarks {
	path: PathBuf,
}

impl Bookmarks {
	pub fn new(data_dir: &Path) -> Bookmarks {
		Bookmarks { path: data_dir.join(BOOKMARK_FILE) }
	}

	/// Stored bookmarks in file order; a missing store is empty.
	pub fn load(&self) -> io::Result<Vec<Bookmark>> {
		match fs::read_to_string(&self.path) {
			Ok(content) => Ok(content.lines().filter_map(Bookmark::parse).collect()),
			Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(vec![]),
			Err(e) => Err(e),
		}
	}

	/// Stores `command` unless it is already there. Returns the new index.
	pub fn save(&self, command: &str) -> io::Result<Option<usize>> {
		let bookmarks = self.load()?;
		if bookmarks.iter().any(|b| b.command == command) {
			return Ok(None);
		}
		let index = bookmarks.iter().map(|b| b.index + 1).max().unwrap_or(0);
		let bookmark = Bookmark { index: index, command: command.to_string() };
		let mut file = fs::OpenOptions::new().append(true).create(true).open(&self.path)?;
		writeln!(file, "{}", bookmark.record())?;
		Ok(Some(index))
	}

	pub fn get(&self, index: usize) -> io::Result<Option<Bookmark>> {
		Ok(self.load()?.into_iter().find(|b| b.index == index))
	}

	/// Rewrites the store without `index`; false if it was not there.
	pub fn remove(&self, index: usize) -> io::Result<bool> {
		let bookmarks = self.load()?;
		let kept: Vec<&Bookmark> = bookmarks.iter().filter(|b| b.index != index).collect();
		if kept.len() == bookmarks.len() {
			return Ok(false);
		}
		let mut content = String::new();
		for b in kept {
			content.push_str(&b.record());
			content.push('\n');
		}
		let tmp = self.path.with_extension("tmp");
		fs::write(&tmp, content)?;
		fs::rename(&tmp, &self.path)?;
		Ok(true)
	}
}

fn parse_index(arg: Option<&String>) -> Option<usize> {
	arg.and_then(|s| s.parse().ok())
}

pub fn builtin_bookmark(session: &mut Session, args: &[String], background: bool) -> Eval {
	let bookmarks = Bookmarks::new(&session.config.data_dir);
	let r = match args.first().map(|s| s.as_str()) {
		None => {
			println!("Usage: bookmark <command> | -l | -d <index> | -i <index>");
			return Eval::Done(2);
		},
		Some("-l") => bookmarks.load().map(|all| {
			for b in all {
				println!("{}", b.record());
			}
			Eval::Done(0)
		}),
		Some("-d") => match parse_index(args.get(1)) {
			None => {
				println!("Usage: bookmark -d <index>");
				return Eval::Done(2);
			},
			Some(index) => bookmarks.remove(index).map(|found| {
				if found {
					Eval::Done(0)
				} else {
					println!("No bookmark {}", index);
					Eval::Done(1)
				}
			}),
		},
		Some("-i") => match parse_index(args.get(1)) {
			None => {
				println!("Usage: bookmark -i <index>");
				return Eval::Done(2);
			},
			Some(index) => match bookmarks.load() {
				Ok(ref all) if all.is_empty() => {
					println!("No bookmarks exist");
					Ok(Eval::Done(1))
				},
				Ok(_) => bookmarks.get(index).map(|found| match found {
					Some(b) => {
						let mut pipeline = parser::parse(&b.command);
						if background {
							pipeline.set_background(true);
						}
						eval::execute(session, &pipeline)
					},
					None => {
						println!("No bookmark {}", index);
						Eval::Done(1)
					},
				}),
				Err(e) => Err(e),
			},
		},
		Some(_) => {
			let command = args.join(" ");
			if parser::parse(&command).head().name == "bookmark" {
				println!("Illegal use of bookmark in bookmark");
				return Eval::Done(1);
			}
			bookmarks.save(&command).map(|saved| {
				if let Some(index) = saved {
					log::debug!("bookmarked {:?} as {}", command, index);
				}
				Eval::Done(0)
			})
		},
	};
	r.unwrap_or_else(|e| {
		session.diagnostic("bookmark", ExecError::from(e));
		Eval::Done(1)
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn save_assigns_increasing_indices_and_skips_duplicates() {
		let dir = tempfile::tempdir().unwrap();
		let store = Bookmarks::new(dir.path());
		assert_eq!(store.save("ls -la").unwrap(), Some(0));
		assert_eq!(store.save("echo hi").unwrap(), Some(1));
		assert_eq!(store.save("ls -la").unwrap(), None);
		let content = fs::read_to_string(dir.path().join("bookmarktxt")).unwrap();
		assert_eq!(content, "0 \"ls -la\"\n1 \"echo hi\"\n");
	}

	#[test]
	fn remove_keeps_other_indices() {
		let dir = tempfile::tempdir().unwrap();
		let store = Bookmarks::new(dir.path());
		store.save("a").unwrap();
		store.save("b").unwrap();
		store.save("c").unwrap();
		assert!(store.remove(1).unwrap());
		assert!(!store.remove(1).unwrap());
		let left: Vec<usize> = store.load().unwrap().iter().map(|b| b.index).collect();
		assert_eq!(left, vec![0, 2]);
		assert_eq!(store.save("d").unwrap(), Some(3));
		assert_eq!(store.get(2).unwrap().map(|b| b.command), Some("c".to_string()));
	}

	#[test]
	fn missing_store_is_empty() {
		let dir = tempfile::tempdir().unwrap();
		let store = Bookmarks::new(dir.path());
		assert!(store.load().unwrap().is_empty());
		assert_eq!(store.get(0).unwrap(), None);
		assert!(!store.remove(0).unwrap());
	}

	#[test]
	fn record_parsing_tolerates_garbage() {
		assert_eq!(Bookmark::parse("3 \"echo \"x\"\""), Some(Bookmark { index: 3, command: "echo \"x\"".to_string() }));
		assert_eq!(Bookmark::parse("x \"ls\""), None);
		assert_eq!(Bookmark::parse(""), None);
	}
}
