use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::env;

use crate::error::ExecError;
use crate::eval::{self, Eval};
use crate::session::Session;
use crate::types::{Pipeline, Stage};

const SHORT_FILE: &str = "shorttxt";

/// `alias:directory` records, one per line, appended in creation order.
pub struct Shortcuts {
	path: PathBuf,
}

impl Shortcuts {
	pub fn new(data_dir: &Path) -> Shortcuts {
		Shortcuts { path: data_dir.join(SHORT_FILE) }
	}

	/// Appends a record and returns it as written (without the newline).
	pub fn set(&self, alias: &str, dir: &Path) -> io::Result<String> {
		let record = format!("{}:{}", alias, dir.display());
		let mut file = OpenOptions::new().append(true).create(true).open(&self.path)?;
		writeln!(file, "{}", record)?;
		Ok(record)
	}

	/// The first record for `alias`. A missing store holds no aliases.
	pub fn lookup(&self, alias: &str) -> io::Result<Option<PathBuf>> {
		let content = match fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e),
		};
		Ok(content.lines()
			.filter_map(|line| line.split_once(':'))
			.find(|&(name, _)| name == alias)
			.map(|(_, dir)| PathBuf::from(dir)))
	}
}

fn usage() -> Eval {
	println!("Usage: short set|jump <alias>");
	Eval::Done(2)
}

pub fn builtin_short(session: &mut Session, args: &[String], background: bool) -> Eval {
	let shortcuts = Shortcuts::new(&session.config.data_dir);
	let (command, alias) = match (args.first(), args.get(1)) {
		(Some(command), Some(alias)) => (command.as_str(), alias.as_str()),
		_ => return usage(),
	};
	match command {
		"set" => {
			if alias.is_empty() || alias.contains(':') {
				println!("Invalid alias");
				return Eval::Done(1);
			}
			let cwd = match env::current_dir() {
				Ok(cwd) => cwd,
				Err(e) => {
					session.diagnostic("short", ExecError::from(e));
					return Eval::Done(1);
				},
			};
			match shortcuts.set(alias, &cwd) {
				Ok(record) => {
					println!("{} set", record);
					Eval::Done(0)
				},
				Err(e) => {
					session.diagnostic("short", ExecError::from(e));
					Eval::Done(1)
				},
			}
		},
		"jump" => match shortcuts.lookup(alias) {
			Ok(Some(dir)) => {
				// goes through the regular path so `cd` runs in this process
				let mut cd = Stage::new("cd", vec![dir.to_string_lossy().into_owned()]);
				cd.background = background;
				eval::execute(session, &Pipeline::single(cd))
			},
			Ok(None) => {
				println!("Invalid alias");
				Eval::Done(1)
			},
			Err(e) => {
				session.diagnostic("short", ExecError::from(e));
				Eval::Done(1)
			},
		},
		_ => {
			println!("Invalid Command");
			Eval::Done(2)
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn set_then_lookup() {
		let dir = tempfile::tempdir().unwrap();
		let store = Shortcuts::new(dir.path());
		assert_eq!(store.lookup("home").unwrap(), None);
		let record = store.set("home", Path::new("/home/alice")).unwrap();
		assert_eq!(record, "home:/home/alice");
		store.set("tmp", Path::new("/tmp")).unwrap();
		assert_eq!(store.lookup("home").unwrap(), Some(PathBuf::from("/home/alice")));
		assert_eq!(store.lookup("tmp").unwrap(), Some(PathBuf::from("/tmp")));
		assert_eq!(store.lookup("ho").unwrap(), None);
	}

	#[test]
	fn first_record_wins() {
		let dir = tempfile::tempdir().unwrap();
		let store = Shortcuts::new(dir.path());
		store.set("x", Path::new("/first")).unwrap();
		store.set("x", Path::new("/second")).unwrap();
		assert_eq!(store.lookup("x").unwrap(), Some(PathBuf::from("/first")));
		let content = fs::read_to_string(dir.path().join("shorttxt")).unwrap();
		assert_eq!(content, "x:/first\nx:/second\n");
	}

	#[test]
	fn directories_with_colons_survive() {
		let dir = tempfile::tempdir().unwrap();
		let store = Shortcuts::new(dir.path());
		store.set("odd", Path::new("/a:b")).unwrap();
		assert_eq!(store.lookup("odd").unwrap(), Some(PathBuf::from("/a:b")));
	}
}
