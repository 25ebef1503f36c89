use std::fs;
use std::io;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Input, Output, Append }

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Redirect {
	pub target: String,
	pub typ: RedirectType,
}

impl Redirect {
	pub fn new(typ: RedirectType, target: &str) -> Redirect {
		Redirect { target: target.to_string(), typ: typ }
	}

	/// Opens the target with close-on-exec set, as std does for every file.
	pub fn open(&self) -> io::Result<fs::File> {
		let mut oopt = fs::OpenOptions::new();
		let _ = match self.typ {
			RedirectType::Input => oopt.read(true),
			RedirectType::Output => oopt.write(true).create(true).truncate(true),
			RedirectType::Append => oopt.append(true).create(true),
		};
		oopt.open(&self.target)
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Stage {
	pub name: String,
	pub arguments: Vec<String>,
	pub input: Option<Redirect>,
	/// Either `Output` or `Append`; the first one scanned wins.
	pub output: Option<Redirect>,
	pub background: bool,
	pub needs_completion: bool,
}

impl Stage {
	pub fn new(name: &str, arguments: Vec<String>) -> Stage {
		Stage { name: name.to_string(), arguments: arguments, ..Stage::default() }
	}

	pub fn redirect_in(&self) -> Option<&str> {
		self.input.as_ref().map(|r| r.target.as_str())
	}

	pub fn redirect_out(&self) -> Option<&str> {
		self.output.as_ref().filter(|r| r.typ == RedirectType::Output).map(|r| r.target.as_str())
	}

	pub fn redirect_append(&self) -> Option<&str> {
		self.output.as_ref().filter(|r| r.typ == RedirectType::Append).map(|r| r.target.as_str())
	}
}

/// Stages in left-to-right order. Never empty.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline {
	pub stages: Vec<Stage>,
}

impl Pipeline {
	pub fn single(stage: Stage) -> Pipeline {
		Pipeline { stages: vec![stage] }
	}

	pub fn head(&self) -> &Stage {
		&self.stages[0]
	}

	pub fn last(&self) -> &Stage {
		&self.stages[self.stages.len() - 1]
	}

	/// Only the final stage's marker counts.
	pub fn is_background(&self) -> bool {
		self.last().background
	}

	pub fn needs_completion(&self) -> bool {
		self.head().needs_completion
	}

	pub fn set_background(&mut self, background: bool) {
		let len = self.stages.len();
		self.stages[len - 1].background = background;
	}
}
