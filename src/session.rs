use std::fmt;
use std::io::{self, Write};

use crate::config::Config;
use crate::editor::LineEditor;
use crate::error::LaunchError;
use crate::job::JobSet;

/// Everything that outlives a single input line, for one interactive run.
pub struct Session {
	pub config: Config,
	/// Owns the single-line history and any pending completion seed.
	pub editor: LineEditor,
	pub jobs: JobSet,
	diagnostics: Box<dyn Write>,
}

impl Session {
	pub fn new(config: Config) -> Session {
		Session::with_diagnostics(config, Box::new(io::stderr()))
	}

	/// Same as `new`, with shell diagnostics going to `sink`.
	pub fn with_diagnostics(config: Config, sink: Box<dyn Write>) -> Session {
		let editor = LineEditor::new(config.line_capacity);
		Session { config: config, editor: editor, jobs: JobSet::new(), diagnostics: sink }
	}

	fn emit(&mut self, line: fmt::Arguments) {
		if let Err(e) = writeln!(self.diagnostics, "-{}: {}", self.config.name, line) {
			log::debug!("diagnostic lost: {}", e);
		}
	}

	/// `-<shell>: <stage>: <message>`
	pub fn diagnostic<D: fmt::Display>(&mut self, stage: &str, message: D) {
		self.emit(format_args!("{}: {}", stage, message));
	}

	pub fn report(&mut self, e: &LaunchError) {
		self.emit(format_args!("{}", e));
	}
}
