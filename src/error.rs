use std::{ffi, io};

use nix::errno::Errno;
use thiserror::Error;

/// strerror-style text, without the "(os error N)" suffix std appends.
fn describe_io(e: &io::Error) -> String {
	match e.raw_os_error() {
		Some(code) => Errno::from_raw(code).desc().to_string(),
		None => e.to_string(),
	}
}

#[derive(Debug, Error)]
pub enum ExecError {
	#[error("{}", .0.desc())]
	Nix(#[from] Errno),
	#[error("{}", describe_io(.0))]
	Io(#[from] io::Error),
	#[error("argument contains a nul byte")]
	Nul(#[from] ffi::NulError),
	#[error("command not found")]
	NotFound,
}

/// A launch failure attributed to the stage that caused it.
#[derive(Debug, Error)]
#[error("{stage}: {source}")]
pub struct LaunchError {
	pub stage: String,
	pub source: ExecError,
}

impl LaunchError {
	pub fn new<E: Into<ExecError>>(stage: &str, e: E) -> LaunchError {
		LaunchError { stage: stage.to_string(), source: e.into() }
	}
}
