use std::ffi::CString;
use std::fs::File;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStringExt;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::unistd::{self, ForkResult};

use crate::builtin;
use crate::error::{ExecError, LaunchError};
use crate::job;
use crate::search;
use crate::session::Session;
use crate::types::{Pipeline, Stage};

pub const STATUS_NOT_FOUND: u8 = 127;
pub const STATUS_NOT_EXECUTABLE: u8 = 126;

#[derive(Debug, PartialEq, Eq)]
pub enum Eval {
	/// Ran in the foreground (or as a builtin) with this status.
	Done(u8),
	/// Left running in the background.
	Detached,
	/// `exit` was requested.
	Exit,
}

/// A stage with everything resolved and opened, so that the forked child
/// only has to wire descriptors and call `execv`.
struct Launch {
	name: String,
	path: CString,
	/// Owns the strings `argv_ptrs` points into.
	#[allow(dead_code)]
	argv: Vec<CString>,
	/// NULL-terminated pointers into `argv`.
	argv_ptrs: Vec<*const libc::c_char>,
	input: Option<File>,
	output: Option<File>,
	/// `-<shell>: <name>: `, written ahead of the errno text on exec failure.
	failure_prefix: Vec<u8>,
}

/// `first`/`last` tell whether the stage sits at an end of the pipeline;
/// redirects on a side taken over by a pipe are not opened.
fn prepare(shell_name: &str, stage: &Stage, first: bool, last: bool) -> Result<Launch, LaunchError> {
	let err = |e: ExecError| LaunchError::new(&stage.name, e);

	let path = search::resolve(&stage.name).ok_or_else(|| err(ExecError::NotFound))?;
	let path = CString::new(path.into_os_string().into_vec()).map_err(|e| err(e.into()))?;

	log::debug!("{} -> {:?} <{:?} >{:?} >>{:?}", stage.name, path, stage.redirect_in(), stage.redirect_out(), stage.redirect_append());

	let mut argv = Vec::with_capacity(stage.arguments.len() + 1);
	argv.push(CString::new(stage.name.as_str()).map_err(|e| err(e.into()))?);
	for arg in &stage.arguments {
		argv.push(CString::new(arg.as_str()).map_err(|e| err(e.into()))?);
	}
	let mut argv_ptrs: Vec<*const libc::c_char> = argv.iter().map(|a| a.as_ptr()).collect();
	argv_ptrs.push(std::ptr::null());

	let input = match stage.input {
		Some(ref r) if first => Some(r.open().map_err(|e| err(e.into()))?),
		Some(ref r) => {
			log::debug!("{}: pipe replaces <{}", stage.name, r.target);
			None
		},
		None => None,
	};
	let output = match stage.output {
		Some(ref r) if last => Some(r.open().map_err(|e| err(e.into()))?),
		Some(ref r) => {
			log::debug!("{}: pipe replaces >{}", stage.name, r.target);
			None
		},
		None => None,
	};

	Ok(Launch {
		name: stage.name.clone(),
		path: path,
		argv: argv,
		argv_ptrs: argv_ptrs,
		input: input,
		output: output,
		failure_prefix: format!("-{}: {}: ", shell_name, stage.name).into_bytes(),
	})
}

fn write_stderr(bytes: &[u8]) {
	unsafe {
		libc::write(libc::STDERR_FILENO, bytes.as_ptr() as *const libc::c_void, bytes.len());
	}
}

/// Child side after a failed `dup2`/`execv`. Allocation-free.
fn exit_child(launch: &Launch, e: Errno) -> ! {
	write_stderr(&launch.failure_prefix);
	write_stderr(e.desc().as_bytes());
	write_stderr(b"\n");
	unsafe { libc::_exit(STATUS_NOT_EXECUTABLE as libc::c_int) }
}

fn exec_stage(launch: &Launch, stdin: Option<RawFd>, stdout: Option<RawFd>, unused: Option<RawFd>) -> ! {
	if let Some(fd) = unused {
		let _ = unistd::close(fd);
	}
	for &(from, to) in &[(stdin, libc::STDIN_FILENO), (stdout, libc::STDOUT_FILENO)] {
		if let Some(fd) = from {
			if let Err(e) = unistd::dup2(fd, to) {
				exit_child(launch, e);
			}
		}
	}
	// Everything else the parent holds is close-on-exec. The Rust runtime
	// ignores SIGPIPE and that disposition would survive exec.
	unsafe {
		libc::signal(libc::SIGPIPE, libc::SIG_DFL);
		libc::execv(launch.path.as_ptr(), launch.argv_ptrs.as_ptr());
	}
	exit_child(launch, Errno::last())
}

/// Prepares and forks one process per stage, left to right. Stage i reads the
/// pipe from stage i-1 and writes the pipe to stage i+1; the ends of the
/// pipeline fall back to the stage's redirect files, then to the shell's own
/// streams. The parent holds at most the one read end waiting for the next
/// stage. A failure stops the loop; stages already forked stay in the job.
fn spawn_stages(shell_name: &str, stages: &[Stage], job_builder: &mut job::JobBuilder) -> Result<(), LaunchError> {
	let last = stages.len() - 1;
	let mut upstream: Option<OwnedFd> = None;
	for (i, stage) in stages.iter().enumerate() {
		let launch = prepare(shell_name, stage, i == 0, i == last)?;
		let err = |e: Errno| LaunchError::new(&launch.name, e);
		let downstream = if i < last {
			Some(unistd::pipe2(OFlag::O_CLOEXEC).map_err(err)?)
		} else {
			None
		};
		let stdin = upstream.as_ref().map(|fd| fd.as_raw_fd())
			.or_else(|| launch.input.as_ref().map(|f| f.as_raw_fd()));
		let stdout = downstream.as_ref().map(|(_, write)| write.as_raw_fd())
			.or_else(|| launch.output.as_ref().map(|f| f.as_raw_fd()));
		let unused = downstream.as_ref().map(|(read, _)| read.as_raw_fd());

		match unsafe { job_builder.push_fork(&launch.name) }.map_err(err)? {
			ForkResult::Parent { .. } => {},
			ForkResult::Child => exec_stage(&launch, stdin, stdout, unused),
		}

		// Dropping closes our copy of the write end, the previous read end
		// and the redirect files.
		upstream = downstream.map(|(read, _write)| read);
	}
	Ok(())
}

fn status_of(e: &LaunchError) -> u8 {
	match e.source {
		ExecError::NotFound => STATUS_NOT_FOUND,
		_ => 1,
	}
}

/// Runs one parsed line: a builtin in this process, or a chain of child
/// processes that is waited for unless the last stage is marked background.
pub fn execute(session: &mut Session, pipeline: &Pipeline) -> Eval {
	let head = pipeline.head();
	if head.name.is_empty() {
		return Eval::Done(0);
	}

	if let Some(builtin) = builtin::match_builtin(&head.name) {
		if pipeline.stages.len() > 1 {
			log::warn!("{}: builtin cannot feed a pipe, ignoring {} stage(s)", head.name, pipeline.stages.len() - 1);
		}
		log::debug!("builtin {} {:?}", head.name, head.arguments);
		return builtin(session, &head.arguments, pipeline.is_background());
	}

	let mut job_builder = job::JobBuilder::new(pipeline.stages.len());
	let failure = match spawn_stages(&session.config.name, &pipeline.stages, &mut job_builder) {
		Ok(()) => None,
		Err(e) => {
			session.report(&e);
			Some(status_of(&e))
		},
	};

	let mut job = job_builder.build();
	if job.is_empty() {
		return Eval::Done(failure.unwrap_or(STATUS_NOT_EXECUTABLE));
	}
	if pipeline.is_background() {
		log::debug!("detached {:?}", job.pids());
		session.jobs.push(job);
		match failure {
			Some(status) => Eval::Done(status),
			None => Eval::Detached,
		}
	} else {
		job.wait();
		Eval::Done(failure.unwrap_or_else(|| job.code()))
	}
}
