use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum State { Active, Terminated }

pub trait WaitStatusExt {
	fn state(self) -> State;
	fn code(self) -> u8;
}

impl WaitStatusExt for WaitStatus {
	fn state(self) -> State {
		match self {
			WaitStatus::Exited(..) | WaitStatus::Signaled(..) => State::Terminated,
			_ => State::Active,
		}
	}

	/// Shell-style status: the exit code, or 128 plus the signal number.
	fn code(self) -> u8 {
		match self {
			WaitStatus::Exited(_, code) => code as u8,
			WaitStatus::Signaled(_, sig, _) => 128u8.wrapping_add(sig as u8),
			_ => 0,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Process {
	pub pid: Pid,
	pub stage: String,
	pub status: WaitStatus,
}

impl Process {
	fn poll(&mut self, flags: Option<WaitPidFlag>) {
		if self.status.state() == State::Terminated {
			return;
		}
		loop {
			match wait::waitpid(self.pid, flags) {
				Ok(status) => {
					if status != WaitStatus::StillAlive {
						log::debug!("{} ({}) -> {:?}", self.stage, self.pid, status);
					}
					self.status = status;
					if flags.is_some() || status.state() == State::Terminated {
						return;
					}
				},
				Err(Errno::EINTR) => continue,
				Err(e) => {
					// ECHILD: somebody else reaped it, nothing left to wait for.
					log::debug!("waitpid {} ({}): {}", self.stage, self.pid, e);
					self.status = WaitStatus::Exited(self.pid, 0);
					return;
				},
			}
		}
	}
}

/// The processes launched for one pipeline, in pipeline order.
#[derive(Debug)]
pub struct Job {
	pub processes: Vec<Process>,
}

impl Job {
	pub fn state(&self) -> State {
		self.processes.iter().map(|pr| pr.status.state()).min().unwrap_or(State::Terminated)
	}

	pub fn is_empty(&self) -> bool {
		self.processes.is_empty()
	}

	pub fn pids(&self) -> Vec<Pid> {
		self.processes.iter().map(|pr| pr.pid).collect()
	}

	/// Blocks until every process of the job has terminated. Completion order
	/// does not matter; each pid is waited on individually.
	pub fn wait(&mut self) {
		for pr in &mut self.processes {
			pr.poll(None);
		}
	}

	/// Non-blocking status refresh.
	pub fn poll(&mut self) -> State {
		for pr in &mut self.processes {
			pr.poll(Some(WaitPidFlag::WNOHANG));
		}
		self.state()
	}

	/// Status of the final stage, which stands for the whole pipeline.
	pub fn code(&self) -> u8 {
		self.processes.last().map_or(0, |pr| pr.status.code())
	}
}

#[derive(Debug)]
pub struct JobBuilder {
	imp: Job,
}

impl JobBuilder {
	pub fn new(size_hint: usize) -> JobBuilder {
		JobBuilder {
			imp: Job { processes: Vec::with_capacity(size_hint) }
		}
	}

	/// Forks and records the child under `stage`.
	///
	/// # Safety
	///
	/// In the child, only async-signal-safe calls may follow before `exec` or
	/// `_exit`, since other threads' locks are copied in whatever state they
	/// were in.
	pub unsafe fn push_fork(&mut self, stage: &str) -> nix::Result<ForkResult> {
		let r = unistd::fork()?;
		if let ForkResult::Parent { child: pid } = r {
			log::debug!("spawned {} as {}", stage, pid);
			self.imp.processes.push(Process { pid: pid, stage: stage.to_string(), status: WaitStatus::StillAlive });
		}
		Ok(r)
	}

	pub fn build(self) -> Job {
		self.imp
	}
}

/// Background jobs, kept only so finished ones can be reaped.
#[derive(Debug, Default)]
pub struct JobSet {
	jobs: Vec<Job>,
}

impl JobSet {
	pub fn new() -> JobSet {
		JobSet { jobs: vec![] }
	}

	pub fn push(&mut self, job: Job) {
		self.jobs.push(job);
	}

	pub fn len(&self) -> usize {
		self.jobs.len()
	}

	pub fn pids(&self) -> Vec<Pid> {
		self.jobs.iter().flat_map(|job| job.pids()).collect()
	}

	/// Drops every job whose processes have all terminated.
	pub fn reap(&mut self) {
		self.jobs.retain_mut(|job| {
			let running = job.poll() != State::Terminated;
			if !running {
				log::debug!("background job {:?} finished", job.pids());
			}
			running
		});
	}
}
