mod bookmark;
mod builtin;
mod complete;
mod config;
mod editor;
mod error;
mod eval;
mod job;
mod parser;
mod pingsweep;
mod prompt;
mod search;
mod session;
mod shortcut;
mod types;


use std::process;

use config::Config;
use editor::Input;
use error::ExecError;
use eval::Eval;
use session::Session;

const LOG_ENV: &str = "SHELLINGTON_LOG";

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().filter_or(LOG_ENV, "warn")).init();

	let config = match Config::from_env() {
		Ok(config) => config,
		Err(e) => {
			eprintln!("-{}: {}", config::SHELL_NAME, ExecError::from(e));
			process::exit(1);
		},
	};
	let mut session = Session::new(config);

	loop {
		session.jobs.reap();
		let prompt = prompt::render(&session.config);
		let line = match session.editor.read_line(&prompt) {
			Ok(Input::Line(line)) => line,
			Ok(Input::Eof) => break,
			Err(e) => {
				eprintln!("-{}: terminal: {}", session.config.name, e.desc());
				process::exit(1);
			},
		};

		let pipeline = parser::parse(&line);
		if pipeline.needs_completion() {
			let completion = complete::complete(&line);
			if completion.candidates.len() > 1 {
				println!("{}", completion.candidates.join("  "));
			}
			session.editor.seed(completion.line);
			continue;
		}
		if eval::execute(&mut session, &pipeline) == Eval::Exit {
			break;
		}
	}

	if session.jobs.len() > 0 {
		log::debug!("leaving background processes {:?}", session.jobs.pids());
	}
	println!();
}
