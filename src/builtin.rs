use nix::unistd;

use crate::bookmark;
use crate::eval::Eval;
use crate::pingsweep;
use crate::session::Session;
use crate::shortcut;

/// Arguments exclude the name; the flag is the pipeline's background marker.
pub type Builtin = fn(&mut Session, &[String], bool) -> Eval;

pub const NAMES: &[&str] = &["bookmark", "cd", "exit", "pingsweep", "short"];

pub fn builtin_cd(session: &mut Session, args: &[String], _: bool) -> Eval {
	let target = match args.first() {
		Some(target) => target,
		None => return Eval::Done(0),
	};
	match unistd::chdir(target.as_str()) {
		Ok(()) => Eval::Done(0),
		Err(e) => {
			session.diagnostic("cd", e.desc());
			Eval::Done(1)
		},
	}
}

pub fn builtin_exit(_: &mut Session, _: &[String], _: bool) -> Eval {
	Eval::Exit
}

pub fn match_builtin(name: &str) -> Option<Builtin> {
	match name {
		"cd" => Some(builtin_cd),
		"exit" => Some(builtin_exit),
		"short" => Some(shortcut::builtin_short),
		"bookmark" => Some(bookmark::builtin_bookmark),
		"pingsweep" => Some(pingsweep::builtin_pingsweep),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_listed_name_dispatches() {
		for name in NAMES {
			assert!(match_builtin(name).is_some(), "{}", name);
		}
		assert!(match_builtin("ls").is_none());
		assert!(match_builtin("").is_none());
	}
}
