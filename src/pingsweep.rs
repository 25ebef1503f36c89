use std::ops::RangeInclusive;

use crate::error::{ExecError, LaunchError};
use crate::eval::{self, Eval, STATUS_NOT_FOUND};
use crate::search;
use crate::session::Session;
use crate::types::{Pipeline, Stage};

const MAX_HOST: u8 = 254;

/// Host numbers to probe; both ends must lie in `0..=254`.
pub fn sweep_range(start: &str, end: &str) -> Option<RangeInclusive<u8>> {
	let start: u8 = start.parse().ok()?;
	let end: u8 = end.parse().ok()?;
	if start > MAX_HOST || end > MAX_HOST {
		return None;
	}
	Some(start ..= end)
}

pub fn ping_stage(subnet: &str, host: u8) -> Stage {
	Stage::new("ping", vec!["-c".to_string(), "1".to_string(), format!("{}.{}", subnet, host)])
}

pub fn builtin_pingsweep(session: &mut Session, args: &[String], background: bool) -> Eval {
	if args.len() != 3 {
		println!("Usage: pingsweep $subnet $start $end\nIn range (0,254)");
		return Eval::Done(2);
	}
	let subnet = &args[0];
	let range = match sweep_range(&args[1], &args[2]) {
		Some(range) => range,
		None => {
			println!("Invalid range operators");
			return Eval::Done(2);
		},
	};
	if search::resolve("ping").is_none() {
		session.report(&LaunchError::new("ping", ExecError::NotFound));
		return Eval::Done(STATUS_NOT_FOUND);
	}

	println!("Scanning on subnet {} from {} to {}", subnet, args[1], args[2]);
	let mut status = 0;
	for host in range {
		let mut stage = ping_stage(subnet, host);
		stage.background = background;
		match eval::execute(session, &Pipeline::single(stage)) {
			Eval::Done(s) => status = s,
			Eval::Detached => {},
			Eval::Exit => return Eval::Exit,
		}
	}
	if background { Eval::Detached } else { Eval::Done(status) }
}
