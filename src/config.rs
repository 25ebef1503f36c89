use std::path::PathBuf;
use std::{env, io};

pub const SHELL_NAME: &str = "shellington";
const DATA_DIR_KEY: &str = "SHELLINGTON_DATA_DIR";
const USER_KEY: &str = "USER";
/// Matches the classic 4096 byte line buffer; one byte stays reserved.
const LINE_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Clone)]
pub struct Config {
	pub name: String,
	/// Where `short` and `bookmark` keep their records.
	pub data_dir: PathBuf,
	pub line_capacity: usize,
	pub user: Option<String>,
}

impl Config {
	pub fn new(data_dir: PathBuf) -> Config {
		Config {
			name: SHELL_NAME.to_string(),
			data_dir: data_dir,
			line_capacity: LINE_BUFFER_SIZE - 1,
			user: None,
		}
	}

	pub fn from_env() -> io::Result<Config> {
		let data_dir = match env::var_os(DATA_DIR_KEY) {
			Some(dir) if !dir.is_empty() => PathBuf::from(dir),
			_ => env::current_dir()?,
		};
		let mut config = Config::new(data_dir);
		config.user = env::var(USER_KEY).ok();
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = Config::new(PathBuf::from("/var/empty"));
		assert_eq!(config.name, "shellington");
		assert_eq!(config.line_capacity, 4095);
		assert_eq!(config.user, None);
		assert_eq!(config.data_dir, PathBuf::from("/var/empty"));
	}
}
