use std::env;

use nix::unistd;

use crate::config::Config;

/// `user@host:cwd shellname$ `; parts that cannot be determined render empty.
pub fn render(config: &Config) -> String {
	let user = config.user.as_deref().unwrap_or("");
	let host = unistd::gethostname()
		.map(|h| h.to_string_lossy().into_owned())
		.unwrap_or_default();
	let cwd = env::current_dir()
		.map(|p| p.display().to_string())
		.unwrap_or_default();
	format!("{}@{}:{} {}$ ", user, host, cwd, config.name)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	#[test]
	fn shape() {
		let mut config = Config::new(PathBuf::from("/"));
		config.user = Some("alice".to_string());
		let prompt = render(&config);
		assert!(prompt.starts_with("alice@"));
		assert!(prompt.ends_with(" shellington$ "));
	}
}
