use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use nix::unistd::{self, AccessFlags};

const PATH_KEY: &str = "PATH";

/// Regular file the caller may execute. `access` probes without opening, so
/// no descriptor outlives the check.
fn is_executable(path: &Path) -> bool {
	match fs::metadata(path) {
		Ok(meta) => meta.is_file() && unistd::access(path, AccessFlags::X_OK).is_ok(),
		Err(_) => false,
	}
}

fn search_dirs(path_var: &OsStr) -> impl Iterator<Item = PathBuf> + '_ {
	env::split_paths(path_var).filter(|dir| !dir.as_os_str().is_empty())
}

/// Finds `name` in the directories listed by `path_var`, first match wins.
pub fn resolve_in(name: &str, path_var: &OsStr) -> Option<PathBuf> {
	if name.is_empty() {
		return None;
	}
	if name.contains('/') {
		let path = PathBuf::from(name);
		return if is_executable(&path) { Some(path) } else { None };
	}
	search_dirs(path_var)
		.map(|dir| dir.join(name))
		.find(|candidate| is_executable(candidate))
}

/// Resolves against the current `PATH`, read fresh on every call.
pub fn resolve(name: &str) -> Option<PathBuf> {
	let path_var = env::var_os(PATH_KEY)?;
	resolve_in(name, &path_var)
}

fn add_entry(found: &mut HashSet<OsString>, prefix: &str, entry: io::Result<fs::DirEntry>) -> io::Result<()> {
	let e = entry?;
	let file_name = e.file_name();
	if !file_name.to_string_lossy().starts_with(prefix) || found.contains(&file_name) {
		return Ok(());
	}
	if is_executable(&e.path()) {
		found.insert(file_name);
	}
	Ok(())
}

/// Names of every executable in `path_var` starting with `prefix`, sorted.
pub fn executables_with_prefix_in(prefix: &str, path_var: &OsStr) -> Vec<String> {
	let mut found = HashSet::new();
	for dir in search_dirs(path_var) {
		if let Ok(entries) = fs::read_dir(dir) {
			for entry in entries {
				let _ = add_entry(&mut found, prefix, entry);
			}
		}
	}
	let mut names: Vec<String> = found.into_iter().map(|k| k.to_string_lossy().into_owned()).collect();
	names.sort();
	names
}

pub fn executables_with_prefix(prefix: &str) -> Vec<String> {
	match env::var_os(PATH_KEY) {
		Some(path_var) => executables_with_prefix_in(prefix, &path_var),
		None => vec![],
	}
}
