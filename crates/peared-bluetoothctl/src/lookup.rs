//! `PATH` lookup for the binaries the runner invokes.

use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Find `name` the way a shell would.
///
/// Names containing a `/` are checked as given. Otherwise each directory of
/// `search_path` (or `$PATH` when `None`) is tried in order and the first
/// regular file with an execute bit wins.
#[must_use]
pub fn find_executable(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    if name.contains('/') {
        let candidate = PathBuf::from(name);
        return is_executable(&candidate).then_some(candidate);
    }

    let paths: OsString = search_path.map_or_else(|| env::var_os("PATH"), |p| Some(p.to_os_string()))?;
    env::split_paths(&paths)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, mode: u32) {
        fs::write(path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn finds_first_executable_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(&first.path().join("bluetoothctl"), 0o644);
        touch(&second.path().join("bluetoothctl"), 0o755);

        let search = env::join_paths([first.path(), second.path()]).unwrap();
        let found = find_executable("bluetoothctl", Some(&search));
        assert_eq!(found, Some(second.path().join("bluetoothctl")));
    }

    #[test]
    fn skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sudo")).unwrap();

        assert_eq!(find_executable("sudo", Some(dir.path().as_os_str())), None);
    }

    #[test]
    fn explicit_paths_are_checked_directly() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("bluetoothctl");
        touch(&tool, 0o700);

        let name = tool.to_str().unwrap();
        assert_eq!(find_executable(name, Some(OsStr::new(""))), Some(tool.clone()));
        assert_eq!(find_executable("", None), None);
    }
}
