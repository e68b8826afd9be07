//! Common test utilities for the downloads-janitor library

#![allow(dead_code)]

use downloads_janitor::organizer::{Filesystem, LocalFilesystem};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn setup_temp_dir() -> TempDir {
	TempDir::new().expect("Failed to create temp directory")
}

/// Create a watch folder and a separate destination root inside `temp_dir`
pub fn setup_folders(temp_dir: &TempDir) -> (PathBuf, PathBuf) {
	let watch = temp_dir.path().join("watch");
	let dest = temp_dir.path().join("dest");
	std::fs::create_dir_all(&watch).expect("Failed to create watch folder");
	std::fs::create_dir_all(&dest).expect("Failed to create destination root");
	(watch, dest)
}

/// Create a test file with content
pub fn create_test_file(path: &Path, content: &str) -> io::Result<()> {
	std::fs::write(path, content)
}

/// Poll until `condition` holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
	let start = Instant::now();
	while start.elapsed() < timeout {
		if condition() {
			return true;
		}
		std::thread::sleep(Duration::from_millis(25));
	}
	condition()
}

/// Local filesystem whose renames always report a cross-device condition
#[derive(Debug, Default)]
pub struct CrossDeviceFilesystem {
	pub fail_remove: bool,
}

impl Filesystem for CrossDeviceFilesystem {
	fn rename_no_replace(&self, _from: &Path, _to: &Path) -> io::Result<()> {
		Err(cross_device_error())
	}

	fn copy_new(&self, from: &Path, to: &Path) -> io::Result<u64> {
		LocalFilesystem.copy_new(from, to)
	}

	fn remove_file(&self, path: &Path) -> io::Result<()> {
		if self.fail_remove {
			return Err(io::Error::new(io::ErrorKind::PermissionDenied, "source is locked"));
		}
		LocalFilesystem.remove_file(path)
	}
}

/// Reports collisions for occupied targets and a cross-device condition otherwise
#[derive(Debug, Default)]
pub struct CollidingCrossDeviceFilesystem;

impl Filesystem for CollidingCrossDeviceFilesystem {
	fn rename_no_replace(&self, _from: &Path, to: &Path) -> io::Result<()> {
		if std::fs::symlink_metadata(to).is_ok() {
			return Err(io::Error::new(io::ErrorKind::AlreadyExists, "target exists"));
		}
		Err(cross_device_error())
	}

	fn copy_new(&self, from: &Path, to: &Path) -> io::Result<u64> {
		LocalFilesystem.copy_new(from, to)
	}

	fn remove_file(&self, path: &Path) -> io::Result<()> {
		LocalFilesystem.remove_file(path)
	}
}

/// Local filesystem that refuses to move files with a given name
#[derive(Debug)]
pub struct DenyingFilesystem {
	pub denied_name: String,
}

impl Filesystem for DenyingFilesystem {
	fn rename_no_replace(&self, from: &Path, to: &Path) -> io::Result<()> {
		if from.file_name().and_then(|n| n.to_str()) == Some(self.denied_name.as_str()) {
			return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
		}
		LocalFilesystem.rename_no_replace(from, to)
	}

	fn copy_new(&self, from: &Path, to: &Path) -> io::Result<u64> {
		LocalFilesystem.copy_new(from, to)
	}

	fn remove_file(&self, path: &Path) -> io::Result<()> {
		LocalFilesystem.remove_file(path)
	}
}

#[cfg(unix)]
fn cross_device_error() -> io::Error {
	io::Error::from_raw_os_error(18) // EXDEV
}

#[cfg(windows)]
fn cross_device_error() -> io::Error {
	io::Error::from_raw_os_error(17) // ERROR_NOT_SAME_DEVICE
}
