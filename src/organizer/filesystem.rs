//! Filesystem primitives used by the move executor
//!
//! The executor never inspects error text. Every rename failure is reduced to
//! a [`RenameFailure`] so the fallback order stays the same on every platform.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

#[cfg(windows)]
const ERROR_NOT_SAME_DEVICE: i32 = 17;

/// Why a rename did not happen
#[derive(Debug)]
pub enum RenameFailure {
	/// Something already sits at the target path
	AlreadyExists,
	/// Source and target live on different devices
	CrossDevice,
	Other(io::Error),
}

impl From<io::Error> for RenameFailure {
	fn from(error: io::Error) -> Self {
		if error.kind() == io::ErrorKind::AlreadyExists {
			RenameFailure::AlreadyExists
		} else if is_cross_device(&error) {
			RenameFailure::CrossDevice
		} else {
			RenameFailure::Other(error)
		}
	}
}

#[cfg(unix)]
fn is_cross_device(error: &io::Error) -> bool {
	error.raw_os_error() == Some(nix::errno::Errno::EXDEV as i32)
}

#[cfg(windows)]
fn is_cross_device(error: &io::Error) -> bool {
	error.raw_os_error() == Some(ERROR_NOT_SAME_DEVICE)
}

#[cfg(not(any(unix, windows)))]
fn is_cross_device(_error: &io::Error) -> bool {
	false
}

/// The three operations a move is built from
pub trait Filesystem: Send + Sync {
	/// Rename `from` to `to`, failing with `AlreadyExists` instead of replacing `to`
	fn rename_no_replace(&self, from: &Path, to: &Path) -> io::Result<()>;

	/// Copy the contents of `from` into a newly created `to`
	///
	/// Must fail with `AlreadyExists` rather than overwrite, and must not
	/// leave a partial `to` behind on failure.
	fn copy_new(&self, from: &Path, to: &Path) -> io::Result<u64>;

	fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// The real, local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
	fn occupied(path: &Path) -> bool {
		fs::symlink_metadata(path).is_ok()
	}
}

impl Filesystem for LocalFilesystem {
	fn rename_no_replace(&self, from: &Path, to: &Path) -> io::Result<()> {
		#[cfg(all(target_os = "linux", target_env = "gnu"))]
		{
			use nix::errno::Errno;
			use nix::fcntl::{renameat2, RenameFlags};

			match renameat2(None, from, None, to, RenameFlags::RENAME_NOREPLACE) {
				Ok(()) => return Ok(()),
				// Filesystem without RENAME_NOREPLACE support
				Err(Errno::EINVAL) | Err(Errno::ENOSYS) => {}
				Err(errno) => return Err(io::Error::from_raw_os_error(errno as i32)),
			}
		}

		// std::fs::rename replaces existing targets on every platform
		if Self::occupied(to) {
			return Err(io::Error::new(
				io::ErrorKind::AlreadyExists,
				format!("{} already exists", to.display()),
			));
		}
		fs::rename(from, to)
	}

	fn copy_new(&self, from: &Path, to: &Path) -> io::Result<u64> {
		let mut source = File::open(from)?;
		let permissions = source.metadata()?.permissions();
		let mut target = OpenOptions::new().write(true).create_new(true).open(to)?;

		let copied = io::copy(&mut source, &mut target)
			.and_then(|copied| target.sync_all().map(|()| copied))
			.and_then(|copied| fs::set_permissions(to, permissions).map(|()| copied));

		if copied.is_err() {
			drop(target);
			let _ = fs::remove_file(to);
		}
		copied
	}

	fn remove_file(&self, path: &Path) -> io::Result<()> {
		fs::remove_file(path)
	}
}
