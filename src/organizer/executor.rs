use crate::organizer::filesystem::{Filesystem, LocalFilesystem, RenameFailure};
use crate::organizer::outcome::{MoveFailure, MoveOutcome};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Renamed candidates tried before a collision counts as a failure
pub const MAX_COLLISION_ATTEMPTS: u32 = 50;

/// Relocates single files into destination directories
///
/// Attempts, in order: a non-replacing rename under the original name, the
/// same rename under `stem_1.ext` .. `stem_N.ext` while the target is taken,
/// and a copy to `destination_dir/<file name>` followed by deleting the source
/// once a rename reports that the target is on another device. Holds no state
/// between calls.
#[derive(Debug, Clone)]
pub struct MoveExecutor<F = LocalFilesystem> {
	fs: F,
	max_collision_attempts: u32,
}

impl MoveExecutor<LocalFilesystem> {
	pub fn new() -> Self {
		Self::with_filesystem(LocalFilesystem)
	}
}

impl Default for MoveExecutor<LocalFilesystem> {
	fn default() -> Self {
		Self::new()
	}
}

impl<F: Filesystem> MoveExecutor<F> {
	pub fn with_filesystem(fs: F) -> Self {
		Self {
			fs,
			max_collision_attempts: MAX_COLLISION_ATTEMPTS,
		}
	}

	pub fn with_max_collision_attempts(mut self, attempts: u32) -> Self {
		self.max_collision_attempts = attempts;
		self
	}

	/// Move `source` into `destination_dir`, which must already exist
	pub fn move_file(&self, source: &Path, destination_dir: &Path) -> MoveOutcome {
		let outcome = self.relocate(source, destination_dir);

		match &outcome {
			MoveOutcome::Moved(target) => {
				info!("Moved {} -> {}", source.display(), target.display());
			}
			MoveOutcome::MovedWithRename { destination, .. } => {
				info!(
					"Moved {} -> {} (renamed to avoid collision)",
					source.display(),
					destination.display()
				);
			}
			MoveOutcome::CopiedCrossDevice(target) => {
				info!(
					"Copied {} -> {} (cross-device move)",
					source.display(),
					target.display()
				);
			}
			MoveOutcome::Failed(failure) => {
				warn!("[{}] {}", failure.category(), failure);
			}
			MoveOutcome::Skipped => {}
		}

		outcome
	}

	fn relocate(&self, source: &Path, destination_dir: &Path) -> MoveOutcome {
		let Some(file_name) = source.file_name() else {
			return MoveOutcome::Failed(MoveFailure::NoFileName { file: source.to_path_buf() });
		};
		let target = destination_dir.join(file_name);

		match self.try_rename(source, &target) {
			Ok(()) => MoveOutcome::Moved(target),
			Err(RenameFailure::AlreadyExists) => {
				self.move_with_suffix(source, destination_dir, file_name)
			}
			Err(RenameFailure::CrossDevice) => self.copy_across_devices(source, target),
			Err(RenameFailure::Other(error)) => MoveOutcome::Failed(MoveFailure::Rename {
				file: source.to_path_buf(),
				target,
				error,
			}),
		}
	}

	fn try_rename(&self, from: &Path, to: &Path) -> Result<(), RenameFailure> {
		self.fs.rename_no_replace(from, to).map_err(RenameFailure::from)
	}

	fn move_with_suffix(
		&self, source: &Path, destination_dir: &Path, file_name: &OsStr,
	) -> MoveOutcome {
		for suffix in 1..=self.max_collision_attempts {
			let candidate = destination_dir.join(suffixed_name(file_name, suffix));

			match self.try_rename(source, &candidate) {
				Ok(()) => {
					return MoveOutcome::MovedWithRename {
						destination: candidate,
						suffix,
					}
				}
				Err(RenameFailure::AlreadyExists) => continue,
				// The copy targets the plain name, never a renamed candidate
				Err(RenameFailure::CrossDevice) => {
					return self.copy_across_devices(source, destination_dir.join(file_name))
				}
				Err(RenameFailure::Other(error)) => {
					return MoveOutcome::Failed(MoveFailure::Rename {
						file: source.to_path_buf(),
						target: candidate,
						error,
					})
				}
			}
		}

		MoveOutcome::Failed(MoveFailure::CollisionLimit {
			file: source.to_path_buf(),
			attempts: self.max_collision_attempts,
		})
	}

	/// Copy to exactly `target`, then delete the source
	///
	/// Never overwrites and never falls back to renamed candidates.
	fn copy_across_devices(&self, source: &Path, target: PathBuf) -> MoveOutcome {
		if let Err(error) = self.fs.copy_new(source, &target) {
			return MoveOutcome::Failed(MoveFailure::Copy {
				file: source.to_path_buf(),
				target,
				error,
			});
		}

		match self.fs.remove_file(source) {
			Ok(()) => MoveOutcome::CopiedCrossDevice(target),
			Err(error) => MoveOutcome::Failed(MoveFailure::SourceNotRemoved {
				file: source.to_path_buf(),
				copy: target,
				error,
			}),
		}
	}
}

/// `report.txt` -> `report_3.txt`; the suffix goes before the last extension
pub fn suffixed_name(file_name: &OsStr, suffix: u32) -> OsString {
	let path = Path::new(file_name);
	let mut name = path
		.file_stem()
		.map(OsStr::to_os_string)
		.unwrap_or_else(|| file_name.to_os_string());
	name.push(format!("_{suffix}"));
	if let Some(extension) = path.extension() {
		name.push(".");
		name.push(extension);
	}
	name
}
