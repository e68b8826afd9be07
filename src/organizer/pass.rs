use crate::error::{JanitorError, Result};
use crate::organizer::executor::MoveExecutor;
use crate::organizer::filesystem::{Filesystem, LocalFilesystem};
use crate::organizer::index::ExtensionIndex;
use crate::organizer::outcome::{MoveFailure, MoveOutcome, PassReport};
use crate::organizer::rule::Rule;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Scans the watch folder and moves every file a rule claims
pub struct Organizer<F = LocalFilesystem> {
	watch_folder: PathBuf,
	rules: Vec<Rule>,
	index: ExtensionIndex,
	executor: MoveExecutor<F>,
}

impl Organizer<LocalFilesystem> {
	pub fn new(watch_folder: impl Into<PathBuf>, rules: Vec<Rule>) -> Self {
		Self::with_executor(watch_folder, rules, MoveExecutor::new())
	}
}

impl<F: Filesystem> Organizer<F> {
	pub fn with_executor(
		watch_folder: impl Into<PathBuf>, rules: Vec<Rule>, executor: MoveExecutor<F>,
	) -> Self {
		let index = ExtensionIndex::build(&rules);
		Self {
			watch_folder: watch_folder.into(),
			rules,
			index,
			executor,
		}
	}

	/// Replace the rule set; the index is rebuilt before it becomes visible
	pub fn update_rules(&mut self, rules: Vec<Rule>) {
		let index = ExtensionIndex::build(&rules);
		self.rules = rules;
		self.index = index;
	}

	/// Point the organizer at another folder; the index is kept as is
	pub fn set_watch_folder(&mut self, watch_folder: impl Into<PathBuf>) {
		self.watch_folder = watch_folder.into();
	}

	pub fn watch_folder(&self) -> &Path {
		&self.watch_folder
	}

	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	pub fn index(&self) -> &ExtensionIndex {
		&self.index
	}

	/// Directory a file would be moved to
	///
	/// Relative rule destinations are taken relative to the current watch folder.
	pub fn destination_for(&self, file: &Path) -> Option<PathBuf> {
		self.index
			.resolve(file)
			.map(|destination| self.watch_folder.join(destination))
	}

	/// Run one pass and report whether every matched file was relocated
	pub fn organize_once(&self) -> bool {
		match self.run_pass() {
			Ok(report) => {
				if let Ok(json) = report.to_json() {
					debug!("Pass report: {}", json);
				}
				report.all_succeeded()
			}
			Err(e) => {
				error!("Cannot organize files: {}", e);
				false
			}
		}
	}

	/// Scan the immediate entries of the watch folder once
	///
	/// Fails only when the watch folder itself is unusable. Per-file problems
	/// are recorded in the report and never stop the pass.
	pub fn run_pass(&self) -> Result<PassReport> {
		self.check_watch_folder()?;

		let entries = fs::read_dir(&self.watch_folder).map_err(|e| {
			JanitorError::watch_target(&self.watch_folder, format!("unable to enumerate: {e}"))
		})?;

		let mut report = PassReport::new(self.watch_folder.clone());
		debug!("Pass {} started on {}", report.id, self.watch_folder.display());

		for entry in entries {
			let entry = match entry {
				Ok(entry) => entry,
				Err(e) => {
					warn!("Skipping unreadable entry in {}: {}", self.watch_folder.display(), e);
					continue;
				}
			};

			// file_type() does not follow symlinks, so links are skipped here too
			match entry.file_type() {
				Ok(file_type) if file_type.is_file() => {}
				_ => continue,
			}

			let path = entry.path();
			let outcome = self.organize_file(&path);
			report.record(path, outcome);
		}

		if report.relocated_count() > 0 || report.failed_count() > 0 {
			info!(
				"Pass finished: {} relocated, {} skipped, {} failed",
				report.relocated_count(),
				report.skipped_count(),
				report.failed_count()
			);
		}

		Ok(report)
	}

	fn organize_file(&self, path: &Path) -> MoveOutcome {
		let Some(destination) = self.destination_for(path) else {
			debug!(
				"No matching rule for {}, leaving in place",
				path.file_name().unwrap_or_default().to_string_lossy()
			);
			return MoveOutcome::Skipped;
		};

		if let Err(error) = fs::create_dir_all(&destination) {
			let failure = MoveFailure::DestinationUnavailable {
				directory: destination,
				error,
			};
			warn!("[{}] {}", failure.category(), failure);
			return MoveOutcome::Failed(failure);
		}

		if self.is_watch_folder(&destination) {
			debug!(
				"Rule for {} points at the watch folder itself, leaving in place",
				path.display()
			);
			return MoveOutcome::Skipped;
		}

		self.executor.move_file(path, &destination)
	}

	fn is_watch_folder(&self, directory: &Path) -> bool {
		match (fs::canonicalize(directory), fs::canonicalize(&self.watch_folder)) {
			(Ok(a), Ok(b)) => a == b,
			_ => false,
		}
	}

	fn check_watch_folder(&self) -> Result<()> {
		if self.watch_folder.as_os_str().is_empty() {
			return Err(JanitorError::WatchTargetUnset);
		}

		let metadata = fs::metadata(&self.watch_folder)
			.map_err(|e| JanitorError::watch_target(&self.watch_folder, e.to_string()))?;
		if !metadata.is_dir() {
			return Err(JanitorError::watch_target(&self.watch_folder, "not a directory"));
		}

		Ok(())
	}
}
