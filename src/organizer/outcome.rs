use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Why a single file could not be organized
///
/// These never escalate past the organizer; they are logged and folded into
/// the pass result.
#[derive(Error, Debug)]
pub enum MoveFailure {
	#[error("{file} has no file name component")]
	NoFileName { file: PathBuf },

	#[error("Failed to create destination directory {directory}: {error}")]
	DestinationUnavailable {
		directory: PathBuf,
		#[source]
		error: std::io::Error,
	},

	#[error("Failed to move {file} to {target}: {error}")]
	Rename {
		file: PathBuf,
		target: PathBuf,
		#[source]
		error: std::io::Error,
	},

	#[error("No free name for {file} after {attempts} renamed candidates")]
	CollisionLimit { file: PathBuf, attempts: u32 },

	#[error("Failed to copy {file} to {target}: {error}")]
	Copy {
		file: PathBuf,
		target: PathBuf,
		#[source]
		error: std::io::Error,
	},

	#[error("Copied {file} to {copy} but failed to remove the original: {error}")]
	SourceNotRemoved {
		file: PathBuf,
		copy: PathBuf,
		#[source]
		error: std::io::Error,
	},
}

impl MoveFailure {
	/// Get failure category for logging
	pub fn category(&self) -> &'static str {
		match self {
			MoveFailure::NoFileName { .. } => "file_name",
			MoveFailure::DestinationUnavailable { .. } => "destination",
			MoveFailure::Rename { .. } => "rename",
			MoveFailure::CollisionLimit { .. } => "collision_limit",
			MoveFailure::Copy { .. } => "copy",
			MoveFailure::SourceNotRemoved { .. } => "source_cleanup",
		}
	}
}

/// Result of organizing one file
#[derive(Debug)]
pub enum MoveOutcome {
	/// Renamed into the destination under its own name
	Moved(PathBuf),
	/// Renamed into the destination as `stem_<suffix>.ext`
	MovedWithRename { destination: PathBuf, suffix: u32 },
	/// Copied to another device, original removed
	CopiedCrossDevice(PathBuf),
	/// No rule matched; the file stays where it is
	Skipped,
	Failed(MoveFailure),
}

impl MoveOutcome {
	pub fn is_failure(&self) -> bool {
		matches!(self, MoveOutcome::Failed(_))
	}

	pub fn is_relocated(&self) -> bool {
		self.destination().is_some()
	}

	/// Where the file ended up, if it was relocated
	pub fn destination(&self) -> Option<&Path> {
		match self {
			MoveOutcome::Moved(destination)
			| MoveOutcome::MovedWithRename { destination, .. }
			| MoveOutcome::CopiedCrossDevice(destination) => Some(destination),
			MoveOutcome::Skipped | MoveOutcome::Failed(_) => None,
		}
	}

	pub fn kind(&self) -> &'static str {
		match self {
			MoveOutcome::Moved(_) => "moved",
			MoveOutcome::MovedWithRename { .. } => "moved_with_rename",
			MoveOutcome::CopiedCrossDevice(_) => "copied_cross_device",
			MoveOutcome::Skipped => "skipped",
			MoveOutcome::Failed(_) => "failed",
		}
	}
}

impl fmt::Display for MoveOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MoveOutcome::Moved(destination) => write!(f, "moved to {}", destination.display()),
			MoveOutcome::MovedWithRename { destination, suffix } => {
				write!(f, "moved to {} (suffix _{})", destination.display(), suffix)
			}
			MoveOutcome::CopiedCrossDevice(destination) => {
				write!(f, "copied to {} (cross-device)", destination.display())
			}
			MoveOutcome::Skipped => write!(f, "skipped, no matching rule"),
			MoveOutcome::Failed(failure) => write!(f, "failed: {failure}"),
		}
	}
}

/// One file seen during a pass and what happened to it
#[derive(Debug)]
pub struct FileResult {
	pub file: PathBuf,
	pub outcome: MoveOutcome,
}

impl Serialize for FileResult {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let reason = match &self.outcome {
			MoveOutcome::Failed(failure) => Some(failure.to_string()),
			_ => None,
		};

		let mut state = serializer.serialize_struct("FileResult", 4)?;
		state.serialize_field("file", &self.file.to_string_lossy())?;
		state.serialize_field("outcome", self.outcome.kind())?;
		state.serialize_field(
			"destination",
			&self.outcome.destination().map(Path::to_string_lossy),
		)?;
		state.serialize_field("reason", &reason)?;
		state.end()
	}
}

/// Everything one organize pass did
#[derive(Debug, Serialize)]
pub struct PassReport {
	pub id: Uuid,
	pub started_at: DateTime<Utc>,
	pub watch_folder: PathBuf,
	results: Vec<FileResult>,
}

impl PassReport {
	pub fn new(watch_folder: PathBuf) -> Self {
		Self {
			id: Uuid::new_v4(),
			started_at: Utc::now(),
			watch_folder,
			results: Vec::new(),
		}
	}

	pub fn record(&mut self, file: PathBuf, outcome: MoveOutcome) {
		self.results.push(FileResult { file, outcome });
	}

	pub fn results(&self) -> &[FileResult] {
		&self.results
	}

	/// Outcome recorded for `file`, if the pass saw it
	pub fn outcome_for(&self, file: &Path) -> Option<&MoveOutcome> {
		self.results
			.iter()
			.find(|result| result.file == file)
			.map(|result| &result.outcome)
	}

	pub fn all_succeeded(&self) -> bool {
		!self.results.iter().any(|result| result.outcome.is_failure())
	}

	pub fn relocated_count(&self) -> usize {
		self.results.iter().filter(|r| r.outcome.is_relocated()).count()
	}

	pub fn skipped_count(&self) -> usize {
		self.results
			.iter()
			.filter(|r| matches!(r.outcome, MoveOutcome::Skipped))
			.count()
	}

	pub fn failed_count(&self) -> usize {
		self.results.iter().filter(|r| r.outcome.is_failure()).count()
	}

	pub fn to_json_value(&self) -> serde_json::Result<Value> {
		serde_json::to_value(self)
	}

	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(self)
	}
}
