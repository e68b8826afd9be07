use crate::error::{JanitorError, Result};
use crate::events::{is_fatal_notify_error, ChangeKind};
use crate::organizer::{Filesystem, LocalFilesystem, Organizer};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Something that can block until the watched directory changes
pub trait ChangeSignal {
	/// Block until a change is observed
	fn wait(&mut self) -> Result<()>;

	/// Prepare for the next `wait` after a processing cycle
	fn rearm(&mut self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct WatchLoopConfig {
	/// Pause after each pass so bursts of notifications collapse into one pass
	pub debounce: Duration,
}

impl Default for WatchLoopConfig {
	fn default() -> Self {
		Self { debounce: DEFAULT_DEBOUNCE }
	}
}

/// How often a quiet signal checks that the watch folder still exists
pub const RECOVERY_POLL: Duration = Duration::from_millis(500);

/// Change signal backed by the platform's recommended notify watcher
///
/// Watches one directory non-recursively. When the directory disappears the
/// watch is considered lost; once a directory exists at the same path again
/// the watch is re-established and a rescan is requested.
pub struct NotifySignal {
	path: PathBuf,
	watcher: RecommendedWatcher,
	events: mpsc::Receiver<notify::Result<Event>>,
	pending: bool,
	lost: bool,
	identity: Option<FolderIdentity>,
}

impl NotifySignal {
	pub fn subscribe(path: &Path) -> Result<Self> {
		let (notify_tx, notify_rx) = mpsc::channel();
		Self::subscribe_with(path, notify_tx, notify_rx)
	}

	fn subscribe_with(
		path: &Path, notify_tx: mpsc::Sender<notify::Result<Event>>,
		notify_rx: mpsc::Receiver<notify::Result<Event>>,
	) -> Result<Self> {
		let mut watcher = RecommendedWatcher::new(notify_tx, Config::default())
			.map_err(|e| JanitorError::subscription(path, e.to_string()))?;
		watcher
			.watch(path, RecursiveMode::NonRecursive)
			.map_err(|e| JanitorError::subscription(path, e.to_string()))?;

		info!("Monitoring {} for changes", path.display());

		Ok(Self {
			path: path.to_path_buf(),
			watcher,
			events: notify_rx,
			pending: false,
			lost: false,
			identity: folder_identity(path),
		})
	}

	/// Whether a received notification counts as a change
	fn classify(&mut self, result: notify::Result<Event>) -> Result<Option<Event>> {
		match result {
			Ok(event) => {
				let kind = ChangeKind::from(event.kind);
				if matches!(kind, ChangeKind::Remove | ChangeKind::Rename)
					&& event.paths.iter().any(|p| p == &self.path)
				{
					warn!("Watch folder {} was removed or renamed", self.path.display());
					self.lost = true;
				}
				if kind.triggers_pass() {
					debug!("Change {:?}: {:?}", kind, event.paths);
					Ok(Some(event))
				} else {
					Ok(None)
				}
			}
			Err(e) if is_fatal_notify_error(&e) => {
				Err(JanitorError::subscription(&self.path, e.to_string()))
			}
			Err(e) => {
				// Unknown state, so force a rescan
				warn!("Notify error on {}: {}", self.path.display(), e);
				Ok(Some(Event::new(notify::EventKind::Any)))
			}
		}
	}

	/// Re-establish the watch on a folder that came back
	fn resubscribe(&mut self) -> Result<()> {
		let _ = self.watcher.unwatch(&self.path);
		self.watcher
			.watch(&self.path, RecursiveMode::NonRecursive)
			.map_err(|e| JanitorError::subscription(&self.path, e.to_string()))?;
		self.lost = false;
		self.identity = folder_identity(&self.path);
		info!("Watch folder {} is back, monitoring resumed", self.path.display());
		Ok(())
	}

	/// Check that the watched path still holds the folder being watched
	///
	/// Returns true when the watch was just re-established.
	fn check_folder(&mut self) -> Result<bool> {
		let present = self.path.is_dir();
		if !present {
			if !self.lost {
				warn!(
					"Watch folder {} is missing, waiting for it to return",
					self.path.display()
				);
			}
			self.lost = true;
			return Ok(false);
		}
		if self.lost || self.replaced() {
			self.resubscribe()?;
			return Ok(true);
		}
		Ok(false)
	}

	/// Whether another directory now sits at the watched path
	fn replaced(&self) -> bool {
		self.identity.is_some() && folder_identity(&self.path) != self.identity
	}

	fn closed(&self) -> JanitorError {
		JanitorError::SubscriptionClosed { path: self.path.clone() }
	}
}

impl ChangeSignal for NotifySignal {
	fn wait(&mut self) -> Result<()> {
		if std::mem::take(&mut self.pending) {
			return Ok(());
		}

		loop {
			match self.events.recv_timeout(RECOVERY_POLL) {
				Ok(result) => {
					let changed = self.classify(result)?.is_some();
					if self.lost {
						// Nothing to organize until the folder is back
						if self.check_folder()? {
							return Ok(());
						}
					} else if changed {
						return Ok(());
					}
				}
				Err(RecvTimeoutError::Timeout) => {
					if self.check_folder()? {
						return Ok(());
					}
				}
				Err(RecvTimeoutError::Disconnected) => return Err(self.closed()),
			}
		}
	}

	/// Drop notifications queued while the last pass ran
	///
	/// Most of them are echoes of the pass's own moves. A queued event that
	/// names a regular file still sitting in the folder keeps the signal
	/// raised so that file is not left waiting for an unrelated change.
	fn rearm(&mut self) -> Result<()> {
		loop {
			match self.events.try_recv() {
				Ok(result) => {
					let Some(event) = self.classify(result)? else {
						continue;
					};
					if event.paths.is_empty() || event.paths.iter().any(|p| is_regular_file(p)) {
						self.pending = true;
					}
				}
				Err(TryRecvError::Empty) => break,
				Err(TryRecvError::Disconnected) => return Err(self.closed()),
			}
		}

		if !self.path.is_dir() {
			self.lost = true;
			self.pending = false;
			return Ok(());
		}
		if self.lost || self.replaced() {
			self.resubscribe()?;
			// Files may have arrived before the watch was back
			self.pending = true;
		}
		Ok(())
	}
}

fn is_regular_file(path: &Path) -> bool {
	fs::symlink_metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Device and inode of a directory
type FolderIdentity = (u64, u64);

#[cfg(unix)]
fn folder_identity(path: &Path) -> Option<FolderIdentity> {
	use std::os::unix::fs::MetadataExt;
	fs::metadata(path).ok().map(|m| (m.dev(), m.ino()))
}

#[cfg(not(unix))]
fn folder_identity(_path: &Path) -> Option<FolderIdentity> {
	None
}

/// Runs an organize pass on startup and after every change
///
/// Passes never overlap: the loop waits, runs one pass to completion,
/// sleeps for the debounce delay, re-arms and waits again.
pub struct WatchLoop<S, F = LocalFilesystem> {
	signal: S,
	organizer: Organizer<F>,
	config: WatchLoopConfig,
	passes: u64,
	failed_passes: u64,
}

impl<S: ChangeSignal, F: Filesystem> WatchLoop<S, F> {
	pub fn new(signal: S, organizer: Organizer<F>, config: WatchLoopConfig) -> Self {
		Self {
			signal,
			organizer,
			config,
			passes: 0,
			failed_passes: 0,
		}
	}

	/// Run until the change signal fails
	///
	/// Only returns on a subscription failure; a healthy loop runs forever.
	pub fn run(&mut self) -> Result<()> {
		info!(
			"Running startup pass over {}",
			self.organizer.watch_folder().display()
		);

		loop {
			self.process_cycle();
			thread::sleep(self.config.debounce);

			if let Err(e) = self.signal.rearm() {
				error!("Failed to re-arm change notification: {}", e);
				return Err(e);
			}
			if let Err(e) = self.signal.wait() {
				error!("Waiting for changes failed: {}", e);
				return Err(e);
			}
		}
	}

	/// Run a single organize pass and return its result
	pub fn process_cycle(&mut self) -> bool {
		self.passes += 1;
		let succeeded = self.organizer.organize_once();
		if !succeeded {
			self.failed_passes += 1;
			warn!("One or more files failed to move during processing");
		}
		succeeded
	}

	pub fn passes(&self) -> u64 {
		self.passes
	}

	pub fn failed_passes(&self) -> u64 {
		self.failed_passes
	}

}
