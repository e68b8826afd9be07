pub mod config;
mod error;
pub mod events;
pub mod organizer;
pub mod startup;
pub mod watcher;

pub use config::JanitorConfig;
pub use error::{JanitorError, Result};
pub use events::ChangeKind;
pub use organizer::{
	normalize_extension, ExtensionIndex, MoveExecutor, MoveFailure, MoveOutcome, Organizer,
	PassReport, Rule,
};
pub use watcher::{ChangeSignal, NotifySignal, WatchLoop, WatchLoopConfig};
