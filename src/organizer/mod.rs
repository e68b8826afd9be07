//! Rule matching and file relocation
//!
//! # Module Organization
//!
//! - [`rule`] - Rules and extension normalization
//! - [`index`] - Extension to destination lookup derived from the rules
//! - [`filesystem`] - Rename, copy and delete primitives with classified failures
//! - [`executor`] - Single-file moves with collision renaming and cross-device fallback
//! - [`outcome`] - Per-file outcomes, failures and pass reports
//! - [`pass`] - The organizer that scans the watch folder once

pub mod executor;
pub mod filesystem;
pub mod index;
pub mod outcome;
pub mod pass;
pub mod rule;

pub use executor::{MoveExecutor, MAX_COLLISION_ATTEMPTS};
pub use filesystem::{Filesystem, LocalFilesystem, RenameFailure};
pub use index::ExtensionIndex;
pub use outcome::{FileResult, MoveFailure, MoveOutcome, PassReport};
pub use pass::Organizer;
pub use rule::{normalize_extension, Rule};
