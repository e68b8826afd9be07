use std::path::PathBuf;
use thiserror::Error;

/// Core janitor error types
///
/// Only failures that cross a component boundary live here. Per-file move
/// failures never escalate past the organizer and are modelled separately:
/// - Move failures: `crate::organizer::MoveFailure`
#[derive(Error, Debug)]
pub enum JanitorError {
	#[error("Configuration file {path} could not be read: {source}")]
	ConfigUnreadable {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Configuration file {path} is not valid JSON: {source}")]
	ConfigSyntax {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("Invalid configuration in `{section}`: {reason}")]
	InvalidConfig { section: String, reason: String },

	#[error("Watch folder {path} is unusable: {reason}")]
	WatchTarget { path: PathBuf, reason: String },

	#[error("Watch folder has not been set")]
	WatchTargetUnset,

	#[error("Change subscription on {path} failed: {reason}")]
	Subscription { path: PathBuf, reason: String },

	#[error("Change subscription on {path} was closed")]
	SubscriptionClosed { path: PathBuf },

	#[error("Startup registration failed: {reason}")]
	StartupRegistration { reason: String },
}

impl JanitorError {
	/// Create an invalid configuration error
	pub fn invalid_config(section: &str, reason: impl Into<String>) -> Self {
		JanitorError::InvalidConfig {
			section: section.to_string(),
			reason: reason.into(),
		}
	}

	/// Create a watch target error
	pub fn watch_target(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
		JanitorError::WatchTarget {
			path: path.into(),
			reason: reason.into(),
		}
	}

	/// Create a subscription error
	pub fn subscription(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
		JanitorError::Subscription {
			path: path.into(),
			reason: reason.into(),
		}
	}

	/// Create a startup registration error
	pub fn startup(reason: impl Into<String>) -> Self {
		JanitorError::StartupRegistration { reason: reason.into() }
	}
}

pub type Result<T> = std::result::Result<T, JanitorError>;

#[cfg(test)]
mod tests {
	use super::*;
	use std::io;

	#[test]
	fn test_error_messages() {
		let invalid = JanitorError::invalid_config("custom_rules", "expected an object");
		let target = JanitorError::watch_target("/missing", "path does not exist");
		let closed = JanitorError::SubscriptionClosed { path: PathBuf::from("/watch") };

		assert!(invalid.to_string().contains("custom_rules"));
		assert!(target.to_string().contains("/missing"));
		assert!(closed.to_string().contains("closed"));
	}

	#[test]
	fn test_source_chain() {
		let unreadable = JanitorError::ConfigUnreadable {
			path: PathBuf::from("/etc/janitor/rules.json"),
			source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
		};

		assert!(unreadable.to_string().contains("rules.json"));
		assert!(std::error::Error::source(&unreadable).is_some());
	}

	#[test]
	fn test_startup_error_message() {
		let error = JanitorError::startup("Run key is read-only");
		assert!(matches!(error, JanitorError::StartupRegistration { .. }));
		assert!(error.to_string().contains("Run key is read-only"));
	}
}
