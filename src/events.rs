use notify::event::{AccessKind, AccessMode, ModifyKind};

/// Coarse classification of a notify event for the watch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
	Create,
	/// Content written, or a writer closed the file
	Write,
	Rename,
	Remove,
	/// Permissions, timestamps and other attribute changes
	Metadata,
	/// Reads and opens
	Access,
	Other,
}

impl From<notify::EventKind> for ChangeKind {
	fn from(kind: notify::EventKind) -> Self {
		match kind {
			notify::EventKind::Create(_) => ChangeKind::Create,
			notify::EventKind::Modify(modify_kind) => match modify_kind {
				ModifyKind::Name(_) => ChangeKind::Rename,
				ModifyKind::Metadata(_) => ChangeKind::Metadata,
				_ => ChangeKind::Write,
			},
			notify::EventKind::Remove(_) => ChangeKind::Remove,
			notify::EventKind::Access(AccessKind::Close(AccessMode::Write)) => ChangeKind::Write,
			notify::EventKind::Access(_) => ChangeKind::Access,
			_ => ChangeKind::Other,
		}
	}
}

impl ChangeKind {
	/// Whether this change can bring a new file into the watch folder
	///
	/// Mirrors the classic directory-change filter: names, sizes, writes and
	/// creations count; attribute changes and reads do not.
	pub fn triggers_pass(self) -> bool {
		!matches!(self, ChangeKind::Metadata | ChangeKind::Access)
	}
}

/// Whether a notify error means the subscription itself is gone
pub fn is_fatal_notify_error(error: &notify::Error) -> bool {
	matches!(
		error.kind,
		notify::ErrorKind::MaxFilesWatch
			| notify::ErrorKind::WatchNotFound
			| notify::ErrorKind::InvalidConfig(_)
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};

	#[test]
	fn test_change_kind_from_notify() {
		let create = notify::EventKind::Create(CreateKind::File);
		let rename = notify::EventKind::Modify(ModifyKind::Name(RenameMode::To));
		let write = notify::EventKind::Modify(ModifyKind::Data(DataChange::Content));
		let remove = notify::EventKind::Remove(RemoveKind::File);

		assert_eq!(ChangeKind::from(create), ChangeKind::Create);
		assert_eq!(ChangeKind::from(rename), ChangeKind::Rename);
		assert_eq!(ChangeKind::from(write), ChangeKind::Write);
		assert_eq!(ChangeKind::from(remove), ChangeKind::Remove);
	}

	#[test]
	fn test_close_after_write_triggers() {
		let closed = notify::EventKind::Access(AccessKind::Close(AccessMode::Write));
		let read = notify::EventKind::Access(AccessKind::Read);

		assert!(ChangeKind::from(closed).triggers_pass());
		assert!(!ChangeKind::from(read).triggers_pass());
	}

	#[test]
	fn test_metadata_does_not_trigger() {
		let chmod = notify::EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions));
		assert_eq!(ChangeKind::from(chmod), ChangeKind::Metadata);
		assert!(!ChangeKind::Metadata.triggers_pass());
		assert!(ChangeKind::Other.triggers_pass());
	}

	#[test]
	fn test_fatal_notify_errors() {
		assert!(is_fatal_notify_error(&notify::Error::new(notify::ErrorKind::MaxFilesWatch)));
		assert!(is_fatal_notify_error(&notify::Error::new(notify::ErrorKind::WatchNotFound)));
		assert!(!is_fatal_notify_error(&notify::Error::generic("transient")));
		assert!(!is_fatal_notify_error(&notify::Error::io(std::io::Error::new(
			std::io::ErrorKind::Interrupted,
			"interrupted"
		))));
	}
}
