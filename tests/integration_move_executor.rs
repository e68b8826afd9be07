// Integration tests for single-file moves: collisions, the renaming bound
// and the cross-device fallback

use downloads_janitor::organizer::{MoveFailure, MAX_COLLISION_ATTEMPTS};
use downloads_janitor::{MoveExecutor, MoveOutcome};
use std::fs;

mod common;

#[test]
fn test_collision_keeps_existing_file() {
	let temp_dir = common::setup_temp_dir();
	let (watch, dest) = common::setup_folders(&temp_dir);
	common::create_test_file(&dest.join("report.txt"), "already here").unwrap();
	let source = watch.join("report.txt");
	common::create_test_file(&source, "new report").unwrap();

	let outcome = MoveExecutor::new().move_file(&source, &dest);

	assert_eq!(outcome.destination(), Some(dest.join("report_1.txt").as_path()));
	assert_eq!(fs::read_to_string(dest.join("report.txt")).unwrap(), "already here");
	assert_eq!(fs::read_to_string(dest.join("report_1.txt")).unwrap(), "new report");
	assert!(!source.exists());
}

#[test]
fn test_collision_bound_exhausted() {
	let temp_dir = common::setup_temp_dir();
	let (watch, dest) = common::setup_folders(&temp_dir);
	let executor = MoveExecutor::new();
	let source = watch.join("report.txt");

	common::create_test_file(&dest.join("report.txt"), "original").unwrap();

	for attempt in 1..=MAX_COLLISION_ATTEMPTS {
		common::create_test_file(&source, &format!("copy {attempt}")).unwrap();
		match executor.move_file(&source, &dest) {
			MoveOutcome::MovedWithRename { suffix, .. } => assert_eq!(suffix, attempt),
			other => panic!("Move {attempt} should have been renamed, got {other:?}"),
		}
	}

	common::create_test_file(&source, "one too many").unwrap();
	let outcome = executor.move_file(&source, &dest);

	assert!(matches!(
		outcome,
		MoveOutcome::Failed(MoveFailure::CollisionLimit { attempts: 50, .. })
	));
	assert_eq!(fs::read_to_string(&source).unwrap(), "one too many");
	assert_eq!(fs::read_to_string(dest.join("report_50.txt")).unwrap(), "copy 50");
	assert!(!dest.join("report_51.txt").exists());
}

#[test]
fn test_cross_device_copies_and_removes_source() {
	let temp_dir = common::setup_temp_dir();
	let (watch, dest) = common::setup_folders(&temp_dir);
	let source = watch.join("movie.mkv");
	let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
	fs::write(&source, &payload).unwrap();

	let executor = MoveExecutor::with_filesystem(common::CrossDeviceFilesystem::default());
	let outcome = executor.move_file(&source, &dest);

	let target = dest.join("movie.mkv");
	assert!(matches!(outcome, MoveOutcome::CopiedCrossDevice(ref p) if *p == target));
	assert_eq!(fs::read(&target).unwrap(), payload);
	assert!(!source.exists());
}

#[test]
fn test_cross_device_never_overwrites() {
	let temp_dir = common::setup_temp_dir();
	let (watch, dest) = common::setup_folders(&temp_dir);
	common::create_test_file(&dest.join("song.mp3"), "keep me").unwrap();
	let source = watch.join("song.mp3");
	common::create_test_file(&source, "incoming").unwrap();

	let executor = MoveExecutor::with_filesystem(common::CrossDeviceFilesystem::default());
	let outcome = executor.move_file(&source, &dest);

	assert!(matches!(outcome, MoveOutcome::Failed(MoveFailure::Copy { .. })));
	assert_eq!(fs::read_to_string(dest.join("song.mp3")).unwrap(), "keep me");
	assert!(!dest.join("song_1.mp3").exists());
	assert!(source.exists());
}

#[test]
fn test_cross_device_delete_failure_reports_duplicate() {
	let temp_dir = common::setup_temp_dir();
	let (watch, dest) = common::setup_folders(&temp_dir);
	let source = watch.join("setup.exe");
	common::create_test_file(&source, "binary").unwrap();

	let executor = MoveExecutor::with_filesystem(common::CrossDeviceFilesystem { fail_remove: true });
	let outcome = executor.move_file(&source, &dest);

	match outcome {
		MoveOutcome::Failed(MoveFailure::SourceNotRemoved { copy, .. }) => {
			assert_eq!(copy, dest.join("setup.exe"));
		}
		other => panic!("Expected a source cleanup failure, got {other:?}"),
	}
	assert!(source.exists());
	assert_eq!(fs::read_to_string(dest.join("setup.exe")).unwrap(), "binary");
}

#[test]
fn test_cross_device_after_collision_never_uses_renamed_name() {
	let temp_dir = common::setup_temp_dir();
	let (watch, dest) = common::setup_folders(&temp_dir);
	common::create_test_file(&dest.join("report.txt"), "already here").unwrap();
	let source = watch.join("report.txt");
	common::create_test_file(&source, "incoming").unwrap();

	let executor = MoveExecutor::with_filesystem(common::CollidingCrossDeviceFilesystem);
	let outcome = executor.move_file(&source, &dest);

	match outcome {
		MoveOutcome::Failed(MoveFailure::Copy { target, .. }) => {
			assert_eq!(target, dest.join("report.txt"));
		}
		other => panic!("Expected the copy to the plain name to fail, got {other:?}"),
	}
	assert!(!dest.join("report_1.txt").exists());
	assert_eq!(fs::read_to_string(dest.join("report.txt")).unwrap(), "already here");
	assert_eq!(fs::read_to_string(&source).unwrap(), "incoming");
}
