//! Registering the janitor to start at logon
//!
//! Windows gets a value under the per-user `Run` registry key. Linux and other
//! XDG desktops get an autostart `.desktop` entry. Failures are returned to the
//! caller, which logs them and keeps going.

use crate::error::{JanitorError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name of the registry value and of the autostart entry
pub const STARTUP_NAME: &str = "DownloadsJanitor";

/// Script that starts the janitor without a console window
pub const HIDDEN_LAUNCHER: &str = "RunDownloadsJanitorHidden.vbs";

pub const AUTOSTART_FILE: &str = "downloads-janitor.desktop";

#[cfg(windows)]
const RUN_KEY_PATH: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

/// `<install root>/scripts/<launcher>`, where the install root is the parent of the executable's directory
pub fn hidden_launcher_path(executable: &Path) -> Option<PathBuf> {
	let root = executable.parent()?.parent()?;
	Some(root.join("scripts").join(HIDDEN_LAUNCHER))
}

/// Command line to run at logon
pub fn launch_command(executable: &Path, launcher: Option<&Path>) -> String {
	match launcher {
		Some(script) => format!("wscript.exe \"{}\"", script.display()),
		None => format!("\"{}\"", executable.display()),
	}
}

/// Register `executable` to start at logon and return the registered command
pub fn register(executable: &Path) -> Result<String> {
	let launcher = platform_launcher(executable);
	let command = launch_command(executable, launcher.as_deref());
	register_command(&command)?;
	info!("Startup entry registered successfully: {}", command);
	Ok(command)
}

fn platform_launcher(executable: &Path) -> Option<PathBuf> {
	if !cfg!(windows) {
		return None;
	}

	let script = hidden_launcher_path(executable)?;
	match script.try_exists() {
		Ok(true) => {
			info!("Configuring startup to run via script: {}", script.display());
			Some(script)
		}
		Ok(false) => {
			info!("Hidden launcher script not found; launching the executable directly");
			None
		}
		Err(e) => {
			warn!(
				"Unable to validate hidden launcher script: {}. Launching the executable directly",
				e
			);
			None
		}
	}
}

#[cfg(windows)]
fn register_command(command: &str) -> Result<()> {
	use std::ffi::OsStr;
	use std::io;
	use std::os::windows::ffi::OsStrExt;
	use windows_sys::Win32::Foundation::ERROR_SUCCESS;
	use windows_sys::Win32::System::Registry::{
		RegCloseKey, RegOpenKeyExW, RegSetValueExW, HKEY, HKEY_CURRENT_USER, KEY_SET_VALUE, REG_SZ,
	};

	fn wide(text: &str) -> Vec<u16> {
		OsStr::new(text).encode_wide().chain(std::iter::once(0)).collect()
	}

	let key_path = wide(RUN_KEY_PATH);
	let value_name = wide(STARTUP_NAME);
	let data = wide(command);

	let mut key: HKEY = 0;
	// SAFETY: every pointer refers to a NUL-terminated buffer that outlives the call
	let status =
		unsafe { RegOpenKeyExW(HKEY_CURRENT_USER, key_path.as_ptr(), 0, KEY_SET_VALUE, &mut key) };
	if status != ERROR_SUCCESS {
		return Err(JanitorError::startup(format!(
			"failed to open the Run key: {}",
			io::Error::from_raw_os_error(status as i32)
		)));
	}

	// SAFETY: `key` was opened above; the data length is given in bytes
	let status = unsafe {
		RegSetValueExW(
			key,
			value_name.as_ptr(),
			0,
			REG_SZ,
			data.as_ptr().cast::<u8>(),
			(data.len() * std::mem::size_of::<u16>()) as u32,
		)
	};
	unsafe { RegCloseKey(key) };

	if status != ERROR_SUCCESS {
		return Err(JanitorError::startup(format!(
			"failed to write the Run key value: {}",
			io::Error::from_raw_os_error(status as i32)
		)));
	}
	Ok(())
}

#[cfg(all(unix, not(target_os = "macos")))]
fn register_command(command: &str) -> Result<()> {
	let dir = autostart_dir()
		.ok_or_else(|| JanitorError::startup("neither XDG_CONFIG_HOME nor HOME is set"))?;
	write_autostart_entry(&dir, command).map(|_| ())
}

#[cfg(not(any(windows, all(unix, not(target_os = "macos")))))]
fn register_command(_command: &str) -> Result<()> {
	Err(JanitorError::startup("not supported on this platform"))
}

/// `$XDG_CONFIG_HOME/autostart`, or `$HOME/.config/autostart`
pub fn autostart_dir() -> Option<PathBuf> {
	let config_home = std::env::var_os("XDG_CONFIG_HOME")
		.filter(|value| !value.is_empty())
		.map(PathBuf::from)
		.or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
	Some(config_home.join("autostart"))
}

pub fn desktop_entry(command: &str) -> String {
	format!(
		"[Desktop Entry]\n\
		 Type=Application\n\
		 Name={STARTUP_NAME}\n\
		 Exec={command}\n\
		 NoDisplay=true\n\
		 X-GNOME-Autostart-enabled=true\n"
	)
}

/// Write (or replace) the autostart entry inside `dir`
pub fn write_autostart_entry(dir: &Path, command: &str) -> Result<PathBuf> {
	fs::create_dir_all(dir).map_err(|e| {
		JanitorError::startup(format!("cannot create {}: {}", dir.display(), e))
	})?;

	let entry = dir.join(AUTOSTART_FILE);
	fs::write(&entry, desktop_entry(command)).map_err(|e| {
		JanitorError::startup(format!("cannot write {}: {}", entry.display(), e))
	})?;
	Ok(entry)
}
