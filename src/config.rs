//! Loading of `rules.json`
//!
//! ```json
//! {
//!   "watch_folder": "C:/Users/{{user}}/Downloads",
//!   "user": "alice",
//!   "placeholders": { "media": "D:/Media" },
//!   "use_default_rules": true,
//!   "custom_rules": [
//!     { "extensions": [".mp4", "mkv"], "destination": "{{media}}/Videos" }
//!   ]
//! }
//! ```
//!
//! Default rules come first, custom rules after them, so a custom rule that
//! claims an extension overrides the default for it.

use crate::error::{JanitorError, Result};
use crate::organizer::Rule;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_DIR: &str = "config";
pub const CONFIG_FILE: &str = "rules.json";

/// `{{key}}` substitutions applied to the watch folder and every destination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
	values: BTreeMap<String, String>,
}

impl Placeholders {
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.values.insert(key.into(), value.into());
	}

	/// Collect placeholders from the legacy `user` field and the `placeholders` map
	fn from_document(document: &Map<String, Value>) -> Self {
		let mut placeholders = Self::default();
		let mut add = |key: &str, value: &Value| match value.as_str() {
			Some(text) => placeholders.insert(key, text),
			None => warn!("Placeholder `{}` must be a string", key),
		};

		if let Some(user) = document.get("user") {
			add("user", user);
		}

		match document.get("placeholders") {
			Some(Value::Object(map)) => {
				for (key, value) in map {
					add(key, value);
				}
			}
			Some(_) => warn!("`placeholders` must be an object of key/value strings"),
			None => {}
		}

		placeholders
	}

	/// Replace every occurrence of every known token
	pub fn apply(&self, value: &str) -> String {
		let mut result = value.to_string();
		for (key, replacement) in &self.values {
			let token = format!("{{{{{key}}}}}");
			result = result.replace(&token, replacement);
		}

		if result.contains("{{") {
			warn!("Unresolved placeholder in value `{}`", result);
		}
		result
	}
}

/// Validated configuration: where to watch and what to move where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JanitorConfig {
	pub watch_folder: PathBuf,
	pub rules: Vec<Rule>,
}

impl JanitorConfig {
	/// `<executable dir>/config/rules.json`, or `./config/rules.json`
	pub fn default_path() -> PathBuf {
		let root = std::env::current_exe()
			.ok()
			.and_then(|exe| exe.parent().map(Path::to_path_buf))
			.unwrap_or_else(|| PathBuf::from("."));
		root.join(CONFIG_DIR).join(CONFIG_FILE)
	}

	/// Read, parse and validate a configuration file
	pub fn load(path: &Path) -> Result<Self> {
		let text = fs::read_to_string(path).map_err(|source| JanitorError::ConfigUnreadable {
			path: path.to_path_buf(),
			source,
		})?;
		let document: Value =
			serde_json::from_str(&text).map_err(|source| JanitorError::ConfigSyntax {
				path: path.to_path_buf(),
				source,
			})?;

		let config = Self::from_value(&document)?;
		info!(
			"Loaded {} rule(s) from {}",
			config.rules.len(),
			path.display()
		);
		Ok(config)
	}

	/// Parse an already decoded document
	///
	/// The watch folder is not checked against the filesystem here; see
	/// [`JanitorConfig::validate_watch_folder`].
	pub fn from_value(document: &Value) -> Result<Self> {
		let document = document
			.as_object()
			.ok_or_else(|| JanitorError::invalid_config("root", "expected a JSON object"))?;
		let placeholders = Placeholders::from_document(document);

		let watch_folder = match document.get("watch_folder") {
			Some(Value::String(raw)) => PathBuf::from(placeholders.apply(raw)),
			Some(_) => {
				return Err(JanitorError::invalid_config("watch_folder", "must be a string"))
			}
			None => return Err(JanitorError::invalid_config("watch_folder", "missing")),
		};
		if watch_folder.as_os_str().is_empty() {
			return Err(JanitorError::invalid_config("watch_folder", "cannot be empty"));
		}

		let use_default_rules = match document.get("use_default_rules") {
			Some(Value::Bool(flag)) => *flag,
			Some(_) => {
				return Err(JanitorError::invalid_config(
					"use_default_rules",
					"must be a boolean value",
				))
			}
			None => false,
		};

		let mut rules = Vec::new();

		if use_default_rules {
			match document.get("default_rules") {
				Some(section) => {
					let parsed = parse_rule_array(section, "default_rules", &placeholders)?;
					if parsed.is_empty() {
						info!("`default_rules` is empty; no default rules applied from file");
					}
					rules.extend(parsed);
				}
				None => {
					let defaults = builtin_default_rules(&watch_folder);
					info!("Using built-in default rules ({} rule(s))", defaults.len());
					rules.extend(defaults);
				}
			}
		}

		if let Some(section) = document.get("custom_rules") {
			rules.extend(parse_rule_array(section, "custom_rules", &placeholders)?);
		} else if !use_default_rules {
			match document.get("rules") {
				Some(section) => {
					warn!(
						"The configuration uses the legacy `rules` section; please migrate to `custom_rules`"
					);
					rules.extend(parse_rule_array(section, "rules", &placeholders)?);
				}
				None => warn!(
					"No rules configured. Enable `use_default_rules` or add entries to `custom_rules`"
				),
			}
		}

		if rules.is_empty() {
			warn!("No rules loaded; files will not be moved until rules are provided");
		}

		Ok(Self { watch_folder, rules })
	}

	/// Check that the watch folder exists and is a directory
	pub fn validate_watch_folder(&self) -> Result<()> {
		validate_watch_folder(&self.watch_folder)
	}

	/// Replace the watch folder, validating the new one
	pub fn set_watch_folder(&mut self, watch_folder: PathBuf) -> Result<()> {
		validate_watch_folder(&watch_folder)?;
		self.watch_folder = watch_folder;
		Ok(())
	}
}

pub fn validate_watch_folder(path: &Path) -> Result<()> {
	if path.as_os_str().is_empty() {
		return Err(JanitorError::WatchTargetUnset);
	}
	let metadata = fs::metadata(path).map_err(|e| JanitorError::watch_target(path, e.to_string()))?;
	if !metadata.is_dir() {
		return Err(JanitorError::watch_target(path, "not a directory"));
	}
	Ok(())
}

fn parse_rule_array(section: &Value, name: &str, placeholders: &Placeholders) -> Result<Vec<Rule>> {
	let entries = section
		.as_array()
		.ok_or_else(|| JanitorError::invalid_config(name, "must be an array"))?;

	entries
		.iter()
		.map(|entry| parse_rule(entry, name, placeholders))
		.collect()
}

fn parse_rule(entry: &Value, section: &str, placeholders: &Placeholders) -> Result<Rule> {
	let entry = entry
		.as_object()
		.ok_or_else(|| JanitorError::invalid_config(section, "expected an object"))?;

	let extensions = match entry.get("extensions") {
		Some(Value::Array(items)) => items
			.iter()
			.map(|item| {
				item.as_str().map(str::to_string).ok_or_else(|| {
					JanitorError::invalid_config(section, "each extension must be a string")
				})
			})
			.collect::<Result<Vec<_>>>()?,
		Some(_) => {
			return Err(JanitorError::invalid_config(section, "`extensions` must be an array"))
		}
		None => return Err(JanitorError::invalid_config(section, "missing `extensions` field")),
	};
	if extensions.is_empty() {
		return Err(JanitorError::invalid_config(
			section,
			"at least one extension is required",
		));
	}

	let destination = match entry.get("destination") {
		Some(Value::String(raw)) => placeholders.apply(raw),
		_ => {
			return Err(JanitorError::invalid_config(
				section,
				"missing or invalid `destination`",
			))
		}
	};
	if destination.is_empty() {
		return Err(JanitorError::invalid_config(section, "destination cannot be empty"));
	}

	Ok(Rule::new(extensions, destination))
}

/// The rules applied when `use_default_rules` is set without a `default_rules` section
pub fn builtin_default_rules(watch_folder: &Path) -> Vec<Rule> {
	let folder = |name: &str| watch_folder.join(name);
	vec![
		Rule::new([".exe", ".msi"], folder("Installers")),
		Rule::new([".zip", ".rar", ".7z"], folder("Archives")),
		Rule::new([".jpg", ".jpeg", ".png", ".gif", ".webp"], folder("Images")),
		Rule::new([".pdf"], folder("PDFs")),
		Rule::new([".txt", ".md"], folder("Notes")),
		Rule::new([".mp3", ".wav", ".flac"], folder("Audio")),
		Rule::new([".mp4", ".mkv", ".mov"], folder("Videos")),
	]
}
