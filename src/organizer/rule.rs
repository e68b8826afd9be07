use std::path::PathBuf;

/// Associates a set of extensions with the directory that receives them
///
/// Extensions may be handed over raw (`"JPG"`, `" .png "`); they are
/// normalized when the extension index is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
	pub extensions: Vec<String>,
	/// Absolute, or relative to the watch folder
	pub destination: PathBuf,
}

impl Rule {
	pub fn new<I, S>(extensions: I, destination: impl Into<PathBuf>) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			extensions: extensions.into_iter().map(Into::into).collect(),
			destination: destination.into(),
		}
	}

	/// Normalized extensions of this rule, dropping entries that normalize to nothing
	pub fn normalized_extensions(&self) -> impl Iterator<Item = String> + '_ {
		self.extensions.iter().filter_map(|ext| normalize_extension(ext))
	}
}

/// Normalize an extension for lookup
///
/// Whitespace is stripped wherever it occurs, the result is lower-cased and
/// carries exactly one leading dot. Returns `None` when nothing is left.
pub fn normalize_extension(raw: &str) -> Option<String> {
	let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
	let bare = stripped.trim_start_matches('.');
	if bare.is_empty() {
		return None;
	}

	Some(format!(".{}", bare.to_lowercase()))
}
