use crate::organizer::rule::{normalize_extension, Rule};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lookup table from normalized extension to destination directory
///
/// Always derived from a full rule list. There is no way to patch a single
/// entry; a changed rule set produces a new index.
#[derive(Debug, Clone, Default)]
pub struct ExtensionIndex {
	destinations: HashMap<String, PathBuf>,
}

impl ExtensionIndex {
	/// Build an index from rules in registration order
	///
	/// When an extension is claimed by several rules the last one wins.
	/// Rules with an empty destination contribute nothing.
	pub fn build(rules: &[Rule]) -> Self {
		let mut destinations = HashMap::new();

		for rule in rules {
			if rule.destination.as_os_str().is_empty() {
				debug!("Ignoring rule with empty destination: {:?}", rule.extensions);
				continue;
			}

			for extension in rule.normalized_extensions() {
				if let Some(previous) = destinations.insert(extension.clone(), rule.destination.clone())
				{
					if previous != rule.destination {
						debug!(
							"Extension {} reassigned from {} to {}",
							extension,
							previous.display(),
							rule.destination.display()
						);
					}
				}
			}
		}

		Self { destinations }
	}

	/// Replace the contents of this index with one built from `rules`
	pub fn rebuild(&mut self, rules: &[Rule]) {
		*self = Self::build(rules);
	}

	/// Destination for a file, based on its extension
	pub fn resolve(&self, file: &Path) -> Option<&Path> {
		let extension = file.extension()?.to_str()?;
		self.resolve_extension(extension)
	}

	/// Destination for a bare extension such as `"JPG"` or `" .jpg "`
	pub fn resolve_extension(&self, extension: &str) -> Option<&Path> {
		let key = normalize_extension(extension)?;
		self.destinations.get(&key).map(PathBuf::as_path)
	}

	pub fn len(&self) -> usize {
		self.destinations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.destinations.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_rules() -> Vec<Rule> {
		vec![
			Rule::new([".jpg", "PNG"], "/dest/images"),
			Rule::new(["pdf"], "/dest/pdfs"),
		]
	}

	#[test]
	fn test_resolve_is_case_and_dot_insensitive() {
		let index = ExtensionIndex::build(&sample_rules());
		let expected = Some(Path::new("/dest/images"));

		assert_eq!(index.resolve_extension("JPG"), expected);
		assert_eq!(index.resolve_extension(".jpg"), expected);
		assert_eq!(index.resolve_extension(" .JPG "), expected);
		assert_eq!(index.resolve(Path::new("/watch/Holiday.JpG")), expected);
		assert_eq!(index.resolve(Path::new("scan.png")), expected);
	}

	#[test]
	fn test_resolve_without_extension() {
		let index = ExtensionIndex::build(&sample_rules());

		assert_eq!(index.resolve(Path::new("README")), None);
		assert_eq!(index.resolve(Path::new("trailing.")), None);
		assert_eq!(index.resolve(Path::new(".jpg")), None);
		assert_eq!(index.resolve(Path::new("notes.txt")), None);
	}

	#[test]
	fn test_empty_rules_resolve_nothing() {
		let mut index = ExtensionIndex::build(&sample_rules());
		assert!(!index.is_empty());

		index.rebuild(&[]);
		assert!(index.is_empty());
		assert_eq!(index.resolve_extension("jpg"), None);
		assert_eq!(index.resolve(Path::new("a.pdf")), None);
	}

	#[test]
	fn test_last_rule_wins() {
		let rules = vec![
			Rule::new([".txt", ".md"], "/dest/notes"),
			Rule::new(["TXT"], "/dest/text"),
		];
		let index = ExtensionIndex::build(&rules);

		assert_eq!(index.resolve_extension(".txt"), Some(Path::new("/dest/text")));
		assert_eq!(index.resolve_extension(".md"), Some(Path::new("/dest/notes")));
		assert_eq!(index.len(), 2);
	}

	#[test]
	fn test_empty_destination_ignored() {
		let rules = vec![Rule::new(["zip"], "/dest/archives"), Rule::new(["zip"], "")];
		let index = ExtensionIndex::build(&rules);

		assert_eq!(index.resolve_extension("zip"), Some(Path::new("/dest/archives")));
	}
}
