//! Slug validation and uniqueness
//!
//! A slug is the URL path segment of a node. Among the children of one
//! parent, no two nodes whose languages overlap may share a slug; colliding
//! candidates are disambiguated by appending `-1`, `-2`, ...

use crate::error::{CmsError, CmsResult};
use crate::language::Language;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Longest accepted slug
pub const MAX_SLUG_LENGTH: usize = 100;

static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^[a-z0-9_-]+$").expect("Invalid slug regex pattern")
});

static SEPARATORS: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"[^a-z0-9_]+").expect("Invalid separator regex pattern")
});

/// Derive a slug from a title
///
/// # Examples
///
/// ```
/// use canopy_cms::slug::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  About  us "), "about-us");
/// assert_eq!(slugify("!!!"), "");
/// ```
pub fn slugify(title: &str) -> String {
	let lowered = title.to_lowercase();
	let dashed = SEPARATORS.replace_all(&lowered, "-");
	truncate(dashed.trim_matches('-'), MAX_SLUG_LENGTH).to_string()
}

/// Check that `slug` is non-empty, short enough and uses `[a-z0-9_-]` only
pub fn validate_slug(slug: &str) -> CmsResult<()> {
	if slug.is_empty() {
		return Err(CmsError::invalid("slug", "This field is required."));
	}
	if slug.len() > MAX_SLUG_LENGTH {
		return Err(CmsError::invalid(
			"slug",
			format!("Ensure this value has at most {} characters.", MAX_SLUG_LENGTH),
		));
	}
	if !SLUG_PATTERN.is_match(slug) {
		return Err(CmsError::invalid(
			"slug",
			"Use only lowercase letters, numbers, underscores or hyphens.",
		));
	}
	Ok(())
}

/// First free variant of `candidate` among `siblings` for `language`.
///
/// `siblings` are the `(slug, language)` pairs already present under the
/// same parent. Only siblings whose language overlaps `language` compete.
///
/// # Examples
///
/// ```
/// use canopy_cms::language::Language;
/// use canopy_cms::slug::unique_slug;
///
/// let en = Language::code("en");
/// let de = Language::code("de");
/// let siblings = vec![("welcome", &en), ("welcome-1", &Language::Neutral), ("news", &de)];
///
/// assert_eq!(unique_slug("welcome", &en, siblings.clone()), "welcome-2");
/// assert_eq!(unique_slug("news", &en, siblings), "news");
/// ```
pub fn unique_slug<'a, I>(candidate: &str, language: &Language, siblings: I) -> String
where
	I: IntoIterator<Item = (&'a str, &'a Language)>,
{
	let taken: HashSet<&str> = siblings
		.into_iter()
		.filter(|(_, lang)| lang.overlaps(language))
		.map(|(slug, _)| slug)
		.collect();

	if !taken.contains(candidate) {
		return candidate.to_string();
	}

	let mut counter: usize = 1;
	loop {
		let suffix = format!("-{}", counter);
		let base = truncate(candidate, MAX_SLUG_LENGTH.saturating_sub(suffix.len()));
		let attempt = format!("{}{}", base, suffix);
		if !taken.contains(attempt.as_str()) {
			return attempt;
		}
		counter += 1;
	}
}

fn truncate(value: &str, max: usize) -> &str {
	if value.len() <= max {
		return value;
	}
	let mut end = max;
	while !value.is_char_boundary(end) {
		end -= 1;
	}
	&value[..end]
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("welcome", true)]
	#[case("my_page-2", true)]
	#[case("", false)]
	#[case("Welcome", false)]
	#[case("a b", false)]
	#[case("über", false)]
	fn test_validate_slug(#[case] slug: &str, #[case] valid: bool) {
		assert_eq!(validate_slug(slug).is_ok(), valid);
	}

	#[test]
	fn test_validate_slug_length() {
		assert!(validate_slug(&"a".repeat(MAX_SLUG_LENGTH)).is_ok());
		assert!(validate_slug(&"a".repeat(MAX_SLUG_LENGTH + 1)).is_err());
	}

	#[test]
	fn test_unique_slug_keeps_within_length() {
		let en = Language::code("en");
		let long = "a".repeat(MAX_SLUG_LENGTH);
		let siblings = vec![(long.as_str(), &en)];

		let slug = unique_slug(&long, &en, siblings);

		assert_eq!(slug.len(), MAX_SLUG_LENGTH);
		assert!(slug.ends_with("-1"));
	}

	#[test]
	fn test_unique_slug_sequence() {
		let en = Language::code("en");
		let mut existing: Vec<String> = Vec::new();
		for _ in 0..4 {
			let siblings: Vec<(&str, &Language)> =
				existing.iter().map(|s| (s.as_str(), &en)).collect();
			let slug = unique_slug("s", &en, siblings);
			existing.push(slug);
		}
		assert_eq!(existing, vec!["s", "s-1", "s-2", "s-3"]);
	}
}
