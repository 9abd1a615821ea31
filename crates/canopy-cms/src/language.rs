//! Languages of content nodes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language of a content node
///
/// `Neutral` content is visible under every language and collides with
/// every concrete language when slugs are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
	Neutral,
	Code(String),
}

impl Language {
	/// Shorthand for a concrete language
	pub fn code(code: impl Into<String>) -> Self {
		Language::Code(code.into())
	}

	pub fn is_neutral(&self) -> bool {
		matches!(self, Language::Neutral)
	}

	/// The language code, `"0"` for neutral
	pub fn as_str(&self) -> &str {
		match self {
			Language::Neutral => "0",
			Language::Code(code) => code,
		}
	}

	/// Whether two nodes in these languages compete for the same slug
	///
	/// # Examples
	///
	/// ```
	/// use canopy_cms::language::Language;
	///
	/// let en = Language::code("en");
	/// let de = Language::code("de");
	/// assert!(en.overlaps(&en));
	/// assert!(en.overlaps(&Language::Neutral));
	/// assert!(Language::Neutral.overlaps(&de));
	/// assert!(!en.overlaps(&de));
	/// ```
	pub fn overlaps(&self, other: &Language) -> bool {
		self.is_neutral() || other.is_neutral() || self == other
	}

	/// Whether this language is visible when browsing in `current`
	pub fn visible_in(&self, current: &Language) -> bool {
		self.is_neutral() || self == current
	}

	/// Sibling languages renumbered together with this one.
	///
	/// The default language shares its ordering with neutral content; every
	/// other language is ordered on its own.
	pub fn shares_positions_with(&self, other: &Language, default: &str) -> bool {
		let in_default_group = |lang: &Language| match lang {
			Language::Neutral => true,
			Language::Code(code) => code == default,
		};
		if in_default_group(self) {
			in_default_group(other)
		} else {
			self == other
		}
	}
}

impl fmt::Display for Language {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Language {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"" | "0" => Language::Neutral,
			code => Language::Code(code.to_string()),
		})
	}
}

impl From<&str> for Language {
	fn from(value: &str) -> Self {
		match value {
			"" | "0" => Language::Neutral,
			code => Language::Code(code.to_string()),
		}
	}
}
