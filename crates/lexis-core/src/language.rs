//! Languages with inflection-chart support.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// A language a word set may be tagged with.
///
/// The tag decides which scraper rules apply to the set's words; sets without
/// a tag never have charts scraped for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
  French,
  Russian,
  Ukrainian,
}

impl Language {
  pub const ALL: [Language; 3] =
    [Language::French, Language::Russian, Language::Ukrainian];

  /// The two-letter tag used in word files and in the `lang` column.
  pub fn code(self) -> &'static str {
    match self {
      Self::French => "fr",
      Self::Russian => "ru",
      Self::Ukrainian => "uk",
    }
  }
}

impl FromStr for Language {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "fr" => Ok(Self::French),
      "ru" => Ok(Self::Russian),
      "uk" => Ok(Self::Ukrainian),
      other => Err(Error::UnsupportedLanguage(other.to_owned())),
    }
  }
}

impl TryFrom<String> for Language {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<Language> for String {
  fn from(lang: Language) -> Self { lang.code().to_owned() }
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes_round_trip() {
    for lang in Language::ALL {
      assert_eq!(lang.code().parse::<Language>().unwrap(), lang);
    }
  }

  #[test]
  fn unsupported_tag_is_named_in_error() {
    let err = "de".parse::<Language>().unwrap_err();
    assert!(matches!(err, Error::UnsupportedLanguage(ref tag) if tag == "de"));
    assert!(err.to_string().contains("\"de\""));
  }
}
