//! Language table: the configured URL codes and the languages they map to.
//!
//! The table is ordered. Entries come in three shapes:
//!
//! - plain codes (`en`, `en-US`), where the URL code and the language are the same
//! - aliases (`deutsch=de`), a custom URL segment mapped to a canonical code
//! - wildcards (`es-*`), matching any `es-<COUNTRY>` pair as well as bare `es`

use crate::error::LocaleError;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Suffix that turns a language code into a wildcard entry.
pub const WILDCARD_SUFFIX: &str = "-*";

/// One entry of the language table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct LanguageEntry {
    /// Custom URL segment (e.g. "deutsch"), `None` for plain entries
    pub alias: Option<String>,

    /// Canonical language code (e.g. "de", "en-US") or a wildcard (e.g. "es-*")
    pub language: String,
}

impl LanguageEntry {
    /// Create a plain entry whose URL code is the language itself.
    pub fn code(language: impl Into<String>) -> Self {
        Self {
            alias: None,
            language: language.into(),
        }
    }

    /// Create an alias entry mapping a custom URL segment to a language.
    pub fn alias(alias: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            language: language.into(),
        }
    }

    /// The segment this entry occupies in URLs.
    pub fn url_code(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.language)
    }

    /// Whether the URL code is a `lang-*` wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.url_code().ends_with(WILDCARD_SUFFIX)
    }
}

impl FromStr for LanguageEntry {
    type Err = LocaleError;

    /// Parse `code` or `alias=code`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('=') {
            Some((alias, language)) => {
                let (alias, language) = (alias.trim(), language.trim());
                if alias.is_empty() || language.is_empty() {
                    return Err(LocaleError::InvalidLanguageEntry(s.to_string()));
                }
                Ok(Self::alias(alias, language))
            }
            None if s.is_empty() => Err(LocaleError::InvalidLanguageEntry(s.to_string())),
            None => Ok(Self::code(s)),
        }
    }
}

impl TryFrom<String> for LanguageEntry {
    type Error = LocaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for LanguageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{}={}", alias, self.language),
            None => f.write_str(&self.language),
        }
    }
}

/// Ordered table of configured languages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LanguageTable {
    entries: Vec<LanguageEntry>,
}

impl LanguageTable {
    pub fn new(entries: Vec<LanguageEntry>) -> Self {
        Self { entries }
    }

    /// Parse a comma separated list such as `en-US,en,deutsch=de,es-*`.
    pub fn parse_list(list: &str) -> Result<Self, LocaleError> {
        let entries = list
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    /// Language mapped to an alias key (exact, case-sensitive).
    pub fn language_for_alias(&self, code: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.alias.as_deref() == Some(code))
            .map(|entry| entry.language.as_str())
    }

    /// Whether `language` is one of the configured languages (exact match).
    ///
    /// Wildcards are stored verbatim, so `contains_language("es-*")` tells
    /// whether a wildcard for `es` is declared.
    pub fn contains_language(&self, language: &str) -> bool {
        self.entries.iter().any(|entry| entry.language == language)
    }

    /// First configured language equal to `code` ignoring ASCII case.
    pub fn find_language_ignore_case(&self, code: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.language.eq_ignore_ascii_case(code))
            .map(|entry| entry.language.as_str())
    }

    /// Alias key of the first entry configured for `language`.
    ///
    /// Only the first entry holding the language is considered: when that
    /// entry is a plain code, no alias is returned even if a later alias exists.
    pub fn alias_for(&self, language: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.language == language)
            .and_then(|entry| entry.alias.as_deref())
    }

    /// Regex alternatives for every URL code, longest first.
    ///
    /// A wildcard `lang-*` contributes `lang-[a-z]{2,3}` and the bare `lang`.
    pub fn url_code_alternatives(&self) -> Vec<String> {
        let mut parts = Vec::with_capacity(self.entries.len() * 2);
        for entry in &self.entries {
            let code = entry.url_code();
            match code.strip_suffix(WILDCARD_SUFFIX) {
                Some(base) => {
                    let base = regex::escape(base);
                    parts.push(format!("{}\\-[a-z]{{2,3}}", base));
                    parts.push(base);
                }
                None => parts.push(regex::escape(code)),
            }
        }
        parts.sort_by_key(|part| std::cmp::Reverse(part.chars().count()));
        parts
    }

    /// Case-insensitive regex matching a language prefix at the start of a path.
    ///
    /// Group 1 is the code, group 2 the optional slash that follows it.
    pub fn prefix_regex(&self) -> Result<Regex, regex::Error> {
        let pattern = format!(r"^({})\b(/?)", self.url_code_alternatives().join("|"));
        RegexBuilder::new(&pattern).case_insensitive(true).build()
    }
}

impl From<Vec<LanguageEntry>> for LanguageTable {
    fn from(entries: Vec<LanguageEntry>) -> Self {
        Self::new(entries)
    }
}
