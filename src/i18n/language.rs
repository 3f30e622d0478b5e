//! Resolved language: the outcome of matching one code against the table.

/// A `(language, country)` pair produced by code matching.
///
/// Both parts absent means the code did not match anything. The country,
/// when present, is uppercased by the matcher for wildcard matches and taken
/// verbatim from the table otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLanguage {
    /// Canonical language (e.g. "en")
    pub language: Option<String>,

    /// Country or script suffix (e.g. "GB")
    pub country: Option<String>,
}

impl ResolvedLanguage {
    /// The "no match" result.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(language: impl Into<String>, country: Option<String>) -> Self {
        Self {
            language: Some(language.into()),
            country,
        }
    }

    /// Split a table value such as `en-US` on its first dash.
    pub fn split(value: &str) -> Self {
        match value.split_once('-') {
            Some((language, country)) => Self::new(language, Some(country.to_string())),
            None => Self::new(value, None),
        }
    }

    pub fn is_match(&self) -> bool {
        self.language.is_some()
    }

    /// `language-COUNTRY`, bare `language`, or `None` when nothing matched.
    pub fn tag(&self) -> Option<String> {
        let language = self.language.as_deref()?;
        Some(match &self.country {
            Some(country) => format!("{}-{}", language, country),
            None => language.to_string(),
        })
    }
}
