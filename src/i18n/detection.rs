//! Language detection from browser preferences and GeoIP country codes.

use crate::error::LocaleError;
use crate::i18n::{match_code, LanguageTable};
use serde::Deserialize;
use tracing::debug;

/// Maps a language to the GeoIP country codes that should select it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeoIpLanguage {
    /// Language to select (e.g. "de")
    pub language: String,

    /// Country codes as reported by the GeoIP source (e.g. "DEU", "AUT")
    pub countries: Vec<String>,
}

impl GeoIpLanguage {
    pub fn new(language: impl Into<String>, countries: &[&str]) -> Self {
        Self {
            language: language.into(),
            countries: countries.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Parse `de=DEU|AUT;fr=FRA` into an ordered list.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, LocaleError> {
        list.split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                let (language, countries) = item
                    .split_once('=')
                    .ok_or_else(|| LocaleError::InvalidLanguageEntry(item.to_string()))?;
                let language = language.trim();
                if language.is_empty() {
                    return Err(LocaleError::InvalidLanguageEntry(item.to_string()));
                }
                Ok(Self {
                    language: language.to_string(),
                    countries: countries
                        .split('|')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string)
                        .collect(),
                })
            })
            .collect()
    }
}

/// Detects a language for requests that carry no language in the URL and
/// have nothing persisted.
#[derive(Debug, Clone, Copy)]
pub struct LanguageDetector<'a> {
    table: &'a LanguageTable,
    geo_languages: &'a [GeoIpLanguage],
    header_detection: bool,
}

impl<'a> LanguageDetector<'a> {
    pub fn new(
        table: &'a LanguageTable,
        geo_languages: &'a [GeoIpLanguage],
        header_detection: bool,
    ) -> Self {
        Self {
            table,
            geo_languages,
            header_detection,
        }
    }

    /// Detect a language.
    ///
    /// Browser languages are tried in preference order when header detection
    /// is enabled. The GeoIP lookup runs whenever a country value is present,
    /// independent of the header detection toggle.
    ///
    /// # Arguments
    /// * `acceptable_languages` - Browser languages, most preferred first
    /// * `geo_country` - Country code from the GeoIP server variable, if any
    ///
    /// # Returns
    /// `language-COUNTRY` or `language` for a header match, the configured
    /// language for a GeoIP match, `None` otherwise.
    pub fn detect(&self, acceptable_languages: &[String], geo_country: Option<&str>) -> Option<String> {
        if self.header_detection {
            for acceptable in acceptable_languages {
                if let Some(language) = match_code(self.table, acceptable).tag() {
                    debug!("Detected browser language '{}'", language);
                    return Some(language);
                }
            }
        }

        let country = geo_country?;
        let geo = self
            .geo_languages
            .iter()
            .find(|geo| geo.countries.iter().any(|c| c == country))?;
        debug!("Detected GeoIP language '{}' for country '{}'", geo.language, country);
        Some(geo.language.clone())
    }
}

/// Parse an `Accept-Language` header into tags ordered by preference.
///
/// Tags are sorted by descending quality (ties keep header order). Entries
/// with `q=0` and the `*` wildcard are dropped.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }

            let mut quality = 1.0_f32;
            for param in pieces {
                if let Some((key, value)) = param.split_once('=') {
                    if key.trim() == "q" {
                        quality = value.trim().parse::<f32>().unwrap_or(0.0).clamp(0.0, 1.0);
                    }
                }
            }

            (quality > 0.0).then(|| (tag.to_string(), quality))
        })
        .collect();

    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}
