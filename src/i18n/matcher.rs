//! Code matching shared by URL parsing and browser language detection.

use crate::i18n::registry::WILDCARD_SUFFIX;
use crate::i18n::{LanguageTable, ResolvedLanguage};

/// Match a language code against the table.
///
/// Resolution order:
/// 1. A configured language equal to `code` ignoring case, split on its first dash
/// 2. A declared `lang-*` wildcard for the part before the first dash; the
///    country part (if any) is uppercased
/// 3. For `lang-COUNTRY` input, a configured bare `lang`, without country
///
/// The code is split only once, so `en-US-variant` keeps `US-variant` as its
/// country part.
///
/// # Example
/// ```
/// use locale_urls::i18n::{match_code, LanguageTable};
///
/// let table = LanguageTable::parse_list("en-*").unwrap();
/// let resolved = match_code(&table, "en-gb");
/// assert_eq!(resolved.language.as_deref(), Some("en"));
/// assert_eq!(resolved.country.as_deref(), Some("GB"));
/// ```
pub fn match_code(table: &LanguageTable, code: &str) -> ResolvedLanguage {
    if let Some(value) = table.find_language_ignore_case(code) {
        return ResolvedLanguage::split(value);
    }

    let (language, country) = match code.split_once('-') {
        Some((language, country)) => (language, Some(country)),
        None => (code, None),
    };

    if table.contains_language(&format!("{}{}", language, WILDCARD_SUFFIX)) {
        ResolvedLanguage::new(language, country.map(str::to_uppercase))
    } else if country.is_some() && table.contains_language(language) {
        ResolvedLanguage::new(language, None)
    } else {
        ResolvedLanguage::none()
    }
}
