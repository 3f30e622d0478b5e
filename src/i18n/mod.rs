//! Language table, code matching and language detection.
//!
//! # Architecture
//!
//! - `registry`: The ordered table of URL codes, aliases and wildcards
//! - `language`: `ResolvedLanguage`, the `(language, country)` outcome of a match
//! - `matcher`: The code matching algorithm shared by URL parsing and detection
//! - `detection`: Browser (`Accept-Language`) and GeoIP based detection
//!
//! # Example
//!
//! ```
//! use locale_urls::i18n::{match_code, LanguageTable};
//!
//! let table = LanguageTable::parse_list("en-US,en,deutsch=de,es-*").unwrap();
//! assert_eq!(match_code(&table, "es-mx").tag().as_deref(), Some("es-MX"));
//! assert_eq!(table.language_for_alias("deutsch"), Some("de"));
//! ```

mod detection;
mod language;
mod matcher;
mod registry;

pub use detection::{parse_accept_language, GeoIpLanguage, LanguageDetector};
pub use language::ResolvedLanguage;
pub use matcher::match_code;
pub use registry::{LanguageEntry, LanguageTable, WILDCARD_SUFFIX};
