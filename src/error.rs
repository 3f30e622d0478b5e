//! Error types for locale resolution.

/// Errors surfaced by the locale layer.
///
/// Unknown or unmatched language codes are never errors; they resolve to a
/// pass-through or a no-op. Only genuine faults end up here.
#[derive(Debug, thiserror::Error)]
pub enum LocaleError {
    /// Locale URLs need pretty URLs (path-info routing) to work.
    #[error("Locale URL support requires pretty URLs to be enabled")]
    PrettyUrlRequired,

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Redirect responses need a 3xx status.
    #[error("Invalid redirect status code {0}: expected 300-399")]
    InvalidRedirectStatus(u16),

    #[error("Invalid language entry: '{0}'")]
    InvalidLanguageEntry(String),

    /// No route could be resolved for the current path while computing a redirect.
    #[error("Page not found: no route matches '{0}'")]
    RouteNotFound(String),
}

pub type Result<T> = std::result::Result<T, LocaleError>;
