use crate::error::LocaleError;
use crate::i18n::{GeoIpLanguage, LanguageTable};
use crate::persistence::CookieOptions;
use crate::routing::StaticRouteBuilder;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// A pair of regexes excluding requests and routes from locale processing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IgnorePattern {
    /// Matched against the route when creating URLs
    pub route: String,
    /// Matched against the path-info of incoming requests
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    // Languages
    pub languages: LanguageTable,
    pub default_language: String,

    // Feature toggles
    pub enable_locale_urls: bool,
    pub enable_default_language_url_code: bool,
    pub enable_language_detection: bool,
    pub enable_language_persistence: bool,
    pub keep_uppercase_language_code: bool,
    pub enable_pretty_url: bool,

    // Persistence
    pub language_session_key: Option<String>,
    pub language_cookie_name: String,
    pub language_cookie_duration: u64,
    pub language_cookie_options: CookieOptions,

    // URL handling
    pub ignore_language_url_patterns: Vec<IgnorePattern>,
    pub language_param: String,
    pub redirect_status_code: u16,

    // GeoIP
    pub geo_ip_server_var: String,
    pub geo_ip_language_countries: Vec<GeoIpLanguage>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages: LanguageTable::default(),
            default_language: "en".to_string(),
            enable_locale_urls: true,
            enable_default_language_url_code: false,
            enable_language_detection: true,
            enable_language_persistence: true,
            keep_uppercase_language_code: false,
            enable_pretty_url: true,
            language_session_key: Some("_language".to_string()),
            language_cookie_name: "_language".to_string(),
            language_cookie_duration: 2_592_000,
            language_cookie_options: CookieOptions::default(),
            ignore_language_url_patterns: Vec::new(),
            language_param: "language".to_string(),
            redirect_status_code: 302,
            geo_ip_server_var: "HTTP_X_GEO_COUNTRY".to_string(),
            geo_ip_language_countries: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            // Languages - comma list of `code`, `alias=code` or `lang-*`
            languages: match std::env::var("LOCALE_LANGUAGES") {
                Ok(list) => LanguageTable::parse_list(&list).context("Invalid LOCALE_LANGUAGES")?,
                Err(_) => defaults.languages,
            },
            default_language: std::env::var("LOCALE_DEFAULT_LANGUAGE")
                .unwrap_or(defaults.default_language),

            // Feature toggles
            enable_locale_urls: env_bool("LOCALE_ENABLE_URLS", defaults.enable_locale_urls),
            enable_default_language_url_code: env_bool(
                "LOCALE_DEFAULT_LANGUAGE_URL_CODE",
                defaults.enable_default_language_url_code,
            ),
            enable_language_detection: env_bool(
                "LOCALE_ENABLE_DETECTION",
                defaults.enable_language_detection,
            ),
            enable_language_persistence: env_bool(
                "LOCALE_ENABLE_PERSISTENCE",
                defaults.enable_language_persistence,
            ),
            keep_uppercase_language_code: env_bool(
                "LOCALE_KEEP_UPPERCASE",
                defaults.keep_uppercase_language_code,
            ),
            enable_pretty_url: env_bool("LOCALE_ENABLE_PRETTY_URL", defaults.enable_pretty_url),

            // Persistence - an empty session key disables the session
            language_session_key: match std::env::var("LOCALE_SESSION_KEY") {
                Ok(key) if key.is_empty() => None,
                Ok(key) => Some(key),
                Err(_) => defaults.language_session_key,
            },
            language_cookie_name: std::env::var("LOCALE_COOKIE_NAME")
                .unwrap_or(defaults.language_cookie_name),
            language_cookie_duration: std::env::var("LOCALE_COOKIE_DURATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.language_cookie_duration),
            language_cookie_options: CookieOptions {
                secure: env_bool("LOCALE_COOKIE_SECURE", false),
                domain: std::env::var("LOCALE_COOKIE_DOMAIN").ok(),
                same_site: std::env::var("LOCALE_COOKIE_SAME_SITE").ok(),
                ..CookieOptions::default()
            },

            // URL handling - `route=>url` pairs separated by `;`
            ignore_language_url_patterns: match std::env::var("LOCALE_IGNORE_PATTERNS") {
                Ok(list) => parse_ignore_patterns(&list).context("Invalid LOCALE_IGNORE_PATTERNS")?,
                Err(_) => defaults.ignore_language_url_patterns,
            },
            language_param: std::env::var("LOCALE_LANGUAGE_PARAM")
                .unwrap_or(defaults.language_param),
            redirect_status_code: std::env::var("LOCALE_REDIRECT_STATUS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.redirect_status_code),

            // GeoIP - `de=DEU|AUT;fr=FRA`
            geo_ip_server_var: std::env::var("LOCALE_GEOIP_SERVER_VAR")
                .unwrap_or(defaults.geo_ip_server_var),
            geo_ip_language_countries: match std::env::var("LOCALE_GEOIP_LANGUAGES") {
                Ok(list) => GeoIpLanguage::parse_list(&list).context("Invalid LOCALE_GEOIP_LANGUAGES")?,
                Err(_) => defaults.geo_ip_language_countries,
            },
        })
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse locale configuration")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Locale URLs are active when enabled and at least one language is configured.
    pub fn locale_urls_active(&self) -> bool {
        self.enable_locale_urls && !self.languages.is_empty()
    }

    pub fn validate(&self) -> std::result::Result<(), LocaleError> {
        if self.locale_urls_active() && !self.enable_pretty_url {
            return Err(LocaleError::PrettyUrlRequired);
        }
        if !(300..400).contains(&self.redirect_status_code) {
            return Err(LocaleError::InvalidRedirectStatus(self.redirect_status_code));
        }
        Ok(())
    }
}

/// HTTP server and URL layout of the demo application.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Scheme and host used for absolute URLs
    pub host_info: String,
    pub base_url: String,
    pub script_url: String,
    pub show_script_name: bool,
    pub url_suffix: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        Ok(Self {
            port,
            host_info: std::env::var("HOST_INFO")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            base_url: std::env::var("BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_default(),
            script_url: std::env::var("SCRIPT_URL").unwrap_or_default(),
            show_script_name: env_bool("SHOW_SCRIPT_NAME", false),
            url_suffix: std::env::var("URL_SUFFIX").unwrap_or_default(),
        })
    }

    pub fn route_builder(&self) -> StaticRouteBuilder {
        StaticRouteBuilder::new(self.host_info.clone())
            .with_base_url(self.base_url.clone())
            .with_script_url(self.script_url.clone(), self.show_script_name)
            .with_suffix(self.url_suffix.clone())
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn parse_ignore_patterns(list: &str) -> Result<Vec<IgnorePattern>> {
    list.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (route, url) = item
                .split_once("=>")
                .with_context(|| format!("Expected 'route=>url', got '{}'", item))?;
            Ok(IgnorePattern {
                route: route.trim().to_string(),
                url: url.trim().to_string(),
            })
        })
        .collect()
}
