//! Language persistence in the session and in a cookie.

use crate::events::{ChangeNotifier, LanguageChanged};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Session storage as provided by the host.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

impl SessionStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

/// Cookie storage as provided by the host.
pub trait CookieStore {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: &str, expiry_seconds: u64, options: &CookieOptions);
}

/// Attributes applied to the language cookie.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CookieOptions {
    pub http_only: bool,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    /// `Strict`, `Lax` or `None`
    pub same_site: Option<String>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            path: "/".to_string(),
            domain: None,
            secure: false,
            same_site: None,
        }
    }
}

/// A cookie written during the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub max_age: u64,
    pub options: CookieOptions,
}

impl CookieOptions {
    /// Render a `Set-Cookie` header value with these attributes.
    ///
    /// Without `max_age` the cookie lasts for the browser session.
    pub fn header_value(&self, name: &str, value: &str, max_age: Option<u64>) -> String {
        let mut header = format!("{}={}; Path={}", name, value, self.path);
        if let Some(max_age) = max_age {
            let seconds = max_age.min(u64::from(u32::MAX)) as i64;
            let expires = Utc::now() + Duration::seconds(seconds);
            header.push_str(&format!(
                "; Max-Age={}; Expires={}",
                max_age,
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
        if let Some(domain) = &self.domain {
            header.push_str("; Domain=");
            header.push_str(domain);
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if let Some(same_site) = &self.same_site {
            header.push_str("; SameSite=");
            header.push_str(same_site);
        }
        header
    }
}

impl Cookie {
    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        self.options
            .header_value(&self.name, &self.value, Some(self.max_age))
    }
}

/// Request cookies plus the cookies written while handling the request.
///
/// Reads see earlier writes, so a value persisted once is what the next
/// load returns.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    values: HashMap<String, String>,
    changes: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` request header (`a=1; b=2`).
    pub fn from_header(header: &str) -> Self {
        let values = header
            .split(';')
            .filter_map(|cookie| {
                let (name, value) = cookie.trim().split_once('=')?;
                Some((name.to_string(), value.to_string()))
            })
            .collect();
        Self {
            values,
            changes: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }

    /// Cookies written during this request, oldest first.
    pub fn changes(&self) -> &[Cookie] {
        &self.changes
    }
}

impl CookieStore for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str, expiry_seconds: u64, options: &CookieOptions) {
        self.values.insert(name.to_string(), value.to_string());
        self.changes.push(Cookie {
            name: name.to_string(),
            value: value.to_string(),
            max_age: expiry_seconds,
            options: options.clone(),
        });
    }
}

/// Loads and stores the persisted language.
#[derive(Debug, Clone, Copy)]
pub struct LanguagePersistence<'a> {
    /// Session key, `None` disables the session
    pub session_key: Option<&'a str>,
    pub cookie_name: &'a str,
    /// Cookie lifetime in seconds, `0` disables the cookie
    pub cookie_duration: u64,
    pub cookie_options: &'a CookieOptions,
}

impl LanguagePersistence<'_> {
    /// Load the persisted language; the session wins over the cookie.
    pub fn load(&self, session: &dyn SessionStore, cookies: &dyn CookieStore) -> Option<String> {
        if let Some(key) = self.session_key {
            if let Some(language) = session.get(key) {
                debug!("Found persisted language '{}' in session", language);
                return Some(language);
            }
        }

        if self.cookie_duration > 0 {
            if let Some(language) = cookies.get(self.cookie_name) {
                debug!("Found persisted language '{}' in cookie", language);
                return Some(language);
            }
        }

        None
    }

    /// Persist `language`, notifying subscribers when it differs from the
    /// previously persisted value.
    pub fn persist(
        &self,
        language: &str,
        session: &mut dyn SessionStore,
        cookies: &mut dyn CookieStore,
        notifier: &ChangeNotifier,
    ) {
        if notifier.has_subscribers() {
            let old_language = self.load(session, cookies);
            if old_language.as_deref() != Some(language) {
                notifier.notify(&LanguageChanged {
                    old_language,
                    language: language.to_string(),
                });
            }
        }

        if let Some(key) = self.session_key {
            session.set(key, language);
            debug!("Persisting language '{}' in session", language);
        }

        if self.cookie_duration > 0 {
            cookies.set(self.cookie_name, language, self.cookie_duration, self.cookie_options);
            debug!("Persisting language '{}' in cookie", language);
        }
    }
}
