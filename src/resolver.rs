//! Locale resolution for incoming requests and generated URLs.
//!
//! The host router calls into [`LocaleResolver`] at two points:
//!
//! 1. before route matching, [`LocaleResolver::process_incoming_request`]
//!    strips a language prefix from the path or decides on a redirect
//! 2. after building a route's URL, [`LocaleResolver::create_url`] injects
//!    the language segment
//!
//! Per-request state lives in [`RequestContext`]; the resolver itself is
//! immutable once built and can be shared across requests.

use crate::config::Config;
use crate::error::{LocaleError, Result};
use crate::events::{ChangeNotifier, LanguageChanged};
use crate::i18n::{match_code, LanguageDetector, ResolvedLanguage};
use crate::persistence::{CookieStore, LanguagePersistence, SessionStore};
use crate::routing::{RouteBuilder, UrlParams};
use crate::splice::insert_language_segment;
use regex::Regex;
use tracing::{debug, info};

/// What the host router should do after locale processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do, route the request as is.
    NoOp,
    /// A language prefix was stripped; route the remaining path-info.
    Continue(String),
    /// Redirect to the current route with this language forced.
    ///
    /// An empty language keeps the active language of the request.
    Redirect(String),
}

/// Per-request locale state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    path_info: String,
    language: String,
    processed: bool,
}

impl RequestContext {
    /// Start a request with its path-info (no leading slash) and the language
    /// it should use until one is resolved.
    pub fn new(path_info: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            path_info: path_info.into(),
            language: language.into(),
            processed: false,
        }
    }

    pub fn path_info(&self) -> &str {
        &self.path_info
    }

    /// Active language of the request.
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }
}

/// Read access to the request plus the host's session and cookie stores.
pub struct RequestSources<'a> {
    pub session: &'a mut dyn SessionStore,
    pub cookies: &'a mut dyn CookieStore,
    /// Browser languages, most preferred first
    pub accept_languages: &'a [String],
    /// Value of the GeoIP server variable
    pub geo_country: Option<&'a str>,
    /// The host's URL normalizer wants this request redirected
    pub normalized: bool,
}

#[derive(Debug)]
struct CompiledIgnorePattern {
    route: Regex,
    url: Regex,
}

/// Detects the request language and keeps it in generated URLs.
#[derive(Debug)]
pub struct LocaleResolver {
    config: Config,
    prefix_regex: Option<Regex>,
    ignore_patterns: Vec<CompiledIgnorePattern>,
    notifier: ChangeNotifier,
}

impl LocaleResolver {
    /// Validate the configuration and compile its patterns.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let prefix_regex = if config.languages.is_empty() {
            None
        } else {
            let regex = config.languages.prefix_regex().map_err(|source| LocaleError::InvalidPattern {
                pattern: config.languages.url_code_alternatives().join("|"),
                source,
            })?;
            Some(regex)
        };

        let ignore_patterns = config
            .ignore_language_url_patterns
            .iter()
            .map(|pattern| {
                Ok(CompiledIgnorePattern {
                    route: compile(&pattern.route)?,
                    url: compile(&pattern.url)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            prefix_regex,
            ignore_patterns,
            notifier: ChangeNotifier::new(),
        })
    }

    /// Subscribe to changes of the persisted language.
    pub fn on_language_changed<F>(&mut self, handler: F)
    where
        F: Fn(&LanguageChanged) + Send + Sync + 'static,
    {
        self.notifier.subscribe(handler);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn default_language(&self) -> &str {
        &self.config.default_language
    }

    /// A fresh context for a request, starting on the default language.
    pub fn request_context(&self, path_info: impl Into<String>) -> RequestContext {
        RequestContext::new(path_info, self.config.default_language.clone())
    }

    pub fn match_code(&self, code: &str) -> ResolvedLanguage {
        match_code(&self.config.languages, code)
    }

    pub fn detect_language(&self, accept_languages: &[String], geo_country: Option<&str>) -> Option<String> {
        LanguageDetector::new(
            &self.config.languages,
            &self.config.geo_ip_language_countries,
            self.config.enable_language_detection,
        )
        .detect(accept_languages, geo_country)
    }

    pub fn load_persisted_language(&self, sources: &RequestSources<'_>) -> Option<String> {
        self.persistence().load(&*sources.session, &*sources.cookies)
    }

    /// Store the language in session and cookie, notifying on change.
    pub fn persist_language(&self, language: &str, sources: &mut RequestSources<'_>) {
        self.persistence()
            .persist(language, sources.session, sources.cookies, &self.notifier);
    }

    /// Extract the language from the request path or decide on a redirect.
    ///
    /// Runs at most once per request: later calls on the same context are
    /// no-ops.
    pub fn process_incoming_request(
        &self,
        ctx: &mut RequestContext,
        sources: &mut RequestSources<'_>,
    ) -> Action {
        let Some(prefix_regex) = self.prefix_regex.as_ref().filter(|_| self.config.enable_locale_urls) else {
            return Action::NoOp;
        };

        if let Some(pattern) = self.ignore_patterns.iter().find(|p| p.url.is_match(&ctx.path_info)) {
            debug!(
                "Ignore pattern '{}' matches '{}'. Skipping language processing.",
                pattern.url.as_str(),
                ctx.path_info
            );
            return Action::NoOp;
        }

        if ctx.processed {
            return Action::NoOp;
        }
        ctx.processed = true;

        let prefix = prefix_regex
            .captures(&ctx.path_info)
            .and_then(|caps| Some((caps.get(1)?.as_str().to_string(), caps.get(0)?.end())));

        match prefix {
            Some((code, end)) => {
                ctx.path_info = ctx.path_info[end..].to_string();
                self.process_url_language(ctx, sources, &code)
            }
            None => self.process_missing_language(sources),
        }
    }

    fn process_url_language(
        &self,
        ctx: &mut RequestContext,
        sources: &mut RequestSources<'_>,
        code: &str,
    ) -> Action {
        let language = match self.config.languages.language_for_alias(code) {
            Some(language) => language.to_string(),
            None => match self.match_code(code) {
                ResolvedLanguage {
                    language: Some(language),
                    country: Some(country),
                } => {
                    let tag = format!("{}-{}", language, country);
                    if code == tag && !self.config.keep_uppercase_language_code {
                        // ll-CC canonicalizes to ll-cc
                        return Action::Redirect(code.to_lowercase());
                    }
                    tag
                }
                ResolvedLanguage {
                    language: Some(language),
                    country: None,
                } => language,
                ResolvedLanguage { language: None, .. } => code.to_string(),
            },
        };

        debug!("Language code found in URL. Setting language to '{}'", language);
        ctx.language = language;
        if self.config.enable_language_persistence {
            self.persist_language(&ctx.language, sources);
        }

        let reset = !self.config.enable_default_language_url_code
            && ctx.language == self.config.default_language;
        if reset || sources.normalized {
            return Action::Redirect(String::new());
        }

        Action::Continue(ctx.path_info.clone())
    }

    fn process_missing_language(&self, sources: &mut RequestSources<'_>) -> Action {
        let mut language = None;
        if self.config.enable_language_persistence {
            language = self.load_persisted_language(sources);
        }
        if language.is_none() {
            language = self.detect_language(sources.accept_languages, sources.geo_country);
        }

        let language = match language {
            Some(language) if language != self.config.default_language => language,
            _ if !self.config.enable_default_language_url_code => return Action::NoOp,
            _ => self.config.default_language.clone(),
        };

        if !self.match_code(&language).is_match() {
            debug!("Ignoring unknown language '{}'", language);
            return Action::NoOp;
        }

        let language = match self.config.languages.alias_for(&language) {
            Some(alias) => alias.to_string(),
            None => language,
        };
        Action::Redirect(self.url_code_case(language))
    }

    /// Create a URL for a route, adding the language segment where needed.
    ///
    /// The language comes from the language parameter if present, otherwise
    /// from the request context. An empty language never gets a segment.
    pub fn create_url(&self, ctx: &RequestContext, mut params: UrlParams, routes: &dyn RouteBuilder) -> String {
        let route = params.route.trim_matches('/');
        if self.ignore_patterns.iter().any(|p| p.route.is_match(route)) {
            return routes.build(&params);
        }
        if !self.config.locale_urls_active() {
            return routes.build(&params);
        }

        let given = params.remove(&self.config.language_param);
        let is_language_given = given.is_some();
        let language = given.unwrap_or_else(|| ctx.language.clone());
        let url = routes.build(&params);

        let is_default = language == self.config.default_language;
        let inject = !language.is_empty()
            && (!is_default
                || self.config.enable_default_language_url_code
                || (is_language_given
                    && (self.config.enable_language_persistence || self.config.enable_language_detection)));
        if !inject {
            return url;
        }

        let segment = match self.config.languages.alias_for(&language) {
            Some(alias) => alias.to_string(),
            None => language,
        };
        let prefix = if routes.show_script_name() {
            routes.script_url()
        } else {
            routes.base_url()
        };
        insert_language_segment(
            &url,
            prefix,
            &self.url_code_case(segment),
            routes.suffix(),
        )
    }

    /// Like [`create_url`](Self::create_url), but always absolute.
    pub fn create_absolute_url(
        &self,
        ctx: &RequestContext,
        params: UrlParams,
        scheme: Option<&str>,
        routes: &dyn RouteBuilder,
    ) -> String {
        let mut url = self.create_url(ctx, params, routes);
        if !url.contains("://") {
            url = format!("{}{}", routes.host_info(), url);
        }
        if let (Some(scheme), Some(pos)) = (scheme, url.find("://")) {
            url = format!("{}{}", scheme, &url[pos..]);
        }
        url
    }

    /// Compute the target of a [`Action::Redirect`].
    ///
    /// The current route is resolved from the (already stripped) path-info,
    /// query parameters are carried over and the URL is rebuilt with the
    /// target language.
    ///
    /// # Returns
    /// * `Ok(Some(url))` - redirect to `url`
    /// * `Ok(None)` - the URL equals `current_url`, do not redirect
    /// * `Err(LocaleError::RouteNotFound)` - no route matches the path
    pub fn redirect_url(
        &self,
        ctx: &RequestContext,
        language: &str,
        routes: &dyn RouteBuilder,
        query: &[(String, String)],
        current_url: &str,
    ) -> Result<Option<String>> {
        let mut params = routes
            .parse_path(&ctx.path_info)
            .ok_or_else(|| LocaleError::RouteNotFound(ctx.path_info.clone()))?;

        if !language.is_empty() {
            params.insert(&self.config.language_param, language);
        }
        for (key, value) in query {
            if !params.contains(key) {
                params.insert(key, value);
            }
        }

        let bare_root = params.route.is_empty() && params.is_empty();
        let mut url = self.create_url(ctx, params, routes);
        if bare_root && routes.suffix() == "/" {
            url = format!("{}/", url.trim_end_matches('/'));
        }

        if url == current_url {
            debug!("Skipping redirect to the current URL {}", url);
            return Ok(None);
        }

        info!("Redirecting to {}", url);
        Ok(Some(url))
    }

    fn persistence(&self) -> LanguagePersistence<'_> {
        LanguagePersistence {
            session_key: self.config.language_session_key.as_deref(),
            cookie_name: &self.config.language_cookie_name,
            cookie_duration: self.config.language_cookie_duration,
            cookie_options: &self.config.language_cookie_options,
        }
    }

    fn url_code_case(&self, code: String) -> String {
        if self.config.keep_uppercase_language_code {
            code
        } else {
            code.to_lowercase()
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| LocaleError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IgnorePattern;
    use crate::i18n::LanguageTable;
    use crate::persistence::CookieJar;
    use crate::routing::StaticRouteBuilder;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn config(languages: &str) -> Config {
        Config {
            languages: LanguageTable::parse_list(languages).unwrap(),
            ..Config::default()
        }
    }

    fn resolver(config: Config) -> LocaleResolver {
        LocaleResolver::new(config).expect("valid config")
    }

    /// Session, cookies and header inputs for one request.
    #[derive(Default)]
    struct Request {
        session: HashMap<String, String>,
        cookies: CookieJar,
        accept_languages: Vec<String>,
        geo_country: Option<String>,
        normalized: bool,
    }

    impl Request {
        fn sources(&mut self) -> RequestSources<'_> {
            RequestSources {
                session: &mut self.session,
                cookies: &mut self.cookies,
                accept_languages: &self.accept_languages,
                geo_country: self.geo_country.as_deref(),
                normalized: self.normalized,
            }
        }

        fn accepting(mut self, languages: &[&str]) -> Self {
            self.accept_languages = languages.iter().map(|l| l.to_string()).collect();
            self
        }
    }

    fn process(resolver: &LocaleResolver, path: &str, request: &mut Request) -> (Action, RequestContext) {
        let mut ctx = resolver.request_context(path);
        let action = resolver.process_incoming_request(&mut ctx, &mut request.sources());
        (action, ctx)
    }

    // ==================== Initialization Tests ====================

    #[test]
    fn test_new_rejects_disabled_pretty_urls() {
        let config = Config {
            enable_pretty_url: false,
            ..config("en,de")
        };
        assert!(matches!(LocaleResolver::new(config), Err(LocaleError::PrettyUrlRequired)));
    }

    #[test]
    fn test_new_rejects_invalid_ignore_pattern() {
        let config = Config {
            ignore_language_url_patterns: vec![IgnorePattern {
                route: "(".to_string(),
                url: "^api".to_string(),
            }],
            ..config("en,de")
        };
        assert!(matches!(
            LocaleResolver::new(config),
            Err(LocaleError::InvalidPattern { .. })
        ));
    }

    // ==================== URL Prefix Tests ====================

    #[test]
    fn test_alias_prefix_sets_language_and_persists() {
        let resolver = resolver(config("en-US,en,deutsch=de"));
        let mut request = Request::default();

        let (action, ctx) = process(&resolver, "deutsch/site/page", &mut request);

        assert_eq!(action, Action::Continue("site/page".to_string()));
        assert_eq!(ctx.language(), "de");
        assert_eq!(ctx.path_info(), "site/page");
        assert_eq!(request.session.get("_language").map(String::as_str), Some("de"));
        assert_eq!(CookieStore::get(&request.cookies, "_language").as_deref(), Some("de"));
    }

    #[test]
    fn test_longest_code_wins() {
        let resolver = resolver(config("en,en-US"));
        let (action, ctx) = process(&resolver, "en-us/page", &mut Request::default());
        assert_eq!(action, Action::Continue("page".to_string()));
        assert_eq!(ctx.language(), "en-US");
    }

    #[test]
    fn test_default_language_prefix_resets() {
        let resolver = resolver(config("en,de"));
        let (action, ctx) = process(&resolver, "en/page", &mut Request::default());
        assert_eq!(action, Action::Redirect(String::new()));
        assert_eq!(ctx.path_info(), "page");
    }

    #[test]
    fn test_default_language_prefix_kept_with_url_code() {
        let resolver = resolver(Config {
            enable_default_language_url_code: true,
            ..config("en,de")
        });
        let (action, _) = process(&resolver, "en/page", &mut Request::default());
        assert_eq!(action, Action::Continue("page".to_string()));
    }

    #[test]
    fn test_uppercase_country_redirects_to_lowercase() {
        let resolver = resolver(config("en-US,de-*"));
        let (action, ctx) = process(&resolver, "de-AT/page", &mut Request::default());
        assert_eq!(action, Action::Redirect("de-at".to_string()));
        assert_eq!(ctx.language(), "en");
    }

    #[test]
    fn test_lowercase_wildcard_code_is_accepted() {
        let resolver = resolver(config("en-US,de-*"));
        let (action, ctx) = process(&resolver, "de-at/page", &mut Request::default());
        assert_eq!(action, Action::Continue("page".to_string()));
        assert_eq!(ctx.language(), "de-AT");
    }

    #[test]
    fn test_uppercase_kept_when_configured() {
        let resolver = resolver(Config {
            keep_uppercase_language_code: true,
            ..config("en,de-*")
        });
        let (action, ctx) = process(&resolver, "de-AT", &mut Request::default());
        assert_eq!(action, Action::Continue(String::new()));
        assert_eq!(ctx.language(), "de-AT");
    }

    #[test]
    fn test_normalized_request_always_redirects() {
        let resolver = resolver(config("en,de"));
        let mut request = Request {
            normalized: true,
            ..Request::default()
        };
        let (action, ctx) = process(&resolver, "de/page", &mut request);
        assert_eq!(action, Action::Redirect(String::new()));
        assert_eq!(ctx.language(), "de");
    }

    #[test]
    fn test_prefix_without_persistence() {
        let resolver = resolver(Config {
            enable_language_persistence: false,
            ..config("en,de")
        });
        let mut request = Request::default();
        let (action, _) = process(&resolver, "de", &mut request);
        assert_eq!(action, Action::Continue(String::new()));
        assert!(request.session.is_empty());
        assert!(request.cookies.changes().is_empty());
    }

    // ==================== Missing Prefix Tests ====================

    #[test]
    fn test_no_prefix_default_language_is_noop() {
        let resolver = resolver(config("en,de"));
        let mut request = Request::default().accepting(&["en-GB"]);
        let (action, ctx) = process(&resolver, "site/page", &mut request);
        assert_eq!(action, Action::NoOp);
        assert_eq!(ctx.language(), "en");
    }

    #[test]
    fn test_no_prefix_session_wins_over_cookie() {
        let resolver = resolver(config("en,de,fr"));
        let mut request = Request::default().accepting(&["en"]);
        request.session.insert("_language".to_string(), "de".to_string());
        request.cookies = CookieJar::new().with_cookie("_language", "fr");

        let (action, _) = process(&resolver, "site/page", &mut request);
        assert_eq!(action, Action::Redirect("de".to_string()));
    }

    #[test]
    fn test_no_prefix_detects_browser_language() {
        let resolver = resolver(config("en,de-*"));
        let mut request = Request::default().accepting(&["de-CH", "en"]);
        let (action, _) = process(&resolver, "", &mut request);
        assert_eq!(action, Action::Redirect("de-ch".to_string()));
    }

    #[test]
    fn test_no_prefix_geoip_detection() {
        let resolver = resolver(Config {
            enable_language_detection: false,
            geo_ip_language_countries: vec![crate::i18n::GeoIpLanguage::new("de", &["DEU"])],
            ..config("en,de")
        });
        let mut request = Request {
            geo_country: Some("DEU".to_string()),
            ..Request::default()
        }
        .accepting(&["en"]);
        let (action, _) = process(&resolver, "page", &mut request);
        assert_eq!(action, Action::Redirect("de".to_string()));
    }

    #[test]
    fn test_no_prefix_prefers_alias() {
        let resolver = resolver(config("en,deutsch=de"));
        let mut request = Request::default();
        request.session.insert("_language".to_string(), "de".to_string());
        let (action, _) = process(&resolver, "page", &mut request);
        assert_eq!(action, Action::Redirect("deutsch".to_string()));
    }

    #[test]
    fn test_no_prefix_unknown_persisted_language_is_noop() {
        let resolver = resolver(config("en,de"));
        let mut request = Request::default();
        request.session.insert("_language".to_string(), "xx".to_string());
        let (action, _) = process(&resolver, "page", &mut request);
        assert_eq!(action, Action::NoOp);
    }

    #[test]
    fn test_no_prefix_default_with_url_code_redirects() {
        let resolver = resolver(Config {
            enable_default_language_url_code: true,
            ..config("en,de")
        });
        let (action, _) = process(&resolver, "page", &mut Request::default());
        assert_eq!(action, Action::Redirect("en".to_string()));
    }

    // ==================== Guard Tests ====================

    #[test]
    fn test_disabled_locale_urls_are_noop() {
        let resolver = resolver(Config {
            enable_locale_urls: false,
            ..config("en,de")
        });
        let (action, ctx) = process(&resolver, "de/page", &mut Request::default());
        assert_eq!(action, Action::NoOp);
        assert_eq!(ctx.path_info(), "de/page");
    }

    #[test]
    fn test_empty_table_is_noop() {
        let resolver = resolver(Config::default());
        let (action, _) = process(&resolver, "de/page", &mut Request::default());
        assert_eq!(action, Action::NoOp);
    }

    #[test]
    fn test_ignore_url_pattern_bypasses_processing() {
        let resolver = resolver(Config {
            ignore_language_url_patterns: vec![IgnorePattern {
                route: "^api/".to_string(),
                url: "^de/api/".to_string(),
            }],
            ..config("en,de")
        });
        let (action, ctx) = process(&resolver, "de/api/users", &mut Request::default());
        assert_eq!(action, Action::NoOp);
        assert!(!ctx.is_processed());
    }

    #[test]
    fn test_second_call_is_noop() {
        let resolver = resolver(config("en,de"));
        let mut request = Request::default();
        let mut ctx = resolver.request_context("de/de/page");
        let first = resolver.process_incoming_request(&mut ctx, &mut request.sources());
        let second = resolver.process_incoming_request(&mut ctx, &mut request.sources());
        assert_eq!(first, Action::Continue("de/page".to_string()));
        assert_eq!(second, Action::NoOp);
        assert_eq!(ctx.path_info(), "de/page");
    }

    // ==================== Change Notification Tests ====================

    #[test]
    fn test_change_notification_fires_once_per_change() {
        let mut resolver = resolver(config("en,de"));
        let events = Arc::new(Mutex::new(Vec::new()));
        let recorded = events.clone();
        resolver.on_language_changed(move |event| recorded.lock().unwrap().push(event.clone()));

        let mut request = Request::default();
        process(&resolver, "de/page", &mut request);
        process(&resolver, "de/other", &mut request);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].old_language, None);
        assert_eq!(events[0].language, "de");
    }

    // ==================== Create URL Tests ====================

    #[test]
    fn test_create_url_uses_active_language() {
        let resolver = resolver(config("en,de"));
        let routes = StaticRouteBuilder::new("http://localhost");
        let ctx = RequestContext::new("", "de");
        assert_eq!(resolver.create_url(&ctx, UrlParams::new("site/page"), &routes), "/de/site/page");
    }

    #[test]
    fn test_create_url_default_language_has_no_prefix() {
        let resolver = resolver(config("en,de"));
        let routes = StaticRouteBuilder::new("http://localhost");
        let ctx = resolver.request_context("");
        assert_eq!(resolver.create_url(&ctx, UrlParams::new("site/page"), &routes), "/site/page");
    }

    #[test]
    fn test_create_url_explicit_default_language_for_reset_links() {
        let resolver = resolver(config("en,de"));
        let routes = StaticRouteBuilder::new("http://localhost");
        let ctx = RequestContext::new("", "de");
        let params = UrlParams::new("site/page").with("language", "en");
        assert_eq!(resolver.create_url(&ctx, params, &routes), "/en/site/page");

        let resolver = self::resolver(Config {
            enable_language_persistence: false,
            enable_language_detection: false,
            ..config("en,de")
        });
        let params = UrlParams::new("site/page").with("language", "en");
        assert_eq!(resolver.create_url(&ctx, params, &routes), "/site/page");
    }

    #[test]
    fn test_create_url_empty_language_has_no_prefix() {
        let resolver = resolver(config("en,de"));
        let routes = StaticRouteBuilder::new("http://localhost");
        let ctx = RequestContext::new("", "de");
        let params = UrlParams::new("site/page").with("language", "");
        assert_eq!(resolver.create_url(&ctx, params, &routes), "/site/page");
    }

    #[test]
    fn test_create_url_alias_and_case() {
        let resolver = resolver(config("en,deutsch=de,en-US"));
        let routes = StaticRouteBuilder::new("http://localhost");
        let ctx = RequestContext::new("", "de");
        assert_eq!(resolver.create_url(&ctx, UrlParams::new("a").with("x", "1"), &routes), "/deutsch/a?x=1");
        let ctx = RequestContext::new("", "en-US");
        assert_eq!(resolver.create_url(&ctx, UrlParams::new("a"), &routes), "/en-us/a");
    }

    #[test]
    fn test_create_url_root_with_base_url() {
        let resolver = resolver(config("en,de"));
        let routes = StaticRouteBuilder::new("http://localhost").with_base_url("/base");
        let ctx = RequestContext::new("", "de");
        assert_eq!(resolver.create_url(&ctx, UrlParams::new(""), &routes), "/base/de");
        assert_eq!(
            resolver.create_url(&ctx, UrlParams::new("").with("x", "y"), &routes),
            "/base/de?x=y"
        );
    }

    #[test]
    fn test_create_url_ignored_route() {
        let resolver = resolver(Config {
            ignore_language_url_patterns: vec![IgnorePattern {
                route: "^api/".to_string(),
                url: "^api/".to_string(),
            }],
            ..config("en,de")
        });
        let routes = StaticRouteBuilder::new("http://localhost");
        let ctx = RequestContext::new("", "de");
        assert_eq!(resolver.create_url(&ctx, UrlParams::new("/api/users"), &routes), "/api/users");
    }

    #[test]
    fn test_create_absolute_url() {
        let resolver = resolver(config("en,de"));
        let routes = StaticRouteBuilder::new("http://example.com")
            .with_host_route("shop", "http://shop.example.com");
        let ctx = RequestContext::new("", "de");
        assert_eq!(
            resolver.create_absolute_url(&ctx, UrlParams::new("site"), None, &routes),
            "http://example.com/de/site"
        );
        assert_eq!(
            resolver.create_absolute_url(&ctx, UrlParams::new("shop"), Some("https"), &routes),
            "https://shop.example.com/de/shop"
        );
    }

    // ==================== Redirect URL Tests ====================

    #[test]
    fn test_redirect_url_forces_language_and_keeps_query() {
        let resolver = resolver(config("en-US,de-*"));
        let routes = StaticRouteBuilder::new("http://localhost");
        let ctx = RequestContext::new("page", "en");
        let query = vec![("x".to_string(), "1".to_string())];
        let url = resolver.redirect_url(&ctx, "de-at", &routes, &query, "/de-AT/page?x=1").unwrap();
        assert_eq!(url.as_deref(), Some("/de-at/page?x=1"));
    }

    #[test]
    fn test_redirect_url_reset_to_default() {
        let resolver = resolver(config("en,de"));
        let routes = StaticRouteBuilder::new("http://localhost");
        let (action, ctx) = process(&resolver, "en/page", &mut Request::default());
        assert_eq!(action, Action::Redirect(String::new()));
        let url = resolver.redirect_url(&ctx, "", &routes, &[], "/en/page").unwrap();
        assert_eq!(url.as_deref(), Some("/page"));
    }

    #[test]
    fn test_redirect_url_same_as_current_is_suppressed() {
        let resolver = resolver(config("en,de"));
        let routes = StaticRouteBuilder::new("http://localhost");
        let ctx = RequestContext::new("page", "de");
        assert_eq!(resolver.redirect_url(&ctx, "", &routes, &[], "/de/page").unwrap(), None);
    }

    #[test]
    fn test_redirect_url_root_with_slash_suffix() {
        let resolver = resolver(config("en,de"));
        let routes = StaticRouteBuilder::new("http://localhost").with_suffix("/");
        let ctx = RequestContext::new("", "en");
        let url = resolver.redirect_url(&ctx, "", &routes, &[], "/en").unwrap();
        assert_eq!(url.as_deref(), Some("/"));
    }

    #[test]
    fn test_redirect_url_unknown_route() {
        let resolver = resolver(config("en,de"));
        let routes = StaticRouteBuilder::new("http://localhost").with_routes(["site/page"]);
        let ctx = RequestContext::new("missing", "en");
        assert!(matches!(
            resolver.redirect_url(&ctx, "de", &routes, &[], "/missing"),
            Err(LocaleError::RouteNotFound(path)) if path == "missing"
        ));
    }

    // ==================== Property Tests ====================

    fn plain_codes() -> Vec<&'static str> {
        vec!["en", "en-US", "de", "fr", "pt-BR"]
    }

    proptest! {
        #[test]
        fn prop_stripped_path_has_no_language_prefix(
            index in 0usize..5,
            rest in "[0-9][a-z0-9/]{0,12}",
        ) {
            let code = plain_codes()[index];
            let resolver = resolver(Config {
                enable_default_language_url_code: true,
                ..config(&plain_codes().join(","))
            });
            let mut request = Request::default();
            let (action, ctx) = process(&resolver, &format!("{}/{}", code.to_lowercase(), rest), &mut request);
            prop_assert_eq!(action, Action::Continue(rest.clone()));

            let mut again = resolver.request_context(ctx.path_info());
            let mut fresh = Request::default();
            let second = resolver.process_incoming_request(&mut again, &mut fresh.sources());
            prop_assert!(!matches!(second, Action::Continue(_)));
            prop_assert_eq!(again.path_info(), rest.as_str());
        }

        #[test]
        fn prop_create_then_parse_round_trips(
            index in 0usize..5,
            route in "[a-z]{1,8}(/[a-z]{1,8}){0,2}",
        ) {
            let language = plain_codes()[index];
            let resolver = resolver(Config {
                enable_default_language_url_code: true,
                ..config(&plain_codes().join(","))
            });
            let routes = StaticRouteBuilder::new("http://localhost");
            let ctx = resolver.request_context("");
            let url = resolver.create_url(&ctx, UrlParams::new(route.clone()).with("language", language), &routes);

            let path_info = url.trim_start_matches('/');
            let (action, parsed) = process(&resolver, path_info, &mut Request::default());
            prop_assert_eq!(parsed.language(), language);
            prop_assert_eq!(action, Action::Continue(route.clone()));
        }
    }
}
