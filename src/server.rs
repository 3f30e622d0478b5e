//! axum integration: a middleware that resolves the locale before routing.
//!
//! The middleware has to see the request before the router matches it, so it
//! wraps the whole application router instead of being added as a route
//! layer. Use [`locale_router`] to do the wrapping.

use crate::error::LocaleError;
use crate::i18n::parse_accept_language;
use crate::persistence::{CookieJar, CookieStore};
use crate::resolver::{Action, LocaleResolver, RequestContext, RequestSources};
use crate::routing::{RouteBuilder, StaticRouteBuilder, UrlParams};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tower::Layer;
use tracing::{debug, warn};
use uuid::Uuid;

/// Cookie carrying the in-memory session id.
pub const SESSION_COOKIE: &str = "locale_sid";

/// Sessions kept before the oldest ones are evicted.
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;

/// In-memory sessions keyed by ids this server issued.
///
/// Holds at most `capacity` sessions; inserting beyond that evicts the
/// oldest session first.
#[derive(Debug)]
struct Sessions {
    entries: HashMap<String, HashMap<String, String>>,
    order: VecDeque<String>,
    capacity: usize,
}

impl Sessions {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn get(&self, id: &str) -> Option<&HashMap<String, String>> {
        self.entries.get(id)
    }

    fn insert(&mut self, id: String, data: HashMap<String, String>) {
        if !self.entries.contains_key(&id) {
            self.order.push_back(id.clone());
        }
        self.entries.insert(id, data);

        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    debug!("Evicting session {}", oldest);
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Shared state of the locale middleware.
#[derive(Debug, Clone)]
pub struct LocaleState {
    resolver: Arc<LocaleResolver>,
    routes: Arc<StaticRouteBuilder>,
    sessions: Arc<Mutex<Sessions>>,
}

impl LocaleState {
    pub fn new(resolver: LocaleResolver, routes: StaticRouteBuilder) -> Self {
        Self::with_session_capacity(resolver, routes, DEFAULT_SESSION_CAPACITY)
    }

    pub fn with_session_capacity(
        resolver: LocaleResolver,
        routes: StaticRouteBuilder,
        capacity: usize,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            routes: Arc::new(routes),
            sessions: Arc::new(Mutex::new(Sessions::new(capacity))),
        }
    }

    pub fn resolver(&self) -> &LocaleResolver {
        &self.resolver
    }

    /// Number of sessions currently held.
    pub fn session_count(&self) -> usize {
        match self.sessions.lock() {
            Ok(sessions) => sessions.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// Locale-aware URL creation for handlers, available as a request extension.
#[derive(Debug, Clone)]
pub struct LocaleUrls {
    resolver: Arc<LocaleResolver>,
    routes: Arc<StaticRouteBuilder>,
    context: RequestContext,
}

impl LocaleUrls {
    /// Active language of the request.
    pub fn language(&self) -> &str {
        self.context.language()
    }

    pub fn default_language(&self) -> &str {
        self.resolver.default_language()
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// URL for a route in the active language (or the `language` parameter).
    pub fn to(&self, params: UrlParams) -> String {
        self.resolver.create_url(&self.context, params, self.routes.as_ref())
    }

    pub fn to_absolute(&self, params: UrlParams, scheme: Option<&str>) -> String {
        self.resolver
            .create_absolute_url(&self.context, params, scheme, self.routes.as_ref())
    }
}

/// Wrap `router` so every request passes through [`locale_middleware`]
/// before route matching.
pub fn locale_router(router: Router, state: LocaleState) -> Router {
    let service = middleware::from_fn_with_state(state, locale_middleware).layer(router);
    Router::new().fallback_service(service)
}

enum Outcome {
    Redirect(String),
    NotFound(String),
    Forward {
        context: RequestContext,
        path_info: Option<String>,
    },
}

struct Resolution {
    outcome: Outcome,
    cookies: CookieJar,
    new_session: Option<String>,
}

/// Resolve the request language, then redirect or forward with the language
/// prefix stripped from the URI.
pub async fn locale_middleware(
    State(state): State<LocaleState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolution = resolve(&state, request.headers(), request.uri());

    let mut response = match resolution.outcome {
        Outcome::Redirect(location) => {
            let status = StatusCode::from_u16(state.resolver.config().redirect_status_code)
                .unwrap_or(StatusCode::FOUND);
            (status, [(header::LOCATION, location)]).into_response()
        }
        Outcome::NotFound(path) => {
            let error = LocaleError::RouteNotFound(path);
            (StatusCode::NOT_FOUND, error.to_string()).into_response()
        }
        Outcome::Forward { context, path_info } => {
            if let Some(path_info) = path_info {
                let prefix = entry_prefix(state.routes.as_ref());
                match rewrite_uri(request.uri(), prefix, &path_info) {
                    Some(uri) => {
                        debug!("Rewriting {} to {}", request.uri(), uri);
                        *request.uri_mut() = uri;
                    }
                    None => return StatusCode::BAD_REQUEST.into_response(),
                }
            }
            request.extensions_mut().insert(LocaleUrls {
                resolver: state.resolver.clone(),
                routes: state.routes.clone(),
                context,
            });
            next.run(request).await
        }
    };

    let headers = response.headers_mut();
    for cookie in resolution.cookies.changes() {
        append_set_cookie(headers, &cookie.to_header_value());
    }
    if let Some(session_id) = resolution.new_session {
        let options = &state.resolver.config().language_cookie_options;
        append_set_cookie(headers, &options.header_value(SESSION_COOKIE, &session_id, None));
    }
    response
}

fn resolve(state: &LocaleState, headers: &HeaderMap, uri: &Uri) -> Resolution {
    let resolver = state.resolver.as_ref();
    let routes = state.routes.as_ref();
    let config = resolver.config();

    let mut cookies = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(CookieJar::from_header)
        .unwrap_or_default();
    let accept_languages = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(parse_accept_language)
        .unwrap_or_default();
    let geo_country = headers
        .get(server_var_header(&config.geo_ip_server_var))
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let path = collapse_slashes(uri.path());
    let normalized = path != uri.path();
    let Some(path_info) = strip_entry_prefix(&path, entry_prefix(routes)) else {
        debug!("{} is outside the application, skipping language processing", path);
        return Resolution {
            outcome: Outcome::Forward {
                context: resolver.request_context(path.trim_start_matches('/')),
                path_info: None,
            },
            cookies,
            new_session: None,
        };
    };
    let path_info = path_info.to_string();
    let current_url = match uri.query() {
        Some(query) => format!("{}?{}", uri.path(), query),
        None => uri.path().to_string(),
    };

    let mut sessions = match state.sessions.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    // Only ids issued by this server are accepted
    let existing_session = CookieStore::get(&cookies, SESSION_COOKIE)
        .filter(|id| sessions.get(id).is_some());
    let session_id = existing_session
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut session = sessions.get(&session_id).cloned().unwrap_or_default();

    let mut ctx = resolver.request_context(path_info);
    let action = {
        let mut sources = RequestSources {
            session: &mut session,
            cookies: &mut cookies,
            accept_languages: &accept_languages,
            geo_country: geo_country.as_deref(),
            normalized,
        };
        resolver.process_incoming_request(&mut ctx, &mut sources)
    };

    let outcome = match action {
        Action::NoOp if normalized => {
            let location = match uri.query() {
                Some(query) => format!("{}?{}", path, query),
                None => path.clone(),
            };
            Outcome::Redirect(location)
        }
        Action::NoOp => Outcome::Forward {
            context: ctx,
            path_info: None,
        },
        Action::Continue(path_info) => Outcome::Forward {
            context: ctx,
            path_info: Some(path_info),
        },
        Action::Redirect(language) => {
            let query: Vec<(String, String)> = uri
                .query()
                .map(|query| url::form_urlencoded::parse(query.as_bytes()).into_owned().collect())
                .unwrap_or_default();
            match resolver.redirect_url(&ctx, &language, routes, &query, &current_url) {
                Ok(Some(location)) => Outcome::Redirect(location),
                Ok(None) => {
                    let path_info = ctx.path_info().to_string();
                    Outcome::Forward {
                        context: ctx,
                        path_info: Some(path_info),
                    }
                }
                Err(LocaleError::RouteNotFound(path)) => Outcome::NotFound(path),
                Err(err) => {
                    warn!("Failed to compute redirect: {}", err);
                    Outcome::NotFound(ctx.path_info().to_string())
                }
            }
        }
    };

    let new_session = if session.is_empty() {
        None
    } else {
        sessions.insert(session_id.clone(), session);
        existing_session.is_none().then_some(session_id)
    };

    Resolution {
        outcome,
        cookies,
        new_session,
    }
}

/// Request header carrying a CGI-style server variable, e.g.
/// `HTTP_X_GEO_COUNTRY` is sent as `x-geo-country`.
pub fn server_var_header(var: &str) -> String {
    var.strip_prefix("HTTP_")
        .unwrap_or(var)
        .replace('_', "-")
        .to_ascii_lowercase()
}

/// Collapse repeated slashes in a path.
pub fn collapse_slashes(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}

/// Path-info below `prefix`, or `None` when `path` is outside it.
///
/// The prefix must end at a segment boundary: `/base` covers `/base` and
/// `/base/page` but not `/basement`.
fn strip_entry_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest.trim_start_matches('/'))
    } else {
        None
    }
}

fn entry_prefix(routes: &dyn RouteBuilder) -> &str {
    if routes.show_script_name() {
        routes.script_url()
    } else {
        routes.base_url()
    }
}

fn rewrite_uri(uri: &Uri, prefix: &str, path_info: &str) -> Option<Uri> {
    let mut path = format!("{}/{}", prefix, path_info);
    if let Some(query) = uri.query() {
        path.push('?');
        path.push_str(query);
    }
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path.parse().ok()?);
    Uri::from_parts(parts).ok()
}

fn append_set_cookie(headers: &mut HeaderMap, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(err) => warn!("Dropping invalid Set-Cookie value: {}", err),
    }
}
