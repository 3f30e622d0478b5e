//! Route building: the host's URL rule system as seen by the locale layer.

use std::collections::HashMap;

/// A route plus its parameters, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams {
    pub route: String,
    params: Vec<(String, String)>,
}

impl UrlParams {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            params: Vec::new(),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a parameter, replacing an existing value in place.
    pub fn insert(&mut self, key: &str, value: &str) {
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.params.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.params.iter().position(|(k, _)| k == key)?;
        Some(self.params.remove(pos).1)
    }

    /// True when only the route is set.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// URL rule system of the host framework.
pub trait RouteBuilder {
    /// Resolve path-info (no leading slash) to a route, `None` if nothing matches.
    fn parse_path(&self, path_info: &str) -> Option<UrlParams>;

    /// Build the URL for a route: a path, or an absolute URL for host-bound routes.
    fn build(&self, params: &UrlParams) -> String;

    fn base_url(&self) -> &str;

    fn script_url(&self) -> &str;

    /// Whether built URLs start with the script URL instead of the base URL.
    fn show_script_name(&self) -> bool;

    fn suffix(&self) -> &str;

    /// Scheme and host, e.g. `http://example.com`.
    fn host_info(&self) -> &str;
}

/// Pretty-URL route builder where the route is the path itself.
///
/// Routes may be restricted to a known list (strict parsing) and bound to
/// a host, in which case built URLs are absolute.
#[derive(Debug, Clone, Default)]
pub struct StaticRouteBuilder {
    host_info: String,
    base_url: String,
    script_url: String,
    show_script_name: bool,
    suffix: String,
    routes: Option<Vec<String>>,
    host_routes: HashMap<String, String>,
}

impl StaticRouteBuilder {
    pub fn new(host_info: impl Into<String>) -> Self {
        Self {
            host_info: host_info.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a script URL (e.g. `/index.php`) and whether to show it in URLs.
    pub fn with_script_url(mut self, script_url: impl Into<String>, show: bool) -> Self {
        self.script_url = script_url.into();
        self.show_script_name = show;
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Only resolve the given routes; anything else is not found.
    pub fn with_routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routes = Some(routes.into_iter().map(Into::into).collect());
        self
    }

    /// Bind a route to a host so its URLs are absolute.
    pub fn with_host_route(mut self, route: impl Into<String>, host_info: impl Into<String>) -> Self {
        self.host_routes.insert(route.into(), host_info.into());
        self
    }

    fn prefix(&self) -> &str {
        if self.show_script_name {
            &self.script_url
        } else {
            &self.base_url
        }
    }
}

impl RouteBuilder for StaticRouteBuilder {
    fn parse_path(&self, path_info: &str) -> Option<UrlParams> {
        let mut route = path_info;
        if !self.suffix.is_empty() && !route.is_empty() {
            route = route.strip_suffix(self.suffix.as_str())?;
            if route.is_empty() {
                return None;
            }
        }

        if let Some(routes) = &self.routes {
            if !routes.iter().any(|r| r == route) {
                return None;
            }
        }

        Some(UrlParams::new(route))
    }

    fn build(&self, params: &UrlParams) -> String {
        let route = params.route.trim_matches('/');
        let mut url = format!("{}/", self.prefix());
        if !route.is_empty() {
            url.push_str(route);
            url.push_str(&self.suffix);
        }

        if !params.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params.iter())
                .finish();
            url.push('?');
            url.push_str(&query);
        }

        match self.host_routes.get(route) {
            Some(host) => format!("{}{}", host, url),
            None => url,
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn script_url(&self) -> &str {
        &self.script_url
    }

    fn show_script_name(&self) -> bool {
        self.show_script_name
    }

    fn suffix(&self) -> &str {
        &self.suffix
    }

    fn host_info(&self) -> &str {
        &self.host_info
    }
}
