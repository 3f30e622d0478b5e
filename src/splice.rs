//! Positional insertion of a language segment into a built URL.

/// Insert `/{language}` into `url` right after the base prefix.
///
/// `prefix` is the script URL or base URL the route builder put in front of
/// every path. For absolute URLs the scheme and host are skipped as well.
/// When the suffix is not `/`, a slash directly after the prefix is dropped
/// if it ends the URL or precedes the query string. Slashes belonging to the
/// route itself are left alone:
///
/// - `/` becomes `/de`, `/base/` becomes `/base/de`
/// - `/?x=y` becomes `/de?x=y`
/// - `/base/foo/bar` becomes `/base/de/foo/bar`
/// - `/foo/?x=y` becomes `/de/foo/?x=y`
/// - `http://example.com/base/foo` becomes `http://example.com/base/de/foo`
pub fn insert_language_segment(url: &str, prefix: &str, language: &str, suffix: &str) -> String {
    let needle = match url.find("://") {
        Some(scheme_end) => {
            let host_start = scheme_end + 3;
            let path_start = url[host_start..]
                .find(|c| c == '/' || c == '?')
                .map(|pos| host_start + pos)
                .unwrap_or(url.len());
            format!("{}{}", &url[..path_start], prefix)
        }
        None => prefix.to_string(),
    };

    let mut url = url.to_string();
    if suffix != "/" {
        let boundary = needle.len();
        match url.get(boundary..) {
            Some("/") => url.truncate(boundary),
            Some(rest) if rest.starts_with("/?") => {
                url.remove(boundary);
            }
            _ => {}
        }
    }

    if needle.is_empty() {
        return format!("/{}{}", language, url);
    }
    let rest = url.get(needle.len()..).unwrap_or("");
    format!("{}/{}{}", needle, language, rest)
}
