//! Versioned deep link router.
//!
//! Supports tailorflow://v1/* URLs that select a view on startup.
//!
//! ## Supported Routes (v1)
//!
//! - `tailorflow://v1/editor` - Resume/JD intake view
//! - `tailorflow://v1/results` - Analysis results view
//! - `tailorflow://v1/history` - Saved analyses
//! - `tailorflow://v1/settings` - Preferences
//! - `tailorflow://v1/home` - Alias for the editor
//!
//! The parser is intentionally forgiving: case-insensitive scheme,
//! single-slash variants (`tailorflow:/v1/...`), repeated slashes, hash
//! formats (`#/v1/...`) and bare paths (`/v1/...`), with query and fragment
//! stripping.

/// Strip query and fragment from URL path
#[inline]
fn strip_query_frag(s: &str) -> &str {
    let bytes = s.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'?' || b == b'#' {
            return &s[..i];
        }
    }
    s
}

/// Extract path after tailorflow:// scheme (case-insensitive, handles variants)
#[inline]
fn after_scheme(raw: &str) -> Option<&str> {
    let s = raw.trim();
    if let Some(pos) = s.find("://") {
        if s[..pos].eq_ignore_ascii_case("tailorflow") {
            let mut rest = &s[pos + 3..];
            while rest.starts_with('/') {
                rest = &rest[1..];
            }
            return Some(rest);
        }
    } else if let Some(rest) = s.strip_prefix("tailorflow:") {
        let mut r = rest;
        while r.starts_with('/') {
            r = &r[1..];
        }
        return Some(r);
    }
    None
}

/// V1 route variants
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteV1 {
    Editor,
    Results,
    History,
    Settings,
}

/// Versioned route container
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    V1(RouteV1),
}

/// Parse a route from the accepted URL formats.
///
/// Returns `None` for invalid URLs, unsupported versions and unknown views.
/// The empty string routes home (editor).
pub fn parse(raw: &str) -> Option<Route> {
    if raw.is_empty() {
        return Some(Route::V1(RouteV1::Editor));
    }

    let s = raw.trim();

    let path = if let Some(rest) = after_scheme(s) {
        rest
    } else if let Some(rest) = s.strip_prefix("#/") {
        rest
    } else if let Some(rest) = s.strip_prefix('/') {
        rest
    } else {
        s
    };

    let path = strip_query_frag(path);

    let mut segments = path.split('/').filter(|s| !s.is_empty());

    let version = segments.next()?.to_ascii_lowercase();
    if version != "v1" {
        return None;
    }

    let page = segments.next().unwrap_or("").to_ascii_lowercase();
    match page.as_str() {
        "" | "home" | "editor" => Some(Route::V1(RouteV1::Editor)),
        "results" => Some(Route::V1(RouteV1::Results)),
        "history" => Some(Route::V1(RouteV1::History)),
        "settings" => Some(Route::V1(RouteV1::Settings)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_view() {
        assert_eq!(
            parse("tailorflow://v1/editor").unwrap(),
            Route::V1(RouteV1::Editor)
        );
        assert_eq!(
            parse("tailorflow://v1/results").unwrap(),
            Route::V1(RouteV1::Results)
        );
        assert_eq!(
            parse("tailorflow://v1/history").unwrap(),
            Route::V1(RouteV1::History)
        );
        assert_eq!(
            parse("tailorflow://v1/settings").unwrap(),
            Route::V1(RouteV1::Settings)
        );
    }

    #[test]
    fn home_aliases_route_to_editor() {
        assert_eq!(parse("tailorflow://v1/home").unwrap(), Route::V1(RouteV1::Editor));
        assert_eq!(parse("tailorflow://v1/").unwrap(), Route::V1(RouteV1::Editor));
        assert_eq!(parse("tailorflow://v1").unwrap(), Route::V1(RouteV1::Editor));
        assert_eq!(parse("").unwrap(), Route::V1(RouteV1::Editor));
    }

    #[test]
    fn accepts_hash_and_bare_path_formats() {
        assert_eq!(parse("#/v1/history").unwrap(), Route::V1(RouteV1::History));
        assert_eq!(parse("/v1/settings").unwrap(), Route::V1(RouteV1::Settings));
        assert_eq!(parse("v1/results").unwrap(), Route::V1(RouteV1::Results));
    }

    #[test]
    fn rejects_unknown_versions_and_views() {
        assert!(parse("tailorflow://v2/editor").is_none());
        assert!(parse("tailorflow://v1/unknown").is_none());
        assert!(parse("otherapp://v1/editor").is_none());
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(
            parse("TAILORFLOW://v1/results").unwrap(),
            Route::V1(RouteV1::Results)
        );
        assert_eq!(
            parse("TailorFlow://v1/history").unwrap(),
            Route::V1(RouteV1::History)
        );
    }

    #[test]
    fn strips_query_and_fragment() {
        assert_eq!(
            parse("tailorflow://v1/results?utm=1").unwrap(),
            Route::V1(RouteV1::Results)
        );
        assert_eq!(
            parse("tailorflow://v1/history#frag").unwrap(),
            Route::V1(RouteV1::History)
        );
    }

    #[test]
    fn handles_slash_variants() {
        assert_eq!(
            parse("tailorflow:/v1/settings").unwrap(),
            Route::V1(RouteV1::Settings)
        );
        assert_eq!(
            parse("tailorflow:////v1/editor").unwrap(),
            Route::V1(RouteV1::Editor)
        );
    }
}
