//! CORS: an exact origin allow-list plus `*` patterns for preview hosts.

use actix_cors::Cors;
use actix_web::http::{header, Method};

use crate::config::settings;

/// Matches `origin` against `pattern`, where each `*` stands for one or more
/// characters other than `/`, so `https://*.vercel.app` accepts any preview
/// subdomain but not a path smuggled into the host.
pub fn matches_pattern(pattern: &str, origin: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return false;
    };
    let Some(mut rest) = origin.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    for (i, part) in parts.iter().enumerate() {
        let last = i + 1 == parts.len();
        // wildcard needs at least one char before the next literal
        let found = if last {
            rest.len()
                .checked_sub(part.len())
                .filter(|&at| at > 0 && rest.ends_with(part))
        } else {
            rest.get(1..).and_then(|r| r.find(part)).map(|at| at + 1)
        };
        let Some(at) = found else {
            return false;
        };
        if rest[..at].contains('/') {
            return false;
        }
        rest = &rest[at + part.len()..];
    }
    rest.is_empty()
}

pub fn origin_allowed(origin: &str, exact: &[String], patterns: &[String]) -> bool {
    exact.iter().any(|o| o == origin) || patterns.iter().any(|p| matches_pattern(p, origin))
}

/// Builds the CORS middleware for the given allow-lists.
pub fn cors_from(exact: Vec<String>, patterns: Vec<String>) -> Cors {
    Cors::default()
        .allowed_origin_fn(move |origin, _req| {
            origin
                .to_str()
                .map(|o| origin_allowed(o, &exact, &patterns))
                .unwrap_or(false)
        })
        .allowed_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600)
}

/// CORS from `CORS_ORIGINS` / `CORS_ORIGIN_PATTERNS`.
pub fn cors() -> Cors {
    let s = settings();
    cors_from(s.cors_origins.clone(), s.cors_origin_patterns.clone())
}
