// src/utils/url.rs

//! URL normalization shared by the store and the workers.

use url::Url;

use crate::error::{AppError, Result};

/// Scheme prepended to URLs submitted without one.
pub const DEFAULT_SCHEME: &str = "http://";

const RECOGNIZED_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Normalize a raw submitted URL.
///
/// Surrounding whitespace is trimmed and `http://` is prepended unless the
/// URL already starts with a recognized scheme. Normalizing twice yields the
/// same string.
///
/// # Examples
/// ```
/// use linkcheck::utils::normalize_url;
///
/// assert_eq!(normalize_url("example.com"), "http://example.com");
/// assert_eq!(normalize_url("https://good.test"), "https://good.test");
/// assert_eq!(normalize_url(&normalize_url("x.com")), "http://x.com");
/// ```
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || has_recognized_scheme(trimmed) {
        return trimmed.to_string();
    }
    format!("{DEFAULT_SCHEME}{trimmed}")
}

fn has_recognized_scheme(url: &str) -> bool {
    RECOGNIZED_SCHEMES.iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Normalize and parse a URL for probing.
///
/// Fails when the normalized string is not an absolute URL with a host.
pub fn probe_url(raw: &str) -> Result<Url> {
    let url = Url::parse(&normalize_url(raw))?;
    if url.host_str().is_none() {
        return Err(AppError::validation(format!("url {raw} has no host")));
    }
    Ok(url)
}
