//! Authorization header parsing
//!
//! Both supported schemes share one shape: `<Scheme> <credential>`, with the
//! scheme matched case-insensitively and surrounding whitespace ignored.

use crate::error::HeaderError;

/// Scheme literal for access and refresh tokens
pub const BEARER_SCHEME: &str = "Bearer";

/// Scheme literal for the webhook API key
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Extract the token from a `Bearer <token>` header value
///
/// # Example
///
/// ```
/// use chirpy::auth::header::extract_bearer;
///
/// assert_eq!(extract_bearer(Some("Bearer   tok123   ")).unwrap(), "tok123");
/// assert!(extract_bearer(Some("Basic abc")).is_err());
/// ```
pub fn extract_bearer(header: Option<&str>) -> Result<String, HeaderError> {
    extract_scheme(header, BEARER_SCHEME)
}

/// Extract the key from an `ApiKey <key>` header value
pub fn extract_api_key(header: Option<&str>) -> Result<String, HeaderError> {
    extract_scheme(header, API_KEY_SCHEME)
}

fn extract_scheme(header: Option<&str>, scheme: &str) -> Result<String, HeaderError> {
    let value = match header {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Err(HeaderError::Missing),
    };

    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(HeaderError::Malformed(format!(
            "expected '{} <credential>', got {} part(s)",
            scheme,
            parts.len()
        )));
    }

    if !parts[0].eq_ignore_ascii_case(scheme) {
        return Err(HeaderError::Malformed(format!(
            "unsupported scheme '{}', expected '{}'",
            parts[0], scheme
        )));
    }

    Ok(parts[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: bearer with extra whitespace
    #[test]
    fn test_extract_bearer_trims() {
        assert_eq!(extract_bearer(Some("Bearer   tok123   ")).unwrap(), "tok123");
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    // Test 2: scheme is case-insensitive
    #[test]
    fn test_extract_bearer_case_insensitive() {
        assert_eq!(extract_bearer(Some("bearer tok")).unwrap(), "tok");
        assert_eq!(extract_bearer(Some("BEARER tok")).unwrap(), "tok");
    }

    // Test 3: absent or blank header
    #[test]
    fn test_extract_bearer_missing() {
        assert_eq!(extract_bearer(None), Err(HeaderError::Missing));
        assert_eq!(extract_bearer(Some("")), Err(HeaderError::Missing));
        assert_eq!(extract_bearer(Some("   ")), Err(HeaderError::Missing));
    }

    // Test 4: malformed shapes
    #[test]
    fn test_extract_bearer_malformed() {
        assert!(matches!(
            extract_bearer(Some("Bearer")),
            Err(HeaderError::Malformed(_))
        ));
        assert!(matches!(
            extract_bearer(Some("Basic dXNlcjpwYXNz")),
            Err(HeaderError::Malformed(_))
        ));
        assert!(matches!(
            extract_bearer(Some("Bearer a b")),
            Err(HeaderError::Malformed(_))
        ));
    }

    // Test 5: api key scheme
    #[test]
    fn test_extract_api_key() {
        assert_eq!(extract_api_key(Some("ApiKey   secret   ")).unwrap(), "secret");
        assert_eq!(extract_api_key(Some("apikey secret")).unwrap(), "secret");
        assert!(matches!(
            extract_api_key(Some("Bearer secret")),
            Err(HeaderError::Malformed(_))
        ));
        assert_eq!(extract_api_key(None), Err(HeaderError::Missing));
    }
}
