//! Explicit input checks run before anything reaches the store.

use url::Url;

use crate::Alias;
use crate::CoreError;

/// Longest target URL accepted.
pub const MAX_URL_LEN: usize = 2048;

/// Validate a target URL: non-empty, bounded, absolute http(s) with a host.
pub fn validate_target_url(s: &str) -> Result<(), CoreError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidUrl("empty".into()));
    }
    if trimmed.len() > MAX_URL_LEN {
        return Err(CoreError::InvalidUrl("too long".into()));
    }
    // Url::parse silently drops tab/CR/LF, but the stored string must stay a
    // valid Location header value.
    if trimmed.chars().any(char::is_control) {
        return Err(CoreError::InvalidUrl("contains control characters".into()));
    }
    let parsed = Url::parse(trimmed).map_err(|e| CoreError::InvalidUrl(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CoreError::InvalidUrl(
            "must start with http:// or https://".into(),
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(CoreError::InvalidUrl("missing host".into()));
    }
    Ok(())
}

/// Validate a caller-supplied alias using the same rules as `Alias::new`.
pub fn validate_alias(s: &str) -> Result<Alias, CoreError> {
    Alias::new(s.to_string())
}
