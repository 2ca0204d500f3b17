//! Shared HTTP utilities for the URL shortener workspace.
//!
//! Framework-agnostic response bodies, the mapping from `CoreError` to a
//! status code and public error body, and short-URL building.

use domain::CoreError;

// ============================================================================
// JSON Response Helpers (framework-agnostic)
// ============================================================================

/// Create a structured error JSON with a default message based on the code.
///
/// Returns: `{"error": {"code": "<code>", "message": "<default message>"}}`
pub fn json_err(code: &str) -> serde_json::Value {
    let message = match code {
        "not_found" => "Resource not found",
        "bad_request" => "Bad request",
        "invalid_alias" => "Invalid alias format",
        "conflict" => "Resource already exists",
        "error" | "internal" => "Internal server error",
        _ => code, // Fallback to code as message for unknown codes
    };
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Create a structured error JSON with a custom message.
///
/// Returns: `{"error": {"code": "<code>", "message": "<message>"}}`
pub fn json_error_with_message(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Translate a domain error into an HTTP status code and public body.
///
/// Validation messages are safe to echo. Storage detail never leaves the
/// process: `StoreUnavailable` always renders the generic internal body.
pub fn error_reply(err: &CoreError) -> (u16, serde_json::Value) {
    match err {
        CoreError::InvalidUrl(_) | CoreError::InvalidAlias(_) => {
            (400, json_error_with_message("invalid_request", &err.to_string()))
        }
        CoreError::AliasConflict => (
            409,
            json_error_with_message("conflict", "alias already exists"),
        ),
        CoreError::NotFound => (404, json_err("not_found")),
        CoreError::StoreUnavailable(_) => (500, json_err("internal")),
    }
}

// ============================================================================
// URL Building
// ============================================================================

/// Build a short URL for `alias`.
///
/// A non-empty `shortlink_domain` wins; otherwise falls back to
/// `https://{host}/{alias}`, or `/{alias}` if host is empty.
pub fn build_short_url(shortlink_domain: Option<&str>, host: &str, alias: &str) -> String {
    if let Some(dom) = shortlink_domain.filter(|d| !d.is_empty()) {
        return format!("{}/{}", dom.trim_end_matches('/'), alias);
    }
    if host.is_empty() {
        format!("/{}", alias)
    } else {
        format!("https://{}/{}", host, alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_err() {
        let err = json_err("not_found");
        assert_eq!(err, serde_json::json!({"error": {"code": "not_found", "message": "Resource not found"}}));

        // Unknown code falls back to code as message
        let err = json_err("custom_error");
        assert_eq!(err, serde_json::json!({"error": {"code": "custom_error", "message": "custom_error"}}));
    }

    #[test]
    fn test_json_error_with_message() {
        let err = json_error_with_message("bad_request", "Invalid input");
        assert_eq!(
            err,
            serde_json::json!({"error": {"code": "bad_request", "message": "Invalid input"}})
        );
    }

    #[test]
    fn test_error_reply_statuses() {
        assert_eq!(error_reply(&CoreError::NotFound).0, 404);
        assert_eq!(error_reply(&CoreError::AliasConflict).0, 409);
        assert_eq!(error_reply(&CoreError::InvalidUrl("empty".into())).0, 400);
        assert_eq!(error_reply(&CoreError::InvalidAlias("empty".into())).0, 400);
    }

    #[test]
    fn test_error_reply_hides_storage_detail() {
        let (status, body) =
            error_reply(&CoreError::StoreUnavailable("disk I/O error at /var/db".into()));
        assert_eq!(status, 500);
        assert_eq!(body, json_err("internal"));
        assert!(!body.to_string().contains("/var/db"));
    }

    #[test]
    fn test_build_short_url() {
        assert_eq!(build_short_url(None, "example.com", "abc"), "https://example.com/abc");
        assert_eq!(build_short_url(None, "", "abc"), "/abc");
        assert_eq!(build_short_url(Some(""), "", "abc"), "/abc");
        assert_eq!(
            build_short_url(Some("https://sho.rt/"), "example.com", "abc"),
            "https://sho.rt/abc"
        );
    }
}
