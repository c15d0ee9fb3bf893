use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The payload the page script sends to POST /track.
///
/// `pagePath` is required but modelled as an `Option` so the handler can
/// answer a missing field with a validation error instead of a generic
/// deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPayload {
    #[serde(default)]
    pub page_path: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
}

/// One recorded page view. Append-only: rows are written once by the
/// ingestion endpoint and never mutated or deleted by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorEvent {
    /// UUID v4.
    pub id: String,
    /// NULL only when identity resolution failed; such rows still count
    /// toward visit totals but are excluded from unique-visitor counts.
    pub visitor_id: Option<String>,
    pub page_path: String,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    /// 16 hex chars, sha256(addr) truncated. The raw address is never stored.
    pub ip_fingerprint: Option<String>,
    /// 'desktop' | 'mobile' | 'tablet'.
    pub device_type: String,
    /// Lowercase family name or 'unknown'.
    pub browser: String,
    pub os: String,
    pub created_at: DateTime<Utc>,
}

/// Normalize a client-supplied page path.
///
/// Trims whitespace, drops any query string or fragment, guarantees a leading
/// slash and strips trailing slashes (except for the root path itself).
/// Returns `None` when nothing path-like remains, which the endpoint treats
/// the same as a missing `pagePath`.
pub fn normalize_page_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let cut = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
    if cut.is_empty() {
        return None;
    }

    let mut path = if cut.starts_with('/') {
        cut.to_string()
    } else {
        format!("/{cut}")
    };
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_a_clean_path() {
        assert_eq!(normalize_page_path("/albums").as_deref(), Some("/albums"));
    }

    #[test]
    fn strips_query_and_fragment() {
        assert_eq!(
            normalize_page_path("/albums?ref=newsletter").as_deref(),
            Some("/albums")
        );
        assert_eq!(
            normalize_page_path("/news#latest").as_deref(),
            Some("/news")
        );
    }

    #[test]
    fn adds_missing_leading_slash() {
        assert_eq!(normalize_page_path("concerts/2026").as_deref(), Some("/concerts/2026"));
    }

    #[test]
    fn strips_trailing_slashes_but_keeps_root() {
        assert_eq!(normalize_page_path("/albums/").as_deref(), Some("/albums"));
        assert_eq!(normalize_page_path("/").as_deref(), Some("/"));
    }

    #[test]
    fn empty_and_whitespace_are_rejected() {
        assert_eq!(normalize_page_path(""), None);
        assert_eq!(normalize_page_path("   "), None);
        assert_eq!(normalize_page_path("?utm_source=mail"), None);
    }
}
