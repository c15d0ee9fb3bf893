use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hex length of an IP fingerprint: first 8 bytes of the digest, 16 hex chars.
///
/// Short enough that the fingerprint cannot stand in for the address, long
/// enough that accidental collisions are negligible at this traffic scale.
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// The outcome of resolving a request's visitor identity.
#[derive(Debug, Clone)]
pub struct ResolvedVisitor {
    /// Opaque visitor identifier, stable while the client keeps the cookie.
    pub visitor_id: String,
    /// `None` when no source address could be determined for the request.
    pub ip_fingerprint: Option<String>,
    /// `true` when a fresh identifier was minted on this request.
    pub is_new: bool,
}

/// Resolve the visitor identity for one request.
///
/// A presented token that parses as a UUID is reused as-is; anything else
/// (absent, malformed, truncated) causes a new random UUID v4 to be minted.
/// The caller is responsible for echoing the identifier back to the client
/// with a sliding expiration, whether it was reused or minted.
///
/// This function never fails and never touches I/O.
pub fn resolve_visitor(existing_token: Option<&str>, source_addr: Option<&str>) -> ResolvedVisitor {
    let (visitor_id, is_new) = match existing_token.and_then(parse_token) {
        Some(id) => (id, false),
        None => (Uuid::new_v4().to_string(), true),
    };

    ResolvedVisitor {
        visitor_id,
        ip_fingerprint: source_addr.map(fingerprint_addr),
        is_new,
    }
}

/// Compute the non-reversible fingerprint of a source address.
///
/// Formula: sha256(addr)[0..8] encoded as 16 hex chars. Deterministic, so the
/// same address always aggregates to the same fingerprint; truncation keeps it
/// useless for recovering the address. The raw address must never be stored or
/// logged by callers.
pub fn fingerprint_addr(addr: &str) -> String {
    let hash = Sha256::digest(addr.as_bytes());
    hex::encode(&hash[..FINGERPRINT_HEX_LEN / 2])
}

fn parse_token(raw: &str) -> Option<String> {
    Uuid::parse_str(raw.trim()).ok().map(|u| u.to_string())
}
