//! Authenticated principal extraction.
//!
//! Flow Overview: read the `Authorization` header, hash the token, and ask the
//! `PrincipalResolver` for the matching user. Both the `Token <key>` and
//! `Bearer <key>` schemes are accepted.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::debug;

use crate::repairs::{
    token::{hash_token, token_fingerprint, valid_token},
    Principal, PrincipalResolver, TicketError,
};

/// Resolve the request token into a principal, or fail with `Unauthenticated`.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    resolver: &dyn PrincipalResolver,
) -> Result<Principal, TicketError> {
    let Some(token) = extract_token(headers) else {
        return Err(TicketError::Unauthenticated);
    };
    if !valid_token(&token) {
        return Err(TicketError::Unauthenticated);
    }

    match resolver.resolve(&hash_token(&token)).await? {
        Some(principal) => Ok(principal),
        None => {
            debug!(token = %token_fingerprint(&token), "unknown api token");
            Err(TicketError::Unauthenticated)
        }
    }
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = ["Token ", "token ", "Bearer ", "bearer "]
        .iter()
        .find_map(|scheme| trimmed.strip_prefix(scheme))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
