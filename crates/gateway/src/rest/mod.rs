//! REST surface standing in for the collaborator's request interface.
//!
//! Mutations happen here first; only a successful response ever turns into a
//! live relay. Credential authentication is an external collaborator, so the
//! acting identity arrives as a forwarded header.

pub mod chat;
pub mod health;
pub mod message;

use axum::http::HeaderMap;

use crate::error::{GatewayError, GatewayResult};

pub(crate) const IDENTITY_HEADER: &str = "x-identity";

pub(crate) fn identity_from(headers: &HeaderMap) -> GatewayResult<String> {
    headers
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            GatewayError::AuthenticationFailed("missing x-identity header".to_string())
        })
}
