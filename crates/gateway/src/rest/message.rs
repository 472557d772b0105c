//! Message mutation endpoints.
//!
//! Each handler returns the persisted record with its routing data; the
//! client relays that record over the socket to trigger fanout. A rejected
//! mutation never reaches the engine.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use parley_store::{CreateMessageRequest, Message};

use crate::error::GatewayResult;
use crate::rest::identity_from;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    pub content: String,
}

/// POST /api/messages
pub async fn create_message(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(req): Json<CreateMessageRequest>,
) -> GatewayResult<Json<Message>> {
    let identity = identity_from(&headers)?;
    let message = state.store.create_message(&identity, req).await?;
    Ok(Json(message))
}

/// PUT /api/messages/:message_id, owner-only.
pub async fn update_message(
    State(state): State<GatewayState>,
    Path(message_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateMessageRequest>,
) -> GatewayResult<Json<Message>> {
    let identity = identity_from(&headers)?;
    let message = state
        .store
        .edit_message(&identity, &message_id, req.content)
        .await?;
    Ok(Json(message))
}

/// DELETE /api/messages/:message_id, owner-only. The removed record comes
/// back so the client still has the member list for its relay.
pub async fn delete_message(
    State(state): State<GatewayState>,
    Path(message_id): Path<String>,
    headers: HeaderMap,
) -> GatewayResult<Json<Message>> {
    let identity = identity_from(&headers)?;
    let message = state.store.delete_message(&identity, &message_id).await?;
    Ok(Json(message))
}
