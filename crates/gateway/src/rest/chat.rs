//! Chat summary and history endpoints

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use parley_store::{ChatSummary, Message};

use crate::error::GatewayResult;
use crate::rest::identity_from;
use crate::state::GatewayState;

/// GET /api/chats: the authoritative chat-summary list, most recent
/// activity first. Clients re-fetch this whenever a live event arrives.
pub async fn list_chats(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> GatewayResult<Json<Vec<ChatSummary>>> {
    let identity = identity_from(&headers)?;
    Ok(Json(state.store.list_chats(&identity).await))
}

/// GET /api/chats/:chat_id/messages: full ordered history, fetched on every
/// chat open.
pub async fn list_messages(
    State(state): State<GatewayState>,
    Path(chat_id): Path<String>,
    headers: HeaderMap,
) -> GatewayResult<Json<Vec<Message>>> {
    let identity = identity_from(&headers)?;
    let messages = state.store.history(&chat_id, &identity).await?;
    Ok(Json(messages))
}
