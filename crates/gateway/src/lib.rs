//! # Parley Gateway Crate
//!
//! The transport layer: one WebSocket endpoint that binds live sockets to
//! the sync engine (registry, rooms, fanout, typing), and the thin REST
//! surface standing in for the persistence collaborator's request interface.
//!
//! ## Flow
//!
//! A client authenticates out of band, performs its mutation over REST, and
//! relays the persisted record over the socket; the fanout engine then
//! distributes it to every other member's personal room. Typing signals skip
//! REST entirely and drive the debounce state machine directly.

pub mod error;
pub mod rest;
pub mod state;
pub mod websocket;

pub use error::{GatewayError, GatewayResult};
pub use state::GatewayState;

use axum::{
    http::Method,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/health", get(rest::health::health_check))
        .route("/api/chats", get(rest::chat::list_chats))
        .route("/api/chats/:chat_id/messages", get(rest::chat::list_messages))
        .route("/api/messages", post(rest::message::create_message))
        .route(
            "/api/messages/:message_id",
            put(rest::message::update_message).delete(rest::message::delete_message),
        )
        .route("/ws", get(websocket::websocket_handler))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers(Any),
        )
}
