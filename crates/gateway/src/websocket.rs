//! WebSocket endpoint binding live sockets to the sync engine.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use parley_realtime::{
    ChatEvent, ClientEvent, ConnectionHandle, ConnectionRegistry, PresenceChange, RoomId,
    ServerEvent, TypingTransition,
};

use crate::state::GatewayState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (mut ws_sender, mut receiver) = socket.split();

    // Per-connection outbound queue. Broadcasts push into it synchronously;
    // this task alone writes to the wire, preserving per-connection order.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let sender_task = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if ws_sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Populated by the setup frame; everything else is rejected until then.
    let mut connection: Option<ConnectionHandle> = None;

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(ClientEvent::Setup { identity }) => {
                    if connection.is_some() {
                        let _ = out_tx.send(ServerEvent::Error {
                            message: "connection is already set up".to_string(),
                        });
                        continue;
                    }
                    connection = Some(setup_connection(&state, identity, &out_tx).await);
                }
                Ok(event) => match connection.as_ref() {
                    Some(handle) => handle_client_event(event, handle, &state, &out_tx).await,
                    None => {
                        let _ = out_tx.send(ServerEvent::Error {
                            message: "setup required before other events".to_string(),
                        });
                    }
                },
                Err(error) => {
                    debug!(%error, "dropping malformed client frame");
                    let _ = out_tx.send(ServerEvent::Error {
                        message: "invalid event format".to_string(),
                    });
                }
            },
            Ok(Message::Close(_)) => break,
            Err(error) => {
                debug!(%error, "websocket receive error");
                break;
            }
            _ => {
                // ping/pong/binary are ignored
            }
        }
    }

    if let Some(handle) = connection {
        teardown_connection(&state, &handle).await;
    }
    sender_task.abort();
}

/// Register the connection, join its personal mailbox room, and ack.
async fn setup_connection(
    state: &GatewayState,
    identity: String,
    out_tx: &mpsc::UnboundedSender<ServerEvent>,
) -> ConnectionHandle {
    let handle = ConnectionHandle::new(identity, out_tx.clone());

    let presence = state.registry.register(handle.clone()).await;
    state
        .router
        .join(
            ConnectionRegistry::personal_room_of(&handle.identity),
            handle.clone(),
        )
        .await;

    if presence == PresenceChange::Online {
        info!(identity = %handle.identity, "identity online");
    }
    debug!(identity = %handle.identity, connection = %handle.id, "connection set up");

    let _ = out_tx.send(ServerEvent::Connected);
    handle
}

/// Disconnect cancels only future deliveries; nothing already broadcast is
/// retracted.
async fn teardown_connection(state: &GatewayState, handle: &ConnectionHandle) {
    state.router.leave_all(handle.id).await;
    let presence = state.registry.unregister(handle.id).await;
    if presence == PresenceChange::Offline {
        info!(identity = %handle.identity, "identity offline");
    }
    debug!(identity = %handle.identity, connection = %handle.id, "connection torn down");
}

async fn handle_client_event(
    event: ClientEvent,
    handle: &ConnectionHandle,
    state: &GatewayState,
    out_tx: &mpsc::UnboundedSender<ServerEvent>,
) {
    match event {
        // handled by the socket loop before we get here
        ClientEvent::Setup { .. } => {}

        ClientEvent::JoinRoom { chat_id } => {
            // room membership is a routing table, not an authority; the
            // store decides who may join
            match state.store.members_of(&chat_id).await {
                Ok(members) if members.iter().any(|m| m == &handle.identity) => {
                    state
                        .router
                        .join(RoomId::Chat(chat_id), handle.clone())
                        .await;
                }
                Ok(_) => {
                    let _ = out_tx.send(ServerEvent::Error {
                        message: "not a member of this chat".to_string(),
                    });
                }
                Err(error) => {
                    debug!(%error, %chat_id, "join_room rejected");
                    let _ = out_tx.send(ServerEvent::Error {
                        message: "chat not found".to_string(),
                    });
                }
            }
        }

        ClientEvent::Typing { chat_id } => {
            if state.typing.signal(&chat_id, &handle.identity).await
                == Some(TypingTransition::Started)
            {
                state
                    .fanout
                    .dispatch(ChatEvent::TypingStarted {
                        chat_id: chat_id.clone(),
                        identity: handle.identity.clone(),
                    })
                    .await;
                schedule_idle_check(state.clone(), chat_id, handle.identity.clone());
            }
        }

        ClientEvent::StopTyping { chat_id } => {
            if state.typing.stop(&chat_id, &handle.identity).await
                == Some(TypingTransition::Stopped)
            {
                state
                    .fanout
                    .dispatch(ChatEvent::TypingStopped {
                        chat_id,
                        identity: handle.identity.clone(),
                    })
                    .await;
            }
        }

        // the relays: the mutation already succeeded at the store boundary,
        // this connection is just telling us to distribute the record
        ClientEvent::MessageCreated { message } => {
            state
                .fanout
                .dispatch(ChatEvent::MessageCreated { message })
                .await;
        }
        ClientEvent::MessageEdited { message } => {
            state
                .fanout
                .dispatch(ChatEvent::MessageEdited { message })
                .await;
        }
        ClientEvent::MessageDeleted {
            message_id,
            chat_id,
            members,
            actor_id,
        } => {
            if members.is_empty() {
                warn!(%chat_id, "message_deleted relay without members");
            }
            state
                .fanout
                .dispatch(ChatEvent::MessageDeleted {
                    message_id,
                    chat_id,
                    members,
                    actor_id,
                })
                .await;
        }
    }
}

/// Deferred inactivity check for the typing indicator. Never cancelled; a
/// check that fires after renewed activity observes a fresh timestamp and
/// does nothing.
fn schedule_idle_check(state: GatewayState, chat_id: String, identity: String) {
    tokio::spawn(async move {
        tokio::time::sleep(state.typing.idle_timeout()).await;
        if state.typing.expire_check(&chat_id, &identity).await
            == Some(TypingTransition::Stopped)
        {
            state
                .fanout
                .dispatch(ChatEvent::TypingStopped { chat_id, identity })
                .await;
        }
    });
}
