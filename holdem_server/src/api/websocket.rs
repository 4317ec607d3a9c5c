//! The per-connection gateway loop.
//!
//! A connection starts unbound: the only commands accepted are
//! `CREATE_ROOM`, `JOIN_ROOM`, and `RECONNECT`. Once bound, inbound
//! commands are forwarded to the owning room's actor and every frame the
//! actor produces for this connection is pumped to the socket. The actor
//! is the sole event producer, so frames arrive version-ordered.
//!
//! On socket close the room is told to detach: seated players keep their
//! seats (and their running turn timers), spectators are removed.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use holdem_core::{
    entities::ActionRequest, ClientCommand, Envelope, ErrorCode, ErrorEvent, RoomCommand,
    RoomHandle, ServerEvent,
};

use super::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Serialize a request-scoped error for a connection not yet bound to a
/// room (version 0: errors are exempt from the stale-version rule).
fn error_frame(error: &ErrorEvent) -> String {
    let envelope = Envelope {
        state_version: 0,
        event: ServerEvent::error(error),
    };
    serde_json::to_string(&envelope).unwrap_or_default()
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    info!("connection {connection} opened");

    // Pump room frames to the socket until either side closes.
    let send_task = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    let mut binding: Option<(RoomHandle, Uuid)> = None;

    while let Some(message) = stream.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        let command = match serde_json::from_str::<ClientCommand>(&text) {
            Ok(command) => command,
            Err(error) => {
                debug!("connection {connection}: malformed message: {error}");
                let event = ErrorEvent::with_message(
                    ErrorCode::BadRequest,
                    format!("malformed message: {error}"),
                );
                if out_tx.send(error_frame(&event)).is_err() {
                    break;
                }
                continue;
            }
        };

        match binding.clone() {
            None => {
                let result = match command {
                    ClientCommand::CreateRoom {
                        host_nickname,
                        config,
                    } => {
                        state
                            .manager
                            .create_room(
                                host_nickname,
                                &config,
                                &state.room_defaults,
                                connection,
                                out_tx.clone(),
                            )
                            .await
                    }
                    ClientCommand::JoinRoom {
                        room_id,
                        nickname,
                        player_id,
                    } => {
                        state
                            .manager
                            .join_room(
                                &room_id,
                                nickname,
                                player_id,
                                false,
                                connection,
                                out_tx.clone(),
                            )
                            .await
                    }
                    ClientCommand::Reconnect { room_id, player_id } => {
                        state
                            .manager
                            .join_room(
                                &room_id,
                                String::new(),
                                Some(player_id),
                                true,
                                connection,
                                out_tx.clone(),
                            )
                            .await
                    }
                    _ => {
                        let event = ErrorEvent::new(ErrorCode::NotInRoom);
                        if out_tx.send(error_frame(&event)).is_err() {
                            break;
                        }
                        continue;
                    }
                };
                match result {
                    Ok((ack, handle)) => {
                        info!(
                            "connection {connection}: bound to room {} as {} (reconnect: {})",
                            ack.room_id, ack.player_id, ack.is_reconnect
                        );
                        binding = Some((handle, ack.player_id));
                    }
                    Err(event) => {
                        if out_tx.send(error_frame(&event)).is_err() {
                            break;
                        }
                    }
                }
            }
            Some((handle, player_id)) => {
                let outcome = match command {
                    ClientCommand::SitDown { seat_index } => {
                        handle
                            .send(RoomCommand::SitDown {
                                player_id,
                                connection,
                                seat_index,
                            })
                            .await
                    }
                    ClientCommand::StandUp => {
                        handle
                            .send(RoomCommand::StandUp {
                                player_id,
                                connection,
                            })
                            .await
                    }
                    ClientCommand::StartGame => {
                        handle
                            .send(RoomCommand::StartGame {
                                player_id,
                                connection,
                            })
                            .await
                    }
                    ClientCommand::PlayerAction {
                        action,
                        amount,
                        round_index,
                        request_id,
                    } => {
                        handle
                            .send(RoomCommand::Action {
                                player_id,
                                connection,
                                request: ActionRequest {
                                    kind: action,
                                    amount,
                                    round_index,
                                    request_id,
                                },
                            })
                            .await
                    }
                    ClientCommand::PlayerReady => {
                        handle
                            .send(RoomCommand::Ready {
                                player_id,
                                connection,
                            })
                            .await
                    }
                    ClientCommand::KickPlayer { target_player_id } => {
                        handle
                            .send(RoomCommand::Kick {
                                player_id,
                                connection,
                                target: target_player_id,
                            })
                            .await
                    }
                    ClientCommand::LeaveRoom => {
                        let (tx, rx) = oneshot::channel();
                        let sent = handle
                            .send(RoomCommand::Leave {
                                player_id,
                                connection,
                                response: tx,
                            })
                            .await;
                        if sent.is_ok() {
                            if let Ok(Ok(())) = rx.await {
                                info!("connection {connection}: left room");
                                binding = None;
                            }
                        }
                        sent
                    }
                    ClientCommand::CreateRoom { .. }
                    | ClientCommand::JoinRoom { .. }
                    | ClientCommand::Reconnect { .. } => {
                        let event = ErrorEvent::with_message(
                            ErrorCode::BadRequest,
                            "already bound to a room",
                        );
                        if out_tx.send(error_frame(&event)).is_err() {
                            break;
                        }
                        continue;
                    }
                };
                if outcome.is_err() {
                    // The room vanished underneath us.
                    warn!("connection {connection}: room closed");
                    let event = ErrorEvent::clearing_session(ErrorCode::RoomNotFound);
                    let _ = out_tx.send(error_frame(&event));
                    binding = None;
                }
            }
        }
    }

    // Disconnection is silently tolerated: the room keeps seated players
    // and their timers; spectators are dropped.
    if let Some((handle, _)) = binding {
        let _ = handle.send(RoomCommand::Detach { connection }).await;
    }
    send_task.abort();
    info!("connection {connection} closed");
}
