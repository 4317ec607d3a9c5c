//! The per-room actor: the serial executor that owns a [`Room`]. Every
//! mutation (membership, actions, timer firings) runs one at a time in
//! this task; multiple rooms run concurrently with each other. The actor
//! is also the only event producer, so per-connection ordering and
//! version monotonicity fall out for free.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::game::entities::{ConnectionId, PlayerId};
use crate::game::state::HandEvent;
use crate::net::errors::{ErrorCode, ErrorEvent};
use crate::net::messages::{Envelope, PlayerPublic, RoomSnapshot, ServerEvent};

use super::messages::{JoinAck, OutboundSender, RoomCommand};
use super::{Room, RoomId};

const INBOX_CAPACITY: usize = 64;

/// Wall-clock now in unix milliseconds.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Handle for sending commands to a room's actor.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomCommand>,
    room_id: RoomId,
}

impl RoomHandle {
    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Send a command. Fails only when the room is gone.
    pub async fn send(&self, command: RoomCommand) -> Result<(), ErrorEvent> {
        self.sender
            .send(command)
            .await
            .map_err(|_| ErrorEvent::new(ErrorCode::RoomNotFound))
    }
}

/// The room's single timer slot: at most one of the turn deadline or the
/// inter-hand delay is armed at a time.
#[derive(Clone, Copy, Debug)]
struct TimerSlot {
    deadline: Instant,
    kind: TimerKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TimerKind {
    TurnTimeout,
    NextHand,
}

pub struct RoomActor {
    room: Room,
    inbox: mpsc::Receiver<RoomCommand>,
    /// Live outbound channels keyed by connection.
    connections: HashMap<ConnectionId, OutboundSender>,
    timer: Option<TimerSlot>,
    closed: bool,
}

impl RoomActor {
    /// Build the actor with the host's connection already attached.
    #[must_use]
    pub fn new(
        room: Room,
        host_connection: ConnectionId,
        host_sender: OutboundSender,
    ) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let room_id = room.id.clone();
        let mut connections = HashMap::new();
        connections.insert(host_connection, host_sender);
        let actor = Self {
            room,
            inbox,
            connections,
            timer: None,
            closed: false,
        };
        (actor, RoomHandle { sender, room_id })
    }

    /// Run the actor until the room empties or every handle is dropped.
    pub async fn run(mut self) {
        info!("room {}: actor started", self.room.id);
        let host_connection = self.connections.keys().next().copied();
        if let Some(connection) = host_connection {
            let event = ServerEvent::RoomCreated {
                room_id: self.room.id.clone(),
                player_id: self.room.host_id,
                snapshot: RoomSnapshot::project(&self.room),
            };
            self.send_to_connection(connection, event);
        }

        loop {
            if self.closed {
                break;
            }
            match self.timer {
                Some(slot) => {
                    tokio::select! {
                        command = self.inbox.recv() => match command {
                            Some(command) => self.handle(command),
                            None => break,
                        },
                        () = sleep_until(slot.deadline) => {
                            self.timer = None;
                            self.handle_timer(slot.kind);
                        }
                    }
                }
                None => match self.inbox.recv().await {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }
        info!("room {}: actor stopped", self.room.id);
    }

    fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join {
                nickname,
                existing,
                require_existing,
                connection,
                sender,
                response,
            } => {
                let result =
                    self.handle_join(nickname, existing, require_existing, connection, sender);
                let _ = response.send(result);
            }
            RoomCommand::SitDown {
                player_id,
                connection,
                seat_index,
            } => match self.room.sit_down(player_id, seat_index) {
                Ok(()) => {
                    self.broadcast(ServerEvent::PlayerSat {
                        player_id,
                        seat_index,
                    });
                    self.broadcast_room_updated();
                }
                Err(code) => self.send_error(connection, &ErrorEvent::new(code)),
            },
            RoomCommand::StandUp {
                player_id,
                connection,
            } => match self.room.stand_up(player_id) {
                Ok(()) => {
                    self.broadcast(ServerEvent::PlayerStood { player_id });
                    self.broadcast_room_updated();
                }
                Err(code) => self.send_error(connection, &ErrorEvent::new(code)),
            },
            RoomCommand::StartGame {
                player_id,
                connection,
            } => {
                if let Err(code) = self.room.can_start(player_id) {
                    self.send_error(connection, &ErrorEvent::new(code));
                    return;
                }
                match self.room.start_hand(now_ms()) {
                    Ok(events) => self.emit_hand_events(events),
                    Err(code) => self.send_error(connection, &ErrorEvent::new(code)),
                }
            }
            RoomCommand::Action {
                player_id,
                connection,
                request,
            } => match self.room.apply_action(player_id, &request, now_ms()) {
                Ok(events) => self.emit_hand_events(events),
                Err(code) => self.send_error(connection, &ErrorEvent::new(code)),
            },
            RoomCommand::Ready {
                player_id,
                connection,
            } => match self.room.set_ready(player_id) {
                Ok(is_ready) => {
                    self.broadcast(ServerEvent::ReadyStateChanged {
                        player_id,
                        is_ready,
                    });
                }
                Err(code) => self.send_error(connection, &ErrorEvent::new(code)),
            },
            RoomCommand::Kick {
                player_id,
                connection,
                target,
            } => {
                let target_connection = self
                    .room
                    .player(target)
                    .and_then(|p| p.connection);
                match self.room.kick(player_id, target) {
                    Ok(()) => {
                        if let Some(target_connection) = target_connection {
                            self.send_to_connection(
                                target_connection,
                                ServerEvent::PlayerKicked {
                                    player_id: target,
                                    should_clear_session: Some(true),
                                },
                            );
                            self.connections.remove(&target_connection);
                        }
                        self.broadcast(ServerEvent::PlayerKicked {
                            player_id: target,
                            should_clear_session: None,
                        });
                        self.broadcast_room_updated();
                    }
                    Err(code) => self.send_error(connection, &ErrorEvent::new(code)),
                }
            }
            RoomCommand::Leave {
                player_id,
                connection,
                response,
            } => match self.room.leave(player_id) {
                Ok(outcome) => {
                    self.connections.remove(&connection);
                    self.broadcast(ServerEvent::PlayerLeft { player_id });
                    if let Some(new_host_id) = outcome.new_host {
                        self.broadcast(ServerEvent::HostTransferred { new_host_id });
                    }
                    if outcome.room_empty {
                        self.closed = true;
                    } else {
                        self.broadcast_room_updated();
                    }
                    let _ = response.send(Ok(()));
                }
                Err(code) => {
                    let event = ErrorEvent::new(code);
                    self.send_error(connection, &event);
                    let _ = response.send(Err(event));
                }
            },
            RoomCommand::Detach { connection } => self.handle_detach(connection),
        }
    }

    fn handle_join(
        &mut self,
        nickname: String,
        existing: Option<PlayerId>,
        require_existing: bool,
        connection: ConnectionId,
        sender: OutboundSender,
    ) -> Result<JoinAck, ErrorEvent> {
        if let Some(player_id) = existing {
            if self.room.rebind(player_id, connection) {
                self.connections.insert(connection, sender);
                let (my_cards, hand_id, round_id) = match (
                    self.room.player(player_id),
                    self.room.game.as_ref(),
                ) {
                    (Some(player), Some(game)) if !player.hole_cards.is_empty() => (
                        Some(player.hole_cards.clone()),
                        Some(game.hand_id),
                        Some(game.round_id),
                    ),
                    (_, Some(game)) => (None, Some(game.hand_id), Some(game.round_id)),
                    _ => (None, None, None),
                };
                let event = ServerEvent::Reconnected {
                    room_id: self.room.id.clone(),
                    player_id,
                    snapshot: RoomSnapshot::project(&self.room),
                    my_cards,
                    hand_id,
                    round_id,
                };
                self.send_to_connection(connection, event);
                self.broadcast_room_updated();
                info!("room {}: player {player_id} reconnected", self.room.id);
                return Ok(JoinAck {
                    room_id: self.room.id.clone(),
                    player_id,
                    is_reconnect: true,
                });
            }
            if require_existing {
                return Err(ErrorEvent::clearing_session(ErrorCode::NotInRoom));
            }
        }

        let player_id = self.room.join(nickname, connection);
        self.connections.insert(connection, sender);
        let joined = ServerEvent::RoomJoined {
            room_id: self.room.id.clone(),
            player_id,
            snapshot: RoomSnapshot::project(&self.room),
        };
        self.send_to_connection(connection, joined);
        if let Some(player) = self.room.player(player_id) {
            let public = PlayerPublic::project(player);
            self.broadcast(ServerEvent::PlayerJoined { player: public });
        }
        Ok(JoinAck {
            room_id: self.room.id.clone(),
            player_id,
            is_reconnect: false,
        })
    }

    fn handle_detach(&mut self, connection: ConnectionId) {
        self.connections.remove(&connection);
        let Some(player_id) = self.room.detach_connection(connection) else {
            return;
        };
        let seated = self
            .room
            .player(player_id)
            .is_some_and(|p| p.is_seated());
        if seated {
            // Seated players survive disconnects; their turn timer keeps
            // running and the seat is held for reconnection.
            debug!(
                "room {}: seated player {player_id} disconnected",
                self.room.id
            );
            self.broadcast_room_updated();
        } else {
            // Nothing binds an unseated spectator to the room.
            if let Ok(outcome) = self.room.leave(player_id) {
                self.broadcast(ServerEvent::PlayerLeft { player_id });
                if let Some(new_host_id) = outcome.new_host {
                    self.broadcast(ServerEvent::HostTransferred { new_host_id });
                }
                if outcome.room_empty {
                    self.closed = true;
                } else {
                    self.broadcast_room_updated();
                }
            }
        }
    }

    fn handle_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::TurnTimeout => {
                let events = self.room.apply_timeout(now_ms());
                self.emit_hand_events(events);
            }
            TimerKind::NextHand => {
                if !self.room.is_playing {
                    return;
                }
                match self.room.start_hand(now_ms()) {
                    Ok(events) => self.emit_hand_events(events),
                    Err(code) => {
                        warn!(
                            "room {}: could not start next hand: {code}",
                            self.room.id
                        );
                        self.room.is_playing = false;
                        self.broadcast_room_updated();
                    }
                }
            }
        }
    }

    /// Turn controller outcomes into frames and timer updates.
    fn emit_hand_events(&mut self, events: Vec<HandEvent>) {
        for event in events {
            match event {
                HandEvent::HandStarted {
                    hand_id,
                    hand_number,
                    dealer_seat,
                    small_blind_seat,
                    big_blind_seat,
                } => {
                    self.timer = None;
                    let snapshot = RoomSnapshot::project(&self.room);
                    self.broadcast(ServerEvent::GameStarted {
                        hand_id,
                        hand_number,
                        dealer_seat,
                        small_blind_seat,
                        big_blind_seat,
                        snapshot,
                    });
                }
                HandEvent::HoleCardsDealt { hand_id } => {
                    let deals: Vec<(ConnectionId, ServerEvent)> = self
                        .room
                        .players
                        .iter()
                        .filter(|p| !p.hole_cards.is_empty())
                        .filter_map(|p| {
                            let connection = p.connection?;
                            Some((
                                connection,
                                ServerEvent::DealCards {
                                    hand_id,
                                    cards: p.hole_cards.clone(),
                                },
                            ))
                        })
                        .collect();
                    for (connection, event) in deals {
                        self.send_to_connection(connection, event);
                    }
                }
                HandEvent::TurnMoved {
                    player_id,
                    seat,
                    deadline_ms,
                    hand_id,
                    round_id,
                } => {
                    self.broadcast(ServerEvent::PlayerTurn {
                        player_id,
                        seat_index: seat,
                        deadline_ms,
                        hand_id,
                        round_id,
                    });
                    self.arm_timer(deadline_ms, TimerKind::TurnTimeout);
                }
                HandEvent::PlayerActed {
                    record,
                    pot_total,
                    hand_id,
                    round_id,
                } => {
                    self.timer = None;
                    self.broadcast(ServerEvent::PlayerActed {
                        player_id: record.player_id,
                        seat_index: record.seat,
                        action: record.kind,
                        paid: record.paid,
                        bet_to: record.bet_to,
                        pot_total,
                        auto: record.auto,
                        hand_id,
                        round_id,
                    });
                }
                HandEvent::PhaseAdvanced { .. } => {
                    let snapshot = RoomSnapshot::project(&self.room);
                    self.broadcast(ServerEvent::SyncState {
                        snapshot,
                        my_cards: None,
                    });
                }
                HandEvent::HandEnded { result } => {
                    self.timer = None;
                    self.broadcast(ServerEvent::HandResult { result });
                    if self.room.is_playing {
                        let delay_ms = self.room.config.inter_hand_delay_seconds * 1000;
                        self.arm_timer(now_ms() + delay_ms, TimerKind::NextHand);
                        let snapshot = RoomSnapshot::project(&self.room);
                        self.broadcast(ServerEvent::SyncState {
                            snapshot,
                            my_cards: None,
                        });
                    }
                }
                HandEvent::HostTransferred { new_host_id } => {
                    self.broadcast(ServerEvent::HostTransferred { new_host_id });
                }
                HandEvent::GameEnded { winner_id } => {
                    self.timer = None;
                    self.broadcast(ServerEvent::GameEnded { winner_id });
                    self.broadcast_room_updated();
                }
            }
        }
    }

    fn arm_timer(&mut self, deadline_unix_ms: u64, kind: TimerKind) {
        let delay = deadline_unix_ms.saturating_sub(now_ms());
        self.timer = Some(TimerSlot {
            deadline: Instant::now() + Duration::from_millis(delay),
            kind,
        });
    }

    fn next_version(&mut self) -> u64 {
        self.room.state_version += 1;
        self.room.state_version
    }

    fn broadcast(&mut self, event: ServerEvent) {
        let envelope = Envelope {
            state_version: self.next_version(),
            event,
        };
        match serde_json::to_string(&envelope) {
            Ok(frame) => {
                // Dead connections drop out of the fan-out silently.
                self.connections.retain(|_, tx| tx.send(frame.clone()).is_ok());
            }
            Err(error) => warn!("room {}: failed to encode event: {error}", self.room.id),
        }
    }

    fn send_to_connection(&mut self, connection: ConnectionId, event: ServerEvent) {
        let envelope = Envelope {
            state_version: self.next_version(),
            event,
        };
        match serde_json::to_string(&envelope) {
            Ok(frame) => {
                if let Some(tx) = self.connections.get(&connection) {
                    if tx.send(frame).is_err() {
                        self.connections.remove(&connection);
                    }
                }
            }
            Err(error) => warn!("room {}: failed to encode event: {error}", self.room.id),
        }
    }

    fn send_error(&mut self, connection: ConnectionId, error: &ErrorEvent) {
        self.send_to_connection(connection, ServerEvent::error(error));
    }

    fn broadcast_room_updated(&mut self) {
        let snapshot = RoomSnapshot::project(&self.room);
        self.broadcast(ServerEvent::RoomUpdated { snapshot });
    }
}
