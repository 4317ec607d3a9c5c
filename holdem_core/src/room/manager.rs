//! Process-wide room registry. The only globally shared structure; it is
//! touched on room creation, lookup, and destruction, with room contents
//! reachable solely through each room's actor.

use log::info;
use rand::{thread_rng, Rng};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};

use crate::game::entities::{ConnectionId, PlayerId};
use crate::net::errors::{ErrorCode, ErrorEvent};

use super::actor::{RoomActor, RoomHandle};
use super::config::{RoomConfig, RoomConfigOverrides};
use super::messages::{JoinAck, OutboundSender, RoomCommand};
use super::{Room, RoomId};

#[derive(Clone, Default)]
pub struct RoomManager {
    rooms: Arc<RwLock<HashMap<RoomId, RoomHandle>>>,
}

impl RoomManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room, spawn its actor, and bind the host's connection.
    /// The actor emits `ROOM_CREATED` to the host as its first frame.
    pub async fn create_room(
        &self,
        host_nickname: String,
        overrides: &RoomConfigOverrides,
        defaults: &RoomConfig,
        connection: ConnectionId,
        sender: OutboundSender,
    ) -> Result<(JoinAck, RoomHandle), ErrorEvent> {
        let config = defaults.with_overrides(overrides)?;

        let mut rooms = self.rooms.write().await;
        let room_id = Self::allocate_id(&rooms);
        let room = Room::new(room_id.clone(), host_nickname, config, connection);
        let player_id = room.host_id;
        let (actor, handle) = RoomActor::new(room, connection, sender);
        rooms.insert(room_id.clone(), handle.clone());
        drop(rooms);

        let registry = self.rooms.clone();
        let spawned_id = room_id.clone();
        tokio::spawn(async move {
            // An invariant breach inside the actor must not leak the
            // registry entry: the room is torn down either way and later
            // commands see ROOM_NOT_FOUND.
            if let Err(error) = tokio::spawn(actor.run()).await {
                log::error!("room {spawned_id}: actor crashed: {error}");
            }
            registry.write().await.remove(&spawned_id);
            info!("room {spawned_id} destroyed");
        });

        info!("room {room_id} created by {player_id}");
        Ok((
            JoinAck {
                room_id,
                player_id,
                is_reconnect: false,
            },
            handle,
        ))
    }

    /// Join or reconnect to an existing room. `require_existing` is the
    /// strict RECONNECT path: an unknown player id errors with a
    /// clear-session flag instead of falling back to a fresh join.
    pub async fn join_room(
        &self,
        room_id: &str,
        nickname: String,
        existing: Option<PlayerId>,
        require_existing: bool,
        connection: ConnectionId,
        sender: OutboundSender,
    ) -> Result<(JoinAck, RoomHandle), ErrorEvent> {
        let not_found = || {
            if existing.is_some() {
                ErrorEvent::clearing_session(ErrorCode::RoomNotFound)
            } else {
                ErrorEvent::new(ErrorCode::RoomNotFound)
            }
        };
        let handle = self.get(room_id).await.ok_or_else(not_found)?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomCommand::Join {
                nickname,
                existing,
                require_existing,
                connection,
                sender,
                response: tx,
            })
            .await
            .map_err(|_| not_found())?;
        let ack = rx.await.map_err(|_| not_found())??;
        Ok((ack, handle))
    }

    pub async fn get(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.read().await.get(room_id).cloned()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// A 6-digit decimal id unique among live rooms.
    fn allocate_id(rooms: &HashMap<RoomId, RoomHandle>) -> RoomId {
        let mut rng = thread_rng();
        loop {
            let id = format!("{:06}", rng.gen_range(0..1_000_000));
            if !rooms.contains_key(&id) {
                return id;
            }
        }
    }
}
