//! Rooms: the unit of ownership. A room holds its players, seat map, host
//! designation, and (while a hand runs) the game state. All mutation goes
//! through the room's actor, one command at a time.

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;
pub mod request_ids;

use chrono::{DateTime, Utc};

use crate::game::constants;
use crate::game::entities::{ConnectionId, Player, PlayerId, PlayerStatus, SeatIndex};
use crate::game::state::GameState;
use crate::net::errors::ErrorCode;
use config::RoomConfig;
use request_ids::RequestLog;

/// 6-digit decimal room identifier, unique across live rooms.
pub type RoomId = String;

/// Outcome of a leave operation, used by the actor to emit follow-ups.
#[derive(Clone, Debug, PartialEq)]
pub struct LeaveOutcome {
    pub new_host: Option<PlayerId>,
    pub room_empty: bool,
}

#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    pub host_id: PlayerId,
    pub config: RoomConfig,
    /// Members in join order; join order decides host succession.
    pub players: Vec<Player>,
    /// Seat map indexed by seat; consistent with `Player::seat`.
    pub seats: Vec<Option<PlayerId>>,
    pub game: Option<GameState>,
    pub is_playing: bool,
    pub created_at: DateTime<Utc>,
    /// Monotonic across the room's lifetime; stamped on every outbound
    /// event.
    pub state_version: u64,
    pub processed_requests: RequestLog,
    /// Button position of the previous hand, for rotation.
    pub last_dealer_seat: Option<SeatIndex>,
    pub hands_played: u64,
}

impl Room {
    /// Create a room with its host already joined.
    #[must_use]
    pub fn new(
        id: RoomId,
        host_nickname: String,
        config: RoomConfig,
        connection: ConnectionId,
    ) -> Self {
        let mut host = Player::new(host_nickname, connection);
        host.is_host = true;
        let host_id = host.id;
        let seats = vec![None; config.max_players];
        Self {
            id,
            host_id,
            config,
            players: vec![host],
            seats,
            game: None,
            is_playing: false,
            created_at: Utc::now(),
            state_version: 0,
            processed_requests: RequestLog::new(constants::REQUEST_LOG_CAPACITY),
            last_dealer_seat: None,
            hands_played: 0,
        }
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    #[must_use]
    pub fn player_at_seat(&self, seat: SeatIndex) -> Option<&Player> {
        let id = (*self.seats.get(seat)?)?;
        self.player(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Seats currently eligible to be dealt in: occupied, funded, not
    /// eliminated. Ascending.
    #[must_use]
    pub fn eligible_seats(&self) -> Vec<SeatIndex> {
        (0..self.seats.len())
            .filter(|&seat| {
                self.player_at_seat(seat)
                    .is_some_and(|p| p.chips > 0 && p.status != PlayerStatus::Eliminated)
            })
            .collect()
    }

    /// Join as a fresh spectator. Always succeeds once the room exists.
    pub fn join(&mut self, nickname: String, connection: ConnectionId) -> PlayerId {
        let player = Player::new(nickname, connection);
        let id = player.id;
        self.players.push(player);
        id
    }

    /// Rebind an existing member to a new connection (reconnect). No other
    /// state changes: timers keep running, seats are kept.
    pub fn rebind(&mut self, player_id: PlayerId, connection: ConnectionId) -> bool {
        match self.player_mut(player_id) {
            Some(player) => {
                player.connection = Some(connection);
                true
            }
            None => false,
        }
    }

    /// Unbind whatever player holds this connection. Returns the player id
    /// if one was bound.
    pub fn detach_connection(&mut self, connection: ConnectionId) -> Option<PlayerId> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.connection == Some(connection))?;
        player.connection = None;
        Some(player.id)
    }

    pub fn sit_down(&mut self, player_id: PlayerId, seat: SeatIndex) -> Result<(), ErrorCode> {
        if seat >= self.config.max_players {
            return Err(ErrorCode::InvalidSeatIndex);
        }
        if self.seats[seat].is_some() {
            return Err(ErrorCode::SeatOccupied);
        }
        let initial_chips = self.config.initial_chips;
        let player = self.player_mut(player_id).ok_or(ErrorCode::NotInRoom)?;
        if player.is_seated() {
            return Err(ErrorCode::AlreadySeated);
        }
        player.sit_down(seat);
        if !player.bought_in {
            player.chips = initial_chips;
            player.bought_in = true;
        }
        self.seats[seat] = Some(player_id);
        Ok(())
    }

    pub fn stand_up(&mut self, player_id: PlayerId) -> Result<(), ErrorCode> {
        if self.is_playing {
            return Err(ErrorCode::GameInProgress);
        }
        let player = self.player_mut(player_id).ok_or(ErrorCode::NotInRoom)?;
        let seat = player.seat.ok_or(ErrorCode::NotSeated)?;
        player.stand_up();
        self.seats[seat] = None;
        Ok(())
    }

    /// Mark a seated player ready for the next game. The host is
    /// implicitly ready.
    pub fn set_ready(&mut self, player_id: PlayerId) -> Result<bool, ErrorCode> {
        let player = self.player_mut(player_id).ok_or(ErrorCode::NotInRoom)?;
        if !player.is_seated() {
            return Err(ErrorCode::NotSeated);
        }
        player.is_ready = true;
        Ok(true)
    }

    pub fn kick(&mut self, requester: PlayerId, target: PlayerId) -> Result<(), ErrorCode> {
        if requester != self.host_id {
            return Err(ErrorCode::NotHost);
        }
        if requester == target {
            return Err(ErrorCode::CannotKickSelf);
        }
        if self.is_playing {
            return Err(ErrorCode::GameInProgress);
        }
        if self.player(target).is_none() {
            return Err(ErrorCode::TargetNotFound);
        }
        self.remove_player(target);
        Ok(())
    }

    /// Leave the room. Seated players may not leave mid-game (only
    /// disconnect); the host hands the room to the earliest-joined
    /// remaining member.
    pub fn leave(&mut self, player_id: PlayerId) -> Result<LeaveOutcome, ErrorCode> {
        let player = self.player(player_id).ok_or(ErrorCode::NotInRoom)?;
        if self.is_playing && player.is_seated() {
            return Err(ErrorCode::GameInProgress);
        }
        let was_host = player.is_host;
        self.remove_player(player_id);

        let mut new_host = None;
        if was_host && !self.players.is_empty() {
            let successor = self.players[0].id;
            self.transfer_host_to(successor);
            new_host = Some(successor);
        }
        Ok(LeaveOutcome {
            new_host,
            room_empty: self.players.is_empty(),
        })
    }

    pub fn transfer_host_to(&mut self, successor: PlayerId) {
        for player in &mut self.players {
            player.is_host = player.id == successor;
        }
        self.host_id = successor;
    }

    /// Pick a host successor after the current host busts: the first
    /// non-eliminated seated player by seat index.
    #[must_use]
    pub fn host_successor_by_seat(&self) -> Option<PlayerId> {
        (0..self.seats.len())
            .filter_map(|seat| self.player_at_seat(seat))
            .find(|p| p.id != self.host_id && p.status != PlayerStatus::Eliminated)
            .map(|p| p.id)
    }

    /// Whether the host may start a game right now.
    pub fn can_start(&self, requester: PlayerId) -> Result<(), ErrorCode> {
        if requester != self.host_id {
            return Err(ErrorCode::NotHost);
        }
        if self.is_playing {
            return Err(ErrorCode::GameAlreadyStarted);
        }
        if self.eligible_seats().len() < constants::MIN_PLAYERS_TO_START {
            return Err(ErrorCode::NotEnoughPlayers);
        }
        let all_ready = self
            .players
            .iter()
            .filter(|p| p.is_seated() && p.chips > 0 && p.id != self.host_id)
            .all(|p| p.is_ready);
        if !all_ready {
            return Err(ErrorCode::PlayersNotReady);
        }
        Ok(())
    }

    fn remove_player(&mut self, player_id: PlayerId) {
        if let Some(player) = self.player(player_id) {
            if let Some(seat) = player.seat {
                self.seats[seat] = None;
            }
        }
        self.players.retain(|p| p.id != player_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn room() -> Room {
        Room::new(
            "123456".into(),
            "host".into(),
            RoomConfig::default(),
            Uuid::new_v4(),
        )
    }

    #[test]
    fn host_is_sole_member_at_creation() {
        let room = room();
        assert_eq!(room.players.len(), 1);
        assert!(room.players[0].is_host);
        assert_eq!(room.players[0].id, room.host_id);
        assert_eq!(room.seats.len(), RoomConfig::default().max_players);
    }

    #[test]
    fn sit_down_grants_initial_chips_once() {
        let mut room = room();
        let host = room.host_id;
        room.sit_down(host, 2).unwrap();
        assert_eq!(room.player(host).unwrap().chips, 1000);
        assert_eq!(room.seats[2], Some(host));

        room.stand_up(host).unwrap();
        // Losses persist across stand/sit; no second grant.
        room.player_mut(host).unwrap().chips = 400;
        room.sit_down(host, 3).unwrap();
        assert_eq!(room.player(host).unwrap().chips, 400);
    }

    #[test]
    fn seat_validation_order() {
        let mut room = room();
        let host = room.host_id;
        let other = room.join("guest".into(), Uuid::new_v4());

        assert_eq!(room.sit_down(host, 99), Err(ErrorCode::InvalidSeatIndex));
        room.sit_down(host, 0).unwrap();
        assert_eq!(room.sit_down(other, 0), Err(ErrorCode::SeatOccupied));
        assert_eq!(room.sit_down(host, 1), Err(ErrorCode::AlreadySeated));
    }

    #[test]
    fn stand_up_rejected_mid_game() {
        let mut room = room();
        let host = room.host_id;
        room.sit_down(host, 0).unwrap();
        room.is_playing = true;
        assert_eq!(room.stand_up(host), Err(ErrorCode::GameInProgress));
    }

    #[test]
    fn kick_is_host_only_and_never_self() {
        let mut room = room();
        let host = room.host_id;
        let guest = room.join("guest".into(), Uuid::new_v4());
        assert_eq!(room.kick(guest, host), Err(ErrorCode::NotHost));
        assert_eq!(room.kick(host, host), Err(ErrorCode::CannotKickSelf));
        assert_eq!(
            room.kick(host, Uuid::new_v4()),
            Err(ErrorCode::TargetNotFound)
        );
        room.kick(host, guest).unwrap();
        assert!(room.player(guest).is_none());
    }

    #[test]
    fn host_leave_promotes_earliest_joined() {
        let mut room = room();
        let host = room.host_id;
        let second = room.join("b".into(), Uuid::new_v4());
        let _third = room.join("c".into(), Uuid::new_v4());

        let outcome = room.leave(host).unwrap();
        assert_eq!(outcome.new_host, Some(second));
        assert_eq!(room.host_id, second);
        assert!(room.player(second).unwrap().is_host);
        assert!(!outcome.room_empty);
    }

    #[test]
    fn last_leaver_empties_the_room() {
        let mut room = room();
        let host = room.host_id;
        let outcome = room.leave(host).unwrap();
        assert!(outcome.room_empty);
        assert_eq!(outcome.new_host, None);
    }

    #[test]
    fn seated_player_cannot_leave_mid_game() {
        let mut room = room();
        let host = room.host_id;
        let guest = room.join("guest".into(), Uuid::new_v4());
        room.sit_down(guest, 1).unwrap();
        room.is_playing = true;
        assert_eq!(room.leave(guest), Err(ErrorCode::GameInProgress));
        // Unseated spectators may still leave.
        assert!(room.leave(host).is_ok());
    }

    #[test]
    fn start_requires_host_seats_and_readiness() {
        let mut room = room();
        let host = room.host_id;
        let guest = room.join("guest".into(), Uuid::new_v4());

        assert_eq!(room.can_start(guest), Err(ErrorCode::NotHost));
        assert_eq!(room.can_start(host), Err(ErrorCode::NotEnoughPlayers));

        room.sit_down(host, 0).unwrap();
        room.sit_down(guest, 1).unwrap();
        assert_eq!(room.can_start(host), Err(ErrorCode::PlayersNotReady));

        room.set_ready(guest).unwrap();
        assert!(room.can_start(host).is_ok());

        room.is_playing = true;
        assert_eq!(room.can_start(host), Err(ErrorCode::GameAlreadyStarted));
    }

    #[test]
    fn reconnect_rebinds_without_touching_state() {
        let mut room = room();
        let host = room.host_id;
        room.sit_down(host, 0).unwrap();
        let old_conn = room.player(host).unwrap().connection;

        let detached = room.detach_connection(old_conn.unwrap());
        assert_eq!(detached, Some(host));
        assert_eq!(room.player(host).unwrap().connection, None);
        assert_eq!(room.player(host).unwrap().seat, Some(0));

        let fresh = Uuid::new_v4();
        assert!(room.rebind(host, fresh));
        assert_eq!(room.player(host).unwrap().connection, Some(fresh));
        assert!(!room.rebind(Uuid::new_v4(), fresh));
    }
}
