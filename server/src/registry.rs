//! Game registry: admission, routing and teardown of games
//!
//! The registry owns every live game and knows which game and role each
//! connection belongs to. It handles:
//! - Host connections: capacity limit, game code assignment, game creation
//! - Player connections: username and game code validation before joining
//! - Inbound messages: parsing and routing by role
//! - Disconnects: host teardown of the whole game, or player removal
//!
//! Protocol errors (malformed frames, commands the sender's role may not
//! issue) are answered here and never reach a game.

use crate::connection::Connection;
use crate::dictionary::Dictionary;
use crate::game::Game;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use shared::{ClientId, ClientMessage, ErrorCode, ServerMessage};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use thiserror::Error;

/// Every four-digit game code; also the most games that can run at once
pub const GAME_CODES: RangeInclusive<u16> = 1000..=9999;

/// Random picks tried before scanning for a free code
const CODE_ATTEMPTS: usize = 32;

/// Query parameters supplied on the WebSocket URL
///
/// Hosts connect with `?type=host`; players with `?username=..&code=..`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub username: Option<String>,
    pub code: Option<String>,
}

impl ConnectParams {
    pub fn host() -> Self {
        Self {
            kind: Some("host".to_string()),
            ..Self::default()
        }
    }

    pub fn player(username: &str, code: &str) -> Self {
        Self {
            kind: None,
            username: Some(username.to_string()),
            code: Some(code.to_string()),
        }
    }

    /// Parses a raw query string; anything unparseable is an anonymous player
    pub fn from_query(query: Option<&str>) -> Self {
        query
            .and_then(|query| serde_urlencoded::from_str(query).ok())
            .unwrap_or_default()
    }

    pub fn is_host(&self) -> bool {
        self.kind.as_deref() == Some("host")
    }
}

/// Reasons a new connection is turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Too many games in progress")]
    TooManyGames,
    #[error("No username provided")]
    NoUsername,
    #[error("Invalid code")]
    InvalidCode,
    #[error("Username already in use")]
    UsernameTaken,
}

impl JoinError {
    pub fn code(&self) -> ErrorCode {
        match self {
            JoinError::TooManyGames => ErrorCode::CapacityExceeded,
            JoinError::NoUsername | JoinError::UsernameTaken => ErrorCode::JoinRejected,
            JoinError::InvalidCode => ErrorCode::InvalidCode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Player,
}

#[derive(Debug, Clone)]
struct Membership {
    role: Role,
    code: String,
}

pub struct GameRegistry<C: Connection> {
    games: HashMap<String, Game<C>>,
    members: HashMap<ClientId, Membership>,
    dictionary: Arc<Dictionary>,
    max_games: usize,
    rng: StdRng,
}

impl<C: Connection> GameRegistry<C> {
    pub fn new(dictionary: Arc<Dictionary>, max_games: usize) -> Self {
        Self::with_rng(dictionary, max_games, StdRng::from_entropy())
    }

    pub fn with_rng(dictionary: Arc<Dictionary>, max_games: usize, rng: StdRng) -> Self {
        Self {
            games: HashMap::new(),
            members: HashMap::new(),
            dictionary,
            max_games,
            rng,
        }
    }

    pub fn game(&self, code: &str) -> Option<&Game<C>> {
        self.games.get(code)
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Returns the role and game code of a connected client
    pub fn membership(&self, client_id: ClientId) -> Option<(Role, &str)> {
        self.members
            .get(&client_id)
            .map(|member| (member.role, member.code.as_str()))
    }

    /// Picks an unused four-digit game code, or `None` once all are taken
    fn generate_code(&mut self) -> Option<String> {
        for _ in 0..CODE_ATTEMPTS {
            let code = self.rng.gen_range(GAME_CODES).to_string();
            if !self.games.contains_key(&code) {
                return Some(code);
            }
        }

        GAME_CODES
            .map(|code| code.to_string())
            .find(|code| !self.games.contains_key(code))
    }

    fn refuse(connection: &C, error: JoinError) -> JoinError {
        warn!("Refused client {}: {}", connection.id(), error);
        connection.send(&ServerMessage::error(error.code(), error.to_string()));
        connection.close();
        error
    }

    /// Admits a new connection as a host or a player.
    ///
    /// Refused connections are sent an error and closed before returning.
    pub fn connect(&mut self, connection: C, params: ConnectParams) -> Result<String, JoinError> {
        if params.is_host() {
            self.connect_host(connection)
        } else {
            self.connect_player(connection, params)
        }
    }

    fn connect_host(&mut self, connection: C) -> Result<String, JoinError> {
        if self.games.len() >= self.max_games {
            return Err(Self::refuse(&connection, JoinError::TooManyGames));
        }

        let Some(code) = self.generate_code() else {
            return Err(Self::refuse(&connection, JoinError::TooManyGames));
        };
        let client_id = connection.id();

        connection.send(&ServerMessage::GameData {
            username: None,
            score: None,
            game_code: Some(code.clone()),
        });

        let game = Game::new(code.clone(), connection, Arc::clone(&self.dictionary));
        self.games.insert(code.clone(), game);
        self.members.insert(
            client_id,
            Membership {
                role: Role::Host,
                code: code.clone(),
            },
        );

        info!("[{}] Game created", code);
        Ok(code)
    }

    fn connect_player(&mut self, connection: C, params: ConnectParams) -> Result<String, JoinError> {
        let username = match params.username.filter(|name| !name.is_empty()) {
            Some(username) => username,
            None => return Err(Self::refuse(&connection, JoinError::NoUsername)),
        };

        let code = params.code.unwrap_or_default();
        let game = match self.games.get_mut(&code) {
            Some(game) => game,
            None => return Err(Self::refuse(&connection, JoinError::InvalidCode)),
        };

        let client_id = connection.id();
        // The game reports the duplicate and closes the connection itself
        game.add_player(connection, &username)
            .map_err(|_| JoinError::UsernameTaken)?;

        self.members.insert(
            client_id,
            Membership {
                role: Role::Player,
                code: code.clone(),
            },
        );
        Ok(code)
    }

    /// Sends a message to a member through its game
    fn send_to(&self, client_id: ClientId, member: &Membership, message: &ServerMessage) {
        let Some(game) = self.games.get(&member.code) else {
            return;
        };

        match member.role {
            Role::Host => game.host().send(message),
            Role::Player => {
                if let Some(player) = game.player(client_id) {
                    player.connection.send(message);
                }
            }
        }
    }

    /// Parses an inbound frame and routes it to the sender's game
    pub fn handle_message(&mut self, client_id: ClientId, text: &str) {
        let Some(member) = self.members.get(&client_id).cloned() else {
            debug!("Message from unregistered client {}", client_id);
            return;
        };

        let message = match ClientMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                debug!("Bad frame from client {}: {}", client_id, e);
                self.send_to(
                    client_id,
                    &member,
                    &ServerMessage::error(e.code(), e.to_string()),
                );
                return;
            }
        };

        let Some(game) = self.games.get_mut(&member.code) else {
            return;
        };

        let result = match (member.role, message) {
            (Role::Host, ClientMessage::GameStart) => game.start(),
            (Role::Host, ClientMessage::RoundStart) => game.start_round(),
            (Role::Host, ClientMessage::RoundEnd) => game.end_round(),
            (Role::Player, ClientMessage::RoundAnswer(answer)) => {
                game.player_answer(client_id, &answer)
            }
            _ => {
                self.send_to(
                    client_id,
                    &member,
                    &ServerMessage::error(ErrorCode::UnrecognisedType, "Unrecognised message type"),
                );
                return;
            }
        };

        if let Err(e) = result {
            debug!("[{}] Client {} command refused: {}", member.code, client_id, e);
        }
    }

    /// Handles a closed connection.
    ///
    /// A departing host takes the whole game down with it: every player is
    /// disconnected and the game is forgotten.
    pub fn disconnect(&mut self, client_id: ClientId) {
        let Some(member) = self.members.remove(&client_id) else {
            return;
        };

        match member.role {
            Role::Host => {
                if let Some(game) = self.games.remove(&member.code) {
                    game.close_all();
                    for player in game.players() {
                        self.members.remove(&player.id());
                    }
                }
                info!("[{}] Game removed", member.code);
            }
            Role::Player => {
                if let Some(game) = self.games.get_mut(&member.code) {
                    game.remove_player(client_id);
                }
            }
        }
    }
}
