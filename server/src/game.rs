//! Round engine for a single game
//!
//! A game moves between three phases:
//! - `Lobby`: players gather, nothing has started
//! - `Active`: the game has started and is waiting for the host to open a round
//! - `RoundInProgress`: letters are drawn and answers are being collected
//!
//! Every rejected command is reported to whoever sent it and leaves the game
//! untouched. A round settles when the host ends it or when the last
//! outstanding answer arrives, including when the only players still
//! thinking disconnect.

use crate::connection::Connection;
use crate::dictionary::Dictionary;
use crate::letters::generate_letters;
use crate::solver::best_words;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{ClientId, ErrorCode, Feedback, ServerMessage, BEST_WORDS_LIMIT};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

/// Where a game is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    Active,
    RoundInProgress,
}

/// Reasons a game command is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Game already in progress")]
    AlreadyStarted,
    #[error("No players connected")]
    NoPlayersToStart,
    #[error("Game has not started yet")]
    NotStarted,
    #[error("No players connected")]
    NoPlayersForRound,
    #[error("Round already in progress")]
    RoundInProgress,
    #[error("No round in progress")]
    NoRoundToEnd,
    #[error("No round in progress.")]
    NoRoundToAnswer,
    #[error("Answer cannot be blank.")]
    BlankAnswer,
    #[error("Answer submitted already.")]
    AlreadyAnswered,
    #[error("Username already in use")]
    UsernameTaken,
}

impl GameError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::AlreadyStarted | GameError::NoPlayersToStart => ErrorCode::StartRejected,
            GameError::NotStarted | GameError::NoPlayersForRound | GameError::RoundInProgress => {
                ErrorCode::RoundStartRejected
            }
            GameError::NoRoundToEnd => ErrorCode::RoundEndRejected,
            GameError::NoRoundToAnswer | GameError::BlankAnswer | GameError::AlreadyAnswered => {
                ErrorCode::AnswerRejected
            }
            GameError::UsernameTaken => ErrorCode::JoinRejected,
        }
    }

    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::error(self.code(), self.to_string())
    }
}

/// A connected participant and their standing in the game
#[derive(Debug)]
pub struct Player<C> {
    pub connection: C,
    pub username: String,
    /// Locked-in answer for the current round; empty until submitted
    pub current_answer: String,
    pub feedback: Feedback,
    pub score: u32,
}

impl<C: Connection> Player<C> {
    /// Connection id, which doubles as the player id on the wire
    pub fn id(&self) -> ClientId {
        self.connection.id()
    }

    fn has_answered(&self) -> bool {
        !self.current_answer.is_empty()
    }
}

/// One game: a host, its players and the round in play
pub struct Game<C: Connection> {
    code: String,
    host: C,
    players: Vec<Player<C>>,
    /// Scores of disconnected players, keyed by lowercased username
    saved_scores: HashMap<String, u32>,
    started: bool,
    /// Letters of the current round; empty between rounds
    letters: String,
    dictionary: Arc<Dictionary>,
    rng: StdRng,
}

impl<C: Connection> Game<C> {
    /// Creates a game in the lobby with an entropy-seeded letter draw
    pub fn new(code: impl Into<String>, host: C, dictionary: Arc<Dictionary>) -> Self {
        Self::with_rng(code, host, dictionary, StdRng::from_entropy())
    }

    /// Creates a game drawing letters from the given rng
    pub fn with_rng(
        code: impl Into<String>,
        host: C,
        dictionary: Arc<Dictionary>,
        rng: StdRng,
    ) -> Self {
        Self {
            code: code.into(),
            host,
            players: Vec::new(),
            saved_scores: HashMap::new(),
            started: false,
            letters: String::new(),
            dictionary,
            rng,
        }
    }

    /// The four-digit code players join with
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Connection of the host that created the game
    pub fn host(&self) -> &C {
        &self.host
    }

    /// Connected players in join order
    pub fn players(&self) -> &[Player<C>] {
        &self.players
    }

    /// Looks up a connected player by id
    pub fn player(&self, id: ClientId) -> Option<&Player<C>> {
        self.players.iter().find(|p| p.id() == id)
    }

    /// Letters of the round in progress; empty between rounds
    pub fn letters(&self) -> &str {
        &self.letters
    }

    /// Score kept for a disconnected player, matched ignoring case
    pub fn saved_score(&self, username: &str) -> Option<u32> {
        self.saved_scores.get(&username.to_lowercase()).copied()
    }

    /// Current lifecycle phase, derived from the started flag and letters
    pub fn phase(&self) -> Phase {
        if !self.letters.is_empty() {
            Phase::RoundInProgress
        } else if self.started {
            Phase::Active
        } else {
            Phase::Lobby
        }
    }

    fn round_in_progress(&self) -> bool {
        !self.letters.is_empty()
    }

    fn all_answered(&self) -> bool {
        self.players.iter().all(Player::has_answered)
    }

    /// Sends a message to the host and every player
    fn send_global(&self, message: &ServerMessage) {
        self.host.send(message);
        for player in &self.players {
            player.connection.send(message);
        }
    }

    fn reject_host(&self, error: GameError) -> GameError {
        warn!("[{}] Host command rejected: {}", self.code, error);
        self.host.send(&error.to_message());
        error
    }

    /// Starts the game and opens its first round
    pub fn start(&mut self) -> Result<(), GameError> {
        let check = if self.started {
            Err(GameError::AlreadyStarted)
        } else if self.players.is_empty() {
            Err(GameError::NoPlayersToStart)
        } else {
            Ok(())
        };
        check.map_err(|e| self.reject_host(e))?;

        self.started = true;
        info!("[{}] Game started with {} players", self.code, self.players.len());
        self.start_round()
    }

    /// Draws fresh letters and announces them to everyone
    pub fn start_round(&mut self) -> Result<(), GameError> {
        let check = if !self.started {
            Err(GameError::NotStarted)
        } else if self.players.is_empty() {
            Err(GameError::NoPlayersForRound)
        } else if self.round_in_progress() {
            Err(GameError::RoundInProgress)
        } else {
            Ok(())
        };
        check.map_err(|e| self.reject_host(e))?;

        self.letters = generate_letters(&mut self.rng);
        info!("[{}] Round started with letters {}", self.code, self.letters);

        self.send_global(&ServerMessage::RoundStart {
            letters: self.letters.clone(),
        });
        Ok(())
    }

    /// Ends the current round on the host's request
    pub fn end_round(&mut self) -> Result<(), GameError> {
        if !self.round_in_progress() {
            return Err(self.reject_host(GameError::NoRoundToEnd));
        }

        self.settle_round();
        Ok(())
    }

    /// Scores the round, sends feedback and results, and clears the letters
    ///
    /// Every valid answer of the winning length scores its length, so ties
    /// are all credited.
    fn settle_round(&mut self) {
        self.send_global(&ServerMessage::RoundEnd {});

        let mut valid_answers = BTreeMap::new();
        for player in &mut self.players {
            player.feedback = self.dictionary.feedback(&self.letters, &player.current_answer);
            if player.feedback.is_valid() {
                valid_answers.insert(player.id(), player.current_answer.clone());
            }
        }

        let best_length = valid_answers.values().map(String::len).max().unwrap_or(0);

        for player in &mut self.players {
            if player.feedback.is_valid() && player.current_answer.len() == best_length {
                player.feedback.top_answer = true;
                player.score += player.current_answer.len() as u32;
                debug!(
                    "[{}] {} scored {} for {}",
                    self.code,
                    player.username,
                    best_length,
                    player.current_answer
                );
            }

            player.connection.send(&ServerMessage::RoundFeedback {
                feedback: player.feedback,
            });
            player.current_answer.clear();
        }

        let best_words = best_words(&self.dictionary, &self.letters, BEST_WORDS_LIMIT);
        info!(
            "[{}] Round ended: {} valid answers, best length {}",
            self.code,
            valid_answers.len(),
            best_length
        );

        self.host.send(&ServerMessage::RoundResults {
            valid_answers,
            best_words,
        });
        self.letters.clear();
    }

    /// Admits a player, restoring their score if they played here before.
    ///
    /// A username already held by a connected player (ignoring case) is
    /// refused outright: the newcomer gets an error, their connection is
    /// closed, and the roster is left as it was.
    pub fn add_player(&mut self, connection: C, username: &str) -> Result<(), GameError> {
        let lower_username = username.to_lowercase();

        if self
            .players
            .iter()
            .any(|p| p.username.to_lowercase() == lower_username)
        {
            let error = GameError::UsernameTaken;
            warn!("[{}] Rejected duplicate username {}", self.code, username);
            connection.send(&error.to_message());
            connection.close();
            return Err(error);
        }

        let score = self.saved_scores.remove(&lower_username).unwrap_or(0);
        let player = Player {
            connection,
            username: username.to_string(),
            current_answer: String::new(),
            feedback: Feedback::default(),
            score,
        };

        player.connection.send(&ServerMessage::GameData {
            username: Some(player.username.clone()),
            score: Some(player.score),
            game_code: Some(self.code.clone()),
        });
        self.host.send(&ServerMessage::PlayerJoin {
            player_id: player.id(),
            player_username: player.username.clone(),
            player_score: player.score,
        });

        info!(
            "[{}] {} joined with score {}",
            self.code, player.username, player.score
        );
        self.players.push(player);
        Ok(())
    }

    /// Removes a disconnected player, keeping their score for a rejoin
    ///
    /// If everyone left in the round has already answered, the round
    /// settles immediately.
    pub fn remove_player(&mut self, id: ClientId) -> Option<Player<C>> {
        let index = self.players.iter().position(|p| p.id() == id)?;
        let player = self.players.remove(index);

        self.saved_scores
            .insert(player.username.to_lowercase(), player.score);
        self.host
            .send(&ServerMessage::PlayerDisconnect { player_id: id });
        info!("[{}] {} left", self.code, player.username);

        if self.started && self.round_in_progress() && self.all_answered() {
            self.settle_round();
        }

        Some(player)
    }

    /// Locks in a player's answer for the current round
    pub fn player_answer(&mut self, id: ClientId, answer: &str) -> Result<(), GameError> {
        let index = match self.players.iter().position(|p| p.id() == id) {
            Some(index) => index,
            None => {
                debug!("[{}] Answer from unknown player {}", self.code, id);
                return Ok(());
            }
        };

        let check = if !self.round_in_progress() {
            Err(GameError::NoRoundToAnswer)
        } else if answer.is_empty() {
            Err(GameError::BlankAnswer)
        } else if self.players[index].has_answered() {
            Err(GameError::AlreadyAnswered)
        } else {
            Ok(())
        };

        if let Err(error) = check {
            self.players[index].connection.send(&error.to_message());
            return Err(error);
        }

        let answer = answer.to_lowercase();
        let player = &mut self.players[index];
        player.current_answer = answer.clone();
        player.connection.send(&ServerMessage::AnswerConfirm {
            answer: answer.clone(),
        });

        self.host.send(&ServerMessage::PlayerAnswer {
            player_id: id,
            answer,
        });

        if self.all_answered() {
            self.settle_round();
        }
        Ok(())
    }

    /// Closes every player connection; used when the host leaves
    pub fn close_all(&self) {
        for player in &self.players {
            player.connection.close();
        }
    }
}
