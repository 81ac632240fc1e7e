//! # Countdown Letters Server Library
//!
//! This library provides the authoritative server for the multiplayer
//! "letters round" word game. A host opens a game and starts rounds; players
//! join with a username and the game's four-digit code, and each round they
//! submit the longest word they can make from nine drawn letters.
//!
//! ## Core Responsibilities
//!
//! ### Round Engine
//! The server owns every game's state. It draws letters, locks in answers,
//! validates them against the dictionary and the draw, awards points to the
//! longest valid answers, and reports the best possible words to the host.
//!
//! ### Client Management
//! Handles the complete lifecycle of client connections including:
//! - Host admission, capacity limiting and game code assignment
//! - Player admission with username and game code checks
//! - Score retention when a player drops and rejoins under the same name
//! - Teardown of a whole game when its host leaves
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! Every connection task forwards its events to one loop that owns the
//! registry and processes them in order, to completion. Games never see two
//! events at once and need no locking.
//!
//! ### Shared Read-Only Dictionary
//! The dictionary trie is built once at startup and shared by all games
//! through an `Arc`. Nothing writes to it afterwards.
//!
//! ## Module Organization
//!
//! ### Letters Module (`letters`)
//! Frequency-weighted vowel and consonant piles and the nine-letter draw.
//!
//! ### Dictionary Module (`dictionary`)
//! Prefix trie, word-list loading, membership and letter-feasibility checks.
//!
//! ### Solver Module (`solver`)
//! Lazy depth-first enumeration of every word a draw can spell, and the
//! ranked best-word list sent with round results.
//!
//! ### Game Module (`game`)
//! The per-game state machine: lobby, active, round in progress.
//!
//! ### Registry Module (`registry`)
//! Admission, role-based message routing and teardown across games.
//!
//! ### Network Module (`network`)
//! WebSocket transport, heartbeats and the main event loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::dictionary::Dictionary;
//! use server::network::{Server, ServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dictionary = Arc::new(Dictionary::embedded());
//!     let server = Server::new(ServerConfig::default(), dictionary).await?;
//!
//!     // Accepts connections on ws://127.0.0.1:3050/ws until stopped
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod dictionary;
pub mod game;
pub mod letters;
pub mod network;
pub mod registry;
pub mod solver;
