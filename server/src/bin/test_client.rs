//! Command-line client for trying out a running server by hand.
//!
//! As a host, type `start`, `round` or `end`. As a player, every line typed
//! is submitted as the round's answer.

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use shared::{ClientMessage, ServerMessage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:3050")]
    server: String,

    /// Connect as the host of a new game
    #[arg(long)]
    host: bool,

    /// Username to join with
    #[arg(short, long)]
    username: Option<String>,

    /// Code of the game to join
    #[arg(short, long)]
    code: Option<String>,
}

impl Args {
    fn url(&self) -> String {
        if self.host {
            return format!("ws://{}/ws?type=host", self.server);
        }

        let query = serde_urlencoded::to_string([
            ("username", self.username.clone().unwrap_or_default()),
            ("code", self.code.clone().unwrap_or_default()),
        ])
        .unwrap_or_default();
        format!("ws://{}/ws?{}", self.server, query)
    }

    fn command(&self, line: &str) -> Option<ClientMessage> {
        if !self.host {
            return Some(ClientMessage::RoundAnswer(line.to_string()));
        }

        match line {
            "start" => Some(ClientMessage::GameStart),
            "round" => Some(ClientMessage::RoundStart),
            "end" => Some(ClientMessage::RoundEnd),
            _ => None,
        }
    }
}

fn describe(message: &ServerMessage) -> String {
    match message {
        ServerMessage::GameData {
            username,
            score,
            game_code,
        } => format!(
            "Game {} (user {}, score {})",
            game_code.as_deref().unwrap_or("-"),
            username.as_deref().unwrap_or("-"),
            score.unwrap_or(0)
        ),
        ServerMessage::PlayerJoin {
            player_id,
            player_username,
            player_score,
        } => format!("{} joined as #{} with {} points", player_username, player_id, player_score),
        ServerMessage::PlayerDisconnect { player_id } => format!("#{} left", player_id),
        ServerMessage::RoundStart { letters } => format!("Round started: {}", letters),
        ServerMessage::RoundEnd {} => "Round over".to_string(),
        ServerMessage::RoundFeedback { feedback } => format!(
            "Feedback: word {} / letters {} / top answer {}",
            feedback.dict, feedback.letters, feedback.top_answer
        ),
        ServerMessage::RoundResults {
            valid_answers,
            best_words,
        } => format!(
            "Results: {} valid answers, best words {}",
            valid_answers.len(),
            best_words.join(", ")
        ),
        ServerMessage::AnswerConfirm { answer } => format!("Answer locked: {}", answer),
        ServerMessage::PlayerAnswer { player_id, answer } => {
            format!("#{} answered {}", player_id, answer)
        }
        ServerMessage::Error { code, msg } => format!("Error {}: {}", code.as_u16(), msg),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let url = args.url();

    println!("Connecting to {}", url);
    let (websocket, _) = connect_async(url.as_str()).await?;
    let (mut sink, mut frames) = websocket.split();

    if args.host {
        println!("Commands: start, round, end");
    } else {
        println!("Type an answer and press enter");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(message) => println!("{}", describe(&message)),
                    Err(_) => println!("Unreadable message: {}", text),
                },
                Some(Ok(Message::Close(_))) | None => {
                    println!("Server closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    println!("Connection error: {}", e);
                    break;
                }
            },

            line = lines.next_line() => match line? {
                Some(line) => match args.command(line.trim()) {
                    Some(command) => sink.send(Message::Text(command.to_json())).await?,
                    None => println!("Unknown command: {}", line.trim()),
                },
                None => break,
            },
        }
    }

    Ok(())
}
