//! Wire protocol shared by the countdown server and its clients.
//!
//! Every frame is a JSON object of the form `{"type": ..., "data": ...}`.
//! Inbound frames are parsed into [`ClientMessage`]; outbound frames are
//! built from [`ServerMessage`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Connection identifier assigned by the server
pub type ClientId = u32;

pub const LETTER_COUNT: usize = 9;
pub const BEST_WORDS_LIMIT: usize = 10;

/// Numeric error codes carried by `error` frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum ErrorCode {
    CapacityExceeded,
    InvalidMessage,
    UnrecognisedType,
    JoinRejected,
    InvalidCode,
    AnswerRejected,
    StartRejected,
    RoundStartRejected,
    RoundEndRejected,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        match self {
            ErrorCode::CapacityExceeded => 0,
            ErrorCode::InvalidMessage => 1,
            ErrorCode::UnrecognisedType => 2,
            ErrorCode::JoinRejected => 10,
            ErrorCode::InvalidCode => 11,
            ErrorCode::AnswerRejected => 12,
            ErrorCode::StartRejected => 20,
            ErrorCode::RoundStartRejected => 21,
            ErrorCode::RoundEndRejected => 22,
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code.as_u16()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::CapacityExceeded),
            1 => Ok(ErrorCode::InvalidMessage),
            2 => Ok(ErrorCode::UnrecognisedType),
            10 => Ok(ErrorCode::JoinRejected),
            11 => Ok(ErrorCode::InvalidCode),
            12 => Ok(ErrorCode::AnswerRejected),
            20 => Ok(ErrorCode::StartRejected),
            21 => Ok(ErrorCode::RoundStartRejected),
            22 => Ok(ErrorCode::RoundEndRejected),
            other => Err(format!("unknown error code {}", other)),
        }
    }
}

/// Per-player verdict on a round answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Word is in the dictionary
    pub dict: bool,
    /// Word can be spelled from the round's letters
    pub letters: bool,
    /// Word was among the longest valid answers of the round
    pub top_answer: bool,
}

impl Feedback {
    pub fn is_valid(&self) -> bool {
        self.dict && self.letters
    }
}

/// Frames sent from clients to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    GameStart,
    RoundStart,
    RoundEnd,
    RoundAnswer(String),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid message")]
    Malformed(#[from] serde_json::Error),
    #[error("Unrecognised message type")]
    UnknownType(String),
}

impl ProtocolError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ProtocolError::Malformed(_) => ErrorCode::InvalidMessage,
            ProtocolError::UnknownType(_) => ErrorCode::UnrecognisedType,
        }
    }
}

impl ClientMessage {
    /// Parses an inbound text frame.
    ///
    /// Only text that is not JSON at all is malformed. Valid JSON without a
    /// recognised string `type` is an unknown message. A `round_answer`
    /// whose data is not a string is read as a blank answer so the game can
    /// reject it with its own error.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let frame: Value = serde_json::from_str(text)?;

        let kind = match frame.get("type") {
            Some(Value::String(kind)) => kind.as_str(),
            Some(other) => return Err(ProtocolError::UnknownType(other.to_string())),
            None => return Err(ProtocolError::UnknownType(String::new())),
        };

        match kind {
            "game_start" => Ok(ClientMessage::GameStart),
            "round_start" => Ok(ClientMessage::RoundStart),
            "round_end" => Ok(ClientMessage::RoundEnd),
            "round_answer" => {
                let answer = match frame.get("data") {
                    Some(Value::String(answer)) => answer.clone(),
                    _ => String::new(),
                };
                Ok(ClientMessage::RoundAnswer(answer))
            }
            _ => Err(ProtocolError::UnknownType(kind.to_string())),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Frames sent from the server to hosts and players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    GameData {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game_code: Option<String>,
    },
    PlayerJoin {
        player_id: ClientId,
        player_username: String,
        player_score: u32,
    },
    PlayerDisconnect {
        player_id: ClientId,
    },
    RoundStart {
        letters: String,
    },
    RoundEnd {},
    RoundFeedback {
        feedback: Feedback,
    },
    RoundResults {
        valid_answers: BTreeMap<ClientId, String>,
        best_words: Vec<String>,
    },
    AnswerConfirm {
        answer: String,
    },
    PlayerAnswer {
        player_id: ClientId,
        answer: String,
    },
    Error {
        code: ErrorCode,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: ErrorCode, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code,
            msg: msg.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_host_commands() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"game_start"}"#).unwrap(),
            ClientMessage::GameStart
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"round_start","data":null}"#).unwrap(),
            ClientMessage::RoundStart
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"round_end"}"#).unwrap(),
            ClientMessage::RoundEnd
        );
    }

    #[test]
    fn test_parse_round_answer() {
        let message = ClientMessage::parse(r#"{"type":"round_answer","data":"Crate"}"#).unwrap();
        assert_eq!(message, ClientMessage::RoundAnswer("Crate".to_string()));
    }

    #[test]
    fn test_parse_round_answer_without_text_is_blank() {
        let message = ClientMessage::parse(r#"{"type":"round_answer","data":42}"#).unwrap();
        assert_eq!(message, ClientMessage::RoundAnswer(String::new()));

        let message = ClientMessage::parse(r#"{"type":"round_answer"}"#).unwrap();
        assert_eq!(message, ClientMessage::RoundAnswer(String::new()));
    }

    #[test]
    fn test_parse_malformed() {
        let err = ClientMessage::parse("not json").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidMessage);
        assert_eq!(err.to_string(), "Invalid message");

        let err = ClientMessage::parse(r#"{"type":"round_answer""#).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidMessage);
    }

    #[test]
    fn test_parse_json_without_string_type() {
        for text in [r#"{"data":"x"}"#, r#"{"type":5}"#, r#"{"type":null}"#, "[]", "7", "null"] {
            let err = ClientMessage::parse(text).unwrap_err();
            assert_eq!(err.code(), ErrorCode::UnrecognisedType, "{}", text);
            assert_eq!(err.to_string(), "Unrecognised message type");
        }
    }

    #[test]
    fn test_parse_unknown_type() {
        let err = ClientMessage::parse(r#"{"type":"shuffle"}"#).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnrecognisedType);
        assert_eq!(err.to_string(), "Unrecognised message type");
    }

    #[test]
    fn test_client_message_wire_shape() {
        let value: Value = serde_json::from_str(&ClientMessage::RoundAnswer("oat".into()).to_json()).unwrap();
        assert_eq!(value, json!({"type": "round_answer", "data": "oat"}));

        let value: Value = serde_json::from_str(&ClientMessage::GameStart.to_json()).unwrap();
        assert_eq!(value, json!({"type": "game_start"}));
    }

    #[test]
    fn test_error_wire_shape() {
        let message = ServerMessage::error(ErrorCode::RoundStartRejected, "Round already in progress");
        let value: Value = serde_json::from_str(&message.to_json()).unwrap();
        assert_eq!(
            value,
            json!({"type": "error", "data": {"code": 21, "msg": "Round already in progress"}})
        );
    }

    #[test]
    fn test_game_data_omits_missing_fields() {
        let message = ServerMessage::GameData {
            username: None,
            score: None,
            game_code: Some("4821".to_string()),
        };
        let value: Value = serde_json::from_str(&message.to_json()).unwrap();
        assert_eq!(value, json!({"type": "game_data", "data": {"game_code": "4821"}}));
    }

    #[test]
    fn test_round_results_wire_shape() {
        let mut valid_answers = BTreeMap::new();
        valid_answers.insert(7, "toast".to_string());

        let message = ServerMessage::RoundResults {
            valid_answers,
            best_words: vec!["creation".to_string(), "action".to_string()],
        };
        let value: Value = serde_json::from_str(&message.to_json()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "round_results",
                "data": {
                    "valid_answers": {"7": "toast"},
                    "best_words": ["creation", "action"]
                }
            })
        );

        let parsed: ServerMessage = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_round_end_has_empty_data() {
        let value: Value = serde_json::from_str(&ServerMessage::RoundEnd {}.to_json()).unwrap();
        assert_eq!(value, json!({"type": "round_end", "data": {}}));
    }

    #[test]
    fn test_error_code_numbers() {
        assert_eq!(u16::from(ErrorCode::CapacityExceeded), 0);
        assert_eq!(u16::from(ErrorCode::AnswerRejected), 12);
        assert_eq!(ErrorCode::try_from(22), Ok(ErrorCode::RoundEndRejected));
        assert!(ErrorCode::try_from(99).is_err());
    }

    #[test]
    fn test_feedback_validity() {
        let mut feedback = Feedback::default();
        assert!(!feedback.is_valid());

        feedback.dict = true;
        assert!(!feedback.is_valid());

        feedback.letters = true;
        assert!(feedback.is_valid());
    }
}
