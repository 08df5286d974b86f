//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{LeaderboardEntry, Mistake, Operation, Player};
use crate::session::{AnswerFeedback, PracticeReport, QuestionView, RoundSummary};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Login {
        name: String,
    },
    StartRound,
    StartPractice {
        operation: Operation,
    },
    SubmitAnswer {
        answer: String,
    },
    Proceed,
    EndPractice,
    /// Coaching tips for the last completed round.
    Suggestions,
    Leaderboard {
        #[serde(default)]
        limit: Option<usize>,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Player {
        player: Player,
        #[serde(rename = "isNew")]
        is_new: bool,
    },
    Question {
        question: QuestionView,
    },
    Tick {
        #[serde(rename = "timeLeft")]
        time_left: u32,
    },
    Feedback {
        feedback: AnswerFeedback,
    },
    RoundComplete {
        summary: RoundSummary,
    },
    PracticeEnded {
        report: PracticeReport,
    },
    Suggestions {
        suggestions: String,
        tips: Vec<String>,
    },
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct LoginIn {
    pub name: String,
}
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginOut {
    pub player: Player,
    #[serde(rename = "isNew")]
    pub is_new: bool,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsIn {
    pub mistakes: Vec<Mistake>,
    #[serde(rename = "playerLevel")]
    pub player_level: u32,
}
#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsOut {
    pub suggestions: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_parse() {
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"start_practice","operation":"division"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::StartPractice { operation: Operation::Division }));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"submit_answer","answer":" 42 "}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::SubmitAnswer { ref answer } if answer == " 42 "));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"leaderboard"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Leaderboard { limit: None }));
        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"fly"}"#).is_err());
    }

    #[test]
    fn server_messages_are_tagged() {
        let v = serde_json::to_value(ServerWsMessage::Tick { time_left: 4 }).unwrap();
        assert_eq!(v, serde_json::json!({ "type": "tick", "timeLeft": 4 }));
    }

    #[test]
    fn suggestions_request_uses_camel_case() {
        let body = r#"{"mistakes":[{"questionText":"9 × 7","userAnswer":"","correctAnswer":63,"operation":"multiplication"}],"playerLevel":3}"#;
        let req: SuggestionsIn = serde_json::from_str(body).unwrap();
        assert_eq!(req.player_level, 3);
        assert_eq!(req.mistakes[0].correct_answer, 63);
        assert!(req.mistakes[0].not_attempted());
    }
}
