use crate::common::types::{Address, Amount, RequestId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wrong-guess message carried by `Log` events
pub const LOSE_MESSAGE: &str = "sorry you guessed wrong";

/// Right-guess message carried by `Log` events
pub const WIN_MESSAGE: &str = "congratulations you guessed right";

/// Whether the game accepts secure-path guesses
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameState {
    #[default]
    Open,
    /// A randomness request is outstanding
    Calculating,
}

impl GameState {
    /// Numeric encoding used by external tooling (OPEN = 0)
    pub fn as_u8(&self) -> u8 {
        match self {
            GameState::Open => 0,
            GameState::Calculating => 1,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::Open => write!(f, "OPEN"),
            GameState::Calculating => write!(f, "CALCULATING"),
        }
    }
}

/// Which guess path produced an outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GuessPath {
    /// Answer derived from block data in the same call
    Hackable,
    /// Answer delivered later by the randomness oracle
    Unhackable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    Win,
    Loss,
}

/// Resolved guess
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuessOutcome {
    pub path: GuessPath,
    pub player: Address,
    pub guess: u64,
    pub answer: u64,
    pub outcome: GameOutcome,
    /// Pot transferred to the player, zero on a loss
    pub payout: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

impl GuessOutcome {
    pub fn is_win(&self) -> bool {
        self.outcome == GameOutcome::Win
    }

    pub fn message(&self) -> &'static str {
        match self.outcome {
            GameOutcome::Win => WIN_MESSAGE,
            GameOutcome::Loss => LOSE_MESSAGE,
        }
    }
}

/// Serializable view of the whole ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub owner: Address,
    pub entrance_fee: Amount,
    pub guess_range: u64,
    pub state: GameState,
    pub balance: Amount,
    pub recent_guess: u64,
    pub latest_answer: u64,
    pub winners: Vec<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outstanding_request: Option<RequestId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_state_encoding() {
        assert_eq!(GameState::default(), GameState::Open);
        assert_eq!(GameState::Open.as_u8(), 0);
        assert_eq!(GameState::Calculating.as_u8(), 1);
        assert_eq!(
            serde_json::to_string(&GameState::Calculating).unwrap(),
            "\"CALCULATING\""
        );
    }

    #[test]
    fn test_outcome_message() {
        let outcome = GuessOutcome {
            path: GuessPath::Hackable,
            player: Address::repeat_byte(1),
            guess: 45,
            answer: 12,
            outcome: GameOutcome::Loss,
            payout: 0,
            request_id: None,
        };
        assert!(!outcome.is_win());
        assert_eq!(outcome.message(), "sorry you guessed wrong");
    }
}
