//! Error types for the guess game
//!
//! Every engine operation validates before it mutates, so any error returned
//! here means the game state is exactly what it was before the call.

use crate::common::types::{Address, Amount, RequestId};
use crate::games::types::GameState;
use thiserror::Error;

/// Errors raised by the guessing engine
#[derive(Debug, Error)]
pub enum GameError {
    /// Administrative call from someone other than the owner
    #[error("Game__OnlyOwner: {caller} is not the game owner")]
    OnlyOwner { caller: Address },

    /// Payment missing or below the minimum for the chosen path
    #[error("GuessGame__FundNotPaid: paid {paid}, required at least {required}")]
    FundNotPaid { paid: Amount, required: Amount },

    /// A randomness request is still outstanding
    #[error("GuessGame__NotOpen: game is {state}")]
    GameNotOpen { state: GameState },

    /// Fulfillment for a request the game is not waiting on
    #[error("Unknown randomness request: {0}")]
    UnknownRequest(RequestId),

    /// Fulfillment delivered by someone other than the configured coordinator
    #[error("Only the coordinator can fulfill randomness, got {caller}")]
    UnauthorizedCallback { caller: Address },

    /// The oracle subscription cannot pay for the request
    #[error("Subscription {subscription_id} is not funded")]
    SubscriptionUnfunded { subscription_id: u64 },

    #[error("Guess range must be greater than zero")]
    InvalidGuessRange(u64),

    #[error("Fulfillment for request {0} carried no random words")]
    EmptyRandomWords(RequestId),

    /// Accepting the payment would overflow the pot
    #[error("Balance {balance} cannot accept a payment of {payment}")]
    BalanceOverflow { balance: Amount, payment: Amount },

    /// Delivery whose proof does not match the request it claims to answer
    #[error("Randomness for request {0} failed verification")]
    UnverifiedRandomness(RequestId),

    #[error("Randomness oracle error: {0}")]
    Oracle(OracleError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Errors raised by a randomness coordinator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Subscription {subscription_id} has balance {balance}, needs {required}")]
    SubscriptionUnfunded {
        subscription_id: u64,
        balance: Amount,
        required: Amount,
    },

    #[error("Invalid subscription: {0}")]
    InvalidSubscription(u64),

    #[error("Consumer {consumer} is not registered on subscription {subscription_id}")]
    InvalidConsumer {
        subscription_id: u64,
        consumer: Address,
    },

    #[error("Request {0} is not pending at the coordinator")]
    NonexistentRequest(RequestId),

    #[error("Requested {requested} words, coordinator allows 1..={max}")]
    NumWordsOutOfRange { requested: u32, max: u32 },

    #[error("Request expects {expected} words, got {actual}")]
    WrongWordCount { expected: u32, actual: usize },

    #[error("Callback gas limit {requested} exceeds coordinator maximum {max}")]
    GasLimitTooBig { requested: u32, max: u32 },

    #[error("Subscription {subscription_id} balance {balance} cannot take {amount} more")]
    BalanceOverflow {
        subscription_id: u64,
        balance: Amount,
        amount: Amount,
    },

    #[error("Malformed VRF proof: {0}")]
    MalformedProof(String),

    #[error("Coordinator unavailable: {0}")]
    Unavailable(String),
}

impl From<OracleError> for GameError {
    fn from(e: OracleError) -> Self {
        match e {
            OracleError::SubscriptionUnfunded {
                subscription_id, ..
            } => GameError::SubscriptionUnfunded { subscription_id },
            other => GameError::Oracle(other),
        }
    }
}

/// Configuration and validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

pub type GameResult<T> = Result<T, GameError>;
