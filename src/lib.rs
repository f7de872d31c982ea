//! Guess Game - number guessing with fair, oracle-backed outcomes
//!
//! A single owned [`Game`] holds the pot, the guess range and the winners.
//! Players either take the *hackable* path, whose answer is derived from block
//! data anyone can read, or the *unhackable* path, which defers the answer to
//! a VRF coordinator through a request/callback handshake.
//!
//! ```ignore
//! let coordinator = LocalVrfCoordinator::new(config.oracle.coordinator, VrfProver::new_random());
//! let mut game = Game::new(&config, coordinator.clone())?;
//!
//! let request_id = game.unhackable_guess(&CallContext::new(player, fee), 45)?;
//! let delivery = coordinator.fulfill(request_id)?;
//! let outcome = game.deliver(&delivery)?;
//! ```

pub mod common;
pub mod config;
pub mod errors;
pub mod games;
pub mod logging;
pub mod metrics;
pub mod oracle;

pub use common::{
    Address, Amount, BlockInfo, CallContext, RandomWord, RandomWordsRequest, RandomnessOracle,
    RequestId,
};
pub use config::{ConfigLoader, GuessGameConfig};
pub use errors::{ConfigurationError, GameError, GameResult, OracleError};
pub use games::{
    predict_hackable_answer, Game, GameEvent, GameOutcome, GameState, GuessOutcome, GuessPath,
};
pub use oracle::{LocalVrfCoordinator, RandomWordsRequested, RandomnessDelivery, VrfProver};
