//! Common types and interfaces
//!
//! Shared between the engine, the oracle coordinator and configuration.

pub mod types;
pub mod traits;

pub use traits::{RandomWordsRequest, RandomnessOracle};
pub use types::{Address, AddressParseError, Amount, BlockInfo, CallContext, RandomWord, RequestId};
