//! Shared traits and interfaces
//!
//! The engine talks to its randomness source only through
//! [`RandomnessOracle`], so a local coordinator and a remote one are
//! interchangeable.

use crate::common::types::{Address, RequestId};
use crate::errors::OracleError;
use serde::{Deserialize, Serialize};

/// Parameters of a single randomness request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomWordsRequest {
    /// Hex-encoded gas lane key hash (32 bytes)
    pub key_hash: String,
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
    /// Contract that will receive the callback
    pub consumer: Address,
}

/// Outbound half of the two-phase randomness protocol.
///
/// The inbound half (delivery of the words) arrives later through the
/// consumer's callback entry point and is not part of this trait.
pub trait RandomnessOracle {
    /// Identity the oracle uses when it calls back into the consumer
    fn address(&self) -> Address;

    /// Submit a request. Failures are surfaced as-is, never retried.
    fn request_random_words(
        &mut self,
        request: &RandomWordsRequest,
    ) -> Result<RequestId, OracleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingOracle {
        next: u64,
    }

    impl RandomnessOracle for CountingOracle {
        fn address(&self) -> Address {
            Address::repeat_byte(0xcc)
        }

        fn request_random_words(
            &mut self,
            _request: &RandomWordsRequest,
        ) -> Result<RequestId, OracleError> {
            self.next += 1;
            Ok(RequestId(self.next))
        }
    }

    #[test]
    fn test_mock_oracle_issues_ids() {
        let mut oracle = CountingOracle { next: 0 };
        let request = RandomWordsRequest {
            key_hash: "00".repeat(32),
            subscription_id: 1,
            request_confirmations: 3,
            callback_gas_limit: 500_000,
            num_words: 1,
            consumer: Address::repeat_byte(0x01),
        };

        assert_eq!(oracle.request_random_words(&request).unwrap(), RequestId(1));
        assert_eq!(oracle.request_random_words(&request).unwrap(), RequestId(2));
    }
}
