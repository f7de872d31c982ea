//! In-process VRF coordinator
//!
//! Plays the oracle's side of the protocol for local chains and tests:
//! subscriptions pay for requests, each request is announced with a
//! [`RandomWordsRequested`] signal, and fulfillment turns a pending request
//! into a [`RandomnessDelivery`] that the embedder hands to the consumer.

use crate::common::traits::{RandomWordsRequest, RandomnessOracle};
use crate::common::types::{Address, Amount, RandomWord, RequestId};
use crate::errors::OracleError;
use crate::oracle::vrf::{VrfProofBundle, VrfProver};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

/// Charged to the subscription for every fulfilled request
pub const DEFAULT_BASE_FEE: Amount = 100_000;
pub const MAX_NUM_WORDS: u32 = 500;
pub const MAX_CALLBACK_GAS_LIMIT: u32 = 2_500_000;

const SIGNAL_CHANNEL_CAPACITY: usize = 64;
/// Request signals kept for [`LocalVrfCoordinator::requested_events`]
pub const SIGNAL_HISTORY_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: u64,
    pub owner: Address,
    pub balance: Amount,
    pub consumers: Vec<Address>,
}

/// Signal emitted by the coordinator when it accepts a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomWordsRequested {
    pub request_id: RequestId,
    pub key_hash: String,
    pub subscription_id: u64,
    pub minimum_request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
    pub sender: Address,
}

impl RandomWordsRequested {
    /// VRF input bound to this exact request
    pub fn vrf_input(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.key_hash, self.subscription_id, self.sender, self.request_id
        )
    }
}

/// Callback message from the coordinator to a consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessDelivery {
    /// Identity the callback is made from
    pub coordinator: Address,
    pub request_id: RequestId,
    pub consumer: Address,
    pub random_words: Vec<RandomWord>,
    /// Absent when the words were supplied by hand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<VrfProofBundle>,
}

impl RandomnessDelivery {
    /// Check the proof and that the words really derive from its output
    pub fn verify(&self, request: &RandomWordsRequested) -> Result<bool, OracleError> {
        let proof = match &self.proof {
            Some(proof) => proof,
            None => return Ok(false),
        };

        if request.request_id != self.request_id || request.sender != self.consumer {
            return Ok(false);
        }

        if !VrfProver::verify(proof, &request.vrf_input())? {
            return Ok(false);
        }

        let output = hex::decode(&proof.vrf_output)
            .map_err(|e| OracleError::MalformedProof(format!("Invalid VRF output hex: {}", e)))?;
        Ok(VrfProver::expand_words(&output, request.num_words) == self.random_words)
    }
}

#[derive(Default)]
struct CoordinatorState {
    subscriptions: HashMap<u64, Subscription>,
    requests: HashMap<RequestId, RandomWordsRequested>,
    requested: VecDeque<RandomWordsRequested>,
    next_subscription_id: u64,
    next_request_id: u64,
}

/// Shared handle; clones talk to the same coordinator
#[derive(Clone)]
pub struct LocalVrfCoordinator {
    address: Address,
    base_fee: Amount,
    prover: Arc<VrfProver>,
    state: Arc<Mutex<CoordinatorState>>,
    signals: broadcast::Sender<RandomWordsRequested>,
}

impl LocalVrfCoordinator {
    pub fn new(address: Address, prover: VrfProver) -> Self {
        Self::with_base_fee(address, prover, DEFAULT_BASE_FEE)
    }

    pub fn with_base_fee(address: Address, prover: VrfProver, base_fee: Amount) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        Self {
            address,
            base_fee,
            prover: Arc::new(prover),
            state: Arc::new(Mutex::new(CoordinatorState::default())),
            signals,
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, CoordinatorState>, OracleError> {
        self.state
            .lock()
            .map_err(|_| OracleError::Unavailable("coordinator state poisoned".to_string()))
    }

    pub fn base_fee(&self) -> Amount {
        self.base_fee
    }

    pub fn public_key_hex(&self) -> String {
        self.prover.public_key_hex()
    }

    pub fn create_subscription(&self, owner: Address) -> Result<u64, OracleError> {
        let mut state = self.state()?;
        state.next_subscription_id += 1;
        let id = state.next_subscription_id;
        state.subscriptions.insert(
            id,
            Subscription {
                id,
                owner,
                balance: 0,
                consumers: Vec::new(),
            },
        );

        tracing::info!(subscription_id = id, %owner, "Created VRF subscription");
        Ok(id)
    }

    pub fn fund_subscription(
        &self,
        subscription_id: u64,
        amount: Amount,
    ) -> Result<Amount, OracleError> {
        let mut state = self.state()?;
        let subscription = state
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(OracleError::InvalidSubscription(subscription_id))?;
        subscription.balance = subscription.balance.checked_add(amount).ok_or(
            OracleError::BalanceOverflow {
                subscription_id,
                balance: subscription.balance,
                amount,
            },
        )?;

        tracing::debug!(
            subscription_id,
            balance = subscription.balance,
            "Funded VRF subscription"
        );
        Ok(subscription.balance)
    }

    pub fn add_consumer(&self, subscription_id: u64, consumer: Address) -> Result<(), OracleError> {
        let mut state = self.state()?;
        let subscription = state
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(OracleError::InvalidSubscription(subscription_id))?;
        if !subscription.consumers.contains(&consumer) {
            subscription.consumers.push(consumer);
        }
        Ok(())
    }

    pub fn subscription(&self, subscription_id: u64) -> Result<Subscription, OracleError> {
        self.state()?
            .subscriptions
            .get(&subscription_id)
            .cloned()
            .ok_or(OracleError::InvalidSubscription(subscription_id))
    }

    /// Live feed of accepted requests
    pub fn subscribe(&self) -> broadcast::Receiver<RandomWordsRequested> {
        self.signals.subscribe()
    }

    /// The most recent request signals, oldest first, at most
    /// [`SIGNAL_HISTORY_CAPACITY`] of them
    pub fn requested_events(&self) -> Result<Vec<RandomWordsRequested>, OracleError> {
        Ok(self.state()?.requested.iter().cloned().collect())
    }

    pub fn pending_request(
        &self,
        request_id: RequestId,
    ) -> Result<Option<RandomWordsRequested>, OracleError> {
        Ok(self.state()?.requests.get(&request_id).cloned())
    }

    pub fn pending_count(&self) -> Result<usize, OracleError> {
        Ok(self.state()?.requests.len())
    }

    /// Produce VRF-backed words for a pending request
    pub fn fulfill(&self, request_id: RequestId) -> Result<RandomnessDelivery, OracleError> {
        let request = self.settle(request_id, None)?;
        let (proof, output) = self.prover.prove(&request.vrf_input());
        let random_words = VrfProver::expand_words(&output, request.num_words);

        tracing::info!(%request_id, consumer = %request.sender, "Fulfilled randomness request");
        Ok(RandomnessDelivery {
            coordinator: self.address,
            request_id,
            consumer: request.sender,
            random_words,
            proof: Some(proof),
        })
    }

    /// Fulfill with caller-chosen words, for deterministic tests
    pub fn fulfill_with_words(
        &self,
        request_id: RequestId,
        random_words: Vec<RandomWord>,
    ) -> Result<RandomnessDelivery, OracleError> {
        let request = self.settle(request_id, Some(random_words.len()))?;

        tracing::info!(
            %request_id,
            consumer = %request.sender,
            "Fulfilled randomness request with override"
        );
        Ok(RandomnessDelivery {
            coordinator: self.address,
            request_id,
            consumer: request.sender,
            random_words,
            proof: None,
        })
    }

    /// Charge the subscription and consume the request; nothing changes on error
    fn settle(
        &self,
        request_id: RequestId,
        word_count: Option<usize>,
    ) -> Result<RandomWordsRequested, OracleError> {
        let mut state = self.state()?;
        let request = state
            .requests
            .get(&request_id)
            .cloned()
            .ok_or(OracleError::NonexistentRequest(request_id))?;

        if let Some(count) = word_count {
            if count != request.num_words as usize {
                return Err(OracleError::WrongWordCount {
                    expected: request.num_words,
                    actual: count,
                });
            }
        }

        let base_fee = self.base_fee;
        let subscription = state
            .subscriptions
            .get_mut(&request.subscription_id)
            .ok_or(OracleError::InvalidSubscription(request.subscription_id))?;
        if subscription.balance < base_fee {
            return Err(OracleError::SubscriptionUnfunded {
                subscription_id: subscription.id,
                balance: subscription.balance,
                required: base_fee,
            });
        }
        subscription.balance -= base_fee;

        state.requests.remove(&request_id);
        Ok(request)
    }
}

impl RandomnessOracle for LocalVrfCoordinator {
    fn address(&self) -> Address {
        self.address
    }

    fn request_random_words(
        &mut self,
        request: &RandomWordsRequest,
    ) -> Result<RequestId, OracleError> {
        if request.num_words == 0 || request.num_words > MAX_NUM_WORDS {
            return Err(OracleError::NumWordsOutOfRange {
                requested: request.num_words,
                max: MAX_NUM_WORDS,
            });
        }
        if request.callback_gas_limit > MAX_CALLBACK_GAS_LIMIT {
            return Err(OracleError::GasLimitTooBig {
                requested: request.callback_gas_limit,
                max: MAX_CALLBACK_GAS_LIMIT,
            });
        }

        let base_fee = self.base_fee;
        let mut state = self.state()?;
        let subscription = state
            .subscriptions
            .get(&request.subscription_id)
            .ok_or(OracleError::InvalidSubscription(request.subscription_id))?;
        if !subscription.consumers.contains(&request.consumer) {
            return Err(OracleError::InvalidConsumer {
                subscription_id: request.subscription_id,
                consumer: request.consumer,
            });
        }
        if subscription.balance < base_fee {
            return Err(OracleError::SubscriptionUnfunded {
                subscription_id: subscription.id,
                balance: subscription.balance,
                required: base_fee,
            });
        }

        state.next_request_id += 1;
        let request_id = RequestId(state.next_request_id);
        let signal = RandomWordsRequested {
            request_id,
            key_hash: request.key_hash.clone(),
            subscription_id: request.subscription_id,
            minimum_request_confirmations: request.request_confirmations,
            callback_gas_limit: request.callback_gas_limit,
            num_words: request.num_words,
            sender: request.consumer,
        };
        state.requests.insert(request_id, signal.clone());
        if state.requested.len() == SIGNAL_HISTORY_CAPACITY {
            state.requested.pop_front();
        }
        state.requested.push_back(signal.clone());
        drop(state);

        tracing::info!(%request_id, consumer = %request.consumer, "RandomWordsRequested");
        let _ = self.signals.send(signal);
        Ok(request_id)
    }
}
