//! The guessing state machine
//!
//! Two guess paths share one ledger:
//!
//! - [`Game::hackable_guess`] resolves in the same call from block data the
//!   caller can see. Anyone who computes [`predict_hackable_answer`] for the
//!   block their call lands in wins every time.
//! - [`Game::unhackable_guess`] records the guess, asks the oracle for
//!   randomness and parks the game in `CALCULATING`. The answer arrives later
//!   through [`Game::fulfill_random_words`], and is compared against the guess
//!   stored at request time.
//!
//! Every operation validates first and mutates last, so an `Err` leaves the
//! game untouched.

use crate::common::traits::{RandomWordsRequest, RandomnessOracle};
use crate::common::types::{Address, Amount, BlockInfo, CallContext, RandomWord, RequestId};
use crate::config::{GuessGameConfig, OracleConfig};
use crate::errors::{ConfigurationError, GameError, GameResult};
use crate::games::access::{AccessControl, HACKABLE_MINIMUM_PAYMENT};
use crate::games::events::{EventEmitter, GameEvent};
use crate::games::ledger::GameLedger;
use crate::games::pending_pool::{PendingRequest, PendingRequests};
use crate::games::types::{
    GameOutcome, GameState, GuessOutcome, GuessPath, LedgerSnapshot, LOSE_MESSAGE, WIN_MESSAGE,
};
use crate::metrics::GameMetrics;
use crate::oracle::{RandomWordsRequested, RandomnessDelivery};
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;

/// Answer the hackable path will produce for `sender` in `block`.
///
/// Everything hashed here is public before the call executes.
pub fn predict_hackable_answer(block: &BlockInfo, sender: &Address, guess_range: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(block.number.to_be_bytes());
    hasher.update(block.timestamp.to_be_bytes());
    hasher.update(block.prevrandao);
    hasher.update(sender.as_bytes());
    let digest = hasher.finalize();

    let mut word = [0u8; 16];
    word.copy_from_slice(&digest[..16]);
    reduce(RandomWord::from_be_bytes(word), guess_range)
}

fn reduce(word: RandomWord, guess_range: u64) -> u64 {
    // guess_range is validated non-zero, so the result fits in u64
    (word % RandomWord::from(guess_range)) as u64
}

pub struct Game<O: RandomnessOracle> {
    address: Address,
    access: AccessControl,
    ledger: GameLedger,
    pending: PendingRequests,
    oracle: O,
    oracle_config: OracleConfig,
    events: EventEmitter,
    metrics: GameMetrics,
}

impl<O: RandomnessOracle> Game<O> {
    /// Deploy a game. The oracle must be the coordinator named in `config`.
    pub fn new(config: &GuessGameConfig, oracle: O) -> GameResult<Self> {
        config.validate()?;

        if oracle.address() != config.oracle.coordinator {
            return Err(ConfigurationError::InvalidValue {
                field: "oracle.coordinator".to_string(),
                value: config.oracle.coordinator.to_string(),
                reason: format!("oracle client reports {}", oracle.address()),
            }
            .into());
        }

        tracing::info!(
            game = %config.game.address,
            owner = %config.game.owner,
            entrance_fee = config.game.entrance_fee,
            guess_range = config.game.guess_range,
            coordinator = %config.oracle.coordinator,
            "Deployed guess game"
        );

        Ok(Self {
            address: config.game.address,
            access: AccessControl::new(config.game.owner, config.game.entrance_fee),
            ledger: GameLedger::new(config.game.guess_range),
            pending: PendingRequests::new(),
            oracle,
            oracle_config: config.oracle.clone(),
            events: EventEmitter::new(),
            metrics: GameMetrics::new(config.monitoring.enable_metrics),
        })
    }

    /// Guess against an answer derived from block data.
    ///
    /// Any nonzero payment is accepted and the CALCULATING gate does not
    /// apply. Resolves immediately.
    pub fn hackable_guess(&mut self, ctx: &CallContext, guess: u64) -> GameResult<GuessOutcome> {
        if let Err(e) = self.access.require_fee_paid(ctx.value, HACKABLE_MINIMUM_PAYMENT) {
            return Err(self.rejected(e));
        }

        let answer = predict_hackable_answer(&ctx.block, &ctx.sender, self.ledger.guess_range());
        let balance = match self.ledger.credit(ctx.value) {
            Some(balance) => balance,
            None => return Err(self.rejected(self.overflow(ctx.value))),
        };
        self.metrics.record_hackable_guess();

        tracing::debug!(sender = %ctx.sender, guess, answer, balance, "Hackable guess");
        Ok(self.settle(GuessPath::Hackable, ctx.sender, guess, answer, None))
    }

    /// Phase one of the secure path: pay, record the guess, request randomness.
    pub fn unhackable_guess(&mut self, ctx: &CallContext, guess: u64) -> GameResult<RequestId> {
        if let Err(e) = self.access.require_entrance_fee(ctx.value) {
            return Err(self.rejected(e));
        }
        if self.ledger.state() != GameState::Open {
            let state = self.ledger.state();
            return Err(self.rejected(GameError::GameNotOpen { state }));
        }
        if self.ledger.balance_after(ctx.value).is_none() {
            return Err(self.rejected(self.overflow(ctx.value)));
        }

        let request = RandomWordsRequest {
            key_hash: self.oracle_config.key_hash.clone(),
            subscription_id: self.oracle_config.subscription_id,
            request_confirmations: self.oracle_config.request_confirmations,
            callback_gas_limit: self.oracle_config.callback_gas_limit,
            num_words: self.oracle_config.num_words,
            consumer: self.address,
        };

        // Nothing has been written yet, so a failed request leaves the game OPEN
        let request_id = match self.oracle.request_random_words(&request) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(sender = %ctx.sender, error = %e, "Randomness request failed");
                return Err(self.rejected(e.into()));
            }
        };

        let inserted = self.pending.add_pending(PendingRequest {
            request_id,
            player: ctx.sender,
            guess,
            guess_range: self.ledger.guess_range(),
            requested_at_block: ctx.block.number,
        });
        debug_assert!(inserted, "pending table must be empty while OPEN");
        let credited = self.ledger.credit(ctx.value);
        debug_assert!(credited.is_some(), "payment was checked against the balance");
        self.ledger.set_recent_guess(guess);
        self.ledger.set_state(GameState::Calculating);
        self.metrics.record_unhackable_guess();

        tracing::info!(%request_id, sender = %ctx.sender, guess, "Requested randomness for guess");
        Ok(request_id)
    }

    /// Phase two of the secure path: the oracle's callback.
    ///
    /// `caller` is the identity delivering the words; only the configured
    /// coordinator is accepted.
    pub fn fulfill_random_words(
        &mut self,
        caller: Address,
        request_id: RequestId,
        random_words: &[RandomWord],
    ) -> GameResult<GuessOutcome> {
        if caller != self.oracle_config.coordinator {
            tracing::warn!(%caller, %request_id, "Rejected callback from non-coordinator");
            return Err(self.rejected(GameError::UnauthorizedCallback { caller }));
        }
        if !self.pending.is_pending(request_id) {
            tracing::warn!(%request_id, "Rejected fulfillment for unknown request");
            return Err(self.rejected(GameError::UnknownRequest(request_id)));
        }
        let first_word = match random_words.first() {
            Some(word) => *word,
            None => return Err(self.rejected(GameError::EmptyRandomWords(request_id))),
        };

        let request = match self.pending.take(request_id) {
            Some(request) => request,
            None => return Err(self.rejected(GameError::UnknownRequest(request_id))),
        };

        let answer = reduce(first_word, request.guess_range);
        self.ledger.set_latest_answer(answer);
        self.ledger.set_state(GameState::Open);
        self.metrics.record_fulfillment();

        tracing::info!(%request_id, player = %request.player, answer, "Randomness fulfilled");
        Ok(self.settle(
            GuessPath::Unhackable,
            request.player,
            request.guess,
            answer,
            Some(request_id),
        ))
    }

    /// Hand a coordinator delivery to the callback entry point.
    ///
    /// Only the delivering identity is checked here. Embedders that do not
    /// trust the transport should use [`Game::deliver_verified`].
    pub fn deliver(&mut self, delivery: &RandomnessDelivery) -> GameResult<GuessOutcome> {
        self.fulfill_random_words(
            delivery.coordinator,
            delivery.request_id,
            &delivery.random_words,
        )
    }

    /// Like [`Game::deliver`], but first checks the VRF proof against the
    /// request signal and the coordinator's known public key.
    ///
    /// A delivery without a proof, for another consumer, or for a request
    /// this game did not issue is rejected and the request stays pending.
    pub fn deliver_verified(
        &mut self,
        delivery: &RandomnessDelivery,
        request: &RandomWordsRequested,
        coordinator_public_key: &str,
    ) -> GameResult<GuessOutcome> {
        let unverified = GameError::UnverifiedRandomness(delivery.request_id);

        let signed_by_coordinator = delivery
            .proof
            .as_ref()
            .map_or(false, |proof| proof.public_key == coordinator_public_key);
        let issued_here = request.sender == self.address
            && request.key_hash == self.oracle_config.key_hash
            && request.subscription_id == self.oracle_config.subscription_id;
        if !signed_by_coordinator || !issued_here {
            return Err(self.rejected(unverified));
        }

        match delivery.verify(request) {
            Ok(true) => self.deliver(delivery),
            Ok(false) => Err(self.rejected(unverified)),
            Err(e) => Err(self.rejected(e.into())),
        }
    }

    /// Owner-only. Requests already in flight keep the range they were issued with.
    pub fn set_guess_range(&mut self, caller: Address, new_range: u64) -> GameResult<()> {
        if let Err(e) = self.access.require_owner(&caller) {
            return Err(self.rejected(e));
        }
        if new_range == 0 {
            return Err(self.rejected(GameError::InvalidGuessRange(new_range)));
        }

        let previous = self.ledger.guess_range();
        self.ledger.set_guess_range(new_range);
        self.events.emit(GameEvent::GuessRangeUpdated {
            previous,
            current: new_range,
        });

        tracing::info!(previous, current = new_range, "Guess range updated");
        Ok(())
    }

    /// Owner-only. Refused while a randomness request is outstanding.
    pub fn reset(&mut self, caller: Address) -> GameResult<()> {
        if let Err(e) = self.access.require_owner(&caller) {
            return Err(self.rejected(e));
        }
        if self.ledger.state() != GameState::Open {
            let state = self.ledger.state();
            return Err(self.rejected(GameError::GameNotOpen { state }));
        }

        self.ledger.reset();
        self.events.emit(GameEvent::GameReset { by: caller });

        tracing::info!(%caller, "Game reset");
        Ok(())
    }

    /// Compare, pay out on a match, and emit the outcome
    fn settle(
        &mut self,
        path: GuessPath,
        player: Address,
        guess: u64,
        answer: u64,
        request_id: Option<RequestId>,
    ) -> GuessOutcome {
        let (outcome, payout) = if guess == answer {
            let payout = self.ledger.pay_winner(player);
            self.metrics.record_win();
            self.events.emit(GameEvent::Log {
                message: WIN_MESSAGE.to_string(),
                sender: player,
            });
            self.events.emit(GameEvent::WinnerPaid {
                winner: player,
                amount: payout,
            });
            tracing::info!(%player, payout, ?path, "Winner paid");
            (GameOutcome::Win, payout)
        } else {
            self.events.emit(GameEvent::Log {
                message: LOSE_MESSAGE.to_string(),
                sender: player,
            });
            (GameOutcome::Loss, 0)
        };

        GuessOutcome {
            path,
            player,
            guess,
            answer,
            outcome,
            payout,
            request_id,
        }
    }

    fn overflow(&self, payment: Amount) -> GameError {
        GameError::BalanceOverflow {
            balance: self.ledger.balance(),
            payment,
        }
    }

    fn rejected(&self, error: GameError) -> GameError {
        self.metrics.record_rejection();
        tracing::warn!(%error, "Rejected call");
        error
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn balance(&self) -> Amount {
        self.ledger.balance()
    }

    pub fn guess_range(&self) -> u64 {
        self.ledger.guess_range()
    }

    pub fn entrance_fee(&self) -> Amount {
        self.access.entrance_fee()
    }

    pub fn game_state(&self) -> GameState {
        self.ledger.state()
    }

    pub fn recent_guess(&self) -> u64 {
        self.ledger.recent_guess()
    }

    pub fn latest_answer(&self) -> u64 {
        self.ledger.latest_answer()
    }

    pub fn recent_winner(&self) -> Option<Address> {
        self.ledger.recent_winner()
    }

    pub fn winner_count(&self) -> usize {
        self.ledger.winners().len()
    }

    pub fn winners(&self) -> &[Address] {
        self.ledger.winners()
    }

    pub fn outstanding_request_id(&self) -> Option<RequestId> {
        self.pending.outstanding()
    }

    pub fn pending_request(&self, request_id: RequestId) -> Option<&PendingRequest> {
        self.pending.get(request_id)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            owner: self.access.owner(),
            entrance_fee: self.access.entrance_fee(),
            guess_range: self.ledger.guess_range(),
            state: self.ledger.state(),
            balance: self.ledger.balance(),
            recent_guess: self.ledger.recent_guess(),
            latest_answer: self.ledger.latest_answer(),
            winners: self.ledger.winners().to_vec(),
            outstanding_request: self.pending.outstanding(),
        }
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn metrics(&self) -> &GameMetrics {
        &self.metrics
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::OracleError;

    const OWNER: Address = Address::repeat_byte(0x01);
    const GAME: Address = Address::repeat_byte(0x02);
    const COORDINATOR: Address = Address::repeat_byte(0xcc);
    const PLAYER: Address = Address::repeat_byte(0x03);

    /// Oracle stub that hands out sequential ids or fails on demand
    struct ScriptedOracle {
        next: u64,
        fail_with: Option<OracleError>,
    }

    impl RandomnessOracle for ScriptedOracle {
        fn address(&self) -> Address {
            COORDINATOR
        }

        fn request_random_words(
            &mut self,
            _request: &RandomWordsRequest,
        ) -> Result<RequestId, OracleError> {
            if let Some(e) = self.fail_with.clone() {
                return Err(e);
            }
            self.next += 1;
            Ok(RequestId(self.next))
        }
    }

    fn config() -> GuessGameConfig {
        let mut config = GuessGameConfig::default();
        config.game.owner = OWNER;
        config.game.address = GAME;
        config.game.entrance_fee = 10;
        config.oracle.coordinator = COORDINATOR;
        config
    }

    fn game() -> Game<ScriptedOracle> {
        Game::new(
            &config(),
            ScriptedOracle {
                next: 0,
                fail_with: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_oracle_identity_must_match_config() {
        let mut config = config();
        config.oracle.coordinator = Address::repeat_byte(0xdd);
        let result = Game::new(
            &config,
            ScriptedOracle {
                next: 0,
                fail_with: None,
            },
        );
        assert!(matches!(result, Err(GameError::Configuration(_))));
    }

    #[test]
    fn test_hackable_prediction_matches_engine() {
        let mut game = game();
        let block = BlockInfo {
            number: 17,
            timestamp: 1_700_000_000,
            prevrandao: [9u8; 32],
        };
        let predicted = predict_hackable_answer(&block, &PLAYER, game.guess_range());

        let outcome = game
            .hackable_guess(&CallContext::new(PLAYER, 1).with_block(block), predicted)
            .unwrap();
        assert!(outcome.is_win());
        assert_eq!(outcome.answer, predicted);
        assert_eq!(outcome.payout, 1);
    }

    #[test]
    fn test_fulfillment_uses_range_at_request_time() {
        let mut game = game();
        let request_id = game.unhackable_guess(&CallContext::new(PLAYER, 10), 45).unwrap();
        game.set_guess_range(OWNER, 10).unwrap();

        // 301 % 256 == 45, but 301 % 10 == 1
        let outcome = game.fulfill_random_words(COORDINATOR, request_id, &[301]).unwrap();
        assert_eq!(outcome.answer, 45);
        assert!(outcome.is_win());
        assert_eq!(game.guess_range(), 10);
    }

    #[test]
    fn test_failed_request_leaves_game_open() {
        let mut game = Game::new(
            &config(),
            ScriptedOracle {
                next: 0,
                fail_with: Some(OracleError::Unavailable("offline".to_string())),
            },
        )
        .unwrap();

        let result = game.unhackable_guess(&CallContext::new(PLAYER, 10), 45);
        assert!(matches!(result, Err(GameError::Oracle(OracleError::Unavailable(_)))));
        assert_eq!(game.game_state(), GameState::Open);
        assert_eq!(game.balance(), 0);
        assert_eq!(game.recent_guess(), 0);
        assert_eq!(game.outstanding_request_id(), None);
        assert_eq!(game.metrics().snapshot().rejected_calls, 1);
    }

    #[test]
    fn test_empty_words_keep_request_pending() {
        let mut game = game();
        let request_id = game.unhackable_guess(&CallContext::new(PLAYER, 10), 45).unwrap();

        assert!(matches!(
            game.fulfill_random_words(COORDINATOR, request_id, &[]),
            Err(GameError::EmptyRandomWords(_))
        ));
        assert_eq!(game.game_state(), GameState::Calculating);
        assert_eq!(game.outstanding_request_id(), Some(request_id));
    }

    #[test]
    fn test_zero_guess_range_rejected() {
        let mut game = game();
        assert!(matches!(
            game.set_guess_range(OWNER, 0),
            Err(GameError::InvalidGuessRange(0))
        ));
        assert_eq!(game.guess_range(), 256);
    }

    #[test]
    fn test_reset_refused_while_calculating() {
        let mut game = game();
        game.unhackable_guess(&CallContext::new(PLAYER, 10), 45).unwrap();

        assert!(matches!(
            game.reset(OWNER),
            Err(GameError::GameNotOpen {
                state: GameState::Calculating
            })
        ));
        assert_eq!(game.balance(), 10);
    }

    #[test]
    fn test_snapshot_reflects_pending_request() {
        let mut game = game();
        let request_id = game.unhackable_guess(&CallContext::new(PLAYER, 10), 7).unwrap();

        let snapshot = game.snapshot();
        assert_eq!(snapshot.state, GameState::Calculating);
        assert_eq!(snapshot.recent_guess, 7);
        assert_eq!(snapshot.outstanding_request, Some(request_id));
        assert_eq!(snapshot.owner, OWNER);
    }

    #[test]
    fn test_payment_that_overflows_pot_is_rejected() {
        let mut game = game();
        // Out of range, so this guess can never win and drain the pot
        game.hackable_guess(&CallContext::new(PLAYER, u64::MAX - 1), 1_000).unwrap();

        let result = game.hackable_guess(&CallContext::new(PLAYER, 5), 1_000);
        assert!(matches!(
            result,
            Err(GameError::BalanceOverflow { payment: 5, .. })
        ));
        assert_eq!(game.balance(), u64::MAX - 1);
        assert_eq!(game.events().logs().count(), 1);

        let result = game.unhackable_guess(&CallContext::new(PLAYER, 10), 45);
        assert!(matches!(
            result,
            Err(GameError::BalanceOverflow { payment: 10, .. })
        ));
        assert_eq!(game.oracle().next, 0, "no randomness should be requested");
        assert_eq!(game.game_state(), GameState::Open);
        assert_eq!(game.recent_guess(), 0);
        assert_eq!(game.balance(), u64::MAX - 1);
    }

    #[test]
    fn test_pending_table_empty_whenever_open() {
        let mut game = game();
        for round in 1..=3 {
            assert_eq!(game.outstanding_request_id(), None);
            let request_id = game
                .unhackable_guess(&CallContext::new(PLAYER, 10), 45)
                .unwrap();
            assert_eq!(request_id, RequestId(round));
            game.fulfill_random_words(COORDINATOR, request_id, &[1]).unwrap();
            assert_eq!(game.game_state(), GameState::Open);
        }
        assert_eq!(game.outstanding_request_id(), None);
    }
}
