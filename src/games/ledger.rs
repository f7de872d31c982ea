//! Persistent game state
//!
//! The ledger owns every field the engine mutates. It does no validation of
//! its own; the engine decides *whether* a mutation happens, the ledger only
//! applies it.

use crate::common::types::{Address, Amount};
use crate::games::types::GameState;

#[derive(Debug, Clone)]
pub struct GameLedger {
    guess_range: u64,
    state: GameState,
    balance: Amount,
    recent_guess: u64,
    latest_answer: u64,
    winners: Vec<Address>,
}

impl GameLedger {
    pub fn new(guess_range: u64) -> Self {
        Self {
            guess_range,
            state: GameState::Open,
            balance: 0,
            recent_guess: 0,
            latest_answer: 0,
            winners: Vec::new(),
        }
    }

    pub fn guess_range(&self) -> u64 {
        self.guess_range
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn recent_guess(&self) -> u64 {
        self.recent_guess
    }

    pub fn latest_answer(&self) -> u64 {
        self.latest_answer
    }

    pub fn winners(&self) -> &[Address] {
        &self.winners
    }

    pub fn recent_winner(&self) -> Option<Address> {
        self.winners.last().copied()
    }

    pub(crate) fn set_guess_range(&mut self, guess_range: u64) {
        self.guess_range = guess_range;
    }

    pub(crate) fn set_state(&mut self, state: GameState) {
        self.state = state;
    }

    pub(crate) fn set_recent_guess(&mut self, guess: u64) {
        self.recent_guess = guess;
    }

    pub(crate) fn set_latest_answer(&mut self, answer: u64) {
        self.latest_answer = answer;
    }

    /// Balance after accepting `amount`, or `None` if it would overflow
    pub fn balance_after(&self, amount: Amount) -> Option<Amount> {
        self.balance.checked_add(amount)
    }

    /// Add `amount` to the pot. On overflow nothing changes and `None` is returned.
    pub(crate) fn credit(&mut self, amount: Amount) -> Option<Amount> {
        let balance = self.balance_after(amount)?;
        self.balance = balance;
        Some(balance)
    }

    /// Append the winner and hand them the whole pot
    pub(crate) fn pay_winner(&mut self, winner: Address) -> Amount {
        self.winners.push(winner);
        std::mem::take(&mut self.balance)
    }

    /// Back to deployment defaults, keeping the configured range
    pub(crate) fn reset(&mut self) {
        self.state = GameState::Open;
        self.balance = 0;
        self.recent_guess = 0;
        self.latest_answer = 0;
        self.winners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ledger() {
        let ledger = GameLedger::new(256);
        assert_eq!(ledger.guess_range(), 256);
        assert_eq!(ledger.state(), GameState::Open);
        assert_eq!(ledger.balance(), 0);
        assert_eq!(ledger.recent_winner(), None);
    }

    #[test]
    fn test_pay_winner_drains_pot() {
        let mut ledger = GameLedger::new(256);
        ledger.credit(3).unwrap();
        ledger.credit(4).unwrap();

        let winner = Address::repeat_byte(0x07);
        assert_eq!(ledger.pay_winner(winner), 7);
        assert_eq!(ledger.balance(), 0);
        assert_eq!(ledger.winners(), &[winner]);
        assert_eq!(ledger.recent_winner(), Some(winner));
    }

    #[test]
    fn test_reset_keeps_range() {
        let mut ledger = GameLedger::new(256);
        ledger.set_guess_range(100);
        ledger.credit(5).unwrap();
        ledger.set_recent_guess(45);
        ledger.set_latest_answer(12);
        ledger.pay_winner(Address::repeat_byte(0x02));

        ledger.reset();

        assert_eq!(ledger.guess_range(), 100);
        assert_eq!(ledger.balance(), 0);
        assert_eq!(ledger.recent_guess(), 0);
        assert_eq!(ledger.latest_answer(), 0);
        assert!(ledger.winners().is_empty());
    }

    #[test]
    fn test_credit_refuses_overflow() {
        let mut ledger = GameLedger::new(256);
        assert_eq!(ledger.credit(u64::MAX - 1), Some(u64::MAX - 1));

        assert_eq!(ledger.balance_after(5), None);
        assert_eq!(ledger.credit(5), None);
        assert_eq!(ledger.balance(), u64::MAX - 1);

        assert_eq!(ledger.credit(1), Some(u64::MAX));
    }
}
