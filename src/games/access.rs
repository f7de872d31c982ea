//! Owner and payment guards
//!
//! Pure checks with no side effects. Callers run them before touching any
//! state.

use crate::common::types::{Address, Amount};
use crate::errors::{GameError, GameResult};

/// Smallest payment the hackable path accepts
pub const HACKABLE_MINIMUM_PAYMENT: Amount = 1;

#[derive(Debug, Clone)]
pub struct AccessControl {
    owner: Address,
    entrance_fee: Amount,
}

impl AccessControl {
    pub fn new(owner: Address, entrance_fee: Amount) -> Self {
        Self { owner, entrance_fee }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn entrance_fee(&self) -> Amount {
        self.entrance_fee
    }

    pub fn require_owner(&self, caller: &Address) -> GameResult<()> {
        if *caller != self.owner {
            return Err(GameError::OnlyOwner { caller: *caller });
        }
        Ok(())
    }

    /// Zero payments never pass, whatever the minimum
    pub fn require_fee_paid(&self, payment: Amount, minimum: Amount) -> GameResult<()> {
        let required = minimum.max(1);
        if payment < required {
            return Err(GameError::FundNotPaid {
                paid: payment,
                required,
            });
        }
        Ok(())
    }

    /// Secure-path check against the configured entrance fee
    pub fn require_entrance_fee(&self, payment: Amount) -> GameResult<()> {
        self.require_fee_paid(payment, self.entrance_fee)
    }
}
