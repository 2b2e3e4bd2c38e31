//! Native currency balances.

use std::collections::HashMap;

use acdm_types::{Address, Amount};

use crate::error::CoreError;

/// Native currency balance ledger.
#[derive(Debug, Clone, Default)]
pub struct NativeLedger {
    balances: HashMap<Address, Amount>,
    total_supply: Amount,
}

impl NativeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get account balance
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Create new currency in `to`'s account (genesis and faucets only).
    pub fn issue(&mut self, to: Address, amount: Amount) -> Result<(), CoreError> {
        self.total_supply = self.total_supply.checked_add(amount).ok_or_else(CoreError::overflow)?;
        self.credit(to, amount)
    }

    /// Move `amount` from `from` to `to`.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), CoreError> {
        if amount == 0 || from == to {
            return Ok(());
        }
        self.debit(from, amount)?;
        self.credit(*to, amount)
    }

    fn debit(&mut self, from: &Address, amount: Amount) -> Result<(), CoreError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(CoreError::InsufficientBalance {
                account: *from,
                required: amount,
                available,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, remaining);
        }
        Ok(())
    }

    fn credit(&mut self, to: Address, amount: Amount) -> Result<(), CoreError> {
        let balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or_else(CoreError::overflow)?;
        if balance > 0 {
            self.balances.insert(to, balance);
        }
        Ok(())
    }
}
