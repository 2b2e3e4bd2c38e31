//! Fungible token with allowances and role-gated supply changes.
//!
//! Used for the sale token (ACDM), the treasury token (XXX) and the
//! router's liquidity-provider tokens.

use std::collections::HashMap;

use acdm_types::{pow10, Address, Amount};
use serde::{Deserialize, Serialize};

use crate::access::{AccessControl, Role};
use crate::error::CoreError;

/// Token metadata, as found in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Fungible token state
#[derive(Debug, Clone)]
pub struct Token {
    address: Address,
    info: TokenInfo,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    /// (owner, spender) -> remaining allowance
    allowances: HashMap<(Address, Address), Amount>,
    access: AccessControl,
}

impl Token {
    /// Create a token at `address`, administered by `admin`.
    pub fn new(address: Address, info: TokenInfo, admin: Address) -> Self {
        Self {
            address,
            info,
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            access: AccessControl::with_admin(admin),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn symbol(&self) -> &str {
        &self.info.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.info.decimals
    }

    /// `10^decimals`, the number of units in one whole token.
    pub fn unit(&self) -> Result<Amount, CoreError> {
        Ok(pow10(u32::from(self.info.decimals))?)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }

    /// Transfer tokens
    pub fn transfer(&mut self, from: &Address, to: &Address, value: Amount) -> Result<(), CoreError> {
        if to.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        self.move_balance(from, to, value)
    }

    /// Set `spender`'s allowance over `owner`'s balance, replacing any previous value.
    pub fn approve(&mut self, owner: &Address, spender: &Address, value: Amount) -> Result<(), CoreError> {
        if spender.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        if value == 0 {
            self.allowances.remove(&(*owner, *spender));
        } else {
            self.allowances.insert((*owner, *spender), value);
        }
        tracing::debug!(token = %self.info.symbol, %owner, %spender, value, "approval");
        Ok(())
    }

    /// Transfer from (with allowance)
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        value: Amount,
    ) -> Result<(), CoreError> {
        if to.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        let available = self.allowance(from, spender);
        if available < value {
            return Err(CoreError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                required: value,
                available,
            });
        }
        self.move_balance(from, to, value)?;
        self.approve(from, spender, available - value)
    }

    /// Mint new tokens. `caller` must hold `Minter`.
    pub fn mint(&mut self, caller: &Address, to: &Address, value: Amount) -> Result<(), CoreError> {
        self.access.ensure_role(Role::Minter, caller)?;
        if to.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        if value == 0 {
            return Ok(());
        }
        self.total_supply = self.total_supply.checked_add(value).ok_or_else(CoreError::overflow)?;
        let balance = self.balance_of(to).checked_add(value).ok_or_else(CoreError::overflow)?;
        self.balances.insert(*to, balance);
        tracing::debug!(token = %self.info.symbol, %to, value, "mint");
        Ok(())
    }

    /// Burn tokens held by `from`. `caller` must hold `Minter`.
    pub fn burn(&mut self, caller: &Address, from: &Address, value: Amount) -> Result<(), CoreError> {
        self.access.ensure_role(Role::Minter, caller)?;
        if value == 0 {
            return Ok(());
        }
        self.debit(from, value)?;
        self.total_supply -= value;
        tracing::debug!(token = %self.info.symbol, %from, value, "burn");
        Ok(())
    }

    fn move_balance(&mut self, from: &Address, to: &Address, value: Amount) -> Result<(), CoreError> {
        if value == 0 || from == to {
            return Ok(());
        }
        self.debit(from, value)?;
        // Cannot overflow: the sum of balances equals total supply.
        let balance = self.balance_of(to) + value;
        self.balances.insert(*to, balance);
        Ok(())
    }

    fn debit(&mut self, from: &Address, value: Amount) -> Result<(), CoreError> {
        let available = self.balance_of(from);
        if available < value {
            return Err(CoreError::InsufficientBalance {
                account: *from,
                required: value,
                available,
            });
        }
        if available == value {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, available - value);
        }
        Ok(())
    }
}
