//! Round state machine and sale price progression.
//!
//! Phases cycle `None -> Sale -> Trade -> Sale -> ...`. Expiry is never
//! scheduled; it is evaluated against the caller-supplied time.

use acdm_types::{mul_div, Amount, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Current round phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No round has started yet
    #[default]
    None,
    Sale,
    Trade,
}

/// Sale price progression: `next = current · (100 + growth) / 100 + step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSchedule {
    pub base_price: Amount,
    pub price_step: Amount,
    pub growth_percent: Amount,
}

impl PriceSchedule {
    /// Price of the next sale round. The first round sells at the base price.
    pub fn next_price(&self, current: Option<Amount>) -> Result<Amount, PlatformError> {
        match current {
            None => Ok(self.base_price),
            Some(price) => {
                let grown = mul_div(price, 100 + self.growth_percent, 100)?;
                grown.checked_add(self.price_step).ok_or_else(PlatformError::overflow)
            }
        }
    }
}

/// Tokens offered by a sale round: whole tokens affordable with the
/// previous trade round's revenue at the new price.
pub fn sale_volume(revenue: Amount, price: Amount, unit: Amount) -> Result<Amount, PlatformError> {
    if price == 0 {
        return Err(PlatformError::InvalidPrice);
    }
    (revenue / price).checked_mul(unit).ok_or_else(PlatformError::overflow)
}

/// Singleton round state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub phase: Phase,
    pub started_at: Timestamp,
    pub duration_ms: u64,
    /// Price per whole token of the latest sale round; `None` before the first
    pub current_price: Option<Amount>,
    pub volume_minted: Amount,
    pub volume_sold: Amount,
    /// Native value exchanged in the current (or last) trade round
    pub trade_revenue: Amount,
}

impl RoundState {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            phase: Phase::None,
            started_at: 0,
            duration_ms,
            current_price: None,
            volume_minted: 0,
            volume_sold: 0,
            trade_revenue: 0,
        }
    }

    /// Whether the current round's duration has elapsed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.started_at.saturating_add(self.duration_ms)
    }

    pub fn remaining_volume(&self) -> Amount {
        self.volume_minted - self.volume_sold
    }

    /// Buyers may draw from inventory.
    pub fn sale_open(&self, now: Timestamp) -> bool {
        self.phase == Phase::Sale && !self.is_expired(now) && self.volume_sold < self.volume_minted
    }

    /// Sale round over: duration elapsed or inventory sold out.
    pub fn sale_finished(&self, now: Timestamp) -> bool {
        self.phase == Phase::Sale && (self.is_expired(now) || self.volume_sold == self.volume_minted)
    }

    /// Trade stays open until the next sale round starts.
    pub fn trade_open(&self) -> bool {
        self.phase == Phase::Trade
    }

    pub fn ensure_can_start_sale(&self, now: Timestamp) -> Result<(), PlatformError> {
        match self.phase {
            Phase::Sale => Err(PlatformError::InvalidState("sale round already started".into())),
            Phase::Trade if !self.is_expired(now) => {
                Err(PlatformError::InvalidState("trade round isn't finished".into()))
            }
            _ => Ok(()),
        }
    }

    pub fn ensure_can_start_trade(&self, now: Timestamp) -> Result<(), PlatformError> {
        match self.phase {
            Phase::Trade => Err(PlatformError::InvalidState("trade round already started".into())),
            Phase::Sale if self.sale_finished(now) => Ok(()),
            _ => Err(PlatformError::InvalidState("sale round isn't finished".into())),
        }
    }

    /// Enter a sale round at `price` with `volume` tokens of inventory.
    /// Consumes the trade revenue.
    pub fn begin_sale(&mut self, now: Timestamp, price: Amount, volume: Amount) {
        self.phase = Phase::Sale;
        self.started_at = now;
        self.current_price = Some(price);
        self.volume_minted = volume;
        self.volume_sold = 0;
        self.trade_revenue = 0;
    }

    pub fn begin_trade(&mut self, now: Timestamp) {
        self.phase = Phase::Trade;
        self.started_at = now;
    }
}
