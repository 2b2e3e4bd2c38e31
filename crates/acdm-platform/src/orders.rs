//! Secondary-market order book.

use std::collections::BTreeMap;

use acdm_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// A seller's standing offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub creator: Address,
    /// Token units still for sale
    pub remaining: Amount,
    /// Native units per whole token
    pub unit_price: Amount,
    pub active: bool,
}

/// Orders keyed by id. Ids are sequential from 1 and never reused.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: BTreeMap<u64, Order>,
    next_id: u64,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new order and return its id.
    pub fn insert(&mut self, creator: Address, amount: Amount, unit_price: Amount) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.orders.insert(
            id,
            Order {
                id,
                creator,
                remaining: amount,
                unit_price,
                active: true,
            },
        );
        id
    }

    pub fn get(&self, id: u64) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Close an active order on behalf of its creator, returning the units
    /// still in custody.
    pub fn cancel(&mut self, id: u64, caller: &Address) -> Result<Amount, PlatformError> {
        let order = self
            .orders
            .get_mut(&id)
            .filter(|order| order.active)
            .ok_or(PlatformError::NotFound(id))?;
        if order.creator != *caller {
            return Err(PlatformError::NotOwner { order: id, caller: *caller });
        }
        let returned = order.remaining;
        order.remaining = 0;
        order.active = false;
        Ok(returned)
    }

    /// Take `units` from an order, deactivating it once empty.
    pub fn fill(&mut self, id: u64, units: Amount) -> Result<&Order, PlatformError> {
        let order = self
            .orders
            .get_mut(&id)
            .filter(|order| order.active && order.remaining >= units)
            .ok_or(PlatformError::NotFound(id))?;
        order.remaining -= units;
        if order.remaining == 0 {
            order.active = false;
        }
        Ok(order)
    }

    /// Active orders in ascending id order.
    pub fn active(&self) -> impl Iterator<Item = &Order> {
        self.orders.values().filter(|order| order.active)
    }

    /// Ids of active orders, ascending.
    pub fn active_ids(&self) -> Vec<u64> {
        self.active().map(|order| order.id).collect()
    }

    /// Total units in custody for open orders.
    pub fn escrowed(&self) -> Amount {
        self.active().map(|order| order.remaining).sum()
    }
}
