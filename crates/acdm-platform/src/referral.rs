//! Two-level referral registry and commission splitting.

use std::collections::HashMap;

use acdm_core::NativeLedger;
use acdm_types::{Address, Amount, Coefficient};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Referral depth: the direct referrer, or the referrer's referrer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    First,
    Second,
}

/// Round whose commission rates apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    Sale,
    Trade,
}

/// One tier's rates for both round kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCommission {
    pub sale: Coefficient,
    pub trade: Coefficient,
}

/// Commission fractions per tier and round kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommissionConfig {
    pub referrer1: TierCommission,
    pub referrer2: TierCommission,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            referrer1: TierCommission {
                sale: Coefficient { value: 5, decimals: 2 },
                trade: Coefficient { value: 25, decimals: 3 },
            },
            referrer2: TierCommission {
                sale: Coefficient { value: 3, decimals: 2 },
                trade: Coefficient { value: 25, decimals: 3 },
            },
        }
    }
}

impl CommissionConfig {
    pub fn get(&self, tier: Tier, kind: RoundKind) -> Coefficient {
        let rates = match tier {
            Tier::First => &self.referrer1,
            Tier::Second => &self.referrer2,
        };
        match kind {
            RoundKind::Sale => rates.sale,
            RoundKind::Trade => rates.trade,
        }
    }

    fn slot(&mut self, tier: Tier, kind: RoundKind) -> &mut Coefficient {
        let rates = match tier {
            Tier::First => &mut self.referrer1,
            Tier::Second => &mut self.referrer2,
        };
        match kind {
            RoundKind::Sale => &mut rates.sale,
            RoundKind::Trade => &mut rates.trade,
        }
    }

    /// Replace one fraction. Rejects a fraction of one or more, and a pair
    /// of tiers whose sum would exceed one.
    pub fn set(&mut self, tier: Tier, kind: RoundKind, value: Coefficient) -> Result<(), PlatformError> {
        let other = match tier {
            Tier::First => self.get(Tier::Second, kind),
            Tier::Second => self.get(Tier::First, kind),
        };
        check_pair(value, other)?;
        *self.slot(tier, kind) = value;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), PlatformError> {
        for kind in [RoundKind::Sale, RoundKind::Trade] {
            check_pair(self.get(Tier::First, kind), self.get(Tier::Second, kind))?;
        }
        Ok(())
    }
}

fn check_pair(value: Coefficient, other: Coefficient) -> Result<(), PlatformError> {
    let invalid = |reason: &str| {
        PlatformError::InvalidCommission(format!("{}/10^{}: {reason}", value.value, value.decimals))
    };
    if !value.is_below_one().map_err(|_| invalid("decimals out of range"))? {
        return Err(invalid("fraction must be below one"));
    }
    if !value.fits_with(&other).map_err(|_| invalid("decimals out of range"))? {
        return Err(invalid("tiers would exceed the whole amount"));
    }
    Ok(())
}

/// Outcome of splitting a payment along a referral chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Split {
    pub tier1: Option<(Address, Amount)>,
    pub tier2: Option<(Address, Amount)>,
    /// Share kept by the payer
    pub retained: Amount,
}

impl Split {
    pub fn paid_out(&self) -> Amount {
        self.tier1.map_or(0, |(_, a)| a) + self.tier2.map_or(0, |(_, a)| a)
    }
}

/// Account -> referrer registrations and the commission rates.
#[derive(Debug, Clone, Default)]
pub struct ReferralRegistry {
    /// `None` marks an account registered without a referrer
    referrers: HashMap<Address, Option<Address>>,
    commissions: CommissionConfig,
}

impl ReferralRegistry {
    pub fn new(commissions: CommissionConfig) -> Self {
        Self {
            referrers: HashMap::new(),
            commissions,
        }
    }

    pub fn is_registered(&self, account: &Address) -> bool {
        self.referrers.contains_key(account)
    }

    /// Direct referrer of `account`, if any.
    pub fn referrer_of(&self, account: &Address) -> Option<Address> {
        self.referrers.get(account).copied().flatten()
    }

    pub fn commissions(&self) -> &CommissionConfig {
        &self.commissions
    }

    pub fn commission(&self, tier: Tier, kind: RoundKind) -> Coefficient {
        self.commissions.get(tier, kind)
    }

    pub fn set_commission(
        &mut self,
        tier: Tier,
        kind: RoundKind,
        value: Coefficient,
    ) -> Result<(), PlatformError> {
        self.commissions.set(tier, kind, value)?;
        tracing::info!(?tier, ?kind, value = value.value, decimals = value.decimals, "commission updated");
        Ok(())
    }

    /// Register `account` under `referrer`; the zero address means none.
    pub fn register(&mut self, account: Address, referrer: Address) -> Result<(), PlatformError> {
        if self.is_registered(&account) {
            return Err(PlatformError::AlreadyRegistered(account));
        }
        let upline = if referrer.is_zero() {
            None
        } else if self.is_registered(&referrer) {
            Some(referrer)
        } else {
            return Err(PlatformError::UnregisteredReferrer(referrer));
        };
        self.referrers.insert(account, upline);
        tracing::info!(%account, %referrer, "registered");
        Ok(())
    }

    /// Compute the split of `total` along `account`'s chain without paying.
    pub fn quote(&self, total: Amount, account: &Address, kind: RoundKind) -> Result<Split, PlatformError> {
        let first = self.referrer_of(account);
        let second = first.and_then(|r| self.referrer_of(&r));

        let tier1 = first
            .map(|r| Ok::<_, PlatformError>((r, self.commission(Tier::First, kind).apply(total)?)))
            .transpose()?;
        let tier2 = second
            .map(|r| Ok::<_, PlatformError>((r, self.commission(Tier::Second, kind).apply(total)?)))
            .transpose()?;

        let mut split = Split { tier1, tier2, retained: 0 };
        split.retained = total
            .checked_sub(split.paid_out())
            .ok_or_else(|| PlatformError::InvalidCommission("payouts exceed total".into()))?;
        Ok(split)
    }

    /// Pay `account`'s referrers their share of `total` out of `payer`'s
    /// native balance and return what the payer keeps.
    pub fn split(
        &self,
        native: &mut NativeLedger,
        payer: &Address,
        total: Amount,
        account: &Address,
        kind: RoundKind,
    ) -> Result<Split, PlatformError> {
        let split = self.quote(total, account, kind)?;
        for (referrer, amount) in split.tier1.iter().chain(split.tier2.iter()) {
            native.transfer(payer, referrer, *amount)?;
        }
        tracing::debug!(%account, ?kind, total, retained = split.retained, "commission split");
        Ok(split)
    }
}
