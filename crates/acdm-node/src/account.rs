//! Account references as written in configuration and scenario files.
//!
//! A reference is either a full address (`acdm1…` or `0x…`) or a plain
//! label, which maps to `Address::from_label(label)`.

use std::fmt;
use std::str::FromStr;

use acdm_types::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AccountRef(pub Address);

impl AccountRef {
    pub fn label(label: &str) -> Self {
        Self(Address::from_label(label))
    }

    pub fn address(&self) -> Address {
        self.0
    }
}

impl From<&str> for AccountRef {
    fn from(s: &str) -> Self {
        let s = s.trim();
        match Address::from_str(s) {
            Ok(address) => Self(address),
            Err(_) => Self::label(s),
        }
    }
}

impl From<String> for AccountRef {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<AccountRef> for String {
    fn from(account: AccountRef) -> Self {
        account.0.to_string()
    }
}

impl From<Address> for AccountRef {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
