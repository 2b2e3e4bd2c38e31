//! Sources of voting weight.

use acdm_core::Token;
use acdm_types::{Address, Amount};

/// Supplies an account's current voting weight to the proposal engine.
pub trait VotingPower {
    fn voting_power(&self, account: &Address) -> Amount;
}

/// Token-weighted governance: weight is the plain token balance.
impl VotingPower for Token {
    fn voting_power(&self, account: &Address) -> Amount {
        self.balance_of(account)
    }
}

impl<T: VotingPower + ?Sized> VotingPower for &T {
    fn voting_power(&self, account: &Address) -> Amount {
        (**self).voting_power(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acdm_core::{Role, TokenInfo};

    #[test]
    fn test_token_balance_is_weight() {
        let admin = Address::from_label("admin");
        let holder = Address::from_label("holder");
        let info = TokenInfo {
            name: "Vote".into(),
            symbol: "VOTE".into(),
            decimals: 18,
        };
        let mut token = Token::new(Address::from_label("vote"), info, admin);
        token.access_mut().grant_role(Role::Minter, admin);
        token.mint(&admin, &holder, 42).unwrap();

        assert_eq!(token.voting_power(&holder), 42);
        assert_eq!((&token).voting_power(&admin), 0);
    }
}
