//! Genesis: deploys tokens, the liquidity pool, the platform and the DAO,
//! and wires their roles together.

use acdm_core::{AssetState, Role, Token};
use acdm_governance::{DaoAccounts, DaoStaking};
use acdm_platform::{AcdmPlatform, PlatformAccounts};
use acdm_types::Address;
use serde::{Deserialize, Serialize};

use crate::config::{AccountsConfig, NodeConfig};
use crate::error::LedgerError;

/// Resolved addresses of every account and contract at genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub owner: Address,
    pub chair: Address,
    pub dao_settings: Address,
    pub platform: Address,
    pub dao: Address,
    pub router: Address,
    pub acdm: Address,
    pub xxx: Address,
    pub lp: Address,
}

impl From<&AccountsConfig> for Deployment {
    fn from(accounts: &AccountsConfig) -> Self {
        Self {
            owner: accounts.owner.address(),
            chair: accounts.chair.address(),
            dao_settings: accounts.dao_settings.address(),
            platform: accounts.platform.address(),
            dao: accounts.dao.address(),
            router: accounts.router.address(),
            acdm: accounts.acdm_token.address(),
            xxx: accounts.xxx_token.address(),
            lp: accounts.lp_token.address(),
        }
    }
}

/// Everything genesis produces.
pub struct GenesisState {
    pub deployment: Deployment,
    pub assets: AssetState,
    pub platform: AcdmPlatform,
    pub dao: DaoStaking,
}

/// Deploy the system described by `config`.
///
/// Roles granted:
/// - platform: `Minter` on ACDM and XXX (sale minting, burns)
/// - owner: `Minter` on XXX (funding rewards and liquidity)
/// - DAO: `Dao` on the platform, `StakingSettings` on itself
/// - chair: `Chair`; settings account: `DaoSettings`
pub fn build(config: &NodeConfig) -> Result<GenesisState, LedgerError> {
    let d = Deployment::from(&config.accounts);
    let mut assets = AssetState::new(d.router);

    let mut acdm = Token::new(d.acdm, config.tokens.acdm.clone(), d.owner);
    acdm.access_mut().grant_role(Role::Minter, d.platform);
    assets.deploy_token(acdm)?;

    let mut xxx = Token::new(d.xxx, config.tokens.xxx.clone(), d.owner);
    xxx.access_mut().grant_role(Role::Minter, d.platform);
    xxx.access_mut().grant_role(Role::Minter, d.owner);
    assets.deploy_token(xxx)?;

    assets.create_pool(d.owner, d.xxx, d.lp, config.tokens.lp.clone())?;

    let platform = AcdmPlatform::new(
        PlatformAccounts {
            address: d.platform,
            acdm_token: d.acdm,
            xxx_token: d.xxx,
            owner: d.owner,
            dao: d.dao,
        },
        &config.platform,
    )?;

    let mut dao = DaoStaking::new(
        DaoAccounts {
            address: d.dao,
            admin: d.owner,
            deposit_token: d.lp,
            reward_token: d.xxx,
        },
        config.dao,
        config.staking,
    )?;
    dao.access_mut().grant_role(Role::Chair, d.chair);
    dao.access_mut().grant_role(Role::DaoSettings, d.dao_settings);

    tracing::info!(
        platform = %d.platform,
        dao = %d.dao,
        acdm = %d.acdm,
        xxx = %d.xxx,
        lp = %d.lp,
        "genesis deployed"
    );

    Ok(GenesisState {
        deployment: d,
        assets,
        platform,
        dao,
    })
}
