//! Node configuration.
//!
//! Handles loading and validation of the deployment parameters from a TOML
//! file. Every section has defaults matching the reference deployment, so a
//! partial file is enough.

use std::path::Path;

use acdm_core::TokenInfo;
use acdm_governance::{DaoParams, StakingParams};
use acdm_platform::PlatformParams;
use serde::{Deserialize, Serialize};

use crate::account::AccountRef;

/// Node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Round lengths, prices and referral commissions
    pub platform: PlatformParams,
    /// Quorum, debating period and voter lock
    pub dao: DaoParams,
    /// Reward rate, maturity and hold time
    pub staking: StakingParams,
    pub tokens: TokensConfig,
    pub accounts: AccountsConfig,
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// Load configuration from file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: NodeConfig = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .map_err(|e| anyhow::anyhow!("Failed to write config file '{}': {}", path.display(), e))?;
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.platform.validate()?;
        self.dao.validate()?;

        let accounts = &self.accounts;
        let contracts = [
            accounts.platform,
            accounts.dao,
            accounts.router,
            accounts.acdm_token,
            accounts.xxx_token,
            accounts.lp_token,
        ];
        for (i, a) in contracts.iter().enumerate() {
            if a.address().is_zero() {
                anyhow::bail!("Contract address cannot be zero");
            }
            if contracts[..i].contains(a) {
                anyhow::bail!("Contract address {} is used twice", a);
            }
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            anyhow::bail!("Unknown log format '{}'", self.logging.format);
        }
        Ok(())
    }
}

/// Metadata of the three deployed tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokensConfig {
    pub acdm: TokenInfo,
    pub xxx: TokenInfo,
    /// Liquidity token of the XXX/native pool, staked in the DAO
    pub lp: TokenInfo,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            acdm: TokenInfo {
                name: "ACADEM Coin".to_string(),
                symbol: "ACDM".to_string(),
                decimals: 6,
            },
            xxx: TokenInfo {
                name: "XXX Coin".to_string(),
                symbol: "XXX".to_string(),
                decimals: 18,
            },
            lp: TokenInfo {
                name: "XXX/Native LP".to_string(),
                symbol: "XXX-LP".to_string(),
                decimals: 18,
            },
        }
    }
}

/// Who holds what at genesis, and where contracts live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// Deployer: admin of every contract, minter of XXX, platform owner
    pub owner: AccountRef,
    /// May create proposals
    pub chair: AccountRef,
    /// May change quorum and debating period
    pub dao_settings: AccountRef,
    pub platform: AccountRef,
    pub dao: AccountRef,
    pub router: AccountRef,
    pub acdm_token: AccountRef,
    pub xxx_token: AccountRef,
    pub lp_token: AccountRef,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            owner: AccountRef::label("owner"),
            chair: AccountRef::label("chair"),
            dao_settings: AccountRef::label("owner"),
            platform: AccountRef::label("platform"),
            dao: AccountRef::label("dao"),
            router: AccountRef::label("router"),
            acdm_token: AccountRef::label("acdm"),
            xxx_token: AccountRef::label("xxx"),
            lp_token: AccountRef::label("lp"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or env-filter directive
    pub level: String,
    /// Log to file instead of stdout
    pub log_file: Option<std::path::PathBuf>,
    /// Log format (json|pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.tokens.acdm.decimals, 6);
        assert_eq!(config.platform.round_duration_ms, 259_200_000);
        assert_eq!(config.staking.rate_percent, 3);
        assert_eq!(config.dao.minimum_quorum, 1);
    }

    #[test]
    fn test_config_validation() {
        let mut config = NodeConfig::default();
        config.dao.minimum_quorum = 0;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.accounts.dao = config.accounts.platform;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: NodeConfig = toml::from_str(
            r#"
            [platform]
            round_duration_ms = 1000

            [platform.commissions.referrer1]
            sale = { value = 4, decimals = 2 }
            trade = { value = 1, decimals = 2 }

            [accounts]
            chair = "alice"
            "#,
        )
        .unwrap();
        assert_eq!(config.platform.round_duration_ms, 1000);
        assert_eq!(config.platform.commissions.referrer1.sale.value, 4);
        assert_eq!(config.platform.commissions.referrer2.sale.value, 3);
        assert_eq!(config.platform.base_price, acdm_platform::params::DEFAULT_BASE_PRICE);
        assert_eq!(config.accounts.chair, AccountRef::label("alice"));
        assert_eq!(config.accounts.owner, AccountRef::label("owner"));
    }

    #[test]
    fn test_config_serialization() {
        let config = NodeConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();

        assert!(toml_str.contains("[platform]"));
        assert!(toml_str.contains("ACDM"));
        assert_eq!(toml::from_str::<NodeConfig>(&toml_str).unwrap(), config);
    }
}
