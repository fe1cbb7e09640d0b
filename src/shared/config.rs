//! Configuration loading for the simulated environment and plan files

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::domain::lending::FeeRounding;
use crate::domain::plan::PlanFile;
use crate::shared::errors::AppError;
use crate::shared::types::{AccountId, Amount, AssetId, VenueId, BPS_DENOMINATOR};

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub executor: ExecutorSettings,
    pub lender: LenderSettings,
    #[serde(default)]
    pub venues: Vec<VenueSettings>,
    #[serde(default)]
    pub balances: Vec<BalanceSettings>,
}

/// Executor account and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSettings {
    pub address: AccountId,
    pub owner: AccountId,
    #[serde(default)]
    pub min_profit: Amount,
    #[serde(default = "default_min_profit_bps")]
    pub min_profit_bps: u16,
    #[serde(default = "default_max_fee_bps")]
    pub max_fee_bps: u16,
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
    /// Used by `quote` when no slippage is given
    #[serde(default = "default_slippage_bps")]
    pub default_slippage_bps: u16,
    #[serde(default)]
    pub paused: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LenderSettings {
    pub address: AccountId,
    pub fee_bps: u16,
    #[serde(default)]
    pub rounding: FeeRounding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VenueSettings {
    /// Two-asset x*y=k pool; reserves are minted to `address`
    ConstantProduct {
        id: VenueId,
        address: AccountId,
        asset_a: AssetId,
        asset_b: AssetId,
        reserve_a: Amount,
        reserve_b: Amount,
        #[serde(default = "default_pool_fee_bps")]
        fee_bps: u16,
        #[serde(default = "default_enabled")]
        enabled: bool,
    },
    /// Fixed outputs, paid from `funding` minted to `address`
    Scripted {
        id: VenueId,
        address: AccountId,
        outputs: Vec<Amount>,
        #[serde(default)]
        funding: Vec<FundingSettings>,
        #[serde(default)]
        cycle: bool,
        #[serde(default = "default_enabled")]
        enabled: bool,
    },
}

impl VenueSettings {
    pub fn id(&self) -> &VenueId {
        match self {
            VenueSettings::ConstantProduct { id, .. } | VenueSettings::Scripted { id, .. } => id,
        }
    }

    pub fn address(&self) -> &AccountId {
        match self {
            VenueSettings::ConstantProduct { address, .. }
            | VenueSettings::Scripted { address, .. } => address,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            VenueSettings::ConstantProduct { enabled, .. }
            | VenueSettings::Scripted { enabled, .. } => *enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingSettings {
    pub asset: AssetId,
    pub amount: Amount,
}

/// Opening balance minted into the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSettings {
    pub account: AccountId,
    pub asset: AssetId,
    pub amount: Amount,
}

fn default_min_profit_bps() -> u16 {
    10
}

fn default_max_fee_bps() -> u16 {
    100
}

fn default_max_hops() -> usize {
    8
}

fn default_slippage_bps() -> u16 {
    50
}

fn default_pool_fee_bps() -> u16 {
    30
}

fn default_enabled() -> bool {
    true
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        let bps_fields = [
            ("executor.min_profit_bps", self.executor.min_profit_bps),
            ("executor.max_fee_bps", self.executor.max_fee_bps),
            ("executor.default_slippage_bps", self.executor.default_slippage_bps),
            ("lender.fee_bps", self.lender.fee_bps),
        ];
        for (name, value) in bps_fields {
            check_bps(name, value)?;
        }
        if self.executor.max_hops == 0 {
            return Err(AppError::ConfigError("executor.max_hops must be at least 1".to_string()));
        }

        let mut accounts = HashSet::new();
        for account in [&self.executor.address, &self.lender.address] {
            if !accounts.insert(account.clone()) {
                return Err(AppError::ConfigError(format!("account {} is used twice", account)));
            }
        }

        let mut ids = HashSet::new();
        for venue in &self.venues {
            if !ids.insert(venue.id().clone()) {
                return Err(AppError::ConfigError(format!("duplicate venue id {}", venue.id())));
            }
            if !accounts.insert(venue.address().clone()) {
                return Err(AppError::ConfigError(format!(
                    "venue {} reuses account {}",
                    venue.id(),
                    venue.address()
                )));
            }
            match venue {
                VenueSettings::ConstantProduct {
                    id,
                    asset_a,
                    asset_b,
                    fee_bps,
                    ..
                } => {
                    check_bps(&format!("venues.{}.fee_bps", id), *fee_bps)?;
                    if asset_a == asset_b {
                        return Err(AppError::ConfigError(format!(
                            "venue {} pairs {} with itself",
                            id, asset_a
                        )));
                    }
                }
                VenueSettings::Scripted { id, outputs, .. } => {
                    if outputs.is_empty() {
                        return Err(AppError::ConfigError(format!(
                            "scripted venue {} has no outputs",
                            id
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_bps(name: &str, value: u16) -> Result<(), AppError> {
    if value as u64 > BPS_DENOMINATOR {
        return Err(AppError::ConfigError(format!(
            "{} = {} exceeds {}",
            name, value, BPS_DENOMINATOR
        )));
    }
    Ok(())
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate an environment configuration file
    pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, AppError> {
        let config: AppConfig = Self::read_toml(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Load a plan file. Structural checks happen against the executor.
    pub fn load_plan(path: impl AsRef<Path>) -> Result<PlanFile, AppError> {
        Self::read_toml(path.as_ref())
    }

    fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AppError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            AppError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [executor]
        address = "executor"
        owner = "owner"
        min_profit = 1

        [lender]
        address = "lender"
        fee_bps = 30

        [[venues]]
        type = "constant_product"
        id = "alpha"
        address = "alpha-pool"
        asset_a = "USDC"
        asset_b = "WETH"
        reserve_a = 1000000
        reserve_b = 500

        [[venues]]
        type = "scripted"
        id = "beta"
        address = "beta-pool"
        outputs = [1050]
        funding = [{ asset = "USDC", amount = 5000 }]
        cycle = true

        [[balances]]
        account = "lender"
        asset = "USDC"
        amount = 100000
    "#;

    #[test]
    fn test_parse_config_with_defaults() {
        let config: AppConfig = toml::from_str(CONFIG).unwrap();
        config.validate().unwrap();

        assert_eq!(config.executor.min_profit, Amount::new(1));
        assert_eq!(config.executor.min_profit_bps, 10);
        assert_eq!(config.executor.max_fee_bps, 100);
        assert_eq!(config.executor.default_slippage_bps, 50);
        assert_eq!(config.lender.rounding, FeeRounding::Down);
        assert_eq!(config.venues.len(), 2);
        assert!(matches!(
            &config.venues[0],
            VenueSettings::ConstantProduct { fee_bps: 30, enabled: true, .. }
        ));
        assert!(matches!(&config.venues[1], VenueSettings::Scripted { cycle: true, .. }));
    }

    #[test]
    fn test_validate_rejects_bad_bps() {
        let mut config: AppConfig = toml::from_str(CONFIG).unwrap();
        config.lender.fee_bps = 10_001;
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_venue() {
        let mut config: AppConfig = toml::from_str(CONFIG).unwrap();
        let duplicate = config.venues[0].clone();
        config.venues.push(duplicate);
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ConfigLoader::load_config("does/not/exist.toml"),
            Err(AppError::ConfigError(_))
        ));
    }
}
