// src/services/core/economy/config.rs

use crate::services::core::ledger::ClaimPolicy;
use crate::utils::error::{EconomyError, EconomyResult, ErrorKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_DATA_DIR: &str = "ECONOMY_DATA_DIR";
pub const ENV_INITIAL_COINS: &str = "ECONOMY_INITIAL_COINS";
pub const ENV_MIN_REWARD: &str = "ECONOMY_MIN_REWARD";
pub const ENV_MAX_REWARD: &str = "ECONOMY_MAX_REWARD";
pub const ENV_CLAIM_COOLDOWN_MINUTES: &str = "ECONOMY_CLAIM_COOLDOWN_MINUTES";
pub const ENV_AUTO_PROVISION: &str = "ECONOMY_AUTO_PROVISION";

/// Settings for the coin economy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Directory holding one `<guild_id>.json` file per guild
    pub data_dir: PathBuf,
    pub initial_coins: i64,
    pub min_reward: i64,
    pub max_reward: i64,
    pub claim_cooldown_minutes: u32,
    /// Create a ledger entry for an unknown actor instead of failing
    pub auto_provision: bool,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("database"),
            initial_coins: 500,
            min_reward: 50,
            max_reward: 200,
            claim_cooldown_minutes: 60,
            auto_provision: true,
        }
    }
}

impl EconomyConfig {
    /// Defaults overridden by any `ECONOMY_*` variables that are set.
    pub fn from_env() -> EconomyResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EconomyConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> EconomyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|dir| !dir.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = parse_var(&lookup, ENV_INITIAL_COINS)? {
            config.initial_coins = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_MIN_REWARD)? {
            config.min_reward = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_MAX_REWARD)? {
            config.max_reward = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_CLAIM_COOLDOWN_MINUTES)? {
            config.claim_cooldown_minutes = value;
        }
        if let Some(raw) = lookup(ENV_AUTO_PROVISION) {
            config.auto_provision = parse_flag(ENV_AUTO_PROVISION, &raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn claim_policy(&self) -> ClaimPolicy {
        ClaimPolicy {
            cooldown_minutes: self.claim_cooldown_minutes,
            min_reward: self.min_reward,
            max_reward: self.max_reward,
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> EconomyResult<()> {
        if self.initial_coins < 0 {
            return Err(EconomyError::config_error(
                "initial_coins must not be negative".to_string(),
            ));
        }
        if self.min_reward < 0 {
            return Err(EconomyError::config_error(
                "min_reward must not be negative".to_string(),
            ));
        }
        if self.min_reward > self.max_reward {
            return Err(crate::economy_error!(
                ErrorKind::ConfigurationError,
                "min_reward must not exceed max_reward",
                "min_reward" => self.min_reward,
                "max_reward" => self.max_reward
            ));
        }
        if self.claim_cooldown_minutes == 0 {
            return Err(EconomyError::config_error(
                "claim_cooldown_minutes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> EconomyResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            EconomyError::config_error(format!("{} has an invalid value: {:?}", key, raw))
        }),
    }
}

fn parse_flag(key: &str, raw: &str) -> EconomyResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EconomyError::config_error(format!(
            "{} has an invalid value: {:?}",
            key, raw
        ))),
    }
}
