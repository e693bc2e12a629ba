//! Configuration management for pathfinder-swap
//!
//! Loads configuration from a TOML file with environment variable substitution.

use crate::error::{SwapError, SwapResult};

use anyhow::{Context, Result};
use ethers::types::{Address, U256};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref ENV_VAR_PATTERN: Regex =
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern");
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub pathfinder: PathfinderConfig,
    pub chain: ChainConfig,
    pub swap: SwapConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathfinderConfig {
    pub base_url: String,
    /// Unset leaves the HTTP client's own defaults in place
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwapConfig {
    pub from_token_address: Address,
    pub to_token_address: Address,
    /// Decimal string in token base units
    pub amount: String,
    pub from_chain_id: u64,
    pub to_chain_id: u64,
    pub fee_token_address: Address,
    pub slippage_tolerance: f64,
    /// Spender granted the allowance before the swap is sent
    pub approval_address: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub approval_ordering: ApprovalOrdering,
    #[serde(default = "default_gas_limit")]
    pub default_gas_limit: u64,
}

/// Whether the allowance check finishes before the swap transaction is sent
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalOrdering {
    /// Await the approval before submitting the swap
    #[default]
    Sequential,
    /// Launch the approval and submit the swap without waiting for it
    Concurrent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
    #[serde(default = "default_address_env")]
    pub address_env: String,
}

fn default_confirmations() -> usize {
    1
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_gas_limit() -> u64 {
    1_000_000
}

fn default_private_key_env() -> String {
    "PRIVATE_KEY".to_string()
}

fn default_address_env() -> String {
    "WALLET_ADDRESS".to_string()
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            approval_ordering: ApprovalOrdering::default(),
            default_gas_limit: default_gas_limit(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: default_private_key_env(),
            address_env: default_address_env(),
        }
    }
}

impl SwapConfig {
    /// Amount parsed from its decimal form
    pub fn amount(&self) -> SwapResult<U256> {
        U256::from_dec_str(self.amount.trim())
            .map_err(|e| SwapError::Config(format!("Invalid swap amount {:?}: {}", self.amount, e)))
    }
}

impl Settings {
    /// Load settings from the file named by `SWAP_CONFIG`, or `config/default.toml`
    pub fn load() -> Result<Self> {
        let config_path = env::var("SWAP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from a specific file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid configuration in {:?}", config_path))
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config_str = substitute_env_vars(input);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> SwapResult<()> {
        reqwest::Url::parse(&self.pathfinder.base_url).map_err(|e| {
            SwapError::Config(format!(
                "Invalid pathfinder base_url {:?}: {}",
                self.pathfinder.base_url, e
            ))
        })?;

        reqwest::Url::parse(&self.chain.rpc_url).map_err(|e| {
            SwapError::Config(format!("Invalid rpc_url {:?}: {}", self.chain.rpc_url, e))
        })?;

        if self.swap.amount()?.is_zero() {
            return Err(SwapError::Config("Swap amount must be positive".to_string()));
        }

        if !(0.0..=100.0).contains(&self.swap.slippage_tolerance) {
            return Err(SwapError::Config(format!(
                "Slippage tolerance {} is outside 0..=100",
                self.swap.slippage_tolerance
            )));
        }

        if self.chain.confirmations == 0 {
            return Err(SwapError::Config(
                "At least one confirmation is required".to_string(),
            ));
        }

        if self.execution.default_gas_limit == 0 {
            return Err(SwapError::Config(
                "default_gas_limit must be positive".to_string(),
            ));
        }

        if self.swap.from_chain_id != self.chain.chain_id {
            tracing::warn!(
                "Swap source chain {} differs from signing chain {} ({})",
                self.swap.from_chain_id,
                self.chain.chain_id,
                self.chain.name
            );
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();

    for cap in ENV_VAR_PATTERN.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
