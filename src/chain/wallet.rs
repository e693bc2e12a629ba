//! Signing wallet and user address resolution from the process environment

use crate::config::WalletConfig;
use crate::error::{SwapError, SwapResult};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::env;
use tracing::{debug, warn};

/// Load the signing wallet from the configured private key variable
pub fn load_wallet(config: &WalletConfig, chain_id: u64) -> SwapResult<LocalWallet> {
    let key = env::var(&config.private_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            SwapError::Wallet(format!(
                "No private key configured. Set {}",
                config.private_key_env
            ))
        })?;

    let wallet = key
        .trim()
        .parse::<LocalWallet>()
        .map_err(|e| SwapError::Wallet(format!("Invalid private key: {}", e)))?;

    debug!("Loaded wallet {:?}", wallet.address());
    Ok(wallet.with_chain_id(chain_id))
}

/// Address the quote is requested for
///
/// Taken from the configured address variable when present, otherwise the
/// signer's own address.
pub fn resolve_user_address(config: &WalletConfig, signer: Address) -> SwapResult<Address> {
    let Some(raw) = env::var(&config.address_env)
        .ok()
        .filter(|a| !a.trim().is_empty())
    else {
        debug!(
            "{} not set, using signer address {:?}",
            config.address_env, signer
        );
        return Ok(signer);
    };

    let address: Address = raw.trim().parse().map_err(|e| {
        SwapError::Wallet(format!("Invalid {} {:?}: {}", config.address_env, raw, e))
    })?;

    if address != signer {
        warn!(
            "{} {:?} differs from signer {:?}; the quote targets a wallet that will not sign",
            config.address_env, address, signer
        );
    }

    Ok(address)
}
