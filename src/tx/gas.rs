//! Gas price and gas limit fallbacks for quoted transactions

use crate::chain::ChainClient;
use crate::error::SwapResult;

use ethers::types::U256;
use tracing::debug;

/// Fills gas fields the quote leaves unset
#[derive(Debug, Clone)]
pub struct GasPolicy {
    /// Gas limit used when the quote has none
    default_gas_limit: U256,
}

impl GasPolicy {
    pub fn new(default_gas_limit: u64) -> Self {
        Self {
            default_gas_limit: U256::from(default_gas_limit),
        }
    }

    /// Quoted gas price, or the network's current one when unset or zero
    pub async fn resolve_gas_price<C>(&self, client: &C, quoted: Option<U256>) -> SwapResult<U256>
    where
        C: ChainClient + ?Sized,
    {
        match quoted.filter(|p| !p.is_zero()) {
            Some(price) => Ok(price),
            None => {
                let price = client.gas_price().await?;
                debug!("Quote has no gas price, using network price {}", price);
                Ok(price)
            }
        }
    }

    /// Quoted gas limit, or the default when unset or zero
    pub fn resolve_gas_limit(&self, quoted: Option<U256>) -> U256 {
        match quoted.filter(|l| !l.is_zero()) {
            Some(limit) => limit,
            None => {
                debug!(
                    "Quote has no gas limit, using default {}",
                    self.default_gas_limit
                );
                self.default_gas_limit
            }
        }
    }
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self::new(1_000_000)
    }
}
