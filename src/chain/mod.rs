//! Chain module - signing and read access to the EVM network the swap is sent on
//!
//! This module provides:
//! - The `ChainClient` seam used by the allowance manager and the swap executor
//! - An ethers-backed implementation with a local signing wallet
//! - ERC-20 bindings for `allowance` and `approve`

pub mod erc20;
pub mod provider;
pub mod wallet;

pub use erc20::approve_calldata;
pub use provider::EvmChainClient;

use crate::error::SwapResult;

use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionReceipt, H256, U256};

/// Returns true when `token` is the zero-address sentinel for the chain's native asset
pub fn is_native_token(token: Address) -> bool {
    token == Address::zero()
}

/// Operations the swap flow needs from a connected, signing chain handle
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the signing wallet
    fn address(&self) -> Address;

    /// Current network gas price
    async fn gas_price(&self) -> SwapResult<U256>;

    /// ERC-20 `allowance(owner, spender)` on `token`
    async fn allowance(&self, token: Address, owner: Address, spender: Address)
        -> SwapResult<U256>;

    /// Sign and broadcast a transaction, returning its hash
    async fn send_transaction(&self, tx: TypedTransaction) -> SwapResult<H256>;

    /// Wait until `tx_hash` has `confirmations` confirmations
    async fn wait_for_confirmation(
        &self,
        tx_hash: H256,
        confirmations: usize,
    ) -> SwapResult<TransactionReceipt>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_zero_address_is_native() {
        assert!(is_native_token(Address::zero()));
        let dai = Address::from_str("0x6B175474E89094C44Da98b954EedeAC495271d0F").unwrap();
        assert!(!is_native_token(dai));
    }
}
