//! ethers-backed chain client with a local signing wallet

use super::erc20::Erc20;
use super::ChainClient;
use crate::config::ChainConfig;
use crate::error::{SwapError, SwapResult};

use async_trait::async_trait;
use ethers::middleware::{NonceManagerMiddleware, SignerMiddleware};
use ethers::providers::{Http, JsonRpcClient, Middleware, PendingTransaction, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockNumber, TransactionReceipt, H256, U256, U64};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Signer over a local nonce counter, so back-to-back sends never share a nonce
type SigningClient<P> = SignerMiddleware<NonceManagerMiddleware<Provider<P>>, LocalWallet>;

/// JSON-RPC connection to one chain, signing with a local wallet
pub struct EvmChainClient {
    /// Chain configuration
    config: ChainConfig,
    /// Provider wrapped with the signer
    client: Arc<SigningClient<Http>>,
}

impl EvmChainClient {
    /// Connect to the configured RPC endpoint and verify its chain id
    pub async fn connect(config: ChainConfig, wallet: LocalWallet) -> SwapResult<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| SwapError::ChainConnection {
                chain_id: config.chain_id,
                message: format!("Invalid RPC url {}: {}", config.rpc_url, e),
            })?
            .interval(Duration::from_millis(config.poll_interval_ms));

        let actual = provider
            .get_chainid()
            .await
            .map_err(|e| SwapError::ChainConnection {
                chain_id: config.chain_id,
                message: e.to_string(),
            })?
            .as_u64();

        if actual != config.chain_id {
            return Err(SwapError::ChainMismatch {
                expected: config.chain_id,
                actual,
            });
        }

        info!(
            "Connected to {} (chain {}) as {:?}",
            config.name,
            config.chain_id,
            wallet.address()
        );

        Ok(Self {
            client: Arc::new(signing_client(provider, wallet).await?),
            config,
        })
    }

    /// Get chain ID
    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    fn address(&self) -> Address {
        self.client.address()
    }

    async fn gas_price(&self) -> SwapResult<U256> {
        let price = self
            .client
            .get_gas_price()
            .await
            .map_err(|e| SwapError::GasEstimation(e.to_string()))?;

        debug!("Gas price for chain {}: {}", self.config.chain_id, price);
        Ok(price)
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> SwapResult<U256> {
        Erc20::new(token, self.client.clone())
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| SwapError::Contract(format!("allowance() on {:?}: {}", token, e)))
    }

    async fn send_transaction(&self, tx: TypedTransaction) -> SwapResult<H256> {
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| SwapError::Transaction(e.to_string()))?;

        Ok(pending.tx_hash())
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: H256,
        confirmations: usize,
    ) -> SwapResult<TransactionReceipt> {
        let receipt = PendingTransaction::new(tx_hash, self.client.provider())
            .confirmations(confirmations)
            .await
            .map_err(|e| SwapError::ChainConnection {
                chain_id: self.config.chain_id,
                message: e.to_string(),
            })?;

        check_receipt(tx_hash, receipt)
    }
}

/// Wrap `provider` with a nonce counter seeded from the wallet's pending count, then the signer
async fn signing_client<P>(provider: Provider<P>, wallet: LocalWallet) -> SwapResult<SigningClient<P>>
where
    P: JsonRpcClient + 'static,
{
    let nonces = NonceManagerMiddleware::new(provider, wallet.address());
    let next = nonces
        .initialize_nonce(Some(BlockNumber::Pending.into()))
        .await
        .map_err(|e| SwapError::Transaction(format!("Failed to read pending nonce: {}", e)))?;

    debug!("Next nonce for {:?}: {}", wallet.address(), next);
    Ok(SignerMiddleware::new(nonces, wallet))
}

/// Map a polled receipt to success, dropped or reverted
fn check_receipt(
    tx_hash: H256,
    receipt: Option<TransactionReceipt>,
) -> SwapResult<TransactionReceipt> {
    match receipt {
        None => Err(SwapError::TransactionDropped {
            tx_hash: format!("{:?}", tx_hash),
        }),
        Some(receipt) if receipt.status == Some(U64::zero()) => {
            Err(SwapError::TransactionReverted {
                tx_hash: format!("{:?}", tx_hash),
            })
        }
        Some(receipt) => Ok(receipt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::MockProvider;
    use ethers::types::TransactionRequest;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn legacy_tx(to: Address) -> TypedTransaction {
        // gas and price preset so filling only touches the nonce
        TransactionRequest::new()
            .to(to)
            .gas(21_000u64)
            .gas_price(1_000_000_000u64)
            .into()
    }

    #[tokio::test]
    async fn test_back_to_back_sends_get_distinct_nonces() {
        let (provider, mock): (Provider<MockProvider>, MockProvider) = Provider::mocked();
        mock.push(U256::from(5)).unwrap();
        let wallet = TEST_KEY.parse::<LocalWallet>().unwrap().with_chain_id(137u64);
        let from = wallet.address();

        let client = signing_client(provider, wallet).await.unwrap();
        mock.assert_request("eth_getTransactionCount", (from, "pending"))
            .unwrap();

        let mut approval = legacy_tx(Address::repeat_byte(0x6b));
        let mut transfer = legacy_tx(Address::repeat_byte(0x0a));
        client.fill_transaction(&mut approval, None).await.unwrap();
        client.fill_transaction(&mut transfer, None).await.unwrap();

        assert_eq!(approval.nonce(), Some(&U256::from(5)));
        assert_eq!(transfer.nonce(), Some(&U256::from(6)));
    }

    fn receipt(status: u64) -> TransactionReceipt {
        TransactionReceipt {
            status: Some(U64::from(status)),
            block_number: Some(U64::from(42)),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_receipt_is_dropped() {
        let result = check_receipt(H256::repeat_byte(1), None);
        assert!(matches!(result, Err(SwapError::TransactionDropped { .. })));
    }

    #[test]
    fn test_failed_status_is_reverted() {
        let result = check_receipt(H256::repeat_byte(2), Some(receipt(0)));
        assert!(matches!(result, Err(SwapError::TransactionReverted { .. })));
    }

    #[test]
    fn test_successful_receipt_passes_through() {
        let result = check_receipt(H256::repeat_byte(3), Some(receipt(1))).unwrap();
        assert_eq!(result.block_number, Some(U64::from(42)));
    }
}
