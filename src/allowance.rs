//! ERC-20 allowance check and approval ahead of the swap transaction

use crate::chain::{approve_calldata, is_native_token, ChainClient};
use crate::error::SwapResult;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionRequest, H256, U256};
use tracing::{debug, error, info};

/// Result of an allowance check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowanceOutcome {
    /// Native asset, nothing to approve
    NativeAsset,
    /// Existing allowance already covers the amount
    Sufficient { current: U256 },
    /// An approval was submitted
    Approved { tx_hash: H256, confirmed: bool },
}

/// Makes sure a spender may move the swap amount on the wallet's behalf
#[derive(Debug, Clone)]
pub struct AllowanceManager {
    /// Confirmations to wait for on an approval
    confirmations: usize,
}

impl AllowanceManager {
    pub fn new(confirmations: usize) -> Self {
        Self { confirmations }
    }

    /// Approve exactly `amount` for `spender` on `token` if the current allowance is lower
    ///
    /// Reading the allowance or submitting the approval may fail; waiting for
    /// the approval to confirm may not, its failure is logged and reported as
    /// `confirmed: false`.
    pub async fn ensure_allowance<C>(
        &self,
        client: &C,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> SwapResult<AllowanceOutcome>
    where
        C: ChainClient + ?Sized,
    {
        if is_native_token(token) {
            debug!("Native asset needs no approval");
            return Ok(AllowanceOutcome::NativeAsset);
        }

        let owner = client.address();
        let current = client.allowance(token, owner, spender).await?;
        if current >= amount {
            debug!(
                "Allowance {} of {:?} for {:?} covers {}",
                current, token, spender, amount
            );
            return Ok(AllowanceOutcome::Sufficient { current });
        }

        info!(
            "Allowance {} of {:?} for {:?} is below {}, approving",
            current, token, spender, amount
        );

        let gas_price = client.gas_price().await?;
        let tx: TypedTransaction = TransactionRequest::new()
            .from(owner)
            .to(token)
            .data(approve_calldata(spender, amount))
            .gas_price(gas_price)
            .into();

        let tx_hash = client.send_transaction(tx).await?;

        let confirmed = match client
            .wait_for_confirmation(tx_hash, self.confirmations)
            .await
        {
            Ok(_) => {
                info!("Transaction mined successfully: {:?}", tx_hash);
                true
            }
            Err(e) => {
                error!("Approval {:?} failed with error: {}", tx_hash, e);
                false
            }
        };

        Ok(AllowanceOutcome::Approved { tx_hash, confirmed })
    }
}

impl Default for AllowanceManager {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainClient;
    use crate::error::SwapError;
    use ethers::types::{Bytes, NameOrAddress, TransactionReceipt};
    use mockall::predicate::eq;

    fn token() -> Address {
        Address::repeat_byte(0x6b)
    }

    fn spender() -> Address {
        Address::repeat_byte(0x6e)
    }

    fn owner() -> Address {
        Address::repeat_byte(0xf3)
    }

    fn one_token() -> U256 {
        U256::from_dec_str("1000000000000000000").unwrap()
    }

    #[tokio::test]
    async fn test_native_asset_makes_no_calls() {
        // No expectations: any call on the mock panics
        let client = MockChainClient::new();

        let outcome = AllowanceManager::default()
            .ensure_allowance(&client, Address::zero(), spender(), one_token())
            .await
            .unwrap();

        assert_eq!(outcome, AllowanceOutcome::NativeAsset);
    }

    #[tokio::test]
    async fn test_sufficient_allowance_submits_nothing() {
        for current in [one_token(), one_token() * 2, U256::MAX] {
            let mut client = MockChainClient::new();
            client.expect_address().return_const(owner());
            client
                .expect_allowance()
                .with(eq(token()), eq(owner()), eq(spender()))
                .times(1)
                .returning(move |_, _, _| Ok(current));
            client.expect_send_transaction().never();

            let outcome = AllowanceManager::default()
                .ensure_allowance(&client, token(), spender(), one_token())
                .await
                .unwrap();

            assert_eq!(outcome, AllowanceOutcome::Sufficient { current });
        }
    }

    #[tokio::test]
    async fn test_insufficient_allowance_approves_exact_amount() {
        let amount = one_token();
        let expected_data: Bytes = approve_calldata(spender(), amount);
        let tx_hash = H256::repeat_byte(0xab);

        let mut client = MockChainClient::new();
        client.expect_address().return_const(owner());
        client
            .expect_allowance()
            .times(1)
            .returning(|_, _, _| Ok(U256::zero()));
        client
            .expect_gas_price()
            .times(1)
            .returning(|| Ok(U256::from(50_000_000_000u64)));
        client
            .expect_send_transaction()
            .withf(move |tx| {
                tx.to() == Some(&NameOrAddress::Address(token()))
                    && tx.data() == Some(&expected_data)
                    && tx.gas_price() == Some(U256::from(50_000_000_000u64))
            })
            .times(1)
            .returning(move |_| Ok(tx_hash));
        client
            .expect_wait_for_confirmation()
            .with(eq(tx_hash), eq(1usize))
            .times(1)
            .returning(|_, _| Ok(TransactionReceipt::default()));

        let outcome = AllowanceManager::new(1)
            .ensure_allowance(&client, token(), spender(), amount)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AllowanceOutcome::Approved {
                tx_hash,
                confirmed: true
            }
        );
    }

    #[tokio::test]
    async fn test_confirmation_failure_is_swallowed() {
        let tx_hash = H256::repeat_byte(0xcd);

        let mut client = MockChainClient::new();
        client.expect_address().return_const(owner());
        client
            .expect_allowance()
            .returning(|_, _, _| Ok(U256::from(1)));
        client
            .expect_gas_price()
            .returning(|| Ok(U256::from(1_000_000_000u64)));
        client
            .expect_send_transaction()
            .times(1)
            .returning(move |_| Ok(tx_hash));
        client.expect_wait_for_confirmation().returning(|hash, _| {
            Err(SwapError::TransactionReverted {
                tx_hash: format!("{:?}", hash),
            })
        });

        let outcome = AllowanceManager::default()
            .ensure_allowance(&client, token(), spender(), one_token())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AllowanceOutcome::Approved {
                tx_hash,
                confirmed: false
            }
        );
    }

    #[tokio::test]
    async fn test_allowance_read_failure_propagates() {
        let mut client = MockChainClient::new();
        client.expect_address().return_const(owner());
        client
            .expect_allowance()
            .returning(|_, _, _| Err(SwapError::Contract("execution reverted".into())));
        client.expect_send_transaction().never();

        let result = AllowanceManager::default()
            .ensure_allowance(&client, token(), spender(), one_token())
            .await;

        assert!(matches!(result, Err(SwapError::Contract(_))));
    }
}
