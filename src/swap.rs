//! Swap executor: quote, allowance, normalization and submission in one pass

use crate::allowance::{AllowanceManager, AllowanceOutcome};
use crate::chain::ChainClient;
use crate::config::{ApprovalOrdering, ExecutionConfig};
use crate::error::{SwapError, SwapResult};
use crate::quote::{ExecutionTx, QuoteSource, SwapRequest};
use crate::tx::{normalize_execution, GasPolicy};

use ethers::types::{Address, H256};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// How the approval step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalStatus {
    Completed(AllowanceOutcome),
    /// Only reachable with concurrent ordering; sequential ordering aborts instead
    Failed { reason: String },
}

/// How the swap transaction ended after submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Confirmed { block: Option<u64> },
    Failed { reason: String },
}

/// Summary of one run
#[derive(Debug, Clone)]
pub struct SwapReport {
    /// Contract the quoted transaction calls
    pub execution_target: Address,
    pub approval: ApprovalStatus,
    pub transfer_hash: H256,
    pub transfer: TransferStatus,
}

impl SwapReport {
    pub fn is_confirmed(&self) -> bool {
        matches!(self.transfer, TransferStatus::Confirmed { .. })
    }
}

/// Approval step that may still be running
enum PendingApproval {
    Done(AllowanceOutcome),
    Running(JoinHandle<SwapResult<AllowanceOutcome>>),
}

impl PendingApproval {
    async fn settle(self) -> ApprovalStatus {
        match self {
            PendingApproval::Done(outcome) => ApprovalStatus::Completed(outcome),
            PendingApproval::Running(handle) => match handle.await {
                Ok(Ok(outcome)) => ApprovalStatus::Completed(outcome),
                Ok(Err(e)) => {
                    error!("Concurrent approval failed: {}", e);
                    ApprovalStatus::Failed {
                        reason: e.to_string(),
                    }
                }
                Err(e) => {
                    error!("Concurrent approval task aborted: {}", e);
                    ApprovalStatus::Failed {
                        reason: SwapError::Internal(e.to_string()).to_string(),
                    }
                }
            },
        }
    }
}

/// Runs the quote-to-submission flow once
pub struct SwapExecutor<Q, C> {
    /// Quoting API
    quotes: Q,
    /// Signing chain handle
    client: Arc<C>,
    allowance: AllowanceManager,
    gas: GasPolicy,
    ordering: ApprovalOrdering,
    /// Confirmations to wait for on the swap transaction
    confirmations: usize,
}

impl<Q, C> SwapExecutor<Q, C>
where
    Q: QuoteSource,
    C: ChainClient + 'static,
{
    pub fn new(quotes: Q, client: Arc<C>, execution: &ExecutionConfig, confirmations: usize) -> Self {
        Self {
            quotes,
            client,
            allowance: AllowanceManager::new(confirmations),
            gas: GasPolicy::new(execution.default_gas_limit),
            ordering: execution.approval_ordering,
            confirmations,
        }
    }

    /// Fetch a quote for `request`, approve `approval_spender` and send the quoted transaction
    ///
    /// Quote, allowance-read, normalization and submission errors are
    /// returned. A swap transaction that fails to confirm is reported, not
    /// returned as an error.
    pub async fn execute(
        &self,
        request: &SwapRequest,
        approval_spender: Address,
    ) -> SwapResult<SwapReport> {
        let quote = self.quotes.fetch_quote(request).await?;
        let execution = quote.execution()?;
        info!("Quote received, swap transaction targets {:?}", execution.to);

        let pending = self.start_approval(request, approval_spender).await?;

        let transfer = self.submit_transfer(execution).await;
        let approval = pending.settle().await;
        let (transfer_hash, transfer) = transfer?;

        Ok(SwapReport {
            execution_target: execution.to,
            approval,
            transfer_hash,
            transfer,
        })
    }

    async fn start_approval(
        &self,
        request: &SwapRequest,
        spender: Address,
    ) -> SwapResult<PendingApproval> {
        let token = request.from_token_address;
        let amount = request.amount;

        match self.ordering {
            ApprovalOrdering::Sequential => {
                let outcome = self
                    .allowance
                    .ensure_allowance(self.client.as_ref(), token, spender, amount)
                    .await?;
                Ok(PendingApproval::Done(outcome))
            }
            ApprovalOrdering::Concurrent => {
                warn!("Approval runs concurrently; the swap may be sent before it confirms");
                let client = self.client.clone();
                let manager = self.allowance.clone();
                let handle = tokio::spawn(async move {
                    manager
                        .ensure_allowance(client.as_ref(), token, spender, amount)
                        .await
                });
                Ok(PendingApproval::Running(handle))
            }
        }
    }

    async fn submit_transfer(&self, execution: &ExecutionTx) -> SwapResult<(H256, TransferStatus)> {
        let normalized = normalize_execution(execution, self.client.as_ref(), &self.gas).await?;
        debug!(
            "Sending swap: gas_price={} gas_limit={} value={:?}",
            normalized.gas_price, normalized.gas_limit, normalized.value
        );

        let tx = normalized.into_typed(self.client.address());
        let tx_hash = self.client.send_transaction(tx).await?;
        info!("Swap transaction sent: {:?}", tx_hash);

        let status = match self
            .client
            .wait_for_confirmation(tx_hash, self.confirmations)
            .await
        {
            Ok(receipt) => {
                info!("Transaction mined successfully: {:?}", tx_hash);
                TransferStatus::Confirmed {
                    block: receipt.block_number.map(|b| b.as_u64()),
                }
            }
            Err(e) => {
                error!("Transaction {:?} failed with error: {}", tx_hash, e);
                TransferStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        Ok((tx_hash, status))
    }
}
