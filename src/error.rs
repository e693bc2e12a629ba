//! Error types for pathfinder-swap

use thiserror::Error;

/// Main error type for a swap run
#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Quote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Quote endpoint returned status {status}: {body}")]
    QuoteStatus { status: u16, body: String },

    #[error("Invalid quote: {0}")]
    InvalidQuote(String),

    #[error("Chain connection error for chain {chain_id}: {message}")]
    ChainConnection { chain_id: u64, message: String },

    #[error("RPC endpoint reports chain {actual}, configured chain is {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Gas estimation error: {0}")]
    GasEstimation(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Transaction {tx_hash} was dropped before confirmation")]
    TransactionDropped { tx_hash: String },

    #[error("Transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SwapError {
    /// Errors raised by setup, quoting or chain reads, which never broadcast anything themselves
    pub fn is_fatal_before_chain(&self) -> bool {
        matches!(
            self,
            SwapError::Config(_)
                | SwapError::Http(_)
                | SwapError::QuoteStatus { .. }
                | SwapError::InvalidQuote(_)
                | SwapError::ChainMismatch { .. }
                | SwapError::Wallet(_)
                | SwapError::Contract(_)
                | SwapError::GasEstimation(_)
        )
    }
}

/// Result type for swap operations
pub type SwapResult<T> = Result<T, SwapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_errors_fail_before_chain() {
        assert!(SwapError::InvalidQuote("missing txn".into()).is_fatal_before_chain());
        assert!(SwapError::QuoteStatus {
            status: 500,
            body: String::new()
        }
        .is_fatal_before_chain());
        assert!(SwapError::Contract("allowance() reverted".into()).is_fatal_before_chain());
        assert!(SwapError::GasEstimation("eth_gasPrice timed out".into()).is_fatal_before_chain());
        assert!(!SwapError::Transaction("nonce too low".into()).is_fatal_before_chain());
        assert!(!SwapError::TransactionReverted {
            tx_hash: "0x01".into()
        }
        .is_fatal_before_chain());
    }
}
