//! Quote request and response models

use crate::config::SwapConfig;
use crate::error::{SwapError, SwapResult};

use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Parameters of one quote request
#[derive(Debug, Clone, PartialEq)]
pub struct SwapRequest {
    pub from_token_address: Address,
    pub to_token_address: Address,
    pub from_chain_id: u64,
    pub to_chain_id: u64,
    /// Token base units
    pub amount: U256,
    pub user_address: Address,
    pub fee_token_address: Address,
    /// Percent
    pub slippage_tolerance: f64,
}

impl SwapRequest {
    pub fn from_config(config: &SwapConfig, user_address: Address) -> SwapResult<Self> {
        Ok(Self {
            from_token_address: config.from_token_address,
            to_token_address: config.to_token_address,
            from_chain_id: config.from_chain_id,
            to_chain_id: config.to_chain_id,
            amount: config.amount()?,
            user_address,
            fee_token_address: config.fee_token_address,
            slippage_tolerance: config.slippage_tolerance,
        })
    }
}

/// Quote body; only `txn.execution` is interpreted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    #[serde(default)]
    pub txn: Option<QuoteTxn>,
    /// Route, fee and amount details passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteTxn {
    #[serde(default)]
    pub execution: Option<ExecutionTx>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Ready-to-sign transaction returned with a quote
///
/// The numeric fields are kept as raw JSON: the API may send numbers,
/// decimal strings, hex strings or serialized BigNumber objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionTx {
    pub to: Address,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub gas_price: Option<serde_json::Value>,
    #[serde(default)]
    pub gas_limit: Option<serde_json::Value>,
}

impl QuoteResponse {
    /// The executable transaction, or an error if the quote carries none
    pub fn execution(&self) -> SwapResult<&ExecutionTx> {
        self.txn
            .as_ref()
            .ok_or_else(|| SwapError::InvalidQuote("response has no txn".to_string()))?
            .execution
            .as_ref()
            .ok_or_else(|| SwapError::InvalidQuote("response has no txn.execution".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_decodes_execution() {
        let body = json!({
            "destination": { "tokenAmount": "998000" },
            "txn": {
                "execution": {
                    "to": "0x6e14f48576265272B6CAA3A7cC500a26050Be64E",
                    "data": "0xdeadbeef",
                    "value": "0x00",
                    "gasPrice": null
                }
            }
        });

        let quote: QuoteResponse = serde_json::from_value(body).unwrap();
        let execution = quote.execution().unwrap();

        assert_eq!(
            execution.to,
            Address::from_str("0x6e14f48576265272B6CAA3A7cC500a26050Be64E").unwrap()
        );
        assert_eq!(&execution.data[..], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(execution.value, Some(json!("0x00")));
        assert!(execution.gas_price.is_none());
        assert!(execution.gas_limit.is_none());
        assert!(quote.extra.contains_key("destination"));
    }

    #[test]
    fn test_missing_txn_is_invalid_quote() {
        let quote: QuoteResponse = serde_json::from_value(json!({ "error": "no route" })).unwrap();
        assert!(matches!(quote.execution(), Err(SwapError::InvalidQuote(_))));
    }

    #[test]
    fn test_missing_execution_is_invalid_quote() {
        let quote: QuoteResponse = serde_json::from_value(json!({ "txn": {} })).unwrap();
        assert!(matches!(quote.execution(), Err(SwapError::InvalidQuote(_))));
    }
}
