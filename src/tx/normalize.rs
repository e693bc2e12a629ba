//! Turns the quote's embedded transaction into a fully specified one

use super::GasPolicy;
use crate::chain::ChainClient;
use crate::error::{SwapError, SwapResult};
use crate::quote::ExecutionTx;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use serde_json::Value;

/// Swap transaction with every gas field resolved
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTransaction {
    pub to: Address,
    pub data: Bytes,
    pub value: Option<U256>,
    pub gas_price: U256,
    pub gas_limit: U256,
}

impl NormalizedTransaction {
    /// Legacy transaction request sent from `from`
    ///
    /// Quantities are serialized as 0x-prefixed hex on the wire.
    pub fn into_typed(self, from: Address) -> TypedTransaction {
        let mut tx = TransactionRequest::new()
            .from(from)
            .to(self.to)
            .data(self.data)
            .gas(self.gas_limit)
            .gas_price(self.gas_price);

        if let Some(value) = self.value {
            tx = tx.value(value);
        }

        tx.into()
    }
}

/// Decode a numeric quote field
///
/// Accepts JSON integers, decimal strings, 0x hex strings and
/// `{"type": "BigNumber", "hex": "0x.."}` objects. `null` and empty strings
/// are absent.
pub fn parse_quantity(field: &str, raw: Option<&Value>) -> SwapResult<Option<U256>> {
    let invalid = |detail: String| SwapError::InvalidQuote(format!("{}: {}", field, detail));

    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|v| Some(U256::from(v)))
            .ok_or_else(|| invalid(format!("{} is not an unsigned integer", n))),
        Some(Value::String(s)) => parse_quantity_str(s.trim()).map_err(invalid),
        Some(Value::Object(obj)) => match obj.get("hex") {
            Some(Value::String(hex)) if hex.starts_with("0x") || hex.starts_with("0X") => {
                parse_quantity_str(hex.trim()).map_err(invalid)
            }
            _ => Err(invalid("object without a hex quantity".to_string())),
        },
        Some(other) => Err(invalid(format!("unsupported value {}", other))),
    }
}

fn parse_quantity_str(s: &str) -> Result<Option<U256>, String> {
    if s.is_empty() {
        return Ok(None);
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() {
            return Ok(Some(U256::zero()));
        }
        return U256::from_str_radix(hex, 16)
            .map(Some)
            .map_err(|e| format!("invalid hex quantity {:?}: {:?}", s, e));
    }

    U256::from_dec_str(s)
        .map(Some)
        .map_err(|e| format!("invalid decimal quantity {:?}: {:?}", s, e))
}

/// Resolve gas price, value and gas limit of a quoted transaction
pub async fn normalize_execution<C>(
    execution: &ExecutionTx,
    client: &C,
    gas: &GasPolicy,
) -> SwapResult<NormalizedTransaction>
where
    C: ChainClient + ?Sized,
{
    let quoted_price = parse_quantity("gasPrice", execution.gas_price.as_ref())?;
    let value = parse_quantity("value", execution.value.as_ref())?;
    let quoted_limit = parse_quantity("gasLimit", execution.gas_limit.as_ref())?;

    let gas_price = gas.resolve_gas_price(client, quoted_price).await?;
    let gas_limit = gas.resolve_gas_limit(quoted_limit);

    Ok(NormalizedTransaction {
        to: execution.to,
        data: execution.data.clone(),
        value,
        gas_price,
        gas_limit,
    })
}
