//! ERC-20 bindings for the allowance and approval calls

use ethers::abi::AbiEncode;
use ethers::prelude::abigen;
use ethers::types::{Address, Bytes, U256};

abigen!(
    Erc20,
    r#"[
        function allowance(address owner, address spender) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
    ]"#,
);

/// Calldata for `approve(spender, amount)`
pub fn approve_calldata(spender: Address, amount: U256) -> Bytes {
    ApproveCall { spender, amount }.encode().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_approve_calldata_layout() {
        let spender = Address::from_str("0x6e14f48576265272B6CAA3A7cC500a26050Be64E").unwrap();
        let amount = U256::from_dec_str("1000000000000000000").unwrap();

        let data = approve_calldata(spender, amount);

        // selector + two 32-byte words
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[..4], &[0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(&data[16..36], spender.as_bytes());
        assert_eq!(U256::from_big_endian(&data[36..68]), amount);
    }
}
