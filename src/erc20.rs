use std::sync::Arc;

use ethers::{
    abi::AbiEncode,
    contract::abigen,
    providers::Middleware,
    types::{Address, U256},
};

use crate::{intent::Call, prelude::*, Error};

abigen!(
    Erc20,
    r#"[
        function approve(address spender, uint256 amount) external returns (bool)
        function allowance(address owner, address spender) external view returns (uint256)
        function balanceOf(address account) external view returns (uint256)
        function decimals() external view returns (uint8)
    ]"#,
);

/// `token.approve(spender, amount)` as a batch call.
pub fn approve_call(token: Address, spender: Address, amount: U256) -> Call {
    Call::new(token, U256::zero(), ApproveCall { spender, amount }.encode())
}

pub async fn read_decimals<M: Middleware + 'static>(client: Arc<M>, token: Address) -> Result<u8> {
    Erc20::new(token, client)
        .decimals()
        .call()
        .await
        .map_err(|e| Error::ChainQuery(format!("decimals of {token:?}: {e}")))
}

pub async fn read_balance<M: Middleware + 'static>(
    client: Arc<M>,
    token: Address,
    owner: Address,
) -> Result<U256> {
    Erc20::new(token, client)
        .balance_of(owner)
        .call()
        .await
        .map_err(|e| Error::ChainQuery(format!("balance of {owner:?} in {token:?}: {e}")))
}

pub async fn read_allowance<M: Middleware + 'static>(
    client: Arc<M>,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256> {
    Erc20::new(token, client)
        .allowance(owner, spender)
        .call()
        .await
        .map_err(|e| Error::ChainQuery(format!("allowance of {spender:?} in {token:?}: {e}")))
}
