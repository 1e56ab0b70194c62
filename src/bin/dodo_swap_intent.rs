use std::{env, str::FromStr, sync::Arc, time::Duration};

use ethers::{
    providers::{Http, Provider},
    signers::LocalWallet,
    types::{Address, U256},
};
use log::{error, info, warn};
use spiceflow::{
    erc20, prelude::Result, BatchRequest, ChainConfig, ChainReader, DelegationRequest,
    DodoRouteClient, Error, IntentSubmission, PollOptions, RouteRequest,
    RpcChainReader, SpiceFlowClient, SpiceFlowConfig, PHAROS_TESTNET_CHAIN_ID,
};

const DEFAULT_RPC_URL: &str = "https://pharos-fork.spicenet.io/";

// Pharos testnet USDC -> USDT
const FROM_TOKEN: &str = "0x72df0bcd7276f2dfbac900d1ce63c272c4bccced";
const TO_TOKEN: &str = "0xd4071393f8716661958f766df660033b3d35fd29";
const FROM_DECIMALS: u8 = 6;
const TO_DECIMALS: u8 = 6;

fn required_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| Error::Config(format!("missing {key} in env")))
}

async fn check_decimals(provider: Arc<Provider<Http>>, token: Address, expected: u8) -> Result<()> {
    match erc20::read_decimals(provider, token).await {
        Ok(onchain) if onchain != expected => Err(Error::ChainQuery(format!(
            "decimals mismatch for {token:?}: configured {expected}, onchain {onchain}"
        ))),
        Ok(_) => Ok(()),
        Err(e) => {
            warn!("could not read decimals of {token:?}, using configured {expected}: {e}");
            Ok(())
        }
    }
}

async fn run() -> Result<()> {
    let private_key = required_env("YOUR_PK")?;
    if !private_key.starts_with("0x") {
        return Err(Error::PrivateKeyParse(
            "YOUR_PK must be 0x-prefixed".to_string(),
        ));
    }
    let wallet =
        LocalWallet::from_str(&private_key).map_err(|e| Error::Wallet(e.to_string()))?;
    let api_key = required_env("YOUR_API_KEY")?;
    let delegate: Address = required_env("DELEGATE_CONTRACT")?
        .parse()
        .map_err(|e| Error::Config(format!("invalid DELEGATE_CONTRACT: {e}")))?;
    let tx_api_url = required_env("TX_API_URL")?;
    let rpc_url = env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
    let recent_block = env::var("RECENT_BLOCK")
        .ok()
        .map(|block| spiceflow::parse_u256(&block))
        .transpose()?;

    let chain_id = PHAROS_TESTNET_CHAIN_ID;
    let config = SpiceFlowConfig::new(tx_api_url)
        .with_chain(ChainConfig::new(chain_id, rpc_url.clone(), delegate))
        .with_request_timeout(Duration::from_secs(30));

    let reader = Arc::new(RpcChainReader::from_config(&config)?);
    reader.verify_chain_id(chain_id).await?;
    let provider = Arc::new(
        reader
            .provider(chain_id)
            .cloned()
            .ok_or_else(|| Error::Config(format!("no rpc endpoint for chain {chain_id}")))?,
    );

    let client = SpiceFlowClient::new(None, config, Arc::new(wallet), reader.clone());
    let me = client.address();
    info!("wallet: {me:?}");

    let from_token: Address = FROM_TOKEN.parse().map_err(|e| Error::Config(format!("{e}")))?;
    let to_token: Address = TO_TOKEN.parse().map_err(|e| Error::Config(format!("{e}")))?;
    check_decimals(provider.clone(), from_token, FROM_DECIMALS).await?;
    check_decimals(provider.clone(), to_token, TO_DECIMALS).await?;

    // 1 USDC
    let from_amount = U256::from(10u64).pow(U256::from(FROM_DECIMALS));
    let balance = erc20::read_balance(provider.clone(), from_token, me).await?;
    info!("USDC balance: {balance}");
    if balance < from_amount {
        return Err(Error::ChainQuery(format!(
            "insufficient USDC: need {from_amount}, have {balance}"
        )));
    }

    let route = DodoRouteClient::new(None, api_key)
        .get_route(&RouteRequest {
            from_token_address: from_token,
            from_token_decimals: FROM_DECIMALS,
            to_token_address: to_token,
            to_token_decimals: TO_DECIMALS,
            from_amount,
            slippage: 10.0,
            user_addr: me,
            chain_id,
            rpc: rpc_url,
        })
        .await?;
    info!("route: {route:?}");
    // The batch approves before swapping, so a short allowance is only informational.
    let allowance = erc20::read_allowance(provider.clone(), from_token, me, route.spender()).await?;
    info!(
        "current allowance of {:?}: {allowance} (batch approves {from_amount})",
        route.spender()
    );
    let calls = route.swap_calls(from_token, from_amount)?;

    let mut batch = BatchRequest::new(chain_id, calls);
    batch.recent_block = recent_block;
    let prepared = client.build_chain_batches(vec![batch]).await?;

    let pending = reader.account_nonce(me, chain_id).await?;
    let next = pending
        .checked_add(1)
        .ok_or_else(|| Error::NonceLookup(format!("nonce space exhausted after {pending}")))?;
    let authorization = client
        .sign_delegations(&[
            DelegationRequest::new(chain_id, delegate).with_nonce(pending),
            DelegationRequest::new(chain_id, delegate).with_nonce(next),
        ])
        .await?;

    let signature = client.sign_intent(prepared.digest).await?;
    let submission = IntentSubmission::new(
        me,
        from_token,
        from_amount,
        authorization,
        signature,
        prepared.chain_batches,
    );
    let body = serde_json::to_string(&submission).map_err(|e| Error::JsonParse(e.to_string()))?;
    info!(
        "curl -X POST {}/transaction/submit -H \"Content-Type: application/json\" -d '{body}'",
        client.config.tx_api_url
    );

    let response = client.relayer.submit(&submission).await?;
    info!("submitted: intent {} hash {:?}", response.intent_id, response.hash);

    let options = PollOptions {
        timeout: Some(Duration::from_secs(120)),
        ..PollOptions::default()
    };
    let status = client
        .wait_for_step(&response.intent_id, options, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("ctrl-c handler unavailable: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    info!(
        "step 0 finished with {} (transaction {:?})",
        status.status(),
        status.transaction_hash()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    if let Err(e) = run().await {
        error!("dodo swap intent failed: {e}");
        std::process::exit(1);
    }
}
