use std::time::Duration;

/// Pharos testnet, the chain the demo intents execute on.
pub const PHAROS_TESTNET_CHAIN_ID: u64 = 688688;

/// Prefix byte of the EIP-7702 authorization signing payload.
pub const EIP7702_AUTH_MAGIC: u8 = 0x05;

pub const DODO_ROUTE_API_URL: &str = "https://api.dodoex.io/route-service/developer/getdodoroute";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(4000);
pub const DEFAULT_STEP_ID: u32 = 0;
