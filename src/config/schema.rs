//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML; every field
//! has a default so a minimal file only names the contract and RPC endpoint.

use serde::{Deserialize, Serialize};

/// Root configuration for the contract monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// JSON-RPC connection settings.
    pub blockchain: BlockchainConfig,

    /// The monitored contract and ingestion cadence.
    pub contract: ContractConfig,

    /// Alert wording and deduplication.
    pub monitor: AlertRulesConfig,

    /// Alert delivery.
    pub alerts: AlertSinkConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
        }
    }
}

/// Monitored contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Address of the monitored contract.
    pub address: String,

    /// Minimum seconds between two ledger refreshes; 0 refreshes on every poll.
    pub update_threshold_secs: u64,

    /// Sleep between poll loop iterations, in seconds.
    pub polling_interval_secs: u64,

    /// First block to query (deployment block).
    pub from_block: u64,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            update_threshold_secs: 60,
            polling_interval_secs: 10,
            from_block: 0,
        }
    }
}

/// Whether the monitor remembers which records it already alerted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DedupeMode {
    /// Each record is alerted at most once.
    #[default]
    On,
    /// Every check re-alerts the full snapshot (idempotent downstream).
    Off,
}

/// Alert content configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertRulesConfig {
    /// Seconds between two monitor passes.
    pub check_interval_secs: u64,

    pub dedupe: DedupeMode,

    /// Liquidator bot addresses operated by us.
    pub monitored_liquidators: Vec<String>,

    /// Dispute bot addresses operated by us.
    pub monitored_disputers: Vec<String>,

    /// Block explorer base URL for address and transaction links.
    pub explorer_url: String,

    pub collateral_symbol: String,

    pub synthetic_symbol: String,

    /// Decimals of the collateral and synthetic tokens.
    pub amount_decimals: u8,

    /// Static synthetic price (in collateral units) used for ratios.
    pub price: String,
}

impl Default for AlertRulesConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 15,
            dedupe: DedupeMode::On,
            monitored_liquidators: Vec::new(),
            monitored_disputers: Vec::new(),
            explorer_url: "https://etherscan.io".to_string(),
            collateral_symbol: "DAI".to_string(),
            synthetic_symbol: "UMATEST".to_string(),
            amount_decimals: 18,
            price: "1".to_string(),
        }
    }
}

/// Alert delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertSinkConfig {
    /// Slack-compatible incoming webhook. Alerts are only logged when unset.
    pub webhook_url: Option<String>,

    /// Webhook request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AlertSinkConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            request_timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
