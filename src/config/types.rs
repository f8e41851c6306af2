use crate::compress::CompressionSettings;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub compression: CompressionSettings,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Object-store endpoint and vault scoping.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Base URL of the object-store API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key sent with every upload and download request.
    #[serde(default)]
    pub api_key: String,

    /// Vault (bucket) that scopes uploaded media.
    #[serde(default)]
    pub vault_id: String,

    /// Size of each resumable-upload append chunk.
    #[serde(default = "default_upload_chunk_bytes")]
    pub upload_chunk_bytes: usize,

    /// Size of the initial partial-range playback fetch.
    #[serde(default = "default_fetch_probe_bytes")]
    pub fetch_probe_bytes: u64,
}

fn default_api_base() -> String {
    "https://api.tusky.io".to_string()
}
fn default_upload_chunk_bytes() -> usize {
    4 * 1024 * 1024
}
fn default_fetch_probe_bytes() -> u64 {
    64 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: String::new(),
            vault_id: String::new(),
            upload_chunk_bytes: default_upload_chunk_bytes(),
            fetch_probe_bytes: default_fetch_probe_bytes(),
        }
    }
}

/// Ledger node endpoint and the on-chain storage object written to.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// JSON-RPC URL of the ledger fullnode.
    #[serde(default)]
    pub rpc_url: String,

    /// Package holding the `file_storage` module.
    #[serde(default)]
    pub package_id: String,

    /// Storage object whose identifier set is appended to.
    #[serde(default)]
    pub vault_object: String,

    /// Fixed address the signer is bound to.
    #[serde(default)]
    pub sender_address: String,

    /// Hex-encoded signing secret for the fixed keypair.
    #[serde(default)]
    pub signing_secret_hex: String,
}

/// Playback controller tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Window within which a load callback must arrive before a reload.
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Buffered duration required for Ready on a cellular connection.
    #[serde(default = "default_ready_threshold_cellular_ms")]
    pub ready_threshold_cellular_ms: u64,

    /// Buffered duration required for Ready on any faster connection.
    #[serde(default = "default_ready_threshold_default_ms")]
    pub ready_threshold_default_ms: u64,

    /// Reload attempts before a session fails terminally.
    #[serde(default = "default_max_reloads")]
    pub max_reloads: u32,
}

fn default_load_timeout_ms() -> u64 {
    5_000
}
fn default_ready_threshold_cellular_ms() -> u64 {
    4_000
}
fn default_ready_threshold_default_ms() -> u64 {
    2_000
}
fn default_max_reloads() -> u32 {
    3
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: default_load_timeout_ms(),
            ready_threshold_cellular_ms: default_ready_threshold_cellular_ms(),
            ready_threshold_default_ms: default_ready_threshold_default_ms(),
            max_reloads: default_max_reloads(),
        }
    }
}
