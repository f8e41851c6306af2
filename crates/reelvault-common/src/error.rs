//! Error taxonomy for the publish pipeline and playback controller.
//!
//! Each component surfaces its own typed error. Compression and playback
//! failures are retried internally up to policy before becoming terminal;
//! upload and ledger failures surface immediately and leave any retry
//! decision to the caller.

/// Failure of the media compression stage.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    /// The input file could not be probed for duration/metadata.
    #[error("Failed to probe input: {0}")]
    Probe(String),

    /// A single transcode attempt failed.
    #[error("Transcode failed: {0}")]
    Transcode(String),

    /// All retry attempts were used up without a successful transcode.
    #[error("Compression exhausted after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    /// The owning pipeline was cancelled mid-compression.
    #[error("Compression cancelled")]
    Cancelled,

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompressionError {
    /// Whether the retry budget was spent.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Failure of the resumable upload stage.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// A zero-byte payload is rejected before any network call.
    #[error("Refusing to upload an empty payload")]
    EmptyPayload,

    /// The transfer failed mid-flight. Not retried by this layer.
    #[error("Upload network failure: {0}")]
    Network(String),

    /// The server rejected the upload outright.
    #[error("Upload rejected by server (status {status}): {message}")]
    ServerRejected { status: u16, message: String },

    /// The create call succeeded but returned no resource location.
    #[error("Upload resource created without a Location header")]
    MissingLocation,

    /// The server reported an offset that contradicts what was sent.
    #[error("Server offset {reported} does not match expected {expected}")]
    OffsetMismatch { expected: u64, reported: u64 },

    /// The owning pipeline was cancelled mid-transfer.
    #[error("Upload cancelled")]
    Cancelled,
}

/// Failure of the ledger registration stage.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The transaction could not be submitted (transport-level failure).
    #[error("Ledger submission failed: {0}")]
    Submission(String),

    /// The transaction was submitted but the ledger reported failure.
    #[error("Ledger rejected transaction: {0}")]
    Confirmation(String),

    /// A ledger response could not be decoded.
    #[error("Ledger response decode error: {0}")]
    Decode(String),
}

/// Failure within a playback session.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// No successful load callback arrived within the timeout window.
    #[error("Media load timed out")]
    LoadTimeout,

    /// The decoder reported a mid-playback error.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The progressive fetch failed.
    #[error("Fetch failed: {0}")]
    Network(String),

    /// The reload retry budget was spent.
    #[error("Playback gave up after {attempts} reload attempts")]
    Exhausted { attempts: u32 },
}

/// Configuration loading or validation failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be parsed as TOML.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// The config parsed but violates an invariant.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Failure of the local file-id store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O operation on the store file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The store file holds something other than a JSON string array.
    #[error("Corrupt store file: {0}")]
    Corrupt(String),
}
