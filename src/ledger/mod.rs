//! Ledger registration of uploaded file identifiers.
//!
//! Writes go through a single signed move-call transaction per file id;
//! reads are zero-gas dev-inspect calls. The client and signer are
//! process-wide resources: constructed once by the embedder, passed in as
//! dependencies, and never recreated per call.

mod client;
mod codec;
mod publisher;
mod signer;

pub use client::{LedgerClient, MoveCall};
pub use codec::decode_string_vector;
pub use publisher::{LedgerPublisher, LedgerRecord, SubmissionState};
pub use signer::LedgerSigner;
