//! Registration of uploaded file identifiers on the ledger.

use super::client::{LedgerClient, MoveCall};
use super::codec::decode_string_vector;
use super::signer::LedgerSigner;
use crate::config::LedgerConfig;
use reelvault_common::{FileId, LedgerError};
use serde_json::{json, Value};
use std::sync::Arc;

/// Submission lifecycle of a ledger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    NotSubmitted,
    Submitted,
    Confirmed,
    Failed(String),
}

/// Registration record for a successfully uploaded file.
///
/// Only ever constructed for a file id derived from a completed upload;
/// the pipeline never fabricates or reorders this dependency.
#[derive(Debug, Clone)]
pub struct LedgerRecord {
    pub file_id: FileId,
    pub submission_state: SubmissionState,
}

impl LedgerRecord {
    pub fn new(file_id: FileId) -> Self {
        Self {
            file_id,
            submission_state: SubmissionState::NotSubmitted,
        }
    }

    pub fn submitted(&mut self) {
        self.submission_state = SubmissionState::Submitted;
    }

    pub fn confirmed(&mut self) {
        self.submission_state = SubmissionState::Confirmed;
    }

    pub fn failed(&mut self, reason: &str) {
        self.submission_state = SubmissionState::Failed(reason.to_string());
    }
}

/// Submits file-id registrations to the on-chain storage object.
pub struct LedgerPublisher {
    client: Arc<LedgerClient>,
    signer: Arc<LedgerSigner>,
    package_id: String,
    vault_object: String,
}

impl LedgerPublisher {
    /// `client` and `signer` are the process-wide resources owned by the
    /// embedder.
    pub fn new(
        client: Arc<LedgerClient>,
        signer: Arc<LedgerSigner>,
        config: &LedgerConfig,
    ) -> Self {
        Self {
            client,
            signer,
            package_id: config.package_id.clone(),
            vault_object: config.vault_object.clone(),
        }
    }

    /// Register `file_id` on the ledger.
    ///
    /// Exactly one transaction is submitted per call. The call is not
    /// idempotent at the protocol level: publishing the same id twice
    /// appends it twice unless the receiving ledger logic deduplicates.
    /// Ambiguous failures are not re-submitted, to avoid duplicate
    /// registration.
    pub async fn publish(&self, file_id: &FileId) -> Result<LedgerRecord, LedgerError> {
        let mut record = LedgerRecord::new(file_id.clone());

        let call = MoveCall::new(
            &self.package_id,
            "file_storage",
            "add_file_id",
            vec![json!(self.vault_object), json!(file_id.as_str())],
        );
        let body = json!({ "sender": self.signer.address(), "call": call });
        let payload = serde_json::to_vec(&body)
            .map_err(|e| LedgerError::Submission(format!("unserializable transaction: {}", e)))?;
        let envelope = json!({
            "sender": self.signer.address(),
            "call": call,
            "signature": self.signer.sign(&payload),
        });

        tracing::info!(file_id = %file_id, "Submitting ledger registration");
        record.submitted();
        let result = self.client.execute_transaction(&envelope).await?;

        let status = result
            .pointer("/status/status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        if status != "success" {
            let reason = result
                .pointer("/status/error")
                .and_then(Value::as_str)
                .unwrap_or("execution status was not success")
                .to_string();
            record.failed(&reason);
            return Err(LedgerError::Confirmation(reason));
        }

        record.confirmed();
        tracing::info!(
            file_id = %file_id,
            digest = result.get("digest").and_then(|v| v.as_str()).unwrap_or(""),
            "Ledger registration confirmed"
        );
        Ok(record)
    }

    /// Fetch the registered file ids from the on-chain storage object.
    ///
    /// A zero-gas dev-inspect call; a response without return values reads
    /// as an empty set.
    pub async fn list_file_ids(&self) -> Result<Vec<FileId>, LedgerError> {
        let call = MoveCall::new(
            &self.package_id,
            "file_storage",
            "get_file_ids",
            vec![json!(self.vault_object)],
        );

        match self.client.dev_inspect(self.signer.address(), &call).await? {
            Some(bytes) => Ok(decode_string_vector(&bytes)?
                .into_iter()
                .map(FileId::from)
                .collect()),
            None => Ok(Vec::new()),
        }
    }
}
