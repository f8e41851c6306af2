//! Transaction signer bound to a fixed address.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use reelvault_common::LedgerError;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs ledger transactions with a fixed keypair.
///
/// A process-wide resource: created once at startup, shared by reference,
/// and never recreated per call.
pub struct LedgerSigner {
    address: String,
    secret: Vec<u8>,
}

impl LedgerSigner {
    /// Build a signer from the configured address and hex-encoded secret.
    pub fn from_hex(address: impl Into<String>, secret_hex: &str) -> Result<Self, LedgerError> {
        let secret = hex::decode(secret_hex)
            .map_err(|e| LedgerError::Submission(format!("invalid signing secret: {}", e)))?;
        if secret.is_empty() {
            return Err(LedgerError::Submission("signing secret is empty".into()));
        }
        Ok(Self {
            address: address.into(),
            secret,
        })
    }

    /// Address the signer is bound to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Sign a canonical payload, returning a base64 signature.
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload);
        STANDARD.encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0xa6ffff483e4908b17f550649b353e6e2bed34f3d575f748d1a0408253c2b9154";

    #[test]
    fn test_signature_is_deterministic() {
        let signer = LedgerSigner::from_hex(ADDRESS, "a1b2c3d4").unwrap();
        assert_eq!(signer.sign(b"payload"), signer.sign(b"payload"));
        assert_ne!(signer.sign(b"payload"), signer.sign(b"other"));
    }

    #[test]
    fn test_different_keys_sign_differently() {
        let a = LedgerSigner::from_hex(ADDRESS, "a1b2c3d4").unwrap();
        let b = LedgerSigner::from_hex(ADDRESS, "d4c3b2a1").unwrap();
        assert_ne!(a.sign(b"payload"), b.sign(b"payload"));
    }

    #[test]
    fn test_rejects_bad_secret() {
        assert!(LedgerSigner::from_hex(ADDRESS, "not-hex").is_err());
        assert!(LedgerSigner::from_hex(ADDRESS, "").is_err());
    }
}
