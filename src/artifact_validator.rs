use hex;
use sha2::{Digest, Sha256};

/// Validates persisted model artifacts using SHA-256 checksums
///
/// This module protects the prediction path from corrupted artifacts by:
/// 1. Generating a checksum when an artifact is persisted
/// 2. Validating the checksum when the artifact is loaded
/// 3. Rejecting corrupted or truncated blobs
///
/// A rejected artifact is treated exactly like a missing one: the engine logs
/// the failure and falls back to deterministic scoring.

/// Wrapper for a persisted artifact payload with integrity validation
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidatedArtifactEnvelope {
    /// The serialized artifact (JSON string)
    pub payload: String,
    /// SHA-256 checksum of the payload (hex encoded)
    pub checksum: String,
}

impl ValidatedArtifactEnvelope {
    /// Creates a new envelope with a computed checksum
    pub fn new(payload: String) -> Self {
        let checksum = Self::compute_checksum(&payload);
        Self { payload, checksum }
    }

    /// Computes SHA-256 checksum of the payload
    fn compute_checksum(payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Validates the integrity of the payload
    ///
    /// Returns true if the checksum matches, false if corrupted
    pub fn is_valid(&self) -> bool {
        let computed = Self::compute_checksum(&self.payload);
        computed == self.checksum
    }

    /// Serializes the envelope for persistence
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Deserializes and validates an envelope
    ///
    /// Returns `Some(payload)` if valid, `None` if the blob is corrupted or
    /// not an envelope at all.
    pub fn from_bytes_validated(bytes: &[u8]) -> Option<String> {
        let envelope: ValidatedArtifactEnvelope = serde_json::from_slice(bytes).ok()?;

        if envelope.is_valid() {
            Some(envelope.payload)
        } else {
            // Checksum mismatch - artifact corrupted on disk
            tracing::warn!(
                "Artifact validation failed: checksum mismatch. Expected: {}, Payload length: {}",
                envelope.checksum,
                envelope.payload.len()
            );
            None
        }
    }
}
