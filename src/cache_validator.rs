use sha2::{Digest, Sha256};

/// Integrity envelope for cached payloads.
///
/// Cached risk data lives in a shared store; a sealed value carries a
/// SHA-256 checksum next to the payload so tampered or truncated entries
/// are detected on retrieval and treated as a miss instead of being
/// served. The same digest primitive also derives the content-addressed
/// part of the risk cache key.

/// Hex-encoded SHA-256 digest of arbitrary bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// A cached payload together with its checksum.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SealedCacheValue {
    /// The cached payload (JSON string).
    pub payload: String,
    /// SHA-256 checksum of the payload (hex encoded).
    pub checksum: String,
}

impl SealedCacheValue {
    /// Seals a payload with its computed checksum.
    pub fn seal(payload: String) -> Self {
        let checksum = sha256_hex(payload.as_bytes());
        Self { payload, checksum }
    }

    /// True when the payload still matches its checksum.
    pub fn is_valid(&self) -> bool {
        sha256_hex(self.payload.as_bytes()) == self.checksum
    }

    /// Serialized form for storage in the cache store.
    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Deserializes a stored envelope and returns the payload only if
    /// the checksum holds. `None` means corrupted or unparseable;
    /// callers refetch or recompute.
    pub fn open(serialized: &str) -> Option<String> {
        let sealed: SealedCacheValue = serde_json::from_str(serialized).ok()?;
        if sealed.is_valid() {
            Some(sealed.payload)
        } else {
            tracing::warn!(
                "cache integrity check failed: checksum mismatch (payload length {})",
                sealed.payload.len()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sealed_value_validates() {
        let payload = r#"{"score": 0.42, "indicators": {}}"#.to_string();
        let sealed = SealedCacheValue::seal(payload.clone());

        assert!(sealed.is_valid());
        assert_eq!(sealed.payload, payload);
    }

    #[test]
    fn test_seal_then_open_roundtrip() {
        let payload = r#"{"risk_score": null}"#.to_string();
        let sealed = SealedCacheValue::seal(payload.clone());

        let opened = SealedCacheValue::open(&sealed.serialize());
        assert_eq!(opened, Some(payload));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let sealed = SealedCacheValue::seal(r#"{"score": 0.1}"#.to_string());

        let mut tampered = sealed;
        tampered.payload = r#"{"score": 0.9}"#.to_string();

        assert!(!tampered.is_valid());
    }

    #[test]
    fn test_tampered_envelope_opens_to_none() {
        let sealed = SealedCacheValue::seal(r#"{"score": 0.1}"#.to_string());
        let serialized = sealed.serialize();

        let tampered = serialized.replace("0.1", "0.9");
        assert_eq!(SealedCacheValue::open(&tampered), None);
    }

    #[test]
    fn test_garbage_opens_to_none() {
        assert_eq!(SealedCacheValue::open("not json at all"), None);
    }

    #[test]
    fn test_checksums_are_deterministic() {
        let a = sha256_hex(b"identical content");
        let b = sha256_hex(b"identical content");
        assert_eq!(a, b);
        assert_ne!(a, sha256_hex(b"different content"));
    }
}
