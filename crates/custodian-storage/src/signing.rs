//! HMAC-signed download links.
//!
//! Signature = hex(HMAC-SHA256(secret, "<key>:<expires>")), where `expires` is
//! a unix timestamp in seconds.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::traits::{StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct UrlSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// Key the signer. An empty secret is rejected.
    pub fn new(secret: impl AsRef<[u8]>) -> StorageResult<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(StorageError::ConfigError(
                "Download link secret must not be empty".to_string(),
            ));
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|e| {
            StorageError::ConfigError(format!("Invalid download link secret: {}", e))
        })?;
        Ok(Self { mac })
    }

    fn mac(&self, key: &str, expires: i64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(key.as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        mac
    }

    pub fn sign(&self, key: &str, expires: i64) -> String {
        hex::encode(self.mac(key, expires).finalize().into_bytes())
    }

    /// Check a signature for `key` and reject links whose expiry is before `now`.
    pub fn verify(&self, key: &str, expires: i64, signature: &str, now: i64) -> StorageResult<()> {
        let tag = hex::decode(signature)
            .map_err(|_| StorageError::InvalidSignature("malformed signature".to_string()))?;
        self.mac(key, expires)
            .verify_slice(&tag)
            .map_err(|_| StorageError::InvalidSignature("signature mismatch".to_string()))?;
        if now > expires {
            return Err(StorageError::InvalidSignature("link has expired".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn signature_verifies_before_expiry() {
        let signer = UrlSigner::new(SECRET).unwrap();
        let sig = signer.sign("abc123", 1_000);
        assert_eq!(sig.len(), 64);
        assert!(signer.verify("abc123", 1_000, &sig, 999).is_ok());
        assert!(signer.verify("abc123", 1_000, &sig, 1_000).is_ok());
    }

    #[test]
    fn expired_link_is_rejected() {
        let signer = UrlSigner::new(SECRET).unwrap();
        let sig = signer.sign("abc123", 1_000);
        let err = signer.verify("abc123", 1_000, &sig, 1_001).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn tampered_key_or_expiry_is_rejected() {
        let signer = UrlSigner::new(SECRET).unwrap();
        let sig = signer.sign("abc123", 1_000);
        assert!(signer.verify("abc124", 1_000, &sig, 0).is_err());
        assert!(signer.verify("abc123", 2_000, &sig, 0).is_err());
        assert!(signer.verify("abc123", 1_000, "not-hex", 0).is_err());
    }

    #[test]
    fn different_secrets_produce_different_signatures() {
        let a = UrlSigner::new(SECRET).unwrap().sign("abc123", 1_000);
        let b = UrlSigner::new(b"another-secret").unwrap().sign("abc123", 1_000);
        assert_ne!(a, b);
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        let err = UrlSigner::new(b"").unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
    }
}
