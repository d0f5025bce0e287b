//! Nonce generation for Bitstamp API authentication.
//!
//! Bitstamp v2 authentication expects a 36-character UUID in `X-Auth-Nonce`.
//! A nonce must never repeat inside the server's timestamp window.

use uuid::Uuid;

use crate::error::BitstampError;

/// Trait for providing nonces for authenticated requests.
pub trait NonceProvider: Send + Sync {
    /// Generate the next nonce value.
    ///
    /// Failure means the underlying generator is unusable and is reported as
    /// [`BitstampError::Signing`].
    fn next_nonce(&self) -> Result<Uuid, BitstampError>;
}

/// A nonce provider backed by random (v4) UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonce;

impl RandomNonce {
    /// Create a new random nonce provider.
    pub fn new() -> Self {
        Self
    }
}

impl NonceProvider for RandomNonce {
    fn next_nonce(&self) -> Result<Uuid, BitstampError> {
        let nonce = Uuid::new_v4();
        if nonce.is_nil() {
            return Err(BitstampError::Signing(
                "random source produced a nil nonce".to_string(),
            ));
        }
        Ok(nonce)
    }
}

/// A provider that always returns the same nonce.
///
/// Only useful for reproducing a signature from captured values.
#[derive(Debug, Clone, Copy)]
pub struct FixedNonce(pub Uuid);

impl NonceProvider for FixedNonce {
    fn next_nonce(&self) -> Result<Uuid, BitstampError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_nonce_format() {
        let nonce = RandomNonce::new().next_nonce().unwrap();
        let s = nonce.to_string();
        assert_eq!(s.len(), 36);
        assert_eq!(s, s.to_lowercase());
        assert_eq!(nonce.get_version_num(), 4);
    }

    #[test]
    fn test_nonce_unique_across_threads() {
        let provider = std::sync::Arc::new(RandomNonce::new());
        let mut handles = vec![];

        for _ in 0..4 {
            let p = provider.clone();
            handles.push(thread::spawn(move || {
                let mut nonces = Vec::new();
                for _ in 0..1000 {
                    nonces.push(p.next_nonce().unwrap());
                }
                nonces
            }));
        }

        let mut all_nonces = HashSet::new();
        for handle in handles {
            let nonces = handle.join().unwrap();
            for nonce in nonces {
                assert!(
                    all_nonces.insert(nonce),
                    "Nonce must be unique across threads"
                );
            }
        }
    }

    #[test]
    fn test_fixed_nonce() {
        let nonce = Uuid::from_u128(0x1234);
        let provider = FixedNonce(nonce);
        assert_eq!(provider.next_nonce().unwrap(), nonce);
        assert_eq!(provider.next_nonce().unwrap(), nonce);
    }
}
