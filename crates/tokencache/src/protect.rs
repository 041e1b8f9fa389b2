// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Optional protection of blobs at rest.

use std::fmt::Debug;

use tokencache_tier::{CacheBlob, Result};

/// Transforms blobs before they are stored and after they are read.
///
/// A protector typically encrypts. When [`unprotect`](Self::unprotect) fails the
/// provider hands the stored bytes to the token library unchanged, so a cache that
/// was written before protection was enabled keeps working.
pub trait BlobProtector: Send + Sync + Debug {
    /// Transforms a blob about to be stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be protected; the write is then abandoned.
    fn protect(&self, blob: &CacheBlob) -> Result<CacheBlob>;

    /// Reverses [`protect`](Self::protect).
    ///
    /// # Errors
    ///
    /// Returns an error if the blob was not produced by this protector.
    fn unprotect(&self, blob: &CacheBlob) -> Result<CacheBlob>;
}

#[cfg(feature = "encryption")]
pub use aes::AesGcmProtector;

#[cfg(feature = "encryption")]
mod aes {
    use aes_gcm::aead::Aead;
    use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
    use tokencache_tier::{CacheBlob, Error, Result};

    use super::BlobProtector;

    const NONCE_LEN: usize = 12;
    const TAG_LEN: usize = 16;

    /// Encrypts blobs with AES-256-GCM.
    ///
    /// Each blob is stored as a random 96-bit nonce followed by the ciphertext and its
    /// authentication tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokencache::{AesGcmProtector, BlobProtector};
    /// use tokencache_tier::CacheBlob;
    ///
    /// let protector = AesGcmProtector::new(&[7_u8; 32])?;
    /// let sealed = protector.protect(&CacheBlob::from_static(b"tokens"))?;
    /// assert_eq!(protector.unprotect(&sealed)?, CacheBlob::from_static(b"tokens"));
    /// # Ok::<(), tokencache_tier::Error>(())
    /// ```
    pub struct AesGcmProtector {
        cipher: Aes256Gcm,
    }

    impl std::fmt::Debug for AesGcmProtector {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("AesGcmProtector").finish_non_exhaustive()
        }
    }

    impl AesGcmProtector {
        /// Creates a protector from a 256-bit key.
        ///
        /// # Errors
        ///
        /// Returns an error if `key` is not exactly 32 bytes long.
        pub fn new(key: &[u8]) -> Result<Self> {
            let cipher = Aes256Gcm::new_from_slice(key)
                .map_err(|e| Error::permanent(format!("AES-256-GCM key must be 32 bytes: {e}")))?;
            Ok(Self { cipher })
        }
    }

    impl BlobProtector for AesGcmProtector {
        fn protect(&self, blob: &CacheBlob) -> Result<CacheBlob> {
            let mut nonce = [0_u8; NONCE_LEN];
            getrandom::getrandom(&mut nonce).map_err(Error::from_message)?;

            let ciphertext = self
                .cipher
                .encrypt(Nonce::from_slice(&nonce), blob.as_ref())
                .map_err(|e| Error::permanent(format!("encryption failed: {e}")))?;

            let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
            sealed.extend_from_slice(&nonce);
            sealed.extend_from_slice(&ciphertext);
            Ok(CacheBlob::from(sealed))
        }

        fn unprotect(&self, blob: &CacheBlob) -> Result<CacheBlob> {
            if blob.len() < NONCE_LEN + TAG_LEN {
                return Err(Error::permanent("blob is too short to be encrypted"));
            }

            let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
            let plaintext = self
                .cipher
                .decrypt(Nonce::from_slice(nonce), ciphertext)
                .map_err(|e| Error::permanent(format!("decryption failed: {e}")))?;
            Ok(CacheBlob::from(plaintext))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn round_trip() {
            let protector = AesGcmProtector::new(&[1_u8; 32]).unwrap();
            let blob = CacheBlob::from(vec![9_u8; 500]);

            let sealed = protector.protect(&blob).unwrap();

            assert_ne!(sealed, blob);
            assert_eq!(sealed.len(), blob.len() + NONCE_LEN + TAG_LEN);
            assert_eq!(protector.unprotect(&sealed).unwrap(), blob);
        }

        #[test]
        fn nonces_differ_between_writes() {
            let protector = AesGcmProtector::new(&[1_u8; 32]).unwrap();
            let blob = CacheBlob::from_static(b"same");
            assert_ne!(protector.protect(&blob).unwrap(), protector.protect(&blob).unwrap());
        }

        #[test]
        fn wrong_key_fails() {
            let sealed = AesGcmProtector::new(&[1_u8; 32])
                .unwrap()
                .protect(&CacheBlob::from_static(b"secret"))
                .unwrap();
            let other = AesGcmProtector::new(&[2_u8; 32]).unwrap();
            assert!(other.unprotect(&sealed).is_err());
        }

        #[test]
        fn short_key_is_rejected() {
            assert!(AesGcmProtector::new(&[0_u8; 16]).is_err());
        }

        #[test]
        fn plaintext_is_rejected() {
            let protector = AesGcmProtector::new(&[1_u8; 32]).unwrap();
            assert!(protector.unprotect(&CacheBlob::from_static(b"{\"AccessToken\":{}}")).is_err());
        }
    }
}
