//! AEAD cipher capability records (spec §6 "AEAD cipher contract").

use crate::error::{NoiseError, Result};

/// An AEAD cipher, named per the Noise protocol-name grammar (`AESGCM`,
/// `ChaChaPoly`). Keys are always 32 bytes; tags are always 16 bytes.
pub trait AeadAlgorithm: Send + Sync {
    /// Name as it appears in a protocol string, e.g. `"ChaChaPoly"`.
    fn name(&self) -> &'static str;

    /// Encrypt `plaintext` under `key`/`nonce` with associated data `ad`,
    /// appending a 16-byte tag.
    fn encrypt(&self, key: &[u8; 32], nonce: u64, ad: &[u8], plaintext: &[u8]) -> Vec<u8>;

    /// Decrypt `ciphertext` (tag included) under `key`/`nonce` with
    /// associated data `ad`.
    fn decrypt(&self, key: &[u8; 32], nonce: u64, ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// ChaCha20-Poly1305: little-endian nonce counter in the low 8 bytes of a
/// 12-byte nonce, 4 leading zero bytes (RFC 7539 / Noise §nonce-format).
#[cfg(feature = "chachapoly")]
pub struct ChaChaPoly;

#[cfg(feature = "chachapoly")]
impl AeadAlgorithm for ChaChaPoly {
    fn name(&self) -> &'static str {
        "ChaChaPoly"
    }

    fn encrypt(&self, key: &[u8; 32], nonce: u64, ad: &[u8], plaintext: &[u8]) -> Vec<u8> {
        use chacha20poly1305::{aead::Aead, KeyInit};
        let cipher = chacha20poly1305::ChaCha20Poly1305::new(key.into());
        let mut nonce_bytes = [0u8; 12];
        nonce_bytes[4..].copy_from_slice(&nonce.to_le_bytes());
        cipher
            .encrypt(
                (&nonce_bytes).into(),
                chacha20poly1305::aead::Payload { msg: plaintext, aad: ad },
            )
            // Only out-of-memory or a misconfigured cipher can fail here; the
            // nonce/key are always valid by construction.
            .expect("chacha20poly1305 encryption cannot fail for valid inputs")
    }

    fn decrypt(&self, key: &[u8; 32], nonce: u64, ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        use chacha20poly1305::{aead::Aead, KeyInit};
        let cipher = chacha20poly1305::ChaCha20Poly1305::new(key.into());
        let mut nonce_bytes = [0u8; 12];
        nonce_bytes[4..].copy_from_slice(&nonce.to_le_bytes());
        cipher
            .decrypt(
                (&nonce_bytes).into(),
                chacha20poly1305::aead::Payload { msg: ciphertext, aad: ad },
            )
            .map_err(|_| NoiseError::DecryptFailed)
    }
}

/// AES-256-GCM: big-endian nonce counter in the low 8 bytes of a 12-byte
/// nonce, 4 leading zero bytes.
#[cfg(feature = "aesgcm")]
pub struct AesGcm;

#[cfg(feature = "aesgcm")]
impl AeadAlgorithm for AesGcm {
    fn name(&self) -> &'static str {
        "AESGCM"
    }

    fn encrypt(&self, key: &[u8; 32], nonce: u64, ad: &[u8], plaintext: &[u8]) -> Vec<u8> {
        use aes_gcm::{aead::Aead, KeyInit};
        let cipher = aes_gcm::Aes256Gcm::new(key.into());
        let mut nonce_bytes = [0u8; 12];
        nonce_bytes[4..].copy_from_slice(&nonce.to_be_bytes());
        cipher
            .encrypt(
                (&nonce_bytes).into(),
                aes_gcm::aead::Payload { msg: plaintext, aad: ad },
            )
            .expect("aes-256-gcm encryption cannot fail for valid inputs")
    }

    fn decrypt(&self, key: &[u8; 32], nonce: u64, ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        use aes_gcm::{aead::Aead, KeyInit};
        let cipher = aes_gcm::Aes256Gcm::new(key.into());
        let mut nonce_bytes = [0u8; 12];
        nonce_bytes[4..].copy_from_slice(&nonce.to_be_bytes());
        cipher
            .decrypt(
                (&nonce_bytes).into(),
                aes_gcm::aead::Payload { msg: ciphertext, aad: ad },
            )
            .map_err(|_| NoiseError::DecryptFailed)
    }
}

#[cfg(all(test, feature = "chachapoly"))]
mod tests {
    use super::*;

    #[test]
    fn chachapoly_roundtrip() {
        let cipher = ChaChaPoly;
        let key = [7u8; 32];
        let ct = cipher.encrypt(&key, 0, b"ad", b"hello");
        let pt = cipher.decrypt(&key, 0, b"ad", &ct).unwrap();
        assert_eq!(pt, b"hello");
    }

    #[test]
    fn chachapoly_wrong_ad_fails() {
        let cipher = ChaChaPoly;
        let key = [7u8; 32];
        let ct = cipher.encrypt(&key, 0, b"ad", b"hello");
        assert!(cipher.decrypt(&key, 0, b"other", &ct).is_err());
    }
}
