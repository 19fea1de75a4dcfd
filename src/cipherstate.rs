//! `CipherState`: AEAD encryption/decryption with a monotonic nonce (spec §4.1).

use std::sync::Arc;

use zeroize::Zeroize;

use crate::error::{NoiseError, Result};
use crate::primitives::AeadAlgorithm;

/// AEAD encryption/decryption with a monotonically increasing 64-bit nonce
/// and a 32-byte key slot that may be empty or set.
pub struct CipherState {
    cipher: Arc<dyn AeadAlgorithm>,
    key: Option<[u8; 32]>,
    n: u64,
}

impl CipherState {
    /// Construct with an empty key, bound to a concrete AEAD algorithm.
    pub fn new(cipher: Arc<dyn AeadAlgorithm>) -> Self {
        Self { cipher, key: None, n: 0 }
    }

    /// *InitializeKey(k)*: set the key and reset the nonce counter to 0.
    pub fn initialize_key(&mut self, key: [u8; 32]) {
        self.key = Some(key);
        self.n = 0;
    }

    /// *HasKey()*.
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// *SetNonce(n)*: directly set the counter (rekey/test hook).
    pub fn set_nonce(&mut self, n: u64) {
        self.n = n;
    }

    /// Current nonce counter.
    pub fn nonce(&self) -> u64 {
        self.n
    }

    /// The bound AEAD algorithm, cloned out for `SymmetricState::split` to
    /// build fresh sibling `CipherState`s.
    pub fn cipher_algorithm(&self) -> Arc<dyn AeadAlgorithm> {
        Arc::clone(&self.cipher)
    }

    /// *EncryptWithAd(ad, plaintext)*. Returns the plaintext unchanged if no
    /// key is set. Fails with [`NoiseError::NonceExhausted`] if the counter
    /// would overflow.
    pub fn encrypt_with_ad(&mut self, ad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let Some(key) = self.key else {
            return Ok(plaintext.to_vec());
        };
        if self.n == u64::MAX {
            return Err(NoiseError::NonceExhausted);
        }
        let ciphertext = self.cipher.encrypt(&key, self.n, ad, plaintext);
        self.n += 1;
        Ok(ciphertext)
    }

    /// *DecryptWithAd(ad, ciphertext)*. Returns the ciphertext unchanged if
    /// no key is set. On tag mismatch, the nonce is left unchanged so a
    /// fallback caller can re-initialize the state machine (spec §4.1).
    pub fn decrypt_with_ad(&mut self, ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let Some(key) = self.key else {
            return Ok(ciphertext.to_vec());
        };
        if self.n == u64::MAX {
            return Err(NoiseError::NonceExhausted);
        }
        let plaintext = self.cipher.decrypt(&key, self.n, ad, ciphertext)?;
        self.n += 1;
        Ok(plaintext)
    }

    /// *Rekey()*: derive a new key from the current one, leaving `n` alone.
    pub fn rekey(&mut self) {
        let Some(key) = self.key else { return };
        let zeros = [0u8; 32];
        let ciphertext = self.cipher.encrypt(&key, u64::MAX, &[], &zeros);
        let mut new_key = [0u8; 32];
        new_key.copy_from_slice(&ciphertext[..32]);
        self.key = Some(new_key);
    }
}

impl Drop for CipherState {
    fn drop(&mut self) {
        if let Some(mut key) = self.key.take() {
            key.zeroize();
        }
    }
}

#[cfg(all(test, feature = "chachapoly"))]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::primitives::cipher::ChaChaPoly;

    fn cipherstate() -> CipherState {
        let mut cs = CipherState::new(Arc::new(ChaChaPoly));
        cs.initialize_key([1u8; 32]);
        cs
    }

    #[test]
    fn no_key_passes_through() {
        let mut cs = CipherState::new(Arc::new(ChaChaPoly));
        assert!(!cs.has_key());
        let ct = cs.encrypt_with_ad(b"ad", b"plain").unwrap();
        assert_eq!(ct, b"plain");
        assert_eq!(cs.nonce(), 0);
    }

    #[test]
    fn roundtrip_and_nonce_advance() {
        let mut sender = cipherstate();
        let mut receiver = cipherstate();
        let ct = sender.encrypt_with_ad(b"ad", b"hello").unwrap();
        assert_eq!(sender.nonce(), 1);
        let pt = receiver.decrypt_with_ad(b"ad", &ct).unwrap();
        assert_eq!(pt, b"hello");
        assert_eq!(receiver.nonce(), 1);
    }

    #[test]
    fn bitflip_fails_and_does_not_advance_nonce() {
        let mut sender = cipherstate();
        let mut receiver = cipherstate();
        let mut ct = sender.encrypt_with_ad(b"ad", b"hello").unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0x01;
        let err = receiver.decrypt_with_ad(b"ad", &ct).unwrap_err();
        assert!(matches!(err, NoiseError::DecryptFailed));
        assert_eq!(receiver.nonce(), 0);
    }

    #[test]
    fn reordered_messages_fail_to_decrypt() {
        let mut sender = cipherstate();
        let mut receiver = cipherstate();
        let ct0 = sender.encrypt_with_ad(b"", b"first").unwrap();
        let ct1 = sender.encrypt_with_ad(b"", b"second").unwrap();
        // Feed message 1 before message 0: receiver is still at nonce 0.
        let err = receiver.decrypt_with_ad(b"", &ct1).unwrap_err();
        assert!(matches!(err, NoiseError::DecryptFailed));
        // Now reading the correct message at nonce 0 still works.
        let pt0 = receiver.decrypt_with_ad(b"", &ct0).unwrap();
        assert_eq!(pt0, b"first");
    }

    #[test]
    fn nonce_overflow_is_fatal() {
        let mut cs = cipherstate();
        cs.set_nonce(u64::MAX);
        let err = cs.encrypt_with_ad(b"", b"x").unwrap_err();
        assert!(matches!(err, NoiseError::NonceExhausted));
        assert_eq!(cs.nonce(), u64::MAX);
    }

    #[test]
    fn rekey_invalidates_old_key_at_same_nonce() {
        let mut cs = cipherstate();
        cs.rekey();
        let ct = cs.encrypt_with_ad(b"", b"x").unwrap();

        let mut old = cipherstate();
        old.set_nonce(0);
        assert!(old.decrypt_with_ad(b"", &ct).is_err());

        let mut fresh = cipherstate();
        fresh.rekey();
        fresh.set_nonce(0);
        let pt = fresh.decrypt_with_ad(b"", &ct).unwrap();
        assert_eq!(pt, b"x");
    }

    proptest! {
        #[test]
        fn roundtrip_random_ad_and_plaintext(ad in any::<Vec<u8>>(), pt in any::<Vec<u8>>()) {
            let ad = if ad.len() > 256 { &ad[..256] } else { &ad };
            let pt = if pt.len() > 2048 { &pt[..2048] } else { &pt };
            let mut sender = cipherstate();
            let mut receiver = cipherstate();
            let ct = sender.encrypt_with_ad(ad, pt)?;
            let decrypted = receiver.decrypt_with_ad(ad, &ct)?;
            prop_assert_eq!(decrypted, pt);
        }

        #[test]
        fn bitflip_never_decrypts_and_never_advances_nonce(pt in any::<Vec<u8>>(), flip_seed in any::<u8>()) {
            let pt = if pt.len() > 2048 { &pt[..2048] } else { &pt };
            let mut sender = cipherstate();
            let mut receiver = cipherstate();
            let mut ct = sender.encrypt_with_ad(b"ad", pt)?;
            let flip_at = (flip_seed as usize) % ct.len();
            ct[flip_at] ^= 0x01;
            let before = receiver.nonce();
            let result = receiver.decrypt_with_ad(b"ad", &ct);
            prop_assert!(result.is_err());
            prop_assert_eq!(receiver.nonce(), before);
        }
    }
}
