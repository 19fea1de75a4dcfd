//! `SymmetricState`: running hash transcript + key schedule (spec §4.2).

use std::sync::Arc;

use crate::cipherstate::CipherState;
use crate::error::Result;
use crate::primitives::{AeadAlgorithm, HashAlgorithm};

/// Owns a `CipherState` and the chaining key / transcript hash. Every mix
/// operation updates `ck` and/or `h`; `Split` consumes the chaining key to
/// derive the pair of transport `CipherState`s.
pub struct SymmetricState {
    hash: Arc<dyn HashAlgorithm>,
    ck: Vec<u8>,
    h: Vec<u8>,
    cipher: CipherState,
}

impl SymmetricState {
    /// *InitializeSymmetric(protocol_name)* (spec §4.2).
    pub fn new(hash: Arc<dyn HashAlgorithm>, cipher_alg: Arc<dyn AeadAlgorithm>, protocol_name: &[u8]) -> Self {
        let hashlen = hash.hashlen();
        let h = if protocol_name.len() <= hashlen {
            let mut h = protocol_name.to_vec();
            h.resize(hashlen, 0);
            h
        } else {
            hash.hash(protocol_name)
        };
        let ck = h.clone();
        Self {
            hash,
            ck,
            h,
            cipher: CipherState::new(cipher_alg),
        }
    }

    /// *MixKey(input_key_material)*.
    pub fn mix_key(&mut self, input: &[u8]) {
        let (ck, mut temp_k) = self.hash.hkdf2(&self.ck, input);
        self.ck = ck;
        temp_k.truncate(32);
        let mut key = [0u8; 32];
        key[..temp_k.len()].copy_from_slice(&temp_k);
        self.cipher.initialize_key(key);
    }

    /// *MixHash(data)*.
    pub fn mix_hash(&mut self, data: &[u8]) {
        let mut input = self.h.clone();
        input.extend_from_slice(data);
        self.h = self.hash.hash(&input);
    }

    /// *MixKeyAndHash(input_key_material)*, used only by the `psk` token.
    pub fn mix_key_and_hash(&mut self, input: &[u8]) {
        let (ck, temp_h, mut temp_k) = self.hash.hkdf3(&self.ck, input);
        self.ck = ck;
        self.mix_hash(&temp_h);
        temp_k.truncate(32);
        let mut key = [0u8; 32];
        key[..temp_k.len()].copy_from_slice(&temp_k);
        self.cipher.initialize_key(key);
    }

    /// *GetHandshakeHash()*, usable as a channel-binding token after `Split`.
    pub fn handshake_hash(&self) -> &[u8] {
        &self.h
    }

    /// *EncryptAndHash(plaintext)*.
    pub fn encrypt_and_hash(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let ciphertext = self.cipher.encrypt_with_ad(&self.h, plaintext)?;
        self.mix_hash(&ciphertext);
        Ok(ciphertext)
    }

    /// *DecryptAndHash(ciphertext)*. The ciphertext is mixed into `h`
    /// regardless of whether the cipher key was set; on failure `h` is left
    /// untouched, as it has not yet been mixed (spec §4.2).
    pub fn decrypt_and_hash(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let plaintext = self.cipher.decrypt_with_ad(&self.h, ciphertext)?;
        self.mix_hash(ciphertext);
        Ok(plaintext)
    }

    /// Whether the underlying `CipherState` currently has a key (used by
    /// `HandshakeState` to decide the wire length of the `s` token).
    pub fn has_key(&self) -> bool {
        self.cipher.has_key()
    }

    /// *Split()*: derive two fresh transport `CipherState`s from `ck`.
    pub fn split(&self) -> (CipherState, CipherState) {
        let (mut k1, mut k2) = self.hash.hkdf2(&self.ck, &[]);
        k1.truncate(32);
        k2.truncate(32);
        let mut key1 = [0u8; 32];
        key1[..k1.len()].copy_from_slice(&k1);
        let mut key2 = [0u8; 32];
        key2[..k2.len()].copy_from_slice(&k2);

        let cipher_alg = self.cipher.cipher_algorithm();
        let mut c1 = CipherState::new(Arc::clone(&cipher_alg));
        c1.initialize_key(key1);
        let mut c2 = CipherState::new(cipher_alg);
        c2.initialize_key(key2);
        (c1, c2)
    }
}
