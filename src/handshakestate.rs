//! `HandshakeState`: drives one handshake message per call by interpreting
//! the pattern's token program (spec §4.3).

use std::collections::VecDeque;
use std::sync::Arc;

use rand_core::RngCore;

use crate::cipherstate::CipherState;
use crate::error::{NoiseError, Result};
use crate::pattern::{HandshakePattern, Token};
use crate::primitives::dh::{DhAlgorithm, KeyPair, PublicKey};
use crate::primitives::{AeadAlgorithm, HashAlgorithm};
use crate::symmetricstate::SymmetricState;

/// Local/remote key material and PSKs supplied to [`HandshakeState::initialize`].
#[derive(Default)]
pub struct HandshakeKeys {
    /// Local static keypair, required if the pattern's pre-message or any
    /// message token references `s` for the local role.
    pub s: Option<KeyPair>,
    /// Local ephemeral keypair. Normally generated by `write_message`'s `e`
    /// token; supplied externally only when re-initializing after a
    /// `fallback` (spec §4.3).
    pub e: Option<KeyPair>,
    /// Remote static public key.
    pub rs: Option<PublicKey>,
    /// Remote ephemeral public key, supplied externally by a responder
    /// re-initializing after a `fallback`.
    pub re: Option<PublicKey>,
    /// Pre-shared keys, consumed in order as `psk` tokens are processed.
    pub psks: Vec<[u8; 32]>,
}

/// Owns a `SymmetricState`, a DH binding, held key material, the PSK queue,
/// and the remaining message token program.
pub struct HandshakeState {
    symmetric: SymmetricState,
    dh: Arc<dyn DhAlgorithm>,
    initiator: bool,
    s: Option<KeyPair>,
    e: Option<KeyPair>,
    rs: Option<PublicKey>,
    re: Option<PublicKey>,
    psks: VecDeque<[u8; 32]>,
    messages: VecDeque<Vec<Token>>,
}

/// Result of the final `write_message`/`read_message` call of a handshake:
/// the pair of transport cipher states, initiator-order (`(send, recv)`).
pub struct TransportCiphers {
    /// CipherState for messages sent by this role.
    pub sending: CipherState,
    /// CipherState for messages received by this role.
    pub receiving: CipherState,
}

impl HandshakeState {
    /// *Initialize(pattern, initiator, prologue, s?, e?, rs?, re?, psks?)*
    /// (spec §4.3). Builds the protocol name from `pattern`/`dh`/`cipher`
    /// /`hash`, mixes the prologue, validates and mixes pre-message keys,
    /// and enqueues the PSK queue and message token program.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        pattern: HandshakePattern,
        dh: Arc<dyn DhAlgorithm>,
        cipher: Arc<dyn AeadAlgorithm>,
        hash: Arc<dyn HashAlgorithm>,
        initiator: bool,
        prologue: &[u8],
        keys: HandshakeKeys,
    ) -> Result<Self> {
        let protocol_name = format!(
            "Noise_{}_{}_{}_{}",
            pattern.full_name(),
            dh.name(),
            cipher.name(),
            hash.name()
        );
        let mut symmetric = SymmetricState::new(hash, cipher, protocol_name.as_bytes());
        symmetric.mix_hash(prologue);

        let HandshakeKeys { s, e, rs, re, psks } = keys;

        let local_pre = pattern.pre_message_tokens(initiator);
        for token in &local_pre {
            match token {
                Token::S => {
                    let key = s.as_ref().ok_or_else(|| {
                        NoiseError::Configuration("pattern requires a local static key".into())
                    })?;
                    symmetric.mix_hash(key.public.as_bytes());
                }
                Token::E => {
                    let key = e.as_ref().ok_or_else(|| {
                        NoiseError::Configuration("pattern requires a local ephemeral key".into())
                    })?;
                    symmetric.mix_hash(key.public.as_bytes());
                }
                _ => unreachable!("pre-message tokens are only e/s"),
            }
        }

        let remote_pre = pattern.pre_message_tokens(!initiator);
        for token in &remote_pre {
            match token {
                Token::S => {
                    let key = rs.as_ref().ok_or_else(|| {
                        NoiseError::Configuration("pattern requires a remote static key".into())
                    })?;
                    symmetric.mix_hash(key.as_bytes());
                }
                Token::E => {
                    let key = re.as_ref().ok_or_else(|| {
                        NoiseError::Configuration("pattern requires a remote ephemeral key".into())
                    })?;
                    symmetric.mix_hash(key.as_bytes());
                }
                _ => unreachable!("pre-message tokens are only e/s"),
            }
        }

        let psk_token_count: usize = pattern
            .messages
            .iter()
            .map(|m| m.iter().filter(|t| **t == Token::Psk).count())
            .sum();
        if psk_token_count != psks.len() {
            return Err(NoiseError::Configuration(format!(
                "pattern has {psk_token_count} psk tokens but {} keys were supplied",
                psks.len()
            )));
        }

        tracing::debug!(protocol = %protocol_name, initiator, "handshake state initialized");

        Ok(Self {
            symmetric,
            dh,
            initiator,
            s,
            e,
            rs,
            re,
            psks: psks.into(),
            messages: pattern.messages.into(),
        })
    }

    /// The protocol's handshake hash so far; stable as a channel-binding
    /// token once the handshake has completed.
    pub fn handshake_hash(&self) -> &[u8] {
        self.symmetric.handshake_hash()
    }

    /// Remote ephemeral public key, once received. Used to seed a
    /// responder's fallback re-initialization.
    pub fn remote_ephemeral(&self) -> Option<&PublicKey> {
        self.re.as_ref()
    }

    /// Local ephemeral keypair, once generated. Used to seed an
    /// initiator's fallback re-initialization.
    pub fn local_ephemeral(&self) -> Option<&KeyPair> {
        self.e.as_ref()
    }

    fn dh_mix(&mut self, local_s: bool, remote_s: bool) -> Result<()> {
        let local = if local_s {
            self.s.as_ref()
        } else {
            self.e.as_ref()
        }
        .ok_or_else(|| NoiseError::Configuration("missing local key for dh token".into()))?;
        let remote = if remote_s {
            self.rs.as_ref()
        } else {
            self.re.as_ref()
        }
        .ok_or_else(|| NoiseError::Configuration("missing remote key for dh token".into()))?;
        let shared = self.dh.dh(local, remote)?;
        self.symmetric.mix_key(&shared);
        Ok(())
    }

    /// *WriteMessage(payload, out_buffer)* (spec §4.3). Returns the
    /// transport cipher states once the token program is exhausted.
    pub fn write_message(
        &mut self,
        payload: &[u8],
        rng: &mut dyn RngCore,
    ) -> Result<(Vec<u8>, Option<TransportCiphers>)> {
        let tokens = self
            .messages
            .pop_front()
            .ok_or_else(|| NoiseError::Configuration("no message remains in the handshake pattern".into()))?;

        let has_psk = tokens.contains(&Token::Psk);
        let mut out = Vec::new();

        for token in &tokens {
            match token {
                Token::E => {
                    if self.e.is_none() {
                        self.e = Some(self.dh.generate_keypair(rng));
                    }
                    let public = self.e.as_ref().expect("just ensured").public.clone();
                    out.extend_from_slice(public.as_bytes());
                    self.symmetric.mix_hash(public.as_bytes());
                    if has_psk {
                        self.symmetric.mix_key(public.as_bytes());
                    }
                }
                Token::S => {
                    let public = self
                        .s
                        .as_ref()
                        .ok_or_else(|| NoiseError::Configuration("pattern requires a local static key".into()))?
                        .public
                        .clone();
                    out.extend_from_slice(&self.symmetric.encrypt_and_hash(public.as_bytes())?);
                }
                Token::Ee => self.dh_mix(false, false)?,
                Token::Es => self.dh_mix(!self.initiator, self.initiator)?,
                Token::Se => self.dh_mix(self.initiator, !self.initiator)?,
                Token::Ss => self.dh_mix(true, true)?,
                Token::Psk => {
                    let psk = self
                        .psks
                        .pop_front()
                        .ok_or_else(|| NoiseError::Configuration("no psk left in queue".into()))?;
                    self.symmetric.mix_key_and_hash(&psk);
                }
            }
        }

        out.extend_from_slice(&self.symmetric.encrypt_and_hash(payload)?);

        tracing::trace!(tokens = ?tokens, "wrote handshake message");

        if self.messages.is_empty() {
            Ok((out, Some(self.split())))
        } else {
            Ok((out, None))
        }
    }

    /// *ReadMessage(message, payload_buffer)* (spec §4.3). Returns the
    /// transport cipher states once the token program is exhausted.
    pub fn read_message(&mut self, message: &[u8]) -> Result<(Vec<u8>, Option<TransportCiphers>)> {
        let tokens = self
            .messages
            .pop_front()
            .ok_or_else(|| NoiseError::Configuration("no message remains in the handshake pattern".into()))?;

        let has_psk = tokens.contains(&Token::Psk);
        let mut cursor = message;
        let dhlen = self.dh.dhlen();

        for token in &tokens {
            match token {
                Token::E => {
                    if cursor.len() < dhlen {
                        return Err(NoiseError::MalformedMessage("message too short for e token".into()));
                    }
                    let (e_bytes, rest) = cursor.split_at(dhlen);
                    cursor = rest;
                    let public = crate::primitives::dh::PublicKey::from_bytes(e_bytes);
                    self.symmetric.mix_hash(public.as_bytes());
                    if has_psk {
                        self.symmetric.mix_key(public.as_bytes());
                    }
                    self.re = Some(public);
                }
                Token::S => {
                    let field_len = if self.symmetric.has_key() { dhlen + 16 } else { dhlen };
                    if cursor.len() < field_len {
                        return Err(NoiseError::MalformedMessage("message too short for s token".into()));
                    }
                    let (s_bytes, rest) = cursor.split_at(field_len);
                    cursor = rest;
                    let decrypted = self.symmetric.decrypt_and_hash(s_bytes)?;
                    self.rs = Some(crate::primitives::dh::PublicKey::from_bytes(&decrypted));
                }
                Token::Ee => self.dh_mix(false, false)?,
                Token::Es => self.dh_mix(!self.initiator, self.initiator)?,
                Token::Se => self.dh_mix(self.initiator, !self.initiator)?,
                Token::Ss => self.dh_mix(true, true)?,
                Token::Psk => {
                    let psk = self
                        .psks
                        .pop_front()
                        .ok_or_else(|| NoiseError::Configuration("no psk left in queue".into()))?;
                    self.symmetric.mix_key_and_hash(&psk);
                }
            }
        }

        let payload = self.symmetric.decrypt_and_hash(cursor).inspect_err(|_| {
            tracing::warn!("handshake message failed to decrypt");
        })?;

        if self.messages.is_empty() {
            Ok((payload, Some(self.split())))
        } else {
            Ok((payload, None))
        }
    }

    fn split(&mut self) -> TransportCiphers {
        let (c1, c2) = self.symmetric.split();
        if self.initiator {
            TransportCiphers { sending: c1, receiving: c2 }
        } else {
            TransportCiphers { sending: c2, receiving: c1 }
        }
    }
}
