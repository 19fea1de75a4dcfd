//! An implementation of the [Noise Protocol Framework](https://noiseprotocol.org/noise.html):
//! a family of cryptographic handshake protocols built from a Diffie-Hellman
//! key agreement, an AEAD cipher, and a cryptographic hash.
//!
//! Four components, composed leaf-first:
//!
//! - [`cipherstate::CipherState`]: AEAD encryption/decryption with a
//!   monotonic 64-bit nonce.
//! - [`symmetricstate::SymmetricState`]: the running transcript hash and
//!   key schedule, owning a `CipherState`.
//! - [`handshakestate::HandshakeState`]: interprets a pattern's token
//!   program to drive one handshake message per call, owning a
//!   `SymmetricState`.
//! - [`pattern`]: the pattern library (`N`, `K`, `X`, and the twelve
//!   interactive patterns) plus the `pskN`/`fallback` modifiers.
//!
//! [`params::NoiseParams`] is the protocol-name factory: given a string like
//! `"Noise_XX_25519_AESGCM_SHA256"` it resolves a [`pattern::HandshakePattern`]
//! and concrete DH/cipher/hash implementations from [`primitives`].
//!
//! Concrete AEAD/DH/hash implementations, network transport, framing, replay
//! windows, and long-term key storage are out of scope; see each module's
//! documentation for exactly what it owns.
#![forbid(unsafe_code)]

pub mod cipherstate;
pub mod error;
pub mod handshakestate;
pub mod params;
pub mod pattern;
pub mod primitives;
pub mod symmetricstate;

pub use error::{NoiseError, Result};
pub use handshakestate::{HandshakeKeys, HandshakeState, TransportCiphers};
pub use params::NoiseParams;
pub use pattern::HandshakePattern;
