//! Error kinds produced by the handshake state machine (spec §7).

/// Everything that can go wrong while driving a Noise handshake or transport
/// cipher state. All variants are fatal to the state in which they occur;
/// there is no partial rollback or internal retry.
#[derive(thiserror::Error, Debug)]
pub enum NoiseError {
    /// AEAD tag mismatch during `DecryptAndHash`/`DecryptWithAd`. The
    /// `CipherState`'s nonce is left unchanged so the embedder can fall back
    /// to a different pattern (see the `fallback` modifier).
    #[error("decryption failed: AEAD tag mismatch")]
    DecryptFailed,

    /// The wire message was too short or too long for the token currently
    /// being processed.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The 64-bit nonce counter would overflow on the next AEAD operation.
    #[error("nonce exhausted: counter reached 2^64-1")]
    NonceExhausted,

    /// Missing required key material, wrong PSK count, an unknown DH/cipher
    /// /hash/pattern/modifier name, or a write/read call issued when no
    /// message remains in the handshake program.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, NoiseError>;
