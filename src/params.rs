//! The protocol factory: parses a `Noise_<pattern><modifiers>_<dh>_<cipher>_<hash>`
//! name string into a pattern plus concrete DH/cipher/hash instances (spec §4.5).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{NoiseError, Result};
use crate::pattern::{self, HandshakePattern};
use crate::primitives::{AeadAlgorithm, DhAlgorithm, HashAlgorithm};

/// A fully resolved Noise protocol configuration: a pattern (with any
/// modifiers already applied) plus the three pluggable primitives it names.
pub struct NoiseParams {
    /// The handshake pattern, modifiers applied.
    pub pattern: HandshakePattern,
    /// The DH group.
    pub dh: Arc<dyn DhAlgorithm>,
    /// The AEAD cipher.
    pub cipher: Arc<dyn AeadAlgorithm>,
    /// The hash function.
    pub hash: Arc<dyn HashAlgorithm>,
}

impl fmt::Debug for NoiseParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NoiseParams").field(&self.to_string()).finish()
    }
}

impl fmt::Display for NoiseParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Noise_{}_{}_{}_{}",
            self.pattern.full_name(),
            self.dh.name(),
            self.cipher.name(),
            self.hash.name()
        )
    }
}

impl FromStr for NoiseParams {
    type Err = NoiseError;

    fn from_str(name: &str) -> Result<Self> {
        let mut parts = name.split('_');
        let prefix = parts
            .next()
            .ok_or_else(|| NoiseError::Configuration("empty protocol name".into()))?;
        if prefix != "Noise" {
            return Err(NoiseError::Configuration(format!(
                "protocol name must start with 'Noise_', got {prefix:?}"
            )));
        }
        let handshake = parts
            .next()
            .ok_or_else(|| NoiseError::Configuration("protocol name missing pattern segment".into()))?;
        let dh_name = parts
            .next()
            .ok_or_else(|| NoiseError::Configuration("protocol name missing dh segment".into()))?;
        let cipher_name = parts
            .next()
            .ok_or_else(|| NoiseError::Configuration("protocol name missing cipher segment".into()))?;
        let hash_name = parts
            .next()
            .ok_or_else(|| NoiseError::Configuration("protocol name missing hash segment".into()))?;
        if parts.next().is_some() {
            return Err(NoiseError::Configuration(format!("too many segments in protocol name {name:?}")));
        }

        let pattern = pattern::parse_and_build(handshake)?;
        let dh = lookup_dh(dh_name)?;
        let cipher = lookup_cipher(cipher_name)?;
        let hash = lookup_hash(hash_name)?;

        Ok(NoiseParams { pattern, dh, cipher, hash })
    }
}

fn lookup_dh(name: &str) -> Result<Arc<dyn DhAlgorithm>> {
    match name {
        #[cfg(feature = "25519")]
        "25519" => Ok(Arc::new(crate::primitives::dh::X25519)),
        #[cfg(feature = "x448")]
        "448" => Ok(Arc::new(crate::primitives::dh::X448)),
        other => Err(NoiseError::Configuration(format!("unknown or disabled dh algorithm {other}"))),
    }
}

fn lookup_cipher(name: &str) -> Result<Arc<dyn AeadAlgorithm>> {
    match name {
        #[cfg(feature = "aesgcm")]
        "AESGCM" => Ok(Arc::new(crate::primitives::cipher::AesGcm)),
        #[cfg(feature = "chachapoly")]
        "ChaChaPoly" => Ok(Arc::new(crate::primitives::cipher::ChaChaPoly)),
        other => Err(NoiseError::Configuration(format!(
            "unknown or disabled cipher algorithm {other}"
        ))),
    }
}

fn lookup_hash(name: &str) -> Result<Arc<dyn HashAlgorithm>> {
    match name {
        #[cfg(feature = "sha256")]
        "SHA256" => Ok(Arc::new(crate::primitives::hash::Sha256)),
        #[cfg(feature = "sha512")]
        "SHA512" => Ok(Arc::new(crate::primitives::hash::Sha512)),
        #[cfg(feature = "blake2s")]
        "BLAKE2s" => Ok(Arc::new(crate::primitives::hash::Blake2s)),
        #[cfg(feature = "blake2b")]
        "BLAKE2b" => Ok(Arc::new(crate::primitives::hash::Blake2b)),
        other => Err(NoiseError::Configuration(format!("unknown or disabled hash algorithm {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_xx_name() {
        let params: NoiseParams = "Noise_XX_25519_AESGCM_SHA256".parse().unwrap();
        assert_eq!(params.pattern.full_name(), "XX");
        assert_eq!(params.to_string(), "Noise_XX_25519_AESGCM_SHA256");
    }

    #[test]
    fn parses_modifiers_and_roundtrips_display() {
        let params: NoiseParams = "Noise_NNpsk0+psk2_25519_ChaChaPoly_BLAKE2s".parse().unwrap();
        assert_eq!(params.to_string(), "Noise_NNpsk0+psk2_25519_ChaChaPoly_BLAKE2s");
    }

    #[test]
    fn unknown_dh_is_configuration_error() {
        let err = "Noise_XX_9999_AESGCM_SHA256".parse::<NoiseParams>().unwrap_err();
        assert!(matches!(err, NoiseError::Configuration(_)));
    }

    #[test]
    fn wrong_number_of_segments_is_configuration_error() {
        let err = "Noise_XX_25519_AESGCM".parse::<NoiseParams>().unwrap_err();
        assert!(matches!(err, NoiseError::Configuration(_)));
    }
}
