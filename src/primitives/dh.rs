//! Diffie-Hellman capability records (spec §6 "DH primitive contract").

use rand_core::RngCore;
use zeroize::Zeroize;

use crate::error::{NoiseError, Result};

/// A private scalar, zeroized on drop.
#[derive(Clone)]
pub struct PrivateKey(pub Vec<u8>);

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// A public DH element. Not secret; no zeroization needed.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(pub Vec<u8>);

impl PublicKey {
    /// Construct a public key from its wire encoding. Mirrors the Noise
    /// reference implementation's `DH.create_public`, which returns a
    /// `PublicKey` rather than raising (spec §9 Open Question).
    pub fn from_bytes(data: &[u8]) -> Self {
        PublicKey(data.to_vec())
    }

    /// Raw bytes, `DHLEN` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A DH keypair.
#[derive(Clone)]
pub struct KeyPair {
    /// The private scalar.
    pub private: PrivateKey,
    /// The corresponding public element.
    pub public: PublicKey,
}

/// A DH group, named per the Noise protocol-name grammar (`25519`, `448`).
pub trait DhAlgorithm: Send + Sync {
    /// Name as it appears in a protocol string, e.g. `"25519"`.
    fn name(&self) -> &'static str;

    /// Length in bytes of both public and private keys.
    fn dhlen(&self) -> usize;

    /// Generate a fresh keypair using the supplied RNG. Callers must supply
    /// a cryptographically secure RNG; the trait is expressed over
    /// `dyn RngCore` (rather than bounding on `CryptoRng` too) so it stays
    /// object-safe for the registries in [`crate::params`].
    fn generate_keypair(&self, rng: &mut dyn RngCore) -> KeyPair;

    /// Perform the DH computation, returning `DHLEN` bytes of shared secret.
    fn dh(&self, keypair: &KeyPair, public_key: &PublicKey) -> Result<Vec<u8>>;
}

/// X25519, the default and always-available DH group (DHLEN=32).
#[cfg(feature = "25519")]
pub struct X25519;

#[cfg(feature = "25519")]
impl DhAlgorithm for X25519 {
    fn name(&self) -> &'static str {
        "25519"
    }

    fn dhlen(&self) -> usize {
        32
    }

    fn generate_keypair(&self, rng: &mut dyn RngCore) -> KeyPair {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        let secret = x25519_dalek::StaticSecret::from(bytes);
        let public = x25519_dalek::PublicKey::from(&secret);
        KeyPair {
            private: PrivateKey(secret.to_bytes().to_vec()),
            public: PublicKey(public.to_bytes().to_vec()),
        }
    }

    fn dh(&self, keypair: &KeyPair, public_key: &PublicKey) -> Result<Vec<u8>> {
        let mut priv_bytes = [0u8; 32];
        priv_bytes.copy_from_slice(&keypair.private.0);
        let mut pub_bytes = [0u8; 32];
        if public_key.0.len() != 32 {
            return Err(NoiseError::MalformedMessage(
                "x25519 public key must be 32 bytes".into(),
            ));
        }
        pub_bytes.copy_from_slice(&public_key.0);
        let secret = x25519_dalek::StaticSecret::from(priv_bytes);
        let public = x25519_dalek::PublicKey::from(pub_bytes);
        // X25519 never fails; small-order points yield all-zero output,
        // which is passed through untouched per spec §6.
        Ok(secret.diffie_hellman(&public).to_bytes().to_vec())
    }
}

/// X448, the higher-security DH group (DHLEN=56), behind the `x448` feature.
#[cfg(feature = "x448")]
pub struct X448;

#[cfg(feature = "x448")]
impl DhAlgorithm for X448 {
    fn name(&self) -> &'static str {
        "448"
    }

    fn dhlen(&self) -> usize {
        56
    }

    fn generate_keypair(&self, rng: &mut dyn RngCore) -> KeyPair {
        let mut bytes = [0u8; 56];
        rng.fill_bytes(&mut bytes);
        let secret = x448::StaticSecret::from(bytes);
        let public = x448::PublicKey::from(&secret);
        KeyPair {
            private: PrivateKey(secret.as_bytes().to_vec()),
            public: PublicKey(public.as_bytes().to_vec()),
        }
    }

    fn dh(&self, keypair: &KeyPair, public_key: &PublicKey) -> Result<Vec<u8>> {
        let mut priv_bytes = [0u8; 56];
        priv_bytes.copy_from_slice(&keypair.private.0);
        if public_key.0.len() != 56 {
            return Err(NoiseError::MalformedMessage(
                "x448 public key must be 56 bytes".into(),
            ));
        }
        let public = x448::PublicKey::from_bytes(&public_key.0).ok_or_else(|| {
            NoiseError::Configuration("x448 public key does not decode to a valid point".into())
        })?;
        let secret = x448::StaticSecret::from(priv_bytes);
        Ok(secret.diffie_hellman(&public).as_bytes().to_vec())
    }
}

#[cfg(all(test, feature = "25519"))]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn x25519_agreement_is_symmetric() {
        let dh = X25519;
        let mut rng = OsRng;
        let a = dh.generate_keypair(&mut rng);
        let b = dh.generate_keypair(&mut rng);
        let shared_a = dh.dh(&a, &b.public).unwrap();
        let shared_b = dh.dh(&b, &a.public).unwrap();
        assert_eq!(shared_a, shared_b);
        assert_eq!(shared_a.len(), dh.dhlen());
    }
}
