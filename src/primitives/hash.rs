//! Hash capability records (spec §6 "Hash contract").
//!
//! HMAC and the two/three-output HKDF used by `SymmetricState` (spec §4.2)
//! are built generically from `hash`/`BLOCKLEN` per spec §6, rather than
//! pulled from a separate HMAC crate, so every `HashAlgorithm` gets them for
//! free from a single `hash` method.

/// A hash function, named per the Noise protocol-name grammar (`SHA256`,
/// `SHA512`, `BLAKE2s`, `BLAKE2b`).
pub trait HashAlgorithm: Send + Sync {
    /// Name as it appears in a protocol string, e.g. `"SHA256"`.
    fn name(&self) -> &'static str;

    /// Output size in bytes (32 or 64).
    fn hashlen(&self) -> usize;

    /// Internal block size in bytes, used by the generic HMAC construction.
    fn blocklen(&self) -> usize;

    /// `Hash(data)`.
    fn hash(&self, data: &[u8]) -> Vec<u8>;

    /// `HMAC-HASH(key, data)`, built from `hash`/`blocklen` per RFC 2104.
    fn hmac_hash(&self, key: &[u8], data: &[u8]) -> Vec<u8> {
        let block_len = self.blocklen();
        let mut block_key = vec![0u8; block_len];
        if key.len() > block_len {
            let hashed = self.hash(key);
            block_key[..hashed.len()].copy_from_slice(&hashed);
        } else {
            block_key[..key.len()].copy_from_slice(key);
        }

        let ipad: Vec<u8> = block_key.iter().map(|b| b ^ 0x36).collect();
        let opad: Vec<u8> = block_key.iter().map(|b| b ^ 0x5c).collect();

        let mut inner_input = ipad;
        inner_input.extend_from_slice(data);
        let inner = self.hash(&inner_input);

        let mut outer_input = opad;
        outer_input.extend_from_slice(&inner);
        self.hash(&outer_input)
    }

    /// Two-output `HKDF(chaining_key, input)` (spec §4.2 `MixKey`).
    fn hkdf2(&self, chaining_key: &[u8], input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let temp_key = self.hmac_hash(chaining_key, input);
        let output1 = self.hmac_hash(&temp_key, &[0x01]);
        let mut input2 = output1.clone();
        input2.push(0x02);
        let output2 = self.hmac_hash(&temp_key, &input2);
        (output1, output2)
    }

    /// Three-output `HKDF(chaining_key, input)` (spec §4.2 `MixKeyAndHash`).
    fn hkdf3(&self, chaining_key: &[u8], input: &[u8]) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
        let temp_key = self.hmac_hash(chaining_key, input);
        let output1 = self.hmac_hash(&temp_key, &[0x01]);
        let mut input2 = output1.clone();
        input2.push(0x02);
        let output2 = self.hmac_hash(&temp_key, &input2);
        let mut input3 = output2.clone();
        input3.push(0x03);
        let output3 = self.hmac_hash(&temp_key, &input3);
        (output1, output2, output3)
    }
}

/// SHA-256 (HASHLEN=32, BLOCKLEN=64).
#[cfg(feature = "sha256")]
pub struct Sha256;

#[cfg(feature = "sha256")]
impl HashAlgorithm for Sha256 {
    fn name(&self) -> &'static str {
        "SHA256"
    }
    fn hashlen(&self) -> usize {
        32
    }
    fn blocklen(&self) -> usize {
        64
    }
    fn hash(&self, data: &[u8]) -> Vec<u8> {
        use sha2::Digest;
        sha2::Sha256::digest(data).to_vec()
    }
}

/// SHA-512 (HASHLEN=64, BLOCKLEN=128).
#[cfg(feature = "sha512")]
pub struct Sha512;

#[cfg(feature = "sha512")]
impl HashAlgorithm for Sha512 {
    fn name(&self) -> &'static str {
        "SHA512"
    }
    fn hashlen(&self) -> usize {
        64
    }
    fn blocklen(&self) -> usize {
        128
    }
    fn hash(&self, data: &[u8]) -> Vec<u8> {
        use sha2::Digest;
        sha2::Sha512::digest(data).to_vec()
    }
}

/// BLAKE2s (HASHLEN=32, BLOCKLEN=64).
#[cfg(feature = "blake2s")]
pub struct Blake2s;

#[cfg(feature = "blake2s")]
impl HashAlgorithm for Blake2s {
    fn name(&self) -> &'static str {
        "BLAKE2s"
    }
    fn hashlen(&self) -> usize {
        32
    }
    fn blocklen(&self) -> usize {
        64
    }
    fn hash(&self, data: &[u8]) -> Vec<u8> {
        use blake2::Digest;
        blake2::Blake2s256::digest(data).to_vec()
    }
}

/// BLAKE2b (HASHLEN=64, BLOCKLEN=128).
#[cfg(feature = "blake2b")]
pub struct Blake2b;

#[cfg(feature = "blake2b")]
impl HashAlgorithm for Blake2b {
    fn name(&self) -> &'static str {
        "BLAKE2b"
    }
    fn hashlen(&self) -> usize {
        64
    }
    fn blocklen(&self) -> usize {
        128
    }
    fn hash(&self, data: &[u8]) -> Vec<u8> {
        use blake2::Digest;
        blake2::Blake2b512::digest(data).to_vec()
    }
}

#[cfg(all(test, feature = "sha256"))]
mod tests {
    use super::*;

    #[test]
    fn sha256_hashlen_matches_output() {
        let h = Sha256;
        assert_eq!(h.hash(b"abc").len(), h.hashlen());
    }

    #[test]
    fn hkdf2_outputs_differ() {
        let h = Sha256;
        let (a, b) = h.hkdf2(&[0u8; 32], b"input");
        assert_ne!(a, b);
        assert_eq!(a.len(), h.hashlen());
        assert_eq!(b.len(), h.hashlen());
    }
}
