// CryptoHash - SHA1 hash wrapper

use digest::Digest;

/// Incremental SHA1 helper used by the SRP6 proofs and the world-side
/// session digest.
#[derive(Clone)]
pub struct Sha1Hash {
    hasher: sha1::Sha1,
    digest: [u8; 20],
}

impl Default for Sha1Hash {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha1Hash {
    pub const DIGEST_LENGTH: usize = 20;

    pub fn new() -> Self {
        Sha1Hash {
            hasher: sha1::Sha1::new(),
            digest: [0u8; 20],
        }
    }

    /// Re-initialize the hasher
    pub fn initialize(&mut self) {
        self.hasher = sha1::Sha1::new();
    }

    /// Update with raw bytes
    pub fn update_bytes(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Update with a string
    pub fn update_str(&mut self, data: &str) {
        self.hasher.update(data.as_bytes());
    }

    /// Update with a little-endian u32 (seed values in the session digest)
    pub fn update_u32(&mut self, val: u32) {
        self.hasher.update(val.to_le_bytes());
    }

    /// Finalize the hash computation
    pub fn finalize(&mut self) {
        let result = self.hasher.clone().finalize();
        self.digest.copy_from_slice(&result);
    }

    /// Get the computed digest
    pub fn digest(&self) -> &[u8; 20] {
        &self.digest
    }
}

/// Compute SHA1 in one shot
pub fn sha1(data: &[u8]) -> [u8; 20] {
    let mut out = [0u8; 20];
    out.copy_from_slice(&sha1::Sha1::digest(data));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_basic() {
        // SHA1("test") = a94a8fe5ccb19ba61c4c0873d391e987982fbbd3
        let digest = sha1(b"test");
        assert_eq!(digest[0], 0xa9);
        assert_eq!(digest[1], 0x4a);
        assert_eq!(digest[19], 0xd3);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let mut sha = Sha1Hash::new();
        sha.update_str("te");
        sha.update_bytes(b"st");
        sha.finalize();
        assert_eq!(sha.digest(), &sha1(b"test"));
    }
}
