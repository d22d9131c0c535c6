use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;

// ObjectId uniquely identifies an object held by the ledger.
// It is a 32 byte long identifier derived from the creating transaction,
// chosen so that it never decodes to an ed25519 point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; 32]);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format as a hex string with a prefix of the first 6 bytes
        write!(f, "obj:{}", hex::encode(&self.0[0..6]))
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId([0; 32])
    }
}

impl Deref for ObjectId {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ObjectId {
    pub fn new(uid: [u8; 32]) -> Self {
        ObjectId(uid)
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn create_object_id(seeds: &[&[u8]], bump: u8) -> [u8; 32] {
        let mut hasher = Sha256::new();

        // Domain separator
        hasher.update(b"LEDGER_Object");

        for seed in seeds {
            hasher.update(seed);
        }

        hasher.update([bump]);

        hasher.finalize().into()
    }

    /// Returns true when the bytes do not decompress to a point on the ed25519 curve
    pub fn is_off_curve(bytes: &[u8; 32]) -> bool {
        let Ok(compressed_edwards_y) = CompressedEdwardsY::from_slice(bytes.as_ref()) else {
            return true;
        };
        compressed_edwards_y.decompress().is_none()
    }

    /// Try to find an off-curve ObjectId for the given seeds
    pub fn try_find_uid(seeds: &[&[u8]]) -> Option<(ObjectId, u8)> {
        (0..=u8::MAX).find_map(|bump| {
            let id = ObjectId::create_object_id(seeds, bump);
            ObjectId::is_off_curve(&id).then_some((ObjectId(id), bump))
        })
    }

    /// Derive the id for the given seeds.
    ///
    /// Falls back to the bump-zero digest if every bump lands on the curve;
    /// the digest is still unique per seed set.
    pub fn derive(seeds: &[&[u8]]) -> ObjectId {
        match ObjectId::try_find_uid(seeds) {
            Some((id, _)) => id,
            None => ObjectId(ObjectId::create_object_id(seeds, 0)),
        }
    }
}

/// An account address that can own objects and send transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Deref for Address {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Address {
    pub fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// Address whose last byte is `n` and all other bytes zero, handy for fixtures
    pub fn from_low_u8(n: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        Address(bytes)
    }
}
