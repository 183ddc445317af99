//! Compressed public key as it appears in routing rules.

use secp256k1::PublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::IdentityError;

/// Size of a compressed secp256k1 public key.
pub const PUBKEY_SIZE: usize = 33;

/// A node's public key in compressed form.
///
/// Holds raw bytes so that rules received from the network can be carried
/// and re-encoded unchanged. Use [`PubKey::to_public_key`] when the key must
/// be a valid curve point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PubKey([u8; PUBKEY_SIZE]);

impl PubKey {
    /// The all-zero key, used where no remote is known.
    pub const NULL: PubKey = PubKey([0u8; PUBKEY_SIZE]);

    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; PUBKEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentityError> {
        let arr: [u8; PUBKEY_SIZE] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidPubKeyLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Create from a secp256k1 public key.
    pub fn from_public_key(pk: &PublicKey) -> Self {
        Self(pk.serialize())
    }

    /// Parse into a secp256k1 public key, validating the curve point.
    pub fn to_public_key(&self) -> Result<PublicKey, IdentityError> {
        Ok(PublicKey::from_slice(&self.0)?)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; PUBKEY_SIZE] {
        &self.0
    }

    /// Check for the all-zero key.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; PUBKEY_SIZE]
    }
}

impl Default for PubKey {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PubKey({})", self)
    }
}

impl fmt::Display for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for PubKey {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl From<PublicKey> for PubKey {
    fn from(pk: PublicKey) -> Self {
        Self::from_public_key(&pk)
    }
}

impl Serialize for PubKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
