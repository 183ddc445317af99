//! Skywire Identity
//!
//! Visor identity based on secp256k1 keypairs. Remote nodes are named on the
//! wire by their 33-byte compressed public key, which is what routing rules
//! carry in their remote-endpoint fields.

mod local;
mod pubkey;

use thiserror::Error;

pub use local::Identity;
pub use pubkey::{PubKey, PUBKEY_SIZE};

/// Errors that can occur in identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid key: {0}")]
    InvalidKey(#[from] secp256k1::Error),

    #[error("invalid public key length: expected 33, got {0}")]
    InvalidPubKeyLength(usize),

    #[error("invalid secret key length: expected 32, got {0}")]
    InvalidSecretLength(usize),

    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests;
