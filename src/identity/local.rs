//! Local visor identity.

use rand::RngCore;
use secp256k1::{Keypair, PublicKey, Secp256k1, SecretKey};
use std::fmt;

use super::{IdentityError, PubKey};

/// A visor identity: the secp256k1 keypair this node is known by.
pub struct Identity {
    keypair: Keypair,
    pubkey: PubKey,
}

impl Identity {
    /// Create a new random identity.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        loop {
            let mut secret_bytes = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut secret_bytes);
            // Out-of-range scalars are astronomically rare; draw again.
            if let Ok(secret_key) = SecretKey::from_slice(&secret_bytes) {
                return Self::from_keypair(Keypair::from_secret_key(&secp, &secret_key));
            }
        }
    }

    /// Create an identity from an existing keypair.
    pub fn from_keypair(keypair: Keypair) -> Self {
        let pubkey = PubKey::from_public_key(&keypair.public_key());
        Self { keypair, pubkey }
    }

    /// Create an identity from a secret key.
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        Self::from_keypair(Keypair::from_secret_key(&secp, &secret_key))
    }

    /// Create an identity from a hex-encoded 32-byte secret.
    pub fn from_secret_str(s: &str) -> Result<Self, IdentityError> {
        let bytes = hex::decode(s.trim())?;
        if bytes.len() != 32 {
            return Err(IdentityError::InvalidSecretLength(bytes.len()));
        }
        let secret_key = SecretKey::from_slice(&bytes)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Return the compressed public key.
    pub fn pubkey(&self) -> PubKey {
        self.pubkey
    }

    /// Return the full secp256k1 public key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Return the secret key as lowercase hex.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.keypair.secret_bytes())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}
