use std::collections::HashSet;

use super::*;

#[test]
fn test_identity_generation() {
    let identity = Identity::generate();
    let pk = identity.pubkey();

    // Compressed form starts with 0x02 or 0x03
    assert!(matches!(pk.as_bytes()[0], 0x02 | 0x03));
    assert!(!pk.is_null());
    assert!(pk.to_public_key().is_ok());
}

#[test]
fn test_identity_unique() {
    let keys: HashSet<PubKey> = (0..16).map(|_| Identity::generate().pubkey()).collect();
    assert_eq!(keys.len(), 16);
}

#[test]
fn test_identity_from_secret_str() {
    let secret = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20";
    let a = Identity::from_secret_str(secret).unwrap();
    let b = Identity::from_secret_str(secret).unwrap();

    assert_eq!(a.pubkey(), b.pubkey());
    assert_eq!(a.secret_hex(), secret);
}

#[test]
fn test_identity_from_secret_str_bad_length() {
    let result = Identity::from_secret_str("0102");
    assert!(matches!(result, Err(IdentityError::InvalidSecretLength(2))));
}

#[test]
fn test_identity_from_secret_str_bad_hex() {
    let result = Identity::from_secret_str("not-hex");
    assert!(matches!(result, Err(IdentityError::InvalidHex(_))));
}

#[test]
fn test_pubkey_hex_roundtrip() {
    let pk = Identity::generate().pubkey();
    let s = pk.to_string();

    assert_eq!(s.len(), 66);
    let parsed: PubKey = s.parse().unwrap();
    assert_eq!(parsed, pk);
}

#[test]
fn test_pubkey_from_slice_wrong_length() {
    let result = PubKey::from_slice(&[0u8; 32]);
    assert!(matches!(result, Err(IdentityError::InvalidPubKeyLength(32))));
}

#[test]
fn test_pubkey_null() {
    assert!(PubKey::NULL.is_null());
    assert_eq!(PubKey::default(), PubKey::NULL);
    // The null key is not a curve point
    assert!(PubKey::NULL.to_public_key().is_err());
}

#[test]
fn test_pubkey_serde_as_hex_string() {
    let pk = Identity::generate().pubkey();
    let json = serde_json::to_string(&pk).unwrap();

    assert_eq!(json, format!("\"{}\"", pk));
    let back: PubKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, pk);
}
