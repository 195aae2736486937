// tests/crypto_tests.rs
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use proptest::prelude::*;
use task_vault::aliases::{FieldKey32, MasterPassword};
use task_vault::crypto::*;
use task_vault::enums::KdfMethod;
use task_vault::error::CoreError;

fn key(byte: u8) -> FieldKey32 {
    FieldKey32::new([byte; 32])
}

fn pw(s: &str) -> MasterPassword {
    MasterPassword::new(s.to_owned())
}

#[test]
fn test_encrypt_decrypt_roundtrip_unicode() {
    let k = key(7);
    for s in ["", "buy milk", "Zürich → 東京 🚆", "line\nbreak\ttab"] {
        let field = encrypt(s, &k).unwrap();
        assert!(field.as_str().starts_with("ENC:1:"));
        assert_eq!(decrypt(&field, &k).unwrap(), s);
    }
}

proptest! {
    #[test]
    fn prop_roundtrip_any_string(text in any::<String>(), raw in any::<[u8; 32]>()) {
        let k = FieldKey32::new(raw);
        let field = encrypt(&text, &k).unwrap();
        prop_assert!(is_encrypted(field.as_str()));
        prop_assert_eq!(decrypt_str(field.as_str(), &k).unwrap(), text);
    }

    #[test]
    fn prop_same_plaintext_never_repeats(text in any::<String>()) {
        let k = key(1);
        let a = encrypt(&text, &k).unwrap();
        let b = encrypt(&text, &k).unwrap();
        prop_assert_ne!(&a, &b);
        prop_assert_eq!(decrypt(&a, &k).unwrap(), decrypt(&b, &k).unwrap());
    }

    #[test]
    fn prop_wrong_key_is_rejected(
        text in any::<String>(),
        right in any::<[u8; 32]>(),
        wrong in any::<[u8; 32]>(),
    ) {
        prop_assume!(right != wrong);
        let field = encrypt(&text, &FieldKey32::new(right)).unwrap();
        let err = decrypt(&field, &FieldKey32::new(wrong)).unwrap_err();
        prop_assert!(matches!(err, CoreError::Decryption(_)));
    }

    #[test]
    fn prop_any_flipped_bit_is_detected(
        text in any::<String>(),
        at in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let k = key(3);
        let field = encrypt(&text, &k).unwrap();
        let body = field.as_str().strip_prefix("ENC:1:").unwrap();
        let mut payload = STANDARD.decode(body).unwrap();
        let byte = at.index(payload.len());
        payload[byte] ^= 1 << bit;

        let tampered = format!("ENC:1:{}", STANDARD.encode(&payload));
        prop_assert!(matches!(decrypt_str(&tampered, &k), Err(CoreError::Decryption(_))));
    }
}

#[test]
fn test_every_flipped_bit_is_detected() {
    let k = key(3);
    let field = encrypt("tamper me", &k).unwrap();
    let body = field.as_str().strip_prefix("ENC:1:").unwrap();
    let payload = STANDARD.decode(body).unwrap();

    for byte in 0..payload.len() {
        for bit in 0..8 {
            let mut bad = payload.clone();
            bad[byte] ^= 1 << bit;
            let tampered = format!("ENC:1:{}", STANDARD.encode(&bad));
            let err = decrypt_str(&tampered, &k).unwrap_err();
            assert!(
                matches!(err, CoreError::Decryption(_)),
                "bit {bit} of byte {byte} went undetected"
            );
        }
    }
}

#[test]
fn test_malformed_envelopes_are_rejected() {
    let k = key(4);
    let short = format!("ENC:1:{}", STANDARD.encode([0u8; 27]));
    for bad in [
        "plain text",
        "ENC:2:AAAA",
        "ENC:x:AAAA",
        "ENC:1:not base64!!",
        "ENC:1",
        short.as_str(),
    ] {
        assert!(
            matches!(decrypt_str(bad, &k), Err(CoreError::Decryption(_))),
            "{bad:?} should not decrypt"
        );
        assert!(EncryptedField::parse(bad).is_err());
    }
}

#[test]
fn test_is_encrypted_requires_full_envelope() {
    let real = encrypt("x", &key(1)).unwrap();
    assert!(is_encrypted(real.as_str()));

    let short = format!("ENC:1:{}", STANDARD.encode([0u8; 27]));
    for plain in [
        "ENC: rotate encoder keys",
        "ENC:1:abc",
        "ENC:9:future",
        "ENC:1:not base64!!",
        "ENCORE",
        "enc:1:abc",
        "",
        short.as_str(),
    ] {
        assert!(!is_encrypted(plain), "{plain:?} taken for ciphertext");
    }
}

#[test]
fn test_derive_key_is_deterministic_per_method() {
    let salt = generate_salt();
    let fast = KdfParams::fast();
    for method in [KdfMethod::Argon2id, KdfMethod::Pbkdf2] {
        let a = derive_key_with(&pw("hunter2"), &salt, method, &fast).unwrap();
        let b = derive_key_with(&pw("hunter2"), &salt, method, &fast).unwrap();
        let c = derive_key_with(&pw("hunter3"), &salt, method, &fast).unwrap();
        assert_eq!(a.expose_secret(), b.expose_secret());
        assert_ne!(a.expose_secret(), c.expose_secret());
    }
}

#[test]
fn test_methods_and_salts_give_different_keys() {
    let fast = KdfParams::fast();
    let salt = [9u8; 32];
    let argon = derive_key_with(&pw("pw"), &salt, KdfMethod::Argon2id, &fast).unwrap();
    let pbkdf = derive_key_with(&pw("pw"), &salt, KdfMethod::Pbkdf2, &fast).unwrap();
    let other_salt = derive_key_with(&pw("pw"), &[8u8; 32], KdfMethod::Argon2id, &fast).unwrap();
    assert_ne!(argon.expose_secret(), pbkdf.expose_secret());
    assert_ne!(argon.expose_secret(), other_salt.expose_secret());
}

#[test]
fn test_generate_salt_is_random() {
    assert_ne!(generate_salt(), generate_salt());
}

#[test]
fn test_key_hash_verifies_only_its_key() {
    let k = key(5);
    let hash = key_hash(&k).unwrap();
    assert!(verify_key(&k, &hash));
    assert!(!verify_key(&key(6), &hash));
    assert!(!verify_key(&k, &hash[..31]));
    assert_ne!(hash.as_slice(), k.expose_secret().as_slice());
}

#[test]
#[ignore = "production KDF cost: ~64 MiB and several hundred ms per derivation"]
fn test_production_argon2id_params() {
    let salt = generate_salt();
    let a = derive_key(&pw("correct horse"), &salt, KdfMethod::Argon2id).unwrap();
    let b = derive_key(&pw("correct horse"), &salt, KdfMethod::Argon2id).unwrap();
    assert_eq!(a.expose_secret(), b.expose_secret());
}

#[test]
#[ignore = "production KDF cost: 600k PBKDF2 iterations"]
fn test_production_pbkdf2_matches_reference() {
    let salt = b"0123456789abcdef0123456789abcdef";
    let key = derive_key(&pw("password"), salt, KdfMethod::Pbkdf2).unwrap();
    let mut expected = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<sha2::Sha256>(b"password", salt, 600_000, &mut expected);
    assert_eq!(key.expose_secret(), &expected);
}
