//! Security-specific tests.
//!
//! These tests verify:
//! 1. The cipher rejects wrong keys and damaged payloads
//! 2. Keys are zeroed when dropped
//! 3. Invalid shares and share sets are rejected
//! 4. Malformed inputs don't panic

use image::GrayImage;
use veilqr_core::{
    decrypt, decrypt_bytes, derive_key, divide, encrypt, permutation, CryptoError,
    EncryptedPayload, ScrambleError,
};
use veilqr_shares::{
    combine_shares, export_share_hex, parse_share_hex, split_secret, verify_complete, ShareError,
};

// ============================================================================
// 1. Payload Encryption Security Tests
// ============================================================================

#[test]
fn test_wrong_passphrase_never_yields_plaintext() {
    let plaintext = [0xABu8; 64];
    let payload = encrypt(&plaintext, &derive_key("correct horse battery staple")).unwrap();

    for wrong in ["wrong horse battery staple", "", "Correct horse battery staple"] {
        let result = decrypt(&payload, &derive_key(wrong));
        assert_ne!(result.as_deref().ok(), Some(&plaintext[..]));
    }
}

#[test]
fn test_empty_passphrase_round_trip() {
    let plaintext = [0x42u8; 40];
    let key = derive_key("");
    let payload = encrypt(&plaintext, &key).unwrap();
    assert_eq!(decrypt(&payload, &key).unwrap(), plaintext);
}

#[test]
fn test_tampered_last_block_never_yields_plaintext() {
    let plaintext = b"sixteen byte msg and some more".to_vec();
    let key = derive_key("tamper");
    let mut bytes = encrypt(&plaintext, &key).unwrap().to_bytes();

    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    assert_ne!(decrypt_bytes(&bytes, &key).ok(), Some(plaintext));
}

#[test]
fn test_truncated_payload_is_a_format_error() {
    let key = derive_key("truncate");
    let bytes = encrypt(b"payload", &key).unwrap().to_bytes();

    // Cut into the IV or off a block boundary
    for len in [0, 5, 16, 31] {
        assert!(matches!(
            decrypt_bytes(&bytes[..len], &key),
            Err(CryptoError::InvalidFormat(_))
        ));
    }
}

#[test]
fn test_fresh_iv_per_encryption() {
    let key = derive_key("iv");
    let a = encrypt(b"same", &key).unwrap();
    let b = encrypt(b"same", &key).unwrap();
    assert_ne!(a.iv(), b.iv());
    assert_ne!(a.ciphertext(), b.ciphertext());
}

// ============================================================================
// 2. Key Zeroing
// ============================================================================

#[test]
fn test_derived_key_is_zeroizing() {
    use zeroize::Zeroize;

    let mut key = derive_key("zero me");
    assert!(key.iter().any(|&b| b != 0));
    key.zeroize();
    assert!(key.iter().all(|&b| b == 0));
}

// ============================================================================
// 3. Invalid Share Rejection Tests
// ============================================================================

#[test]
fn test_split_share_count_bounds() {
    for count in [0, 1, 256] {
        assert_eq!(
            split_secret(b"secret", count),
            Err(ShareError::InvalidShareCount(count))
        );
    }
}

#[test]
fn test_combine_empty_shares() {
    assert_eq!(combine_shares(&[]), Err(ShareError::NoShares));
}

#[test]
fn test_combine_mismatched_lengths() {
    let mut shares = split_secret(b"length check", 3).unwrap();
    shares[2].data.truncate(4);
    assert!(matches!(
        combine_shares(&shares),
        Err(ShareError::LengthMismatch { .. })
    ));
}

#[test]
fn test_combine_duplicate_share() {
    let shares = split_secret(b"dup", 2).unwrap();
    let doubled = [shares[0].clone(), shares[0].clone()];
    assert_eq!(combine_shares(&doubled), Err(ShareError::DuplicateIndex(1)));
}

#[test]
fn test_verify_complete_reports_missing() {
    let shares = split_secret(b"missing", 5).unwrap();
    let partial = [shares[1].clone(), shares[3].clone()];
    assert_eq!(
        verify_complete(&partial, 5),
        Err(ShareError::IncompleteShareSet {
            missing: vec![1, 3, 5]
        })
    );
}

#[test]
fn test_share_text_round_trip() {
    for share in split_secret(b"as text", 4).unwrap() {
        assert_eq!(parse_share_hex(&export_share_hex(&share)).unwrap(), share);
    }
}

#[test]
fn test_indivisible_image_rejected() {
    let image = GrayImage::new(30, 30);
    assert_eq!(
        divide(&image, 4),
        Err(ScrambleError::Indivisible { side: 30, grid: 4 })
    );
    assert!(matches!(
        divide(&GrayImage::new(32, 16), 4),
        Err(ScrambleError::NotSquare { .. })
    ));
}

#[test]
fn test_empty_seed_rejected() {
    assert!(permutation("", 16).is_err());
}

// ============================================================================
// 4. Malformed Input Panic Tests (should NOT panic)
// ============================================================================

#[test]
fn test_payload_from_garbage_bytes_does_not_panic() {
    let inputs: Vec<Vec<u8>> = vec![
        vec![],
        vec![0],
        vec![0; 10],
        vec![0xFF; 100],
        vec![0; 1000],
        (0..255).collect(),
    ];

    let key = derive_key("garbage");
    for input in &inputs {
        let _ = EncryptedPayload::from_bytes(input);
        let _ = decrypt_bytes(input, &key);
    }
}

#[test]
fn test_parse_share_garbage_does_not_panic() {
    let inputs = [
        "",
        ":",
        "1:",
        "::::",
        "999999999999:00",
        "-1:00",
        "1:0",
        "🎉:🎊",
        "\0\0\0",
        &"1:".repeat(1000),
        &"a".repeat(10000),
    ];

    for input in &inputs {
        let _ = parse_share_hex(input);
    }
}

#[test]
fn test_decrypt_random_payloads_does_not_panic() {
    use rand::RngCore;
    let mut rng = rand::thread_rng();
    let key = derive_key("random");

    for blocks in 2..50 {
        let mut bytes = vec![0u8; blocks * 16];
        rng.fill_bytes(&mut bytes);
        let _ = decrypt_bytes(&bytes, &key);
    }
}
