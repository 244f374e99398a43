//! End-to-end protect / recover tests across all VeilQR crates.
//!
//! These tests verify:
//! 1. The full pipeline restores the image bit for bit
//! 2. Share order does not matter, but every share is required
//! 3. Seeds and cipher fixtures are reproducible
//! 4. The quality metrics agree with the pipeline's outcome

use image::{GrayImage, Luma};
use veilqr_core::{
    decrypt, decrypt_bytes, derive_key, descramble_image, encrypt, permutation, scramble_image,
    CryptoError, EncryptedPayload, Permutation,
};
use veilqr_shares::{combine_shares, split_secret, verify_complete, SecretSplitter, XorSplitter};
use veilqr_verify::{cross_correlation, psnr, ssim, QualityReport};

const GRID: u32 = 4;

/// Black and white 5 px modules, like a QR code, with no repeating blocks.
fn qr_like(side: u32) -> GrayImage {
    GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / 5, y / 5);
        let hash = (my * 1000 + mx).wrapping_mul(2_654_435_761);
        Luma([if (hash >> 15) & 1 == 0 { 0 } else { 255 }])
    })
}

fn protect(image: &GrayImage, seed: &str, passphrase: &str, count: usize) -> Vec<veilqr_shares::Share> {
    let perm = permutation(seed, (GRID * GRID) as usize).unwrap();
    let scrambled = scramble_image(image, &perm, GRID).unwrap();
    let payload = encrypt(scrambled.as_raw(), &derive_key(passphrase)).unwrap();
    split_secret(&payload.to_bytes(), count).unwrap()
}

fn recover(
    shares: &[veilqr_shares::Share],
    seed: &str,
    passphrase: &str,
    side: u32,
) -> Result<GrayImage, CryptoError> {
    let combined = combine_shares(shares).unwrap();
    let pixels = decrypt_bytes(&combined, &derive_key(passphrase))?;
    let scrambled = GrayImage::from_raw(side, side, pixels)
        .ok_or_else(|| CryptoError::InvalidFormat("pixel count".into()))?;
    let perm = permutation(seed, (GRID * GRID) as usize).unwrap();
    Ok(descramble_image(&scrambled, &perm, GRID).unwrap())
}

// ============================================================================
// 1. Full pipeline
// ============================================================================

#[test]
fn test_full_pipeline_is_lossless() {
    let image = qr_like(200);
    let shares = protect(&image, "test", "test", 4);
    let recovered = recover(&shares, "test", "test", 200).unwrap();

    assert_eq!(recovered, image);

    let report = QualityReport::evaluate(&image, &recovered).unwrap();
    assert!(report.is_lossless());
    assert!((report.cross_correlation.unwrap() - 1.0).abs() < 1e-9);
    assert!((report.ssim - 1.0).abs() < 1e-12);
}

#[test]
fn test_scrambled_image_is_not_the_original() {
    let image = qr_like(200);
    let perm = permutation("test", 16).unwrap();
    let scrambled = scramble_image(&image, &perm, GRID).unwrap();

    assert_ne!(scrambled, image);
    assert!(psnr(&image, &scrambled).unwrap().is_finite());
    assert!(ssim(&image, &scrambled).unwrap() < 1.0);
}

#[test]
fn test_separate_seed_and_passphrase() {
    let image = qr_like(100);
    let shares = protect(&image, "layout seed", "cipher pass", 3);
    assert_eq!(recover(&shares, "layout seed", "cipher pass", 100).unwrap(), image);
}

#[test]
fn test_wrong_seed_scrambles_layout() {
    let image = qr_like(100);
    let shares = protect(&image, "right seed", "pass", 2);

    // Cipher layer opens, but blocks land in the wrong places
    let recovered = recover(&shares, "wrong seed", "pass", 100).unwrap();
    assert_ne!(recovered, image);
}

// ============================================================================
// 2. Share set behaviour
// ============================================================================

#[test]
fn test_shares_in_reverse_order() {
    let data: Vec<u8> = (0u8..16).collect();
    let mut shares = split_secret(&data, 4).unwrap();
    shares.reverse();
    assert_eq!(combine_shares(&shares).unwrap(), data);
}

#[test]
fn test_three_of_four_shares_differ() {
    let data: Vec<u8> = (0u8..16).collect();
    let shares = split_secret(&data, 4).unwrap();

    for skip in 0..4 {
        let subset: Vec<_> = shares
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, s)| s.clone())
            .collect();
        assert_ne!(combine_shares(&subset).unwrap(), data);
        assert!(verify_complete(&subset, 4).is_err());
    }
}

#[test]
fn test_incomplete_share_set_fails_decryption_or_garbles() {
    let image = qr_like(100);
    let shares = protect(&image, "test", "test", 4);

    // Silent garbage from the XOR layer, almost always caught by the padding
    match recover(&shares[..3], "test", "test", 100) {
        Err(e) => assert!(matches!(
            e,
            CryptoError::DecryptionFailed | CryptoError::InvalidFormat(_)
        )),
        Ok(recovered) => assert_ne!(recovered, image),
    }
}

#[test]
fn test_pipeline_through_splitter_trait() {
    fn round_trip(splitter: &dyn SecretSplitter, payload: &[u8]) -> Vec<u8> {
        let shares = splitter.split(payload, 5).unwrap();
        splitter.combine(&shares).unwrap()
    }

    let key = derive_key("trait");
    let payload = encrypt(b"opaque payload", &key).unwrap().to_bytes();
    let combined = round_trip(&XorSplitter, &payload);
    assert_eq!(decrypt_bytes(&combined, &key).unwrap(), b"opaque payload");
}

// ============================================================================
// 3. Reproducibility
// ============================================================================

#[test]
fn test_permutation_for_test_seed() {
    let perm = permutation("test", 16).unwrap();
    assert_eq!(
        perm.as_slice(),
        &[14, 8, 3, 2, 13, 9, 5, 6, 0, 4, 1, 12, 7, 15, 11, 10]
    );
    // Same result on every call
    assert_eq!(permutation("test", 16).unwrap(), perm);
}

#[test]
fn test_permutation_is_bijection_for_many_seeds() {
    for seed in ["a", "b", "qr", "visual secret", "0.85"] {
        for n in [1, 2, 16, 64, 100] {
            let perm = permutation(seed, n).unwrap();
            assert!(Permutation::from_vec(perm.clone().into_vec()).is_ok());
            assert_eq!(perm.len(), n);
        }
    }
}

#[test]
fn test_zero_key_thousand_zero_bytes() {
    let key = [0u8; 32];
    let plaintext = vec![0u8; 1000];

    let payload = encrypt(&plaintext, &key).unwrap();
    assert_eq!(payload.to_bytes().len(), 16 + 1008);
    assert_eq!(decrypt(&payload, &key).unwrap(), plaintext);

    let parsed = EncryptedPayload::from_bytes(&payload.to_bytes()).unwrap();
    assert_eq!(decrypt(&parsed, &key).unwrap(), plaintext);
}

#[test]
fn test_key_is_sha256_of_passphrase() {
    assert_eq!(
        hex::encode(*derive_key("test")),
        "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
    );
}

// ============================================================================
// 4. Metrics on reconstructions
// ============================================================================

#[test]
fn test_metrics_identity() {
    let image = qr_like(64);
    assert_eq!(psnr(&image, &image).unwrap(), f64::INFINITY);
    assert!((cross_correlation(&image, &image).unwrap() - 1.0).abs() < 1e-9);
    assert!((ssim(&image, &image).unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn test_metrics_on_damaged_reconstruction() {
    let image = qr_like(64);
    let mut damaged = image.clone();
    for y in 20..30 {
        for x in 20..30 {
            let v = damaged.get_pixel(x, y).0[0];
            damaged.put_pixel(x, y, Luma([255 - v]));
        }
    }

    let report = QualityReport::evaluate(&image, &damaged).unwrap();
    assert!(!report.is_lossless());
    assert!(report.psnr > 0.0 && report.psnr.is_finite());
    assert!(report.cross_correlation.unwrap() < 1.0);
    assert!(report.ssim < 1.0);
}
