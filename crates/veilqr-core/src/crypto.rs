//! Payload encryption
//!
//! AES-256-CBC with PKCS#7 padding. Every encryption draws a fresh 16-byte
//! IV from the OS CSPRNG and the IV travels in front of the ciphertext.
//!
//! # Security Notes
//!
//! - The key is SHA-256 of the passphrase, used directly
//! - CBC carries no MAC. The padding check is the only integrity signal: a
//!   wrong key or a damaged share set almost always fails it, but about one
//!   attempt in 256 decodes to garbage without an error
//! - Key buffers are zeroized on drop

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block size, which is also the IV length.
pub const BLOCK_LEN: usize = 16;

/// Length of the IV prefix.
pub const IV_LEN: usize = BLOCK_LEN;

/// AES-256 key length.
pub const KEY_LEN: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Decryption failed: wrong key or corrupted data")]
    DecryptionFailed,
    #[error("Invalid ciphertext format: {0}")]
    InvalidFormat(String),
    #[error("Invalid key or IV length")]
    InvalidKeyLength,
}

/// Encrypted payload format:
/// [iv (16 bytes)][ciphertext (padded plaintext, multiple of 16 bytes)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    iv: [u8; IV_LEN],
    ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Length of [`EncryptedPayload::to_bytes`].
    pub fn encoded_len(&self) -> usize {
        IV_LEN + self.ciphertext.len()
    }

    /// Serialize to bytes: iv || ciphertext
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        // Padding always adds at least one block
        if bytes.len() < IV_LEN + BLOCK_LEN {
            return Err(CryptoError::InvalidFormat(format!(
                "{} bytes is shorter than IV plus one block",
                bytes.len()
            )));
        }
        if (bytes.len() - IV_LEN) % BLOCK_LEN != 0 {
            return Err(CryptoError::InvalidFormat(format!(
                "ciphertext length {} is not a multiple of {}",
                bytes.len() - IV_LEN,
                BLOCK_LEN
            )));
        }

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&bytes[..IV_LEN]);

        Ok(Self {
            iv,
            ciphertext: bytes[IV_LEN..].to_vec(),
        })
    }
}

/// Derive the cipher key from a passphrase: SHA-256 of its UTF-8 bytes.
pub fn derive_key(passphrase: &str) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&Sha256::digest(passphrase.as_bytes()));
    key
}

/// Encrypt under a fresh random IV.
pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_LEN]) -> Result<EncryptedPayload, CryptoError> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    encrypt_with_iv(plaintext, key, iv)
}

/// Encrypt under a caller-chosen IV.
///
/// Reusing an IV with the same key leaks equality of plaintext prefixes;
/// this exists for reproducible fixtures. Use [`encrypt`] otherwise.
pub fn encrypt_with_iv(
    plaintext: &[u8],
    key: &[u8; KEY_LEN],
    iv: [u8; IV_LEN],
) -> Result<EncryptedPayload, CryptoError> {
    let cipher =
        Aes256CbcEnc::new_from_slices(key, &iv).map_err(|_| CryptoError::InvalidKeyLength)?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    log::debug!(
        "Encrypted {} bytes into {} bytes",
        plaintext.len(),
        IV_LEN + ciphertext.len()
    );
    Ok(EncryptedPayload { iv, ciphertext })
}

/// Decrypt and strip the padding.
///
/// # Errors
/// `DecryptionFailed` if the padding is invalid, which is what a wrong key,
/// tampered ciphertext or incomplete share set produces. Since CBC has no
/// MAC, a wrong key still slips through about once in 256 attempts.
pub fn decrypt(payload: &EncryptedPayload, key: &[u8; KEY_LEN]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256CbcDec::new_from_slices(key, &payload.iv)
        .map_err(|_| CryptoError::InvalidKeyLength)?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&payload.ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Parse `iv || ciphertext` and decrypt it.
pub fn decrypt_bytes(bytes: &[u8], key: &[u8; KEY_LEN]) -> Result<Vec<u8>, CryptoError> {
    decrypt(&EncryptedPayload::from_bytes(bytes)?, key)
}
