//! VeilQR Core
//!
//! The reversible transforms applied to a QR image before it is split into
//! shares.
//!
//! # Forward path
//!
//! 1. A seed phrase is hashed into an initial value for a logistic-sine map
//!    and the map's trajectory is ranked into a block permutation (`chaos`).
//! 2. The image is cut into a grid of square blocks which are reordered by
//!    that permutation (`scramble`).
//! 3. The scrambled pixels are encrypted with AES-256-CBC under a key
//!    derived from the passphrase (`crypto`).
//!
//! The reverse path runs the same steps backwards. The permutation is a
//! diffusion layer only; confidentiality comes from the cipher.

pub mod chaos;
pub mod crypto;
pub mod scramble;

pub use chaos::{
    derive_seed, permutation, permutation_with, ChaosError, LogisticSineMap, MapParams,
    Permutation, Seed,
};
pub use crypto::{decrypt, decrypt_bytes, derive_key, encrypt, CryptoError, EncryptedPayload};
pub use scramble::{
    descramble, descramble_image, divide, rebuild, scramble, scramble_image, ScrambleError,
    DEFAULT_GRID,
};
