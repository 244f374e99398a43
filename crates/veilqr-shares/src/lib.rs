//! VeilQR Shares
//!
//! Split an encrypted payload into `n` shares that must ALL be combined to
//! recover it.
//!
//! # Scheme
//!
//! The first `n - 1` shares are uniformly random bytes. The last share is the
//! payload XOR every random share. XOR-ing all `n` shares, in any order,
//! gives the payload back; any `n - 1` of them are independent of it.
//!
//! This is an (n, n) scheme, not an (m, n) threshold scheme. Combining a
//! strict subset does NOT raise an error, it just yields unrelated bytes.
//! Callers must supply the complete set, and can check it first with
//! [`verify_complete`].
//!
//! # Example
//!
//! ```
//! use veilqr_shares::{combine_shares, split_secret};
//!
//! let payload = vec![0x42u8; 16];
//! let shares = split_secret(&payload, 4).unwrap();
//!
//! let mut reversed = shares.clone();
//! reversed.reverse();
//! assert_eq!(combine_shares(&reversed).unwrap(), payload);
//! ```

pub mod shares;
pub mod xor;

// Re-exports
pub use shares::{export_share_hex, parse_share_hex};
pub use xor::{
    combine_shares, split_secret, split_secret_with_rng, verify_complete, Share, XorSplitter,
};

use thiserror::Error;

/// Fewest shares a split may produce.
pub const MIN_SHARES: usize = 2;

/// Most shares a split may produce (indices are `u8`, starting at 1).
pub const MAX_SHARES: usize = u8::MAX as usize;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("Invalid share count {0}: need between 2 and 255")]
    InvalidShareCount(usize),
    #[error("No shares supplied")]
    NoShares,
    #[error("Share length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Duplicate share index {0}")]
    DuplicateIndex(u8),
    #[error("Incomplete share set: missing indices {missing:?}")]
    IncompleteShareSet { missing: Vec<u8> },
    #[error("Invalid share format: {0}")]
    InvalidShare(String),
}

/// A scheme that splits bytes into shares and recombines them.
///
/// The pipeline only depends on this trait, so a threshold scheme can stand
/// in for [`XorSplitter`].
pub trait SecretSplitter {
    /// Split `secret` into `count` shares.
    fn split(&self, secret: &[u8], count: usize) -> Result<Vec<Share>, ShareError>;

    /// Recover the secret from shares.
    fn combine(&self, shares: &[Share]) -> Result<Vec<u8>, ShareError>;
}
