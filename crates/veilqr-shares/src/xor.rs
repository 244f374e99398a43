//! XOR splitting and recombination

use crate::{SecretSplitter, ShareError, MAX_SHARES, MIN_SHARES};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// A single share of a secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Share index (1..=N, never 0)
    pub index: u8,
    /// Share data (same length as original secret)
    pub data: Vec<u8>,
}

fn xor_into(acc: &mut [u8], other: &[u8]) {
    for (a, b) in acc.iter_mut().zip(other) {
        *a ^= b;
    }
}

/// Split a secret into `count` shares using the thread-local CSPRNG.
///
/// # Arguments
/// * `secret` - The bytes to split (may be empty)
/// * `count` - Number of shares, 2..=255. All of them are needed to recover.
pub fn split_secret(secret: &[u8], count: usize) -> Result<Vec<Share>, ShareError> {
    split_secret_with_rng(secret, count, &mut rand::thread_rng())
}

/// Split a secret drawing the filler shares from `rng`.
///
/// Secrecy rests entirely on `rng` being uniform and unpredictable.
pub fn split_secret_with_rng<R>(
    secret: &[u8],
    count: usize,
    rng: &mut R,
) -> Result<Vec<Share>, ShareError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if !(MIN_SHARES..=MAX_SHARES).contains(&count) {
        return Err(ShareError::InvalidShareCount(count));
    }

    let mut shares = Vec::with_capacity(count);
    let mut last = secret.to_vec();

    for index in 1..count {
        let mut data = vec![0u8; secret.len()];
        rng.fill_bytes(&mut data);
        xor_into(&mut last, &data);
        shares.push(Share {
            index: index as u8,
            data,
        });
    }
    shares.push(Share {
        index: count as u8,
        data: last,
    });

    log::debug!("Split {} bytes into {} shares", secret.len(), count);
    Ok(shares)
}

/// XOR-reduce shares back into the secret.
///
/// Order does not matter. A missing share is not detected: the result is
/// simply wrong. A duplicated share would cancel itself out, so duplicate
/// indices are rejected.
pub fn combine_shares(shares: &[Share]) -> Result<Vec<u8>, ShareError> {
    let first = shares.first().ok_or(ShareError::NoShares)?;
    let secret_len = first.data.len();

    let mut seen = [false; 256];
    for share in shares {
        if share.data.len() != secret_len {
            return Err(ShareError::LengthMismatch {
                expected: secret_len,
                actual: share.data.len(),
            });
        }
        if std::mem::replace(&mut seen[share.index as usize], true) {
            return Err(ShareError::DuplicateIndex(share.index));
        }
    }

    let mut secret = vec![0u8; secret_len];
    for share in shares {
        xor_into(&mut secret, &share.data);
    }
    Ok(secret)
}

/// Check that `shares` holds indices `1..=total`, each exactly once.
///
/// [`combine_shares`] cannot tell a partial set from a full one; call this
/// first when the expected share count is known.
pub fn verify_complete(shares: &[Share], total: u8) -> Result<(), ShareError> {
    let mut seen = [false; 256];
    for share in shares {
        if share.index == 0 || share.index > total {
            return Err(ShareError::InvalidShare(format!(
                "index {} outside 1..={}",
                share.index, total
            )));
        }
        if std::mem::replace(&mut seen[share.index as usize], true) {
            return Err(ShareError::DuplicateIndex(share.index));
        }
    }

    let missing: Vec<u8> = (1..=total).filter(|&i| !seen[i as usize]).collect();
    if !missing.is_empty() {
        log::warn!("Share set is missing {} of {} shares", missing.len(), total);
        return Err(ShareError::IncompleteShareSet { missing });
    }
    Ok(())
}

/// The (n, n) XOR scheme as a [`SecretSplitter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct XorSplitter;

impl SecretSplitter for XorSplitter {
    fn split(&self, secret: &[u8], count: usize) -> Result<Vec<Share>, ShareError> {
        split_secret(secret, count)
    }

    fn combine(&self, shares: &[Share]) -> Result<Vec<u8>, ShareError> {
        combine_shares(shares)
    }
}
