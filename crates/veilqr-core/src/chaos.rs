//! Chaotic permutation generator
//!
//! Iterates the logistic-sine map
//!
//! ```text
//! x(t+1) = (r * x(t) * (1 - x(t)) + s * sin(pi * x(t))) mod 1
//! ```
//!
//! from a seed-derived `x0` and ranks the trajectory into a permutation of
//! block indices. With the default `r = 3.9, s = 3.0` the map is chaotic, so
//! nearby seeds give unrelated orderings. The same seed always gives the
//! same permutation.

use sha2::{Digest, Sha256};
use std::f64::consts::PI;
use thiserror::Error;

/// Modulus applied to the hashed seed before normalizing to `[0, 1)`.
const SEED_MODULUS: u64 = 10_000_000_000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChaosError {
    #[error("Seed phrase must not be empty")]
    EmptySeed,
    #[error("Seed value {0} is outside (0, 1)")]
    SeedOutOfRange(f64),
    #[error("Map parameters must be finite (r = {r}, s = {s})")]
    NonFiniteParams { r: f64, s: f64 },
    #[error("Permutation length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Not a permutation: {0}")]
    NotAPermutation(String),
}

/// Where the map's initial value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Seed {
    /// A passphrase, hashed into `x0` by [`derive_seed`].
    Phrase(String),
    /// A raw initial value in `(0, 1)`. Zero is the map's fixed point.
    Value(f64),
}

impl Seed {
    /// Resolve the initial value `x0` of the map.
    pub fn initial_value(&self) -> Result<f64, ChaosError> {
        match self {
            Seed::Phrase(phrase) => derive_seed(phrase),
            Seed::Value(x) if x.is_finite() && *x > 0.0 && *x < 1.0 => Ok(*x),
            Seed::Value(x) => Err(ChaosError::SeedOutOfRange(*x)),
        }
    }
}

impl From<&str> for Seed {
    fn from(phrase: &str) -> Self {
        Seed::Phrase(phrase.to_string())
    }
}

impl From<String> for Seed {
    fn from(phrase: String) -> Self {
        Seed::Phrase(phrase)
    }
}

impl From<f64> for Seed {
    fn from(value: f64) -> Self {
        Seed::Value(value)
    }
}

/// Control parameters of the logistic-sine map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapParams {
    /// Logistic term coefficient
    pub r: f64,
    /// Sine term coefficient
    pub s: f64,
}

impl Default for MapParams {
    fn default() -> Self {
        Self { r: 3.9, s: 3.0 }
    }
}

impl MapParams {
    fn validate(&self) -> Result<(), ChaosError> {
        if !self.r.is_finite() || !self.s.is_finite() {
            return Err(ChaosError::NonFiniteParams {
                r: self.r,
                s: self.s,
            });
        }
        Ok(())
    }
}

/// Map a seed phrase to an initial value in `[0, 1)`.
///
/// SHA-256 of the UTF-8 phrase; the first 16 hex digits (the first 8 digest
/// bytes, big-endian) are read as an integer, reduced modulo 10^10 and
/// divided by 10^10.
pub fn derive_seed(phrase: &str) -> Result<f64, ChaosError> {
    if phrase.is_empty() {
        return Err(ChaosError::EmptySeed);
    }

    let digest = Sha256::digest(phrase.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let value = u64::from_be_bytes(prefix) % SEED_MODULUS;

    Ok(value as f64 / SEED_MODULUS as f64)
}

/// Trajectory of the logistic-sine map. Yields `x(1), x(2), ...` forever.
#[derive(Debug, Clone)]
pub struct LogisticSineMap {
    state: f64,
    params: MapParams,
}

impl LogisticSineMap {
    pub fn new(x0: f64, params: MapParams) -> Self {
        Self { state: x0, params }
    }

    /// Current value without advancing.
    pub fn state(&self) -> f64 {
        self.state
    }
}

impl Iterator for LogisticSineMap {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let MapParams { r, s } = self.params;
        let x = self.state;
        self.state = (r * x * (1.0 - x) + s * (PI * x).sin()).rem_euclid(1.0);
        Some(self.state)
    }
}

/// A bijection over `0..n`.
///
/// `apply` moves the item at index `p[i]` to position `i`; `apply_inverse`
/// undoes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation(Vec<usize>);

impl Permutation {
    pub fn identity(n: usize) -> Self {
        Self((0..n).collect())
    }

    /// Wrap an index vector, checking that it is a bijection over `0..len`.
    pub fn from_vec(indices: Vec<usize>) -> Result<Self, ChaosError> {
        let n = indices.len();
        let mut seen = vec![false; n];
        for &i in &indices {
            if i >= n {
                return Err(ChaosError::NotAPermutation(format!(
                    "index {} out of range for length {}",
                    i, n
                )));
            }
            if seen[i] {
                return Err(ChaosError::NotAPermutation(format!("duplicate index {}", i)));
            }
            seen[i] = true;
        }
        Ok(Self(indices))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }

    /// The argsort of this permutation: `inverse[p[i]] = i`.
    pub fn inverse(&self) -> Permutation {
        let mut inverse = vec![0usize; self.0.len()];
        for (position, &source) in self.0.iter().enumerate() {
            inverse[source] = position;
        }
        Permutation(inverse)
    }

    /// Reorder `items` so that `out[i] = items[p[i]]`.
    pub fn apply<T: Clone>(&self, items: &[T]) -> Result<Vec<T>, ChaosError> {
        if items.len() != self.0.len() {
            return Err(ChaosError::LengthMismatch {
                expected: self.0.len(),
                actual: items.len(),
            });
        }
        Ok(self.0.iter().map(|&i| items[i].clone()).collect())
    }

    /// Undo [`Permutation::apply`].
    pub fn apply_inverse<T: Clone>(&self, items: &[T]) -> Result<Vec<T>, ChaosError> {
        self.inverse().apply(items)
    }
}

/// Generate a permutation of `0..n` with the default map parameters.
pub fn permutation(seed: impl Into<Seed>, n: usize) -> Result<Permutation, ChaosError> {
    permutation_with(seed, n, MapParams::default())
}

/// Generate a permutation of `0..n`.
///
/// Each of the first `n` map values is paired with its step index and the
/// pairs are ranked by value, largest first. Equal values keep ascending
/// index order.
pub fn permutation_with(
    seed: impl Into<Seed>,
    n: usize,
    params: MapParams,
) -> Result<Permutation, ChaosError> {
    params.validate()?;
    let x0 = seed.into().initial_value()?;

    let mut ranked: Vec<(f64, usize)> = LogisticSineMap::new(x0, params)
        .take(n)
        .zip(0..n)
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    log::debug!("Generated chaotic permutation of length {}", n);
    Ok(Permutation(ranked.into_iter().map(|(_, i)| i).collect()))
}
