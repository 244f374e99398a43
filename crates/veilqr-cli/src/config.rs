//! CLI configuration, parsed from a TOML file plus environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use veilqr_core::{MapParams, Seed};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scrambling and sharing parameters
    #[serde(default)]
    pub scheme: SchemeSection,

    /// Seed and passphrase
    #[serde(default)]
    pub secrets: SecretsSection,

    #[serde(default)]
    pub logging: LoggingSection,

    /// Cipher timing settings
    #[serde(default)]
    pub bench: BenchSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeSection {
    /// Blocks per side; the image is cut into `grid * grid` blocks
    #[serde(default = "default_grid")]
    pub grid: u32,

    /// Number of shares to produce (all are needed to recover)
    #[serde(default = "default_share_count")]
    pub share_count: usize,

    /// Side in pixels that inputs are resized to before scrambling
    #[serde(default = "default_reference_size")]
    pub reference_size: u32,

    #[serde(default = "default_logistic_r")]
    pub logistic_r: f64,

    #[serde(default = "default_sine_s")]
    pub sine_s: f64,
}

impl Default for SchemeSection {
    fn default() -> Self {
        Self {
            grid: default_grid(),
            share_count: default_share_count(),
            reference_size: default_reference_size(),
            logistic_r: default_logistic_r(),
            sine_s: default_sine_s(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsSection {
    /// Seed phrase for the block permutation
    #[serde(default)]
    pub seed: String,

    /// Cipher passphrase (falls back to the seed)
    pub passphrase: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchSection {
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Size of the random payload that is encrypted and decrypted
    #[serde(default = "default_payload_bytes")]
    pub payload_bytes: usize,
}

impl Default for BenchSection {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            payload_bytes: default_payload_bytes(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_grid() -> u32 {
    veilqr_core::DEFAULT_GRID
}

fn default_share_count() -> usize {
    4
}

fn default_reference_size() -> u32 {
    400
}

fn default_logistic_r() -> f64 {
    MapParams::default().r
}

fn default_sine_s() -> f64 {
    MapParams::default().s
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_iterations() -> u32 {
    10
}

fn default_payload_bytes() -> usize {
    16000
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `VEILQR_SEED`
    /// - `VEILQR_PASSPHRASE`
    /// - `VEILQR_SHARE_COUNT`
    /// - `VEILQR_GRID`
    /// - `VEILQR_REFERENCE_SIZE`
    /// - `VEILQR_LOG_LEVEL`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("VEILQR_SEED") {
            self.secrets.seed = v;
        }
        if let Ok(v) = std::env::var("VEILQR_PASSPHRASE") {
            self.secrets.passphrase = Some(v);
        }
        if let Ok(v) = std::env::var("VEILQR_SHARE_COUNT") {
            if let Ok(count) = v.parse::<usize>() {
                self.scheme.share_count = count;
            }
        }
        if let Ok(v) = std::env::var("VEILQR_GRID") {
            if let Ok(grid) = v.parse::<u32>() {
                self.scheme.grid = grid;
            }
        }
        if let Ok(v) = std::env::var("VEILQR_REFERENCE_SIZE") {
            if let Ok(size) = v.parse::<u32>() {
                self.scheme.reference_size = size;
            }
        }
        if let Ok(v) = std::env::var("VEILQR_LOG_LEVEL") {
            self.logging.log_level = v;
        }
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.secrets.seed.is_empty(),
            "secrets.seed must not be empty (set it in the config file or VEILQR_SEED)"
        );

        anyhow::ensure!(self.scheme.grid >= 1, "scheme.grid must be >= 1");
        anyhow::ensure!(
            self.scheme.reference_size > 0,
            "scheme.reference_size must be > 0"
        );
        anyhow::ensure!(
            self.scheme.reference_size % self.scheme.grid == 0,
            "scheme.reference_size ({}) must be divisible by scheme.grid ({})",
            self.scheme.reference_size,
            self.scheme.grid
        );

        anyhow::ensure!(
            (veilqr_shares::MIN_SHARES..=veilqr_shares::MAX_SHARES)
                .contains(&self.scheme.share_count),
            "scheme.share_count must be between {} and {}",
            veilqr_shares::MIN_SHARES,
            veilqr_shares::MAX_SHARES
        );

        anyhow::ensure!(
            self.scheme.logistic_r.is_finite() && self.scheme.sine_s.is_finite(),
            "scheme.logistic_r and scheme.sine_s must be finite"
        );

        anyhow::ensure!(self.bench.iterations >= 1, "bench.iterations must be >= 1");

        Ok(())
    }

    pub fn seed(&self) -> Seed {
        Seed::from(self.secrets.seed.as_str())
    }

    pub fn map_params(&self) -> MapParams {
        MapParams {
            r: self.scheme.logistic_r,
            s: self.scheme.sine_s,
        }
    }

    /// The cipher passphrase, or the seed when none is configured.
    pub fn passphrase(&self) -> &str {
        self.secrets
            .passphrase
            .as_deref()
            .unwrap_or(&self.secrets.seed)
    }
}

// ============================================================================
// Tests
// ============================================================================
