//! Protect / recover pipeline
//!
//! protect: grayscale → crop border → resize → scramble → encrypt → split
//! recover: combine → decrypt → descramble

use crate::config::Config;
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use std::path::{Path, PathBuf};
use veilqr_core::{
    decrypt_bytes, derive_key, descramble_image, encrypt, permutation_with, scramble_image,
    Permutation,
};
use veilqr_shares::{verify_complete, SecretSplitter, Share, XorSplitter};
use zeroize::Zeroizing;

/// Width and height, both u32 big-endian, ahead of the pixel rows.
const HEADER_LEN: usize = 8;

/// Samples below this count as dark when locating the code.
const CROP_THRESHOLD: u8 = 128;

/// Light margin kept around the dark bounding box.
const CROP_MARGIN: u32 = 5;

const SHARE_PREFIX: &str = "share-";
const SHARE_SUFFIX: &str = ".bin";

pub struct Pipeline<S = XorSplitter> {
    grid: u32,
    share_count: usize,
    reference_size: u32,
    permutation: Permutation,
    key: Zeroizing<[u8; 32]>,
    splitter: S,
}

impl Pipeline<XorSplitter> {
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_splitter(config, XorSplitter)
    }
}

impl<S: SecretSplitter> Pipeline<S> {
    pub fn with_splitter(config: &Config, splitter: S) -> Result<Self> {
        let grid = config.scheme.grid;
        let blocks = (grid as usize) * (grid as usize);
        let permutation = permutation_with(config.seed(), blocks, config.map_params())
            .context("Failed to derive block permutation")?;

        Ok(Self {
            grid,
            share_count: config.scheme.share_count,
            reference_size: config.scheme.reference_size,
            permutation,
            key: derive_key(config.passphrase()),
            splitter,
        })
    }

    pub fn share_count(&self) -> usize {
        self.share_count
    }

    /// Grayscale `image`, crop its quiet zone and resize it to the
    /// reference square.
    pub fn prepare(&self, image: &DynamicImage) -> GrayImage {
        let gray = crop_border(&image.to_luma8());
        if gray.dimensions() == (self.reference_size, self.reference_size) {
            return gray;
        }
        log::info!(
            "Resizing {}x{} input to {}x{}",
            gray.width(),
            gray.height(),
            self.reference_size,
            self.reference_size
        );
        imageops::resize(
            &gray,
            self.reference_size,
            self.reference_size,
            FilterType::Triangle,
        )
    }

    /// Scramble, encrypt and split a prepared image.
    pub fn protect(&self, image: &GrayImage) -> Result<Vec<Share>> {
        let scrambled = scramble_image(image, &self.permutation, self.grid)
            .context("Failed to scramble image")?;
        let payload = encrypt(&encode_image(&scrambled), &self.key)
            .context("Failed to encrypt scrambled image")?;
        let shares = self
            .splitter
            .split(&payload.to_bytes(), self.share_count)
            .context("Failed to split payload")?;

        log::info!(
            "Protected {}x{} image as {} shares of {} bytes",
            image.width(),
            image.height(),
            shares.len(),
            payload.encoded_len()
        );
        Ok(shares)
    }

    /// Combine the complete share set and undo every protect step.
    pub fn recover(&self, shares: &[Share]) -> Result<GrayImage> {
        let total = u8::try_from(self.share_count).context("share count exceeds 255")?;
        verify_complete(shares, total).context("Share set is not complete")?;

        let combined = self
            .splitter
            .combine(shares)
            .context("Failed to combine shares")?;
        let plaintext = decrypt_bytes(&combined, &self.key)
            .context("Failed to decrypt payload (wrong passphrase or damaged shares?)")?;
        let scrambled = decode_image(&plaintext)?;
        let image = descramble_image(&scrambled, &self.permutation, self.grid)
            .context("Failed to descramble image")?;

        log::info!("Recovered {}x{} image", image.width(), image.height());
        Ok(image)
    }
}

/// Crop to the bounding box of the dark pixels plus a small margin.
///
/// An image with no dark pixels is returned unchanged.
pub fn crop_border(image: &GrayImage) -> GrayImage {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[0] < CROP_THRESHOLD {
            let (left, top, right, bottom) = bounds.get_or_insert((x, y, x, y));
            *left = (*left).min(x);
            *top = (*top).min(y);
            *right = (*right).max(x);
            *bottom = (*bottom).max(y);
        }
    }

    let Some((left, top, right, bottom)) = bounds else {
        log::debug!("No dark pixels, skipping border crop");
        return image.clone();
    };

    let x = left.saturating_sub(CROP_MARGIN);
    let y = top.saturating_sub(CROP_MARGIN);
    let width = (right + 1 + CROP_MARGIN).min(image.width()) - x;
    let height = (bottom + 1 + CROP_MARGIN).min(image.height()) - y;

    log::debug!("Cropping border to {}x{} at ({}, {})", width, height, x, y);
    imageops::crop_imm(image, x, y, width, height).to_image()
}

// ============================================================================
// Payload encoding
// ============================================================================

pub fn encode_image(image: &GrayImage) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + image.as_raw().len());
    bytes.extend_from_slice(&image.width().to_be_bytes());
    bytes.extend_from_slice(&image.height().to_be_bytes());
    bytes.extend_from_slice(image.as_raw());
    bytes
}

pub fn decode_image(bytes: &[u8]) -> Result<GrayImage> {
    anyhow::ensure!(
        bytes.len() >= HEADER_LEN,
        "Payload too short: {} bytes",
        bytes.len()
    );
    let (header, pixels) = bytes.split_at(HEADER_LEN);
    let width = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    let height = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

    GrayImage::from_raw(width, height, pixels.to_vec()).with_context(|| {
        format!(
            "Payload holds {} pixels, header says {}x{}",
            pixels.len(),
            width,
            height
        )
    })
}

// ============================================================================
// Share files
// ============================================================================

pub fn share_path(dir: &Path, index: u8) -> PathBuf {
    dir.join(format!("{}{}{}", SHARE_PREFIX, index, SHARE_SUFFIX))
}

/// Write each share to `<dir>/share-<index>.bin`.
pub fn write_shares(dir: &Path, shares: &[Share]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut paths = Vec::with_capacity(shares.len());
    for share in shares {
        let path = share_path(dir, share.index);
        std::fs::write(&path, &share.data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("Wrote {}", path.display());
        paths.push(path);
    }
    Ok(paths)
}

/// Read every `share-<index>.bin` in `dir`, sorted by index.
pub fn read_shares(dir: &Path) -> Result<Vec<Share>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;

    let mut shares = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read {}", dir.display()))?
            .path();
        let Some(index) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(SHARE_PREFIX))
            .and_then(|rest| rest.strip_suffix(SHARE_SUFFIX))
            .and_then(|index| index.parse::<u8>().ok())
        else {
            continue;
        };
        let data =
            std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        shares.push(Share { index, data });
    }

    anyhow::ensure!(!shares.is_empty(), "No share files in {}", dir.display());
    shares.sort_by_key(|share| share.index);
    Ok(shares)
}

// ============================================================================
// Test card
// ============================================================================

const CARD_MODULES: u32 = 25;

/// A QR-like test card: three finder patterns and a fixed module pattern
/// on a white background.
pub fn test_card(size: u32) -> GrayImage {
    let module = (size / CARD_MODULES).max(1);
    let dark = |mx: u32, my: u32| -> bool {
        let finder = |ox: u32, oy: u32| -> Option<bool> {
            if mx < ox || my < oy || mx >= ox + 7 || my >= oy + 7 {
                return None;
            }
            let (dx, dy) = (mx - ox, my - oy);
            let ring = dx.min(dy).min(6 - dx).min(6 - dy);
            Some(ring != 1)
        };
        let far = CARD_MODULES - 7;
        if let Some(v) = finder(0, 0).or(finder(far, 0)).or(finder(0, far)) {
            return v;
        }
        // Separators around the finders stay light
        if (mx < 8 && my < 8) || (mx >= far - 1 && my < 8) || (mx < 8 && my >= far - 1) {
            return false;
        }
        (mx * 7 + my * 13 + mx * my) % 3 == 0
    };

    GrayImage::from_fn(size, size, |x, y| {
        let (mx, my) = (x / module, y / module);
        if mx < CARD_MODULES && my < CARD_MODULES && dark(mx, my) {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}
