//! VeilQR Verify
//!
//! Measures how faithfully a reconstructed image matches the original.
//!
//! - [`psnr`]: peak signal-to-noise ratio in dB, infinite for identical images
//! - [`cross_correlation`]: Pearson correlation of the z-scored pixels
//! - [`ssim`]: structural similarity with a 7x7 window and data range 255
//!
//! All metrics are pure functions over two [`image::GrayImage`]s of the same
//! dimensions. They never resize: [`align_for_comparison`] is the helper for
//! callers whose images differ in shape or channel count.

pub mod metrics;
pub mod report;

pub use metrics::{align_for_comparison, cross_correlation, psnr, ssim, DATA_RANGE, SSIM_WINDOW};
pub use report::QualityReport;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    #[error("Shape mismatch: {left_width}x{left_height} vs {right_width}x{right_height}")]
    ShapeMismatch {
        left_width: u32,
        left_height: u32,
        right_width: u32,
        right_height: u32,
    },
    #[error("Images are empty")]
    Empty,
    #[error("Image {width}x{height} is smaller than the {min}x{min} SSIM window")]
    ImageTooSmall { width: u32, height: u32, min: u32 },
    #[error("Correlation is undefined for a constant image")]
    ZeroVariance,
}
