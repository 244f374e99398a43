//! Combined quality report

use crate::metrics::{cross_correlation, psnr, ssim};
use crate::MetricsError;
use image::GrayImage;
use std::fmt;

/// All three metrics for one original/reconstruction pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityReport {
    /// dB, `f64::INFINITY` for a lossless reconstruction
    pub psnr: f64,
    /// `None` when either image is constant
    pub cross_correlation: Option<f64>,
    pub ssim: f64,
}

impl QualityReport {
    /// Compute every metric. A constant image leaves `cross_correlation`
    /// empty instead of failing the whole report.
    pub fn evaluate(original: &GrayImage, reconstructed: &GrayImage) -> Result<Self, MetricsError> {
        let psnr = psnr(original, reconstructed)?;
        let cross_correlation = match cross_correlation(original, reconstructed) {
            Ok(value) => Some(value),
            Err(MetricsError::ZeroVariance) => {
                log::warn!("Constant image, skipping cross-correlation");
                None
            }
            Err(e) => return Err(e),
        };
        let ssim = ssim(original, reconstructed)?;

        let report = Self {
            psnr,
            cross_correlation,
            ssim,
        };
        log::debug!("{:?}", report);
        Ok(report)
    }

    /// True when the reconstruction is bit-exact.
    pub fn is_lossless(&self) -> bool {
        self.psnr.is_infinite() && self.psnr > 0.0
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.psnr.is_infinite() {
            writeln!(f, "PSNR: inf dB (identical)")?;
        } else {
            writeln!(f, "PSNR: {:.2} dB (higher is better)", self.psnr)?;
        }
        match self.cross_correlation {
            Some(ncc) => writeln!(f, "Cross-correlation: {:.4} (closer to 1 is better)", ncc)?,
            None => writeln!(f, "Cross-correlation: undefined (constant image)")?,
        }
        write!(f, "SSIM: {:.4} (closer to 1 is better)", self.ssim)
    }
}
