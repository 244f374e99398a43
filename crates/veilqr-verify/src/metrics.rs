//! Image fidelity metrics

use crate::MetricsError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};

/// Peak sample value of 8-bit images.
pub const DATA_RANGE: f64 = 255.0;

/// Side of the square SSIM window.
pub const SSIM_WINDOW: u32 = 7;

const K1: f64 = 0.01;
const K2: f64 = 0.03;

fn check_shape(a: &GrayImage, b: &GrayImage) -> Result<(), MetricsError> {
    if a.dimensions() != b.dimensions() {
        return Err(MetricsError::ShapeMismatch {
            left_width: a.width(),
            left_height: a.height(),
            right_width: b.width(),
            right_height: b.height(),
        });
    }
    if a.as_raw().is_empty() {
        return Err(MetricsError::Empty);
    }
    Ok(())
}

/// Peak signal-to-noise ratio: `20 * log10(255 / sqrt(MSE))`.
///
/// Returns `f64::INFINITY` when the images are identical.
pub fn psnr(a: &GrayImage, b: &GrayImage) -> Result<f64, MetricsError> {
    check_shape(a, b)?;

    let sum_sq: f64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();
    let mse = sum_sq / a.as_raw().len() as f64;

    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(20.0 * (DATA_RANGE / mse.sqrt()).log10())
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn zscore(image: &GrayImage) -> Result<Vec<f64>, MetricsError> {
    let values: Vec<f64> = image.as_raw().iter().map(|&v| v as f64).collect();
    let (mean, std) = mean_and_std(&values);
    if std == 0.0 {
        return Err(MetricsError::ZeroVariance);
    }
    Ok(values.into_iter().map(|v| (v - mean) / std).collect())
}

/// Normalized cross-correlation in `[-1, 1]`.
///
/// Each image is flattened and z-scored with its own mean and population
/// standard deviation, then the Pearson coefficient of the two is taken.
///
/// # Errors
/// `ZeroVariance` if either image is constant; the coefficient is undefined.
pub fn cross_correlation(a: &GrayImage, b: &GrayImage) -> Result<f64, MetricsError> {
    check_shape(a, b)?;
    let za = zscore(a)?;
    let zb = zscore(b)?;

    let (mean_a, std_a) = mean_and_std(&za);
    let (mean_b, std_b) = mean_and_std(&zb);
    let cov = za
        .iter()
        .zip(&zb)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / za.len() as f64;

    Ok((cov / (std_a * std_b)).clamp(-1.0, 1.0))
}

/// Summed-area table with a zero guard row and column.
struct Integral {
    stride: usize,
    table: Vec<u64>,
}

impl Integral {
    fn new(width: u32, height: u32, value: impl Fn(u32, u32) -> u64) -> Self {
        let stride = width as usize + 1;
        let mut table = vec![0u64; stride * (height as usize + 1)];
        for y in 0..height {
            for x in 0..width {
                let idx = (y as usize + 1) * stride + x as usize + 1;
                table[idx] = value(x, y) + table[idx - 1] + table[idx - stride]
                    - table[idx - stride - 1];
            }
        }
        Self { stride, table }
    }

    /// Sum over the `size x size` window with top-left corner `(x, y)`.
    fn window(&self, x: u32, y: u32, size: u32) -> u64 {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + size as usize, y0 + size as usize);
        let at = |x: usize, y: usize| self.table[y * self.stride + x];
        (at(x1, y1) + at(x0, y0)) - (at(x1, y0) + at(x0, y1))
    }
}

/// Structural similarity index.
///
/// Local statistics come from a 7x7 uniform window with sample covariance,
/// `K1 = 0.01`, `K2 = 0.03` and data range 255. The SSIM map is averaged over
/// the interior where the window fits entirely inside the image.
pub fn ssim(a: &GrayImage, b: &GrayImage) -> Result<f64, MetricsError> {
    check_shape(a, b)?;
    let (width, height) = a.dimensions();
    if width < SSIM_WINDOW || height < SSIM_WINDOW {
        return Err(MetricsError::ImageTooSmall {
            width,
            height,
            min: SSIM_WINDOW,
        });
    }

    let pa = |x: u32, y: u32| a.get_pixel(x, y).0[0] as u64;
    let pb = |x: u32, y: u32| b.get_pixel(x, y).0[0] as u64;
    let sum_a = Integral::new(width, height, pa);
    let sum_b = Integral::new(width, height, pb);
    let sum_aa = Integral::new(width, height, |x, y| pa(x, y) * pa(x, y));
    let sum_bb = Integral::new(width, height, |x, y| pb(x, y) * pb(x, y));
    let sum_ab = Integral::new(width, height, |x, y| pa(x, y) * pb(x, y));

    let np = (SSIM_WINDOW * SSIM_WINDOW) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let mut total = 0.0;
    let mut count = 0usize;
    for y in 0..=height - SSIM_WINDOW {
        for x in 0..=width - SSIM_WINDOW {
            let ux = sum_a.window(x, y, SSIM_WINDOW) as f64 / np;
            let uy = sum_b.window(x, y, SSIM_WINDOW) as f64 / np;
            let uxx = sum_aa.window(x, y, SSIM_WINDOW) as f64 / np;
            let uyy = sum_bb.window(x, y, SSIM_WINDOW) as f64 / np;
            let uxy = sum_ab.window(x, y, SSIM_WINDOW) as f64 / np;

            let vx = cov_norm * (uxx - ux * ux);
            let vy = cov_norm * (uyy - uy * uy);
            let vxy = cov_norm * (uxy - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            count += 1;
        }
    }

    Ok(total / count as f64)
}

/// Bring two images into a comparable form: both grayscale, the candidate
/// resized (bilinear) to the reference's dimensions when they differ.
///
/// The metrics themselves never resize. This is the policy for callers
/// comparing a decoded reconstruction against an original of another size.
pub fn align_for_comparison(
    reference: &DynamicImage,
    candidate: &DynamicImage,
) -> (GrayImage, GrayImage) {
    let reference = reference.to_luma8();
    let mut candidate = candidate.to_luma8();

    if candidate.dimensions() != reference.dimensions() {
        log::debug!(
            "Resizing candidate {:?} to reference {:?}",
            candidate.dimensions(),
            reference.dimensions()
        );
        candidate = imageops::resize(
            &candidate,
            reference.width(),
            reference.height(),
            FilterType::Triangle,
        );
    }
    (reference, candidate)
}
