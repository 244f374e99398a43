//! Block scrambling
//!
//! A square grayscale image is cut into a `grid x grid` set of equal square
//! blocks in row-major order (left to right, top to bottom). Blocks are then
//! reordered by a [`Permutation`] and stitched back together.
//!
//! The image must already be square with a side divisible by `grid`.
//! Resizing to a reference size is the caller's job.

use crate::chaos::{ChaosError, Permutation};
use image::{imageops, GrayImage};
use thiserror::Error;

/// Default grid dimension (4x4 = 16 blocks).
pub const DEFAULT_GRID: u32 = 4;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScrambleError {
    #[error("Grid dimension must be at least 1")]
    InvalidGrid,
    #[error("Image must be square, got {width}x{height}")]
    NotSquare { width: u32, height: u32 },
    #[error("Image side {side} is not divisible by grid {grid}")]
    Indivisible { side: u32, grid: u32 },
    #[error("Expected {expected} blocks, got {actual}")]
    BlockCount { expected: usize, actual: usize },
    #[error("Blocks must all be {side}x{side}, found {width}x{height}")]
    BlockShape { side: u32, width: u32, height: u32 },
    #[error(transparent)]
    Permutation(#[from] ChaosError),
}

fn block_count(grid: u32) -> usize {
    (grid as usize) * (grid as usize)
}

/// Split a square image into `grid * grid` blocks, row-major.
pub fn divide(image: &GrayImage, grid: u32) -> Result<Vec<GrayImage>, ScrambleError> {
    if grid == 0 {
        return Err(ScrambleError::InvalidGrid);
    }
    let (width, height) = image.dimensions();
    if width != height {
        return Err(ScrambleError::NotSquare { width, height });
    }
    if width % grid != 0 {
        return Err(ScrambleError::Indivisible { side: width, grid });
    }

    let block = width / grid;
    let mut blocks = Vec::with_capacity(block_count(grid));
    for row in 0..grid {
        for col in 0..grid {
            blocks.push(imageops::crop_imm(image, col * block, row * block, block, block).to_image());
        }
    }
    Ok(blocks)
}

/// Reorder blocks so that output block `i` is input block `permutation[i]`.
pub fn scramble(
    blocks: &[GrayImage],
    permutation: &Permutation,
) -> Result<Vec<GrayImage>, ScrambleError> {
    Ok(permutation.apply(blocks)?)
}

/// Undo [`scramble`] given the same permutation.
pub fn descramble(
    blocks: &[GrayImage],
    permutation: &Permutation,
) -> Result<Vec<GrayImage>, ScrambleError> {
    Ok(permutation.apply_inverse(blocks)?)
}

/// Stitch `grid * grid` equal square blocks back into one image, `grid`
/// blocks per row.
pub fn rebuild(blocks: &[GrayImage], grid: u32) -> Result<GrayImage, ScrambleError> {
    if grid == 0 {
        return Err(ScrambleError::InvalidGrid);
    }
    if blocks.len() != block_count(grid) {
        return Err(ScrambleError::BlockCount {
            expected: block_count(grid),
            actual: blocks.len(),
        });
    }

    let side = blocks[0].width();
    for block in blocks {
        let (width, height) = block.dimensions();
        if width != side || height != side {
            return Err(ScrambleError::BlockShape {
                side,
                width,
                height,
            });
        }
    }

    let mut image = GrayImage::new(side * grid, side * grid);
    for (i, block) in blocks.iter().enumerate() {
        let row = i as u32 / grid;
        let col = i as u32 % grid;
        imageops::replace(&mut image, block, (col * side) as i64, (row * side) as i64);
    }
    Ok(image)
}

/// Divide, scramble and rebuild in one pass.
pub fn scramble_image(
    image: &GrayImage,
    permutation: &Permutation,
    grid: u32,
) -> Result<GrayImage, ScrambleError> {
    let blocks = divide(image, grid)?;
    rebuild(&scramble(&blocks, permutation)?, grid)
}

/// Inverse of [`scramble_image`].
pub fn descramble_image(
    image: &GrayImage,
    permutation: &Permutation,
    grid: u32,
) -> Result<GrayImage, ScrambleError> {
    let blocks = divide(image, grid)?;
    rebuild(&descramble(&blocks, permutation)?, grid)
}
