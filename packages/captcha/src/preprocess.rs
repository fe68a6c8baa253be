//! CAPTCHA image normalization.
//!
//! Turns an arbitrary raster CAPTCHA into a strictly binary, upscaled image
//! that single-word OCR handles well:
//!
//! 1. decode and convert to 8-bit grayscale
//! 2. upscale 3x with Catmull-Rom (cubic) interpolation
//! 3. Otsu global threshold
//! 4. one closing then one opening with a 2x2 structuring element
//! 5. 3x3 Gaussian blur
//! 6. adaptive Gaussian threshold (block 11, offset 2)
//!
//! Erosion and dilation are implemented as an adjoint pair (dilation uses
//! the reflected structuring element, out-of-bounds neighbours are skipped),
//! so opening and closing are idempotent.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};

use crate::CaptchaError;

/// Upscale factor applied before thresholding.
pub const UPSCALE_FACTOR: u32 = 3;

/// Largest accepted source width or height.
pub const MAX_SOURCE_DIMENSION: u32 = 1024;

/// Neighbourhood size of the adaptive threshold.
pub const ADAPTIVE_BLOCK_SIZE: u32 = 11;

/// Constant subtracted from the local mean by the adaptive threshold.
pub const ADAPTIVE_OFFSET: i32 = 2;

/// 2x2 structuring element, anchored at its top-left cell.
const STRUCTURING_ELEMENT: [(i64, i64); 4] = [(0, 0), (1, 0), (0, 1), (1, 1)];

/// Runs the full pipeline on encoded image bytes.
///
/// # Errors
///
/// Returns [`CaptchaError::Decode`] if the bytes are not a supported image,
/// [`CaptchaError::EmptyImage`] if the image has no pixels, and
/// [`CaptchaError::TooLarge`] if either side exceeds
/// [`MAX_SOURCE_DIMENSION`].
pub fn preprocess(image_bytes: &[u8]) -> Result<GrayImage, CaptchaError> {
    let gray = image::load_from_memory(image_bytes)?.to_luma8();
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(CaptchaError::EmptyImage);
    }
    if width > MAX_SOURCE_DIMENSION || height > MAX_SOURCE_DIMENSION {
        return Err(CaptchaError::TooLarge { width, height });
    }

    let upscaled = image::imageops::resize(
        &gray,
        gray.width() * UPSCALE_FACTOR,
        gray.height() * UPSCALE_FACTOR,
        FilterType::CatmullRom,
    );

    let cleaned = binarize(&upscaled);
    let blurred = gaussian_blur_3x3(&cleaned);

    Ok(adaptive_threshold(
        &blurred,
        ADAPTIVE_BLOCK_SIZE,
        ADAPTIVE_OFFSET,
    ))
}

/// Runs [`preprocess`] and encodes the result as PNG for the OCR engine.
///
/// # Errors
///
/// Returns [`CaptchaError`] if decoding or PNG encoding fails.
pub fn preprocess_to_png(image_bytes: &[u8]) -> Result<Vec<u8>, CaptchaError> {
    let processed = preprocess(image_bytes)?;
    encode_png(&processed)
}

/// Encodes a grayscale image as PNG bytes.
///
/// # Errors
///
/// Returns [`CaptchaError::Encode`] if the encoder fails.
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>, CaptchaError> {
    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(CaptchaError::Encode)?;
    Ok(buf)
}

/// Otsu threshold followed by one closing and one opening.
///
/// Idempotent: applying it to its own output returns the same image.
#[must_use]
pub fn binarize(img: &GrayImage) -> GrayImage {
    let level = otsu_level(img);
    let thresholded = threshold(img, level);
    open(&close(&thresholded))
}

/// Computes the Otsu threshold level of an image.
///
/// Pixels strictly above the returned level belong to the foreground. A
/// two-valued `0`/`255` image yields `0`, which leaves it unchanged.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn otsu_level(img: &GrayImage) -> u8 {
    let mut histogram = [0_u64; 256];
    for pixel in img.pixels() {
        histogram[usize::from(pixel[0])] += 1;
    }

    let total = u64::from(img.width()) * u64::from(img.height());
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut background_weight = 0_u64;
    let mut background_sum = 0.0_f64;
    let mut best_variance = 0.0_f64;
    let mut best_level = 0_u8;

    for (level, &count) in histogram.iter().enumerate() {
        background_weight += count;
        if background_weight == 0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += level as f64 * count as f64;
        let background_mean = background_sum / background_weight as f64;
        let foreground_mean = (weighted_total - background_sum) / foreground_weight as f64;
        let spread = background_mean - foreground_mean;
        let variance = background_weight as f64 * foreground_weight as f64 * spread * spread;

        if variance > best_variance {
            best_variance = variance;
            best_level = u8::try_from(level).unwrap_or(u8::MAX);
        }
    }

    best_level
}

/// Maps pixels above `level` to 255 and everything else to 0.
#[must_use]
pub fn threshold(img: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[0] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Morphological closing (dilation, then erosion).
#[must_use]
pub fn close(img: &GrayImage) -> GrayImage {
    erode(&dilate(img))
}

/// Morphological opening (erosion, then dilation).
#[must_use]
pub fn open(img: &GrayImage) -> GrayImage {
    dilate(&erode(img))
}

/// Minimum over the structuring element placed at each pixel.
#[must_use]
pub fn erode(img: &GrayImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let value = STRUCTURING_ELEMENT
            .iter()
            .filter_map(|&(dx, dy)| sample(img, i64::from(x) + dx, i64::from(y) + dy))
            .min()
            .unwrap_or(u8::MAX);
        Luma([value])
    })
}

/// Maximum over the reflected structuring element placed at each pixel.
#[must_use]
pub fn dilate(img: &GrayImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let value = STRUCTURING_ELEMENT
            .iter()
            .filter_map(|&(dx, dy)| sample(img, i64::from(x) - dx, i64::from(y) - dy))
            .max()
            .unwrap_or(u8::MIN);
        Luma([value])
    })
}

/// 3x3 Gaussian blur with `[1, 2, 1]` weights and replicated borders.
#[must_use]
pub fn gaussian_blur_3x3(img: &GrayImage) -> GrayImage {
    const WEIGHTS: [u32; 3] = [1, 2, 1];

    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let mut acc = 0_u32;
        for (wy, ky) in WEIGHTS.iter().zip(-1_i64..=1) {
            for (wx, kx) in WEIGHTS.iter().zip(-1_i64..=1) {
                let value = clamped(img, i64::from(x) + kx, i64::from(y) + ky);
                acc += wx * wy * u32::from(value);
            }
        }
        Luma([u8::try_from((acc + 8) / 16).unwrap_or(u8::MAX)])
    })
}

/// Adaptive threshold against a Gaussian-weighted local mean.
///
/// A pixel becomes 255 when it is brighter than the local mean minus
/// `offset`, otherwise 0. The output is strictly two-valued.
#[must_use]
pub fn adaptive_threshold(img: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let kernel = gaussian_kernel(block_size);
    let local_mean = separable_filter(img, &kernel);

    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let src = i32::from(img.get_pixel(x, y)[0]);
        let mean = i32::from(local_mean.get_pixel(x, y)[0]);
        if src > mean - offset {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Normalized 1-D Gaussian kernel with the sigma OpenCV-style adaptive
/// thresholding derives from the block size.
#[allow(clippy::cast_precision_loss)]
fn gaussian_kernel(size: u32) -> Vec<f64> {
    let size = size.max(1) | 1;
    let sigma = 0.3 * ((f64::from(size) - 1.0) * 0.5 - 1.0) + 0.8;
    let half = i64::from(size / 2);

    let raw: Vec<f64> = (-half..=half)
        .map(|i| {
            let i = i as f64;
            (-(i * i) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();

    raw.into_iter().map(|w| w / sum).collect()
}

/// Applies a symmetric 1-D kernel horizontally then vertically.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
fn separable_filter(img: &GrayImage, kernel: &[f64]) -> GrayImage {
    let half = (kernel.len() / 2) as i64;
    let (width, height) = img.dimensions();

    let mut horizontal = vec![0.0_f64; (width as usize) * (height as usize)];
    for y in 0..height {
        for x in 0..width {
            let acc: f64 = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let sx = i64::from(x) + k as i64 - half;
                    w * f64::from(clamped(img, sx, i64::from(y)))
                })
                .sum();
            horizontal[y as usize * width as usize + x as usize] = acc;
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let acc: f64 = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| {
                let sy = (i64::from(y) + k as i64 - half).clamp(0, i64::from(height) - 1);
                w * horizontal[sy as usize * width as usize + x as usize]
            })
            .sum();
        Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}

/// Pixel value at `(x, y)`, or `None` outside the image.
fn sample(img: &GrayImage, x: i64, y: i64) -> Option<u8> {
    let x = u32::try_from(x).ok()?;
    let y = u32::try_from(y).ok()?;
    if x < img.width() && y < img.height() {
        Some(img.get_pixel(x, y)[0])
    } else {
        None
    }
}

/// Pixel value with coordinates clamped to the image bounds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamped(img: &GrayImage, x: i64, y: i64) -> u8 {
    let x = x.clamp(0, i64::from(img.width()) - 1) as u32;
    let y = y.clamp(0, i64::from(img.height()) - 1) as u32;
    img.get_pixel(x, y)[0]
}
