use image::{GrayImage, ImageBuffer, Luma, RgbaImage};

use crate::automation::config::PixelRect;

/// Sigma matching a 5x5 Gaussian kernel with automatic sigma.
const BLUR_SIGMA: f32 = 1.1;

/// Pixels brighter than this become background.
const BINARY_THRESHOLD: u8 = 150;

/// Crops a sub-region from an image using absolute pixel coordinates.
///
/// The rectangle is clamped to the image bounds; a rectangle entirely outside
/// the image yields an empty image.
pub fn crop_region(img: &RgbaImage, region: &PixelRect) -> RgbaImage {
    let (w, h) = img.dimensions();

    let x0 = region.left.min(w);
    let y0 = region.upper.min(h);
    let x1 = region.right.min(w).max(x0);
    let y1 = region.lower.min(h).max(y0);

    image::imageops::crop_imm(img, x0, y0, x1 - x0, y1 - y0).to_image()
}

/// Converts to grayscale with the ITU-R BT.601 luma formula: Y = 0.299*R + 0.587*G + 0.114*B
///
/// Not `image::imageops::grayscale`: that uses Rec.709 weights, which shift
/// pixels across the binary threshold relative to OpenCV's BGR2GRAY.
pub fn to_grayscale(img: &RgbaImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let r = pixel[0] as f32;
        let g = pixel[1] as f32;
        let b = pixel[2] as f32;
        let luma = (0.299 * r + 0.587 * g + 0.114 * b).round().clamp(0.0, 255.0);
        output.put_pixel(x, y, Luma([luma as u8]));
    }

    output
}

/// Inverted binary threshold: pixels above `threshold` become black, the rest white.
///
/// Dark digits on a light card end up as white strokes on black.
pub fn threshold_inverted(img: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel[0] > threshold { 0u8 } else { 255u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Applies `pick` over the 3x3 neighbourhood of every pixel.
/// Neighbours outside the image are ignored.
fn apply_3x3(img: &GrayImage, pick: fn(u8, u8) -> u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut acc = img.get_pixel(x, y)[0];
            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    acc = pick(acc, img.get_pixel(nx, ny)[0]);
                }
            }
            output.put_pixel(x, y, Luma([acc]));
        }
    }

    output
}

pub fn dilate_3x3(img: &GrayImage) -> GrayImage {
    apply_3x3(img, u8::max)
}

pub fn erode_3x3(img: &GrayImage) -> GrayImage {
    apply_3x3(img, u8::min)
}

/// Morphological close (dilate then erode) with a 3x3 square kernel.
/// Fills small gaps inside the white strokes.
pub fn close_3x3(img: &GrayImage) -> GrayImage {
    erode_3x3(&dilate_3x3(img))
}

/// Full preprocessing chain for digit OCR:
/// grayscale, Gaussian blur, inverted threshold, morphological close.
pub fn preprocess_for_digits(img: &RgbaImage) -> GrayImage {
    if img.width() == 0 || img.height() == 0 {
        return GrayImage::new(img.width(), img.height());
    }

    let gray = to_grayscale(img);
    let blurred = image::imageops::blur(&gray, BLUR_SIGMA);
    let binary = threshold_inverted(&blurred, BINARY_THRESHOLD);
    close_3x3(&binary)
}
