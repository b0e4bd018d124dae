// ============================================================
// Layer 4 — Image Transform
// ============================================================
// Preprocessing deliberately avoids anything that would distort
// the aesthetic content of a photograph — no color jitter, no
// flips, no rotation. Only:
//
//   1. Convert to RGB (grayscale/paletted inputs would otherwise
//      break the 3-channel contract)
//   2. Resize so the shorter side is 512 px, preserving aspect
//   3. Random-crop a 512→256 square (the one augmentation)
//   4. Normalize u8 pixels to f32 in [0, 1], channel-major (CHW)
//
// The output side length is the model's fixed input contract.

use image::{imageops::FilterType, DynamicImage, RgbImage};
use rand::Rng;

/// Shorter-side target before cropping.
pub const RESIZE_TO: u32 = 512;

/// Side length of the square crop fed to the model.
pub const CROP_TO: u32 = 256;

/// Preprocess one decoded image into a CHW float buffer of length
/// `3 * CROP_TO * CROP_TO`, values in [0, 1].
pub fn prepare(image: &DynamicImage, rng: &mut impl Rng) -> Vec<f32> {
    let resized = resize_shorter_side(image, RESIZE_TO);
    let cropped = random_crop(&resized, CROP_TO, rng);
    to_chw(&cropped)
}

/// Inference-time variant: same resize, but a center crop so the
/// same photo always yields the same tensor.
pub fn prepare_eval(image: &DynamicImage) -> Vec<f32> {
    let resized = resize_shorter_side(image, RESIZE_TO);
    let x = (resized.width() - CROP_TO) / 2;
    let y = (resized.height() - CROP_TO) / 2;
    let cropped = image::imageops::crop_imm(&resized, x, y, CROP_TO, CROP_TO).to_image();
    to_chw(&cropped)
}

/// Scale so the shorter side equals `target`, keeping aspect ratio.
fn resize_shorter_side(image: &DynamicImage, target: u32) -> RgbImage {
    let (w, h) = (image.width().max(1), image.height().max(1));
    let (new_w, new_h) = if w <= h {
        (target, ((h as u64 * target as u64) / w as u64).max(target as u64) as u32)
    } else {
        (((w as u64 * target as u64) / h as u64).max(target as u64) as u32, target)
    };
    image.resize_exact(new_w, new_h, FilterType::Triangle).to_rgb8()
}

/// Take a random `side`×`side` window. The resize step guarantees
/// both dimensions are at least `side`.
fn random_crop(image: &RgbImage, side: u32, rng: &mut impl Rng) -> RgbImage {
    let max_x = image.width() - side;
    let max_y = image.height() - side;
    let x = if max_x == 0 { 0 } else { rng.gen_range(0..=max_x) };
    let y = if max_y == 0 { 0 } else { rng.gen_range(0..=max_y) };
    image::imageops::crop_imm(image, x, y, side, side).to_image()
}

/// Interleaved RGB bytes → planar CHW floats in [0, 1].
fn to_chw(image: &RgbImage) -> Vec<f32> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let raw = image.as_raw();
    let mut out = vec![0.0f32; 3 * w * h];
    for y in 0..h {
        for x in 0..w {
            let base = (y * w + x) * 3;
            for c in 0..3 {
                out[c * w * h + y * w + x] = raw[base + c] as f32 / 255.0;
            }
        }
    }
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gradient_image(w: u32, h: u32) -> DynamicImage {
        let img = RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn output_shape_and_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let pixels = prepare(&gradient_image(800, 600), &mut rng);
        assert_eq!(pixels.len(), 3 * (CROP_TO * CROP_TO) as usize);
        assert!(pixels.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn upscales_small_images_before_cropping() {
        // A 100x80 input must still yield a full 256 crop.
        let mut rng = StdRng::seed_from_u64(7);
        let pixels = prepare(&gradient_image(100, 80), &mut rng);
        assert_eq!(pixels.len(), 3 * (CROP_TO * CROP_TO) as usize);
    }

    #[test]
    fn crop_is_deterministic_under_a_seeded_rng() {
        let image = gradient_image(1024, 768);
        let a = prepare(&image, &mut StdRng::seed_from_u64(3));
        let b = prepare(&image, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn eval_preparation_needs_no_rng_and_is_stable() {
        let image = gradient_image(640, 480);
        let a = prepare_eval(&image);
        let b = prepare_eval(&image);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3 * (CROP_TO * CROP_TO) as usize);
    }

    #[test]
    fn chw_layout_separates_channels() {
        // Solid-color image: every value within a channel plane is equal.
        let img = RgbImage::from_pixel(4, 4, image::Rgb([255, 0, 128]));
        let chw = to_chw(&img);
        assert!(chw[0..16].iter().all(|&v| v == 1.0));
        assert!(chw[16..32].iter().all(|&v| v == 0.0));
        assert!(chw[32..48].iter().all(|&v| (v - 128.0 / 255.0).abs() < 1e-6));
    }
}
