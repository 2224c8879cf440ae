//! Pattern colorization.
//!
//! Pattern documents are monochrome alpha masks. They are combined with the
//! paper's fill: drawn over it in soft-light mode for positive intensity,
//! or used to cut the fill out for negative intensity.

use image::{Rgba, RgbaImage};

use super::gradient::{generate_dithered_gradient, generate_gradient, is_pattern_inverted};
use crate::color::Color;
use crate::pixmap::SizePx;

/// Scales one channel by a mask alpha, treating alpha as `(a + 1) / 256`.
#[inline]
pub fn shifted_multiply(channel: u8, alpha: u8) -> u8 {
    ((u32::from(channel) * (u32::from(alpha) + 1)) >> 8) as u8
}

/// Colors a mask with a single fill color.
///
/// Every channel of `color`, alpha included, is scaled by the mask alpha
/// with [`shifted_multiply`]. The output is premultiplied.
pub fn colorize_pattern(mask: &RgbaImage, color: Color) -> RgbaImage {
    let fill = color.to_rgba();
    RgbaImage::from_fn(mask.width(), mask.height(), |x, y| {
        let alpha = mask.get_pixel(x, y)[3];
        Rgba(fill.0.map(|channel| shifted_multiply(channel, alpha)))
    })
}

/// Masks a premultiplied fill in place: each pixel is scaled by the alpha of
/// the matching mask pixel.
pub fn mask_fill(fill: &mut RgbaImage, mask: &RgbaImage) {
    for (pixel, mask_pixel) in fill.pixels_mut().zip(mask.pixels()) {
        let alpha = mask_pixel[3];
        pixel.0 = pixel.0.map(|channel| shifted_multiply(channel, alpha));
    }
}

/// Turns a mask white, keeping its alpha. The output is premultiplied.
pub fn invert_pattern(mask: &RgbaImage) -> RgbaImage {
    RgbaImage::from_fn(mask.width(), mask.height(), |x, y| {
        let alpha = mask.get_pixel(x, y)[3];
        Rgba([alpha; 4])
    })
}

/// Composes a pattern mask with its background fill.
///
/// `opacity` is the pattern intensity as a fraction in `-1.0..=1.0`. With
/// `dither` set, multi-color fills under a non-negative intensity are
/// dithered. The output is premultiplied and has the size of `mask`.
pub fn prepare_pattern_image(
    mask: &RgbaImage,
    colors: &[Color],
    rotation: i32,
    opacity: f32,
    dither: bool,
) -> RgbaImage {
    let size = SizePx::of(mask);
    let mut result = if dither && colors.len() > 1 && opacity >= 0.0 {
        generate_dithered_gradient(size, colors, rotation)
    } else {
        generate_gradient(size, colors, rotation)
    };
    if opacity >= 0.0 {
        let inverted = is_pattern_inverted(colors, opacity);
        soft_light_over(&mut result, mask, opacity, inverted);
    } else {
        mask_fill(&mut result, mask);
        if opacity > -1.0 {
            darken(&mut result, 1.0 + opacity);
        }
    }
    result
}

/// Draws the mask over an opaque fill in soft-light mode.
///
/// The mask color is taken from its own pixels, or white when `inverted`.
fn soft_light_over(fill: &mut RgbaImage, mask: &RgbaImage, opacity: f32, inverted: bool) {
    for (pixel, mask_pixel) in fill.pixels_mut().zip(mask.pixels()) {
        let [mr, mg, mb, ma] = mask_pixel.0;
        if ma == 0 {
            continue;
        }
        let source = if inverted { [255, 255, 255] } else { [mr, mg, mb] };
        let weight = opacity * f32::from(ma) / 255.0;
        for (channel, s) in pixel.0.iter_mut().zip(source) {
            let d = f32::from(*channel) / 255.0;
            let blended = soft_light(d, f32::from(s) / 255.0);
            let out = d + (blended - d) * weight;
            *channel = (out * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// The W3C soft-light blend of source `s` onto destination `d`.
fn soft_light(d: f32, s: f32) -> f32 {
    if s <= 0.5 {
        d - (1.0 - 2.0 * s) * d * (1.0 - d)
    } else {
        let lifted = if d <= 0.25 {
            ((16.0 * d - 12.0) * d + 4.0) * d
        } else {
            d.sqrt()
        };
        d + (2.0 * s - 1.0) * (lifted - d)
    }
}

/// Draws opaque black over a premultiplied image at `amount`.
fn darken(image: &mut RgbaImage, amount: f32) {
    let keep = 1.0 - amount.clamp(0.0, 1.0);
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let scale = |c: u8| (f32::from(c) * keep).round() as u8;
        let alpha = (amount * 255.0 + f32::from(a) * keep).round().clamp(0.0, 255.0) as u8;
        pixel.0 = [scale(r), scale(g), scale(b), alpha];
    }
}
