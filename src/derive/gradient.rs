//! Background fills: solid, linear and multi-point gradients.

use image::{Rgba, RgbaImage};
use palette::{Hsv, IntoColor, Srgb};

use crate::color::{average_color, Color};
use crate::pixmap::SizePx;

/// Fill used when a paper has no colors at all.
pub const DEFAULT_BACKGROUND_COLOR: Color = Color::rgb(213, 223, 233);

/// Darkest average brightness (HSV value) at which a pattern is still drawn
/// dark; below it the pattern is inverted to white.
const INVERTED_VALUE_THRESHOLD: f32 = 0.3;

/// Anchor points of the multi-color gradient, in unit coordinates.
const POINTS: [(f32, f32); 4] = [(0.80, 0.10), (0.35, 0.25), (0.20, 0.90), (0.65, 0.75)];

/// 4x4 ordered dither matrix.
const BAYER: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Rounding offset for a pixel: 0.5 plain, or its ordered dither threshold.
fn rounding(dither: bool, x: u32, y: u32) -> f32 {
    if dither {
        (f32::from(BAYER[(y % 4) as usize][(x % 4) as usize]) + 0.5) / 16.0
    } else {
        0.5
    }
}

/// Generates an opaque fill of `size`.
///
/// No colors gives the default fill and one color a solid fill. Two colors
/// make a linear gradient whose direction follows `rotation` in 45° steps;
/// three or four blend around fixed anchor points.
pub fn generate_gradient(size: SizePx, colors: &[Color], rotation: i32) -> RgbaImage {
    render_gradient(size, colors, rotation, false)
}

/// Like [`generate_gradient`], with multi-color fills quantized through an
/// ordered dither instead of rounding, which hides banding on large fills.
pub fn generate_dithered_gradient(size: SizePx, colors: &[Color], rotation: i32) -> RgbaImage {
    render_gradient(size, colors, rotation, true)
}

fn render_gradient(size: SizePx, colors: &[Color], rotation: i32, dither: bool) -> RgbaImage {
    match colors {
        [] => RgbaImage::from_pixel(size.width, size.height, DEFAULT_BACKGROUND_COLOR.to_rgba()),
        [single] => RgbaImage::from_pixel(size.width, size.height, single.to_rgba()),
        [first, second] => linear_gradient(size, *first, *second, rotation, dither),
        _ => point_gradient(size, colors, dither),
    }
}

/// Start and end points of a two-color gradient for each 45° step.
///
/// Rotation 0 runs top to bottom and steps go clockwise.
fn linear_endpoints(size: SizePx, rotation: i32) -> ((f32, f32), (f32, f32)) {
    let (w, h) = (size.width as f32, size.height as f32);
    match rotation.clamp(0, 315) / 45 {
        0 => ((0.0, 0.0), (0.0, h)),
        1 => ((w, 0.0), (0.0, h)),
        2 => ((w, 0.0), (0.0, 0.0)),
        3 => ((w, h), (0.0, 0.0)),
        4 => ((0.0, h), (0.0, 0.0)),
        5 => ((0.0, h), (w, 0.0)),
        6 => ((0.0, 0.0), (w, 0.0)),
        _ => ((0.0, 0.0), (w, h)),
    }
}

fn linear_gradient(size: SizePx, from: Color, to: Color, rotation: i32, dither: bool) -> RgbaImage {
    let (start, end) = linear_endpoints(size, rotation);
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length = (dx * dx + dy * dy).max(f32::EPSILON);

    RgbaImage::from_fn(size.width, size.height, |x, y| {
        let (px, py) = (x as f32 + 0.5 - start.0, y as f32 + 0.5 - start.1);
        let t = ((px * dx + py * dy) / length).clamp(0.0, 1.0);
        mix(&[(from, 1.0 - t), (to, t)], rounding(dither, x, y))
    })
}

fn point_gradient(size: SizePx, colors: &[Color], dither: bool) -> RgbaImage {
    let (w, h) = (size.width.max(1) as f32, size.height.max(1) as f32);
    RgbaImage::from_fn(size.width, size.height, |x, y| {
        let (u, v) = ((x as f32 + 0.5) / w, (y as f32 + 0.5) / h);
        let weighted: Vec<(Color, f32)> = colors
            .iter()
            .zip(POINTS)
            .map(|(color, (px, py))| {
                let distance = ((u - px).powi(2) + (v - py).powi(2)).sqrt();
                (*color, (0.9 - distance).max(0.0).powi(4))
            })
            .collect();
        mix(&weighted, rounding(dither, x, y))
    })
}

/// Weighted average of colors, quantized as `floor(value + offset)`. Zero
/// total weight averages evenly.
fn mix(weighted: &[(Color, f32)], offset: f32) -> Rgba<u8> {
    let total: f32 = weighted.iter().map(|(_, w)| w).sum();
    if total <= f32::EPSILON {
        let colors: Vec<Color> = weighted.iter().map(|(c, _)| *c).collect();
        return average_color(&colors).to_rgba();
    }
    let channel = |pick: fn(&Color) -> u8| {
        let value: f32 = weighted
            .iter()
            .map(|(c, w)| f32::from(pick(c)) * w)
            .sum::<f32>()
            / total;
        (value + offset).floor().clamp(0.0, 255.0) as u8
    };
    Rgba([channel(|c| c.r), channel(|c| c.g), channel(|c| c.b), 255])
}

/// Returns true if a pattern over `colors` should be drawn white.
///
/// Only positive opacities invert, when the average color is dark.
pub fn is_pattern_inverted(colors: &[Color], opacity: f32) -> bool {
    if opacity <= 0.0 {
        return false;
    }
    let average = average_color(colors);
    let rgb = Srgb::new(average.r, average.g, average.b).into_format::<f32>();
    let hsv: Hsv = rgb.into_color();
    hsv.value <= INVERTED_VALUE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    #[test]
    fn empty_colors_use_default() {
        let img = generate_gradient(SizePx::new(4, 4), &[], 0);
        assert!(img.pixels().all(|p| *p == DEFAULT_BACKGROUND_COLOR.to_rgba()));
    }

    #[test]
    fn single_color_is_solid() {
        let img = generate_gradient(SizePx::new(3, 5), &[RED], 90);
        assert_eq!(img.dimensions(), (3, 5));
        assert!(img.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn vertical_gradient_runs_top_to_bottom() {
        let img = generate_gradient(SizePx::new(10, 100), &[RED, BLUE], 0);
        let top = img.get_pixel(5, 0);
        let bottom = img.get_pixel(5, 99);
        assert!(top[0] > 250 && top[2] < 5);
        assert!(bottom[2] > 250 && bottom[0] < 5);
        assert!(img.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn rotated_gradient_runs_right_to_left() {
        let img = generate_gradient(SizePx::new(100, 10), &[RED, BLUE], 90);
        assert!(img.get_pixel(99, 5)[0] > 250);
        assert!(img.get_pixel(0, 5)[2] > 250);
    }

    #[test]
    fn four_colors_are_opaque_and_varied() {
        let colors = [RED, BLUE, Color::rgb(0, 255, 0), Color::rgb(255, 255, 0)];
        let img = generate_gradient(SizePx::new(32, 32), &colors, 0);
        assert!(img.pixels().all(|p| p[3] == 255));
        assert_ne!(img.get_pixel(25, 3), img.get_pixel(6, 28));
    }

    #[test]
    fn dither_stays_within_one_step() {
        let size = SizePx::new(16, 64);
        let colors = [Color::rgb(0, 0, 0), Color::rgb(255, 255, 255)];
        let plain = generate_gradient(size, &colors, 0);
        let dithered = generate_dithered_gradient(size, &colors, 0);
        let mut changed = 0;
        for (a, b) in plain.pixels().zip(dithered.pixels()) {
            assert!(a[0].abs_diff(b[0]) <= 1);
            assert_eq!(b[3], 255);
            changed += usize::from(a != b);
        }
        assert!(changed > 0);
    }

    #[test]
    fn dither_leaves_flat_fills_alone() {
        let size = SizePx::new(8, 8);
        assert_eq!(
            generate_dithered_gradient(size, &[RED, RED], 45),
            generate_gradient(size, &[RED, RED], 45)
        );
        assert_eq!(
            generate_dithered_gradient(size, &[BLUE], 0),
            generate_gradient(size, &[BLUE], 0)
        );
    }

    #[test]
    fn pattern_inversion() {
        assert!(is_pattern_inverted(&[Color::rgb(20, 20, 30)], 0.5));
        assert!(!is_pattern_inverted(&[Color::rgb(20, 20, 30)], 0.0));
        assert!(!is_pattern_inverted(&[Color::rgb(20, 20, 30)], -0.5));
        assert!(!is_pattern_inverted(&[Color::rgb(200, 200, 200)], 0.5));
        // 0.3 * 255 = 76.5
        assert!(is_pattern_inverted(&[Color::rgb(76, 0, 0)], 0.5));
        assert!(!is_pattern_inverted(&[Color::rgb(77, 0, 0)], 0.5));
    }
}
