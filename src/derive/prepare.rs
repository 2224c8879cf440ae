//! Image preparation steps shared by the cache and the worker.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::pattern::prepare_pattern_image;
use crate::color::Color;
use crate::paper::WallPaper;
use crate::pixmap::{AlphaFormat, PaperImage, RectPx, SizePx};
use crate::settings::RendererSettings;

/// Longest side to short side ratio kept by [`preprocess_background_image`].
pub const MAX_ASPECT: u32 = 40;

/// Gaussian sigma of the light blur applied to preview thumbnails.
const PREVIEW_BLUR_SIGMA: f32 = 4.0;

const FILTER: FilterType = FilterType::Triangle;

/// Everything a full preparation needs to know about a paper.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternParams {
    pub is_pattern: bool,
    pub colors: Vec<Color>,
    pub rotation: i32,
    pub opacity: f32,
}

impl PatternParams {
    pub fn of(paper: &WallPaper) -> Self {
        Self {
            is_pattern: paper.is_pattern(),
            colors: paper.background_colors().to_vec(),
            rotation: paper.gradient_rotation(),
            opacity: paper.pattern_opacity(),
        }
    }
}

/// Clips extreme aspect ratios to 40:1 around the center and scales the
/// image down to fit `max_side`.
pub fn preprocess_background_image(image: RgbaImage, max_side: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image;
    }
    let image = if u64::from(width) > u64::from(MAX_ASPECT) * u64::from(height) {
        let clipped = MAX_ASPECT * height;
        imageops::crop_imm(&image, (width - clipped) / 2, 0, clipped, height).to_image()
    } else if u64::from(height) > u64::from(MAX_ASPECT) * u64::from(width) {
        let clipped = MAX_ASPECT * width;
        imageops::crop_imm(&image, 0, (height - clipped) / 2, width, clipped).to_image()
    } else {
        image
    };
    let size = SizePx::of(&image);
    let fitted = size.fit_within(max_side);
    if fitted == size {
        image
    } else {
        imageops::resize(&image, fitted.width, fitted.height, FILTER)
    }
}

/// Crops the centered square of an image and scales it to the preview box.
///
/// The result is `settings.physical_box_side()` pixels on each side at the
/// settings' device pixel ratio. With `blur` set, a light blur is applied
/// after scaling.
pub fn prepare_scaled_non_pattern(
    image: &RgbaImage,
    settings: &RendererSettings,
    blur: bool,
) -> PaperImage {
    let outer = settings.physical_box_side();
    let ratio = settings.device_pixel_ratio;
    let crop = RectPx::centered_crop(SizePx::of(image), 1, 1);
    let square = imageops::crop_imm(image, crop.x, crop.y, crop.width, crop.height).to_image();
    let mut result = if square.dimensions() == (outer, outer) {
        square
    } else {
        imageops::resize(&square, outer, outer, FILTER)
    };
    if blur {
        result = imageops::blur(&result, PREVIEW_BLUR_SIGMA);
    }
    PaperImage::new(result, ratio, AlphaFormat::Straight)
}

/// Scales a full image for preview and colorizes it if it is a pattern.
///
/// The result is always premultiplied.
pub fn prepare_scaled_from_full(
    image: &RgbaImage,
    params: &PatternParams,
    settings: &RendererSettings,
    blur: bool,
) -> PaperImage {
    let scaled = prepare_scaled_non_pattern(image, settings, blur);
    if params.is_pattern {
        let data = prepare_pattern_image(
            &scaled.data,
            &params.colors,
            params.rotation,
            params.opacity,
            settings.dither_gradients,
        );
        PaperImage::new(data, scaled.ratio, AlphaFormat::Premultiplied)
    } else {
        scaled.into_premultiplied()
    }
}

/// Produces the heavily blurred variant of a photo background.
pub fn prepare_blurred_background(image: &RgbaImage, settings: &RendererSettings) -> RgbaImage {
    let size = SizePx::of(image);
    let fitted = size.fit_within(settings.blurred_max_side);
    let sigma = settings.blur_radius as f32 / 2.0;
    if fitted == size {
        imageops::blur(image, sigma)
    } else {
        imageops::blur(&imageops::resize(image, fitted.width, fitted.height, FILTER), sigma)
    }
}

/// The blurred preview box shown for photos: blur first, then scale.
pub fn prepare_blurred_preview(image: &RgbaImage, settings: &RendererSettings) -> PaperImage {
    let blurred = prepare_blurred_background(image, settings);
    prepare_scaled_non_pattern(&blurred, settings, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
    }

    #[test]
    fn preprocess_clips_wide_images() {
        let out = preprocess_background_image(solid(1000, 10), 2960);
        assert_eq!(out.dimensions(), (400, 10));

        let tall = preprocess_background_image(solid(2, 200), 2960);
        assert_eq!(tall.dimensions(), (2, 80));
    }

    #[test]
    fn preprocess_fits_max_side() {
        let out = preprocess_background_image(solid(400, 200), 100);
        assert_eq!(out.dimensions(), (100, 50));

        let small = preprocess_background_image(solid(30, 20), 100);
        assert_eq!(small.dimensions(), (30, 20));
    }

    fn box_settings(box_side: u32, device_pixel_ratio: f32) -> RendererSettings {
        RendererSettings {
            box_side,
            device_pixel_ratio,
            ..RendererSettings::default()
        }
    }

    #[test]
    fn scaled_non_pattern_is_square_box() {
        let out = prepare_scaled_non_pattern(&solid(300, 100), &box_settings(50, 2.0), false);
        assert_eq!(out.data.dimensions(), (100, 100));
        assert_eq!(out.ratio, 2.0);
        assert_eq!(out.logical_size(), (50.0, 50.0));
        assert_eq!(out.format, AlphaFormat::Straight);
    }

    #[test]
    fn scaled_non_pattern_keeps_center() {
        // Red, green and blue vertical bands of 100px each.
        let bands = RgbaImage::from_fn(300, 100, |x, _| match x / 100 {
            0 => Rgba([255, 0, 0, 255]),
            1 => Rgba([0, 255, 0, 255]),
            _ => Rgba([0, 0, 255, 255]),
        });
        let out = prepare_scaled_non_pattern(&bands, &box_settings(20, 1.0), false);
        assert_eq!(out.data.dimensions(), (20, 20));
        assert!(out.data.pixels().all(|p| p.0 == [0, 255, 0, 255]));

        let tall = RgbaImage::from_fn(10, 30, |_, y| match y / 10 {
            1 => Rgba([0, 255, 0, 255]),
            _ => Rgba([255, 0, 0, 255]),
        });
        let out = prepare_scaled_non_pattern(&tall, &box_settings(10, 1.0), false);
        assert!(out.data.pixels().all(|p| p.0 == [0, 255, 0, 255]));
    }

    #[test]
    fn extreme_aspect_thumbnail_stays_small() {
        let thin = RgbaImage::from_pixel(1, 200_000, Rgba([7, 8, 9, 255]));
        let out = prepare_scaled_non_pattern(&thin, &box_settings(320, 1.0), false);
        assert_eq!(out.data.dimensions(), (320, 320));
        assert_eq!(out.data.get_pixel(160, 160).0, [7, 8, 9, 255]);

        let wide = RgbaImage::from_pixel(200_000, 1, Rgba([7, 8, 9, 255]));
        let out = prepare_scaled_non_pattern(&wide, &box_settings(8, 1.5), true);
        assert_eq!(out.data.dimensions(), (12, 12));
    }

    #[test]
    fn scaled_from_full_is_premultiplied() {
        let settings = RendererSettings {
            box_side: 16,
            ..RendererSettings::default()
        };
        let photo = PatternParams {
            is_pattern: false,
            colors: Vec::new(),
            rotation: 0,
            opacity: 0.4,
        };
        let out = prepare_scaled_from_full(&solid(32, 32), &photo, &settings, false);
        assert_eq!(out.format, AlphaFormat::Premultiplied);
        assert_eq!(out.data.dimensions(), (16, 16));
        assert_eq!(out.data.get_pixel(8, 8).0, [10, 20, 30, 255]);
    }

    #[test]
    fn scaled_from_full_colorizes_patterns() {
        let settings = RendererSettings {
            box_side: 8,
            ..RendererSettings::default()
        };
        let pattern = PatternParams {
            is_pattern: true,
            colors: vec![Color::rgb(255, 0, 0)],
            rotation: 0,
            opacity: -1.0,
        };
        let mask = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        let out = prepare_scaled_from_full(&mask, &pattern, &settings, false);
        assert_eq!(out.format, AlphaFormat::Premultiplied);
        assert_eq!(out.data.get_pixel(4, 4).0, [255, 0, 0, 255]);
    }

    #[test]
    fn blurred_background_fits() {
        let settings = RendererSettings {
            blurred_max_side: 50,
            blur_radius: 4,
            ..RendererSettings::default()
        };
        let out = prepare_blurred_background(&solid(200, 100), &settings);
        assert_eq!(out.dimensions(), (50, 25));
    }
}
