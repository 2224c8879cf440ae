//! Pixel buffer types for derived wallpaper images.

use image::RgbaImage;

/// A rectangle defined in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RectPx {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Largest rectangle of the given aspect ratio centered inside `outer`.
    ///
    /// The aspect is `aspect_w : aspect_h`; both must be non-zero.
    pub fn centered_crop(outer: SizePx, aspect_w: u32, aspect_h: u32) -> Self {
        let outer_w = u64::from(outer.width.max(1));
        let outer_h = u64::from(outer.height.max(1));
        let (aw, ah) = (u64::from(aspect_w.max(1)), u64::from(aspect_h.max(1)));
        let (width, height) = if outer_w * ah > outer_h * aw {
            ((outer_h * aw / ah).max(1), outer_h)
        } else {
            (outer_w, (outer_w * ah / aw).max(1))
        };
        Self::new(
            ((outer_w - width) / 2) as u32,
            ((outer_h - height) / 2) as u32,
            width as u32,
            height as u32,
        )
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scales down to fit a `max_side` square, keeping the aspect ratio.
    ///
    /// Sizes already inside the square are returned unchanged.
    pub fn fit_within(&self, max_side: u32) -> Self {
        if self.width <= max_side && self.height <= max_side {
            return *self;
        }
        let (w, h, side) = (
            u64::from(self.width),
            u64::from(self.height),
            u64::from(max_side),
        );
        if w >= h {
            Self::new(max_side, ((h * side) / w).max(1) as u32)
        } else {
            Self::new(((w * side) / h).max(1) as u32, max_side)
        }
    }
}

/// How the color channels relate to alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaFormat {
    #[default]
    Straight,
    /// Color channels are already multiplied by alpha, ready for compositing.
    Premultiplied,
}

/// A derived wallpaper image with its device pixel ratio.
///
/// The logical size is `dimensions / ratio`.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperImage {
    pub data: RgbaImage,
    pub ratio: f32,
    pub format: AlphaFormat,
}

impl PaperImage {
    pub fn new(data: RgbaImage, ratio: f32, format: AlphaFormat) -> Self {
        Self { data, ratio, format }
    }

    /// Wraps straight-alpha pixels at ratio 1.
    pub fn straight(data: RgbaImage) -> Self {
        Self::new(data, 1.0, AlphaFormat::Straight)
    }

    pub fn dimensions(&self) -> SizePx {
        SizePx::of(&self.data)
    }

    pub fn logical_size(&self) -> (f32, f32) {
        (
            self.data.width() as f32 / self.ratio,
            self.data.height() as f32 / self.ratio,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions().is_empty()
    }

    /// Converts straight alpha to premultiplied alpha in place.
    pub fn into_premultiplied(mut self) -> Self {
        if self.format == AlphaFormat::Straight {
            for pixel in self.data.pixels_mut() {
                let [r, g, b, a] = pixel.0;
                let mul = |c: u8| ((u32::from(c) * u32::from(a) + 127) / 255) as u8;
                pixel.0 = [mul(r), mul(g), mul(b), a];
            }
            self.format = AlphaFormat::Premultiplied;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn centered_wide_crop() {
        let rect = RectPx::centered_crop(SizePx::new(100, 100), 2, 1);
        assert_eq!(rect, RectPx::new(0, 25, 100, 50));
    }

    #[test]
    fn centered_square_crop() {
        let wide = RectPx::centered_crop(SizePx::new(300, 100), 1, 1);
        assert_eq!(wide, RectPx::new(100, 0, 100, 100));

        let tall = RectPx::centered_crop(SizePx::new(50, 90), 1, 1);
        assert_eq!(tall, RectPx::new(0, 20, 50, 50));
    }

    #[test]
    fn fit_within_keeps_aspect() {
        assert_eq!(SizePx::new(1800, 900).fit_within(900), SizePx::new(900, 450));
        assert_eq!(SizePx::new(300, 1200).fit_within(600), SizePx::new(150, 600));
        assert_eq!(SizePx::new(10, 20).fit_within(900), SizePx::new(10, 20));
    }

    #[test]
    fn logical_size_uses_ratio() {
        let img = PaperImage::new(RgbaImage::new(64, 32), 2.0, AlphaFormat::Straight);
        assert_eq!(img.logical_size(), (32.0, 16.0));
    }

    #[test]
    fn premultiply_half_alpha() {
        let data = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 0, 128]));
        let img = PaperImage::straight(data).into_premultiplied();
        assert_eq!(img.format, AlphaFormat::Premultiplied);
        assert_eq!(img.data.get_pixel(0, 0).0, [100, 50, 0, 128]);
    }
}
