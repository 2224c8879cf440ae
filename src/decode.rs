//! Turning document bytes into pixels.
//!
//! Photo wallpapers are ordinary raster files. Pattern wallpapers ship as
//! SVG, usually gzip-compressed, and are rasterized with resvg.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use tracing::trace;

use crate::error::ImageLoadError;
use crate::pixmap::SizePx;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Returns true if the bytes look like SVG markup or gzipped SVG.
pub fn is_svg(bytes: &[u8]) -> bool {
    if bytes.starts_with(&GZIP_MAGIC) {
        return true;
    }
    let head = &bytes[..bytes.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// Decodes a wallpaper document.
///
/// SVG documents are rasterized to fit within `max_side`, raster documents
/// are returned at their stored size. The result has straight alpha.
pub fn decode_document(bytes: &[u8], max_side: u32) -> Result<RgbaImage, ImageLoadError> {
    let image = if is_svg(bytes) {
        render_svg(bytes, max_side)?
    } else {
        image::load_from_memory(bytes)?.to_rgba8()
    };
    if image.width() == 0 || image.height() == 0 {
        return Err(ImageLoadError::Empty);
    }
    trace!(width = image.width(), height = image.height(), "decoded document");
    Ok(image)
}

/// Rasterizes SVG (plain or gzipped) so that its larger side is at most
/// `max_side`. Smaller drawings keep their natural size.
pub fn render_svg(data: &[u8], max_side: u32) -> Result<RgbaImage, ImageLoadError> {
    let tree = Tree::from_data(data, &Options::default())?;

    let natural = tree.size();
    let larger = natural.width().max(natural.height());
    let scale = if larger > max_side as f32 {
        max_side as f32 / larger
    } else {
        1.0
    };
    let size = SizePx::new(
        (natural.width() * scale).ceil() as u32,
        (natural.height() * scale).ceil() as u32,
    );

    let mut pixmap = Pixmap::new(size.width, size.height).ok_or(ImageLoadError::Empty)?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Converts a premultiplied tiny_skia pixmap to a straight-alpha image.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (out, pixel) in img.pixels_mut().zip(pixmap.pixels()) {
        let (r, g, b, a) = unpremultiply(pixel.red(), pixel.green(), pixel.blue(), pixel.alpha());
        *out = Rgba([r, g, b, a]);
    }
    img
}

fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const PATTERN_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50"><rect x="0" y="0" width="50" height="50" fill="#000000"/></svg>"##;

    #[test]
    fn detects_svg() {
        assert!(is_svg(PATTERN_SVG.as_bytes()));
        assert!(is_svg(b"<?xml version=\"1.0\"?>\n<svg></svg>"));
        assert!(is_svg(&[0x1f, 0x8b, 0x08, 0x00]));
        assert!(!is_svg(b"\x89PNG\r\n"));
    }

    #[test]
    fn renders_svg_at_natural_size() {
        let img = decode_document(PATTERN_SVG.as_bytes(), 1000).unwrap();
        assert_eq!((img.width(), img.height()), (100, 50));
        assert_eq!(img.get_pixel(10, 10).0[3], 255);
        assert_eq!(img.get_pixel(90, 10).0[3], 0);
    }

    #[test]
    fn renders_svg_within_max_side() {
        let img = render_svg(PATTERN_SVG.as_bytes(), 40).unwrap();
        assert_eq!((img.width(), img.height()), (40, 20));
    }

    #[test]
    fn decodes_png() {
        let source = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        source
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let img = decode_document(&bytes, 10).unwrap();
        assert_eq!(img, source);
    }

    #[test]
    fn garbage_fails() {
        assert!(matches!(
            decode_document(b"not an image", 10),
            Err(ImageLoadError::Image(_))
        ));
        assert!(matches!(
            decode_document(b"<svg", 10),
            Err(ImageLoadError::Svg(_))
        ));
    }

    #[test]
    fn unpremultiply_values() {
        assert_eq!(unpremultiply(0, 0, 0, 0), (0, 0, 0, 0));
        assert_eq!(unpremultiply(128, 0, 128, 128), (255, 0, 255, 128));
    }
}
