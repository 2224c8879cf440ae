//! Error types.

use thiserror::Error;

/// Why a persisted wallpaper record could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("serialized wallpaper is empty")]
    Empty,

    #[error("stream ended while reading {0}")]
    Truncated(&'static str),

    #[error("background color count {0} is outside 0..=4")]
    ColorCount(i32),

    #[error("background color {0} is missing")]
    MissingColor(usize),

    #[error("pattern intensity {0} is outside -100..=100")]
    Intensity(i32),

    #[error("slug is not valid UTF-16")]
    Utf16,

    #[error("slug length {0} is not a whole number of UTF-16 units")]
    OddStringLength(u32),
}

/// Why document bytes could not be turned into pixels.
#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("svg parse failed: {0}")]
    Svg(#[from] resvg::usvg::Error),

    #[error("document has empty dimensions")]
    Empty,
}

/// Errors from resolving a shareable background link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("bad background link: {0:?}")]
    BadLink(String),
}

/// Errors from loading renderer settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),
}
