//! wallpaper-renderer: chat wallpaper records and their derived images
//!
//! This crate models the wallpapers of a messaging client: the immutable
//! [`WallPaper`] record with its persisted and shareable forms, the
//! [`DerivationCache`] that turns documents into preview pixels, and the
//! [`PaperCatalog`] of wallpapers known from the service.
//!
//! # Example
//!
//! ```
//! use wallpaper_renderer::{parse_link, LinkTarget, WallPaper};
//!
//! // Color links resolve without a round trip to the service.
//! let target = parse_link("bg/ff0000-0000ff", "rotation=90").unwrap();
//! let LinkTarget::Local(paper) = target else {
//!     panic!("color slugs are local");
//! };
//! assert_eq!(paper.background_colors().len(), 2);
//! assert_eq!(paper.gradient_rotation(), 90);
//!
//! // Records survive the persisted layout unchanged.
//! let restored = WallPaper::from_serialized(&paper.serialize()).unwrap();
//! assert_eq!(restored, paper);
//! ```
//!
//! # Derived Images
//!
//! Full documents are decoded and colorized on a [`PreparationPool`]; the
//! cache applies only the newest result:
//!
//! ```
//! use std::time::Duration;
//! use wallpaper_renderer::{
//!     DerivationCache, DocumentRegistry, PreparationPool, Readiness, RendererSettings,
//!     WallPaper,
//! };
//!
//! let settings = RendererSettings { box_side: 16, ..RendererSettings::default() };
//! let pool = PreparationPool::from_settings(&settings).unwrap();
//! let media = DocumentRegistry::new();
//!
//! let mut cache = DerivationCache::new(WallPaper::construct_default(), settings);
//! // Nothing has been downloaded yet.
//! assert_eq!(cache.check_loaded(&media, &pool), Readiness::NotReady);
//! assert_eq!(cache.wait_prepared(Duration::ZERO), Readiness::NotReady);
//! assert!(cache.display().is_none());
//! ```

mod catalog;
mod color;
mod decode;
mod derive;
mod document;
mod error;
mod link;
mod paper;
mod pixmap;
mod server;
mod settings;

pub use catalog::{Paper, PaperCatalog};
pub use color::{average_color, from_hex6, to_hex6, Color};
pub use decode::{decode_document, is_svg};
pub use derive::{
    colorize_pattern, generate_dithered_gradient, generate_gradient, invert_pattern,
    is_pattern_inverted, prepare_blurred_background, prepare_pattern_image,
    prepare_scaled_from_full, prepare_scaled_non_pattern, preprocess_background_image,
    DependencyVersion, DerivationCache, JobSource, PatternParams, PreparationJob, PreparationPool,
    PreparationResult, Prepared, Readiness, DEFAULT_BACKGROUND_COLOR,
};
pub use document::{DocumentId, DocumentRegistry, LoadRequest, MediaProvider};
pub use error::{DecodeError, ImageLoadError, LinkError, SettingsError};
pub use link::{
    colors_from_slug, colors_to_slug, is_valid_slug, parse_link, parse_query, share_params,
    LinkTarget, MAX_SLUG_LENGTH,
};
pub use paper::legacy::flags_from_legacy;
pub use paper::{
    legacy_raw_id, snap_rotation, PaperFlags, PaperId, PaperInput, PaperOrigin, WallPaper,
    DEFAULT_COLORS, DEFAULT_INTENSITY,
};
pub use pixmap::{AlphaFormat, PaperImage, RectPx, SizePx};
pub use server::{ServerPaperList, ServerPaperSettings, ServerWallPaper};
pub use settings::RendererSettings;
