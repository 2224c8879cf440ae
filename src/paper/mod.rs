//! The wallpaper record.
//!
//! [`WallPaper`] is an immutable value: every setter is a `with_*` method
//! that consumes the record and returns the changed copy. Documents are
//! referenced through a non-owning [`DocumentId`].

pub mod id;
pub mod legacy;
pub mod serialize;

pub use id::{legacy_raw_id, PaperFlags, PaperId};

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::color::{pack_color, unpack_color, Color};
use crate::document::{DocumentId, MediaProvider};
use crate::link;
use crate::pixmap::PaperImage;
use crate::server::{ServerPaperSettings, ServerWallPaper};

/// Pattern intensity used when nothing else is specified.
pub const DEFAULT_INTENSITY: i32 = 40;

/// Colors of the built-in default wallpaper.
pub const DEFAULT_COLORS: [Color; 4] = [
    Color::rgb(219, 221, 187),
    Color::rgb(107, 165, 135),
    Color::rgb(213, 216, 141),
    Color::rgb(136, 184, 132),
];

/// Clamps a rotation to `0..=315` and rounds it down to a multiple of 45.
pub fn snap_rotation(rotation: i32) -> i32 {
    (rotation.clamp(0, 315) / 45) * 45
}

/// Identifies a wallpaper to the download layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaperOrigin {
    pub id: u64,
    pub access_hash: u64,
    pub owner_id: u64,
    pub slug: String,
}

/// How a wallpaper is addressed in service requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaperInput {
    Id { id: u64, access_hash: u64 },
    Slug(String),
}

#[derive(Debug, Clone)]
pub struct WallPaper {
    id: PaperId,
    access_hash: u64,
    owner_id: u64,
    flags: PaperFlags,
    slug: String,
    emoji_id: String,
    background_colors: Vec<Color>,
    rotation: i32,
    intensity: i32,
    blurred: bool,
    document: Option<DocumentId>,
    thumbnail: Option<Arc<PaperImage>>,
}

/// Field-wise equality, ignoring the document handle and local thumbnail.
impl PartialEq for WallPaper {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.access_hash == other.access_hash
            && self.owner_id == other.owner_id
            && self.flags == other.flags
            && self.slug == other.slug
            && self.emoji_id == other.emoji_id
            && self.background_colors == other.background_colors
            && self.rotation == other.rotation
            && self.intensity == other.intensity
            && self.blurred == other.blurred
    }
}

impl WallPaper {
    pub fn new(id: PaperId) -> Self {
        Self {
            id,
            access_hash: 0,
            owner_id: 0,
            flags: PaperFlags::empty(),
            slug: String::new(),
            emoji_id: String::new(),
            background_colors: Vec::new(),
            rotation: 0,
            intensity: DEFAULT_INTENSITY,
            blurred: false,
            document: None,
            thumbnail: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> PaperId {
        self.id
    }

    pub fn access_hash(&self) -> u64 {
        self.access_hash
    }

    pub fn owner_id(&self) -> u64 {
        self.owner_id
    }

    pub fn flags(&self) -> PaperFlags {
        self.flags
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn emoji_id(&self) -> &str {
        &self.emoji_id
    }

    pub fn background_colors(&self) -> &[Color] {
        &self.background_colors
    }

    pub fn document(&self) -> Option<DocumentId> {
        self.document
    }

    pub fn local_thumbnail(&self) -> Option<&PaperImage> {
        self.thumbnail.as_deref()
    }

    pub fn is_pattern(&self) -> bool {
        self.flags.contains(PaperFlags::PATTERN)
    }

    pub fn is_default(&self) -> bool {
        self.flags.contains(PaperFlags::DEFAULT)
    }

    pub fn is_creator(&self) -> bool {
        self.flags.contains(PaperFlags::CREATOR)
    }

    pub fn is_dark(&self) -> bool {
        self.flags.contains(PaperFlags::DARK)
    }

    /// A record is local when it has pixels but no document behind them.
    pub fn is_local(&self) -> bool {
        self.document.is_none() && self.thumbnail.is_some()
    }

    pub fn is_blurred(&self) -> bool {
        self.blurred
    }

    pub fn is_cloud(&self) -> bool {
        self.id.is_cloud()
    }

    pub fn pattern_intensity(&self) -> i32 {
        self.intensity
    }

    pub fn pattern_opacity(&self) -> f32 {
        self.intensity as f32 / 100.0
    }

    /// Rotation of a two-color gradient. Complex gradients rotate
    /// dynamically, so they report 0.
    pub fn gradient_rotation(&self) -> i32 {
        if self.background_colors.len() < 3 {
            self.rotation
        } else {
            0
        }
    }

    pub fn has_share_url(&self) -> bool {
        !self.slug.is_empty()
    }

    pub fn is_null(&self) -> bool {
        self.id.to_raw() == 0 && self.slug.is_empty() && self.background_colors.is_empty()
    }

    /// Compares display parameters, ignoring identity.
    pub fn same_params(&self, other: &Self) -> bool {
        self.flags == other.flags
            && self.slug == other.slug
            && self.emoji_id == other.emoji_id
            && self.background_colors == other.background_colors
            && self.rotation == other.rotation
            && self.intensity == other.intensity
            && self.blurred == other.blurred
            && self.document == other.document
    }

    /// Stable identity used for caching and storage.
    ///
    /// Document-backed non-pattern papers append their intensity as an
    /// extra `&intensity=` element, which the join doubles into `&&`.
    /// Stored keys depend on this exact shape.
    pub fn key(&self) -> String {
        if self.is_null() {
            return String::new();
        }
        let base = if !self.slug.is_empty() {
            format!("bg/{}", self.slug)
        } else if self.id.to_raw() != 0 {
            self.id.to_raw().to_string()
        } else {
            link::colors_to_slug(&self.background_colors)
        };
        let mut params = link::share_params(self);
        if self.document.is_some() && !self.is_pattern() {
            params.push(format!("&intensity={}", self.intensity));
        }
        if params.is_empty() {
            base
        } else {
            format!("{base}?{}", params.join("&"))
        }
    }

    /// Full share link, e.g. `https://t.me/bg/<slug>?mode=blur`.
    ///
    /// `base` is the link prefix including its trailing slash.
    pub fn share_url(&self, base: &str) -> Option<String> {
        if !self.has_share_url() {
            return None;
        }
        let url = format!("{base}bg/{}", self.slug);
        let params = link::share_params(self);
        Some(if params.is_empty() {
            url
        } else {
            format!("{url}?{}", params.join("&"))
        })
    }

    pub fn origin(&self) -> PaperOrigin {
        PaperOrigin {
            id: self.id.to_raw(),
            access_hash: self.access_hash,
            owner_id: self.owner_id,
            slug: self.slug.clone(),
        }
    }

    /// Papers uploaded by someone else are addressed by slug.
    pub fn input(&self, self_user: u64) -> PaperInput {
        if self.owner_id != 0 && self.owner_id != self_user && !self.slug.is_empty() {
            PaperInput::Slug(self.slug.clone())
        } else {
            PaperInput::Id {
                id: self.id.to_raw(),
                access_hash: self.access_hash,
            }
        }
    }

    /// Settings in the shape the service accepts when installing a paper.
    pub fn server_settings(&self) -> ServerPaperSettings {
        let color = |index: usize| self.background_colors.get(index).map(|c| pack_color(*c));
        ServerPaperSettings {
            blur: self.blurred,
            background_color: color(0),
            second_background_color: color(1),
            third_background_color: color(2),
            fourth_background_color: color(3),
            intensity: Some(self.intensity),
            rotation: Some(self.rotation),
            emoticon: (!self.emoji_id.is_empty()).then(|| self.emoji_id.clone()),
        }
    }

    pub fn load_document_thumbnail(&self, media: &mut impl MediaProvider) {
        if let Some(document) = self.document {
            media.request_thumbnail(document, &self.origin());
        }
    }

    pub fn load_document(&self, media: &mut impl MediaProvider) {
        if let Some(document) = self.document {
            media.request_full(document, &self.origin());
        }
    }

    /// True if both records draw from the same pixels: the same document
    /// and the same local thumbnail.
    pub fn same_image_source(&self, other: &Self) -> bool {
        let same_thumbnail = match (&self.thumbnail, &other.thumbnail) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.document == other.document && same_thumbnail
    }

    // ------------------------------------------------------------------
    // Transformations
    // ------------------------------------------------------------------

    pub fn with_access_hash(mut self, access_hash: u64) -> Self {
        self.access_hash = access_hash;
        self
    }

    pub fn with_owner_id(mut self, owner_id: u64) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn with_flags(mut self, flags: PaperFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_document(mut self, document: Option<DocumentId>) -> Self {
        self.document = document;
        self
    }

    pub fn with_blurred(mut self, blurred: bool) -> Self {
        self.blurred = blurred;
        self
    }

    pub fn with_pattern_intensity(mut self, intensity: i32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_gradient_rotation(mut self, rotation: i32) -> Self {
        self.rotation = snap_rotation(rotation);
        self
    }

    /// Replaces the colors; a color slug is rewritten to match.
    pub fn with_background_colors(mut self, colors: Vec<Color>) -> Self {
        if !link::colors_from_slug(&self.slug).is_empty() {
            self.slug = link::colors_to_slug(&colors);
        }
        self.background_colors = colors;
        self
    }

    /// Copies blur, intensity, non-empty colors and the pattern flag.
    pub fn with_params_from(mut self, other: &WallPaper) -> Self {
        self.blurred = other.blurred;
        if !other.background_colors.is_empty() {
            if !link::colors_from_slug(&self.slug).is_empty() {
                self.slug = link::colors_to_slug(&other.background_colors);
            }
            self.background_colors = other.background_colors.clone();
        }
        self.intensity = other.intensity;
        if other.is_pattern() {
            self.flags |= PaperFlags::PATTERN;
        }
        self
    }

    /// Resets the link-controlled parameters: colors, blur and intensity.
    ///
    /// Unlike [`with_background_colors`](Self::with_background_colors) the
    /// slug is left untouched.
    pub(crate) fn with_link_params(mut self, colors: Vec<Color>, blurred: bool, intensity: i32) -> Self {
        self.background_colors = colors;
        self.blurred = blurred;
        self.intensity = intensity;
        self
    }

    /// Applies shareable link parameters, see [`link::apply_url_params`].
    pub fn with_url_params(&self, params: &HashMap<String, String>) -> Self {
        link::apply_url_params(self, params)
    }

    pub fn without_image_data(mut self) -> Self {
        self.thumbnail = None;
        self
    }

    /// Attaches a locally generated image as the thumbnail.
    ///
    /// Only the default, legacy default and custom papers carry local
    /// images; for other ids the record is returned unchanged.
    pub fn with_local_thumbnail(mut self, image: PaperImage) -> Self {
        if !matches!(
            self.id,
            PaperId::Default | PaperId::Legacy1Default | PaperId::Custom
        ) {
            warn!(id = ?self.id, "local thumbnail rejected for non-local wallpaper");
            return self;
        }
        self.thumbnail = Some(Arc::new(image));
        self
    }

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    /// Builds a record from a service entry.
    ///
    /// Document-backed entries are rejected when the document does not
    /// carry wallpaper attributes.
    pub fn create(data: &ServerWallPaper, self_user: u64, media: &impl MediaProvider) -> Option<Self> {
        match data {
            ServerWallPaper::Document {
                id,
                access_hash,
                creator,
                default,
                pattern,
                dark,
                slug,
                document,
                settings,
            } => {
                if !media.is_wallpaper(*document) {
                    debug!(id, document = document.0, "document lacks wallpaper attributes");
                    return None;
                }
                let mut result = WallPaper::new(PaperId::from_raw(*id));
                result.access_hash = *access_hash;
                result.owner_id = self_user;
                result.flags.set(PaperFlags::DARK, *dark);
                result.flags.set(PaperFlags::PATTERN, *pattern);
                result.flags.set(PaperFlags::DEFAULT, *default);
                result.flags.set(PaperFlags::CREATOR, *creator);
                result.slug = slug.clone();
                result.document = Some(*document);
                if let Some(settings) = settings {
                    result.blurred = settings.blur;
                    if let Some(intensity) = settings.intensity {
                        result.intensity = intensity;
                    }
                    if result.is_pattern() {
                        result.background_colors = colors_from_settings(settings);
                        if let Some(rotation) = settings.rotation {
                            result.rotation = snap_rotation(rotation);
                        }
                    }
                }
                Some(result)
            }
            ServerWallPaper::NoFile {
                id,
                default,
                dark,
                settings,
            } => {
                let mut result = WallPaper::new(PaperId::from_raw(*id));
                result.flags.set(PaperFlags::DARK, *dark);
                result.flags.set(PaperFlags::DEFAULT, *default);
                if let Some(settings) = settings {
                    result.blurred = settings.blur;
                    result.background_colors = colors_from_settings(settings);
                    if let Some(rotation) = settings.rotation {
                        result.rotation = snap_rotation(rotation);
                    }
                    result.emoji_id = settings.emoticon.clone().unwrap_or_default();
                }
                Some(result)
            }
        }
    }

    /// Builds a custom gradient paper from a color slug.
    pub fn from_colors_slug(slug: &str) -> Option<Self> {
        let colors = link::colors_from_slug(slug);
        if colors.is_empty() {
            return None;
        }
        let mut result = Self::custom();
        result.slug = slug.to_string();
        result.background_colors = colors;
        Some(result)
    }

    pub fn from_emoji_id(emoji_id: impl Into<String>) -> Self {
        let mut result = WallPaper::new(PaperId::Real(0));
        result.emoji_id = emoji_id.into();
        result
    }

    /// The built-in fallback: a four-color pattern at intensity 50.
    pub fn construct_default() -> Self {
        let mut result = WallPaper::new(PaperId::Default)
            .with_pattern_intensity(50)
            .with_background_colors(DEFAULT_COLORS.to_vec());
        result.flags |= PaperFlags::DEFAULT | PaperFlags::PATTERN;
        result
    }

    pub fn theme() -> Self {
        WallPaper::new(PaperId::Theme)
    }

    pub fn custom() -> Self {
        WallPaper::new(PaperId::Custom)
    }

    pub fn legacy1_default() -> Self {
        WallPaper::new(PaperId::Legacy1Default)
    }

    pub fn uninitialized() -> Self {
        WallPaper::new(PaperId::Uninitialized)
    }

    pub fn testing_theme() -> Self {
        WallPaper::new(PaperId::TestingTheme)
    }

    /// A preview of the default paper under the testing id.
    pub fn testing_default() -> Self {
        WallPaper::new(PaperId::TestingDefault).with_params_from(&Self::construct_default())
    }

    pub fn testing_editor() -> Self {
        WallPaper::new(PaperId::TestingEditor)
    }
}

fn colors_from_settings(settings: &ServerPaperSettings) -> Vec<Color> {
    settings
        .packed_colors()
        .into_iter()
        .map(unpack_color)
        .collect()
}
