//! Derived images for one wallpaper.
//!
//! A [`DerivationCache`] owns the preview box (`scaled`), the blurred photo
//! variant and the decoded full image of a single paper. Everything it holds
//! is tagged with the versions it was computed from, so stale images are
//! never handed out.
//!
//! # Versions
//!
//! ```text
//! source  ── document, local thumbnail ──────► full
//!    │
//!    ▼
//! params  ── pattern, colors, rotation, ─────► scaled, blurred
//!            intensity, blur
//! ```
//!
//! A source change drops the decoded full image. A params change only makes
//! the derived images stale; they are rebuilt from the full image already in
//! memory, without loading the document again.
//!
//! # Preparation
//!
//! Full documents are prepared on a [`PreparationPool`]. Each submission
//! takes a new generation number and only the result for the newest
//! generation is applied by [`poll`](DerivationCache::poll). Dropping the
//! cache drops its result channel, so late results are discarded by the
//! worker.

pub mod gradient;
pub mod pattern;
pub mod prepare;
pub mod worker;

pub use gradient::{
    generate_dithered_gradient, generate_gradient, is_pattern_inverted, DEFAULT_BACKGROUND_COLOR,
};
pub use pattern::{colorize_pattern, invert_pattern, prepare_pattern_image};
pub use prepare::{
    prepare_blurred_background, prepare_blurred_preview, prepare_scaled_from_full,
    prepare_scaled_non_pattern, preprocess_background_image, PatternParams,
};
pub use worker::{JobSource, PreparationJob, PreparationPool, PreparationResult, Prepared};

use std::sync::Arc;
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};
use image::RgbaImage;
use tracing::{debug, trace, warn};

use crate::document::MediaProvider;
use crate::paper::WallPaper;
use crate::pixmap::PaperImage;
use crate::settings::RendererSettings;

// ============================================================================
// Versions
// ============================================================================

/// Combined version of the inputs an image was derived from.
///
/// Both inputs only ever increase, so their sum changes whenever either one
/// does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DependencyVersion(u64);

impl DependencyVersion {
    pub const NONE: Self = Self(0);

    pub fn from_version(version: u64) -> Self {
        Self(version)
    }

    /// Combines several input versions into one.
    pub fn combine(versions: &[u64]) -> Self {
        Self(versions.iter().fold(0u64, |acc, v| acc.wrapping_add(*v)))
    }
}

/// Whether a derivation produced its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// The source is still loading or failed; nothing was changed.
    NotReady,
}

impl Readiness {
    pub fn is_ready(self) -> bool {
        self == Readiness::Ready
    }
}

/// A cached image and the version it was derived from.
#[derive(Debug, Clone)]
struct Slot<T> {
    value: T,
    version: DependencyVersion,
}

impl<T> Slot<T> {
    fn new(value: T, version: DependencyVersion) -> Self {
        Self { value, version }
    }

    fn get(&self, current: DependencyVersion) -> Option<&T> {
        (self.version == current).then_some(&self.value)
    }
}

// ============================================================================
// DerivationCache
// ============================================================================

/// Derived images for one wallpaper record.
pub struct DerivationCache {
    paper: WallPaper,
    settings: RendererSettings,

    source_version: u64,
    param_version: u64,

    full: Option<Slot<Arc<RgbaImage>>>,
    scaled: Option<Slot<PaperImage>>,
    /// True when `scaled` was made from the full document.
    scaled_from_full: bool,
    blurred: Option<Slot<PaperImage>>,
    /// Set when preparing the current inputs failed, to avoid resubmitting.
    failed: Option<DependencyVersion>,

    generation: u64,
    in_flight: Option<u64>,
    results_tx: Sender<PreparationResult>,
    results: Receiver<PreparationResult>,
}

impl DerivationCache {
    pub fn new(paper: WallPaper, settings: RendererSettings) -> Self {
        let (results_tx, results) = flume::unbounded();
        Self {
            paper,
            settings,
            source_version: 1,
            param_version: 1,
            full: None,
            scaled: None,
            scaled_from_full: false,
            blurred: None,
            failed: None,
            generation: 0,
            in_flight: None,
            results_tx,
            results,
        }
    }

    pub fn paper(&self) -> &WallPaper {
        &self.paper
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    fn source_dependency(&self) -> DependencyVersion {
        DependencyVersion::from_version(self.source_version)
    }

    fn derived_dependency(&self) -> DependencyVersion {
        DependencyVersion::combine(&[self.source_version, self.param_version])
    }

    /// Replaces the paper.
    ///
    /// A different document or local thumbnail drops the decoded full image.
    /// Changed display params only make the derived images stale. Either
    /// way an in-flight preparation is superseded.
    pub fn set_paper(&mut self, paper: WallPaper) {
        let source_changed = !self.paper.same_image_source(&paper);
        let params_changed = self.paper.is_pattern() != paper.is_pattern()
            || self.paper.background_colors() != paper.background_colors()
            || self.paper.gradient_rotation() != paper.gradient_rotation()
            || self.paper.pattern_intensity() != paper.pattern_intensity()
            || self.paper.is_blurred() != paper.is_blurred();

        if source_changed {
            self.source_version = self.source_version.wrapping_add(1);
            self.full = None;
        }
        if params_changed {
            self.param_version = self.param_version.wrapping_add(1);
        }
        if source_changed || params_changed {
            trace!(source_changed, params_changed, "wallpaper inputs changed");
            self.scaled = None;
            self.scaled_from_full = false;
            self.blurred = None;
            self.failed = None;
            self.supersede();
        }
        self.paper = paper;
    }

    /// Forgets any in-flight preparation.
    fn supersede(&mut self) {
        if let Some(generation) = self.in_flight.take() {
            debug!(generation, "superseding in-flight preparation");
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Derives the preview box from the thumbnail.
    ///
    /// The local thumbnail is preferred over the document thumbnail. Pattern
    /// documents are not previewed from their thumbnail since it cannot be
    /// colorized; they wait for the full document.
    pub fn set_scaled_from_thumb(&mut self, media: &impl MediaProvider) -> Readiness {
        let current = self.derived_dependency();
        if self.scaled.as_ref().and_then(|s| s.get(current)).is_some() {
            return Readiness::Ready;
        }
        let document = self.paper.document();
        if self.paper.is_pattern() && document.is_some() {
            return Readiness::NotReady;
        }
        let remote;
        let thumbnail = match self.paper.local_thumbnail() {
            Some(local) => &local.data,
            None => match document.and_then(|d| media.thumbnail(d)) {
                Some(image) => {
                    remote = image;
                    &remote
                }
                None => return Readiness::NotReady,
            },
        };
        if thumbnail.width() == 0 || thumbnail.height() == 0 {
            return Readiness::NotReady;
        }

        let params = PatternParams::of(&self.paper);
        let scaled = prepare_scaled_from_full(thumbnail, &params, &self.settings, document.is_some());
        let blurred = (document.is_none() && !params.is_pattern)
            .then(|| prepare_blurred_preview(thumbnail, &self.settings));

        self.scaled = Some(Slot::new(scaled, current));
        self.scaled_from_full = false;
        self.blurred = blurred.map(|b| Slot::new(b, current));
        Readiness::Ready
    }

    /// Starts preparing the full document once it has been downloaded.
    ///
    /// Returns `Ready` when the preview already comes from the current full
    /// document. Otherwise a job is queued unless one is in flight, the
    /// document is not loaded yet, or preparing these inputs failed before.
    pub fn check_loaded(&mut self, media: &impl MediaProvider, pool: &PreparationPool) -> Readiness {
        let Some(document) = self.paper.document() else {
            return Readiness::NotReady;
        };
        let current = self.derived_dependency();
        if self.scaled_from_full && self.scaled.as_ref().and_then(|s| s.get(current)).is_some() {
            return Readiness::Ready;
        }
        if self.in_flight.is_some() || self.failed == Some(current) {
            return Readiness::NotReady;
        }

        let source = match self.full() {
            Some(full) => JobSource::Decoded(Arc::clone(full)),
            None => match media.full_bytes(document) {
                Some(bytes) => JobSource::Encoded(bytes),
                None => return Readiness::NotReady,
            },
        };

        self.generation = self.generation.wrapping_add(1);
        let job = PreparationJob {
            generation: self.generation,
            source,
            params: PatternParams::of(&self.paper),
            settings: self.settings.clone(),
            reply: self.results_tx.clone(),
        };
        if pool.submit(job) {
            trace!(generation = self.generation, document = document.0, "submitted preparation");
            self.in_flight = Some(self.generation);
        } else {
            warn!("preparation pool is shut down");
        }
        Readiness::NotReady
    }

    /// Applies finished preparations. Returns true if any image changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(result) = self.results.try_recv() {
            changed |= self.apply(result);
        }
        changed
    }

    /// Blocks until the in-flight preparation lands or `timeout` passes.
    pub fn wait_prepared(&mut self, timeout: Duration) -> Readiness {
        let deadline = Instant::now() + timeout;
        self.poll();
        while self.in_flight.is_some() {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(left) {
                Ok(result) => {
                    self.apply(result);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        if self.scaled_from_full && self.scaled().is_some() {
            Readiness::Ready
        } else {
            Readiness::NotReady
        }
    }

    fn apply(&mut self, result: PreparationResult) -> bool {
        if self.in_flight != Some(result.generation) {
            trace!(generation = result.generation, "dropping stale preparation");
            return false;
        }
        self.in_flight = None;
        let current = self.derived_dependency();
        match result.outcome {
            Ok(prepared) => {
                self.full = Some(Slot::new(prepared.full, self.source_dependency()));
                self.scaled = Some(Slot::new(prepared.scaled, current));
                self.scaled_from_full = true;
                self.blurred = prepared.blurred.map(|b| Slot::new(b, current));
                true
            }
            Err(err) => {
                debug!(%err, generation = result.generation, "wallpaper preparation failed");
                self.failed = Some(current);
                false
            }
        }
    }

    pub fn is_preparing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The preview box, if it matches the current paper.
    pub fn scaled(&self) -> Option<&PaperImage> {
        let current = self.derived_dependency();
        self.scaled.as_ref().and_then(|s| s.get(current))
    }

    /// The blurred preview box of a photo, if it matches the current paper.
    pub fn blurred(&self) -> Option<&PaperImage> {
        let current = self.derived_dependency();
        self.blurred.as_ref().and_then(|s| s.get(current))
    }

    /// The decoded full document, if it matches the current source.
    pub fn full(&self) -> Option<&Arc<RgbaImage>> {
        let current = self.source_dependency();
        self.full.as_ref().and_then(|s| s.get(current))
    }

    /// What to show: the blurred variant when the paper is blurred and one
    /// exists, otherwise the preview box.
    pub fn display(&self) -> Option<&PaperImage> {
        if self.paper.is_blurred() {
            if let Some(blurred) = self.blurred() {
                return Some(blurred);
            }
        }
        self.scaled()
    }
}

// ============================================================================
// Tests
// ============================================================================
