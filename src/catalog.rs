//! The in-memory list of known wallpapers.
//!
//! A [`PaperCatalog`] is filled from the service list, sorted by display
//! preference and shrunk as wallpapers are deleted. Selection and hover are
//! positional, so any structural change resets them.

use image::RgbaImage;
use tracing::{debug, trace};

use crate::document::{DocumentId, MediaProvider};
use crate::paper::{PaperId, WallPaper};
use crate::pixmap::PaperImage;
use crate::server::{ServerPaperList, ServerWallPaper};

/// One catalog entry.
#[derive(Debug, Clone)]
pub struct Paper {
    pub data: WallPaper,
    /// Preview pixels once derived.
    pub thumbnail: Option<PaperImage>,
    /// Media handle the preview loads from.
    pub document: Option<DocumentId>,
}

impl Paper {
    pub fn new(data: WallPaper) -> Self {
        let document = data.document();
        Self {
            data,
            thumbnail: None,
            document,
        }
    }
}

/// Ordered wallpapers plus positional selection state.
#[derive(Debug, Clone, Default)]
pub struct PaperCatalog {
    papers: Vec<Paper>,
    server_hash: u64,
    selected: Option<usize>,
    over: Option<usize>,
}

/// A pattern without a fill color cannot be drawn.
fn is_renderable(paper: &WallPaper) -> bool {
    !paper.is_pattern() || !paper.background_colors().is_empty()
}

impl PaperCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents with a service list.
    ///
    /// Entries the media layer rejects and patterns without colors are
    /// skipped. Thumbnail loads are requested for the rest.
    pub fn ingest(&mut self, list: &ServerPaperList, self_user: u64, media: &mut impl MediaProvider) {
        self.papers.clear();
        self.extend(&list.papers, self_user, media);
        self.server_hash = list.hash;
    }

    /// Appends service entries without touching the stored hash.
    pub fn extend(&mut self, entries: &[ServerWallPaper], self_user: u64, media: &mut impl MediaProvider) {
        let before = self.papers.len();
        for entry in entries {
            let Some(paper) = WallPaper::create(entry, self_user, &*media) else {
                continue;
            };
            if !is_renderable(&paper) {
                trace!(id = ?paper.id(), "skipping pattern without colors");
                continue;
            }
            paper.load_document_thumbnail(media);
            self.papers.push(Paper::new(paper));
        }
        debug!(
            added = self.papers.len() - before,
            skipped = entries.len() - (self.papers.len() - before),
            "ingested wallpapers"
        );
        self.reset_selection();
    }

    /// Adds an already built record, applying the same filter as ingest.
    pub fn push(&mut self, paper: WallPaper) -> bool {
        if !is_renderable(&paper) {
            return false;
        }
        self.papers.push(Paper::new(paper));
        self.reset_selection();
        true
    }

    /// True if the service list has changed since the last ingest.
    pub fn is_stale(&self, server_hash: u64) -> bool {
        self.server_hash != server_hash
    }

    pub fn server_hash(&self) -> u64 {
        self.server_hash
    }

    /// Orders by preference: the active wallpaper first, then those matching
    /// the night mode, then cloud papers without local pixels, then cloud
    /// papers with them. Ties keep their order.
    ///
    /// The active entry then takes the params of `applied`.
    pub fn sort(&mut self, active: PaperId, prefer_night: bool, applied: &WallPaper) {
        self.papers.sort_by_key(|paper| {
            let data = &paper.data;
            std::cmp::Reverse((
                data.id() == active,
                data.is_dark() == prefer_night,
                data.is_cloud() && !data.is_local(),
                data.is_cloud() && data.is_local(),
            ))
        });
        self.reset_selection();
        if self.papers.first().is_some_and(|p| p.data.id() == active) {
            self.refresh_active_params(applied);
        }
    }

    /// Copies colors, intensity, blur and rotation of the applied background
    /// into the front entry, so a live-edited wallpaper looks current.
    pub fn refresh_active_params(&mut self, applied: &WallPaper) {
        if let Some(front) = self.papers.first_mut() {
            let refreshed = front
                .data
                .clone()
                .with_params_from(applied)
                .with_gradient_rotation(applied.gradient_rotation());
            if refreshed != front.data {
                front.thumbnail = None;
            }
            front.data = refreshed;
        }
    }

    /// Erases the entry with `id`. Returns true if one was found.
    pub fn remove(&mut self, id: PaperId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.papers.remove(index);
        self.reset_selection();
        true
    }

    fn reset_selection(&mut self) {
        self.selected = None;
        self.over = None;
    }

    pub fn position(&self, id: PaperId) -> Option<usize> {
        self.papers.iter().position(|p| p.data.id() == id)
    }

    pub fn find(&self, id: PaperId) -> Option<&Paper> {
        self.papers.iter().find(|p| p.data.id() == id)
    }

    /// Stores a derived preview for the entry with `id`.
    pub fn set_thumbnail(&mut self, id: PaperId, image: PaperImage) -> bool {
        match self.papers.iter_mut().find(|p| p.data.id() == id) {
            Some(paper) => {
                paper.thumbnail = Some(image);
                true
            }
            None => false,
        }
    }

    /// Pulls loaded document thumbnails from the media layer into entries
    /// that have none yet. Returns how many were filled.
    pub fn collect_thumbnails(&mut self, media: &impl MediaProvider) -> usize {
        let mut filled = 0;
        for paper in self.papers.iter_mut().filter(|p| p.thumbnail.is_none()) {
            let loaded: Option<RgbaImage> = paper.document.and_then(|d| media.thumbnail(d));
            if let Some(image) = loaded {
                paper.thumbnail = Some(PaperImage::straight(image));
                filled += 1;
            }
        }
        filled
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Selects an index; out of range clears the selection.
    pub fn set_selected(&mut self, index: Option<usize>) {
        self.selected = index.filter(|i| *i < self.papers.len());
    }

    pub fn over(&self) -> Option<usize> {
        self.over
    }

    /// Marks the hovered index; out of range clears it.
    pub fn set_over(&mut self, index: Option<usize>) {
        self.over = index.filter(|i| *i < self.papers.len());
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Paper> {
        self.papers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Paper> {
        self.papers.iter()
    }
}

impl<'a> IntoIterator for &'a PaperCatalog {
    type Item = &'a Paper;
    type IntoIter = std::slice::Iter<'a, Paper>;

    fn into_iter(self) -> Self::IntoIter {
        self.papers.iter()
    }
}
