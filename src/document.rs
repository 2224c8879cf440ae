//! Document handles and the media collaborator.
//!
//! Wallpaper records never own their document. They hold a [`DocumentId`]
//! into a session-wide registry, and pixels are pulled through the
//! [`MediaProvider`] trait once the transport has delivered them.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::paper::PaperOrigin;

/// Non-owning handle to a document held by a [`MediaProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

/// Source of wallpaper document data.
///
/// Loading is asynchronous and owned by the implementation: `request_*`
/// starts a download, and the owner re-queries once the completion
/// callback fires on the main thread.
pub trait MediaProvider {
    /// Returns true if the document carries valid wallpaper attributes.
    fn is_wallpaper(&self, document: DocumentId) -> bool;

    /// Returns the document thumbnail if it is already loaded.
    fn thumbnail(&self, document: DocumentId) -> Option<RgbaImage>;

    /// Returns the fully downloaded document bytes, if available.
    fn full_bytes(&self, document: DocumentId) -> Option<Arc<Vec<u8>>>;

    /// Starts loading the remote thumbnail.
    fn request_thumbnail(&mut self, document: DocumentId, origin: &PaperOrigin);

    /// Starts downloading the full document.
    fn request_full(&mut self, document: DocumentId, origin: &PaperOrigin);
}

/// What kind of load a [`DocumentRegistry`] was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Thumbnail(DocumentId, PaperOrigin),
    Full(DocumentId, PaperOrigin),
}

#[derive(Debug, Default)]
struct DocumentEntry {
    wallpaper: bool,
    thumbnail: Option<RgbaImage>,
    bytes: Option<Arc<Vec<u8>>>,
}

/// In-memory [`MediaProvider`].
///
/// Records load requests instead of performing them; the transport layer
/// drains [`take_requests`](Self::take_requests) and fills data back in.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: HashMap<DocumentId, DocumentEntry>,
    requests: Vec<LoadRequest>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document. `wallpaper` marks it as having wallpaper attributes.
    pub fn insert(&mut self, document: DocumentId, wallpaper: bool) {
        self.documents.entry(document).or_default().wallpaper = wallpaper;
    }

    pub fn contains(&self, document: DocumentId) -> bool {
        self.documents.contains_key(&document)
    }

    /// Stores a loaded thumbnail.
    pub fn set_thumbnail(&mut self, document: DocumentId, image: RgbaImage) {
        self.documents.entry(document).or_default().thumbnail = Some(image);
    }

    /// Stores downloaded document bytes.
    pub fn set_full_bytes(&mut self, document: DocumentId, bytes: Vec<u8>) {
        self.documents.entry(document).or_default().bytes = Some(Arc::new(bytes));
    }

    /// Returns and clears the pending load requests.
    pub fn take_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl MediaProvider for DocumentRegistry {
    fn is_wallpaper(&self, document: DocumentId) -> bool {
        self.documents.get(&document).is_some_and(|d| d.wallpaper)
    }

    fn thumbnail(&self, document: DocumentId) -> Option<RgbaImage> {
        self.documents.get(&document)?.thumbnail.clone()
    }

    fn full_bytes(&self, document: DocumentId) -> Option<Arc<Vec<u8>>> {
        self.documents.get(&document)?.bytes.clone()
    }

    fn request_thumbnail(&mut self, document: DocumentId, origin: &PaperOrigin) {
        self.requests
            .push(LoadRequest::Thumbnail(document, origin.clone()));
    }

    fn request_full(&mut self, document: DocumentId, origin: &PaperOrigin) {
        self.requests.push(LoadRequest::Full(document, origin.clone()));
    }
}
