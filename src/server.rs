//! Wallpaper service payloads.
//!
//! These mirror what the transport hands over after decoding a response.
//! Colors arrive as packed 24-bit integers.

use serde::{Deserialize, Serialize};

use crate::document::DocumentId;

/// Per-wallpaper settings as sent by the service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPaperSettings {
    #[serde(default)]
    pub blur: bool,
    #[serde(default)]
    pub background_color: Option<u32>,
    #[serde(default)]
    pub second_background_color: Option<u32>,
    #[serde(default)]
    pub third_background_color: Option<u32>,
    #[serde(default)]
    pub fourth_background_color: Option<u32>,
    #[serde(default)]
    pub intensity: Option<i32>,
    #[serde(default)]
    pub rotation: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoticon: Option<String>,
}

impl ServerPaperSettings {
    /// Background colors in order, stopping at the first absent one.
    pub fn packed_colors(&self) -> Vec<u32> {
        [
            self.background_color,
            self.second_background_color,
            self.third_background_color,
            self.fourth_background_color,
        ]
        .into_iter()
        .map_while(|c| c)
        .collect()
    }
}

/// A wallpaper entry from the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerWallPaper {
    /// A wallpaper backed by a downloadable document.
    #[serde(rename_all = "camelCase")]
    Document {
        id: u64,
        access_hash: u64,
        #[serde(default)]
        creator: bool,
        #[serde(default)]
        default: bool,
        #[serde(default)]
        pattern: bool,
        #[serde(default)]
        dark: bool,
        slug: String,
        document: DocumentId,
        #[serde(default)]
        settings: Option<ServerPaperSettings>,
    },
    /// A fill- or gradient-only wallpaper.
    #[serde(rename_all = "camelCase")]
    NoFile {
        id: u64,
        #[serde(default)]
        default: bool,
        #[serde(default)]
        dark: bool,
        #[serde(default)]
        settings: Option<ServerPaperSettings>,
    },
}

/// The full wallpaper list with the service's integrity hash.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPaperList {
    pub papers: Vec<ServerWallPaper>,
    pub hash: u64,
}
