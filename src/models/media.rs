use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/250x350?text=No+Image";

/// The two content kinds the catalog serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Anime,
    Manga,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Anime => "anime",
            MediaKind::Manga => "manga",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat summary of a catalog entry, extracted from the raw API payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSummary {
    pub id: u64,
    pub kind: MediaKind,
    pub title: String,
    pub score: Option<f64>,
    pub year: Option<i64>,
    pub image_url: String,
}

impl MediaSummary {
    /// Pulls the fields the UI cares about out of one raw entry. Entries
    /// without an id or title are skipped by callers.
    pub fn from_entry(entry: &Value, kind: MediaKind) -> Option<Self> {
        let id = entry.get("mal_id").and_then(|v| v.as_u64())?;
        let title = entry
            .get("title")
            .or_else(|| entry.get("name"))
            .and_then(|v| v.as_str())?
            .to_string();
        Some(Self {
            id,
            kind,
            title,
            score: entry.get("score").and_then(|v| v.as_f64()),
            year: entry.get("year").and_then(|v| v.as_i64()),
            image_url: safe_image(entry),
        })
    }
}

/// Image fallback chain: large jpg, then jpg, then the flat field, then a placeholder.
pub fn safe_image(entry: &Value) -> String {
    if let Some(jpg) = entry.get("images").and_then(|i| i.get("jpg")) {
        if let Some(url) = jpg
            .get("large_image_url")
            .and_then(|u| u.as_str())
            .or_else(|| jpg.get("image_url").and_then(|u| u.as_str()))
        {
            return url.to_string();
        }
    }
    if let Some(url) = entry.get("image_url").and_then(|u| u.as_str()) {
        return url.to_string();
    }
    PLACEHOLDER_IMAGE.to_string()
}
