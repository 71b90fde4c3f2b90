use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::media::{MediaKind, MediaSummary};

/// Body for `POST /user/favorites/toggle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavorite {
    pub content_id: u64,
    pub content_type: MediaKind,
    pub title: String,
    pub image_url: String,
    pub score: f64,
    pub year: i64,
}

impl ToggleFavorite {
    pub fn from_summary(summary: &MediaSummary) -> Self {
        Self {
            content_id: summary.id,
            content_type: summary.kind,
            title: summary.title.clone(),
            image_url: summary.image_url.clone(),
            score: summary.score.unwrap_or(0.0),
            year: summary.year.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    pub success: bool,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RemoveOutcome {
    pub success: bool,
}

/// One entry of the locally persisted `favorites` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(rename = "addedAt")]
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn toggle_body_uses_camel_case() {
        let body = ToggleFavorite {
            content_id: 21,
            content_type: MediaKind::Anime,
            title: "One Piece".into(),
            image_url: "http://img/one-piece.jpg".into(),
            score: 8.71,
            year: 1999,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "contentId": 21,
                "contentType": "anime",
                "title": "One Piece",
                "imageUrl": "http://img/one-piece.jpg",
                "score": 8.71,
                "year": 1999
            })
        );
    }

    #[test]
    fn missing_score_and_year_default_to_zero() {
        let summary = MediaSummary {
            id: 5,
            kind: MediaKind::Manga,
            title: "Untitled".into(),
            score: None,
            year: None,
            image_url: "http://img/x.jpg".into(),
        };
        let body = ToggleFavorite::from_summary(&summary);
        assert_eq!(body.score, 0.0);
        assert_eq!(body.year, 0);
    }

    #[test]
    fn stored_entry_round_trips_through_the_wire_names() {
        let raw = json!([{"id": 7, "type": "manga", "addedAt": "2026-08-07T12:00:00Z"}]);
        let entries: Vec<FavoriteEntry> = serde_json::from_value(raw).unwrap();
        assert_eq!(entries[0].id, 7);
        assert_eq!(entries[0].kind, MediaKind::Manga);
    }
}
