use serde_json::Value;
use tracing::{error, info};

use crate::api::jikan::JikanApi;
use crate::error::CatalogError;
use crate::models::media::{MediaKind, MediaSummary};
use crate::utils::display::DisplayFormatter;

/// Page-level layer above the fetch core: maps raw entries to summaries and
/// substitutes an empty list when a request fails terminally, so callers can
/// always render something.
pub struct CatalogService {
    api: JikanApi,
    display: DisplayFormatter,
}

impl CatalogService {
    pub fn new() -> Self {
        Self::with_api(JikanApi::new())
    }

    pub fn with_api(api: JikanApi) -> Self {
        Self {
            api,
            display: DisplayFormatter::new(),
        }
    }

    pub async fn top(&self, kind: MediaKind, limit: u32) -> Vec<MediaSummary> {
        self.summaries(self.api.top(kind, limit).await, kind)
    }

    pub async fn latest_manga(&self, limit: u32) -> Vec<MediaSummary> {
        self.summaries(self.api.latest_manga(limit).await, MediaKind::Manga)
    }

    pub async fn search(&self, kind: MediaKind, query: &str, limit: u32) -> Vec<MediaSummary> {
        self.summaries(self.api.search(kind, query, limit).await, kind)
    }

    pub async fn season(&self, upcoming: bool, limit: u32) -> Vec<MediaSummary> {
        let result = if upcoming {
            self.api.season_upcoming(limit).await
        } else {
            self.api.season_now(limit).await
        };
        self.summaries(result, MediaKind::Anime)
    }

    pub async fn by_genres(
        &self,
        kind: MediaKind,
        genre_ids: &[u32],
        limit: u32,
    ) -> Vec<MediaSummary> {
        self.summaries(self.api.by_genres(kind, genre_ids, limit).await, kind)
    }

    /// Full details for one entry, reduced to a summary. `None` when the
    /// entry is missing or the request failed.
    pub async fn details(&self, kind: MediaKind, id: u64) -> Option<MediaSummary> {
        match self.api.full_details(kind, id).await {
            Ok(data) => MediaSummary::from_entry(&data, kind),
            Err(err) => {
                error!("failed to fetch {} {}: {}", kind, id, err);
                None
            }
        }
    }

    pub async fn fetch_and_display_top(&self, kind: MediaKind, limit: u32) {
        info!("Fetching top {} list", kind);
        let entries = self.top(kind, limit).await;
        println!("{}", self.display.format_header(&format!("Top {}", kind)));
        println!("{}", self.display.format_media_table(&entries));
    }

    pub async fn fetch_and_display_latest_manga(&self, limit: u32) {
        info!("Fetching latest manga");
        let entries = self.latest_manga(limit).await;
        println!("{}", self.display.format_header("Latest Manga"));
        println!("{}", self.display.format_media_table(&entries));
    }

    pub async fn fetch_and_display_search(&self, kind: MediaKind, query: &str, limit: u32) {
        info!("Searching {} for: {}", kind, query);
        let entries = self.search(kind, query, limit).await;
        println!(
            "{}",
            self.display
                .format_header(&format!("{} results for \"{}\"", kind, query))
        );
        println!("{}", self.display.format_media_table(&entries));
    }

    pub async fn fetch_and_display_season(&self, upcoming: bool, limit: u32) {
        info!("Fetching {} season", if upcoming { "upcoming" } else { "current" });
        let entries = self.season(upcoming, limit).await;
        let header = if upcoming { "Upcoming Season" } else { "Current Season" };
        println!("{}", self.display.format_header(header));
        println!("{}", self.display.format_media_table(&entries));
    }

    fn summaries(
        &self,
        result: Result<Vec<Value>, CatalogError>,
        kind: MediaKind,
    ) -> Vec<MediaSummary> {
        match result {
            Ok(entries) => entries
                .iter()
                .filter_map(|entry| MediaSummary::from_entry(entry, kind))
                .collect(),
            Err(err) => {
                error!("catalog request failed, substituting empty list: {}", err);
                Vec::new()
            }
        }
    }
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}
