use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::error::CatalogError;
use crate::models::favorites::{
    CheckOutcome, FavoriteEntry, RemoveOutcome, ToggleFavorite, ToggleOutcome,
};
use crate::models::media::MediaKind;

pub const FAVORITES_KEY: &str = "favorites";

/// Client-side persistence seam standing in for browser storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

impl<S: KeyValueStore> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) {
        (**self).set(key, value);
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries.lock().unwrap().insert(key.to_string(), value);
    }
}

/// First-party favorites backend (external collaborator).
#[async_trait]
pub trait FavoritesBackend: Send + Sync {
    async fn toggle(&self, request: &ToggleFavorite) -> Result<ToggleOutcome, CatalogError>;
    async fn check(&self, id: u64, kind: MediaKind) -> Result<CheckOutcome, CatalogError>;
    async fn remove(&self, id: u64, kind: MediaKind) -> Result<RemoveOutcome, CatalogError>;
}

pub struct HttpFavoritesBackend {
    client: Client,
    base_url: String,
}

impl HttpFavoritesBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

fn status_error(status: reqwest::StatusCode) -> CatalogError {
    CatalogError::Status {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    }
}

#[async_trait]
impl FavoritesBackend for HttpFavoritesBackend {
    async fn toggle(&self, request: &ToggleFavorite) -> Result<ToggleOutcome, CatalogError> {
        let url = format!("{}/user/favorites/toggle", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(e.to_string()))
    }

    async fn check(&self, id: u64, kind: MediaKind) -> Result<CheckOutcome, CatalogError> {
        let url = format!(
            "{}/user/favorites/check?contentId={}&contentType={}",
            self.base_url,
            id,
            kind.as_str()
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(e.to_string()))
    }

    async fn remove(&self, id: u64, kind: MediaKind) -> Result<RemoveOutcome, CatalogError> {
        let url = format!(
            "{}/user/favorites/remove?contentId={}&contentType={}",
            self.base_url,
            id,
            kind.as_str()
        );
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(e.to_string()))
    }
}

/// How a toggle landed: confirmed by the backend, or applied to the local
/// store while the backend was unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleResult {
    Backend { is_favorite: bool },
    Local { is_favorite: bool },
}

impl ToggleResult {
    pub fn is_favorite(&self) -> bool {
        match self {
            ToggleResult::Backend { is_favorite } | ToggleResult::Local { is_favorite } => {
                *is_favorite
            }
        }
    }
}

/// Favorites kept in sync with the backend, with the local store as the
/// offline fallback.
pub struct FavoritesService {
    backend: Box<dyn FavoritesBackend>,
    store: Box<dyn KeyValueStore>,
}

impl FavoritesService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_parts(
            Box::new(HttpFavoritesBackend::new(base_url)),
            Box::new(MemoryStore::new()),
        )
    }

    pub fn with_parts(backend: Box<dyn FavoritesBackend>, store: Box<dyn KeyValueStore>) -> Self {
        Self { backend, store }
    }

    /// Flips the favorite state of one entry. When the backend is
    /// unreachable the flip happens against the local store only.
    pub async fn toggle(&self, request: &ToggleFavorite) -> Result<ToggleResult, CatalogError> {
        match self.backend.toggle(request).await {
            Ok(outcome) if outcome.success => {
                self.sync_store(request.content_id, request.content_type, outcome.is_favorite);
                Ok(ToggleResult::Backend {
                    is_favorite: outcome.is_favorite,
                })
            }
            Ok(_) => Err(CatalogError::Rejected),
            Err(err) => {
                warn!("favorites backend unreachable, toggling locally: {}", err);
                let is_favorite = self.toggle_local(request.content_id, request.content_type);
                Ok(ToggleResult::Local { is_favorite })
            }
        }
    }

    /// Backend verdict when reachable, local store membership otherwise.
    pub async fn is_favorite(&self, id: u64, kind: MediaKind) -> bool {
        match self.backend.check(id, kind).await {
            Ok(outcome) => outcome.is_favorite,
            Err(err) => {
                warn!("favorites check failed, falling back to local store: {}", err);
                self.load().iter().any(|f| f.id == id && f.kind == kind)
            }
        }
    }

    /// Removes an entry. No local fallback on this path: a failed backend
    /// call surfaces and the store is left untouched.
    pub async fn remove(&self, id: u64, kind: MediaKind) -> Result<(), CatalogError> {
        let outcome = self.backend.remove(id, kind).await?;
        if !outcome.success {
            return Err(CatalogError::Rejected);
        }
        let mut entries = self.load();
        entries.retain(|f| !(f.id == id && f.kind == kind));
        self.save(&entries);
        Ok(())
    }

    pub fn local_favorites(&self) -> Vec<FavoriteEntry> {
        self.load()
    }

    fn load(&self) -> Vec<FavoriteEntry> {
        self.store
            .get(FAVORITES_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn save(&self, entries: &[FavoriteEntry]) {
        if let Ok(raw) = serde_json::to_string(entries) {
            self.store.set(FAVORITES_KEY, raw);
        }
    }

    fn sync_store(&self, id: u64, kind: MediaKind, is_favorite: bool) {
        let mut entries = self.load();
        if is_favorite {
            if !entries.iter().any(|f| f.id == id && f.kind == kind) {
                entries.push(FavoriteEntry {
                    id,
                    kind,
                    added_at: Utc::now(),
                });
            }
        } else {
            entries.retain(|f| !(f.id == id && f.kind == kind));
        }
        debug!("synced local favorites, {} entries", entries.len());
        self.save(&entries);
    }

    fn toggle_local(&self, id: u64, kind: MediaKind) -> bool {
        let mut entries = self.load();
        if let Some(position) = entries.iter().position(|f| f.id == id && f.kind == kind) {
            entries.remove(position);
            self.save(&entries);
            false
        } else {
            entries.push(FavoriteEntry {
                id,
                kind,
                added_at: Utc::now(),
            });
            self.save(&entries);
            true
        }
    }
}
