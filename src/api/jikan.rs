use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::api::transport::{HttpTransport, Transport};
use crate::error::CatalogError;
use crate::models::cache::{ResponseCache, DEFAULT_TTL};
use crate::models::media::MediaKind;

pub const API_BASE: &str = "https://api.jikan.moe/v4";
pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_millis(2000);

enum AttemptError {
    RateLimited,
    Retryable(CatalogError),
    Fatal(CatalogError),
}

pub struct JikanApi {
    transport: Box<dyn Transport>,
    cache: ResponseCache,
    base_url: String,
    retry_delay: Duration,
}

impl JikanApi {
    pub fn new() -> Self {
        Self::with_transport(
            Box::new(HttpTransport::new()),
            ResponseCache::new(DEFAULT_TTL),
        )
    }

    pub fn with_transport(transport: Box<dyn Transport>, cache: ResponseCache) -> Self {
        Self {
            transport,
            cache,
            base_url: API_BASE.to_string(),
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// GET with the default retry budget.
    pub async fn fetch(&self, url: &str) -> Result<Value, CatalogError> {
        self.fetch_with_retry(url, MAX_RETRIES).await
    }

    /// Cached GET. 429 and transport failures are retried after a fixed delay
    /// until the budget runs out; any other error status fails immediately.
    pub async fn fetch_with_retry(
        &self,
        url: &str,
        max_retries: u32,
    ) -> Result<Value, CatalogError> {
        if let Some(cached) = self.cache.get(url) {
            debug!("Cache hit for {}", url);
            return Ok(cached);
        }
        debug!("Cache miss for {}", url);

        let mut retries_left = max_retries;
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match self.attempt(url).await {
                Ok(value) => {
                    self.cache.insert(url, value.clone());
                    return Ok(value);
                }
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::RateLimited) => {
                    if retries_left == 0 {
                        return Err(CatalogError::RateLimited { attempts });
                    }
                    debug!(
                        "rate limited on {}, retrying in {:?} ({} retries left)",
                        url, self.retry_delay, retries_left
                    );
                    retries_left -= 1;
                    sleep(self.retry_delay).await;
                }
                Err(AttemptError::Retryable(err)) => {
                    if retries_left == 0 {
                        return Err(err);
                    }
                    debug!(
                        "request to {} failed ({}), retrying in {:?} ({} retries left)",
                        url, err, self.retry_delay, retries_left
                    );
                    retries_left -= 1;
                    sleep(self.retry_delay).await;
                }
            }
        }
    }

    async fn attempt(&self, url: &str) -> Result<Value, AttemptError> {
        let response = match self.transport.get(url).await {
            Ok(response) => response,
            Err(err) => return Err(AttemptError::Retryable(err)),
        };

        if response.is_rate_limited() {
            return Err(AttemptError::RateLimited);
        }
        if !response.is_success() {
            return Err(AttemptError::Fatal(CatalogError::Status {
                status: response.status,
                reason: response.reason,
            }));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            AttemptError::Retryable(CatalogError::Transport(format!("invalid JSON body: {e}")))
        })
    }

    // ---- catalog endpoints -------------------------------------------------

    pub async fn top(&self, kind: MediaKind, limit: u32) -> Result<Vec<Value>, CatalogError> {
        let url = format!("{}/top/{}?limit={}", self.base_url, kind.as_str(), limit);
        data_entries(self.fetch(&url).await?)
    }

    pub async fn top_anime_filtered(
        &self,
        filter: &str,
        limit: u32,
    ) -> Result<Vec<Value>, CatalogError> {
        let url = format!(
            "{}/top/anime?limit={}&filter={}",
            self.base_url, limit, filter
        );
        data_entries(self.fetch(&url).await?)
    }

    pub async fn latest_manga(&self, limit: u32) -> Result<Vec<Value>, CatalogError> {
        let url = format!(
            "{}/manga?order_by=start_date&sort=desc&limit={}",
            self.base_url, limit
        );
        data_entries(self.fetch(&url).await?)
    }

    pub async fn search(
        &self,
        kind: MediaKind,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Value>, CatalogError> {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let url = format!(
            "{}/{}?q={}&limit={}",
            self.base_url,
            kind.as_str(),
            encoded,
            limit
        );
        data_entries(self.fetch(&url).await?)
    }

    pub async fn by_genres(
        &self,
        kind: MediaKind,
        genre_ids: &[u32],
        limit: u32,
    ) -> Result<Vec<Value>, CatalogError> {
        let genres = genre_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/{}?genres={}&limit={}&order_by=popularity",
            self.base_url,
            kind.as_str(),
            genres,
            limit
        );
        data_entries(self.fetch(&url).await?)
    }

    pub async fn full_details(&self, kind: MediaKind, id: u64) -> Result<Value, CatalogError> {
        let url = format!("{}/{}/{}/full", self.base_url, kind.as_str(), id);
        data_object(self.fetch(&url).await?)
    }

    pub async fn season_now(&self, limit: u32) -> Result<Vec<Value>, CatalogError> {
        let url = format!("{}/seasons/now?limit={}", self.base_url, limit);
        data_entries(self.fetch(&url).await?)
    }

    pub async fn season_upcoming(&self, limit: u32) -> Result<Vec<Value>, CatalogError> {
        let url = format!("{}/seasons/upcoming?limit={}", self.base_url, limit);
        data_entries(self.fetch(&url).await?)
    }
}

impl Default for JikanApi {
    fn default() -> Self {
        Self::new()
    }
}

/// Unwraps the `data` array every list endpoint carries. A missing or
/// non-array `data` is a malformed payload; an empty array is an ordinary
/// empty result.
fn data_entries(mut payload: Value) -> Result<Vec<Value>, CatalogError> {
    match payload.get_mut("data").map(Value::take) {
        Some(Value::Array(entries)) => Ok(entries),
        Some(_) => Err(CatalogError::Malformed("`data` is not an array".into())),
        None => Err(CatalogError::Malformed("missing `data` field".into())),
    }
}

fn data_object(mut payload: Value) -> Result<Value, CatalogError> {
    match payload.get_mut("data").map(Value::take) {
        Some(Value::Null) | None => Err(CatalogError::Malformed("missing `data` field".into())),
        Some(data) => Ok(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::RawResponse;
    use crate::models::cache::Clock;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    const TEST_DELAY: Duration = Duration::from_millis(5);

    #[derive(Clone, Default)]
    struct StubTransport {
        responses: Arc<Mutex<VecDeque<Result<RawResponse, CatalogError>>>>,
        calls: Arc<AtomicU32>,
    }

    impl StubTransport {
        fn push_ok(&self, status: u16, body: &str) {
            self.responses.lock().unwrap().push_back(Ok(RawResponse {
                status,
                reason: match status {
                    200 => "OK".into(),
                    404 => "Not Found".into(),
                    429 => "Too Many Requests".into(),
                    500 => "Internal Server Error".into(),
                    _ => "Unknown".into(),
                },
                body: body.to_string(),
            }));
        }

        fn push_err(&self, message: &str) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(CatalogError::Transport(message.to_string())));
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn get(&self, _url: &str) -> Result<RawResponse, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected request")
        }
    }

    #[derive(Clone)]
    struct ManualClock {
        now: Arc<Mutex<Instant>>,
    }

    impl ManualClock {
        fn start() -> Self {
            Self {
                now: Arc::new(Mutex::new(Instant::now())),
            }
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    fn api_with(stub: &StubTransport) -> JikanApi {
        JikanApi::with_transport(Box::new(stub.clone()), ResponseCache::new(DEFAULT_TTL))
            .with_base_url("http://test")
            .with_retry_delay(TEST_DELAY)
    }

    #[tokio::test]
    async fn second_fetch_within_ttl_hits_the_cache() {
        let stub = StubTransport::default();
        stub.push_ok(200, r#"{"data": [1]}"#);
        let api = api_with(&stub);

        let first = api.fetch("http://test/top/anime?limit=5").await.unwrap();
        let second = api.fetch("http://test/top/anime?limit=5").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn expired_entry_triggers_a_new_request() {
        let stub = StubTransport::default();
        stub.push_ok(200, r#"{"data": [1]}"#);
        stub.push_ok(200, r#"{"data": [2]}"#);
        let clock = ManualClock::start();
        let cache = ResponseCache::with_clock(DEFAULT_TTL, Box::new(clock.clone()));
        let api = JikanApi::with_transport(Box::new(stub.clone()), cache)
            .with_base_url("http://test")
            .with_retry_delay(TEST_DELAY);

        let first = api.fetch("http://test/top/manga").await.unwrap();
        clock.advance(DEFAULT_TTL + Duration::from_millis(1));
        let second = api.fetch("http://test/top/manga").await.unwrap();

        assert_eq!(first, json!({"data": [1]}));
        assert_eq!(second, json!({"data": [2]}));
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn rate_limit_retries_after_the_fixed_delay_then_succeeds() {
        let stub = StubTransport::default();
        stub.push_ok(429, "");
        stub.push_ok(429, "");
        stub.push_ok(200, r#"{"data": []}"#);
        let api = api_with(&stub);

        let started = Instant::now();
        let value = api.fetch_with_retry("http://test/x", 3).await.unwrap();

        assert_eq!(value, json!({"data": []}));
        assert_eq!(stub.calls(), 3);
        // one fixed-delay wait per rate-limited attempt
        assert!(started.elapsed() >= TEST_DELAY * 2);
    }

    #[tokio::test]
    async fn persistent_rate_limit_exhausts_the_budget() {
        let stub = StubTransport::default();
        for _ in 0..4 {
            stub.push_ok(429, "");
        }
        let api = api_with(&stub);

        let err = api.fetch_with_retry("http://test/x", 3).await.unwrap_err();

        assert!(matches!(err, CatalogError::RateLimited { attempts: 4 }));
        assert_eq!(stub.calls(), 4);
    }

    #[tokio::test]
    async fn error_status_fails_immediately_without_retry() {
        let stub = StubTransport::default();
        stub.push_ok(500, "");
        let api = api_with(&stub);

        let err = api.fetch_with_retry("http://test/x", 3).await.unwrap_err();

        assert!(matches!(err, CatalogError::Status { status: 500, .. }));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn not_found_carries_status_and_reason() {
        let stub = StubTransport::default();
        stub.push_ok(404, "");
        let api = api_with(&stub);

        let err = api.fetch("http://test/anime/0/full").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
    }

    #[tokio::test]
    async fn transport_failure_is_retried() {
        let stub = StubTransport::default();
        stub.push_err("connection refused");
        stub.push_ok(200, r#"{"data": [1]}"#);
        let api = api_with(&stub);

        let value = api.fetch_with_retry("http://test/x", 3).await.unwrap();
        assert_eq!(value, json!({"data": [1]}));
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_after_the_budget() {
        let stub = StubTransport::default();
        stub.push_err("connection refused");
        stub.push_err("connection refused");
        let api = api_with(&stub);

        let err = api.fetch_with_retry("http://test/x", 1).await.unwrap_err();
        assert!(matches!(err, CatalogError::Transport(_)));
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn undecodable_body_is_retried_like_a_transport_failure() {
        let stub = StubTransport::default();
        stub.push_ok(200, "<html>not json</html>");
        stub.push_ok(200, r#"{"data": [1]}"#);
        let api = api_with(&stub);

        let value = api.fetch_with_retry("http://test/x", 3).await.unwrap();
        assert_eq!(value, json!({"data": [1]}));
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn failed_fetches_are_not_cached() {
        let stub = StubTransport::default();
        stub.push_ok(500, "");
        stub.push_ok(200, r#"{"data": [1]}"#);
        let api = api_with(&stub);

        assert!(api.fetch("http://test/x").await.is_err());
        assert_eq!(api.fetch("http://test/x").await.unwrap(), json!({"data": [1]}));
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn list_endpoint_distinguishes_empty_from_malformed() {
        let stub = StubTransport::default();
        stub.push_ok(200, r#"{"data": []}"#);
        let api = api_with(&stub);
        assert_eq!(api.top(MediaKind::Anime, 5).await.unwrap(), Vec::<Value>::new());

        let stub = StubTransport::default();
        stub.push_ok(200, r#"{"pagination": {}}"#);
        let api = api_with(&stub);
        let err = api.top(MediaKind::Anime, 5).await.unwrap_err();
        assert!(matches!(err, CatalogError::Malformed(_)));
    }

    struct Recorder {
        urls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn get(&self, url: &str) -> Result<RawResponse, CatalogError> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(RawResponse {
                status: 200,
                reason: "OK".into(),
                body: r#"{"data": []}"#.into(),
            })
        }
    }

    fn recording_api() -> (JikanApi, Arc<Mutex<Vec<String>>>) {
        let urls: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let api = JikanApi::with_transport(
            Box::new(Recorder { urls: urls.clone() }),
            ResponseCache::new(DEFAULT_TTL),
        )
        .with_base_url("http://test");
        (api, urls)
    }

    #[tokio::test]
    async fn search_urlencodes_the_query() {
        let (api, urls) = recording_api();

        api.search(MediaKind::Anime, "full metal", 10).await.unwrap();
        assert_eq!(
            urls.lock().unwrap()[0],
            "http://test/anime?q=full+metal&limit=10"
        );
    }

    #[tokio::test]
    async fn endpoint_urls_follow_the_catalog_layout() {
        let (api, urls) = recording_api();

        api.top(MediaKind::Manga, 20).await.unwrap();
        api.top_anime_filtered("airing", 10).await.unwrap();
        api.latest_manga(12).await.unwrap();
        api.by_genres(MediaKind::Anime, &[1, 24], 8).await.unwrap();
        api.full_details(MediaKind::Anime, 21).await.unwrap();
        api.season_now(6).await.unwrap();
        api.season_upcoming(6).await.unwrap();

        assert_eq!(
            *urls.lock().unwrap(),
            vec![
                "http://test/top/manga?limit=20",
                "http://test/top/anime?limit=10&filter=airing",
                "http://test/manga?order_by=start_date&sort=desc&limit=12",
                "http://test/anime?genres=1,24&limit=8&order_by=popularity",
                "http://test/anime/21/full",
                "http://test/seasons/now?limit=6",
                "http://test/seasons/upcoming?limit=6",
            ]
        );
    }
}
