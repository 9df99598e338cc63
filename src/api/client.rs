use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::types::{Feed, HnItem, HnQuery, SearchResponse, Story};
use crate::error::FetchError;
use crate::feed::{PageFetcher, RemotePage};

pub const API_BASE: &str = "https://hacker-news.firebaseio.com/v0";
pub const SEARCH_BASE: &str = "https://hn.algolia.com/api/v1";
const CACHE_TTL: Duration = Duration::from_secs(60);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

struct CacheEntry<T> {
    data: T,
    fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < CACHE_TTL
    }
}

#[derive(Clone)]
pub struct HnClient {
    http: reqwest::Client,
    api_base: String,
    search_base: String,
    item_cache: Arc<RwLock<HashMap<u64, CacheEntry<HnItem>>>>,
}

impl HnClient {
    pub fn new() -> Self {
        Self::with_endpoints(API_BASE, SEARCH_BASE, DEFAULT_TIMEOUT)
    }

    pub fn with_endpoints(
        api_base: impl Into<String>,
        search_base: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            search_base: search_base.into().trim_end_matches('/').to_string(),
            item_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn fetch_feed_ids(&self, feed: Feed) -> Result<Vec<u64>, FetchError> {
        let url = format!("{}/{}.json", self.api_base, feed.endpoint());
        let ids: Vec<u64> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(ids)
    }

    /// Returns `None` for ids the API answers with `null`.
    async fn fetch_item(&self, id: u64) -> Result<Option<HnItem>, FetchError> {
        {
            let cache = self.item_cache.read().await;
            if let Some(entry) = cache.get(&id)
                && entry.is_fresh()
            {
                return Ok(Some(entry.data.clone()));
            }
        }

        let url = format!("{}/item/{}.json", self.api_base, id);
        let item: Option<HnItem> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(item) = &item {
            let mut cache = self.item_cache.write().await;
            cache.insert(
                id,
                CacheEntry {
                    data: item.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }

        Ok(item)
    }

    /// Items that fail to load, or are deleted, are left out of the result.
    /// Fails only when every requested item failed to load.
    pub async fn fetch_stories_by_ids(&self, ids: &[u64]) -> Result<Vec<Story>, FetchError> {
        let futures: Vec<_> = ids.iter().map(|&id| self.fetch_item(id)).collect();
        let results = futures::future::join_all(futures).await;

        let mut stories = Vec::with_capacity(results.len());
        let mut first_error = None;
        let mut loaded = 0;
        for result in results {
            match result {
                Ok(item) => {
                    loaded += 1;
                    stories.extend(item.and_then(Story::from_item));
                }
                Err(e) => {
                    tracing::debug!(error = %e, "skipping item");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) if loaded == 0 => Err(e),
            _ => Ok(stories),
        }
    }

    /// One page of a feed's ranking. The id list is re-read on every call, so
    /// a page can overlap the previous one when the ranking moved.
    pub async fn fetch_feed_page(
        &self,
        feed: Feed,
        page: u32,
        batch_size: usize,
    ) -> Result<RemotePage<Story>, FetchError> {
        let ids = self.fetch_feed_ids(feed).await?;
        let total = ids.len() as u64;
        let start = (page.saturating_sub(1) as usize).saturating_mul(batch_size);

        if start >= ids.len() {
            return Ok(RemotePage::with_total(vec![], page, batch_size, total));
        }

        let end = (start + batch_size).min(ids.len());
        let stories = self.fetch_stories_by_ids(&ids[start..end]).await?;
        Ok(RemotePage::with_total(stories, page, batch_size, total))
    }

    pub async fn search_page(
        &self,
        feed: Feed,
        term: &str,
        page: u32,
        batch_size: usize,
    ) -> Result<RemotePage<Story>, FetchError> {
        let url = format!("{}/{}", self.search_base, feed.search_endpoint());
        let algolia_page = page.saturating_sub(1).to_string();
        let hits_per_page = batch_size.to_string();
        let response: SearchResponse = self
            .http
            .get(&url)
            .query(&[
                ("query", term),
                ("tags", feed.search_tag()),
                ("page", algolia_page.as_str()),
                ("hitsPerPage", hits_per_page.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let stories = response
            .hits
            .into_iter()
            .filter_map(Story::from_hit)
            .collect();
        Ok(RemotePage {
            items: stories,
            number: page,
            total_available: Some(response.nb_hits),
            is_last_page: page >= response.nb_pages,
        })
    }
}

impl Default for HnClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PageFetcher for HnClient {
    type Query = HnQuery;
    type Item = Story;

    async fn fetch_page(
        &self,
        query: &HnQuery,
        page: u32,
        batch_size: usize,
    ) -> Result<RemotePage<Story>, FetchError> {
        match &query.search {
            Some(term) => self.search_page(query.feed, term, page, batch_size).await,
            None => self.fetch_feed_page(query.feed, page, batch_size).await,
        }
    }
}
