//! Test data builders and a scriptable fetcher.

use std::collections::{HashMap, VecDeque};
use std::ops::RangeInclusive;
use std::sync::Mutex;

use tokio::sync::{Notify, oneshot};

use crate::api::Story;
use crate::error::FetchError;
use crate::feed::{FeedItem, PageFetcher, RemotePage};

/// Fixed timestamp for deterministic tests: 2023-11-15 00:00:00 UTC
/// This is 1 day after the base timestamp (1700000000) used in sample data,
/// so stories will show as "1d ago".
pub const TEST_NOW: i64 = 1700092800;

/// Minimal feed item: just an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item(pub u64);

impl FeedItem for Item {
    type Id = u64;

    fn id(&self) -> u64 {
        self.0
    }
}

pub fn items(ids: RangeInclusive<u64>) -> Vec<Item> {
    ids.map(Item).collect()
}

type Reply = oneshot::Sender<Result<RemotePage<Item>, FetchError>>;

/// A fetcher whose calls block until the test answers them with
/// [`ScriptedFetcher::respond`].
#[derive(Default)]
pub struct ScriptedFetcher {
    calls: Mutex<Vec<(&'static str, u32)>>,
    waiting: Mutex<HashMap<(&'static str, u32), VecDeque<Reply>>>,
    notify: Notify,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(&'static str, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn wait_for_calls(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.calls.lock().unwrap().len() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Waits for the call to arrive, then completes it with `result`.
    pub async fn respond(
        &self,
        query: &'static str,
        page: u32,
        result: Result<RemotePage<Item>, FetchError>,
    ) {
        loop {
            let notified = self.notify.notified();
            let reply = self
                .waiting
                .lock()
                .unwrap()
                .get_mut(&(query, page))
                .and_then(VecDeque::pop_front);
            if let Some(reply) = reply {
                // the caller may have been cancelled already
                let _ = reply.send(result);
                return;
            }
            notified.await;
        }
    }
}

impl PageFetcher for ScriptedFetcher {
    type Query = &'static str;
    type Item = Item;

    fn fetch_page(
        &self,
        query: &&'static str,
        page: u32,
        _batch_size: usize,
    ) -> impl Future<Output = Result<RemotePage<Item>, FetchError>> + Send {
        let (tx, rx) = oneshot::channel();
        self.calls.lock().unwrap().push((*query, page));
        self.waiting
            .lock()
            .unwrap()
            .entry((*query, page))
            .or_default()
            .push_back(tx);
        self.notify.notify_waiters();
        async move {
            rx.await
                .unwrap_or_else(|_| Err(FetchError::Network("fetcher dropped".into())))
        }
    }
}

#[allow(dead_code)]
pub struct StoryBuilder {
    id: u64,
    title: String,
    url: Option<String>,
    score: u32,
    by: String,
    time: u64,
    descendants: u32,
}

impl Default for StoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl StoryBuilder {
    pub fn new() -> Self {
        Self {
            id: 1,
            title: "Test Story".to_string(),
            url: Some("https://example.com".to_string()),
            score: 100,
            by: "testuser".to_string(),
            time: 1700000000,
            descendants: 10,
        }
    }

    pub fn id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn no_url(mut self) -> Self {
        self.url = None;
        self
    }

    pub fn score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.by = author.to_string();
        self
    }

    pub fn comments(mut self, count: u32) -> Self {
        self.descendants = count;
        self
    }

    pub fn time(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    pub fn build(self) -> Story {
        Story {
            id: self.id,
            title: self.title,
            url: self.url,
            score: self.score,
            by: self.by,
            time: self.time,
            descendants: self.descendants,
        }
    }
}

pub fn sample_stories() -> Vec<Story> {
    vec![
        StoryBuilder::new()
            .id(1)
            .title("Show HN: I built a terminal UI for Hacker News")
            .url("https://github.com/user/lima-hn")
            .score(142)
            .author("dang")
            .comments(47)
            .time(1700000000)
            .build(),
        StoryBuilder::new()
            .id(2)
            .title("Why Rust is the Future of Systems Programming")
            .url("https://example.com/rust-future")
            .score(89)
            .author("pg")
            .comments(23)
            .time(1699990000)
            .build(),
        StoryBuilder::new()
            .id(3)
            .title("Ask HN: What are you working on?")
            .no_url()
            .score(56)
            .author("sama")
            .comments(128)
            .time(1699980000)
            .build(),
        StoryBuilder::new()
            .id(4)
            .title("The unreasonable effectiveness of simple HTML")
            .url("https://blog.example.com/simple-html")
            .score(234)
            .author("tptacek")
            .comments(89)
            .time(1699970000)
            .build(),
        StoryBuilder::new()
            .id(5)
            .title("A Deep Dive into Linux Kernel Networking")
            .url("https://lwn.net/kernel-networking")
            .score(167)
            .author("patio11")
            .comments(34)
            .time(1699960000)
            .build(),
    ]
}
