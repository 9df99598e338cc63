use serde::{Deserialize, Serialize};

use crate::feed::FeedItem;

#[derive(Debug, Clone, Deserialize)]
pub struct HnItem {
    pub id: u64,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub by: Option<String>,
    pub time: Option<u64>,
    pub url: Option<String>,
    pub score: Option<u32>,
    pub title: Option<String>,
    pub descendants: Option<u32>,
    pub deleted: Option<bool>,
    pub dead: Option<bool>,
}

/// Algolia HN search response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub nb_hits: u64,
    pub nb_pages: u32,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub points: Option<u32>,
    pub num_comments: Option<u32>,
    pub created_at_i: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub url: Option<String>,
    pub score: u32,
    pub by: String,
    pub time: u64,
    pub descendants: u32,
}

impl Story {
    pub fn from_item(item: HnItem) -> Option<Self> {
        if item.deleted.unwrap_or(false) || item.dead.unwrap_or(false) {
            return None;
        }
        Some(Story {
            id: item.id,
            title: item.title?,
            url: item.url,
            score: item.score.unwrap_or(0),
            by: item.by.unwrap_or_else(|| "[deleted]".to_string()),
            time: item.time.unwrap_or(0),
            descendants: item.descendants.unwrap_or(0),
        })
    }

    pub fn from_hit(hit: SearchHit) -> Option<Self> {
        Some(Story {
            id: hit.object_id.parse().ok()?,
            title: hit.title?,
            url: hit.url.filter(|u| !u.is_empty()),
            score: hit.points.unwrap_or(0),
            by: hit.author.unwrap_or_else(|| "[deleted]".to_string()),
            time: hit.created_at_i.unwrap_or(0),
            descendants: hit.num_comments.unwrap_or(0),
        })
    }

    pub fn domain(&self) -> &str {
        self.url
            .as_ref()
            .and_then(|u| {
                u.split("://")
                    .nth(1)
                    .and_then(|s| s.split('/').next())
                    .map(|s| s.strip_prefix("www.").unwrap_or(s))
            })
            .unwrap_or("self")
    }

    /// URL to the HN discussion page for this story.
    pub fn hn_url(&self) -> String {
        format!("https://news.ycombinator.com/item?id={}", self.id)
    }
}

impl FeedItem for Story {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Feed {
    #[default]
    Top,
    New,
    Best,
    Ask,
    Show,
    Jobs,
}

impl Feed {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Feed::Top => "topstories",
            Feed::New => "newstories",
            Feed::Best => "beststories",
            Feed::Ask => "askstories",
            Feed::Show => "showstories",
            Feed::Jobs => "jobstories",
        }
    }

    /// Algolia tag restricting a search to this feed's kind of item.
    pub fn search_tag(&self) -> &'static str {
        match self {
            Feed::Top | Feed::New | Feed::Best => "story",
            Feed::Ask => "ask_hn",
            Feed::Show => "show_hn",
            Feed::Jobs => "job",
        }
    }

    /// Algolia endpoint: relevance ranking, or newest first for `New`.
    pub fn search_endpoint(&self) -> &'static str {
        match self {
            Feed::New => "search_by_date",
            _ => "search",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Feed::Top => "Top",
            Feed::New => "New",
            Feed::Best => "Best",
            Feed::Ask => "Ask",
            Feed::Show => "Show",
            Feed::Jobs => "Jobs",
        }
    }

    pub fn all() -> &'static [Feed] {
        &[
            Feed::Top,
            Feed::New,
            Feed::Best,
            Feed::Ask,
            Feed::Show,
            Feed::Jobs,
        ]
    }
}

impl std::str::FromStr for Feed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feed::all()
            .iter()
            .copied()
            .find(|f| f.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid feed: {s}. Use one of top, new, best, ask, show, jobs"))
    }
}

/// Everything that selects which stories belong in the feed. Changing any
/// field starts the feed over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HnQuery {
    pub feed: Feed,
    pub search: Option<String>,
}

impl HnQuery {
    pub fn new(feed: Feed) -> Self {
        Self { feed, search: None }
    }

    /// Blank search terms are treated as no search.
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self
    }

    pub fn label(&self) -> String {
        match &self.search {
            Some(term) => format!("{} \"{}\"", self.feed.label(), term),
            None => self.feed.label().to_string(),
        }
    }
}
