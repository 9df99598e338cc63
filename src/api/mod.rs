//! Hacker News as a feed source: category rankings from the Firebase API and
//! keyword search through Algolia.

mod client;
mod types;

pub use client::{API_BASE, HnClient, SEARCH_BASE};
pub use types::{Feed, HnItem, HnQuery, SearchHit, SearchResponse, Story};
