use std::fmt::Debug;
use std::future::Future;

use super::page::{FeedItem, RemotePage};
use crate::error::FetchError;

/// The remote side of a feed: returns one batch for a query and page number.
///
/// Calls with identical arguments must be safe to repeat, since a retry
/// re-issues exactly the request that failed.
pub trait PageFetcher: Send + Sync + 'static {
    type Query: Clone + PartialEq + Debug + Send + Sync + 'static;
    type Item: FeedItem + Send + 'static;

    fn fetch_page(
        &self,
        query: &Self::Query,
        page: u32,
        batch_size: usize,
    ) -> impl Future<Output = Result<RemotePage<Self::Item>, FetchError>> + Send;
}
