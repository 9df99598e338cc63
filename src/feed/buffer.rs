use std::collections::HashSet;

use super::page::{FeedItem, RemotePage, Ticket};

/// Everything fetched so far for one query, in first-seen order and unique by id.
pub struct FeedBuffer<Q, T: FeedItem> {
    origin: Option<(Q, u64)>,
    items: Vec<T>,
    seen: HashSet<T::Id>,
    remote_page_fetched: u32,
    last_page_reached: bool,
    total_available: Option<u64>,
}

impl<Q, T: FeedItem> Default for FeedBuffer<Q, T> {
    fn default() -> Self {
        Self {
            origin: None,
            items: Vec::new(),
            seen: HashSet::new(),
            remote_page_fetched: 0,
            last_page_reached: false,
            total_available: None,
        }
    }
}

impl<Q: PartialEq, T: FeedItem> FeedBuffer<Q, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all items and binds the buffer to a new query and generation.
    pub fn reset(&mut self, query: Q, generation: u64) {
        self.origin = Some((query, generation));
        self.items.clear();
        self.seen.clear();
        self.remote_page_fetched = 0;
        self.last_page_reached = false;
        self.total_available = None;
    }

    fn accepts(&self, ticket: &Ticket<Q>) -> bool {
        matches!(&self.origin, Some((query, generation))
            if *query == ticket.query && *generation == ticket.generation)
    }

    /// Appends the items of `page` that are not buffered yet.
    ///
    /// Returns the number of new items, or `None` when the page was requested
    /// for a query (or generation) the buffer no longer holds.
    pub fn merge(&mut self, ticket: &Ticket<Q>, page: RemotePage<T>) -> Option<usize> {
        if !self.accepts(ticket) {
            return None;
        }
        let before = self.items.len();
        for item in page.items {
            if self.seen.insert(item.id()) {
                self.items.push(item);
            }
        }
        self.remote_page_fetched = page.number;
        self.last_page_reached = page.is_last_page;
        if page.total_available.is_some() {
            self.total_available = page.total_available;
        }
        Some(self.items.len() - before)
    }

    pub fn query(&self) -> Option<&Q> {
        self.origin.as_ref().map(|(query, _)| query)
    }

    pub fn generation(&self) -> Option<u64> {
        self.origin.as_ref().map(|(_, generation)| *generation)
    }
}

impl<Q, T: FeedItem> FeedBuffer<Q, T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn remote_page_fetched(&self) -> u32 {
        self.remote_page_fetched
    }

    /// Whether the most recent merge reported the final remote page.
    pub fn last_page_reached(&self) -> bool {
        self.last_page_reached
    }

    pub fn total_available(&self) -> Option<u64> {
        self.total_available
    }
}
