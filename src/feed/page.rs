use std::hash::Hash;

/// An item that can live in a feed. Only its identity matters to the loader.
pub trait FeedItem {
    type Id: Eq + Hash + Clone;

    fn id(&self) -> Self::Id;
}

/// One remote batch as returned by a fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePage<T> {
    pub items: Vec<T>,
    /// 1-based remote page number.
    pub number: u32,
    pub total_available: Option<u64>,
    pub is_last_page: bool,
}

impl<T> RemotePage<T> {
    pub fn new(items: Vec<T>, number: u32, is_last_page: bool) -> Self {
        Self {
            items,
            number,
            total_available: None,
            is_last_page,
        }
    }

    /// Builds a page for a source that reports a total count. The page is the
    /// last one once `number * batch_size` covers the total.
    pub fn with_total(items: Vec<T>, number: u32, batch_size: usize, total: u64) -> Self {
        let covered = u64::from(number).saturating_mul(batch_size as u64);
        Self {
            items,
            number,
            total_available: Some(total),
            is_last_page: covered >= total,
        }
    }
}

/// Identifies the exact request a fetch result belongs to.
///
/// The generation is bumped on every reset, so a refresh of an unchanged
/// query still invalidates work started before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<Q> {
    pub query: Q,
    pub generation: u64,
    pub page: u32,
}

/// A fetch the driver must perform on behalf of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest<Q> {
    pub ticket: Ticket<Q>,
    /// Whether this request supersedes in-flight work from an older generation.
    pub supersedes: bool,
}

impl<Q> FetchRequest<Q> {
    pub fn query(&self) -> &Q {
        &self.ticket.query
    }

    pub fn page(&self) -> u32 {
        self.ticket.page
    }
}
