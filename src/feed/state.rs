use std::fmt::Debug;

use super::buffer::FeedBuffer;
use super::page::{FeedItem, FetchRequest, RemotePage, Ticket};
use super::window::DisplayWindow;
use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    LoadingMore,
    Error,
}

impl Status {
    pub fn is_busy(self) -> bool {
        matches!(self, Status::Loading | Status::LoadingMore)
    }
}

/// Reveal increment and remote batch size for one feed instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub increment: usize,
    pub batch_size: usize,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            increment: 10,
            batch_size: 30,
        }
    }
}

pub enum FeedEvent<Q, T> {
    /// The UI selected a query (category, tag, search term...).
    Activate(Q),
    /// Full reset of the current query.
    Refresh,
    /// The load-more trigger became visible, or the user asked for more.
    RequestMore,
    /// Re-issue the request that last failed.
    Retry,
    Completed {
        ticket: Ticket<Q>,
        result: Result<RemotePage<T>, FetchError>,
    },
}

/// What the driver has to do after an event was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect<Q> {
    None,
    Fetch(FetchRequest<Q>),
    /// A completion was dropped because its ticket is no longer current.
    Discarded,
}

/// Read model handed to the rendering layer.
#[derive(Debug)]
pub struct FeedView<'a, Q, T> {
    pub query: Option<&'a Q>,
    pub items: &'a [T],
    pub status: Status,
    pub has_more: bool,
    pub error: Option<&'a FetchError>,
    pub total_available: Option<u64>,
}

/// The whole state of one feed, changed only through [`FeedState::apply`].
pub struct FeedState<Q, T: FeedItem> {
    pacing: Pacing,
    generation: u64,
    buffer: FeedBuffer<Q, T>,
    window: DisplayWindow,
    status: Status,
    error: Option<FetchError>,
    pending: Option<Ticket<Q>>,
    failed: Option<Ticket<Q>>,
}

impl<Q, T> FeedState<Q, T>
where
    Q: Clone + PartialEq + Debug,
    T: FeedItem,
{
    pub fn new(pacing: Pacing) -> Self {
        Self {
            pacing,
            generation: 0,
            buffer: FeedBuffer::new(),
            window: DisplayWindow::new(pacing.increment),
            status: Status::Idle,
            error: None,
            pending: None,
            failed: None,
        }
    }

    pub fn apply(&mut self, event: FeedEvent<Q, T>) -> Effect<Q> {
        match event {
            FeedEvent::Activate(query) => self.activate(query),
            FeedEvent::Refresh => self.refresh(),
            FeedEvent::RequestMore => self.request_more(),
            FeedEvent::Retry => self.retry(),
            FeedEvent::Completed { ticket, result } => self.complete(ticket, result),
        }
    }

    fn activate(&mut self, query: Q) -> Effect<Q> {
        if self.buffer.query() == Some(&query) {
            return Effect::None;
        }
        self.reset(query)
    }

    fn refresh(&mut self) -> Effect<Q> {
        match self.buffer.query().cloned() {
            Some(query) => self.reset(query),
            None => Effect::None,
        }
    }

    fn reset(&mut self, query: Q) -> Effect<Q> {
        self.generation += 1;
        tracing::debug!(?query, generation = self.generation, "feed reset");
        self.buffer.reset(query.clone(), self.generation);
        self.window.reset();
        self.window.recompute(0, false);
        self.status = Status::Loading;
        self.error = None;
        self.failed = None;

        let ticket = Ticket {
            query,
            generation: self.generation,
            page: 1,
        };
        let supersedes = self.pending.replace(ticket.clone()).is_some();
        Effect::Fetch(FetchRequest { ticket, supersedes })
    }

    fn request_more(&mut self) -> Effect<Q> {
        if self.status != Status::Idle || self.buffer.query().is_none() || !self.window.has_more()
        {
            return Effect::None;
        }

        let buffered = self.buffer.len();
        let source_done = self.buffer.last_page_reached();

        if self.window.display_count() < buffered {
            let short = self.window.reveal_next(buffered);
            self.window.recompute(buffered, source_done);
            if short && !source_done {
                return self.fetch_next();
            }
            return Effect::None;
        }

        if source_done {
            return Effect::None;
        }
        self.window.request_next();
        self.fetch_next()
    }

    fn fetch_next(&mut self) -> Effect<Q> {
        let Some(query) = self.buffer.query().cloned() else {
            return Effect::None;
        };
        let ticket = Ticket {
            query,
            generation: self.generation,
            page: self.buffer.remote_page_fetched() + 1,
        };
        tracing::debug!(page = ticket.page, generation = ticket.generation, "loading more");
        self.status = Status::LoadingMore;
        self.pending = Some(ticket.clone());
        Effect::Fetch(FetchRequest {
            ticket,
            supersedes: false,
        })
    }

    fn retry(&mut self) -> Effect<Q> {
        if self.status != Status::Error {
            return Effect::None;
        }
        let Some(ticket) = self.failed.take() else {
            return Effect::None;
        };
        tracing::debug!(page = ticket.page, generation = ticket.generation, "retrying");
        self.status = if self.buffer.remote_page_fetched() == 0 {
            Status::Loading
        } else {
            Status::LoadingMore
        };
        self.error = None;
        self.pending = Some(ticket.clone());
        Effect::Fetch(FetchRequest {
            ticket,
            supersedes: false,
        })
    }

    fn complete(
        &mut self,
        ticket: Ticket<Q>,
        result: Result<RemotePage<T>, FetchError>,
    ) -> Effect<Q> {
        if self.pending.as_ref() != Some(&ticket) {
            tracing::debug!(
                page = ticket.page,
                generation = ticket.generation,
                live_generation = self.generation,
                "discarding stale response"
            );
            return Effect::Discarded;
        }
        self.pending = None;

        match result {
            Ok(page) => {
                let first_load = self.status == Status::Loading;
                if self.buffer.merge(&ticket, page).is_none() {
                    return Effect::Discarded;
                }
                let buffered = self.buffer.len();
                if first_load {
                    self.window.reveal_next(buffered);
                } else {
                    self.window.settle(buffered);
                }
                self.window
                    .recompute(buffered, self.buffer.last_page_reached());
                self.status = Status::Idle;
                tracing::debug!(
                    page = ticket.page,
                    buffered,
                    displayed = self.window.display_count(),
                    has_more = self.window.has_more(),
                    "page merged"
                );
            }
            Err(err) => {
                tracing::warn!(page = ticket.page, error = %err, "fetch failed");
                self.status = Status::Error;
                self.error = Some(err);
                self.failed = Some(ticket);
            }
        }
        Effect::None
    }

    pub fn view(&self) -> FeedView<'_, Q, T> {
        FeedView {
            query: self.buffer.query(),
            items: self.displayed(),
            status: self.status,
            has_more: self.window.has_more(),
            error: self.error.as_ref(),
            total_available: self.buffer.total_available(),
        }
    }
}

impl<Q, T: FeedItem> FeedState<Q, T> {
    pub fn displayed(&self) -> &[T] {
        &self.buffer.items()[..self.window.display_count()]
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn has_more(&self) -> bool {
        self.window.has_more()
    }

    pub fn display_count(&self) -> usize {
        self.window.display_count()
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn remote_page_fetched(&self) -> u32 {
        self.buffer.remote_page_fetched()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending(&self) -> Option<&Ticket<Q>> {
        self.pending.as_ref()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }
}
