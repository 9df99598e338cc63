//! Headless driver: streams a feed to a sink until a story limit is reached
//! or the feed runs out.

use anyhow::{Result, bail};

use crate::feed::{self, FeedLoader, PageFetcher, Status, Step, ViewportSentinel};

/// Receives stories as they are revealed.
pub trait StorySink<T> {
    /// `first_rank` is the 1-based rank of `items[0]` across the whole run.
    fn emit(&mut self, items: &[T], first_rank: usize) -> Result<()>;

    /// Called before a failed fetch is retried.
    fn retrying(&mut self, _message: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Stop once this many stories have been emitted.
    pub limit: usize,
    /// Explicit retries allowed across the run before giving up.
    pub retries: u32,
}

/// Loads `query` and hands revealed stories to `sink`.
///
/// A viewport `limit` rows tall stands in for the screen, so the load-more
/// trigger stays visible until `limit` stories show. Returns how many stories
/// were emitted. Fails with the user-facing message once retries run out.
pub async fn stream_feed<F, S>(
    loader: &mut FeedLoader<F>,
    query: F::Query,
    options: StreamOptions,
    sink: &mut S,
) -> Result<usize>
where
    F: PageFetcher,
    S: StorySink<F::Item>,
{
    let (handle, mut signals) = feed::sentinel::channel();
    let mut viewport = ViewportSentinel::new(0, 1);
    viewport.set_viewport_height(u16::try_from(options.limit).unwrap_or(u16::MAX));

    let mut emitted = 0;
    let mut retries_left = options.retries;
    loader.set_query(query);

    loop {
        match loader.step(&mut signals).await {
            Step::Completed | Step::Signalled => {}
            Step::Discarded => continue,
            Step::SignalsClosed => break,
        }

        let view = loader.view();
        if view.items.len() > emitted && emitted < options.limit {
            let end = view.items.len().min(options.limit);
            sink.emit(&view.items[emitted..end], emitted + 1)?;
            emitted = end;
        }

        match view.status {
            Status::Loading | Status::LoadingMore => continue,
            Status::Error => {
                let msg = view.error.map(|e| e.user_message()).unwrap_or_default();
                if retries_left == 0 {
                    bail!("{msg}");
                }
                retries_left -= 1;
                tracing::warn!(retries_left, "fetch failed, retrying: {msg}");
                sink.retrying(&msg);
                loader.retry();
                continue;
            }
            Status::Idle => {}
        }

        if emitted >= options.limit || !view.has_more || !viewport.observe(&view, None, &handle) {
            break;
        }
    }

    Ok(emitted)
}
