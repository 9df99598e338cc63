//! Incremental feed loading: fetch remote pages in large batches, reveal them
//! in small increments, and stay consistent when the query changes under
//! in-flight work.
//!
//! [`FeedState`] is a pure state machine; [`FeedLoader`] runs it against a
//! [`PageFetcher`] on tokio. A feed is instantiated by implementing
//! [`PageFetcher`] for an API and picking a [`Pacing`].

mod buffer;
mod fetcher;
mod loader;
mod page;
pub mod sentinel;
mod state;
mod window;

pub use buffer::FeedBuffer;
pub use fetcher::PageFetcher;
pub use loader::{Completion, FeedLoader, LogEntry, Step, TaskInfo, TaskLog};
pub use page::{FeedItem, FetchRequest, RemotePage, Ticket};
pub use sentinel::{SentinelHandle, SentinelReceiver, SentinelSignal, ViewportSentinel};
pub use state::{Effect, FeedEvent, FeedState, FeedView, Pacing, Status};
pub use window::DisplayWindow;
