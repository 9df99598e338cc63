//! Inbound "load more trigger is visible" signals.
//!
//! Anything can play the sentinel: a viewport check after each render, a
//! polling timer, or a manual "more" key. The loader only sees the signal.

use tokio::sync::mpsc;

use super::state::{FeedView, Status};

/// The load-more trigger became visible. Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelSignal;

/// Creates a coalescing signal channel: while one signal is waiting to be
/// consumed, further signals are dropped.
pub fn channel() -> (SentinelHandle, SentinelReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (SentinelHandle { tx }, SentinelReceiver { rx })
}

#[derive(Debug, Clone)]
pub struct SentinelHandle {
    tx: mpsc::Sender<SentinelSignal>,
}

impl SentinelHandle {
    /// Returns false when the signal was coalesced into a pending one or the
    /// receiver is gone.
    pub fn became_visible(&self) -> bool {
        self.tx.try_send(SentinelSignal).is_ok()
    }
}

#[derive(Debug)]
pub struct SentinelReceiver {
    rx: mpsc::Receiver<SentinelSignal>,
}

impl SentinelReceiver {
    pub async fn recv(&mut self) -> Option<SentinelSignal> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SentinelSignal> {
        self.rx.try_recv().ok()
    }
}

/// Decides whether the trigger at the bottom of a list is on screen, given
/// the viewport height in rows.
#[derive(Debug, Clone)]
pub struct ViewportSentinel {
    layout_overhead: u16,
    row_height: u16,
    threshold: usize,
    viewport_height: Option<u16>,
}

impl ViewportSentinel {
    const DEFAULT_THRESHOLD: usize = 5;

    pub fn new(layout_overhead: u16, row_height: u16) -> Self {
        Self {
            layout_overhead,
            row_height: row_height.max(1),
            threshold: Self::DEFAULT_THRESHOLD,
            viewport_height: None,
        }
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Records a new viewport height. Returns true when the viewport grew,
    /// which may uncover the trigger.
    pub fn set_viewport_height(&mut self, height: u16) -> bool {
        let old = self.viewport_height.replace(height);
        old.is_none_or(|h| height > h)
    }

    pub fn viewport_height(&self) -> Option<u16> {
        self.viewport_height
    }

    /// How many rows of items fit in the viewport.
    pub fn capacity(&self) -> usize {
        self.viewport_height
            .map(|h| (h.saturating_sub(self.layout_overhead) / self.row_height) as usize)
            .unwrap_or(0)
    }

    /// The trigger shows when the list does not fill the viewport, or when the
    /// selection is close to the last displayed item.
    pub fn is_visible(&self, displayed: usize, selected: Option<usize>) -> bool {
        displayed < self.capacity()
            || selected.is_some_and(|s| displayed > 0 && s + self.threshold >= displayed)
    }

    /// Emits a signal if the feed can grow and the trigger is on screen.
    pub fn observe<Q, T>(
        &self,
        view: &FeedView<'_, Q, T>,
        selected: Option<usize>,
        handle: &SentinelHandle,
    ) -> bool {
        if view.status != Status::Idle || !view.has_more {
            return false;
        }
        self.is_visible(view.items.len(), selected) && handle.became_visible()
    }
}
