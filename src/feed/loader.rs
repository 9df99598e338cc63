use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::fetcher::PageFetcher;
use super::page::{FetchRequest, RemotePage, Ticket};
use super::sentinel::{SentinelReceiver, SentinelSignal};
use super::state::{Effect, FeedEvent, FeedState, FeedView, Pacing};
use crate::error::FetchError;

type QueryOf<F> = <F as PageFetcher>::Query;
type ItemOf<F> = <F as PageFetcher>::Item;

/// A finished fetch, tagged with the ticket it was issued for.
pub struct Completion<Q, T> {
    pub ticket: Ticket<Q>,
    pub task_id: u64,
    pub result: Result<RemotePage<T>, FetchError>,
}

#[derive(Debug)]
pub struct TaskInfo {
    pub id: u64,
    pub description: String,
    pub started_at: Instant,
}

#[derive(Debug)]
pub struct LogEntry {
    pub message: String,
}

/// Running fetches and a short history of how they ended.
#[derive(Debug, Default)]
pub struct TaskLog {
    pub running_tasks: Vec<TaskInfo>,
    pub log: VecDeque<LogEntry>,
    next_task_id: u64,
}

impl TaskLog {
    const MAX_LOG_ENTRIES: usize = 50;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        self.log.push_back(LogEntry {
            message: msg.into(),
        });
        if self.log.len() > Self::MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
    }

    pub fn start_task(&mut self, description: impl Into<String>) -> u64 {
        let id = self.next_task_id;
        self.next_task_id += 1;
        let desc = description.into();
        tracing::debug!(task_id = id, "started: {desc}");
        self.log(format!("Started: {}", desc));
        self.running_tasks.push(TaskInfo {
            id,
            description: desc,
            started_at: Instant::now(),
        });
        id
    }

    pub fn end_task(&mut self, id: u64, outcome: &str) {
        if let Some(pos) = self.running_tasks.iter().position(|t| t.id == id) {
            let task = self.running_tasks.remove(pos);
            let elapsed = task.started_at.elapsed();
            tracing::debug!(task_id = id, ?elapsed, "{} {outcome}", task.description);
            self.log(format!("{} {}: {:.2?}", task.description, outcome, elapsed));
        }
    }
}

/// What a call to [`FeedLoader::step`] handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Signalled,
    Completed,
    Discarded,
    SignalsClosed,
}

struct InFlight {
    task_id: u64,
    cancel: CancellationToken,
    /// Set by whichever side ends the task first: the task when it has a
    /// result to send, or the loader when it cancels.
    claimed: Arc<AtomicBool>,
}

/// Runs a [`FeedState`] against a fetcher on the tokio runtime.
///
/// All state changes happen on the caller's task; spawned fetches only send
/// their results back through a channel.
pub struct FeedLoader<F: PageFetcher> {
    fetcher: Arc<F>,
    state: FeedState<QueryOf<F>, ItemOf<F>>,
    result_tx: mpsc::Sender<Completion<QueryOf<F>, ItemOf<F>>>,
    result_rx: mpsc::Receiver<Completion<QueryOf<F>, ItemOf<F>>>,
    in_flight: Option<InFlight>,
    pub tasks: TaskLog,
}

impl<F: PageFetcher> FeedLoader<F> {
    pub fn new(fetcher: F, pacing: Pacing) -> Self {
        Self::with_shared(Arc::new(fetcher), pacing)
    }

    pub fn with_shared(fetcher: Arc<F>, pacing: Pacing) -> Self {
        let (result_tx, result_rx) = mpsc::channel(10);
        Self {
            fetcher,
            state: FeedState::new(pacing),
            result_tx,
            result_rx,
            in_flight: None,
            tasks: TaskLog::new(),
        }
    }

    pub fn set_query(&mut self, query: QueryOf<F>) {
        self.dispatch(FeedEvent::Activate(query));
    }

    pub fn request_more(&mut self) {
        self.dispatch(FeedEvent::RequestMore);
    }

    pub fn retry(&mut self) {
        self.dispatch(FeedEvent::Retry);
    }

    pub fn refresh(&mut self) {
        self.dispatch(FeedEvent::Refresh);
    }

    pub fn on_signal(&mut self, _signal: SentinelSignal) {
        self.request_more();
    }

    pub fn view(&self) -> FeedView<'_, QueryOf<F>, ItemOf<F>> {
        self.state.view()
    }

    pub fn state(&self) -> &FeedState<QueryOf<F>, ItemOf<F>> {
        &self.state
    }

    /// Applies a finished fetch. Returns false if it was stale.
    pub fn handle_completion(&mut self, completion: Completion<QueryOf<F>, ItemOf<F>>) -> bool {
        let Completion {
            ticket,
            task_id,
            result,
        } = completion;

        if self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.task_id == task_id)
        {
            self.in_flight = None;
        }

        let outcome = if result.is_ok() {
            "completed"
        } else {
            "failed"
        };
        match self.state.apply(FeedEvent::Completed { ticket, result }) {
            Effect::Discarded => {
                self.tasks.end_task(task_id, "discarded (stale)");
                false
            }
            effect => {
                self.tasks.end_task(task_id, outcome);
                self.run(effect);
                true
            }
        }
    }

    /// Applies every completion that is already waiting, without blocking.
    pub fn poll_results(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.result_rx.try_recv() {
            if self.handle_completion(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next fetch to finish and applies it.
    pub async fn next_completion(&mut self) -> bool {
        match self.result_rx.recv().await {
            Some(completion) => self.handle_completion(completion),
            // unreachable while we hold `result_tx`
            None => false,
        }
    }

    /// Waits for either a sentinel signal or a fetch completion.
    pub async fn step(&mut self, signals: &mut SentinelReceiver) -> Step {
        tokio::select! {
            completion = self.result_rx.recv() => match completion {
                Some(completion) => {
                    if self.handle_completion(completion) {
                        Step::Completed
                    } else {
                        Step::Discarded
                    }
                }
                None => Step::Discarded,
            },
            signal = signals.recv() => match signal {
                Some(signal) => {
                    self.on_signal(signal);
                    Step::Signalled
                }
                None => Step::SignalsClosed,
            },
        }
    }

    fn dispatch(&mut self, event: FeedEvent<QueryOf<F>, ItemOf<F>>) {
        let effect = self.state.apply(event);
        self.run(effect);
    }

    fn run(&mut self, effect: Effect<QueryOf<F>>) {
        if let Effect::Fetch(request) = effect {
            self.spawn_fetch(request);
        }
    }

    fn spawn_fetch(&mut self, request: FetchRequest<QueryOf<F>>) {
        if request.supersedes
            && let Some(previous) = self.in_flight.take()
        {
            previous.cancel.cancel();
            // a result already handed over is logged when it gets discarded
            if !previous.claimed.swap(true, Ordering::AcqRel) {
                self.tasks.end_task(previous.task_id, "cancelled (superseded)");
            }
        }

        let ticket = request.ticket;
        let task_id = self.tasks.start_task(format!(
            "Load {:?} page {} (gen {})",
            ticket.query, ticket.page, ticket.generation
        ));
        let cancel = CancellationToken::new();
        let claimed = Arc::new(AtomicBool::new(false));
        self.in_flight = Some(InFlight {
            task_id,
            cancel: cancel.clone(),
            claimed: Arc::clone(&claimed),
        });

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.result_tx.clone();
        let batch_size = self.state.pacing().batch_size;

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                result = fetcher.fetch_page(&ticket.query, ticket.page, batch_size) => {
                    if !claimed.swap(true, Ordering::AcqRel) {
                        let _ = tx
                            .send(Completion {
                                ticket,
                                task_id,
                                result,
                            })
                            .await;
                    }
                }
            }
        });
    }
}

impl<F: PageFetcher> Drop for FeedLoader<F> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::sentinel;
    use crate::feed::state::Status;
    use crate::test_utils::{ScriptedFetcher, items};

    fn loader(fetcher: &Arc<ScriptedFetcher>) -> FeedLoader<ScriptedFetcher> {
        FeedLoader::with_shared(
            Arc::clone(fetcher),
            Pacing {
                increment: 10,
                batch_size: 20,
            },
        )
    }

    #[tokio::test]
    async fn first_load_reveals_one_increment() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut loader = loader(&fetcher);

        loader.set_query("top");
        fetcher
            .respond("top", 1, Ok(RemotePage::new(items(1..=20), 1, false)))
            .await;
        assert!(loader.next_completion().await);

        let view = loader.view();
        assert_eq!(view.status, Status::Idle);
        assert_eq!(view.items.len(), 10);
        assert!(view.has_more);
        assert_eq!(fetcher.calls(), vec![("top", 1)]);
    }

    #[tokio::test]
    async fn reveals_from_buffer_without_calling_the_fetcher() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut loader = loader(&fetcher);
        loader.set_query("top");
        fetcher
            .respond("top", 1, Ok(RemotePage::new(items(1..=20), 1, false)))
            .await;
        loader.next_completion().await;

        loader.request_more();
        assert_eq!(loader.view().items.len(), 20);
        tokio::task::yield_now().await;
        assert_eq!(fetcher.calls(), vec![("top", 1)]);

        loader.request_more();
        assert_eq!(loader.view().status, Status::LoadingMore);
        fetcher
            .respond("top", 2, Ok(RemotePage::new(items(21..=40), 2, true)))
            .await;
        loader.next_completion().await;

        assert_eq!(loader.view().items.len(), 30);
        assert_eq!(fetcher.calls(), vec![("top", 1), ("top", 2)]);
    }

    #[tokio::test]
    async fn switching_query_mid_flight_ignores_the_old_result() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut loader = loader(&fetcher);
        loader.set_query("top");
        fetcher.wait_for_calls(1).await;

        loader.set_query("new");
        fetcher.wait_for_calls(2).await;
        assert_eq!(loader.view().status, Status::Loading);
        assert!(loader.view().items.is_empty());

        fetcher
            .respond("new", 1, Ok(RemotePage::new(items(100..=104), 1, true)))
            .await;
        assert!(loader.next_completion().await);

        // the superseded task was cancelled, so releasing it sends nothing
        fetcher
            .respond("top", 1, Ok(RemotePage::new(items(1..=20), 1, false)))
            .await;
        tokio::task::yield_now().await;
        assert_eq!(loader.poll_results(), 0);

        let view = loader.view();
        assert_eq!(view.query, Some(&"new"));
        assert_eq!(view.items.len(), 5);
        assert!(!view.has_more);
        assert!(
            loader
                .tasks
                .log
                .iter()
                .any(|e| e.message.contains("cancelled (superseded)"))
        );
    }

    #[tokio::test]
    async fn stale_completion_is_discarded_even_without_cancellation() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut loader = loader(&fetcher);
        loader.set_query("top");
        loader.set_query("new");

        let stale = Completion {
            ticket: Ticket {
                query: "top",
                generation: 1,
                page: 1,
            },
            task_id: 0,
            result: Ok(RemotePage::new(items(1..=20), 1, false)),
        };

        assert!(!loader.handle_completion(stale));
        assert_eq!(loader.view().status, Status::Loading);
        assert!(loader.view().items.is_empty());
    }

    #[tokio::test]
    async fn finished_fetch_is_logged_as_stale_not_cancelled() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut loader = loader(&fetcher);
        let (_handle, mut signals) = sentinel::channel();
        loader.set_query("top");
        fetcher
            .respond("top", 1, Ok(RemotePage::new(items(1..=20), 1, false)))
            .await;
        while loader.result_rx.is_empty() {
            tokio::task::yield_now().await;
        }

        // the page-1 result is already queued when the refresh supersedes it
        loader.refresh();
        assert_eq!(loader.step(&mut signals).await, Step::Discarded);

        let log: Vec<&str> = loader.tasks.log.iter().map(|e| e.message.as_str()).collect();
        assert!(
            log.iter()
                .any(|m| m.contains("page 1 (gen 1) discarded (stale)"))
        );
        assert!(!log.iter().any(|m| m.contains("cancelled")));
        assert_eq!(loader.view().status, Status::Loading);
    }

    #[tokio::test]
    async fn failure_then_retry_reissues_the_same_page() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut loader = loader(&fetcher);
        loader.set_query("top");
        fetcher
            .respond("top", 1, Ok(RemotePage::new(items(1..=10), 1, false)))
            .await;
        loader.next_completion().await;

        loader.request_more();
        fetcher
            .respond(
                "top",
                2,
                Err(FetchError::HttpStatus(503, "Service Unavailable".into())),
            )
            .await;
        loader.next_completion().await;

        let view = loader.view();
        assert_eq!(view.status, Status::Error);
        assert_eq!(view.items.len(), 10);
        assert_eq!(
            view.error.map(FetchError::user_message).as_deref(),
            Some("Server error. Please try again later.")
        );

        loader.retry();
        fetcher
            .respond("top", 2, Ok(RemotePage::new(items(11..=20), 2, true)))
            .await;
        loader.next_completion().await;

        assert_eq!(loader.view().items.len(), 20);
        assert_eq!(fetcher.calls(), vec![("top", 1), ("top", 2), ("top", 2)]);
        assert!(loader.tasks.log.iter().any(|e| e.message.contains("failed")));
    }

    #[tokio::test]
    async fn sentinel_signals_drive_request_more() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut loader = loader(&fetcher);
        let (handle, mut signals) = sentinel::channel();
        loader.set_query("top");
        fetcher
            .respond("top", 1, Ok(RemotePage::new(items(1..=20), 1, false)))
            .await;
        assert_eq!(loader.step(&mut signals).await, Step::Completed);

        assert!(handle.became_visible());
        assert_eq!(loader.step(&mut signals).await, Step::Signalled);
        assert_eq!(loader.view().items.len(), 20);

        drop(handle);
        assert_eq!(loader.step(&mut signals).await, Step::SignalsClosed);
    }

    #[tokio::test]
    async fn refresh_reloads_page_one_and_drops_the_old_page() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut loader = loader(&fetcher);
        loader.set_query("top");
        fetcher
            .respond("top", 1, Ok(RemotePage::new(items(1..=20), 1, false)))
            .await;
        loader.next_completion().await;
        loader.request_more();
        loader.request_more();
        fetcher.wait_for_calls(2).await;

        loader.refresh();
        assert_eq!(loader.view().status, Status::Loading);
        assert!(loader.view().items.is_empty());

        fetcher
            .respond("top", 1, Ok(RemotePage::new(items(5..=24), 1, false)))
            .await;
        assert!(loader.next_completion().await);

        let view = loader.view();
        assert_eq!(view.items.first(), Some(&crate::test_utils::Item(5)));
        assert_eq!(view.items.len(), 10);
        assert_eq!(loader.state().generation(), 2);
    }

    #[tokio::test]
    async fn dropping_the_loader_cancels_its_fetch() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let mut loader = loader(&fetcher);
        loader.set_query("top");
        fetcher.wait_for_calls(1).await;

        drop(loader);

        // nobody is listening any more; answering must not panic
        fetcher
            .respond("top", 1, Ok(RemotePage::new(items(1..=20), 1, false)))
            .await;
    }

    #[test]
    fn task_log_is_bounded() {
        let mut tasks = TaskLog::new();
        for i in 0..60 {
            let id = tasks.start_task(format!("task {i}"));
            tasks.end_task(id, "completed");
        }
        assert_eq!(tasks.log.len(), TaskLog::MAX_LOG_ENTRIES);
        assert!(tasks.running_tasks.is_empty());
    }
}
