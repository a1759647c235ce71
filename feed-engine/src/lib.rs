//! Feed synchronization engine: owns the timeline and the image cache for
//! one active search query, coordinates the initial load, backward
//! pagination and forward polling, and reports merges to the presentation
//! layer over an event channel.

pub mod cache;
pub mod timeline;

pub use cache::{ImageCache, MemoryPressure, DEFAULT_CAPACITY_BYTES};
pub use timeline::Timeline;

use hashfeed_core::{CoreError, DecodedImage, FeedSnapshot, Post};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};


const LOCK_MSG: &str = "engine state lock poisoned";

/// The search collaborator as the engine sees it: one bounded page per
/// call. Kept as a trait so tests can script fetches.
pub trait SearchBackend: Send + Sync + 'static {
    fn fetch(
        &self,
        query: String,
        since_id: Option<u64>,
        max_id: Option<u64>,
    ) -> impl Future<Output = Result<Vec<Post>, CoreError>> + Send;
}

impl SearchBackend for search_client::SearchClient {
    fn fetch(
        &self,
        query: String,
        since_id: Option<u64>,
        max_id: Option<u64>,
    ) -> impl Future<Output = Result<Vec<Post>, CoreError>> + Send {
        async move { search_client::SearchClient::fetch(self, &query, since_id, max_id).await }
    }
}

/// Notifications to the presentation layer. `TimelineUpdated` carries a
/// full snapshot; `NewPostsAvailable` deliberately does not, so the caller
/// can decide whether to refresh based on scroll position.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    TimelineUpdated(Vec<Post>),
    NewPostsAvailable(usize),
    LoadFailed(String),
    PollFailed(String),
}

struct EngineState {
    query: String,
    /// Bumped on every query change and teardown; fetches tag themselves
    /// with the value at issue time and stale results are discarded.
    generation: u64,
    timeline: Timeline,
    cache: ImageCache,
    /// An initial or backward fetch is in flight. Polling is independent.
    loading: bool,
    /// Set once a backward page comes back short: no more older results.
    older_exhausted: bool,
    poll_task: Option<JoinHandle<()>>,
    fetch_task: Option<JoinHandle<()>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            query: String::new(),
            generation: 0,
            timeline: Timeline::new(),
            cache: ImageCache::new(),
            loading: false,
            older_exhausted: false,
            poll_task: None,
            fetch_task: None,
        }
    }

    fn abort_tasks(&mut self) {
        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }
}

pub struct FeedEngine<S: SearchBackend> {
    backend: Arc<S>,
    events: mpsc::UnboundedSender<FeedEvent>,
    state: Arc<Mutex<EngineState>>,
    poll_interval: Duration,
    page_size: usize,
}

impl<S: SearchBackend> Clone for FeedEngine<S> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            events: self.events.clone(),
            state: Arc::clone(&self.state),
            poll_interval: self.poll_interval,
            page_size: self.page_size,
        }
    }
}

impl<S: SearchBackend> FeedEngine<S> {
    pub fn new(
        backend: S,
        poll_interval: Duration,
        page_size: usize,
    ) -> (Self, mpsc::UnboundedReceiver<FeedEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let engine = Self {
            backend: Arc::new(backend),
            events,
            state: Arc::new(Mutex::new(EngineState::new())),
            poll_interval,
            page_size,
        };
        (engine, receiver)
    }

    /// Begin a new query: discard the previous timeline and cache, cancel
    /// in-flight work, and issue the initial unbounded fetch. The poll
    /// timer starts once that fetch succeeds.
    pub fn start_query(&self, text: &str) -> Result<(), CoreError> {
        let query = text.trim();
        if query.is_empty() {
            return Err(CoreError::InvalidInput {
                message: "empty search query".to_string(),
            });
        }

        let generation = {
            let mut state = self.state.lock().expect(LOCK_MSG);
            state.generation += 1;
            state.abort_tasks();
            state.query = query.to_string();
            state.timeline.clear();
            state.cache = ImageCache::new();
            state.loading = true;
            state.older_exhausted = false;
            state.generation
        };

        info!(query, generation, "starting query");
        self.spawn_initial(generation, query.to_string());
        Ok(())
    }

    /// Request the page below the current oldest retained post. A no-op
    /// while a load is in flight, while the timeline is empty, or once the
    /// backward direction is exhausted.
    pub fn load_older(&self) {
        let (generation, query, max_id) = {
            let mut state = self.state.lock().expect(LOCK_MSG);
            if state.loading {
                debug!("load_older ignored: already loading");
                return;
            }
            let Some(oldest) = state.timeline.oldest_id() else {
                return;
            };
            if state.older_exhausted {
                debug!("load_older ignored: no more results");
                return;
            }
            if oldest <= 1 {
                state.older_exhausted = true;
                return;
            }
            state.loading = true;
            // Exclusive convention: request ids strictly below the oldest
            // retained one. The API's max_id is inclusive.
            (state.generation, state.query.clone(), oldest - 1)
        };

        debug!(query, max_id, "loading older posts");
        let engine = self.clone();
        let handle = tokio::spawn(async move {
            let result = engine.backend.fetch(query, None, Some(max_id)).await;
            let mut state = engine.state.lock().expect(LOCK_MSG);
            if state.generation != generation {
                debug!(generation, "discarding stale older page");
                return;
            }
            state.loading = false;
            match result {
                Ok(batch) => {
                    state.older_exhausted = batch.len() < engine.page_size;
                    state.timeline.append_older(batch);
                    let _ = engine
                        .events
                        .send(FeedEvent::TimelineUpdated(state.timeline.snapshot()));
                }
                Err(e) => {
                    warn!("older page failed: {e}");
                    let _ = engine.events.send(FeedEvent::LoadFailed(e.to_string()));
                }
            }
        });
        self.register_fetch(generation, handle);
    }

    /// Forward the host's memory-pressure signal to the cache tiers.
    pub fn handle_memory_pressure(&self, level: MemoryPressure) {
        self.state
            .lock()
            .expect(LOCK_MSG)
            .cache
            .handle_memory_pressure(level);
    }

    /// Cached avatar lookup; promotes the entry on hit.
    pub fn cached_image(&self, id: u64) -> Option<Arc<DecodedImage>> {
        self.state.lock().expect(LOCK_MSG).cache.get(id)
    }

    pub fn store_image(&self, id: u64, image: DecodedImage) {
        self.state.lock().expect(LOCK_MSG).cache.put(id, image);
    }

    pub fn cache_len(&self) -> usize {
        self.state.lock().expect(LOCK_MSG).cache.len()
    }

    pub fn cache_total_bytes(&self) -> usize {
        self.state.lock().expect(LOCK_MSG).cache.total_bytes()
    }

    pub fn timeline_snapshot(&self) -> Vec<Post> {
        self.state.lock().expect(LOCK_MSG).timeline.snapshot()
    }

    pub fn is_polling(&self) -> bool {
        self.state.lock().expect(LOCK_MSG).poll_task.is_some()
    }

    /// Persisted UI state for suspension.
    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.state.lock().expect(LOCK_MSG);
        FeedSnapshot {
            query: state.query.clone(),
            posts: state.timeline.snapshot(),
            polling: state.poll_task.is_some(),
        }
    }

    /// Resume from a persisted snapshot without a fresh fetch. The poll
    /// timer restarts if it was running at suspension time.
    pub fn restore(&self, snapshot: FeedSnapshot) {
        let resume_poll = {
            let mut state = self.state.lock().expect(LOCK_MSG);
            state.generation += 1;
            state.abort_tasks();
            state.query = snapshot.query;
            state.timeline.restore(snapshot.posts);
            state.cache = ImageCache::new();
            state.loading = false;
            state.older_exhausted = false;
            snapshot.polling.then_some(state.generation)
        };
        if let Some(generation) = resume_poll {
            self.start_polling(generation);
        }
    }

    /// Tear down: cancel the poll timer and any in-flight fetch, drop the
    /// timeline and every decoded image.
    pub fn shutdown(&self) {
        let mut state = self.state.lock().expect(LOCK_MSG);
        state.generation += 1;
        state.abort_tasks();
        state.query.clear();
        state.timeline.clear();
        state.cache.evict_all();
        state.loading = false;
        state.older_exhausted = false;
        info!("engine shut down");
    }

    fn spawn_initial(&self, generation: u64, query: String) {
        let engine = self.clone();
        let handle = tokio::spawn(async move {
            let result = engine.backend.fetch(query, None, None).await;
            let start_poll = {
                let mut state = engine.state.lock().expect(LOCK_MSG);
                if state.generation != generation {
                    debug!(generation, "discarding stale initial page");
                    return;
                }
                state.loading = false;
                match result {
                    Ok(batch) => {
                        let count = state.timeline.replace(batch);
                        info!(count, "initial page loaded");
                        let _ = engine
                            .events
                            .send(FeedEvent::TimelineUpdated(state.timeline.snapshot()));
                        true
                    }
                    Err(e) => {
                        warn!("initial page failed: {e}");
                        let _ = engine.events.send(FeedEvent::LoadFailed(e.to_string()));
                        false
                    }
                }
            };
            if start_poll {
                engine.start_polling(generation);
            }
        });
        self.register_fetch(generation, handle);
    }

    fn register_fetch(&self, generation: u64, handle: JoinHandle<()>) {
        let mut state = self.state.lock().expect(LOCK_MSG);
        if state.generation == generation {
            if let Some(previous) = state.fetch_task.replace(handle) {
                previous.abort();
            }
        } else {
            handle.abort();
        }
    }

    fn start_polling(&self, generation: u64) {
        let engine = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(engine.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // An interval's first tick fires immediately; skip it so the
            // first poll lands one full interval after the initial load.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                engine.poll_once(generation).await;
            }
        });

        let mut state = self.state.lock().expect(LOCK_MSG);
        if state.generation == generation {
            if let Some(previous) = state.poll_task.replace(handle) {
                previous.abort();
            }
        } else {
            handle.abort();
        }
    }

    async fn poll_once(&self, generation: u64) {
        let (query, since_id) = {
            let state = self.state.lock().expect(LOCK_MSG);
            if state.generation != generation {
                return;
            }
            let Some(newest) = state.timeline.newest_id() else {
                return;
            };
            (state.query.clone(), newest)
        };

        match self.backend.fetch(query, Some(since_id), None).await {
            Ok(batch) => {
                if batch.is_empty() {
                    return;
                }
                let mut state = self.state.lock().expect(LOCK_MSG);
                if state.generation != generation {
                    debug!(generation, "discarding stale poll result");
                    return;
                }
                let added = state.timeline.prepend_newer(batch);
                if added > 0 {
                    info!(added, "new posts available");
                    let _ = self.events.send(FeedEvent::NewPostsAvailable(added));
                }
            }
            Err(e) => {
                warn!("poll fetch failed: {e}");
                let _ = self.events.send(FeedEvent::PollFailed(e.to_string()));
            }
        }
    }
}
