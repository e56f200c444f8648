//! In-memory `SearchBackend` for unit tests
//!
//! Responses are scripted per query string and served in order; once a
//! query's script is exhausted it answers with an empty page. Every call is
//! recorded so tests can assert exactly which pages were requested.

use crate::search::{SearchBackend, SearchOutcome};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

#[derive(Default)]
pub(crate) struct ScriptedBackend {
    scripts: Mutex<HashMap<String, VecDeque<SearchOutcome>>>,
    calls: Mutex<Vec<(String, u32)>>,
    trip: Mutex<Option<(String, oneshot::Sender<()>)>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues `outcomes` for `query`, after anything already queued
    pub(crate) fn script(self, query: &str, outcomes: Vec<SearchOutcome>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(query.to_string())
            .or_default()
            .extend(outcomes);
        self
    }

    /// Fires the returned receiver the first time `query` is requested
    pub(crate) fn trip_on(&self, query: &str) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        *self.trip.lock().unwrap() = Some((query.to_string(), tx));
        rx
    }

    /// All `(query, page)` pairs requested so far
    pub(crate) fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    /// Pages requested for `query`, in order
    pub(crate) fn pages_for(&self, query: &str) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter(|(q, _)| q == query)
            .map(|(_, page)| page)
            .collect()
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn search(&self, query: &str, page: u32, _per_page: u32) -> SearchOutcome {
        self.calls.lock().unwrap().push((query.to_string(), page));

        let tripped = {
            let mut trip = self.trip.lock().unwrap();
            match trip.take() {
                Some((q, tx)) if q == query => {
                    let _ = tx.send(());
                    true
                }
                other => {
                    *trip = other;
                    false
                }
            }
        };

        // Give a racing shutdown future the chance to win
        tokio::task::yield_now().await;
        if tripped {
            tokio::task::yield_now().await;
        }

        self.scripts
            .lock()
            .unwrap()
            .get_mut(query)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| SearchOutcome::page(0, vec![]))
    }
}
