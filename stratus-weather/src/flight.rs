//! Single-flight: deduplication of concurrent in-flight fetches.
//!
//! The first caller for a key spawns the work as its own task; callers
//! arriving while it runs await the same shared handle and receive a clone of
//! its result. The task removes its entry when the work finishes, whether or
//! not any caller is still waiting, so the next caller after that starts
//! fresh work.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use stratus_core::error::{Result, StratusError};

type Flight<T> = Shared<BoxFuture<'static, Result<T>>>;

/// Table of in-flight operations keyed by string.
pub struct FlightGroup<T> {
    in_flight: Arc<DashMap<String, (u64, Flight<T>)>>,
    next_id: AtomicU64,
}

impl<T> FlightGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty group.
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Runs `work` for `key`, or joins the run already in flight.
    ///
    /// `work` is only called when no run for `key` is in flight. Once started,
    /// the work runs to completion even if every caller is dropped.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let flight = match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                debug!(key, "Joining in-flight fetch");
                entry.get().1.clone()
            }
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let table = Arc::clone(&self.in_flight);
                let owned_key = entry.key().clone();
                let fut = work();

                let task = tokio::spawn(async move {
                    let _release = Release {
                        table,
                        key: owned_key,
                        id,
                    };
                    fut.await
                });

                let flight = task
                    .map(|joined| {
                        joined.unwrap_or_else(|e| {
                            Err(StratusError::InternalError(format!("fetch task failed: {}", e)))
                        })
                    })
                    .boxed()
                    .shared();
                entry.insert((id, flight.clone()));
                flight
            }
        };

        flight.await
    }

    /// Number of keys with a run in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

/// Removes a flight's entry when its task ends, including by panic.
struct Release<T> {
    table: Arc<DashMap<String, (u64, Flight<T>)>>,
    key: String,
    id: u64,
}

impl<T> Drop for Release<T> {
    fn drop(&mut self) {
        let id = self.id;
        self.table.remove_if(&self.key, |_, (current, _)| *current == id);
    }
}

impl<T> Default for FlightGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
