//! Bounded worker pool for fan-out / fan-in over spawned tasks.

use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};

/// A group of spawned workers sharing a concurrency bound.
///
/// Every submitted worker runs on the tokio runtime as soon as a permit is
/// free. Both join methods wait for all workers; a panicking worker only
/// affects its own slot.
pub struct WorkerPool<T> {
    name: &'static str,
    semaphore: Arc<Semaphore>,
    workers: usize,
    handles: Vec<JoinHandle<T>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Creates a pool that runs at most `workers` tasks at once.
    ///
    /// A bound of zero is treated as one.
    #[must_use]
    pub fn new(name: &'static str, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            name,
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
            handles: Vec::new(),
        }
    }

    /// Spawns a worker.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        let handle = tokio::spawn(async move {
            // The semaphore is never closed.
            let _permit = semaphore.acquire_owned().await.ok();
            task.await
        });
        self.handles.push(handle);
    }

    /// Returns the number of submitted workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns true if nothing has been submitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Returns the concurrency bound.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Waits for every worker; slot `i` holds the output of the `i`-th spawn.
    pub async fn join_ordered(self) -> Vec<Result<T, JoinError>> {
        tracing::debug!(pool = self.name, tasks = self.handles.len(), "Joining pool in order");
        futures::future::join_all(self.handles).await
    }

    /// Waits for every worker, returning outputs in completion order.
    pub async fn join_completed(self) -> Vec<Result<T, JoinError>> {
        tracing::debug!(pool = self.name, tasks = self.handles.len(), "Joining pool by completion");
        let mut pending: FuturesUnordered<_> = self.handles.into_iter().collect();
        let mut results = Vec::with_capacity(pending.len());
        while let Some(result) = pending.next().await {
            results.push(result);
        }
        results
    }
}

impl<T> std::fmt::Debug for WorkerPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("workers", &self.workers)
            .field("task_count", &self.handles.len())
            .finish_non_exhaustive()
    }
}
