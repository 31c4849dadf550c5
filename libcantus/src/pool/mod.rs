//! Bounded worker pool for registry I/O.
//!
//! One [`WorkerPool`] owns the runtime handle that gateway work is spawned on
//! and the permits that cap how many requests talk to upstream registries at
//! the same time. Permits are taken per upstream attempt by
//! [`crate::registry::Registry`], never by spawned tasks, so a task holding
//! a permit never waits on a second one. A panicking task becomes an
//! `Unexpected` error for its slot instead of tearing down its siblings.

use crate::error::{CantusError, Result};
use futures::future;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinError;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    handle: Handle,
    semaphore: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Creates a pool of `size` permits spawning onto `handle`. A size of 0 is treated as 1.
    pub fn new(handle: Handle, size: usize) -> Self {
        let size = size.max(1);
        Self {
            handle,
            semaphore: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Creates a pool on the runtime this is called from.
    pub fn current(size: usize) -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| {
            CantusError::unexpected_with_source("Worker pool requires a tokio runtime", e)
        })?;
        Ok(Self::new(handle, size))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Waits for one of the `size` upstream slots. The slot is released on drop.
    pub async fn permit(&self) -> Result<OwnedSemaphorePermit> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CantusError::unexpected_with_source("Worker pool is closed", e))
    }

    /// Runs `task` on the pool's runtime and waits for it.
    pub async fn spawn<T, Fut>(&self, task: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.handle.spawn(task).await.map_err(task_failed)?
    }

    /// Runs every task on the pool's runtime and returns their outcomes in
    /// input order once all of them have finished.
    pub async fn run_all<T, I, Fut>(&self, tasks: I) -> Vec<Result<T>>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| self.handle.spawn(task))
            .collect();

        future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.map_err(task_failed).and_then(|result| result))
            .collect()
    }
}

fn task_failed(error: JoinError) -> CantusError {
    CantusError::unexpected_with_source("Worker task failed", error)
}
