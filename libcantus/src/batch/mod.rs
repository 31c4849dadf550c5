//! Batch lookups with per-reference outcomes.
//!
//! Every reference gets exactly one entry in the [`BatchResult`], either a
//! success or a typed failure. One reference failing (malformed, unauthorized
//! or an upstream error) never affects the others.

use crate::error::{CantusError, Result};
use crate::pool::WorkerPool;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::future::Future;
use tracing::debug;


#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem<T> {
    pub reference: String,
    pub value: T,
}

#[derive(Debug)]
pub struct BatchFailure {
    pub reference: String,
    pub error: CantusError,
}

impl Serialize for BatchFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BatchFailure", 3)?;
        state.serialize_field("reference", &self.reference)?;
        state.serialize_field("kind", &self.error.kind())?;
        state.serialize_field("message", &self.error.to_string())?;
        state.end()
    }
}

/// Aggregated outcome of a batch. Successes and failures keep input order.
#[derive(Debug, Serialize)]
pub struct BatchResult<T> {
    pub successes: Vec<BatchItem<T>>,
    pub failures: Vec<BatchFailure>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> BatchResult<T> {
    /// Number of references processed.
    pub fn len(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn push(&mut self, reference: String, outcome: Result<T>) {
        match outcome {
            Ok(value) => self.successes.push(BatchItem { reference, value }),
            Err(error) => self.failures.push(BatchFailure { reference, error }),
        }
    }
}

/// Runs `lookup` once per reference on `pool` and collects every outcome.
pub async fn run<T, F, Fut>(pool: &WorkerPool, references: &[String], lookup: F) -> BatchResult<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let outcomes = pool
        .run_all(references.iter().cloned().map(&lookup))
        .await;

    let mut result = BatchResult::default();
    for (reference, outcome) in references.iter().zip(outcomes) {
        result.push(reference.clone(), outcome);
    }

    debug!(
        "Batch of {} finished with {} successes and {} failures",
        result.len(),
        result.success_count(),
        result.failure_count()
    );
    result
}
