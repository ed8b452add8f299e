// Named sequence counters used to mint employee ids

//! # Sequence Counters
//!
//! A **sequence counter** maps a name (for example `employee_id`) to the last
//! integer it issued. Every call to [`SequenceCounter::next_sequence`] bumps the
//! counter and returns the new value, creating the counter at 1 when it does not
//! exist yet.
//!
//! ## Atomicity
//!
//! The increment and the read of the new value must be one atomic step. Two
//! concurrent callers may never observe the same value, and the values handed
//! out for one name are consecutive. Implementations use the primitive of their
//! backend for this (a lock in process memory, the stream sequence in NATS
//! JetStream) and never read the value first and write it back afterwards.
//!
//! Counters are never decremented. Deleting a record does not give its id back.
//!
//! ## Names
//!
//! A name is one or more ASCII letters, digits, `_` or `-`. Anything else is
//! rejected with `InvalidInput`, so distinct names always mean distinct
//! counters in every backend.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{EmployeeServiceError, Result};

/// Check that `name` can be used as a counter name
pub fn validate_sequence_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if !valid {
        return Err(EmployeeServiceError::InvalidInput(format!(
            "invalid counter name '{}': use ASCII letters, digits, '_' or '-'",
            name
        )));
    }
    Ok(())
}

/// Atomic increment-and-return counters keyed by name
#[async_trait::async_trait]
pub trait SequenceCounter: Send + Sync {
    /// Increment the counter for `name` and return the new value
    ///
    /// The first call for a name returns 1.
    async fn next_sequence(&self, name: &str) -> Result<i64>;

    /// Last value issued for `name`, or 0 if the counter was never used
    async fn current_sequence(&self, name: &str) -> Result<i64>;
}

/// Process-local sequence counters
///
/// One mutex guards every counter; the increment happens while the guard is
/// held so the returned value is unique.
#[derive(Debug, Default)]
pub struct InMemorySequenceCounter {
    counters: Mutex<HashMap<String, i64>>,
}

impl InMemorySequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter set where `name` has already issued every value up to `last`
    pub fn starting_after(name: &str, last: i64) -> Self {
        let mut counters = HashMap::new();
        counters.insert(name.to_string(), last);
        Self {
            counters: Mutex::new(counters),
        }
    }
}

#[async_trait::async_trait]
impl SequenceCounter for InMemorySequenceCounter {
    async fn next_sequence(&self, name: &str) -> Result<i64> {
        validate_sequence_name(name)?;
        let mut counters = self.counters.lock().await;
        let seq = counters.entry(name.to_string()).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    async fn current_sequence(&self, name: &str) -> Result<i64> {
        validate_sequence_name(name)?;
        let counters = self.counters.lock().await;
        Ok(counters.get(name).copied().unwrap_or(0))
    }
}
