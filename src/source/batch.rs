// src/source/batch.rs

//! Pending-event buffer shared between a notification callback thread and
//! the watch loop.
//!
//! Notifications are appended as they arrive and leave the buffer as a single
//! batch when the latency interval elapses, when the loop asks for a flush,
//! or (with `no_defer`) immediately for the first notification after a quiet
//! period.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::source::{Batch, BatchSender, RawEvent};
use crate::types::Cursor;

/// Delivery policy for a [`PendingBatch`].
#[derive(Debug, Clone, Copy)]
pub struct BatchPolicy {
    pub latency: Duration,
    pub no_defer: bool,
    /// Merge a notification into the previous one when both name the same
    /// path (directory-granularity sources report the same directory over
    /// and over).
    pub collapse_repeats: bool,
}

#[derive(Debug)]
struct PendingState {
    events: Batch,
    last_id: u64,
    last_delivery: Option<Instant>,
}

#[derive(Debug)]
pub struct PendingBatch {
    state: Mutex<PendingState>,
    sender: BatchSender,
    policy: BatchPolicy,
}

impl PendingBatch {
    pub fn new(sender: BatchSender, cursor: Cursor, policy: BatchPolicy) -> Self {
        Self {
            state: Mutex::new(PendingState {
                events: Vec::new(),
                last_id: cursor.base_id(),
                last_delivery: None,
            }),
            sender,
            policy,
        }
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Append `(flags, path)` notifications, assigning ids in order.
    pub fn push(&self, items: impl IntoIterator<Item = (u32, PathBuf)>) {
        let mut state = self.lock();
        let was_empty = state.events.is_empty();

        for (flags, path) in items {
            if self.policy.collapse_repeats {
                if let Some(last) = state.events.last_mut() {
                    if last.path == path {
                        last.flags |= flags;
                        continue;
                    }
                }
            }
            state.last_id += 1;
            let id = state.last_id;
            trace!(id, flags, ?path, "buffered notification");
            state.events.push(RawEvent { id, flags, path });
        }

        let quiet = state
            .last_delivery
            .is_none_or(|at| at.elapsed() >= self.policy.latency);
        let immediate = self.policy.latency.is_zero() || (self.policy.no_defer && was_empty && quiet);
        if immediate {
            self.deliver(&mut state);
        }
    }

    /// Deliver the buffer if it holds anything. Returns the number of events
    /// sent.
    pub fn flush(&self) -> usize {
        let mut state = self.lock();
        self.deliver(&mut state)
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn deliver(&self, state: &mut PendingState) -> usize {
        if state.events.is_empty() {
            return 0;
        }
        let batch = std::mem::take(&mut state.events);
        let count = batch.len();
        state.last_delivery = Some(Instant::now());
        if self.sender.send(batch).is_err() {
            debug!(count, "batch receiver closed; dropping batch");
            return 0;
        }
        trace!(count, "delivered batch");
        count
    }

    fn lock(&self) -> MutexGuard<'_, PendingState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("pending batch mutex poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }
}
