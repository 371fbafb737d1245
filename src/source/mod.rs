// src/source/mod.rs

//! Change-notification event sources.
//!
//! The watch loop never talks to a notification facility directly. It hands
//! a validated [`WatchRequest`] to an [`EventSource`], receives ordered
//! batches of [`RawEvent`]s over a channel, and later asks the resulting
//! [`Subscription`] to flush and stop.
//!
//! - [`notify_source`] is the production implementation on top of `notify`.
//! - [`batch`] holds the pending-event buffer that turns single
//!   notifications into latency-bounded batches.
//! - Tests substitute a scripted fake (see the `fsevent-watch-test-utils`
//!   crate).

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::config::WatchRequest;
use crate::errors::Result;

pub mod batch;
pub mod notify_source;

pub use batch::PendingBatch;
pub use notify_source::{NotifyEventSource, NotifySubscription};

/// One undecoded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Increasing for the lifetime of a subscription, and above the cursor
    /// it was resumed from.
    pub id: u64,
    /// Attribute bitmask, see [`crate::flags::bits`].
    pub flags: u32,
    /// Absolute path of the affected object.
    pub path: PathBuf,
}

impl RawEvent {
    pub fn new(id: u64, flags: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            flags,
            path: path.into(),
        }
    }
}

/// Events delivered together by one callback invocation, in delivery order.
pub type Batch = Vec<RawEvent>;
pub type BatchSender = mpsc::UnboundedSender<Batch>;
pub type BatchReceiver = mpsc::UnboundedReceiver<Batch>;

/// What a source can honour. Consulted once, while the request is being
/// validated, never at event time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Name used in error messages.
    pub name: &'static str,
    pub no_defer: bool,
    pub watch_root: bool,
    pub ignore_self: bool,
    pub file_events: bool,
    pub mark_self: bool,
}

impl Capabilities {
    /// A source that supports every behavioural flag.
    pub const fn all(name: &'static str) -> Self {
        Self {
            name,
            no_defer: true,
            watch_root: true,
            ignore_self: true,
            file_events: true,
            mark_self: true,
        }
    }
}

/// A mechanism that can be subscribed to for change notifications.
pub trait EventSource {
    type Subscription: Subscription;

    fn capabilities(&self) -> Capabilities;

    /// Register `request` and start buffering notifications. Every batch is
    /// sent through `on_batch`, in order.
    ///
    /// Failure here is a fatal startup condition.
    fn subscribe(&mut self, request: &WatchRequest, on_batch: BatchSender)
    -> Result<Self::Subscription>;
}

/// A live registration returned by [`EventSource::subscribe`].
pub trait Subscription {
    /// Deliver everything buffered but not yet delivered, synchronously,
    /// through the subscription's batch sender.
    fn flush(&mut self);

    /// Tear the registration down. No batch is sent afterwards.
    fn stop(self);
}
