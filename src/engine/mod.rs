// src/engine/mod.rs

//! The watch loop.
//!
//! The pure core state machine lives in [`core`]; the async/IO shell that
//! owns the subscription, the control channel and the normalizer is
//! implemented in [`runtime`].
//!
//! Lifecycle: `Idle → Subscribed → Running → Draining → Stopped`.

use crate::source::Batch;

/// Where the loop is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Subscribed,
    Running,
    Draining,
    Stopped,
}

/// Why the loop started draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The control input reached end-of-file.
    ControlClosed,
    /// Ctrl-C or another external shutdown request.
    ShutdownRequested,
    /// The event source dropped its batch sender.
    SourceClosed,
}

/// Events flowing into the core.
#[derive(Debug, Clone)]
pub enum LoopEvent {
    /// The event source accepted the request.
    Subscribed,
    /// The shell is about to start waiting for batches.
    LoopEntered,
    /// A batch arrived from the event source.
    BatchDelivered(Batch),
    /// A shutdown trigger was observed.
    StopRequested(StopReason),
    /// Every batch the source could still deliver has been handed over.
    Drained,
}

/// Work the shell must perform, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopCommand {
    /// Write records for this batch and flush the sink.
    Normalize(Batch),
    /// Ask the subscription to deliver its buffered notifications now.
    FlushSource,
    /// Feed every batch already queued on the channel back in, then
    /// [`LoopEvent::Drained`].
    DrainPending,
    /// Tear the subscription down.
    StopSource,
}

/// Result of feeding one event to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopStep {
    pub commands: Vec<LoopCommand>,
    pub keep_running: bool,
}

/// Totals reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: u64,
    pub records: u64,
    pub stop_reason: Option<StopReason>,
}

pub mod core;
pub mod runtime;

pub use core::CoreLoop;
pub use runtime::Runtime;
