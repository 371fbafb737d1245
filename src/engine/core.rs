// src/engine/core.rs

//! Pure core state machine of the watch loop.
//!
//! [`CoreLoop`] consumes [`LoopEvent`]s and answers with the commands the
//! IO shell (`engine::runtime::Runtime`) should run. It has no channels, no
//! Tokio types, and does not perform any IO, so the lifecycle rules can be
//! tested on their own:
//!
//! - batches are only normalized while `Running` or `Draining`;
//! - the first stop trigger moves `Running` to `Draining` and asks for a
//!   synchronous flush followed by a drain of everything already queued;
//! - further stop triggers while draining are ignored;
//! - `Drained` stops the source and ends the loop.

use tracing::{debug, info};

use crate::engine::{DriverState, LoopCommand, LoopEvent, LoopStep, StopReason};

#[derive(Debug)]
pub struct CoreLoop {
    state: DriverState,
    stop_reason: Option<StopReason>,
}

impl Default for CoreLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreLoop {
    pub fn new() -> Self {
        Self {
            state: DriverState::Idle,
            stop_reason: None,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// The trigger that started draining, once there was one.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Handle a single event, updating state and returning the resulting
    /// commands for the IO shell.
    pub fn step(&mut self, event: LoopEvent) -> LoopStep {
        match (self.state, event) {
            (DriverState::Idle, LoopEvent::Subscribed) => {
                self.transition(DriverState::Subscribed);
                self.keep_going(Vec::new())
            }
            (DriverState::Subscribed, LoopEvent::LoopEntered) => {
                self.transition(DriverState::Running);
                self.keep_going(Vec::new())
            }
            (DriverState::Running | DriverState::Draining, LoopEvent::BatchDelivered(batch)) => {
                self.keep_going(vec![LoopCommand::Normalize(batch)])
            }
            (DriverState::Subscribed | DriverState::Running, LoopEvent::StopRequested(reason)) => {
                info!(?reason, "shutdown requested; draining");
                self.stop_reason = Some(reason);
                self.transition(DriverState::Draining);
                self.keep_going(vec![LoopCommand::FlushSource, LoopCommand::DrainPending])
            }
            (DriverState::Draining, LoopEvent::Drained) => {
                self.transition(DriverState::Stopped);
                LoopStep {
                    commands: vec![LoopCommand::StopSource],
                    keep_running: false,
                }
            }
            (state, event) => {
                debug!(?state, ?event, "event ignored in current state");
                LoopStep {
                    commands: Vec::new(),
                    keep_running: state != DriverState::Stopped,
                }
            }
        }
    }

    fn transition(&mut self, next: DriverState) {
        debug!(from = ?self.state, to = ?next, "watch loop transition");
        self.state = next;
    }

    fn keep_going(&self, commands: Vec<LoopCommand>) -> LoopStep {
        LoopStep {
            commands,
            keep_running: true,
        }
    }
}
