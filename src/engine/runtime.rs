// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::config::WatchRequest;
use crate::errors::Result;
use crate::normalize::Normalizer;
use crate::source::{Batch, BatchReceiver, EventSource, Subscription};

use super::core::CoreLoop;
use super::{LoopCommand, LoopEvent, RunSummary, StopReason};

type ShutdownFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Drives one subscription from start to finish.
///
/// This is the IO shell around [`CoreLoop`]: it subscribes, waits on the
/// batch channel, the control input and the shutdown future, and carries
/// out the commands the core returns. Everything runs on the calling task,
/// so a batch is always fully written before the next wake-up is looked at.
pub struct Runtime<S, C, W>
where
    S: EventSource,
    C: AsyncRead + Unpin,
    W: Write,
{
    core: CoreLoop,
    request: WatchRequest,
    source: S,
    control: C,
    control_open: bool,
    normalizer: Normalizer<W>,
    shutdown: ShutdownFuture,
    summary: RunSummary,
}

impl<S, C, W> fmt::Debug for Runtime<S, C, W>
where
    S: EventSource,
    C: AsyncRead + Unpin,
    W: Write,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("request", &self.request)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl<S, C, W> Runtime<S, C, W>
where
    S: EventSource,
    C: AsyncRead + Unpin,
    W: Write,
{
    pub fn new(request: WatchRequest, source: S, control: C, normalizer: Normalizer<W>) -> Self {
        Self {
            core: CoreLoop::new(),
            request,
            source,
            control,
            control_open: true,
            normalizer,
            shutdown: Box::pin(std::future::pending()),
            summary: RunSummary::default(),
        }
    }

    /// Additional shutdown trigger (Ctrl-C in production).
    pub fn with_shutdown(mut self, shutdown: impl Future<Output = ()> + Send + 'static) -> Self {
        self.shutdown = Box::pin(shutdown);
        self
    }

    /// Main event loop.
    ///
    /// - Subscribes; a failure here is returned as a startup error.
    /// - Writes the header, then one record per delivered event.
    /// - On control EOF, shutdown or source closure: flushes the source,
    ///   writes whatever that produced, stops the source and returns.
    ///
    /// A failing sink (e.g. the consumer went away) also ends the loop, with
    /// the IO error.
    pub async fn run(mut self) -> Result<RunSummary> {
        let (batch_tx, mut batch_rx) = mpsc::unbounded_channel();

        let subscription = self.source.subscribe(&self.request, batch_tx)?;
        let mut subscription = Some(subscription);
        self.core.step(LoopEvent::Subscribed);
        info!(paths = ?self.request.paths(), "watching");

        if let Err(err) = self.normalizer.write_header() {
            stop(&mut subscription);
            return Err(err.into());
        }
        self.core.step(LoopEvent::LoopEntered);

        let mut queued: VecDeque<LoopEvent> = VecDeque::new();
        loop {
            let event = match queued.pop_front() {
                Some(event) => event,
                None => self.next_event(&mut batch_rx).await,
            };

            let step = self.core.step(event);
            for command in step.commands {
                match command {
                    LoopCommand::Normalize(batch) => {
                        match self.normalizer.process_batch(&batch) {
                            Ok(written) => {
                                self.summary.batches += 1;
                                self.summary.records += written as u64;
                                trace!(written, "batch written");
                            }
                            Err(err) => {
                                warn!(error = %err, "output stream failed; stopping");
                                stop(&mut subscription);
                                return Err(err.into());
                            }
                        }
                    }
                    LoopCommand::FlushSource => {
                        if let Some(sub) = subscription.as_mut() {
                            sub.flush();
                        }
                    }
                    LoopCommand::DrainPending => {
                        // Only what is queued now; a busy source keeps sending
                        // until it is stopped.
                        for _ in 0..batch_rx.len() {
                            match batch_rx.try_recv() {
                                Ok(batch) => queued.push_back(LoopEvent::BatchDelivered(batch)),
                                Err(_) => break,
                            }
                        }
                        queued.push_back(LoopEvent::Drained);
                    }
                    LoopCommand::StopSource => stop(&mut subscription),
                }
            }

            if !step.keep_running {
                break;
            }
        }

        self.summary.stop_reason = self.core.stop_reason();
        info!(
            batches = self.summary.batches,
            records = self.summary.records,
            "watch loop stopped"
        );
        Ok(self.summary)
    }

    /// Wait for the next thing that needs the core's attention. Control
    /// input that is not EOF is read and discarded here.
    ///
    /// Stop triggers are polled before the batch channel, so they are seen
    /// at the next batch boundary however busy the source is. Batches still
    /// queued at that point are picked up by the drain.
    async fn next_event(&mut self, batch_rx: &mut BatchReceiver) -> LoopEvent {
        let mut buf = [0u8; 1024];
        loop {
            tokio::select! {
                biased;

                _ = &mut self.shutdown => {
                    return LoopEvent::StopRequested(StopReason::ShutdownRequested);
                }
                read = self.control.read(&mut buf), if self.control_open => {
                    match read {
                        Ok(0) => {
                            self.control_open = false;
                            return LoopEvent::StopRequested(StopReason::ControlClosed);
                        }
                        Ok(n) => {
                            trace!(n, "ignoring control input");
                            // Chatty control input must not hold back ready batches.
                            match batch_rx.try_recv() {
                                Ok(batch) => return delivered(batch),
                                Err(mpsc::error::TryRecvError::Disconnected) => {
                                    return LoopEvent::StopRequested(StopReason::SourceClosed);
                                }
                                Err(mpsc::error::TryRecvError::Empty) => {}
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, "control input failed; treating as closed");
                            self.control_open = false;
                            return LoopEvent::StopRequested(StopReason::ControlClosed);
                        }
                    }
                }
                batch = batch_rx.recv() => {
                    return match batch {
                        Some(batch) => delivered(batch),
                        None => LoopEvent::StopRequested(StopReason::SourceClosed),
                    };
                }
            }
        }
    }
}

fn delivered(batch: Batch) -> LoopEvent {
    debug!(len = batch.len(), "batch delivered");
    LoopEvent::BatchDelivered(batch)
}

fn stop<T: Subscription>(subscription: &mut Option<T>) {
    if let Some(sub) = subscription.take() {
        sub.stop();
    }
}
