use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fsevent_watch::config::WatchRequest;
use fsevent_watch::errors::{Result, WatchError};
use fsevent_watch::source::{Batch, BatchSender, Capabilities, EventSource, Subscription};

/// What the watch loop asked of a [`FakeEventSource`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    Subscribe(Vec<PathBuf>),
    Flush,
    Stop,
}

/// A scripted event source that:
/// - sends `initial` batches as soon as it is subscribed
/// - sends `on_flush` batches when the subscription is flushed
/// - records subscribe/flush/stop calls
/// - optionally refuses to subscribe, or closes its channel right away.
pub struct FakeEventSource {
    caps: Capabilities,
    initial: Vec<Batch>,
    on_flush: Vec<Batch>,
    fail_subscribe: Option<String>,
    close_after_initial: bool,
    handle: FakeSourceHandle,
}

impl FakeEventSource {
    pub fn new() -> Self {
        Self {
            caps: Capabilities::all("fake"),
            initial: Vec::new(),
            on_flush: Vec::new(),
            fail_subscribe: None,
            close_after_initial: false,
            handle: FakeSourceHandle::default(),
        }
    }

    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    pub fn with_initial_batch(mut self, batch: Batch) -> Self {
        self.initial.push(batch);
        self
    }

    /// Batches that stay buffered until the subscription is flushed.
    pub fn with_buffered_batch(mut self, batch: Batch) -> Self {
        self.on_flush.push(batch);
        self
    }

    pub fn failing_subscribe(mut self, reason: &str) -> Self {
        self.fail_subscribe = Some(reason.to_string());
        self
    }

    /// Drop every sender once the initial batches are out, as a source whose
    /// stream ended would.
    pub fn closing_after_initial(mut self) -> Self {
        self.close_after_initial = true;
        self
    }

    /// Shared view for pushing batches later and inspecting calls.
    pub fn handle(&self) -> FakeSourceHandle {
        self.handle.clone()
    }
}

impl Default for FakeEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for FakeEventSource {
    type Subscription = FakeSubscription;

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn subscribe(
        &mut self,
        request: &WatchRequest,
        on_batch: BatchSender,
    ) -> Result<Self::Subscription> {
        self.handle.record(SourceCall::Subscribe(
            request
                .paths()
                .iter()
                .map(|p| p.as_path().to_path_buf())
                .collect(),
        ));

        if let Some(ref reason) = self.fail_subscribe {
            return Err(WatchError::Subscribe(reason.clone()));
        }

        for batch in self.initial.drain(..) {
            let _ = on_batch.send(batch);
        }

        let sender = if self.close_after_initial {
            None
        } else {
            *self.handle.sender.lock().unwrap() = Some(on_batch.clone());
            Some(on_batch)
        };

        Ok(FakeSubscription {
            sender,
            on_flush: std::mem::take(&mut self.on_flush),
            handle: self.handle.clone(),
        })
    }
}

pub struct FakeSubscription {
    sender: Option<BatchSender>,
    on_flush: Vec<Batch>,
    handle: FakeSourceHandle,
}

impl Subscription for FakeSubscription {
    fn flush(&mut self) {
        self.handle.record(SourceCall::Flush);
        if let Some(ref sender) = self.sender {
            for batch in self.on_flush.drain(..) {
                let _ = sender.send(batch);
            }
        }
    }

    fn stop(self) {
        self.handle.record(SourceCall::Stop);
        self.handle.sender.lock().unwrap().take();
    }
}

#[derive(Clone, Default)]
pub struct FakeSourceHandle {
    calls: Arc<Mutex<Vec<SourceCall>>>,
    sender: Arc<Mutex<Option<BatchSender>>>,
}

impl FakeSourceHandle {
    /// Deliver a batch as if the source's callback had fired. Returns false
    /// once the subscription has been stopped (or never started).
    pub fn push(&self, batch: Batch) -> bool {
        match self.sender.lock().unwrap().as_ref() {
            Some(sender) => sender.send(batch).is_ok(),
            None => false,
        }
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: SourceCall) {
        self.calls.lock().unwrap().push(call);
    }
}
