// tests/notify_poll_source.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::time::Duration;

use tokio::sync::mpsc;

use fsevent_watch::config::negotiate;
use fsevent_watch::flags::bits;
use fsevent_watch::fs::RealFileSystem;
use fsevent_watch::source::{EventSource, NotifyEventSource, Subscription};
use fsevent_watch::types::Backend;
use fsevent_watch_test_utils::builders::RawConfigBuilder;
use fsevent_watch_test_utils::with_timeout;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn poll_backend_reports_created_file() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let raw = RawConfigBuilder::new()
        .path(tmp.path())
        .backend(Backend::Poll)
        .poll_interval(0.05)
        .latency(0.0)
        .file_events()
        .build();
    let mut source = NotifyEventSource::new(Backend::Poll);
    let request = negotiate(&raw, &source.capabilities(), &RealFileSystem)?;
    let root = request.paths()[0].as_path().to_path_buf();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = source.subscribe(&request, tx)?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(root.join("fresh.txt"), b"hello")?;

    let created = with_timeout(async {
        loop {
            let batch = rx.recv().await.expect("source closed early");
            if let Some(ev) = batch
                .into_iter()
                .find(|ev| ev.path == root.join("fresh.txt") && ev.flags & bits::ITEM_CREATED != 0)
            {
                return ev;
            }
        }
    })
    .await;

    assert!(created.id >= 1);
    assert_ne!(created.flags & bits::ITEM_IS_FILE, 0);

    subscription.stop();
    Ok(())
}

#[tokio::test]
async fn flush_delivers_buffered_notifications() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let raw = RawConfigBuilder::new()
        .path(tmp.path())
        .backend(Backend::Poll)
        .poll_interval(0.05)
        .latency(3600.0)
        .file_events()
        .build();
    let mut source = NotifyEventSource::new(Backend::Poll);
    let request = negotiate(&raw, &source.capabilities(), &RealFileSystem)?;
    let root = request.paths()[0].as_path().to_path_buf();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut subscription = source.subscribe(&request, tx)?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(root.join("held.txt"), b"x")?;
    // Several poll rounds; the hour-long latency keeps everything buffered.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rx.try_recv().is_err());

    subscription.flush();
    let batch = rx.try_recv()?;
    assert!(batch.iter().any(|ev| ev.path == root.join("held.txt")));

    subscription.flush();
    assert!(rx.try_recv().is_err());

    subscription.stop();
    Ok(())
}
