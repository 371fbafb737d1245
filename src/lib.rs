// src/lib.rs

pub mod canonical;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod flags;
pub mod fs;
pub mod logging;
pub mod normalize;
pub mod source;
pub mod types;

use std::io::{self, BufWriter};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{WatchRequest, load_raw_config, negotiate};
use crate::engine::Runtime;
use crate::errors::Result;
use crate::flags::FlagCodec;
use crate::fs::{FileSystem, RealFileSystem};
use crate::normalize::Normalizer;
use crate::source::{EventSource, NotifyEventSource};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading and capability negotiation
/// - the `notify`-backed event source
/// - the normalizer writing to stdout
/// - stdin EOF and Ctrl-C as shutdown triggers
pub async fn run(args: CliArgs) -> Result<()> {
    let raw = load_raw_config(&args)?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let source = NotifyEventSource::new(raw.backend);
    let request = negotiate(&raw, &source.capabilities(), &*fs)?;

    if args.dry_run {
        print_dry_run(&request);
        return Ok(());
    }

    let sink = BufWriter::new(io::stdout().lock());
    let normalizer = Normalizer::new(sink, fs, FlagCodec::fsevents());

    let summary = Runtime::new(request, source, tokio::io::stdin(), normalizer)
        .with_shutdown(ctrl_c())
        .run()
        .await?;

    info!(?summary, "exiting");
    Ok(())
}

/// Resolves on the first Ctrl-C. Never resolves if the handler cannot be
/// installed; stdin EOF still stops the loop in that case.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Print the resolved request and exit without subscribing.
fn print_dry_run(request: &WatchRequest) {
    let flags = request.flags();

    println!("fsevent-watch dry-run");
    println!("  backend = {}", request.backend());
    println!("  since_when = {}", request.cursor());
    println!("  latency = {:.3}s", request.latency().as_secs_f64());
    if request.backend() == crate::types::Backend::Poll {
        println!("  poll_interval = {:.3}s", request.poll_interval().as_secs_f64());
    }
    println!("  no_defer = {}", flags.no_defer);
    println!("  watch_root = {}", flags.watch_root);
    println!("  file_events = {}", flags.file_events);
    println!();

    println!("paths ({}):", request.paths().len());
    for path in request.paths() {
        println!("  - {path}");
    }

    debug!("dry-run complete (no subscription)");
}
