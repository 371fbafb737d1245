// src/normalize.rs

//! Raw notification → output record.
//!
//! Each [`RawEvent`] is enriched with the wall-clock time of normalization
//! and a best-effort inode number, its bitmask is decoded through the
//! injected [`FlagCodec`], and the result is written as one tab-separated
//! line. Records are written in exactly the order they were delivered; the
//! sink is flushed once per batch.
//!
//! Nothing about an individual event can fail: an object that cannot be
//! opened or stat'ed (already deleted, permission denied) still yields a
//! record, with inode 0. Only writing to the sink can fail.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Timelike};
use tracing::trace;

use crate::flags::FlagCodec;
use crate::fs::FileSystem;
use crate::source::RawEvent;

/// First line of the output stream.
pub const HEADER: &str = "Current_Timestamp\tEvent_ID\tInode\tFlags_Hex\tFlags_String\tPath";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of "now" for record timestamps.
pub trait Clock: Send {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// One output-ready record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    /// Normalization time, truncated to the second.
    pub timestamp: NaiveDateTime,
    pub id: u64,
    /// 0 when the object could not be identified.
    pub inode: u64,
    pub flags: u32,
    pub flag_names: Vec<&'static str>,
    pub path: PathBuf,
}

impl fmt::Display for NormalizedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{:#010x}\t[{}]\t{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.id,
            self.inode,
            self.flags,
            self.flag_names.join(" "),
            self.path.display()
        )
    }
}

pub struct Normalizer<W: Write> {
    sink: W,
    fs: Arc<dyn FileSystem>,
    codec: FlagCodec,
    clock: Box<dyn Clock>,
}

impl<W: Write> fmt::Debug for Normalizer<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("fs", &self.fs)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl<W: Write> Normalizer<W> {
    pub fn new(sink: W, fs: Arc<dyn FileSystem>, codec: FlagCodec) -> Self {
        Self {
            sink,
            fs,
            codec,
            clock: Box::new(LocalClock),
        }
    }

    /// Replace the wall clock (tests use a fixed one).
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.sink, "{HEADER}")?;
        self.sink.flush()
    }

    /// Enrich a single event. Never fails.
    pub fn normalize(&self, event: &RawEvent) -> NormalizedRecord {
        let inode = self.fs.inode(&event.path);
        if inode == 0 {
            trace!(id = event.id, path = ?event.path, "could not identify changed object");
        }
        let now = self.clock.now();

        NormalizedRecord {
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            id: event.id,
            inode,
            flags: event.flags,
            flag_names: self.codec.decode(event.flags),
            path: event.path.clone(),
        }
    }

    /// Write one record per event, in order, then flush. Returns the number
    /// of records written.
    pub fn process_batch(&mut self, batch: &[RawEvent]) -> io::Result<usize> {
        for event in batch {
            let record = self.normalize(event);
            trace!(id = record.id, inode = record.inode, path = ?record.path, "normalized event");
            writeln!(self.sink, "{record}")?;
        }
        self.sink.flush()?;
        Ok(batch.len())
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
