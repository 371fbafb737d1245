// tests/normalizer.rs

mod common;
use crate::common::{init_tracing, sample_volume, shared};

use std::path::Path;

use fsevent_watch::flags::{FlagCodec, bits};
use fsevent_watch::normalize::{HEADER, Normalizer};
use fsevent_watch_test_utils::builders::{batch, raw_event};
use fsevent_watch_test_utils::sink::{FixedClock, SharedBuffer};

const README: &str = "/Users/Alice/Projects/Demo/README.md";
const MAIN_RS: &str = "/Users/Alice/Projects/Demo/src/main.rs";

#[test]
fn header_is_tab_separated() {
    let fs = sample_volume();
    let out = SharedBuffer::new();
    let mut normalizer = Normalizer::new(out.clone(), shared(&fs), FlagCodec::fsevents());

    normalizer.write_header().unwrap();

    assert_eq!(
        out.lines(),
        vec!["Current_Timestamp\tEvent_ID\tInode\tFlags_Hex\tFlags_String\tPath"]
    );
    assert_eq!(out.lines()[0], HEADER);
}

#[test]
fn record_line_format() {
    init_tracing();
    let fs = sample_volume();
    let ino = fs.identity_of(README).unwrap().ino;
    let out = SharedBuffer::new();
    let mut normalizer = Normalizer::new(out.clone(), shared(&fs), FlagCodec::fsevents())
        .with_clock(FixedClock::sample());

    normalizer
        .process_batch(&[raw_event(42, bits::ITEM_MODIFIED | bits::ITEM_IS_FILE, README)])
        .unwrap();

    assert_eq!(
        out.lines(),
        vec![format!(
            "2024-03-05 14:07:09\t42\t{ino}\t0x00011000\t[ItemModified ItemIsFile]\t{README}"
        )]
    );
}

#[test]
fn zero_flags_render_as_empty_list() {
    let fs = sample_volume();
    let out = SharedBuffer::new();
    let mut normalizer = Normalizer::new(out.clone(), shared(&fs), FlagCodec::fsevents())
        .with_clock(FixedClock::sample());

    normalizer
        .process_batch(&[raw_event(1, 0, "/Users/Alice/Projects/Demo")])
        .unwrap();

    let line = out.lines().remove(0);
    let fields: Vec<&str> = line.split('\t').collect();
    assert_eq!(fields.len(), 6);
    assert_eq!(fields[3], "0x00000000");
    assert_eq!(fields[4], "[]");
}

#[test]
fn records_keep_batch_order() {
    let fs = sample_volume();
    let out = SharedBuffer::new();
    let mut normalizer = Normalizer::new(out.clone(), shared(&fs), FlagCodec::fsevents())
        .with_clock(FixedClock::sample());

    let written = normalizer
        .process_batch(&batch(
            5,
            &[
                (bits::ITEM_CREATED, MAIN_RS),
                (bits::ITEM_MODIFIED, README),
                (bits::ITEM_REMOVED, MAIN_RS),
            ],
        ))
        .unwrap();

    assert_eq!(written, 3);
    let ids: Vec<String> = out
        .lines()
        .iter()
        .map(|l| l.split('\t').nth(1).unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["5", "6", "7"]);
}

#[test]
fn repeated_paths_are_not_coalesced() {
    let fs = sample_volume();
    let out = SharedBuffer::new();
    let mut normalizer = Normalizer::new(out.clone(), shared(&fs), FlagCodec::fsevents());

    normalizer
        .process_batch(&batch(
            1,
            &[(bits::ITEM_MODIFIED, README), (bits::ITEM_MODIFIED, README)],
        ))
        .unwrap();

    assert_eq!(out.lines().len(), 2);
}

#[test]
fn missing_object_still_yields_record_with_inode_zero() {
    let fs = sample_volume();
    fs.remove(MAIN_RS);
    let normalizer = Normalizer::new(SharedBuffer::new(), shared(&fs), FlagCodec::fsevents());

    let record = normalizer.normalize(&raw_event(9, bits::ITEM_REMOVED, MAIN_RS));

    assert_eq!(record.inode, 0);
    assert_eq!(record.id, 9);
    assert_eq!(record.flag_names, vec!["ItemRemoved"]);
    assert_eq!(record.path, Path::new(MAIN_RS));
}

#[test]
fn unopenable_object_falls_back_to_stat() {
    let fs = sample_volume();
    fs.deny_open(README);
    let expected = fs.identity_of(README).unwrap().ino;
    let normalizer = Normalizer::new(SharedBuffer::new(), shared(&fs), FlagCodec::fsevents());

    let record = normalizer.normalize(&raw_event(3, bits::ITEM_INODE_META_MOD, README));

    assert_eq!(record.inode, expected);
}

#[test]
fn timestamp_is_truncated_to_seconds() {
    let fs = sample_volume();
    let normalizer = Normalizer::new(SharedBuffer::new(), shared(&fs), FlagCodec::fsevents())
        .with_clock(FixedClock::sample());

    let record = normalizer.normalize(&raw_event(1, 0, README));

    assert_eq!(record.timestamp.and_utc().timestamp_subsec_nanos(), 0);
    assert_eq!(record.timestamp.format("%H:%M:%S").to_string(), "14:07:09");
}

#[test]
fn sink_is_flushed_once_per_batch() {
    let fs = sample_volume();
    let out = SharedBuffer::new();
    let mut normalizer = Normalizer::new(out.clone(), shared(&fs), FlagCodec::fsevents());

    normalizer
        .process_batch(&batch(1, &[(0, README), (0, MAIN_RS), (0, README)]))
        .unwrap();
    normalizer.process_batch(&batch(4, &[(0, README)])).unwrap();

    assert_eq!(out.flush_count(), 2);
}

#[cfg(unix)]
#[test]
fn real_file_inode_matches_metadata() -> anyhow::Result<()> {
    use std::os::unix::fs::MetadataExt;
    use std::sync::Arc;

    use fsevent_watch::fs::RealFileSystem;

    let tmp = tempfile::tempdir()?;
    let file = tmp.path().join("data.bin");
    std::fs::write(&file, b"payload")?;
    let normalizer = Normalizer::new(
        SharedBuffer::new(),
        Arc::new(RealFileSystem),
        FlagCodec::fsevents(),
    );

    let record = normalizer.normalize(&raw_event(1, bits::ITEM_CREATED, file.to_str().unwrap()));

    assert_eq!(record.inode, std::fs::metadata(&file)?.ino());

    let gone = normalizer.normalize(&raw_event(
        2,
        bits::ITEM_REMOVED,
        tmp.path().join("never-existed").to_str().unwrap(),
    ));
    assert_eq!(gone.inode, 0);
    Ok(())
}

#[test]
fn plain_vec_sink_can_be_recovered() {
    let fs = sample_volume();
    let mut normalizer = Normalizer::new(Vec::new(), shared(&fs), FlagCodec::fsevents())
        .with_clock(FixedClock::sample());

    normalizer.write_header().unwrap();
    assert_eq!(normalizer.sink().len(), HEADER.len() + 1);
    normalizer
        .process_batch(&[raw_event(1, bits::ITEM_CREATED, README)])
        .unwrap();

    let text = String::from_utf8(normalizer.into_inner()).unwrap();
    assert!(text.starts_with(HEADER));
    assert!(text.ends_with(&format!("[ItemCreated]\t{README}\n")));
}

#[cfg(unix)]
#[test]
fn named_pipe_does_not_block_normalize() -> anyhow::Result<()> {
    use std::os::unix::fs::MetadataExt;
    use std::process::Command;
    use std::sync::{Arc, mpsc};
    use std::time::Duration;

    use fsevent_watch::fs::RealFileSystem;

    let tmp = tempfile::tempdir()?;
    let pipe = tmp.path().join("events.fifo");
    let status = Command::new("mkfifo").arg(&pipe).status()?;
    assert!(status.success(), "mkfifo failed");
    let expected = std::fs::symlink_metadata(&pipe)?.ino();

    let event = raw_event(1, bits::ITEM_CREATED, pipe.to_str().unwrap());
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let normalizer = Normalizer::new(
            SharedBuffer::new(),
            Arc::new(RealFileSystem),
            FlagCodec::fsevents(),
        );
        let _ = tx.send(normalizer.normalize(&event).inode);
    });

    let inode = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("normalize blocked on a named pipe");
    assert_eq!(inode, expected);
    Ok(())
}
