// tests/config_negotiation.rs

mod common;
use crate::common::sample_volume;

use std::path::{Path, PathBuf};

use clap::Parser;

use fsevent_watch::cli::CliArgs;
use fsevent_watch::config::{
    RawWatchConfig, WatchFlags, apply_cli, load_from_path, load_raw_config, negotiate,
};
use fsevent_watch::errors::WatchError;
use fsevent_watch::source::{Capabilities, EventSource, NotifyEventSource};
use fsevent_watch::types::{Backend, Cursor};
use fsevent_watch_test_utils::builders::RawConfigBuilder;

fn native_caps() -> Capabilities {
    NotifyEventSource::new(Backend::Native).capabilities()
}

#[test]
fn defaults_produce_a_valid_request() {
    let fs = sample_volume();
    fs.set_current_dir("/users/alice");

    let request = negotiate(&RawWatchConfig::default(), &native_caps(), &fs).unwrap();

    assert_eq!(request.paths().len(), 1);
    assert_eq!(request.paths()[0].as_path(), Path::new("/Users/Alice"));
    assert_eq!(request.cursor(), Cursor::Now);
    assert!((request.latency().as_secs_f64() - 0.3).abs() < 1e-6);
    assert_eq!(request.flags(), WatchFlags::default());
    assert_eq!(request.backend(), Backend::Native);
}

#[test]
fn supported_flags_pass_through() {
    let fs = sample_volume();
    let raw = RawConfigBuilder::new()
        .path("/volumes/data")
        .no_defer()
        .watch_root()
        .file_events()
        .latency(0.0)
        .since(Cursor::Since(1234))
        .build();

    let request = negotiate(&raw, &native_caps(), &fs).unwrap();

    let flags = request.flags();
    assert!(flags.no_defer && flags.watch_root && flags.file_events);
    assert!(!flags.ignore_self && !flags.mark_self);
    assert!(request.latency().is_zero());
    assert_eq!(request.cursor(), Cursor::Since(1234));
    assert_eq!(request.paths()[0].as_path(), Path::new("/Volumes/Data"));
}

#[test]
fn ignore_self_is_rejected_by_notify_backends() {
    let fs = sample_volume();
    let raw = RawConfigBuilder::new().ignore_self().build();

    let err = negotiate(&raw, &native_caps(), &fs).unwrap_err();

    match err {
        WatchError::UnsupportedFlag { flag, backend } => {
            assert_eq!(flag, "ignore-self");
            assert_eq!(backend, "native");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn mark_self_is_rejected_by_poll_backend() {
    let fs = sample_volume();
    let raw = RawConfigBuilder::new().mark_self().backend(Backend::Poll).build();
    let caps = NotifyEventSource::new(Backend::Poll).capabilities();

    let err = negotiate(&raw, &caps, &fs).unwrap_err();

    assert!(matches!(
        err,
        WatchError::UnsupportedFlag { flag: "mark-self", backend: "poll" }
    ));
    assert_eq!(
        err.to_string(),
        "--mark-self is not supported by the poll event source"
    );
}

#[test]
fn self_flags_accepted_when_source_supports_them() {
    let fs = sample_volume();
    let raw = RawConfigBuilder::new().ignore_self().mark_self().build();

    let request = negotiate(&raw, &Capabilities::all("fake"), &fs).unwrap();

    assert!(request.flags().ignore_self);
    assert!(request.flags().mark_self);
}

#[test]
fn negative_or_non_finite_latency_is_rejected() {
    let fs = sample_volume();

    for bad in [-0.5, f64::NAN, f64::INFINITY] {
        let raw = RawConfigBuilder::new().latency(bad).build();
        let err = negotiate(&raw, &native_caps(), &fs).unwrap_err();
        assert!(
            matches!(err, WatchError::InvalidLatency(_)),
            "latency {bad} gave {err:?}"
        );
    }
}

#[test]
fn zero_poll_interval_is_rejected() {
    let fs = sample_volume();
    let raw = RawConfigBuilder::new()
        .backend(Backend::Poll)
        .poll_interval(0.0)
        .build();

    let err = negotiate(&raw, &native_caps(), &fs).unwrap_err();

    assert!(matches!(err, WatchError::ConfigError(ref msg) if msg.contains("poll_interval")));
}

#[test]
fn load_toml_settings_file() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("watch.toml");
    std::fs::write(
        &path,
        r#"
paths = ["/srv/a", "/srv/b"]
since_when = 987
latency = 1.5
file_events = true
backend = "poll"
poll_interval = 0.25
"#,
    )?;

    let raw = load_from_path(&path)?;

    assert_eq!(raw.paths, vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")]);
    assert_eq!(raw.since_when, Cursor::Since(987));
    assert_eq!(raw.latency, 1.5);
    assert!(raw.file_events);
    assert!(!raw.watch_root);
    assert_eq!(raw.backend, Backend::Poll);
    assert_eq!(raw.poll_interval, 0.25);
    Ok(())
}

#[test]
fn since_when_accepts_now_string() -> anyhow::Result<()> {
    let raw: RawWatchConfig = toml::from_str(r#"since_when = "now""#)?;
    assert_eq!(raw.since_when, Cursor::Now);

    let raw: RawWatchConfig = toml::from_str(r#"since_when = "42""#)?;
    assert_eq!(raw.since_when, Cursor::Since(42));
    Ok(())
}

#[test]
fn unknown_keys_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("watch.toml");
    std::fs::write(&path, "lateny = 2.0\n").unwrap();

    let err = load_from_path(&path).unwrap_err();

    assert!(matches!(err, WatchError::TomlError(_)));
}

#[test]
fn missing_settings_file_is_an_io_error() {
    let err = load_from_path("/definitely/not/here/watch.toml").unwrap_err();

    assert!(matches!(err, WatchError::IoError(_)));
}

#[test]
fn cli_overrides_file_values() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("watch.toml");
    std::fs::write(
        &path,
        "paths = [\"/from/file\"]\nlatency = 2.0\nwatch_root = true\n",
    )?;
    let config_arg = path.to_string_lossy().into_owned();

    let args = CliArgs::try_parse_from([
        "fsevent-watch",
        "--config",
        config_arg.as_str(),
        "--latency",
        "0.1",
        "--file-events",
        "--since-when",
        "77",
        "/from/cli",
    ])?;
    let raw = load_raw_config(&args)?;

    assert_eq!(raw.paths, vec![PathBuf::from("/from/cli")]);
    assert_eq!(raw.latency, 0.1);
    assert!(raw.watch_root, "file flag survives");
    assert!(raw.file_events, "cli flag is added");
    assert_eq!(raw.since_when, Cursor::Since(77));
    Ok(())
}

#[test]
fn cli_without_paths_keeps_file_paths() {
    let mut raw = RawConfigBuilder::new().path("/from/file").build();
    let args = CliArgs::try_parse_from(["fsevent-watch", "--backend", "poll"]).unwrap();

    apply_cli(&mut raw, &args);

    assert_eq!(raw.paths, vec![PathBuf::from("/from/file")]);
    assert_eq!(raw.backend, Backend::Poll);
}

#[test]
fn cli_rejects_bad_cursor() {
    let result = CliArgs::try_parse_from(["fsevent-watch", "--since-when", "yesterday"]);

    assert!(result.is_err());
}
