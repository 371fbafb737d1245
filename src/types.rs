use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Position in the event source's history from which notifications resume.
///
/// - `Now`: only report changes that happen after subscribing (default).
/// - `Since(id)`: resume after the given event id; ids handed out by the
///   subscription continue above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "CursorRepr")]
pub enum Cursor {
    Now,
    Since(u64),
}

impl Cursor {
    /// Last id considered "already seen"; new ids start right after it.
    pub fn base_id(self) -> u64 {
        match self {
            Cursor::Now => 0,
            Cursor::Since(id) => id,
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::Now
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Now => f.write_str("now"),
            Cursor::Since(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for Cursor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("now") {
            return Ok(Cursor::Now);
        }
        s.parse::<u64>().map(Cursor::Since).map_err(|_| {
            format!("invalid since_when: {s} (expected \"now\" or an event id)")
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CursorRepr {
    Id(u64),
    Text(String),
}

impl TryFrom<CursorRepr> for Cursor {
    type Error = String;

    fn try_from(repr: CursorRepr) -> Result<Self, Self::Error> {
        match repr {
            CursorRepr::Id(id) => Ok(Cursor::Since(id)),
            CursorRepr::Text(s) => s.parse(),
        }
    }
}

/// Which change-notification mechanism backs the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Platform-native notifications (FSEvents, inotify, ReadDirectoryChangesW).
    Native,
    /// Portable poller that rescans the watched trees on an interval.
    Poll,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Native
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Native => f.write_str("native"),
            Backend::Poll => f.write_str("poll"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(Backend::Native),
            "poll" => Ok(Backend::Poll),
            other => Err(format!(
                "invalid backend: {other} (expected \"native\" or \"poll\")"
            )),
        }
    }
}
