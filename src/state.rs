//! Persisted per-installation state. Everything the widget remembers across
//! restarts lives in a flat string key/value map behind the [Storage] trait,
//! so the store never touches ambient global storage directly.

use crate::timer::{TimerKind, TimerSnapshot, FOCUS_SECS};
use anyhow::Context;
use log::{error, info};
use std::{collections::BTreeMap, fs, path::PathBuf};

/// Persisted keys. Values all round-trip through strings: booleans as
/// "true"/"false", numbers as decimal text.
pub mod keys {
    pub const ACTIVE_TAB: &str = "activeTab";
    pub const BACKGROUND_COLOR: &str = "backgroundColor";
    pub const BACKGROUND_TYPE: &str = "backgroundType";
    pub const SHOW_SECONDS: &str = "showSeconds";
    pub const TIMER_DURATION: &str = "timerDuration";
    pub const TIME_LEFT: &str = "timeLeft";
    pub const TIMER_TYPE: &str = "timerType";
    pub const IS_RUNNING: &str = "isRunning";
    pub const IS_PAUSED: &str = "isPaused";
    pub const START_TIME: &str = "startTime";
}

/// String key/value persistence. Injected into the store rather than
/// referenced as a global, so tests can swap in memory-backed storage.
pub trait Storage {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Storage backed by a single JSON file of string pairs
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStorage {
    pub fn load(path: PathBuf) -> Self {
        // Shitty try block
        let helper = || {
            let contents = fs::read(&path)?;
            Ok::<BTreeMap<String, String>, anyhow::Error>(
                serde_json::from_slice(&contents)?,
            )
        };
        let values = match helper() {
            Ok(values) => values,
            Err(err) => {
                // First run or a mangled file; either way start fresh
                error!(
                    "Error loading settings from {}: {}",
                    path.display(),
                    err
                );
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    fn flush(&self) -> anyhow::Result<()> {
        let serialized = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, &serialized).with_context(|| {
            format!("Error saving settings to {}", self.path.display())
        })
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        info!("Saving {key} = {value}");
        self.values.insert(key.to_owned(), value.to_owned());
        self.flush()
    }
}

/// In-memory storage, for tests
#[derive(Debug, Default)]
pub struct MemoryStorage(BTreeMap<String, String>);

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.0.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Which face the widget is showing
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Tab {
    #[default]
    Clock,
    Timer,
}

impl Tab {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clock => "clock",
            Self::Timer => "timer",
        }
    }

    fn from_str_lossy(s: &str) -> Self {
        match s {
            "timer" => Self::Timer,
            _ => Self::Clock,
        }
    }
}

/// Typed access to the persisted map. Every setter writes through
/// immediately; a failed write is logged by the caller and never fatal.
pub struct Store {
    storage: Box<dyn Storage>,
}

impl Store {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    fn bool(&self, key: &str, default: bool) -> bool {
        match self.storage.load(key).as_deref() {
            Some("true") => true,
            Some("false") => false,
            _ => default,
        }
    }

    /// Read a numeric value, falling back on anything unparseable
    fn number<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.storage
            .load(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    pub fn active_tab(&self) -> Tab {
        self.storage
            .load(keys::ACTIVE_TAB)
            .map(|value| Tab::from_str_lossy(&value))
            .unwrap_or_default()
    }

    pub fn set_active_tab(&mut self, tab: Tab) -> anyhow::Result<()> {
        self.storage.save(keys::ACTIVE_TAB, tab.as_str())
    }

    pub fn show_seconds(&self) -> bool {
        self.bool(keys::SHOW_SECONDS, true)
    }

    pub fn set_show_seconds(&mut self, show: bool) -> anyhow::Result<()> {
        self.storage
            .save(keys::SHOW_SECONDS, if show { "true" } else { "false" })
    }

    pub fn background_color(&self) -> Option<String> {
        self.storage.load(keys::BACKGROUND_COLOR)
    }

    pub fn background_type(&self) -> Option<String> {
        self.storage.load(keys::BACKGROUND_TYPE)
    }

    pub fn set_background(
        &mut self,
        color: &str,
        mode: &str,
    ) -> anyhow::Result<()> {
        self.storage.save(keys::BACKGROUND_COLOR, color)?;
        self.storage.save(keys::BACKGROUND_TYPE, mode)
    }

    pub fn timer_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            duration_secs: self.number(keys::TIMER_DURATION, FOCUS_SECS),
            remaining_secs: self.number(keys::TIME_LEFT, FOCUS_SECS),
            running: self.bool(keys::IS_RUNNING, false),
            paused: self.bool(keys::IS_PAUSED, false),
            started_at_ms: self.number(keys::START_TIME, 0),
            kind: self
                .storage
                .load(keys::TIMER_TYPE)
                .map(|value| TimerKind::from_str_lossy(&value))
                .unwrap_or_default(),
        }
    }

    /// Write the whole timer back out. Called after every timer mutation.
    pub fn save_timer(
        &mut self,
        snapshot: TimerSnapshot,
    ) -> anyhow::Result<()> {
        let storage = &mut self.storage;
        storage
            .save(keys::TIMER_DURATION, &snapshot.duration_secs.to_string())?;
        storage.save(keys::TIME_LEFT, &snapshot.remaining_secs.to_string())?;
        storage.save(keys::TIMER_TYPE, snapshot.kind.as_str())?;
        storage.save(
            keys::IS_RUNNING,
            if snapshot.running { "true" } else { "false" },
        )?;
        storage.save(
            keys::IS_PAUSED,
            if snapshot.paused { "true" } else { "false" },
        )?;
        storage.save(keys::START_TIME, &snapshot.started_at_ms.to_string())
    }
}
