//! Focus timer state machine. A countdown that cycles between focus and
//! break intervals, and survives restarts by recording its wall-clock start.

use log::info;

/// Default focus interval, in seconds (25 minutes)
pub const FOCUS_SECS: u32 = 25 * 60;
/// Short break interval, in seconds (5 minutes)
pub const SHORT_BREAK_SECS: u32 = 5 * 60;
/// Whole-minute adjustment bounds for the duration controls
const MIN_MINUTES: u32 = 1;
const MAX_MINUTES: u32 = 60;

/// What kind of interval is loaded
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum TimerKind {
    #[default]
    Focus,
    ShortBreak,
    /// Defined but never produced by any transition. Kept because the
    /// persisted format names it; see DESIGN.md.
    LongBreak,
}

impl TimerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::ShortBreak => "shortBreak",
            Self::LongBreak => "longBreak",
        }
    }

    /// Parse a persisted kind. Unknown values fall back to focus rather
    /// than failing the load.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "shortBreak" => Self::ShortBreak,
            "longBreak" => Self::LongBreak,
            _ => Self::Focus,
        }
    }
}

/// Derived phase of the timer. `running` and `paused` are never both set,
/// so this is a total mapping.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// No countdown active, full duration loaded (fresh or ended)
    Idle,
    Running,
    Paused,
}

/// The persistable view of the timer, as stored between runs
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimerSnapshot {
    pub duration_secs: u32,
    pub remaining_secs: u32,
    pub running: bool,
    pub paused: bool,
    /// Wall-clock start of the current run, epoch milliseconds. 0 when not
    /// running.
    pub started_at_ms: i64,
    pub kind: TimerKind,
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self {
            duration_secs: FOCUS_SECS,
            remaining_secs: FOCUS_SECS,
            running: false,
            paused: false,
            started_at_ms: 0,
            kind: TimerKind::Focus,
        }
    }
}

/// The countdown itself. Ticks are driven externally at one per second;
/// remaining time is decremented per tick rather than recomputed from the
/// wall clock, so long runs can drift slightly. Acceptable for a display
/// timer. The wall clock only matters when restoring after a restart.
#[derive(Debug)]
pub struct FocusTimer {
    duration_secs: u32,
    remaining_secs: u32,
    running: bool,
    paused: bool,
    started_at_ms: i64,
    kind: TimerKind,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::from_snapshot(TimerSnapshot::default())
    }
}

impl FocusTimer {
    fn from_snapshot(snapshot: TimerSnapshot) -> Self {
        Self {
            duration_secs: snapshot.duration_secs,
            remaining_secs: snapshot.remaining_secs,
            running: snapshot.running,
            paused: snapshot.paused,
            started_at_ms: snapshot.started_at_ms,
            kind: snapshot.kind,
        }
    }

    /// Rebuild the timer from persisted state. If it was running when the
    /// process went away, catch up on the elapsed wall-clock time; if the
    /// interval finished while we were gone, apply the end-of-interval
    /// transition immediately.
    pub fn restore(snapshot: TimerSnapshot, now_ms: i64) -> Self {
        let mut timer = Self::from_snapshot(snapshot);
        // Clamp in case the persisted values were tampered with
        timer.remaining_secs = timer.remaining_secs.min(timer.duration_secs);
        if timer.running && timer.paused {
            timer.paused = false;
        }

        if timer.running && timer.started_at_ms > 0 {
            let elapsed = ((now_ms - timer.started_at_ms) / 1000).max(0);
            timer.remaining_secs =
                timer.remaining_secs.saturating_sub(elapsed as u32);
            info!(
                "Restored running timer: {}s elapsed while away, {}s left",
                elapsed, timer.remaining_secs
            );
            if timer.remaining_secs == 0 {
                timer.finish();
            }
        }
        timer
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            duration_secs: self.duration_secs,
            remaining_secs: self.remaining_secs,
            running: self.running,
            paused: self.paused,
            started_at_ms: self.started_at_ms,
            kind: self.kind,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.running {
            Phase::Running
        } else if self.paused {
            Phase::Paused
        } else {
            Phase::Idle
        }
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Start from idle, or resume from pause. Either way the run gets a
    /// fresh wall-clock anchor.
    pub fn start(&mut self, now_ms: i64) {
        self.running = true;
        self.paused = false;
        self.started_at_ms = now_ms;
    }

    /// Freeze the countdown at its current value
    pub fn pause(&mut self) {
        self.running = false;
        self.paused = true;
    }

    /// Stop and reload the full duration
    pub fn end(&mut self) {
        self.running = false;
        self.paused = false;
        self.remaining_secs = self.duration_secs;
        self.started_at_ms = 0;
    }

    /// Advance the countdown by one second. Returns true if this tick
    /// finished the interval (so the caller knows to persist and notify).
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.finish();
            true
        } else {
            false
        }
    }

    /// End-of-interval transition: stop, then swap focus and short break.
    /// A long break just stops, since nothing defines what follows it.
    fn finish(&mut self) {
        self.running = false;
        match self.kind {
            TimerKind::Focus => {
                info!("Focus interval finished, loading short break");
                self.kind = TimerKind::ShortBreak;
                self.duration_secs = SHORT_BREAK_SECS;
                self.remaining_secs = SHORT_BREAK_SECS;
            }
            TimerKind::ShortBreak => {
                info!("Break finished, loading focus interval");
                self.kind = TimerKind::Focus;
                self.duration_secs = FOCUS_SECS;
                self.remaining_secs = FOCUS_SECS;
            }
            TimerKind::LongBreak => {}
        }
    }

    /// Load a new duration and drop back to idle
    pub fn set_minutes(&mut self, minutes: u32, kind: TimerKind) {
        let secs = minutes * 60;
        self.duration_secs = secs;
        self.remaining_secs = secs;
        self.running = false;
        self.paused = false;
        self.kind = kind;
    }

    /// Bump the duration up a whole minute, capped at an hour. Disabled
    /// while a countdown is active.
    pub fn increment(&mut self) {
        if self.adjustable() {
            let minutes = self.duration_secs / 60;
            if minutes < MAX_MINUTES {
                self.set_minutes(minutes + 1, TimerKind::Focus);
            }
        }
    }

    /// Bump the duration down a whole minute, floored at one
    pub fn decrement(&mut self) {
        if self.adjustable() {
            let minutes = self.duration_secs / 60;
            if minutes > MIN_MINUTES {
                self.set_minutes(minutes - 1, TimerKind::Focus);
            }
        }
    }

    fn adjustable(&self) -> bool {
        !self.running && !self.paused
    }
}
