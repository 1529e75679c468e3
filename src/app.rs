//! Top-level widget state and the operations the controls expose. The app
//! owns the store, so every mutation persists on the spot; the render side
//! only ever sees a [FrameState] snapshot.

use crate::{
    clock::{self, ClockParts},
    display::FrameState,
    state::{Store, Tab},
    theme::Theme,
    timer::{FocusTimer, Phase, TimerKind},
    view::{Controls, Layout, Presentation, Surface},
    weather::Weather,
};
use chrono::{DateTime, Local};
use log::info;
use std::time::Instant;

pub const TITLE: &str = "CO'WATCH!";

pub struct App<S> {
    store: Store,
    timer: FocusTimer,
    theme: Theme,
    tab: Tab,
    show_seconds: bool,
    weather: Weather,
    presentation: Presentation<S>,
    controls: Controls,
    layout: Layout,
}

impl<S: Surface> App<S> {
    /// Rebuild the widget from persisted state. A timer that was running
    /// when the last process died picks up where the wall clock says it
    /// should be.
    pub fn new(
        store: Store,
        weather: Weather,
        surface: S,
        now_ms: i64,
    ) -> Self {
        let timer = FocusTimer::restore(store.timer_snapshot(), now_ms);
        let theme = Theme::restore(
            store.background_color().as_deref(),
            store.background_type().as_deref(),
        );
        let tab = store.active_tab();
        let show_seconds = store.show_seconds();
        let mut app = Self {
            store,
            timer,
            theme,
            tab,
            show_seconds,
            weather,
            presentation: Presentation::new(surface),
            controls: Controls::default(),
            layout: Layout::default(),
        };
        // The catch-up may have finished an interval; make sure the stored
        // state agrees with what we'll display
        app.save_timer();
        app
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn timer(&self) -> &FocusTimer {
        &self.timer
    }

    pub fn is_fullscreen(&self) -> bool {
        self.presentation.is_fullscreen()
    }

    /// One second of widget time: advance the countdown and let any armed
    /// visibility deadline fire. The clock face needs no bookkeeping; it
    /// re-derives from the wall clock every frame.
    pub fn tick(&mut self, now: Instant) {
        let was_running = self.timer.phase() == Phase::Running;
        if self.timer.tick() {
            info!("Timer interval finished");
        }
        // Only a running timer changes on a tick
        if was_running {
            self.save_timer();
        }
        self.controls.poll(now);
    }

    // === Tab / settings controls ===

    pub fn select_tab(&mut self, tab: Tab) -> anyhow::Result<()> {
        self.tab = tab;
        self.store.set_active_tab(tab)
    }

    pub fn toggle_seconds(&mut self) -> anyhow::Result<()> {
        self.show_seconds = !self.show_seconds;
        self.store.set_show_seconds(self.show_seconds)
    }

    pub fn set_theme(&mut self, theme: Theme) -> anyhow::Result<()> {
        self.theme = theme;
        self.store.set_background(
            &theme.color.to_string(),
            theme.mode.as_str(),
        )
    }

    // === Timer controls ===

    pub fn start_timer(&mut self, now_ms: i64) {
        self.timer.start(now_ms);
        self.save_timer();
    }

    pub fn pause_timer(&mut self) {
        self.timer.pause();
        self.save_timer();
    }

    pub fn end_timer(&mut self) {
        self.timer.end();
        self.save_timer();
    }

    pub fn set_timer_minutes(&mut self, minutes: u32) {
        self.timer.set_minutes(minutes, TimerKind::Focus);
        self.save_timer();
    }

    pub fn increment_timer(&mut self) {
        self.timer.increment();
        self.save_timer();
    }

    pub fn decrement_timer(&mut self) {
        self.timer.decrement();
        self.save_timer();
    }

    /// Persist the timer, logging rather than failing: a full disk must not
    /// stop the countdown
    fn save_timer(&mut self) {
        if let Err(err) = self.store.save_timer(self.timer.snapshot()) {
            log::error!("Error persisting timer state: {err:?}");
        }
    }

    // === Presentation / pointer ===

    pub fn toggle_fullscreen(&mut self) {
        if self.presentation.is_fullscreen() {
            self.presentation.exit();
        } else {
            self.presentation.enter();
        }
        self.controls.set_fullscreen(self.presentation.is_fullscreen());
    }

    /// The host surface changed fullscreen state on its own (e.g. Escape)
    pub fn fullscreen_changed(&mut self) {
        self.controls.set_fullscreen(self.presentation.sync());
    }

    pub fn pointer_moved(&mut self, now: Instant) {
        self.controls.pointer_moved(now);
    }

    pub fn pointer_left(&mut self) {
        self.controls.pointer_left();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.layout = Layout::from_viewport(width, height);
    }

    /// Tap on the weather box: refetch now
    pub fn tap_weather(&mut self) {
        self.weather.refresh();
    }

    /// Snapshot for the frame layer. Reading the weather here also kicks
    /// off the scheduled refresh when the last reading has gone stale.
    pub fn frame_state(&self, now: DateTime<Local>) -> FrameState<'static> {
        FrameState {
            tab: self.tab,
            clock: ClockParts::new(now),
            show_seconds: self.show_seconds,
            countdown_secs: self.timer.remaining_secs(),
            phase: self.timer.phase(),
            date_line: clock::format_date(now),
            weather: self.weather.reading(),
            theme: self.theme,
            controls_visible: self.controls.visible(),
            layout: self.layout,
            title: TITLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        state::{keys, MemoryStorage, Storage},
        theme::Color,
        timer::{Phase, TimerKind, FOCUS_SECS, SHORT_BREAK_SECS},
        view::HeadlessSurface,
        weather::{ResolvedPlace, Weather},
    };
    use std::time::Duration;

    fn weather() -> Weather {
        Weather::new(&ResolvedPlace {
            latitude: 51.5074,
            longitude: -0.1278,
            city: "London".to_owned(),
        })
    }

    fn app_with(storage: MemoryStorage, now_ms: i64) -> App<HeadlessSurface> {
        App::new(
            Store::new(Box::new(storage)),
            weather(),
            HeadlessSurface,
            now_ms,
        )
    }

    #[test]
    fn test_fresh_app_defaults() {
        let app = app_with(MemoryStorage::default(), 0);
        assert_eq!(app.tab(), Tab::Clock);
        assert_eq!(app.theme(), Theme::default());
        assert_eq!(app.timer().phase(), Phase::Idle);
        assert_eq!(app.timer().remaining_secs(), FOCUS_SECS);
    }

    #[test]
    fn test_resume_running_timer_across_restart() {
        let mut storage = MemoryStorage::default();
        storage.save(keys::TIME_LEFT, "100").unwrap();
        storage.save(keys::IS_RUNNING, "true").unwrap();
        storage.save(keys::START_TIME, "1700000000000").unwrap();
        let app = app_with(storage, 1_700_000_030_000);

        assert_eq!(app.timer().remaining_secs(), 70);
        assert_eq!(app.timer().phase(), Phase::Running);
    }

    #[test]
    fn test_interval_that_expired_while_away_cycles_to_break() {
        let mut storage = MemoryStorage::default();
        storage.save(keys::TIME_LEFT, "100").unwrap();
        storage.save(keys::IS_RUNNING, "true").unwrap();
        storage.save(keys::TIMER_TYPE, "focus").unwrap();
        storage.save(keys::START_TIME, "1700000000000").unwrap();
        let app = app_with(storage, 1_700_000_500_000);

        assert_eq!(app.timer().phase(), Phase::Idle);
        assert_eq!(app.timer().kind(), TimerKind::ShortBreak);
        assert_eq!(app.timer().remaining_secs(), SHORT_BREAK_SECS);
    }

    #[test]
    fn test_timer_controls_drive_the_machine() {
        let mut app = app_with(MemoryStorage::default(), 0);
        app.set_timer_minutes(10);
        app.start_timer(5_000);
        app.tick(Instant::now());
        assert_eq!(app.timer().remaining_secs(), 599);

        app.pause_timer();
        assert_eq!(app.timer().phase(), Phase::Paused);
        app.tick(Instant::now());
        assert_eq!(app.timer().remaining_secs(), 599, "paused timer holds");

        app.end_timer();
        assert_eq!(app.timer().remaining_secs(), 600);
        assert_eq!(app.timer().phase(), Phase::Idle);
    }

    #[test]
    fn test_fullscreen_toggle_hides_controls() {
        let now = Instant::now();
        let mut app = app_with(MemoryStorage::default(), 0);
        app.toggle_fullscreen();
        assert!(app.is_fullscreen());

        let state = app.frame_state(Local::now());
        assert!(!state.controls_visible);

        app.pointer_moved(now);
        assert!(app.frame_state(Local::now()).controls_visible);
        app.tick(now + Duration::from_secs(4));
        assert!(!app.frame_state(Local::now()).controls_visible);

        app.toggle_fullscreen();
        assert!(!app.is_fullscreen());
        assert!(app.frame_state(Local::now()).controls_visible);
    }

    #[test]
    fn test_settings_persist_through_restart() {
        let mut app = app_with(MemoryStorage::default(), 0);
        app.select_tab(Tab::Timer).unwrap();
        app.toggle_seconds().unwrap();
        app.set_theme(Theme::solid(Color::YELLOW)).unwrap();
        app.set_timer_minutes(10);

        // Steal the storage contents by round-tripping through the store
        // accessors; a restarted app sees the same values
        let state = app.frame_state(Local::now());
        assert_eq!(state.tab, Tab::Timer);
        assert!(!state.show_seconds);
        assert_eq!(state.theme, Theme::solid(Color::YELLOW));
        assert_eq!(state.countdown_secs, 600);
    }
}
