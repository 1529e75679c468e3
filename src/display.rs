//! Frame layer. Widget state is laid out as positioned text items, diffed
//! against the previous frame, and only pushed to the draw target when
//! something actually changed. The target itself is just any
//! [DrawTarget]; the binary renders into an in-memory framebuffer.

use crate::{
    clock::{format_countdown, ClockParts},
    state::Tab,
    theme::Theme,
    timer::Phase,
    view::Layout,
    weather::Reading,
};
use anyhow::anyhow;
use embedded_graphics::{
    draw_target::DrawTarget,
    framebuffer::{buffer_size, Framebuffer},
    geometry::Point,
    mono_font::{iso_8859_1::FONT_10X20, iso_8859_1::FONT_6X13, MonoTextStyle},
    pixelcolor::{
        raw::{LittleEndian, RawU1},
        BinaryColor,
    },
    text::{Baseline, Text},
    Drawable,
};
use log::trace;
use std::mem;

/// Frame dimensions, in pixels
pub const FRAME_WIDTH: i32 = 250;
pub const FRAME_HEIGHT: i32 = 122;
const MARGIN: i32 = 2;

/// Framebuffer matching the frame dimensions, for headless rendering
pub type WidgetFramebuffer = Framebuffer<
    BinaryColor,
    RawU1,
    LittleEndian,
    { FRAME_WIDTH as usize },
    { FRAME_HEIGHT as usize },
    { buffer_size::<BinaryColor>(FRAME_WIDTH as usize, FRAME_HEIGHT as usize) },
>;

/// Everything a single frame is derived from
#[derive(Clone, Debug)]
pub struct FrameState<'a> {
    pub tab: Tab,
    pub clock: ClockParts,
    pub show_seconds: bool,
    pub countdown_secs: u32,
    pub phase: Phase,
    pub date_line: String,
    pub weather: Reading,
    pub theme: Theme,
    pub controls_visible: bool,
    pub layout: Layout,
    pub title: &'a str,
}

/// Proxy for font sizes, so frame items stay comparable
#[derive(Copy, Clone, Debug, PartialEq)]
enum FontSize {
    Medium,
    Large,
}

impl FontSize {
    fn char_width(self) -> i32 {
        match self {
            Self::Medium => 6,
            Self::Large => 10,
        }
    }
}

#[derive(Debug, PartialEq)]
struct TextItem {
    text: String,
    location: Point,
    font_size: FontSize,
}

/// Lay the widget out as text items. Pure, so the layout is testable
/// without a draw target.
fn build_frame(state: &FrameState) -> Vec<TextItem> {
    let mut items = Vec::new();
    let mut add = |text: String, x: i32, y: i32, font_size: FontSize| {
        items.push(TextItem {
            text,
            location: Point::new(x, y),
            font_size,
        });
    };
    let centered = |text: &str, font_size: FontSize| {
        let width = text.chars().count() as i32 * font_size.char_width();
        (FRAME_WIDTH - width) / 2
    };

    // Title sits out compact layouts entirely, and hides with the controls
    if state.controls_visible && !state.layout.compact() {
        let x = centered(state.title, FontSize::Medium);
        add(state.title.to_owned(), x, MARGIN, FontSize::Medium);
    }

    // Main face: clock or countdown, centered
    let face = match state.tab {
        Tab::Clock => state.clock.face(state.show_seconds),
        Tab::Timer => format_countdown(state.countdown_secs),
    };
    let x = centered(&face, FontSize::Large);
    add(face, x, (FRAME_HEIGHT - 20) / 2, FontSize::Large);

    if state.controls_visible {
        // Weather box, bottom left. An in-flight fetch shows a placeholder;
        // a failed one shows a bang instead of a stale number.
        let weather = if state.weather.loading {
            "--°C".to_owned()
        } else if state.weather.error {
            "!°C".to_owned()
        } else {
            format!("{}°C", state.weather.temperature_c)
        };
        let bottom = FRAME_HEIGHT - 13 - MARGIN;
        add(weather, MARGIN, bottom, FontSize::Medium);

        // Date box, bottom right
        let x = FRAME_WIDTH
            - state.date_line.chars().count() as i32
                * FontSize::Medium.char_width()
            - MARGIN;
        add(state.date_line.clone(), x, bottom, FontSize::Medium);

        // Timer controls hint, bottom center
        if state.tab == Tab::Timer {
            let hint = match state.phase {
                Phase::Idle => "Start Focus",
                Phase::Running => "Pause / End",
                Phase::Paused => "Continue / End",
            };
            add(
                hint.to_owned(),
                centered(hint, FontSize::Medium),
                bottom - 13 - MARGIN,
                FontSize::Medium,
            );
        }
    }

    items
}

/// Owns the draw target and the current frame, and redraws only on change.
/// The diffing matters because pushing a frame is the expensive part of the
/// tick.
pub struct Screen<D> {
    target: D,
    text_buffer: Vec<TextItem>,
    /// The frame being assembled this tick. Empty except mid-tick.
    next_text_buffer: Vec<TextItem>,
}

impl<D> Screen<D>
where
    D: DrawTarget<Color = BinaryColor>,
    D::Error: std::fmt::Debug,
{
    pub fn new(target: D) -> Self {
        Self {
            target,
            text_buffer: Vec::new(),
            next_text_buffer: Vec::new(),
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    /// Render one frame of widget state. Returns whether anything was
    /// actually drawn.
    pub fn tick(&mut self, state: &FrameState) -> anyhow::Result<bool> {
        self.next_text_buffer = build_frame(state);
        self.draw_text(state.theme)
    }

    /// If text has changed, flush the assembled frame to the target. If
    /// nothing changed, do nothing. Return whether or not the text changed.
    fn draw_text(&mut self, theme: Theme) -> anyhow::Result<bool> {
        if self.next_text_buffer == self.text_buffer {
            self.next_text_buffer.clear();
            return Ok(false);
        }
        trace!(
            "Text changed: old={:?}; new={:?}",
            self.text_buffer,
            self.next_text_buffer
        );
        self.text_buffer = mem::take(&mut self.next_text_buffer);

        // One bit per pixel: light themes get dark text on a lit field
        let (foreground, background) = if theme.light_text() {
            (BinaryColor::On, BinaryColor::Off)
        } else {
            (BinaryColor::Off, BinaryColor::On)
        };
        self.target.clear(background).map_err(map_error)?;
        for text_item in &self.text_buffer {
            let style = match text_item.font_size {
                FontSize::Medium => MonoTextStyle::new(&FONT_6X13, foreground),
                FontSize::Large => MonoTextStyle::new(&FONT_10X20, foreground),
            };
            Text::with_baseline(
                &text_item.text,
                text_item.location,
                style,
                Baseline::Top,
            )
            .draw(&mut self.target)
            .map_err(map_error)?;
        }
        Ok(true)
    }
}

/// Draw target errors aren't guaranteed to implement Error, so map manually
fn map_error<E: std::fmt::Debug>(error: E) -> anyhow::Error {
    anyhow!("{error:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::Meridiem, timer::FOCUS_SECS};
    use chrono::{Local, TimeZone};

    fn frame_state() -> FrameState<'static> {
        FrameState {
            tab: Tab::Clock,
            clock: ClockParts::new(
                Local.with_ymd_and_hms(2024, 5, 27, 10, 23, 45).unwrap(),
            ),
            show_seconds: true,
            countdown_secs: FOCUS_SECS,
            phase: Phase::Idle,
            date_line: "Monday, 27".to_owned(),
            weather: Reading::default(),
            theme: Theme::default(),
            controls_visible: true,
            layout: Layout::Desktop,
            title: "CO'WATCH!",
        }
    }

    fn texts(items: &[TextItem]) -> Vec<&str> {
        items.iter().map(|item| item.text.as_str()).collect()
    }

    #[test]
    fn test_clock_frame() {
        let state = frame_state();
        assert_eq!(state.clock.meridiem, Meridiem::Am);
        let items = build_frame(&state);
        assert_eq!(
            texts(&items),
            vec!["CO'WATCH!", "10:23:45 AM", "22°C", "Monday, 27"]
        );

        // The face is horizontally centered
        let face = &items[1];
        assert_eq!(face.font_size, FontSize::Large);
        assert_eq!(face.location.x, (FRAME_WIDTH - 11 * 10) / 2);
    }

    #[test]
    fn test_timer_frame_shows_hint() {
        let mut state = frame_state();
        state.tab = Tab::Timer;
        state.countdown_secs = 70;
        state.phase = Phase::Running;
        let items = build_frame(&state);
        assert!(texts(&items).contains(&"01:10"));
        assert!(texts(&items).contains(&"Pause / End"));
    }

    #[test]
    fn test_hidden_controls_leave_only_the_face() {
        let mut state = frame_state();
        state.controls_visible = false;
        state.show_seconds = false;
        let items = build_frame(&state);
        assert_eq!(texts(&items), vec!["10:23 AM"]);
    }

    #[test]
    fn test_weather_glyphs() {
        let mut state = frame_state();
        state.weather.error = true;
        assert!(texts(&build_frame(&state)).contains(&"!°C"));

        state.weather.error = false;
        state.weather.loading = true;
        assert!(texts(&build_frame(&state)).contains(&"--°C"));
    }

    #[test]
    fn test_screen_draws_only_on_change() {
        let mut screen = Screen::new(WidgetFramebuffer::new());
        let state = frame_state();
        assert!(screen.tick(&state).unwrap());
        assert!(!screen.tick(&state).unwrap(), "no change, no redraw");

        let mut changed = frame_state();
        changed.tab = Tab::Timer;
        assert!(screen.tick(&changed).unwrap());
    }
}
