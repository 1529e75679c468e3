//! Derived view state: nothing in here persists. Covers the fullscreen
//! presentation surface (with its overlay fallback), the idle-cursor
//! controls-visibility machine, the tab-indicator geometry and the
//! responsive layout class.

use crate::state::Tab;
use log::{info, warn};
use std::time::{Duration, Instant};

/// How long the pointer has to sit still in fullscreen before the controls
/// and cursor hide
const HIDE_AFTER: Duration = Duration::from_secs(3);

/// Full-viewport presentation capability. The host surface may not support
/// real fullscreen (or may silently refuse); callers go through
/// [Presentation], which handles the fallback.
pub trait Surface {
    fn supports_fullscreen(&self) -> bool;
    fn request_fullscreen(&mut self) -> anyhow::Result<()>;
    fn exit_fullscreen(&mut self) -> anyhow::Result<()>;
    /// The surface's actual state, which is authoritative: a request can be
    /// granted and later revoked behind our back.
    fn is_fullscreen(&self) -> bool;
}

/// A surface with no real fullscreen capability. Presentation falls back to
/// the simulated overlay for it.
#[derive(Debug, Default)]
pub struct HeadlessSurface;

impl Surface for HeadlessSurface {
    fn supports_fullscreen(&self) -> bool {
        false
    }

    fn request_fullscreen(&mut self) -> anyhow::Result<()> {
        anyhow::bail!("Fullscreen not supported")
    }

    fn exit_fullscreen(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        false
    }
}

/// Fullscreen bookkeeping over a [Surface]. When the surface can't go
/// fullscreen we simulate it with a full-viewport overlay instead; either
/// way the widget behaves identically.
pub struct Presentation<S> {
    surface: S,
    overlay: bool,
}

impl<S: Surface> Presentation<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            overlay: false,
        }
    }

    /// Fullscreen from the widget's point of view, real or simulated
    pub fn is_fullscreen(&self) -> bool {
        self.overlay || self.surface.is_fullscreen()
    }

    pub fn enter(&mut self) {
        if self.surface.supports_fullscreen() {
            match self.surface.request_fullscreen() {
                Ok(()) => return,
                // e.g. a mobile browser without the installed app
                Err(err) => warn!("Fullscreen request failed: {err}"),
            }
        }
        info!("Falling back to simulated fullscreen overlay");
        self.overlay = true;
    }

    pub fn exit(&mut self) {
        self.overlay = false;
        if let Err(err) = self.surface.exit_fullscreen() {
            warn!("Error exiting fullscreen: {err}");
        }
    }

    /// Reconcile with the surface after a change notification (the host can
    /// leave fullscreen without us asking, e.g. via Escape)
    pub fn sync(&mut self) -> bool {
        self.is_fullscreen()
    }
}

/// Controls/cursor visibility while in fullscreen. Outside fullscreen the
/// controls are always visible. At most one hide deadline is armed at a
/// time; every qualifying pointer event replaces it.
#[derive(Debug)]
pub struct Controls {
    fullscreen: bool,
    visible: bool,
    hide_at: Option<Instant>,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            fullscreen: false,
            visible: true,
            hide_at: None,
        }
    }
}

impl Controls {
    /// Both the buttons and the cursor follow the same visibility
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
        // Entering hides everything until the pointer moves; leaving forces
        // everything back on
        self.visible = !fullscreen;
        self.hide_at = None;
    }

    /// Pointer moved: show the controls and re-arm the inactivity deadline
    pub fn pointer_moved(&mut self, now: Instant) {
        if self.fullscreen {
            self.visible = true;
            self.hide_at = Some(now + HIDE_AFTER);
        }
    }

    /// Pointer left the viewport: hide immediately
    pub fn pointer_left(&mut self) {
        if self.fullscreen {
            self.visible = false;
            self.hide_at = None;
        }
    }

    /// Fire the inactivity deadline if it has passed. Called from the tick
    /// loop; there is no separate timer to leak.
    pub fn poll(&mut self, now: Instant) {
        if let Some(hide_at) = self.hide_at {
            if hide_at <= now {
                self.visible = false;
                self.hide_at = None;
            }
        }
    }
}

/// Fixed geometry for the sliding tab highlight. Slots are declarative,
/// computed from the tab index instead of measuring rendered elements.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TabSlot {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

const SLOT_WIDTH: i32 = 72;
const SLOT_HEIGHT: i32 = 36;
const SLOT_PADDING: i32 = 6;
const SLOT_GAP: i32 = 6;

pub fn indicator_slot(tab: Tab) -> TabSlot {
    let index = match tab {
        Tab::Clock => 0,
        Tab::Timer => 1,
    };
    TabSlot {
        left: SLOT_PADDING + index * (SLOT_WIDTH + SLOT_GAP),
        top: SLOT_PADDING,
        width: SLOT_WIDTH,
        height: SLOT_HEIGHT,
    }
}

/// Presentational layout bucket, derived from the viewport on every resize
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Layout {
    #[default]
    Desktop,
    MobilePortrait,
    MobileLandscape,
}

impl Layout {
    const MOBILE_MAX_WIDTH: u32 = 768;

    pub fn from_viewport(width: u32, height: u32) -> Self {
        if width > Self::MOBILE_MAX_WIDTH {
            Self::Desktop
        } else if height < width {
            Self::MobileLandscape
        } else {
            Self::MobilePortrait
        }
    }

    /// Compact layouts shrink the face and tighten the margins
    pub fn compact(self) -> bool {
        matches!(self, Self::MobileLandscape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controls_hidden_after_inactivity() {
        let start = Instant::now();
        let mut controls = Controls::default();
        controls.set_fullscreen(true);
        assert!(!controls.visible());

        controls.pointer_moved(start);
        assert!(controls.visible());

        // Movement before the deadline re-arms it
        controls.poll(start + Duration::from_secs(2));
        assert!(controls.visible());
        controls.pointer_moved(start + Duration::from_secs(2));
        controls.poll(start + Duration::from_secs(4));
        assert!(controls.visible());

        controls.poll(start + Duration::from_secs(6));
        assert!(!controls.visible());
    }

    #[test]
    fn test_controls_ignore_pointer_outside_fullscreen() {
        let start = Instant::now();
        let mut controls = Controls::default();
        assert!(controls.visible());

        controls.pointer_moved(start);
        controls.poll(start + Duration::from_secs(10));
        assert!(controls.visible(), "never hides outside fullscreen");

        controls.pointer_left();
        assert!(controls.visible());
    }

    #[test]
    fn test_leaving_fullscreen_forces_visible() {
        let mut controls = Controls::default();
        controls.set_fullscreen(true);
        controls.pointer_left();
        assert!(!controls.visible());

        controls.set_fullscreen(false);
        assert!(controls.visible());
        // And the stale deadline must not fire later
        controls.poll(Instant::now() + Duration::from_secs(60));
        assert!(controls.visible());
    }

    #[test]
    fn test_presentation_overlay_fallback() {
        let mut presentation = Presentation::new(HeadlessSurface);
        assert!(!presentation.is_fullscreen());

        presentation.enter();
        assert!(presentation.is_fullscreen(), "overlay stands in");

        presentation.exit();
        assert!(!presentation.is_fullscreen());
    }

    #[test]
    fn test_indicator_slots() {
        let clock = indicator_slot(Tab::Clock);
        let timer = indicator_slot(Tab::Timer);
        assert_eq!(clock.left, 6);
        assert_eq!(timer.left, 6 + 72 + 6);
        assert_eq!(clock.top, timer.top);
        assert_eq!(clock.width, timer.width);
    }

    #[test]
    fn test_layout_buckets() {
        assert_eq!(Layout::from_viewport(1920, 1080), Layout::Desktop);
        assert_eq!(Layout::from_viewport(400, 800), Layout::MobilePortrait);
        assert_eq!(Layout::from_viewport(768, 400), Layout::MobileLandscape);
        assert!(Layout::from_viewport(700, 390).compact());
    }
}
