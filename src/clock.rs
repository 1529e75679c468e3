//! Wall-clock face. Nothing here is stored; everything derives from the
//! system clock at the moment of the tick.

use chrono::{DateTime, Local, Timelike};

/// 12-hour clock reading, split into the parts the face renders separately
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ClockParts {
    /// 1-12, never 0
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub meridiem: Meridiem,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::Pm => "PM",
        }
    }
}

impl ClockParts {
    pub fn new(now: DateTime<Local>) -> Self {
        let (is_pm, hours) = now.hour12();
        Self {
            hours,
            minutes: now.minute(),
            seconds: now.second(),
            meridiem: if is_pm { Meridiem::Pm } else { Meridiem::Am },
        }
    }

    /// Format for the clock face, with or without the seconds group
    pub fn face(&self, show_seconds: bool) -> String {
        if show_seconds {
            format!(
                "{:0>2}:{:0>2}:{:0>2} {}",
                self.hours,
                self.minutes,
                self.seconds,
                self.meridiem.as_str()
            )
        } else {
            format!(
                "{:0>2}:{:0>2} {}",
                self.hours,
                self.minutes,
                self.meridiem.as_str()
            )
        }
    }
}

/// Date line for the date box, e.g. `Monday, 25`
pub fn format_date(now: DateTime<Local>) -> String {
    now.format("%A, %-d").to_string()
}

/// `MM:SS` for the countdown face
pub fn format_countdown(secs: u32) -> String {
    format!("{:0>2}:{:0>2}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32, sec: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 27, hour, min, sec).unwrap()
    }

    #[test]
    fn test_clock_parts() {
        let parts = ClockParts::new(at(0, 5, 9));
        assert_eq!(parts.hours, 12);
        assert_eq!(parts.meridiem, Meridiem::Am);
        assert_eq!(parts.face(true), "12:05:09 AM");
        assert_eq!(parts.face(false), "12:05 AM");

        let parts = ClockParts::new(at(13, 30, 0));
        assert_eq!(parts.hours, 1);
        assert_eq!(parts.meridiem, Meridiem::Pm);
        assert_eq!(parts.face(false), "01:30 PM");

        let parts = ClockParts::new(at(12, 0, 0));
        assert_eq!(parts.hours, 12);
        assert_eq!(parts.meridiem, Meridiem::Pm);
    }

    #[test]
    fn test_format_date() {
        // 2024-05-27 was a Monday
        assert_eq!(format_date(at(10, 0, 0)), "Monday, 27");
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(1500), "25:00");
        assert_eq!(format_countdown(65), "01:05");
        assert_eq!(format_countdown(0), "00:00");
    }
}
