//! Deadline checks for the polling loop, so nothing in it ever sleeps to wait.

use std::time::{Duration, Instant};

pub const PRINTER_MISSING_DISPLAY: Duration = Duration::from_millis(2_000);
pub const PRINT_FAILED_DISPLAY: Duration = Duration::from_millis(2_000);
pub const REPORT_SENT_DISPLAY: Duration = Duration::from_millis(1_500);
pub const DATA_SAVED_DISPLAY: Duration = Duration::from_millis(1_000);
pub const CONNECTIVITY_CHECK_PERIOD: Duration = Duration::from_millis(2_000);

/// Fires once the period has elapsed since it last fired.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    last: Instant,
}

impl Interval {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self { period, last: now }
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) > self.period {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// A transient status message that stays up until its deadline passes.
#[derive(Debug, Clone, Default)]
pub struct StatusMessage {
    shown: Option<(String, Instant)>,
}

impl StatusMessage {
    /// Replaces whatever is shown.
    pub fn show(&mut self, text: impl Into<String>, duration: Duration, now: Instant) {
        self.shown = Some((text.into(), now + duration));
    }

    pub fn current(&self) -> Option<&str> {
        self.shown.as_ref().map(|(text, _)| text.as_str())
    }

    /// Takes the message down once expired, returning it.
    pub fn expire(&mut self, now: Instant) -> Option<String> {
        let expired = matches!(&self.shown, Some((_, until)) if now >= *until);

        if expired {
            self.shown.take().map(|(text, _)| text)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_fires_after_its_period() {
        let start = Instant::now();
        let mut interval = Interval::new(CONNECTIVITY_CHECK_PERIOD, start);

        assert!(!interval.tick(start + Duration::from_millis(1_000)));
        assert!(!interval.tick(start + CONNECTIVITY_CHECK_PERIOD));
        assert!(interval.tick(start + Duration::from_millis(2_001)));
        assert!(!interval.tick(start + Duration::from_millis(3_000)));
        assert!(interval.tick(start + Duration::from_millis(4_002)));
    }

    #[test]
    fn status_message_expires_at_its_deadline() {
        let start = Instant::now();
        let mut status = StatusMessage::default();

        status.show("Data saved", DATA_SAVED_DISPLAY, start);

        assert_eq!(status.current(), Some("Data saved"));
        assert_eq!(status.expire(start + Duration::from_millis(999)), None);
        assert_eq!(
            status.expire(start + DATA_SAVED_DISPLAY),
            Some("Data saved".to_owned())
        );
        assert_eq!(status.current(), None);
    }

    #[test]
    fn newer_message_replaces_older_one() {
        let start = Instant::now();
        let mut status = StatusMessage::default();

        status.show("Printer not connected!", PRINTER_MISSING_DISPLAY, start);
        status.show("Report sent", REPORT_SENT_DISPLAY, start);

        assert_eq!(status.current(), Some("Report sent"));
        assert_eq!(status.expire(start + REPORT_SENT_DISPLAY), Some("Report sent".to_owned()));
    }
}
