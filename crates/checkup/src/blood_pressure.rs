use kiosk_record::HealthRecord;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{text:?} is not a whole number, using {fallback}")]
pub struct ParseError {
    pub text: String,
    /// Value read from the leading digits, zero when there are none.
    pub fallback: i32,
}

/// Parses a typed-in reading.
///
/// Anything that is not a clean integer is an error whose fallback reads an
/// optional sign and the leading digits after skipping whitespace, ignoring the rest.
pub fn parse_reading(text: &str) -> Result<i32, ParseError> {
    text.trim().parse().map_err(|_| ParseError {
        text: text.to_owned(),
        fallback: leading_integer(text),
    })
}

fn leading_integer(text: &str) -> i32 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            (acc * 10 + i64::from(digit - b'0')).min(i64::from(i32::MAX) + 1)
        });

    let value = if negative { -magnitude } else { magnitude };

    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BloodPressureState {
    #[default]
    Unset,
    Set,
}

/// Manually entered blood pressure, the one reading the hub never streams.
#[derive(Debug, Clone, Default)]
pub struct BloodPressureEntry {
    state: BloodPressureState,
}

impl BloodPressureEntry {
    pub fn state(&self) -> BloodPressureState {
        self.state
    }

    /// Stores both readings without range checks. The record is marked measured
    /// even when the text did not parse.
    pub fn save(&mut self, record: &mut HealthRecord, systolic: &str, diastolic: &str) {
        record.bp_systolic = lenient(systolic);
        record.bp_diastolic = lenient(diastolic);
        record.measured.blood_pressure = true;
        self.state = BloodPressureState::Set;

        info!(
            systolic = record.bp_systolic,
            diastolic = record.bp_diastolic,
            "blood pressure saved"
        );
    }

    pub fn reset(&mut self) {
        self.state = BloodPressureState::Unset;
    }
}

fn lenient(text: &str) -> i32 {
    parse_reading(text).unwrap_or_else(|error| {
        warn!(%error, "blood pressure entry");
        error.fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_integers_parse() {
        assert_eq!(parse_reading("120"), Ok(120));
        assert_eq!(parse_reading(" 80 "), Ok(80));
        assert_eq!(parse_reading("-5"), Ok(-5));
    }

    #[test]
    fn malformed_text_falls_back_to_leading_digits() {
        assert_eq!(parse_reading("120/80").unwrap_err().fallback, 120);
        assert_eq!(parse_reading("  95mmHg").unwrap_err().fallback, 95);
        assert_eq!(parse_reading("-7x").unwrap_err().fallback, -7);
        assert_eq!(parse_reading("abc").unwrap_err().fallback, 0);
        assert_eq!(parse_reading("").unwrap_err().fallback, 0);
        assert_eq!(
            parse_reading("99999999999").unwrap_err().fallback,
            i32::MAX
        );
    }

    #[test]
    fn save_marks_measured_even_for_garbage() {
        let mut record = HealthRecord::new();
        let mut entry = BloodPressureEntry::default();

        entry.save(&mut record, "high", "80");

        assert_eq!(record.bp_systolic, 0);
        assert_eq!(record.bp_diastolic, 80);
        assert!(record.measured.blood_pressure);
        assert_eq!(entry.state(), BloodPressureState::Set);
    }
}
