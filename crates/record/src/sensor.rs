use std::fmt::{self, Display};

/// Tag the hub firmware reserves for blood pressure, which is only ever entered by hand.
pub const BLOOD_PRESSURE_TAG: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SensorTagError {
    #[error("blood pressure is entered manually and never streamed")]
    BloodPressure,
    #[error("unknown sensor type {0:#04x}")]
    Unknown(u8),
}

/// Sensors the hub measures and can stream, tagged as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SensorType {
    Height = 1,
    Weight = 2,
    Temperature = 3,
    HeartRate = 4,
}

impl SensorType {
    /// Checkup order.
    pub const ALL: [SensorType; 4] = [
        SensorType::Height,
        SensorType::Weight,
        SensorType::Temperature,
        SensorType::HeartRate,
    ];

    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            SensorType::Height => "Height",
            SensorType::Weight => "Weight",
            SensorType::Temperature => "Temperature",
            SensorType::HeartRate => "Heart rate",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            SensorType::Height => "cm",
            SensorType::Weight => "kg",
            SensorType::Temperature => "°C",
            SensorType::HeartRate => "BPM",
        }
    }

    /// Position in [`SensorType::ALL`].
    pub const fn index(self) -> usize {
        self as usize - 1
    }
}

impl TryFrom<u8> for SensorType {
    type Error = SensorTagError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            BLOOD_PRESSURE_TAG => Err(SensorTagError::BloodPressure),
            1 => Ok(SensorType::Height),
            2 => Ok(SensorType::Weight),
            3 => Ok(SensorType::Temperature),
            4 => Ok(SensorType::HeartRate),
            _ => Err(SensorTagError::Unknown(value)),
        }
    }
}

impl Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_try_from() {
        for sensor in SensorType::ALL {
            assert_eq!(SensorType::try_from(sensor.tag()), Ok(sensor));
        }
    }

    #[test]
    fn index_matches_checkup_order() {
        for (index, sensor) in SensorType::ALL.into_iter().enumerate() {
            assert_eq!(sensor.index(), index);
        }
    }

    #[test]
    fn blood_pressure_and_unknown_tags_are_rejected() {
        assert_eq!(
            SensorType::try_from(BLOOD_PRESSURE_TAG),
            Err(SensorTagError::BloodPressure)
        );
        assert_eq!(SensorType::try_from(5), Err(SensorTagError::Unknown(5)));
        assert_eq!(
            SensorType::try_from(0xFF),
            Err(SensorTagError::Unknown(0xFF))
        );
    }
}
