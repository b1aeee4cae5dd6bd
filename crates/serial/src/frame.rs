//! Byte layout of the two frames the hub sends.
//!
//! ```text
//! full packet:   0xAA | payload (31 bytes) | xor(payload) | 0x55
//! stream sample: 0xCC | sensor | f32 value | reserved (4) | xor(bytes 1..10) | 0x55
//! ```
//!
//! Nothing is escaped, so a payload byte equal to a start marker restarts capture
//! in the decoder. The hub firmware depends on this layout as-is.

use std::{
    fmt::{self, Display},
    mem::size_of,
};

use kiosk_record::SensorType;

use crate::error::FrameError;

pub const FULL_PACKET_START: u8 = 0xAA;
pub const STREAM_SAMPLE_START: u8 = 0xCC;
pub const FRAME_END: u8 = 0x55;

pub const FULL_PACKET_PAYLOAD_LEN: usize = 4 * size_of::<f32>()
    + size_of::<u16>()
    + 2 * size_of::<f32>()
    + size_of::<u8>()
    + size_of::<u32>();
/// Start marker, payload, checksum and end marker.
pub const FULL_PACKET_FRAME_LEN: usize = FULL_PACKET_PAYLOAD_LEN + 3;
pub const STREAM_SAMPLE_FRAME_LEN: usize = 12;

/// XOR of every byte.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, byte| acc ^ byte)
}

/// Per-sensor validity bits reported with a full packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SensorStatus(pub u8);

impl SensorStatus {
    pub const HEIGHT: u8 = 0x01;
    pub const TEMPERATURE: u8 = 0x02;
    pub const HEART_RATE: u8 = 0x04;
    pub const WEIGHT: u8 = 0x08;

    const fn bit(sensor: SensorType) -> u8 {
        match sensor {
            SensorType::Height => Self::HEIGHT,
            SensorType::Weight => Self::WEIGHT,
            SensorType::Temperature => Self::TEMPERATURE,
            SensorType::HeartRate => Self::HEART_RATE,
        }
    }

    pub const fn is_valid(self, sensor: SensorType) -> bool {
        self.0 & Self::bit(sensor) != 0
    }

    pub fn with(self, sensor: SensorType) -> Self {
        Self(self.0 | Self::bit(sensor))
    }
}

/// Hub uptime in milliseconds when a full packet was measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct HubTimestamp(pub u32);

impl Display for HubTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03} s", self.0 / 1_000, self.0 % 1_000)
    }
}

/// One-shot reading of every hub sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WireFullPacket {
    /// Raw ultrasonic distance before the hub derives a height from it.
    pub distance_cm: f32,
    pub height_cm: f32,
    pub temperature_c: f32,
    pub ambient_temperature_c: f32,
    pub heart_rate: u16,
    pub weight_kg: f32,
    pub bmi: f32,
    pub status: SensorStatus,
    pub timestamp: HubTimestamp,
}

impl WireFullPacket {
    pub fn from_payload(payload: &[u8; FULL_PACKET_PAYLOAD_LEN]) -> Self {
        let mut payload = &payload[..];

        macro_rules! field {
            ($ty:ty) => {{
                let (bytes, rest) = payload.split_at(size_of::<$ty>());
                payload = rest;

                let mut raw = [0u8; size_of::<$ty>()];
                raw.copy_from_slice(bytes);

                <$ty>::from_le_bytes(raw)
            }};
        }

        let packet = Self {
            distance_cm: field!(f32),
            height_cm: field!(f32),
            temperature_c: field!(f32),
            ambient_temperature_c: field!(f32),
            heart_rate: field!(u16),
            weight_kg: field!(f32),
            bmi: field!(f32),
            status: SensorStatus(field!(u8)),
            timestamp: HubTimestamp(field!(u32)),
        };

        debug_assert!(payload.is_empty());

        packet
    }

    /// Validates markers and checksum of a complete full-packet frame.
    pub fn from_frame(frame: &[u8]) -> Result<Self, FrameError> {
        let frame: &[u8; FULL_PACKET_FRAME_LEN] =
            frame.try_into().map_err(|_| FrameError::BadLength {
                expected: FULL_PACKET_FRAME_LEN,
                got: frame.len(),
            })?;

        let start = frame[0];
        let end = frame[FULL_PACKET_FRAME_LEN - 1];
        if start != FULL_PACKET_START || end != FRAME_END {
            return Err(FrameError::Framing { start, end });
        }

        let payload = &frame[1..=FULL_PACKET_PAYLOAD_LEN];
        let expected = frame[FULL_PACKET_PAYLOAD_LEN + 1];
        let actual = checksum(payload);
        if expected != actual {
            return Err(FrameError::ChecksumMismatch { expected, actual });
        }

        let mut fixed = [0u8; FULL_PACKET_PAYLOAD_LEN];
        fixed.copy_from_slice(payload);

        Ok(Self::from_payload(&fixed))
    }

    pub fn to_payload(&self) -> [u8; FULL_PACKET_PAYLOAD_LEN] {
        let fields: [&[u8]; 9] = [
            &self.distance_cm.to_le_bytes(),
            &self.height_cm.to_le_bytes(),
            &self.temperature_c.to_le_bytes(),
            &self.ambient_temperature_c.to_le_bytes(),
            &self.heart_rate.to_le_bytes(),
            &self.weight_kg.to_le_bytes(),
            &self.bmi.to_le_bytes(),
            &[self.status.0],
            &self.timestamp.0.to_le_bytes(),
        ];

        let mut payload = [0u8; FULL_PACKET_PAYLOAD_LEN];
        let mut cursor = 0;

        for field in fields {
            payload[cursor..cursor + field.len()].copy_from_slice(field);
            cursor += field.len();
        }

        payload
    }

    pub fn to_frame(&self) -> [u8; FULL_PACKET_FRAME_LEN] {
        let payload = self.to_payload();

        let mut frame = [0u8; FULL_PACKET_FRAME_LEN];
        frame[0] = FULL_PACKET_START;
        frame[1..=FULL_PACKET_PAYLOAD_LEN].copy_from_slice(&payload);
        frame[FULL_PACKET_PAYLOAD_LEN + 1] = checksum(&payload);
        frame[FULL_PACKET_FRAME_LEN - 1] = FRAME_END;

        frame
    }
}

/// Live value for one sensor, repeated while the hub is streaming.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireStreamSample {
    pub sensor: SensorType,
    pub value: f32,
    /// Covered by the checksum but not interpreted; kept so frames re-encode unchanged.
    pub reserved: [u8; 4],
}

impl WireStreamSample {
    pub fn new(sensor: SensorType, value: f32) -> Self {
        Self {
            sensor,
            value,
            reserved: [0; 4],
        }
    }

    /// Validates checksum, end marker and sensor tag of a complete stream frame.
    pub fn from_frame(frame: &[u8]) -> Result<Self, FrameError> {
        let frame: &[u8; STREAM_SAMPLE_FRAME_LEN] =
            frame.try_into().map_err(|_| FrameError::BadLength {
                expected: STREAM_SAMPLE_FRAME_LEN,
                got: frame.len(),
            })?;

        let start = frame[0];
        let end = frame[11];
        if start != STREAM_SAMPLE_START || end != FRAME_END {
            return Err(FrameError::Framing { start, end });
        }

        let expected = frame[10];
        let actual = checksum(&frame[1..10]);
        if expected != actual {
            return Err(FrameError::ChecksumMismatch { expected, actual });
        }

        Ok(Self {
            sensor: SensorType::try_from(frame[1])?,
            value: f32::from_le_bytes([frame[2], frame[3], frame[4], frame[5]]),
            reserved: [frame[6], frame[7], frame[8], frame[9]],
        })
    }

    pub fn to_frame(&self) -> [u8; STREAM_SAMPLE_FRAME_LEN] {
        let mut frame = [0u8; STREAM_SAMPLE_FRAME_LEN];

        frame[0] = STREAM_SAMPLE_START;
        frame[1] = self.sensor.tag();
        frame[2..6].copy_from_slice(&self.value.to_le_bytes());
        frame[6..10].copy_from_slice(&self.reserved);
        frame[10] = checksum(&frame[1..10]);
        frame[11] = FRAME_END;

        frame
    }
}
