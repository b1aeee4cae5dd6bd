use std::ops::RangeInclusive;

use kiosk_record::{bmi, SensorType};
use kiosk_serial::{HubTimestamp, SensorStatus, WireFullPacket, WireStreamSample};
use rand::Rng;

/// Distance from the ultrasonic sensor down to the platform.
const MOUNT_HEIGHT_CM: f32 = 220.0;

/// Resting value and plausible span of one simulated sensor.
#[derive(Debug, Clone)]
struct Profile {
    baseline: f32,
    range: RangeInclusive<f32>,
    /// Largest change between two consecutive readings.
    step: f32,
}

fn profile(sensor: SensorType) -> Profile {
    match sensor {
        SensorType::Height => Profile {
            baseline: 170.0,
            range: 140.0..=200.0,
            step: 0.4,
        },
        SensorType::Weight => Profile {
            baseline: 70.0,
            range: 40.0..=120.0,
            step: 0.2,
        },
        SensorType::Temperature => Profile {
            baseline: 36.5,
            range: 35.0..=42.0,
            step: 0.05,
        },
        SensorType::HeartRate => Profile {
            baseline: 72.0,
            range: 50.0..=120.0,
            step: 2.0,
        },
    }
}

/// Sensor values that wander around their baselines, like a patient shifting on
/// the platform.
pub struct SimulatedSensors<R> {
    rng: R,
    values: [f32; 4],
}

impl<R: Rng> SimulatedSensors<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            values: SensorType::ALL.map(|sensor| profile(sensor).baseline),
        }
    }

    /// Moves the sensor's value by a small random step and returns it.
    pub fn read(&mut self, sensor: SensorType) -> f32 {
        let Profile { range, step, .. } = profile(sensor);
        let value = &mut self.values[sensor.index()];

        *value = (*value + self.rng.random_range(-step..=step)).clamp(*range.start(), *range.end());

        if sensor == SensorType::HeartRate {
            value.round()
        } else {
            *value
        }
    }

    pub fn stream_sample(&mut self, sensor: SensorType) -> WireStreamSample {
        WireStreamSample::new(sensor, self.read(sensor))
    }

    pub fn full_packet(&mut self, uptime: HubTimestamp) -> WireFullPacket {
        let height_cm = self.read(SensorType::Height);
        let weight_kg = self.read(SensorType::Weight);
        let temperature_c = self.read(SensorType::Temperature);
        let heart_rate = self.read(SensorType::HeartRate) as u16;

        let status = SensorType::ALL
            .into_iter()
            .fold(SensorStatus::default(), SensorStatus::with);

        WireFullPacket {
            distance_cm: MOUNT_HEIGHT_CM - height_cm,
            height_cm,
            temperature_c,
            ambient_temperature_c: self.rng.random_range(22.0..=26.0),
            heart_rate,
            weight_kg,
            bmi: bmi(weight_kg, height_cm),
            status,
            timestamp: uptime,
        }
    }
}
