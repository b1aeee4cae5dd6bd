//! Patient health record shared by the kiosk and its collaborators.

pub mod bmi;
pub mod row;
pub mod sensor;

pub use bmi::{bmi, BmiCategory};
pub use row::{csv_writer, CSV_COLUMNS, CSV_HEADER};
pub use sensor::{SensorTagError, SensorType, BLOOD_PRESSURE_TAG};

/// Details typed in by the patient before any measurement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientInfo {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub address: String,
}

/// Which fields of a record were visited during the checkup.
///
/// A flag may be set while the matching value is zero: capturing without a
/// sample still counts as a visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Measured {
    pub blood_pressure: bool,
    pub height: bool,
    pub weight: bool,
    pub temperature: bool,
    pub heart_rate: bool,
}

impl Measured {
    pub fn sensor(&self, sensor: SensorType) -> bool {
        match sensor {
            SensorType::Height => self.height,
            SensorType::Weight => self.weight,
            SensorType::Temperature => self.temperature,
            SensorType::HeartRate => self.heart_rate,
        }
    }

    pub fn set_sensor(&mut self, sensor: SensorType, measured: bool) {
        match sensor {
            SensorType::Height => self.height = measured,
            SensorType::Weight => self.weight = measured,
            SensorType::Temperature => self.temperature = measured,
            SensorType::HeartRate => self.heart_rate = measured,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthRecord {
    pub timestamp: String,
    pub patient: PatientInfo,
    pub weight: f32,
    pub height: f32,
    pub temperature: f32,
    pub bmi: f32,
    pub heart_rate: i32,
    pub bp_systolic: i32,
    pub bp_diastolic: i32,
    pub measured: Measured,
}

impl HealthRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freezes a captured stream value into the record and marks the sensor measured.
    ///
    /// Non-positive values are stored as zero. Capturing weight derives BMI when a
    /// height is already present; a later height change does not touch BMI.
    pub fn store_capture(&mut self, sensor: SensorType, value: f32) {
        let value = if value > 0.0 { value } else { 0.0 };

        match sensor {
            SensorType::Height => self.height = value,
            SensorType::Weight => {
                self.weight = value;

                if self.height > 0.0 {
                    self.bmi = bmi(self.weight, self.height);
                }
            }
            SensorType::Temperature => self.temperature = value,
            // Truncates toward zero like the hub's integer BPM
            SensorType::HeartRate => self.heart_rate = value as i32,
        }

        self.measured.set_sensor(sensor, true);
    }

    pub fn value(&self, sensor: SensorType) -> f32 {
        match sensor {
            SensorType::Height => self.height,
            SensorType::Weight => self.weight,
            SensorType::Temperature => self.temperature,
            SensorType::HeartRate => self.heart_rate as f32,
        }
    }

    pub fn bmi_category(&self) -> Option<BmiCategory> {
        (self.bmi > 0.0).then(|| BmiCategory::of(self.bmi))
    }

    /// Zeroes every measurement and clears every measured flag, keeping patient info.
    pub fn reset_measurements(&mut self) {
        self.height = 0.0;
        self.weight = 0.0;
        self.temperature = 0.0;
        self.heart_rate = 0;
        self.bp_systolic = 0;
        self.bp_diastolic = 0;
        self.bmi = 0.0;
        self.measured = Measured::default();
    }
}
