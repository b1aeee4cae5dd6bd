//! The single live checkup: one health record plus its measurement sessions.
//!
//! Everything here is driven from one polling loop, which owns the [`Checkup`]
//! and passes it the decoded hub events and the operator's actions.

pub mod blood_pressure;
pub mod printer;
pub mod session;
pub mod storage;
pub mod timer;

use kiosk_record::{HealthRecord, PatientInfo, SensorType};
use kiosk_serial::{CommandSink, DecodeEvent, HubCommand, WireFullPacket};
use tracing::{debug, info, warn};

pub use blood_pressure::{BloodPressureEntry, BloodPressureState, ParseError};
pub use printer::{PrintError, ReceiptPrinter};
pub use session::{BeginOutcome, Capture, MeasurementSession, SessionError, SessionState};
pub use storage::{CsvFileStorage, Storage, StorageError};

#[derive(Debug, Clone)]
pub struct Checkup {
    record: HealthRecord,
    sessions: [MeasurementSession; 4],
    blood_pressure: BloodPressureEntry,
}

impl Default for Checkup {
    fn default() -> Self {
        Self::new()
    }
}

impl Checkup {
    pub fn new() -> Self {
        Self {
            record: HealthRecord::new(),
            sessions: SensorType::ALL.map(MeasurementSession::new),
            blood_pressure: BloodPressureEntry::default(),
        }
    }

    pub fn record(&self) -> &HealthRecord {
        &self.record
    }

    pub fn session(&self, sensor: SensorType) -> &MeasurementSession {
        &self.sessions[sensor.index()]
    }

    pub fn sessions(&self) -> impl Iterator<Item = &MeasurementSession> {
        self.sessions.iter()
    }

    pub fn blood_pressure(&self) -> BloodPressureState {
        self.blood_pressure.state()
    }

    /// Completes the patient-info step, which starts the measurements afresh.
    pub fn start(&mut self, patient: PatientInfo) {
        info!(name = %patient.name, "checkup started");

        self.record.patient = patient;
        self.record.reset_measurements();
        self.sessions.iter_mut().for_each(MeasurementSession::reset);
        self.blood_pressure.reset();
    }

    pub fn begin(&mut self, sensor: SensorType, sink: &mut impl CommandSink) -> BeginOutcome {
        self.sessions[sensor.index()].begin(sink)
    }

    pub fn capture(
        &mut self,
        sensor: SensorType,
        sink: &mut impl CommandSink,
    ) -> Result<Capture, SessionError> {
        self.sessions[sensor.index()].capture(sink, &mut self.record)
    }

    pub fn save_blood_pressure(&mut self, systolic: &str, diastolic: &str) {
        self.blood_pressure
            .save(&mut self.record, systolic, diastolic);
    }

    /// Asks the hub for a one-shot full packet.
    pub fn request_measurement(&mut self, sink: &mut impl CommandSink) {
        sink.send_command(HubCommand::RequestMeasurement);
    }

    pub fn handle_event(&mut self, event: DecodeEvent) {
        match event {
            DecodeEvent::FullPacket(packet) => self.apply_full_packet(&packet),
            DecodeEvent::StreamSample(sample) => {
                self.sessions[sample.sensor.index()].observe(sample.value);
            }
        }
    }

    /// Overwrites every hub measurement at once; BMI comes from the hub as-is.
    fn apply_full_packet(&mut self, packet: &WireFullPacket) {
        debug!(?packet, "full packet");

        let record = &mut self.record;
        record.height = packet.height_cm;
        record.temperature = packet.temperature_c;
        record.heart_rate = i32::from(packet.heart_rate);
        record.weight = packet.weight_kg;
        record.bmi = packet.bmi;

        for sensor in SensorType::ALL {
            record
                .measured
                .set_sensor(sensor, packet.status.is_valid(sensor));
        }
    }

    /// Saves the record and discards it for the next patient, even if saving failed.
    pub fn finish(&mut self, storage: &mut impl Storage, timestamp: String) -> bool {
        self.record.timestamp = timestamp;

        let saved = match self.record.to_csv_row() {
            Ok(row) => match storage.append(&row) {
                Ok(()) => true,
                Err(error) => {
                    warn!(%error, "failed to save checkup");
                    false
                }
            },
            Err(error) => {
                warn!(%error, "failed to format checkup row");
                false
            }
        };

        *self = Self::new();

        saved
    }

    pub fn print(&self, printer: &mut impl ReceiptPrinter) -> Result<(), PrintError> {
        if !printer.is_connected() {
            warn!("printer not connected");
            return Err(PrintError::NotConnected);
        }

        match printer.print(&self.record) {
            Ok(()) => {
                info!("receipt printed");
                Ok(())
            }
            Err(error) => {
                warn!(%error, "failed to print receipt");
                Err(error)
            }
        }
    }
}
