use kiosk_record::{HealthRecord, SensorType};
use kiosk_serial::{CommandSink, HubCommand};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Streaming,
    Captured,
}

/// What the UI should do after pressing start on a sensor screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    /// Already captured: move on to the next screen without measuring again.
    Proceed,
    Streaming,
}

/// Result of freezing the live value into the record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capture {
    /// Value stored in the record.
    pub value: f32,
    /// False when no sample arrived while streaming and zero was stored instead.
    pub sampled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("cannot capture {sensor}: session is {state:?}, not streaming")]
    NotStreaming {
        sensor: SensorType,
        state: SessionState,
    },
}

/// Idle → Streaming → Captured lifecycle of one streamable sensor.
#[derive(Debug, Clone)]
pub struct MeasurementSession {
    sensor: SensorType,
    state: SessionState,
    latest: Option<f32>,
}

impl MeasurementSession {
    pub fn new(sensor: SensorType) -> Self {
        Self {
            sensor,
            state: SessionState::Idle,
            latest: None,
        }
    }

    pub fn sensor(&self) -> SensorType {
        self.sensor
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Most recent streamed value, shown live while streaming.
    pub fn latest(&self) -> Option<f32> {
        self.latest
    }

    pub fn begin(&mut self, sink: &mut impl CommandSink) -> BeginOutcome {
        match self.state {
            SessionState::Captured => BeginOutcome::Proceed,
            SessionState::Idle | SessionState::Streaming => {
                sink.send_command(HubCommand::StartStream(self.sensor));
                self.state = SessionState::Streaming;

                info!(sensor = %self.sensor, "streaming started");

                BeginOutcome::Streaming
            }
        }
    }

    /// Records a streamed value. Last write wins; values outside Streaming are ignored.
    pub fn observe(&mut self, value: f32) -> bool {
        match self.state {
            SessionState::Streaming => {
                self.latest = Some(value);
                true
            }
            SessionState::Idle | SessionState::Captured => {
                debug!(sensor = %self.sensor, state = ?self.state, value, "ignoring sample");
                false
            }
        }
    }

    pub fn capture(
        &mut self,
        sink: &mut impl CommandSink,
        record: &mut HealthRecord,
    ) -> Result<Capture, SessionError> {
        if self.state != SessionState::Streaming {
            return Err(SessionError::NotStreaming {
                sensor: self.sensor,
                state: self.state,
            });
        }

        sink.send_command(HubCommand::StopStream);

        let sampled = self.latest.is_some();
        if !sampled {
            debug!(sensor = %self.sensor, "no valid sample, capturing zero");
        }

        record.store_capture(self.sensor, self.latest.unwrap_or(0.0));
        self.state = SessionState::Captured;

        let value = record.value(self.sensor);
        info!(sensor = %self.sensor, value, sampled, "captured");

        Ok(Capture { value, sampled })
    }

    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_streams_and_capture_stops() {
        let mut commands: Vec<HubCommand> = Vec::new();
        let mut record = HealthRecord::new();
        let mut session = MeasurementSession::new(SensorType::Height);

        assert_eq!(session.begin(&mut commands), BeginOutcome::Streaming);
        assert_eq!(session.state(), SessionState::Streaming);

        assert!(session.observe(171.0));
        assert!(session.observe(172.3));

        let capture = session.capture(&mut commands, &mut record).unwrap();

        assert_eq!(
            commands,
            [
                HubCommand::StartStream(SensorType::Height),
                HubCommand::StopStream
            ]
        );
        assert_eq!(capture, Capture { value: 172.3, sampled: true });
        assert_eq!(record.height, 172.3);
        assert!(record.measured.height);
        assert_eq!(session.state(), SessionState::Captured);
    }

    #[test]
    fn begin_after_capture_proceeds_without_commands() {
        let mut commands: Vec<HubCommand> = Vec::new();
        let mut record = HealthRecord::new();
        let mut session = MeasurementSession::new(SensorType::Weight);

        session.begin(&mut commands);
        session.capture(&mut commands, &mut record).unwrap();
        commands.clear();

        assert_eq!(session.begin(&mut commands), BeginOutcome::Proceed);
        assert!(commands.is_empty());
        assert_eq!(session.state(), SessionState::Captured);
    }

    #[test]
    fn capture_without_samples_stores_zero_and_marks_measured() {
        let mut commands: Vec<HubCommand> = Vec::new();
        let mut record = HealthRecord::new();
        let mut session = MeasurementSession::new(SensorType::Weight);

        session.begin(&mut commands);
        let capture = session.capture(&mut commands, &mut record).unwrap();

        assert_eq!(capture, Capture { value: 0.0, sampled: false });
        assert_eq!(record.weight, 0.0);
        assert!(record.measured.weight);
    }

    #[test]
    fn capture_outside_streaming_is_rejected() {
        let mut commands: Vec<HubCommand> = Vec::new();
        let mut record = HealthRecord::new();
        let mut session = MeasurementSession::new(SensorType::Temperature);

        assert_eq!(
            session.capture(&mut commands, &mut record),
            Err(SessionError::NotStreaming {
                sensor: SensorType::Temperature,
                state: SessionState::Idle
            })
        );
        assert!(commands.is_empty());
        assert!(!record.measured.temperature);
    }

    #[test]
    fn samples_outside_streaming_are_ignored() {
        let mut session = MeasurementSession::new(SensorType::HeartRate);

        assert!(!session.observe(80.0));
        assert_eq!(session.latest(), None);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut commands: Vec<HubCommand> = Vec::new();
        let mut session = MeasurementSession::new(SensorType::HeartRate);
        session.begin(&mut commands);
        session.observe(75.0);

        session.reset();

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.latest(), None);
    }
}
