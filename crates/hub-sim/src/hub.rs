use std::time::{Duration, Instant};

use kiosk_record::SensorType;
use kiosk_serial::{CommandError, HubCommand, HubTimestamp};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::sensors::SimulatedSensors;

/// Time between two stream samples.
pub const STREAM_PERIOD: Duration = Duration::from_millis(200);

struct Stream {
    sensor: SensorType,
    next_sample: Instant,
}

/// Reacts to kiosk commands the way the hub firmware does.
pub struct Hub<R> {
    sensors: SimulatedSensors<R>,
    booted: Instant,
    pending: Vec<u8>,
    stream: Option<Stream>,
}

impl<R: Rng> Hub<R> {
    pub fn new(rng: R, booted: Instant) -> Self {
        Self {
            sensors: SimulatedSensors::new(rng),
            booted,
            pending: Vec::new(),
            stream: None,
        }
    }

    pub fn streaming(&self) -> Option<SensorType> {
        self.stream.as_ref().map(|stream| stream.sensor)
    }

    /// Consumes bytes from the kiosk and returns the frames to send back.
    pub fn receive(&mut self, bytes: &[u8], now: Instant) -> Vec<u8> {
        self.pending.extend_from_slice(bytes);

        let mut reply = Vec::new();
        let mut consumed = 0;

        while let Some((command, len)) = HubCommand::parse(&self.pending[consumed..]) {
            consumed += len;

            match command {
                Ok(command) => reply.extend(self.handle(command, now)),
                Err(error @ CommandError::UnknownOpcode(_)) => debug!(%error, "ignoring byte"),
                Err(error) => warn!(%error, "ignoring command"),
            }
        }

        self.pending.drain(..consumed);

        reply
    }

    fn handle(&mut self, command: HubCommand, now: Instant) -> Vec<u8> {
        info!(?command, "received command");

        match command {
            HubCommand::RequestMeasurement => {
                let packet = self.sensors.full_packet(self.uptime(now));
                packet.to_frame().to_vec()
            }
            HubCommand::StartStream(sensor) => {
                self.stream = Some(Stream {
                    sensor,
                    next_sample: now,
                });
                Vec::new()
            }
            HubCommand::StopStream => {
                self.stream = None;
                Vec::new()
            }
        }
    }

    /// Returns the next stream frame once it is due.
    pub fn tick(&mut self, now: Instant) -> Option<Vec<u8>> {
        let stream = self.stream.as_mut()?;
        if now < stream.next_sample {
            return None;
        }

        stream.next_sample = now + STREAM_PERIOD;
        let sensor = stream.sensor;

        Some(self.sensors.stream_sample(sensor).to_frame().to_vec())
    }

    fn uptime(&self, now: Instant) -> HubTimestamp {
        let millis = now.saturating_duration_since(self.booted).as_millis();
        HubTimestamp(u32::try_from(millis).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use kiosk_serial::{DecodeEvent, FrameDecoder};
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn hub(booted: Instant) -> Hub<StdRng> {
        Hub::new(StdRng::seed_from_u64(1), booted)
    }

    #[test]
    fn measurement_request_is_answered_with_a_full_packet() {
        let booted = Instant::now();
        let mut hub = hub(booted);

        let reply = hub.receive(&[0x01], booted + Duration::from_millis(1_500));
        let events = FrameDecoder::new().feed(&reply);

        let [DecodeEvent::FullPacket(packet)] = events.as_slice() else {
            panic!("expected one full packet, got {events:?}");
        };
        assert_eq!(packet.timestamp, HubTimestamp(1_500));
    }

    #[test]
    fn streams_every_period_until_stopped() {
        let now = Instant::now();
        let mut hub = hub(now);

        assert!(hub.receive(&[0x05, 0x02], now).is_empty());
        assert_eq!(hub.streaming(), Some(SensorType::Weight));

        let first = hub.tick(now).unwrap();
        assert!(hub.tick(now + STREAM_PERIOD / 2).is_none());
        assert!(hub.tick(now + STREAM_PERIOD).is_some());

        let events = FrameDecoder::new().feed(&first);
        let [DecodeEvent::StreamSample(sample)] = events.as_slice() else {
            panic!("expected one stream sample, got {events:?}");
        };
        assert_eq!(sample.sensor, SensorType::Weight);

        hub.receive(&[0x06], now);
        assert_eq!(hub.streaming(), None);
        assert!(hub.tick(now + STREAM_PERIOD * 4).is_none());
    }

    #[test]
    fn commands_split_across_reads_are_joined() {
        let now = Instant::now();
        let mut hub = hub(now);

        hub.receive(&[0x05], now);
        assert_eq!(hub.streaming(), None);

        hub.receive(&[0x04], now);
        assert_eq!(hub.streaming(), Some(SensorType::HeartRate));
    }

    #[test]
    fn unknown_bytes_and_sensor_tags_are_skipped() {
        let now = Instant::now();
        let mut hub = hub(now);

        assert!(hub.receive(&[0x7F, 0x05, 0x00, 0x05, 0x03], now).is_empty());

        assert_eq!(hub.streaming(), Some(SensorType::Temperature));
    }
}
