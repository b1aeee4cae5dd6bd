use std::{
    io::{self, Read, Write},
    time::Duration,
};

use serialport::{DataBits, Parity, SerialPort, StopBits};
use tracing::{debug, info, trace, warn};

use crate::{
    command::{CommandSink, HubCommand},
    decoder::{DecodeEvent, DecoderStats, FrameDecoder},
    error::TransportError,
};

/// A byte pipe to the hub that can say how much input is waiting.
pub trait HubPort: Read + Write {
    fn bytes_to_read(&self) -> io::Result<u32>;
}

impl HubPort for Box<dyn SerialPort> {
    fn bytes_to_read(&self) -> io::Result<u32> {
        SerialPort::bytes_to_read(&**self).map_err(io::Error::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
}

/// Non-blocking pump between a serial port and the frame decoder.
///
/// Each [`SerialLink::poll`] consumes only the bytes already waiting on the
/// port, so a polling loop is never stalled by a quiet hub.
pub struct SerialLink<P = Box<dyn SerialPort>> {
    port_name: String,
    baud_rate: u32,
    port: Option<P>,
    decoder: FrameDecoder,
    read_buffer: Vec<u8>,
}

impl SerialLink {
    /// Opens the named port, starting disconnected when it is not available yet.
    pub fn open(port_name: impl Into<String>, baud_rate: u32) -> Self {
        let mut link = Self {
            port_name: port_name.into(),
            baud_rate,
            port: None,
            decoder: FrameDecoder::new(),
            read_buffer: Vec::new(),
        };

        link.reconnect();

        link
    }

    /// Tries to open the port again if it is not connected. Returns whether the
    /// link is connected afterwards.
    pub fn reconnect(&mut self) -> bool {
        if self.port.is_none() {
            match self.connect() {
                Some(port) => {
                    info!(port = %self.port_name, baud = self.baud_rate, "serial port connected");

                    self.port = Some(port);
                }
                None => trace!(port = %self.port_name, "serial port not available"),
            }
        }

        self.port.is_some()
    }

    fn connect(&self) -> Option<Box<dyn SerialPort>> {
        match serialport::new(self.port_name.as_str(), self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(Duration::from_millis(10))
            .open()
        {
            Ok(port) => Some(port),
            Err(e) if e.kind() == serialport::ErrorKind::NoDevice => None,
            Err(e) => {
                warn!(port = %self.port_name, error = %e, "failed to open serial port");
                None
            }
        }
    }
}

impl<P: HubPort> SerialLink<P> {
    /// Wraps an already open port.
    pub fn attached(port_name: impl Into<String>, baud_rate: u32, port: P) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            port: Some(port),
            decoder: FrameDecoder::new(),
            read_buffer: Vec::new(),
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn port(&self) -> Option<&P> {
        self.port.as_ref()
    }

    pub fn state(&self) -> LinkState {
        match self.port {
            Some(_) => LinkState::Connected,
            None => LinkState::Disconnected,
        }
    }

    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Decodes whatever bytes are currently available, in arrival order.
    pub fn poll(&mut self) -> Vec<DecodeEvent> {
        let Some(port) = &mut self.port else {
            return Vec::new();
        };

        match read_available(port, &mut self.read_buffer) {
            Ok(bytes) => self.decoder.feed(bytes),
            Err(TransportError::TimedOut) => Vec::new(),
            Err(TransportError::SerialPortDisconnected(error)) => {
                info!(%error, "serial port disconnected");

                self.disconnect();
                Vec::new()
            }
        }
    }

    fn disconnect(&mut self) {
        self.port = None;

        if let Err(error) = self.decoder.finish() {
            debug!(%error, "dropping partial frame");
        }
    }
}

impl<P: HubPort> CommandSink for SerialLink<P> {
    fn send_command(&mut self, command: HubCommand) {
        let Some(port) = &mut self.port else {
            warn!(?command, "cannot send command while the hub is not connected");
            return;
        };

        let bytes = command.encode();

        match port.write_all(&bytes).and_then(|()| port.flush()) {
            Ok(()) => debug!(?command, ?bytes, "sent command"),
            Err(error) => warn!(?command, %error, "failed to send command"),
        }
    }
}

fn read_available<'buffer>(
    port: &mut impl HubPort,
    buffer: &'buffer mut Vec<u8>,
) -> Result<&'buffer [u8], TransportError> {
    buffer.clear();

    let available = port.bytes_to_read()? as usize;
    if available > 0 {
        buffer.resize(available, 0);
        let len = port.read(buffer)?;
        buffer.truncate(len);
    }

    Ok(buffer.as_slice())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use kiosk_record::SensorType;

    use super::*;
    use crate::frame::WireStreamSample;

    #[derive(Default)]
    struct FakePort {
        incoming: VecDeque<u8>,
        written: Vec<u8>,
        unplugged: bool,
    }

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let len = buf.len().min(self.incoming.len());

            for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..len)) {
                *slot = byte;
            }

            Ok(len)
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl HubPort for FakePort {
        fn bytes_to_read(&self) -> io::Result<u32> {
            if self.unplugged {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
            }

            Ok(self.incoming.len() as u32)
        }
    }

    fn link(incoming: &[u8]) -> SerialLink<FakePort> {
        SerialLink::attached(
            "fake",
            crate::DEFAULT_BAUD_RATE,
            FakePort {
                incoming: incoming.iter().copied().collect(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn poll_decodes_available_bytes() {
        let sample = WireStreamSample::new(SensorType::Height, 172.3);
        let mut link = link(&sample.to_frame());

        assert_eq!(link.poll(), [DecodeEvent::StreamSample(sample)]);
        assert!(link.poll().is_empty());
        assert_eq!(link.stats().stream_samples, 1);
    }

    #[test]
    fn frames_split_across_polls_are_reassembled() {
        let frame = WireStreamSample::new(SensorType::Weight, 70.5).to_frame();
        let mut link = link(&frame[..5]);

        assert!(link.poll().is_empty());

        link.port.as_mut().unwrap().incoming.extend(&frame[5..]);

        assert_eq!(
            link.poll(),
            [DecodeEvent::StreamSample(WireStreamSample::new(
                SensorType::Weight,
                70.5
            ))]
        );
    }

    #[test]
    fn commands_are_written_to_the_port() {
        let mut link = link(&[]);

        link.send_command(HubCommand::StartStream(SensorType::Temperature));
        link.send_command(HubCommand::StopStream);

        assert_eq!(link.port().unwrap().written, [0x05, 0x03, 0x06]);
    }

    #[test]
    fn unplugged_port_disconnects_the_link() {
        let mut link = link(&[0xAA, 0x01, 0x02]);
        link.poll();
        link.port.as_mut().unwrap().unplugged = true;

        assert!(link.poll().is_empty());
        assert_eq!(link.state(), LinkState::Disconnected);
        assert_eq!(link.stats().discarded, 1);

        // Commands while disconnected are dropped
        link.send_command(HubCommand::StopStream);
        assert!(link.port().is_none());
    }
}
