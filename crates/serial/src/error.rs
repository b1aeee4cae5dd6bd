use std::io;

use kiosk_record::SensorTagError;

/// Why a frame from the hub was discarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("bad frame markers (start {start:#04x}, end {end:#04x})")]
    Framing { start: u8, end: u8 },
    #[error("checksum mismatch (frame says {expected:#04x}, payload gives {actual:#04x})")]
    ChecksumMismatch { expected: u8, actual: u8 },
    #[error("frame ended after {received} of {expected} bytes")]
    IncompleteFrame { received: usize, expected: usize },
    #[error("frame is {got} bytes, expected {expected}")]
    BadLength { expected: usize, got: usize },
    #[error(transparent)]
    Sensor(#[from] SensorTagError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command opcode {0:#04x}")]
    UnknownOpcode(u8),
    #[error(transparent)]
    Sensor(#[from] SensorTagError),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("serial read timed out")]
    TimedOut,
    #[error("serial port disconnected: {0}")]
    SerialPortDisconnected(io::Error),
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => {
                TransportError::TimedOut
            }
            _ => TransportError::SerialPortDisconnected(error),
        }
    }
}
