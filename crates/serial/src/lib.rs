//! Wire protocol between the kiosk and its sensor hub.
//!
//! Bytes from the hub go through a [`FrameDecoder`], which recognises one-shot
//! full packets and streamed samples. Commands to the hub are plain
//! [`HubCommand`]s written through a [`CommandSink`].

pub mod command;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod link;

pub use command::{CommandSink, HubCommand};
pub use decoder::{DecodeEvent, DecoderStats, FrameDecoder};
pub use error::{CommandError, FrameError, TransportError};
pub use frame::{HubTimestamp, SensorStatus, WireFullPacket, WireStreamSample};
pub use link::{HubPort, LinkState, SerialLink};

/// Serial speed shared with the hub firmware.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
