use tracing::{debug, trace};

use crate::{
    error::FrameError,
    frame::{
        WireFullPacket, WireStreamSample, FULL_PACKET_FRAME_LEN, FULL_PACKET_START,
        STREAM_SAMPLE_FRAME_LEN, STREAM_SAMPLE_START,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodeEvent {
    FullPacket(WireFullPacket),
    StreamSample(WireStreamSample),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderStats {
    pub full_packets: u32,
    pub stream_samples: u32,
    pub discarded: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    #[default]
    Idle,
    CapturingFullPacket,
    CapturingStream,
}

impl CaptureMode {
    const fn frame_len(self) -> usize {
        match self {
            CaptureMode::Idle => 0,
            CaptureMode::CapturingFullPacket => FULL_PACKET_FRAME_LEN,
            CaptureMode::CapturingStream => STREAM_SAMPLE_FRAME_LEN,
        }
    }
}

/// Byte-at-a-time decoder for the hub's frames.
///
/// `0xAA` restarts a full-packet capture from any mode, which resynchronises the
/// decoder after corruption. `0xCC` starts a stream capture unless a full packet
/// is being captured. Invalid frames are dropped without surfacing an error.
#[derive(Debug)]
pub struct FrameDecoder {
    mode: CaptureMode,
    buffer: [u8; FULL_PACKET_FRAME_LEN],
    index: usize,
    stats: DecoderStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub const fn new() -> Self {
        Self {
            mode: CaptureMode::Idle,
            buffer: [0; FULL_PACKET_FRAME_LEN],
            index: 0,
            stats: DecoderStats {
                full_packets: 0,
                stream_samples: 0,
                discarded: 0,
            },
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Feeds every byte in order, collecting the frames they complete.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<DecodeEvent> {
        bytes.iter().filter_map(|&byte| self.push(byte)).collect()
    }

    pub fn push(&mut self, byte: u8) -> Option<DecodeEvent> {
        match (byte, self.mode) {
            (FULL_PACKET_START, mode) => {
                if mode != CaptureMode::Idle {
                    trace!(?mode, dropped = self.index, "full packet start restarts capture");
                }

                self.start(CaptureMode::CapturingFullPacket, byte);
                None
            }
            (_, CaptureMode::CapturingFullPacket) => {
                self.store(byte);

                (self.index == FULL_PACKET_FRAME_LEN).then(|| {
                    let frame = self.take_frame();

                    WireFullPacket::from_frame(frame).map(DecodeEvent::FullPacket)
                })
                .and_then(|result| self.complete(result))
            }
            (STREAM_SAMPLE_START, CaptureMode::Idle | CaptureMode::CapturingStream) => {
                self.start(CaptureMode::CapturingStream, byte);
                None
            }
            (_, CaptureMode::CapturingStream) => {
                self.store(byte);

                (self.index == STREAM_SAMPLE_FRAME_LEN).then(|| {
                    let frame = self.take_frame();

                    WireStreamSample::from_frame(frame).map(DecodeEvent::StreamSample)
                })
                .and_then(|result| self.complete(result))
            }
            (_, CaptureMode::Idle) => {
                trace!(byte, "ignoring byte outside of a frame");
                None
            }
        }
    }

    /// Ends the input, reporting a frame that was still being captured.
    pub fn finish(&mut self) -> Result<(), FrameError> {
        let mode = std::mem::take(&mut self.mode);
        let received = std::mem::take(&mut self.index);

        match mode {
            CaptureMode::Idle => Ok(()),
            mode => {
                self.stats.discarded = self.stats.discarded.saturating_add(1);

                Err(FrameError::IncompleteFrame {
                    received,
                    expected: mode.frame_len(),
                })
            }
        }
    }

    fn start(&mut self, mode: CaptureMode, byte: u8) {
        self.mode = mode;
        self.index = 0;
        self.store(byte);
    }

    fn store(&mut self, byte: u8) {
        self.buffer[self.index] = byte;
        self.index += 1;
    }

    fn take_frame(&mut self) -> &[u8] {
        let len = std::mem::take(&mut self.index);
        self.mode = CaptureMode::Idle;

        &self.buffer[..len]
    }

    fn complete(&mut self, result: Result<DecodeEvent, FrameError>) -> Option<DecodeEvent> {
        match result {
            Ok(event) => {
                match event {
                    DecodeEvent::FullPacket(_) => {
                        self.stats.full_packets = self.stats.full_packets.saturating_add(1)
                    }
                    DecodeEvent::StreamSample(_) => {
                        self.stats.stream_samples = self.stats.stream_samples.saturating_add(1)
                    }
                }

                Some(event)
            }
            Err(error) => {
                debug!(%error, "discarding frame");
                self.stats.discarded = self.stats.discarded.saturating_add(1);

                None
            }
        }
    }
}
