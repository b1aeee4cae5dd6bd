use kiosk_record::SensorType;

use crate::error::CommandError;

pub const CMD_MEASURE: u8 = 0x01;
pub const CMD_START_STREAM: u8 = 0x05;
pub const CMD_STOP_STREAM: u8 = 0x06;

/// Control messages sent to the hub. The hub never acknowledges them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubCommand {
    /// Ask for a single full packet.
    RequestMeasurement,
    StartStream(SensorType),
    StopStream,
}

impl HubCommand {
    pub fn encode(self) -> Vec<u8> {
        match self {
            HubCommand::RequestMeasurement => vec![CMD_MEASURE],
            HubCommand::StartStream(sensor) => vec![CMD_START_STREAM, sensor.tag()],
            HubCommand::StopStream => vec![CMD_STOP_STREAM],
        }
    }

    /// Parses the command at the front of `bytes`, returning it with the number of
    /// bytes it used. `None` means more bytes are needed.
    ///
    /// Unrecognised input still reports how many bytes to skip.
    pub fn parse(bytes: &[u8]) -> Option<(Result<HubCommand, CommandError>, usize)> {
        match *bytes {
            [] => None,
            [CMD_MEASURE, ..] => Some((Ok(HubCommand::RequestMeasurement), 1)),
            [CMD_STOP_STREAM, ..] => Some((Ok(HubCommand::StopStream), 1)),
            [CMD_START_STREAM] => None,
            [CMD_START_STREAM, tag, ..] => Some((
                SensorType::try_from(tag)
                    .map(HubCommand::StartStream)
                    .map_err(CommandError::from),
                2,
            )),
            [opcode, ..] => Some((Err(CommandError::UnknownOpcode(opcode)), 1)),
        }
    }
}

/// Somewhere commands for the hub can be written.
pub trait CommandSink {
    fn send_command(&mut self, command: HubCommand);
}

impl CommandSink for Vec<HubCommand> {
    fn send_command(&mut self, command: HubCommand) {
        self.push(command);
    }
}
