//! Line commands typed by the kiosk operator.

use std::{
    io::{self, BufRead},
    sync::mpsc::Sender,
    thread,
};

use kiosk_record::{PatientInfo, SensorType};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `info <name>;<age>;<gender>;<address>`
    PatientInfo(PatientInfo),
    /// `bp <systolic> <diastolic>`, kept as typed.
    BloodPressure { systolic: String, diastolic: String },
    Begin(SensorType),
    Capture(SensorType),
    Measure,
    Report,
    Print,
    Done,
    Data,
    ClearData,
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`{command}` needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("unknown sensor `{0}`, expected height, weight, temperature or heart-rate")]
    UnknownSensor(String),
}

pub const HELP: &str = "\
commands:
  info <name>;<age>;<gender>;<address>
  bp <systolic> <diastolic>
  begin <sensor>       start streaming height, weight, temperature or heart-rate
  capture <sensor>     keep the latest streamed value
  measure              request every reading at once
  report               show the current record
  print                print the receipt
  done                 save the record and start over
  data                 show saved records
  clear-data           delete saved records
  status               link and printer state
  quit";

impl ConsoleCommand {
    /// Parses one line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Result<Self, ConsoleError>> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        let command = match word.to_ascii_lowercase().as_str() {
            "" => return None,
            "info" => Ok(Self::PatientInfo(parse_patient(rest))),
            "bp" => parse_blood_pressure(rest),
            "begin" => parse_sensor(rest, "begin").map(Self::Begin),
            "capture" => parse_sensor(rest, "capture").map(Self::Capture),
            "measure" => Ok(Self::Measure),
            "report" => Ok(Self::Report),
            "print" => Ok(Self::Print),
            "done" => Ok(Self::Done),
            "data" => Ok(Self::Data),
            "clear-data" => Ok(Self::ClearData),
            "status" => Ok(Self::Status),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ConsoleError::UnknownCommand(other.to_owned())),
        };

        Some(command)
    }
}

fn parse_patient(text: &str) -> PatientInfo {
    let mut fields = text.split(';').map(|field| field.trim().to_owned());
    let mut next = || fields.next().unwrap_or_default();

    PatientInfo {
        name: next(),
        age: next(),
        gender: next(),
        address: next(),
    }
}

fn parse_blood_pressure(text: &str) -> Result<ConsoleCommand, ConsoleError> {
    let mut readings = text.split_whitespace();

    match (readings.next(), readings.next()) {
        (Some(systolic), Some(diastolic)) => Ok(ConsoleCommand::BloodPressure {
            systolic: systolic.to_owned(),
            diastolic: diastolic.to_owned(),
        }),
        _ => Err(ConsoleError::MissingArgument {
            command: "bp",
            expected: "a systolic and a diastolic reading",
        }),
    }
}

fn parse_sensor(text: &str, command: &'static str) -> Result<SensorType, ConsoleError> {
    match text.to_ascii_lowercase().as_str() {
        "" => Err(ConsoleError::MissingArgument {
            command,
            expected: "a sensor",
        }),
        "height" => Ok(SensorType::Height),
        "weight" => Ok(SensorType::Weight),
        "temperature" | "temp" => Ok(SensorType::Temperature),
        "heart-rate" | "heartrate" | "pulse" => Ok(SensorType::HeartRate),
        other => Err(ConsoleError::UnknownSensor(other.to_owned())),
    }
}

/// Reads stdin on its own thread, sending every recognised command to the loop.
///
/// The channel closes once stdin does.
pub fn spawn(command_tx: Sender<ConsoleCommand>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(error) => {
                        warn!(%error, "failed to read console input");
                        break;
                    }
                };

                match ConsoleCommand::parse(&line) {
                    Some(Ok(command)) => {
                        debug!(?command, "console command");

                        if command_tx.send(command).is_err() {
                            break;
                        }
                    }
                    Some(Err(error)) => {
                        eprintln!("{error}");
                        eprintln!("{HELP}");
                    }
                    None => {}
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_info_is_split_on_semicolons() {
        let command = ConsoleCommand::parse("info Maria Santos; 34 ;Female;12 Rizal St").unwrap();

        assert_eq!(
            command,
            Ok(ConsoleCommand::PatientInfo(PatientInfo {
                name: "Maria Santos".into(),
                age: "34".into(),
                gender: "Female".into(),
                address: "12 Rizal St".into(),
            }))
        );
    }

    #[test]
    fn missing_patient_fields_are_left_empty() {
        let Some(Ok(ConsoleCommand::PatientInfo(patient))) = ConsoleCommand::parse("info Jo")
        else {
            panic!("expected patient info");
        };

        assert_eq!(patient.name, "Jo");
        assert!(patient.age.is_empty());
        assert!(patient.address.is_empty());
    }

    #[test]
    fn blood_pressure_keeps_raw_text() {
        assert_eq!(
            ConsoleCommand::parse("bp 12O 80"),
            Some(Ok(ConsoleCommand::BloodPressure {
                systolic: "12O".into(),
                diastolic: "80".into(),
            }))
        );
        assert!(matches!(
            ConsoleCommand::parse("bp 120"),
            Some(Err(ConsoleError::MissingArgument { command: "bp", .. }))
        ));
    }

    #[test]
    fn sensors_are_named_case_insensitively() {
        assert_eq!(
            ConsoleCommand::parse("BEGIN Heart-Rate"),
            Some(Ok(ConsoleCommand::Begin(SensorType::HeartRate)))
        );
        assert_eq!(
            ConsoleCommand::parse("capture temp"),
            Some(Ok(ConsoleCommand::Capture(SensorType::Temperature)))
        );
        assert_eq!(
            ConsoleCommand::parse("begin blood-pressure"),
            Some(Err(ConsoleError::UnknownSensor("blood-pressure".into())))
        );
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(ConsoleCommand::parse("   "), None);
        assert_eq!(
            ConsoleCommand::parse("dance"),
            Some(Err(ConsoleError::UnknownCommand("dance".into())))
        );
        assert_eq!(
            ConsoleCommand::parse("clear-data"),
            Some(Ok(ConsoleCommand::ClearData))
        );
    }
}
