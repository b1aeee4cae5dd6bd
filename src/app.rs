use std::{
    fmt::{self, Display},
    ops::ControlFlow,
    sync::mpsc::{Receiver, TryRecvError},
    thread,
    time::{Duration, Instant},
};

use chrono::{DateTime, Local};
use kiosk_checkup::{
    printer::receipt_lines,
    timer::{
        Interval, StatusMessage, CONNECTIVITY_CHECK_PERIOD, DATA_SAVED_DISPLAY,
        PRINTER_MISSING_DISPLAY, PRINT_FAILED_DISPLAY, REPORT_SENT_DISPLAY,
    },
    BeginOutcome, BloodPressureState, Capture, Checkup, PrintError, ReceiptPrinter, SessionState,
    Storage,
};
use kiosk_serial::{DecodeEvent, HubPort, SerialLink};
use ringbuffer::{AllocRingBuffer, RingBuffer};
use serialport::SerialPort;
use tracing::{debug, info, warn};

use crate::console::ConsoleCommand;

/// Pause at the end of every loop iteration.
const LOOP_PAUSE: Duration = Duration::from_millis(5);
const RECENT_EVENTS: usize = 16;

/// A decoded hub frame and when it arrived.
#[derive(Debug, Clone)]
pub struct LinkEvent {
    pub received: DateTime<Local>,
    pub event: DecodeEvent,
}

impl Display for LinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let received = self.received.format("%H:%M:%S%.3f");

        match &self.event {
            DecodeEvent::FullPacket(packet) => write!(
                f,
                "{received} full packet at hub time {}: height {:.1} cm, weight {:.1} kg, \
                 temperature {:.1} °C, heart rate {} BPM, status {:#04x}",
                packet.timestamp,
                packet.height_cm,
                packet.weight_kg,
                packet.temperature_c,
                packet.heart_rate,
                packet.status.0,
            ),
            DecodeEvent::StreamSample(sample) => write!(
                f,
                "{received} {} sample {:.1} {}",
                sample.sensor,
                sample.value,
                sample.sensor.unit()
            ),
        }
    }
}

/// The kiosk: one checkup driven by console commands and hub frames.
pub struct Kiosk<S, P, H = Box<dyn SerialPort>> {
    link: SerialLink<H>,
    checkup: Checkup,
    storage: S,
    printer: P,
    printer_connected: bool,
    status: StatusMessage,
    connectivity: Interval,
    recent: AllocRingBuffer<LinkEvent>,
    commands: Receiver<ConsoleCommand>,
}

impl<S: Storage, P: ReceiptPrinter> Kiosk<S, P> {
    /// Runs until the operator quits or the console closes.
    pub fn run(mut self) {
        loop {
            let now = Instant::now();

            if self.drain_commands(now).is_break() {
                break;
            }

            self.poll(now);

            if self.connectivity.tick(now) {
                self.check_printer();
                self.link.reconnect();
            }

            thread::sleep(LOOP_PAUSE);
        }

        info!("kiosk stopped");
    }
}

impl<S: Storage, P: ReceiptPrinter, H: HubPort> Kiosk<S, P, H> {
    pub fn new(
        link: SerialLink<H>,
        storage: S,
        mut printer: P,
        commands: Receiver<ConsoleCommand>,
        now: Instant,
    ) -> Self {
        let printer_connected = printer.is_connected();
        info!(printer_connected, "kiosk ready");

        Self {
            link,
            checkup: Checkup::new(),
            storage,
            printer,
            printer_connected,
            status: StatusMessage::default(),
            connectivity: Interval::new(CONNECTIVITY_CHECK_PERIOD, now),
            recent: AllocRingBuffer::new(RECENT_EVENTS),
            commands,
        }
    }

    pub fn checkup(&self) -> &Checkup {
        &self.checkup
    }

    pub fn link(&self) -> &SerialLink<H> {
        &self.link
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    pub fn recent_events(&self) -> impl Iterator<Item = &LinkEvent> {
        self.recent.iter()
    }

    fn drain_commands(&mut self, now: Instant) -> ControlFlow<()> {
        loop {
            match self.commands.try_recv() {
                Ok(command) => self.handle_command(command, now)?,
                Err(TryRecvError::Empty) => return ControlFlow::Continue(()),
                Err(TryRecvError::Disconnected) => {
                    info!("console closed");
                    return ControlFlow::Break(());
                }
            }
        }
    }

    /// Routes whatever the hub sent since the last call and expires the status message.
    pub fn poll(&mut self, now: Instant) {
        for event in self.link.poll() {
            if let DecodeEvent::StreamSample(sample) = &event {
                if self.checkup.session(sample.sensor).state() == SessionState::Streaming {
                    println!(
                        "  {}: {:.1} {}",
                        sample.sensor,
                        sample.value,
                        sample.sensor.unit()
                    );
                }
            }

            self.recent.push(LinkEvent {
                received: Local::now(),
                event,
            });
            self.checkup.handle_event(event);
        }

        if let Some(message) = self.status.expire(now) {
            debug!(status = %message, "status message cleared");
        }
    }

    fn check_printer(&mut self) {
        let connected = self.printer.is_connected();

        if connected != self.printer_connected {
            info!(connected, "printer connectivity changed");
            self.printer_connected = connected;
        }
    }

    fn show_status(&mut self, text: &str, duration: Duration, now: Instant) {
        println!("{text}");
        self.status.show(text, duration, now);
    }

    pub fn handle_command(&mut self, command: ConsoleCommand, now: Instant) -> ControlFlow<()> {
        match command {
            ConsoleCommand::PatientInfo(patient) => {
                self.checkup.start(patient);
                println!("Checkup started for {}", self.checkup.record().patient.name);
            }
            ConsoleCommand::BloodPressure {
                systolic,
                diastolic,
            } => {
                self.checkup.save_blood_pressure(&systolic, &diastolic);

                let record = self.checkup.record();
                println!(
                    "Blood pressure saved: {}/{} mmHg",
                    record.bp_systolic, record.bp_diastolic
                );
            }
            ConsoleCommand::Begin(sensor) => match self.checkup.begin(sensor, &mut self.link) {
                BeginOutcome::Proceed => println!("{sensor} already captured"),
                BeginOutcome::Streaming => println!("Measuring {sensor}, `capture` to keep a value"),
            },
            ConsoleCommand::Capture(sensor) => {
                match self.checkup.capture(sensor, &mut self.link) {
                    Ok(Capture {
                        value,
                        sampled: true,
                    }) => println!("{sensor} captured: {value:.1} {}", sensor.unit()),
                    Ok(Capture { sampled: false, .. }) => {
                        println!("No {sensor} reading received, stored 0")
                    }
                    Err(error) => println!("{error}"),
                }
            }
            ConsoleCommand::Measure => self.checkup.request_measurement(&mut self.link),
            ConsoleCommand::Report => self.print_report(),
            ConsoleCommand::Print => {
                let printed = if self.printer_connected {
                    self.checkup.print(&mut self.printer)
                } else {
                    Err(PrintError::NotConnected)
                };

                match printed {
                    Ok(()) => self.show_status("✓ Report sent", REPORT_SENT_DISPLAY, now),
                    Err(PrintError::NotConnected) => {
                        self.show_status("Printer not connected!", PRINTER_MISSING_DISPLAY, now)
                    }
                    Err(PrintError::Io(_)) => {
                        self.show_status("Printing failed, try again", PRINT_FAILED_DISPLAY, now)
                    }
                }
            }
            ConsoleCommand::Done => {
                let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

                if self.checkup.finish(&mut self.storage, timestamp) {
                    self.show_status("Data saved", DATA_SAVED_DISPLAY, now);
                }
                println!("Ready for the next patient");
            }
            ConsoleCommand::Data => match self.storage.read_all() {
                Ok(rows) => println!("{rows}"),
                Err(error) => warn!(%error, "failed to read stored records"),
            },
            ConsoleCommand::ClearData => match self.storage.clear() {
                Ok(()) => println!("Stored records cleared"),
                Err(error) => warn!(%error, "failed to clear stored records"),
            },
            ConsoleCommand::Status => self.print_status(),
            ConsoleCommand::Quit => return ControlFlow::Break(()),
        }

        ControlFlow::Continue(())
    }

    fn print_report(&self) {
        let checkup = self.checkup();

        for line in receipt_lines(checkup.record()) {
            println!("{line}");
        }

        let measured = &checkup.record().measured;
        let blood_pressure = match checkup.blood_pressure() {
            BloodPressureState::Set => "entered",
            BloodPressureState::Unset => "not entered",
        };
        println!("Blood pressure {blood_pressure}");
        for session in checkup.sessions() {
            let sensor = session.sensor();
            println!(
                "{sensor}: {:?}, measured {}",
                session.state(),
                measured.sensor(sensor)
            );
        }
    }

    fn print_status(&self) {
        let link = self.link();
        let stats = link.stats();

        println!("Hub on {}: {:?}", link.port_name(), link.state());
        println!(
            "Frames: {} full packets, {} stream samples, {} discarded",
            stats.full_packets, stats.stream_samples, stats.discarded
        );
        println!(
            "Printer: {}",
            if self.printer_connected {
                "connected"
            } else {
                "not connected"
            }
        );
        if let Some(message) = self.status().current() {
            println!("Showing: {message}");
        }

        for event in self.recent_events() {
            println!("  {event}");
        }
    }
}
