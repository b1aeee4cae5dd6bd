use std::io::{self, Write};

use kiosk_checkup::{printer::receipt_lines, PrintError, ReceiptPrinter};
use kiosk_record::HealthRecord;

/// Prints receipts as text on a writer, stdout by default.
pub struct ConsolePrinter<W = io::Stdout> {
    out: W,
}

impl ConsolePrinter {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsolePrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ReceiptPrinter for ConsolePrinter<W> {
    fn is_connected(&mut self) -> bool {
        true
    }

    fn print(&mut self, record: &HealthRecord) -> Result<(), PrintError> {
        for line in receipt_lines(record) {
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out)?;
        self.out.flush()?;

        Ok(())
    }
}
