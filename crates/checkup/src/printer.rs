use std::io;

use kiosk_record::HealthRecord;

#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    #[error("printer is not connected")]
    NotConnected,
    #[error("failed to send receipt: {0}")]
    Io(#[from] io::Error),
}

/// Receipt printer attached to the kiosk.
pub trait ReceiptPrinter {
    fn is_connected(&mut self) -> bool;

    fn print(&mut self, record: &HealthRecord) -> Result<(), PrintError>;
}

/// Plain text of a checkup receipt, one entry per printed line.
///
/// Measurements that are not positive are left off.
pub fn receipt_lines(record: &HealthRecord) -> Vec<String> {
    let patient = &record.patient;
    let mut lines = vec![
        "HEALTH REPORT".to_owned(),
        "========================".to_owned(),
        String::new(),
        "PATIENT INFO".to_owned(),
        format!("Name: {}", patient.name),
        format!("Age: {}", patient.age),
        format!("Gender: {}", patient.gender),
    ];

    if !patient.address.is_empty() {
        lines.push(format!("Address: {}", patient.address));
    }
    lines.push(format!("Date: {}", record.timestamp));
    lines.push(String::new());

    lines.push("MEASUREMENTS".to_owned());
    lines.push("----------------".to_owned());

    if record.height > 0.0 {
        lines.push(format!("Height: {:.1} cm", record.height));
    }
    if record.weight > 0.0 {
        lines.push(format!("Weight: {:.1} kg", record.weight));
    }
    if let Some(category) = record.bmi_category() {
        lines.push(format!("BMI: {:.1} ({category})", record.bmi));
    }
    if record.temperature > 0.0 {
        lines.push(format!("Temp: {:.1} °C", record.temperature));
    }
    if record.heart_rate > 0 {
        lines.push(format!("Heart Rate: {} BPM", record.heart_rate));
    }
    if record.bp_systolic > 0 && record.bp_diastolic > 0 {
        lines.push(format!(
            "BP: {}/{} mmHg",
            record.bp_systolic, record.bp_diastolic
        ));
    }
    lines.push(String::new());

    lines.extend(
        [
            "NOTES",
            "----------------",
            "This is a screening",
            "report only. Please",
            "consult a doctor for",
            "proper diagnosis.",
            "",
            "Thank You!",
            "Get well soon!",
        ]
        .map(str::to_owned),
    );

    lines
}
