use std::io;

use crate::HealthRecord;

/// Column names of the persisted checkup file, in row order.
pub const CSV_COLUMNS: [&str; 12] = [
    "Timestamp",
    "Name",
    "Age",
    "Gender",
    "Address",
    "Weight(kg)",
    "Height(cm)",
    "Temperature(C)",
    "BMI",
    "HeartRate(BPM)",
    "BP_Sys",
    "BP_Dia",
];

/// [`CSV_COLUMNS`] as the header line reads in the file.
pub const CSV_HEADER: &str = "Timestamp,Name,Age,Gender,Address,Weight(kg),Height(cm),Temperature(C),BMI,HeartRate(BPM),BP_Sys,BP_Dia";

/// Writer for the checkup file.
///
/// Fields are written as-is, without quoting, so existing readers of the
/// kiosk's data file keep working.
pub fn csv_writer<W: io::Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

impl HealthRecord {
    /// Field values in [`CSV_COLUMNS`] order.
    pub fn csv_fields(&self) -> [String; 12] {
        [
            self.timestamp.clone(),
            self.patient.name.clone(),
            self.patient.age.clone(),
            self.patient.gender.clone(),
            self.patient.address.clone(),
            format!("{:.2}", self.weight),
            format!("{:.2}", self.height),
            format!("{:.2}", self.temperature),
            format!("{:.2}", self.bmi),
            self.heart_rate.to_string(),
            self.bp_systolic.to_string(),
            self.bp_diastolic.to_string(),
        ]
    }

    /// One persistence row without its line terminator.
    pub fn to_csv_row(&self) -> Result<String, csv::Error> {
        let mut writer = csv_writer(Vec::new());
        writer.write_record(self.csv_fields())?;

        let bytes = writer
            .into_inner()
            .map_err(|error| csv::Error::from(error.into_error()))?;
        let row = String::from_utf8_lossy(&bytes);

        Ok(row.trim_end_matches('\n').to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PatientInfo;

    fn record() -> HealthRecord {
        HealthRecord {
            timestamp: "2024-03-01 09:15:00".into(),
            patient: PatientInfo {
                name: "Juan Dela Cruz".into(),
                age: "42".into(),
                gender: "Male".into(),
                address: "Quezon City".into(),
            },
            weight: 70.5,
            height: 172.25,
            temperature: 36.75,
            bmi: 23.75,
            heart_rate: 72,
            bp_systolic: 120,
            bp_diastolic: 80,
            ..Default::default()
        }
    }

    #[test]
    fn row_fields_follow_header_order() {
        let record = record();
        let row = record.to_csv_row().unwrap();
        let fields: Vec<&str> = row.split(',').collect();

        assert_eq!(fields.len(), CSV_HEADER.split(',').count());
        assert_eq!(
            fields,
            [
                "2024-03-01 09:15:00",
                "Juan Dela Cruz",
                "42",
                "Male",
                "Quezon City",
                "70.50",
                "172.25",
                "36.75",
                "23.75",
                "72",
                "120",
                "80",
            ]
        );
    }

    #[test]
    fn numeric_fields_parse_back_to_the_record_values() {
        let record = record();
        let row = record.to_csv_row().unwrap();
        let fields: Vec<&str> = row.split(',').collect();

        assert_eq!(fields[5].parse::<f32>().unwrap(), record.weight);
        assert_eq!(fields[6].parse::<f32>().unwrap(), record.height);
        assert_eq!(fields[7].parse::<f32>().unwrap(), record.temperature);
        assert_eq!(fields[8].parse::<f32>().unwrap(), record.bmi);
        assert_eq!(fields[9].parse::<i32>().unwrap(), record.heart_rate);
        assert_eq!(fields[10].parse::<i32>().unwrap(), record.bp_systolic);
        assert_eq!(fields[11].parse::<i32>().unwrap(), record.bp_diastolic);
    }

    #[test]
    fn empty_record_serializes_zeroes() {
        assert_eq!(
            HealthRecord::new().to_csv_row().unwrap(),
            ",,,,,0.00,0.00,0.00,0.00,0,0,0"
        );
    }

    #[test]
    fn header_line_matches_the_columns() {
        let mut writer = csv_writer(Vec::new());
        writer.write_record(CSV_COLUMNS).unwrap();

        assert_eq!(
            String::from_utf8(writer.into_inner().unwrap()).unwrap(),
            format!("{CSV_HEADER}\n")
        );
    }

    #[test]
    fn text_fields_are_written_unquoted() {
        let record = HealthRecord {
            patient: PatientInfo {
                name: "Juan \"JR\" Cruz".into(),
                address: "12 Rizal St, Cebu".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        assert_eq!(
            record.to_csv_row().unwrap(),
            ",Juan \"JR\" Cruz,,,12 Rizal St, Cebu,0.00,0.00,0.00,0.00,0,0,0"
        );
    }
}
