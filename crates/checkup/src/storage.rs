use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use kiosk_record::{csv_writer, CSV_COLUMNS};
use tracing::info;

/// Lines returned by [`CsvFileStorage::read_all`], header included.
pub const READ_LIMIT_LINES: usize = 50;

#[derive(Debug, thiserror::Error)]
#[error("failed to access {}: {source}", .path.display())]
pub struct StorageError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Append-only store of completed checkups, one row each.
pub trait Storage {
    fn append(&mut self, row: &str) -> Result<(), StorageError>;

    fn read_all(&self) -> Result<String, StorageError>;

    /// Drops every stored row, keeping the header.
    fn clear(&mut self) -> Result<(), StorageError>;
}

#[derive(Debug)]
pub struct CsvFileStorage {
    path: PathBuf,
}

impl CsvFileStorage {
    /// Opens the data file, creating it with the header row when missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let storage = Self { path: path.into() };

        if !storage.path.exists() {
            info!(path = %storage.path.display(), "creating checkup data file");
            storage.write_header()?;
        }

        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_header(&self) -> Result<(), StorageError> {
        let file = File::create(&self.path).map_err(|source| self.error(source))?;

        let mut writer = csv_writer(file);
        writer
            .write_record(CSV_COLUMNS)
            .map_err(|error| self.error(error.into()))?;
        writer.flush().map_err(|source| self.error(source))
    }

    fn error(&self, source: io::Error) -> StorageError {
        StorageError {
            path: self.path.clone(),
            source,
        }
    }
}

impl Storage for CsvFileStorage {
    fn append(&mut self, row: &str) -> Result<(), StorageError> {
        OpenOptions::new()
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{row}"))
            .map_err(|source| self.error(source))?;

        info!(path = %self.path.display(), "checkup saved");

        Ok(())
    }

    fn read_all(&self) -> Result<String, StorageError> {
        let file = File::open(&self.path).map_err(|source| self.error(source))?;

        let mut content = String::new();
        for line in BufReader::new(file).lines().take(READ_LIMIT_LINES) {
            content.push_str(&line.map_err(|source| self.error(source))?);
            content.push('\n');
        }

        Ok(content)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(source) if source.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(self.error(source)),
        }

        self.write_header()?;
        info!(path = %self.path.display(), "checkup data cleared");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kiosk_record::CSV_HEADER;

    use super::*;

    #[test]
    fn new_file_starts_with_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CsvFileStorage::open(dir.path().join("health.csv")).unwrap();

        assert_eq!(storage.read_all().unwrap(), format!("{CSV_HEADER}\n"));
    }

    #[test]
    fn rows_are_appended_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("health.csv");
        let mut storage = CsvFileStorage::open(&path).unwrap();

        storage.append("a,1").unwrap();
        storage.append("b,2").unwrap();

        // Reopening keeps existing rows
        let storage = CsvFileStorage::open(&path).unwrap();
        assert_eq!(
            storage.read_all().unwrap(),
            format!("{CSV_HEADER}\na,1\nb,2\n")
        );
    }

    #[test]
    fn read_all_is_limited() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = CsvFileStorage::open(dir.path().join("health.csv")).unwrap();

        for i in 0..100 {
            storage.append(&format!("row {i}")).unwrap();
        }

        assert_eq!(storage.read_all().unwrap().lines().count(), READ_LIMIT_LINES);
    }

    #[test]
    fn clear_keeps_only_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = CsvFileStorage::open(dir.path().join("health.csv")).unwrap();
        storage.append("a,1").unwrap();

        storage.clear().unwrap();

        assert_eq!(storage.read_all().unwrap(), format!("{CSV_HEADER}\n"));
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let error = CsvFileStorage::open(dir.path().join("missing").join("health.csv")).unwrap_err();

        assert_eq!(error.source.kind(), io::ErrorKind::NotFound);
    }
}
