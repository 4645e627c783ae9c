//! CSV loading and result serialization
//!
//! The pipeline core consumes an in-memory table; reading it from CSV bytes
//! (or a path, for the CLI) and writing results back out happens here.

use crate::error::{PurifaiError, Result};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

/// Parse CSV-formatted bytes into a table.
///
/// The first row is the header; column types are inferred from a sample.
/// Content that cannot be parsed as a table is an `InvalidInput` failure.
pub fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    let cursor = Cursor::new(bytes.to_vec());
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(cursor)
        .finish()
        .map_err(|e| PurifaiError::InvalidInput(format!("unparseable CSV input: {e}")))
}

/// CSV file loader
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file from disk
    pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PurifaiError::InvalidInput(format!("unparseable CSV input: {e}")))
    }
}

/// Writers for pipeline outputs
pub struct DataSaver;

impl DataSaver {
    /// Save a table to CSV
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;
        CsvWriter::new(&mut file)
            .finish(df)
            .map_err(|e| PurifaiError::DataError(e.to_string()))
    }

    /// Save any serializable record (e.g. the QC summary) as pretty JSON
    pub fn save_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_csv_bytes() {
        let csv = b"a,b,label\n1,2.5,x\n3,4.5,y\n5,,z\n";
        let df = read_csv_bytes(csv).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 3);
        // Empty cell parsed as missing, not zero
        assert_eq!(df.column("b").unwrap().null_count(), 1);
    }

    #[test]
    fn test_read_csv_bytes_garbage() {
        assert!(read_csv_bytes(&[0xff, 0xfe, 0x00, 0x01]).is_err());
    }

    #[test]
    fn test_load_csv_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a,b").unwrap();
        writeln!(file, "1,2").unwrap();
        writeln!(file, "3,4").unwrap();

        let df = DataLoader::load_csv(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_csv_round_trip() {
        let mut df = df!(
            "a" => &[1.0, 2.0, 3.0],
            "tag" => &["x", "y", "z"],
        )
        .unwrap();

        let file = NamedTempFile::new().unwrap();
        DataSaver::save_csv(&mut df, file.path()).unwrap();

        let loaded = DataLoader::load_csv(file.path()).unwrap();
        assert_eq!(loaded.height(), 3);
        assert_eq!(loaded.width(), 2);
    }

    #[test]
    fn test_save_json() {
        #[derive(Serialize)]
        struct Record {
            rows: usize,
        }

        let file = NamedTempFile::new().unwrap();
        DataSaver::save_json(&Record { rows: 7 }, file.path()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("\"rows\": 7"));
    }
}
