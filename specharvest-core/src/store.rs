//! Delimited-file persistence for raw and normalized datasets.
//!
//! Output files are named after the moment they are produced and are always
//! created fresh: an existing file is never overwritten.

use crate::dataset::{RawDataset, RawRecord};
use crate::error::Result;
use crate::normalize::NormalizedDataset;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// A delimited file as read back from disk: header plus text cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl From<&RawDataset> for RawTable {
    fn from(dataset: &RawDataset) -> Self {
        RawTable {
            header: dataset.header(),
            rows: dataset
                .records()
                .iter()
                .map(|r| r.fields().into_iter().map(str::to_string).collect())
                .collect(),
        }
    }
}

pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn raw_file_name(timestamp: &str) -> String {
    format!("Raw_data_{}.csv", timestamp)
}

/// `cleaned_<ts>_data_from_file_(<raw file stem>).<ext>`
pub fn normalized_file_name(timestamp: &str, raw_path: &Path, format: OutputFormat) -> String {
    let stem = raw_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string());
    format!(
        "cleaned_{}_data_from_file_({}).{}",
        timestamp,
        stem,
        format.extension()
    )
}

/// Create `path` (and its parent directory); fails if the file already exists.
pub fn create_new_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().write(true).create_new(true).open(path)
}

/// Incremental raw CSV writer; every [`flush`](RawCsvSink::flush) leaves a
/// readable checkpoint on disk.
pub struct RawCsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    written: usize,
}

impl RawCsvSink {
    pub fn create(path: &Path, header: &[String]) -> Result<Self> {
        let file = create_new_file(path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(header)?;
        writer.flush()?;
        debug!("Opened raw dataset checkpoint {}", path.display());
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            written: 0,
        })
    }

    pub fn append(&mut self, record: &RawRecord) -> Result<()> {
        self.writer.write_record(record.fields())?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

/// Write a complete raw dataset in one go.
pub fn write_raw_dataset(dataset: &RawDataset, path: &Path) -> Result<()> {
    let mut sink = RawCsvSink::create(path, &dataset.header())?;
    for record in dataset.records() {
        sink.append(record)?;
    }
    sink.flush()?;
    info!("Wrote {} record(s) to {}", dataset.len(), path.display());
    Ok(())
}

/// Read a delimited file; short rows are padded and long rows cut to the header.
pub fn read_raw_table(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(header.len(), String::new());
        rows.push(row);
    }

    info!("Loaded {} row(s) from {}", rows.len(), path.display());
    Ok(RawTable { header, rows })
}

pub fn write_normalized(dataset: &NormalizedDataset, path: &Path, format: OutputFormat) -> Result<()> {
    let file = create_new_file(path)?;
    match format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(&dataset.columns)?;
            for row in &dataset.rows {
                writer.write_record(row.iter().map(|v| v.to_string()))?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            let mut objects = Vec::with_capacity(dataset.len());
            for row in &dataset.rows {
                let mut object = serde_json::Map::new();
                for (column, value) in dataset.columns.iter().zip(row) {
                    object.insert(column.clone(), serde_json::to_value(value)?);
                }
                objects.push(serde_json::Value::Object(object));
            }
            let mut file = file;
            serde_json::to_writer_pretty(&mut file, &objects)?;
            file.write_all(b"\n")?;
        }
    }
    info!("Wrote {} normalized row(s) to {}", dataset.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("CSV"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("xlsx"), None);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            raw_file_name("2024-10-15_12-16-17"),
            "Raw_data_2024-10-15_12-16-17.csv"
        );
        assert_eq!(
            normalized_file_name(
                "2024-10-16_08-00-00",
                Path::new("out/Raw_data_2024-10-15_12-16-17.csv"),
                OutputFormat::Csv
            ),
            "cleaned_2024-10-16_08-00-00_data_from_file_(Raw_data_2024-10-15_12-16-17).csv"
        );
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = timestamp();
        assert_eq!(ts.len(), "2024-10-15_12-16-17".len());
        assert_eq!(ts.matches('-').count(), 4);
        assert!(ts.contains('_'));
    }
}
