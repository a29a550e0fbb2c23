use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{StringRecord, StringRecordsIntoIter};
use itertools::Itertools;

use crate::error::{CustomError, Result};
use crate::model::{MARKER_COLUMNS, MarkerRow};

/// Streams marker rows out of a comma-separated genotype table.
pub struct MarkerTableReader {
    path: PathBuf,
    header: StringRecord,
    records: StringRecordsIntoIter<File>,
    poisoned: bool,
}

impl MarkerTableReader {
    /// Opens the table and checks its header before any row is read.
    pub fn open(path: &impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|source| CustomError::CsvRead {
                source,
                path: path.clone(),
            })?;
        let header = reader
            .headers()
            .map_err(|source| CustomError::CsvRead {
                source,
                path: path.clone(),
            })?
            .clone();
        validate_header(&header)?;

        Ok(Self {
            path,
            header,
            records: reader.into_records(),
            poisoned: false,
        })
    }

    pub fn header(&self) -> &StringRecord {
        &self.header
    }

    pub fn n_samples(&self) -> usize {
        self.header.len() - MARKER_COLUMNS.len()
    }
}

impl Iterator for MarkerTableReader {
    type Item = Result<MarkerRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned {
            return None;
        }
        match self.records.next()? {
            Ok(record) => {
                let line_num = record.position().map_or(0, |p| p.line());
                Some(Ok(MarkerRow { line_num, record }))
            }
            Err(source) => {
                // Poison iterator to prevent further reads
                self.poisoned = true;
                Some(Err(CustomError::CsvRead {
                    source,
                    path: self.path.clone(),
                }))
            }
        }
    }
}

pub fn validate_header(header: &StringRecord) -> Result<()> {
    let leading: Vec<&str> = header.iter().take(MARKER_COLUMNS.len()).collect();
    if leading != MARKER_COLUMNS {
        let found = if leading.is_empty() {
            "no columns".to_string()
        } else {
            leading.iter().join(", ")
        };
        return Err(CustomError::Header { found });
    }
    Ok(())
}
