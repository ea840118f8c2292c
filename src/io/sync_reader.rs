//! Synchronous CSV reader with iterator interface
//!
//! Streams ledger commands from a CSV file one row at a time, delegating
//! format concerns to the `csv_format` module.
//!
//! ```no_run
//! use wallet_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("commands.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(command) => println!("{:?}", command),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (missing file) are returned from `new()`
//! - Row errors are yielded as `Err` items, tagged with the file line
//!   number (header is line 1)

use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{LedgerCommand, LedgerError};

#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => LedgerError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => LedgerError::from(error),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<LedgerCommand, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.reader.deserialize::<CsvRecord>().next()?;
        self.line_num += 1;
        let line = self.line_num;

        Some(match row {
            Ok(csv_record) => convert_csv_record(csv_record).map_err(|error| {
                LedgerError::ParseError {
                    line: Some(line),
                    message: error.to_string(),
                }
            }),
            Err(error) => Err(LedgerError::ParseError {
                line: Some(line),
                message: error.to_string(),
            }),
        })
    }
}
