//! Asynchronous CSV reader with batch interface
//!
//! # Architecture
//!
//! ```text
//! AsyncRead → csv-async deserializer → AsyncReader::read_batch → Vec<LedgerCommand>
//!                                            ↓
//!                                     csv_format module
//!                                 (CsvRecord, convert_csv_record)
//! ```
//!
//! Rows that fail to parse are logged and left out of the batch.

use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::LedgerCommand;

pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
        }
    }

    /// Read up to `batch_size` valid commands
    ///
    /// An empty batch means the input is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<LedgerCommand> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            let row = match records.next().await {
                Some(row) => row,
                None => break,
            };
            self.line_num += 1;

            match row {
                Ok(csv_record) => match convert_csv_record(csv_record) {
                    Ok(command) => batch.push(command),
                    Err(error) => warn!(line = self.line_num, %error, "skipping invalid command"),
                },
                Err(error) => warn!(line = self.line_num, %error, "skipping unparseable row"),
            }
        }

        batch
    }
}
