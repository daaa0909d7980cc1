//! Asynchronous CSV operation reader
//!
//! Provides a streaming interface over replay operations from a CSV file.
//! Supports batch reading so replay keeps constant memory usage on large
//! files.
//!
//! # Design
//!
//! The OperationReader uses:
//! - csv-async for streaming CSV parsing
//! - the pure conversion in [`crate::io::csv_format`] for row validation
//!
//! Malformed rows are logged and skipped; replay continues with the next
//! row.

use crate::io::csv_format::{convert_operation, CsvOperation, Operation};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV operation reader
pub struct OperationReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> OperationReader<R> {
    /// Create a new OperationReader from an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read a batch of operations
    ///
    /// Reads up to `batch_size` rows, converting each into an
    /// [`Operation`]. Invalid rows are logged and skipped.
    ///
    /// # Returns
    ///
    /// A vector of successfully converted operations. An empty vector
    /// means the end of the file was reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<CsvOperation>();

        while batch.len() < batch_size {
            match rows.next().await {
                Some(Ok(row)) => match convert_operation(row) {
                    Ok(operation) => batch.push(operation),
                    Err(e) => warn!(error = %e, "skipping invalid row"),
                },
                Some(Err(e)) => warn!(error = %e, "skipping unparseable row"),
                None => break,
            }
        }

        batch
    }
}
