use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use log::info;

use crate::error::OutputError;
use crate::extractor::RiderRecord;
use crate::input_loader::InputTable;
use crate::zwiftpower::OUTPUT_COLUMNS;

/// Input columns followed by the four stat columns, one row per input row.
/// `records` must line up with `table.rows`; nothing is written if the counts differ.
pub fn write_results<W: Write>(writer: W, table: &InputTable, records: &[RiderRecord]) -> Result<(), OutputError> {
    if records.len() != table.rows.len() {
        return Err(OutputError::RowCountMismatch {
            rows: table.rows.len(),
            records: records.len(),
        });
    }

    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);

    let header = table
        .headers
        .iter()
        .map(String::as_str)
        .chain(OUTPUT_COLUMNS.iter().copied());
    csv_writer.write_record(header)?;

    for (row, record) in table.rows.iter().zip(records) {
        let fields = row.iter().map(String::as_str).chain(record.values());
        csv_writer.write_record(fields)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_results_file<P: AsRef<Path>>(
    path: P,
    table: &InputTable,
    records: &[RiderRecord],
) -> Result<(), OutputError> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path.as_ref())?;
    write_results(file, table, records)?;
    info!("Wrote {} rows to {:?}", records.len(), path.as_ref());
    Ok(())
}
