use std::fs::File;
use std::path::Path;

use calamine::{open_workbook, Reader, Xlsx};
use log::{info, warn};

use crate::error::InputError;

/// Input rows kept verbatim so they can be written back out, plus which
/// column holds the rider identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    id_column: usize,
}

impl InputTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, id_column_name: &str) -> Result<Self, InputError> {
        let id_column = find_column(&headers, id_column_name)
            .ok_or_else(|| InputError::MissingColumn(id_column_name.to_string()))?;

        // Ragged rows are padded/cut so every row lines up with the header.
        let width = headers.len();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, mut row)| {
                if row.len() > width {
                    warn!("Row {} has {} cells, header has {}. Extra cells dropped.", i + 1, row.len(), width);
                }
                row.resize(width, String::new());
                row
            })
            .collect();

        Ok(InputTable {
            headers,
            rows,
            id_column,
        })
    }

    /// Identifier of every row, trimmed, in row order.
    pub fn identifiers(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row[self.id_column].trim().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Exact header match first, then case-insensitive.
fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .or_else(|| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name)))
}

pub fn load_table<P: AsRef<Path>>(filename: P, id_column_name: &str) -> Result<InputTable, InputError> {
    let path = filename.as_ref();
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }

    let is_excel = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("xlsx"));

    let table = if is_excel {
        load_excel(path, id_column_name)?
    } else {
        load_csv(path, id_column_name)?
    };

    info!("Loaded {} rows from {:?}", table.len(), path);
    Ok(table)
}

fn load_csv(path: &Path, id_column_name: &str) -> Result<InputTable, InputError> {
    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim_start_matches('\u{feff}').to_string()).collect();
    if headers.is_empty() {
        return Err(InputError::Empty);
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    InputTable::new(headers, rows, id_column_name)
}

fn load_excel(path: &Path, id_column_name: &str) -> Result<InputTable, InputError> {
    let mut excel: Xlsx<_> = open_workbook(path)?;

    let worksheets = excel.worksheets();
    let Some((_name, range)) = worksheets.first() else {
        return Err(InputError::Empty);
    };

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(row) => row.iter().map(|cell| cell.to_string().trim().to_string()).collect(),
        None => return Err(InputError::Empty),
    };

    let rows = sheet_rows
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();

    InputTable::new(headers, rows, id_column_name)
}
