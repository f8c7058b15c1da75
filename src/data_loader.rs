//! CSV readers for the model's input tables.
//!
//! Matrices are plain comma separated numbers without a header. Column files (population,
//! municipality codes, seeding table) have a header row that is skipped.
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};

use crate::error::ModelError;
use crate::log::warn;

fn open(path: &Path, has_headers: bool) -> Result<csv::Reader<std::fs::File>, ModelError> {
    if !path.exists() {
        return Err(ModelError::FileNotFound(path.to_path_buf()));
    }
    Ok(ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?)
}

fn parse_cell<T: FromStr>(
    path: &Path,
    record: &StringRecord,
    row: usize,
    column: usize,
) -> Result<T, ModelError> {
    let value = record.get(column).unwrap_or_default();
    value.parse::<T>().map_err(|_| ModelError::ParseError {
        path: path.to_path_buf(),
        row,
        column,
        value: value.to_string(),
    })
}

/// Reads every row of a headerless numeric CSV. Rows may have different lengths; callers that
/// need a shape use [`read_matrix_with_shape`].
pub fn read_matrix(path: &Path) -> Result<Vec<Vec<f64>>, ModelError> {
    let mut reader = open(path, false)?;
    let mut matrix = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let values = (0..record.len())
            .map(|column| {
                let value: f64 = parse_cell(path, &record, row, column)?;
                if value.is_nan() {
                    warn!(
                        "NaN value at ({row},{column}) in {}; keeping it",
                        path.display()
                    );
                }
                Ok(value)
            })
            .collect::<Result<Vec<f64>, ModelError>>()?;
        matrix.push(values);
    }
    Ok(matrix)
}

/// Reads a headerless numeric CSV that must be exactly `rows x columns`.
pub fn read_matrix_with_shape(
    path: &Path,
    rows: usize,
    columns: usize,
) -> Result<Vec<Vec<f64>>, ModelError> {
    let matrix = read_matrix(path)?;
    let mismatch = |found_columns: usize| ModelError::DimensionMismatch {
        path: path.to_path_buf(),
        expected: (rows, columns),
        found: (matrix.len(), found_columns),
    };
    if matrix.len() != rows {
        return Err(mismatch(matrix.first().map_or(0, Vec::len)));
    }
    if let Some(row) = matrix.iter().find(|row| row.len() != columns) {
        return Err(mismatch(row.len()));
    }
    Ok(matrix)
}

/// Reads a headerless `N x N` matrix into a fixed size array.
pub fn read_square_matrix<const N: usize>(path: &Path) -> Result<[[f64; N]; N], ModelError> {
    let rows = read_matrix_with_shape(path, N, N)?;
    let mut matrix = [[0.0; N]; N];
    for (target, row) in matrix.iter_mut().zip(rows) {
        target.copy_from_slice(&row);
    }
    Ok(matrix)
}

/// Reads one column of a CSV.
pub fn read_column<T: FromStr>(
    path: &Path,
    column: usize,
    has_headers: bool,
) -> Result<Vec<T>, ModelError> {
    let mut reader = open(path, has_headers)?;
    reader
        .records()
        .enumerate()
        .map(|(row, record)| parse_cell(path, &record?, row, column))
        .collect()
}

/// Reads every row of a headerless CSV as raw records.
pub fn read_records(path: &Path) -> Result<Vec<StringRecord>, ModelError> {
    let mut reader = open(path, false)?;
    reader
        .records()
        .map(|record| record.map_err(ModelError::from))
        .collect()
}
