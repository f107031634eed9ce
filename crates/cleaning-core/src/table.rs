//! In-memory tabular dataset and its CSV codec.
//!
//! A [`Table`] is a header plus positional rows. Values are kept as the text
//! that was read unless a transformation replaces them, so columns the step
//! does not touch are written back as they came in.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::dates::{format_date, format_datetime};
use crate::error::{CleaningError, Result};

/// Field values read as missing.
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
    /// Rendered as `YYYY-MM-DD`
    Date(NaiveDateTime),
    /// Rendered as `YYYY-MM-DD HH:MM:SS`
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Cell for a raw CSV field.
    pub fn from_field(field: &str) -> Self {
        if NA_VALUES.contains(&field) {
            Cell::Null
        } else {
            Cell::Text(field.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric view of the cell. Text that does not parse as a number has none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Null | Cell::Date(_) | Cell::DateTime(_) => None,
        }
    }

    /// Text written to CSV.
    pub fn render(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Date(d) => format_date(d),
            Cell::DateTime(d) => format_datetime(d),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Whether a written file carries a leading unnamed row-index column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexColumn {
    #[default]
    Omit,
    Write,
}

/// An ordered set of rows sharing one header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. It must have one cell per column.
    pub fn push_row(&mut self, row: Vec<Cell>) -> std::result::Result<(), String> {
        if row.len() != self.columns.len() {
            return Err(format!(
                "row has {} fields, header has {}",
                row.len(),
                self.columns.len()
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` in column `name`.
    pub fn get(&self, row: usize, name: &str) -> Option<&Cell> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Keep rows for which `keep` returns true, preserving order.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Cell]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Mutable iterator over every cell of column `idx`, in row order.
    pub fn column_cells_mut(&mut self, idx: usize) -> impl Iterator<Item = &mut Cell> {
        self.rows.iter_mut().map(move |row| &mut row[idx])
    }

    /// Read a table from CSV text with a header row.
    ///
    /// Rows shorter than the header are padded with nulls. Rows longer than
    /// the header are rejected.
    pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Self, String> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let columns: Vec<String> = rdr
            .headers()
            .map_err(|e| e.to_string())?
            .iter()
            .map(str::to_string)
            .collect();
        if columns.is_empty() {
            return Err("no columns to parse from file".to_string());
        }

        let mut table = Table::new(columns);
        let width = table.columns.len();
        for record in rdr.records() {
            let record = record.map_err(|e| e.to_string())?;
            if record.len() > width {
                let line = record.position().map_or(0, |p| p.line());
                return Err(format!(
                    "line {line}: found {} fields, header has {width}",
                    record.len()
                ));
            }
            let mut row: Vec<Cell> = record.iter().map(Cell::from_field).collect();
            row.resize(width, Cell::Null);
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Load a CSV file. Any failure is a [`CleaningError::Load`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let load_err = |reason: String| CleaningError::Load {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::open(path).map_err(|e| load_err(e.to_string()))?;
        Self::from_reader(file).map_err(load_err)
    }

    /// Write the table as CSV with a header row.
    pub fn write_to<W: Write>(&self, writer: W, index: IndexColumn) -> csv::Result<()> {
        let mut wtr = WriterBuilder::new().from_writer(writer);

        match index {
            IndexColumn::Omit => wtr.write_record(&self.columns)?,
            IndexColumn::Write => wtr.write_record(
                std::iter::once("").chain(self.columns.iter().map(String::as_str)),
            )?,
        }

        for (i, row) in self.rows.iter().enumerate() {
            let fields = row.iter().map(Cell::render);
            match index {
                IndexColumn::Omit => wtr.write_record(fields)?,
                IndexColumn::Write => {
                    wtr.write_record(std::iter::once(i.to_string()).chain(fields))?
                }
            }
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the table to `path`, replacing any existing file.
    /// Any failure is a [`CleaningError::Write`].
    pub fn write_path(&self, path: &Path, index: IndexColumn) -> Result<()> {
        let write_err = |reason: String| CleaningError::Write {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::create(path).map_err(|e| write_err(e.to_string()))?;
        self.write_to(file, index).map_err(|e| write_err(e.to_string()))
    }
}
