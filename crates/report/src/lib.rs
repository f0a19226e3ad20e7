//! Spreadsheet export of analysis results.
//!
//! One worksheet, a bold header row and one row per qualifying follower in
//! listing order. Counters are written as numbers so the sheet sorts and sums
//! correctly.

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use scout_core::ResultRow;
use tracing::info;

pub const SHEET_NAME: &str = "Analysis results";

/// Header text and column width, in output order.
pub const COLUMNS: [(&str, f64); 10] = [
    ("Display name", 20.0),
    ("Username", 20.0),
    ("Email", 25.0),
    ("Followers", 15.0),
    ("Biography", 50.0),
    ("Profile URL", 40.0),
    ("Total videos", 12.0),
    ("Popular videos", 15.0),
    ("Max views", 15.0),
    ("Avg views", 15.0),
];

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("too many rows for one worksheet: {0}")]
    TooManyRows(usize),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ReportBuilder;

#[derive(Debug, PartialEq, Eq)]
enum Cell<'a> {
    Text(&'a str),
    Number(u64),
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Serializes `rows` into an in-memory xlsx workbook.
    pub fn build(&self, rows: &[ResultRow]) -> Result<Vec<u8>, ReportError> {
        let last_row =
            u32::try_from(rows.len()).map_err(|_| ReportError::TooManyRows(rows.len()))?;

        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, (title, width)) in (0u16..).zip(COLUMNS) {
            sheet.write_string_with_format(0, col, title, &header)?;
            sheet.set_column_width(col, width)?;
        }

        for (row_index, row) in (1..=last_row).zip(rows) {
            write_row(sheet, row_index, row)?;
        }

        let bytes = workbook.save_to_buffer()?;
        info!(event_name = "report.built", rows = rows.len(), bytes = bytes.len(), "report built");
        Ok(bytes)
    }
}

fn cells(row: &ResultRow) -> [Cell<'_>; 10] {
    [
        Cell::Text(&row.display_name),
        Cell::Text(&row.handle),
        Cell::Text(&row.email),
        Cell::Number(row.follower_count),
        Cell::Text(&row.biography),
        Cell::Text(&row.profile_url),
        Cell::Number(row.total_posts),
        Cell::Number(row.popular_posts),
        Cell::Number(row.max_views),
        Cell::Number(row.mean_views),
    ]
}

fn write_row(sheet: &mut Worksheet, row_index: u32, row: &ResultRow) -> Result<(), XlsxError> {
    for (col, cell) in (0u16..).zip(cells(row)) {
        match cell {
            Cell::Text(text) => sheet.write_string(row_index, col, text)?,
            Cell::Number(value) => sheet.write_number(row_index, col, value as f64)?,
        };
    }
    Ok(())
}

/// `analyze_results_<handle>_<unix millis>.xlsx`
pub fn report_file_name(handle: &str, at: DateTime<Utc>) -> String {
    format!("analyze_results_{handle}_{}.xlsx", at.timestamp_millis())
}
