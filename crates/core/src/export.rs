//! CSV export of list views.
//!
//! Output is a header line followed by exactly one `\n`-terminated line per row. Line breaks
//! inside values are flattened to spaces so that a spreadsheet import or a line count sees one
//! record per line.

use crate::{ClinicError, ClinicResult};
use chrono::NaiveDate;

pub const LAB_RESULT_HEADERS: [&str; 5] = ["Panel", "Test", "Result", "Units", "Reference Range"];

pub const LAB_ORDER_HEADERS: [&str; 7] = [
    "Order Number",
    "Patient",
    "Test",
    "Urgency",
    "Status",
    "Date Activated",
    "Comment",
];

pub const STOCK_ITEM_HEADERS: [&str; 6] = [
    "Item",
    "Category",
    "Dispensing Unit",
    "Reorder Level",
    "Is Drug",
    "Has Expiration",
];

pub const PRESCRIPTION_HEADERS: [&str; 6] = [
    "Medication",
    "Status",
    "Dosage",
    "Quantity",
    "Prescriber",
    "Date Written",
];

pub const RECONCILIATION_HEADERS: [&str; 6] = [
    "Item",
    "Batch",
    "System Quantity",
    "Physical Quantity",
    "Difference",
    "Variance %",
];

/// A row that can be written as a CSV record.
pub trait CsvRow {
    fn csv_fields(&self) -> Vec<String>;
}

/// Render `rows` as CSV text under `headers`.
///
/// # Errors
///
/// Returns [`ClinicError::InvalidInput`] if a row does not have one field per header.
pub fn to_csv<R: CsvRow>(headers: &[&str], rows: &[R]) -> ClinicResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers.iter().map(|h| flatten(h)))?;
    for (index, row) in rows.iter().enumerate() {
        let fields = row.csv_fields();
        if fields.len() != headers.len() {
            return Err(ClinicError::InvalidInput(format!(
                "CSV row {} has {} fields, expected {}",
                index + 1,
                fields.len(),
                headers.len()
            )));
        }
        writer.write_record(fields.iter().map(|f| flatten(f)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ClinicError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

/// `"{prefix}-{YYYY-MM-DD}.csv"`
pub fn export_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.csv", prefix, date.format("%Y-%m-%d"))
}

fn flatten(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(&'static str, &'static str);

    impl CsvRow for Row {
        fn csv_fields(&self) -> Vec<String> {
            vec![self.0.to_string(), self.1.to_string()]
        }
    }

    #[test]
    fn header_then_one_line_per_row() {
        let rows = [
            Row("Haemoglobin", "13.2"),
            Row("Comment", "line one\nline two"),
            Row("Quoted, value", "say \"hi\""),
        ];
        let csv = to_csv(&["Test", "Result"], &rows).expect("csv");
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Test,Result");
        assert_eq!(lines.len() - 1, rows.len());
        assert_eq!(lines[2], "Comment,line one line two");
        assert_eq!(lines[3], "\"Quoted, value\",\"say \"\"hi\"\"\"");
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn empty_export_is_just_the_header() {
        let csv = to_csv::<Row>(&LAB_RESULT_HEADERS, &[]).expect("csv");
        assert_eq!(csv, "Panel,Test,Result,Units,Reference Range\n");
    }

    #[test]
    fn rejects_rows_of_the_wrong_width() {
        let err = to_csv(&["Only"], &[Row("a", "b")]).expect_err("width mismatch");
        assert!(matches!(err, ClinicError::InvalidInput(_)));
    }

    #[test]
    fn filename_carries_the_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
        assert_eq!(export_filename("lab-results", date), "lab-results-2026-10-19.csv");
    }
}
