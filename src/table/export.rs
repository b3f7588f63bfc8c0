//! Spreadsheet export of the filtered rows.
//!
//! Records are serialized with serde and flattened into a grid whose header is
//! the key set of the first record. Later records contribute only the values
//! for those keys; extra keys are dropped and missing ones stay empty.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl SheetCell {
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SheetCell::Empty,
            Value::Bool(flag) => SheetCell::Bool(*flag),
            Value::Number(number) => match number.as_f64() {
                Some(number) => SheetCell::Number(number),
                None => SheetCell::Text(number.to_string()),
            },
            Value::String(text) => SheetCell::Text(text.clone()),
            other => SheetCell::Text(other.to_string()),
        }
    }

    fn as_csv_field(&self) -> String {
        match self {
            SheetCell::Empty => String::new(),
            SheetCell::Text(text) => text.clone(),
            SheetCell::Number(number) => number.to_string(),
            SheetCell::Bool(flag) => flag.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// Picks the format from the file extension; anything but `.csv` is xlsx.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Xlsx,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub format: ExportFormat,
    pub records: usize,
    pub columns: usize,
}

fn to_object<T: Serialize>(record: &T) -> Map<String, Value> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(err) => {
            tracing::warn!(error = %err, "record could not be serialized for export");
            Map::new()
        }
    }
}

/// Header row followed by one row per record. Empty input yields an empty grid.
pub fn sheet_rows<T: Serialize>(records: &[&T]) -> Vec<Vec<SheetCell>> {
    let objects: Vec<Map<String, Value>> = records.iter().map(|record| to_object(*record)).collect();
    let Some(first) = objects.first() else {
        return Vec::new();
    };

    let header: Vec<String> = first.keys().cloned().collect();
    let mut grid = Vec::with_capacity(objects.len() + 1);
    grid.push(header.iter().map(|key| SheetCell::Text(key.clone())).collect());

    for object in &objects {
        let dropped = object.keys().filter(|key| !header.contains(key)).count();
        if dropped > 0 {
            tracing::debug!(dropped, "record keys outside the header were not exported");
        }
        grid.push(
            header
                .iter()
                .map(|key| object.get(key).map(SheetCell::from_json).unwrap_or(SheetCell::Empty))
                .collect(),
        );
    }

    grid
}

pub fn write_xlsx(grid: &[Vec<SheetCell>], sheet_name: &str, path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (row_index, row) in grid.iter().enumerate() {
        let row_number = u32::try_from(row_index).unwrap_or(u32::MAX);
        for (col_index, cell) in row.iter().enumerate() {
            let col_number = u16::try_from(col_index).unwrap_or(u16::MAX);
            match cell {
                SheetCell::Empty => {}
                SheetCell::Text(text) if row_index == 0 => {
                    worksheet.write_string_with_format(row_number, col_number, text, &header_format)?;
                }
                SheetCell::Text(text) => {
                    worksheet.write_string(row_number, col_number, text)?;
                }
                SheetCell::Number(number) => {
                    worksheet.write_number(row_number, col_number, *number)?;
                }
                SheetCell::Bool(flag) => {
                    worksheet.write_boolean(row_number, col_number, *flag)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

pub fn write_csv(grid: &[Vec<SheetCell>], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in grid {
        writer.write_record(row.iter().map(SheetCell::as_csv_field))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `records` to `path` in the format implied by its extension.
pub fn export_records<T: Serialize>(
    records: &[&T],
    sheet_name: &str,
    path: &Path,
) -> Result<ExportSummary, ExportError> {
    let grid = sheet_rows(records);
    let format = ExportFormat::from_path(path);
    match format {
        ExportFormat::Xlsx => write_xlsx(&grid, sheet_name, path)?,
        ExportFormat::Csv => write_csv(&grid, path)?,
    }

    let summary = ExportSummary {
        format,
        records: records.len(),
        columns: grid.first().map(Vec::len).unwrap_or(0),
    };
    tracing::info!(
        path = %path.display(),
        records = summary.records,
        columns = summary.columns,
        "export written"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use serde_json::json;

    use super::*;

    #[derive(Serialize)]
    struct Record {
        id: String,
        name: String,
    }

    fn text(value: &str) -> SheetCell {
        SheetCell::Text(value.to_string())
    }

    #[test]
    fn uniform_records_produce_header_plus_rows() {
        let records = [
            Record { id: "1".to_string(), name: "A".to_string() },
            Record { id: "2".to_string(), name: "B".to_string() },
        ];
        let refs: Vec<&Record> = records.iter().collect();
        let grid = sheet_rows(&refs);

        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0], vec![text("id"), text("name")]);
        assert_eq!(grid[1], vec![text("1"), text("A")]);
        assert_eq!(grid[2], vec![text("2"), text("B")]);
    }

    #[test]
    fn empty_input_is_an_empty_grid() {
        let refs: Vec<&Record> = Vec::new();
        assert!(sheet_rows(&refs).is_empty());
    }

    #[test]
    fn first_record_defines_the_header() {
        let first = json!({"id": "1", "name": "A"});
        let second = json!({"name": "B", "email": "b@quanskill.com"});
        let grid = sheet_rows(&[&first, &second]);

        assert_eq!(grid[0], vec![text("id"), text("name")]);
        assert_eq!(grid[2], vec![SheetCell::Empty, text("B")]);
    }

    #[test]
    fn json_values_map_to_typed_cells() {
        let record = json!({
            "capacity": 40,
            "active": true,
            "cover_image": null,
            "skills": ["sql", "excel"]
        });
        let grid = sheet_rows(&[&record]);
        assert_eq!(
            grid[1],
            vec![
                SheetCell::Number(40.0),
                SheetCell::Bool(true),
                SheetCell::Empty,
                text("[\"sql\",\"excel\"]"),
            ]
        );
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("cohorts.CSV")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("cohorts.xlsx")), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::from_path(Path::new("cohorts")), ExportFormat::Xlsx);
    }

    #[test]
    fn writes_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faqs.csv");
        let records = [
            Record { id: "1".to_string(), name: "A".to_string() },
            Record { id: "2".to_string(), name: "B, C".to_string() },
        ];
        let refs: Vec<&Record> = records.iter().collect();

        let summary = export_records(&refs, "Faqs", &path).unwrap();
        assert_eq!(summary.format, ExportFormat::Csv);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.columns, 2);

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines, vec!["id,name", "1,A", "2,\"B, C\""]);
    }

    #[test]
    fn writes_xlsx_workbook_even_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohorts.xlsx");
        let refs: Vec<&Record> = Vec::new();

        let summary = export_records(&refs, "Cohorts", &path).unwrap();
        assert_eq!(summary.format, ExportFormat::Xlsx);
        assert_eq!(summary.columns, 0);

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
