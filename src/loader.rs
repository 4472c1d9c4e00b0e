//! Dataset loading from CSV and spreadsheet files.
//!
//! Produces an untyped [`RawTable`]; all validation happens in the normalizer.

use std::io::Read;
use std::path::Path;

use calamine::{Data, DataType, Reader, open_workbook_auto};
use log::debug;

use crate::error::LoadError;
use crate::normalize::{Cell, RawTable};

/// Loads a dataset, choosing the reader from the file extension.
///
/// # Errors
/// Returns LoadError if the file is missing, unreadable, or of an unsupported type.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<RawTable, LoadError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LoadError::FileNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .map_err(|e| LoadError::CannotRead(format!("{}: {}", path.display(), e)))?;
            read_csv(file)
        }
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path),
        _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Reads a comma-separated dataset with a header row.
///
/// Short rows are accepted; missing trailing cells read as empty.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::InvalidFormat(format!("cannot read header row: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            LoadError::InvalidFormat(format!("row {}: {}", row_idx + 2, e))
        })?;
        rows.push(record.iter().map(text_cell).collect());
    }

    debug!("Read {} CSV rows with {} columns", rows.len(), headers.len());
    Ok(RawTable::new(headers, rows))
}

/// Reads the first worksheet of a spreadsheet workbook.
fn read_workbook(path: &Path) -> Result<RawTable, LoadError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| LoadError::CannotRead(format!("{}: {}", path.display(), e)))?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names
        .first()
        .ok_or_else(|| LoadError::InvalidFormat("workbook has no sheets".to_string()))?;

    let range = workbook.worksheet_range(sheet_name).map_err(|e| {
        LoadError::CannotRead(format!("cannot read sheet '{}': {}", sheet_name, e))
    })?;

    let mut rows = range.rows();

    let header = rows
        .next()
        .ok_or_else(|| LoadError::InvalidFormat("empty worksheet".to_string()))?;
    let headers = header
        .iter()
        .map(|cell| cell.get_string().map(|s| s.trim().to_string()).unwrap_or_default())
        .collect();

    let rows: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(convert_cell).collect::<Vec<Cell>>())
        // Trailing blank rows are common at the end of spreadsheets
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();

    debug!("Read {} rows from sheet '{}'", rows.len(), sheet_name);
    Ok(RawTable::new(headers, rows))
}

fn text_cell(value: &str) -> Cell {
    if value.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(value.to_string())
    }
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => text_cell(s),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Cell::DateTime(ndt),
            None => Cell::Text(format!("{:?}", dt)),
        },
        Data::Error(e) => Cell::Text(format!("{:?}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_headers_and_rows() {
        let data = "user name, exercise name ,power - high\nA,Lateral Bound,50\nB,,\n";
        let table = read_csv(data.as_bytes()).unwrap();

        assert_eq!(table.headers(), &["user name", "exercise name", "power - high"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0), &Cell::Text("A".to_string()));
        assert_eq!(table.cell(1, 1), &Cell::Empty);
        assert_eq!(table.cell(1, 2), &Cell::Empty);
    }

    #[test]
    fn test_read_csv_short_rows_are_padded() {
        let data = "a,b,c\n1\n";
        let table = read_csv(data.as_bytes()).unwrap();
        assert_eq!(table.cell(0, 0), &Cell::Text("1".to_string()));
        assert_eq!(table.cell(0, 2), &Cell::Empty);
    }

    #[test]
    fn test_load_table_missing_file() {
        let err = load_table("/nonexistent/dataset.csv").unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound(_)));
    }

    #[test]
    fn test_load_table_reads_first_worksheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.xlsx");

        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        let headers = [
            "User Name",
            "Exercise Name",
            "Dominance",
            "Exercise createdAt",
            "Power - High",
            "Acceleration - High",
            "Sex",
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet.get_cell_mut((col as u32 + 1, 1)).set_value(*header);
        }
        sheet.get_cell_mut((1, 2)).set_value("A");
        sheet.get_cell_mut((2, 2)).set_value("Lateral Bound");
        sheet.get_cell_mut((3, 2)).set_value("Dominant");
        sheet.get_cell_mut((4, 2)).set_value("2024-01-01 09:00:00");
        sheet.get_cell_mut((5, 2)).set_value_number(450);
        sheet.get_cell_mut((6, 2)).set_value_number(9.5);
        sheet.get_cell_mut((7, 2)).set_value("female");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.headers(), &headers);
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, 0), &Cell::Text("A".to_string()));
        assert_eq!(table.cell(0, 4), &Cell::Number(450.0));

        let observations = crate::normalize::normalize(&table).unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].exercise.to_string(), "Lateral Bound (Dominant)");
        assert_eq!(observations[0].power, Some(450.0));
        assert_eq!(observations[0].acceleration, Some(9.5));
    }

    #[test]
    fn test_convert_cell_variants() {
        assert_eq!(convert_cell(&Data::Int(12)), Cell::Number(12.0));
        assert_eq!(convert_cell(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(convert_cell(&Data::String("  ".to_string())), Cell::Empty);
        assert_eq!(
            convert_cell(&Data::String("male".to_string())),
            Cell::Text("male".to_string())
        );
    }
}
