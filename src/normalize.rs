//! Validation and normalization of raw exercise records.
//!
//! Turns an in-memory table of named columns into [`Observation`]s: checks the
//! required columns, defaults and lower-cases sex, drops exercises outside the
//! taxonomy or with a disallowed dominance, derives full exercise names, parses
//! timestamps and sorts stably by (user, timestamp).

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, info};

use crate::domain::{BaseExercise, Dominance, Observation, Sex};
use crate::error::ValidationError;

/// Column names expected in an uploaded dataset (matched case-insensitively).
pub mod columns {
    pub const USER: &str = "user name";
    pub const EXERCISE: &str = "exercise name";
    pub const DOMINANCE: &str = "dominance";
    pub const TIMESTAMP: &str = "exercise createdAt";
    pub const POWER: &str = "power - high";
    pub const ACCELERATION: &str = "acceleration - high";
    pub const SEX: &str = "sex";
    pub const RESISTANCE: &str = "resistance";

    /// Columns that must exist and be non-empty in every row.
    pub const REQUIRED: [&str; 6] = [USER, EXERCISE, DOMINANCE, TIMESTAMP, POWER, ACCELERATION];
}

/// A single table cell as read from the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// True for empty cells and whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed textual form of the cell, None when empty.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::DateTime(dt) => Some(dt.to_string()),
        }
    }
}

/// A dataset of rows with named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Builds a table from string cells; blank strings become empty cells.
    pub fn from_strings(headers: &[&str], rows: &[Vec<&str>]) -> Self {
        let headers = headers.iter().map(|h| h.to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|value| {
                        if value.trim().is_empty() {
                            Cell::Empty
                        } else {
                            Cell::Text(value.to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns a cell; positions past the end of a short row read as empty.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Finds a column by name, ignoring case and surrounding whitespace.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(name))
    }
}

/// Positions of the known columns in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndices {
    pub user: usize,
    pub exercise: usize,
    pub dominance: usize,
    pub timestamp: usize,
    pub power: usize,
    pub acceleration: usize,
    pub sex: Option<usize>,
    pub resistance: Option<usize>,
}

impl ColumnIndices {
    /// Resolves column positions, reporting every missing required column at once.
    pub fn from_table(table: &RawTable) -> Result<Self, ValidationError> {
        let missing: Vec<String> = columns::REQUIRED
            .iter()
            .filter(|name| table.column(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingColumns(missing));
        }

        let find = |name: &str| table.column(name).unwrap_or_default();
        Ok(Self {
            user: find(columns::USER),
            exercise: find(columns::EXERCISE),
            dominance: find(columns::DOMINANCE),
            timestamp: find(columns::TIMESTAMP),
            power: find(columns::POWER),
            acceleration: find(columns::ACCELERATION),
            sex: table.column(columns::SEX),
            resistance: table.column(columns::RESISTANCE),
        })
    }

    fn required(&self) -> [(&'static str, usize); 6] {
        [
            (columns::USER, self.user),
            (columns::EXERCISE, self.exercise),
            (columns::DOMINANCE, self.dominance),
            (columns::TIMESTAMP, self.timestamp),
            (columns::POWER, self.power),
            (columns::ACCELERATION, self.acceleration),
        ]
    }
}

/// Checks the table against the required-columns contract.
///
/// # Errors
/// Returns ValidationError if a required column is missing, any required cell
/// is empty, a power/acceleration cell is non-numeric, or a sex value is
/// neither "male" nor "female".
pub fn validate(table: &RawTable) -> Result<ColumnIndices, ValidationError> {
    let indices = ColumnIndices::from_table(table)?;

    let empty: Vec<String> = indices
        .required()
        .iter()
        .filter(|(_, col)| (0..table.len()).any(|row| table.cell(row, *col).is_empty()))
        .map(|(name, _)| name.to_string())
        .collect();
    if !empty.is_empty() {
        return Err(ValidationError::EmptyValues(empty));
    }

    for row in 0..table.len() {
        let row_num = row + 2; // +1 for 0-index, +1 for header row
        for (name, col) in [
            (columns::POWER, indices.power),
            (columns::ACCELERATION, indices.acceleration),
        ] {
            parse_number(table.cell(row, col), name, row_num)?;
        }

        if let Some(col) = indices.sex {
            parse_sex(table.cell(row, col), row_num)?;
        }
    }

    Ok(indices)
}

/// Validates and normalizes a raw table into chronologically sorted observations.
///
/// Rows with unknown exercises or disallowed dominance values are dropped.
/// The result is sorted by (user, timestamp); ties keep their original row order.
pub fn normalize(table: &RawTable) -> Result<Vec<Observation>, ValidationError> {
    let indices = validate(table)?;

    let mut observations = Vec::with_capacity(table.len());
    let mut unknown_exercise = 0usize;
    let mut invalid_dominance = 0usize;

    for row in 0..table.len() {
        let row_num = row + 2;

        let exercise_name = table.cell(row, indices.exercise).as_text().unwrap_or_default();
        let base = match BaseExercise::from_str(&exercise_name) {
            Ok(base) => base,
            Err(_) => {
                unknown_exercise += 1;
                continue;
            }
        };

        let dominance = table
            .cell(row, indices.dominance)
            .as_text()
            .and_then(|raw| Dominance::canonicalize(&raw));
        let exercise = match base.with_dominance(dominance.as_ref()) {
            Some(exercise) => exercise,
            None => {
                debug!(
                    "Row {}: dominance {:?} not permitted for {}",
                    row_num, dominance, base
                );
                invalid_dominance += 1;
                continue;
            }
        };

        let sex = match indices.sex {
            Some(col) => parse_sex(table.cell(row, col), row_num)?.unwrap_or(Sex::Male),
            None => Sex::Male,
        };

        let observation = Observation {
            user: table.cell(row, indices.user).as_text().unwrap_or_default(),
            sex,
            exercise,
            timestamp: parse_timestamp(table.cell(row, indices.timestamp), row_num)?,
            power: parse_number(table.cell(row, indices.power), columns::POWER, row_num)?,
            acceleration: parse_number(
                table.cell(row, indices.acceleration),
                columns::ACCELERATION,
                row_num,
            )?,
            resistance: indices
                .resistance
                .and_then(|col| parse_resistance(table.cell(row, col))),
        };
        observations.push(observation);
    }

    if unknown_exercise > 0 || invalid_dominance > 0 {
        info!(
            "Dropped {} rows with unknown exercises and {} with invalid dominance",
            unknown_exercise, invalid_dominance
        );
    }

    // Vec::sort_by is stable, so equal (user, timestamp) rows keep input order
    observations.sort_by(|a, b| {
        a.user
            .cmp(&b.user)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });

    info!(
        "Normalized {} of {} rows",
        observations.len(),
        table.len()
    );
    Ok(observations)
}

/// Parses an optional sex cell. Empty cells yield None.
fn parse_sex(cell: &Cell, row: usize) -> Result<Option<Sex>, ValidationError> {
    match cell.as_text() {
        None => Ok(None),
        Some(value) => Sex::from_str(&value)
            .map(Some)
            .map_err(|_| ValidationError::InvalidSex { row, value }),
    }
}

/// Parses an optional numeric cell. Empty cells yield None.
fn parse_number(cell: &Cell, column: &str, row: usize) -> Result<Option<f64>, ValidationError> {
    let non_numeric = |value: String| ValidationError::NonNumeric {
        column: column.to_string(),
        row,
        value,
    };

    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(n) if n.is_finite() => Ok(Some(*n)),
        Cell::Number(n) => Err(non_numeric(n.to_string())),
        Cell::Text(s) if s.trim().is_empty() => Ok(None),
        Cell::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Some(n)),
            _ => Err(non_numeric(s.clone())),
        },
        Cell::DateTime(dt) => Err(non_numeric(dt.to_string())),
    }
}

/// Reads a resistance value such as `12`, `12.5` or `12 lbs`.
fn parse_resistance(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => s
            .trim()
            .trim_end_matches(|c: char| c.is_alphabetic() || c.is_whitespace())
            .parse()
            .ok(),
        _ => None,
    }
}

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Offset-bearing layouts not covered by RFC 3339 (`%z` takes `+0000` or `+00:00`).
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parses a timestamp cell into a timezone-naive instant.
///
/// Offset-bearing values are converted to UTC before the offset is dropped.
fn parse_timestamp(cell: &Cell, row: usize) -> Result<NaiveDateTime, ValidationError> {
    let invalid = |value: String| ValidationError::InvalidTimestamp { row, value };

    let text = match cell {
        Cell::DateTime(dt) => return Ok(*dt),
        Cell::Text(s) => s.trim(),
        Cell::Empty => return Err(invalid("(empty)".to_string())),
        Cell::Number(n) => return Err(invalid(n.to_string())),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_utc());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Ok(dt.naive_utc());
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }

    Err(invalid(text.to_string()))
}
