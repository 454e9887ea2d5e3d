use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use super::{TableError, AVERAGE_SENTINEL, RUN_COLUMN};

/// Which rows of a result table to use.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "kebab_case")]
pub enum RowSelection {
    /// Only the rows with `Average` in the `Run` column
    #[default]
    Aggregates,
    /// Only the per-run rows
    Runs,
    All,
}

/// A CSV file loaded into memory. Cells are kept as text; numeric
/// coercion happens on access.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn read(path: &Path) -> Result<Self, TableError> {
        let parse_error = |reason: String| TableError::Parse {
            path: path.to_owned(),
            reason,
        };
        let file = std::fs::File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TableError::Missing(path.to_owned()),
            _ => parse_error(e.to_string()),
        })?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = reader
            .headers()
            .map_err(|e| parse_error(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();
        let rows = reader
            .records()
            .map(|record| {
                let record = record.map_err(|e| parse_error(e.to_string()))?;
                Ok(record.iter().map(str::to_owned).collect())
            })
            .collect::<Result<_, TableError>>()?;
        Ok(Self {
            path: path.to_owned(),
            headers,
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// The index of the column titled `name`.
    pub fn column(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_owned()))
    }

    /// `None` for cells beyond the end of a short row.
    pub fn text(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// The cell as a finite number, `None` if it is missing, empty or
    /// not numeric (e.g. `N/A`).
    pub fn number(&self, row: usize, column: usize) -> Option<f64> {
        let value: f64 = self.text(row, column)?.trim().parse().ok()?;
        value.is_finite().then_some(value)
    }

    fn is_aggregate(&self, run_column: usize, row: usize) -> bool {
        self.text(row, run_column).map(str::trim) == Some(AVERAGE_SENTINEL)
    }

    /// The indices of the selected rows, in file order. Tables
    /// without a `Run` column have no per-run rows: every row counts
    /// as an aggregate.
    pub fn select(&self, selection: RowSelection) -> Vec<usize> {
        let all = 0..self.rows.len();
        let Ok(run_column) = self.column(RUN_COLUMN) else {
            return match selection {
                RowSelection::Aggregates | RowSelection::All => all.collect(),
                RowSelection::Runs => Vec::new(),
            };
        };
        match selection {
            RowSelection::Aggregates => all
                .filter(|&row| self.is_aggregate(run_column, row))
                .collect(),
            RowSelection::Runs => all
                .filter(|&row| !self.is_aggregate(run_column, row))
                .collect(),
            RowSelection::All => all.collect(),
        }
    }

    /// Partition `rows` by the values in `columns`; groups are in the
    /// order their key first appears, and rows stay in their order.
    pub fn group_by(&self, rows: &[usize], columns: &[usize]) -> Vec<(Vec<String>, Vec<usize>)> {
        let mut groups: Vec<(Vec<String>, Vec<usize>)> = Vec::new();
        for &row in rows {
            let key: Vec<String> = columns
                .iter()
                .map(|&column| self.text(row, column).unwrap_or("").to_owned())
                .collect();
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(row),
                None => groups.push((key, vec![row])),
            }
        }
        groups
    }
}
