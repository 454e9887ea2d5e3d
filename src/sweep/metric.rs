//! What is measured per run, and how it is obtained from the run.

use std::time::Duration;

use crate::serde::regex::SerializableRegex;

/// Prefix of the single structured result line an executable may print.
pub const RECORD_PREFIX: &str = "PARBENCH";

pub const WALL_CLOCK_COLUMN: &str = "Execution Time (s)";
pub const WALL_CLOCK_AVERAGE_COLUMN: &str = "Average Time (s)";

fn default_precision() -> usize {
    5
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metric {
    /// CSV column for the per-run values
    pub column: String,
    /// CSV column for the averages; "Average <column>" if not given
    #[serde(default)]
    pub average_column: Option<String>,
    /// Decimal places written to the CSV
    #[serde(default = "default_precision")]
    pub precision: usize,
    pub source: MetricSource,
}

impl Metric {
    pub fn new(column: &str, source: MetricSource) -> Self {
        Self {
            column: column.into(),
            average_column: None,
            precision: default_precision(),
            source,
        }
    }

    pub fn with_average_column(mut self, column: &str) -> Self {
        self.average_column = Some(column.into());
        self
    }

    pub fn wall_clock() -> Self {
        Self::new(WALL_CLOCK_COLUMN, MetricSource::WallClock)
            .with_average_column(WALL_CLOCK_AVERAGE_COLUMN)
    }

    pub fn average_column(&self) -> String {
        match &self.average_column {
            Some(column) => column.clone(),
            None => format!("Average {}", self.column),
        }
    }

    pub fn format_value(&self, value: f64) -> String {
        format!("{value:.*}", self.precision)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MetricSource {
    /// Seconds between spawning the process and reaping it
    WallClock,
    /// The first stdout line containing `marker`
    Marker { marker: String, extract: Extract },
    /// Capture group 1 of the first match in stdout
    Pattern { regex: SerializableRegex },
    /// Field `key` of the `PARBENCH {...}` line
    Record { key: String },
}

impl MetricSource {
    pub fn needs_stdout(&self) -> bool {
        !matches!(self, MetricSource::WallClock)
    }

    /// Obtain the value from a successful run. The error is the reason
    /// for the failure, without the metric name.
    pub fn extract(&self, elapsed: Duration, stdout: &str) -> Result<f64, String> {
        match self {
            MetricSource::WallClock => Ok(elapsed.as_secs_f64()),
            MetricSource::Marker { marker, extract } => {
                let line = stdout
                    .lines()
                    .find(|line| line.contains(marker.as_str()))
                    .ok_or_else(|| format!("no line containing {marker:?}"))?;
                let token = extract.token(line).ok_or_else(|| {
                    format!("line {line:?} has no value at {extract:?}")
                })?;
                parse_number(token)
            }
            MetricSource::Pattern { regex } => {
                let captures = regex
                    .captures(stdout)
                    .ok_or_else(|| format!("no match for regex {:?}", regex.as_str()))?;
                let value = captures
                    .get(1)
                    .ok_or_else(|| format!("regex {:?} has no capture group 1", regex.as_str()))?;
                parse_number(value.as_str())
            }
            MetricSource::Record { key } => {
                let record = parse_record(stdout)?;
                match record.get(key) {
                    Some(serde_json::Value::Number(n)) => n
                        .as_f64()
                        .ok_or_else(|| format!("field {key:?} is not representable as f64")),
                    Some(other) => Err(format!("field {key:?} is not a number: {other}")),
                    None => Err(format!("record has no field {key:?}")),
                }
            }
        }
    }
}

/// How to pick the value out of a marker line.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Extract {
    /// First whitespace-separated token after the first `:`
    AfterColon,
    /// Last whitespace-separated token of the line
    LastToken,
    /// Whitespace-separated token at `index` (0-based) of the line
    Token { index: usize },
}

impl Extract {
    fn token<'l>(&self, line: &'l str) -> Option<&'l str> {
        match self {
            Extract::AfterColon => {
                let (_, rest) = line.split_once(':')?;
                rest.split_whitespace().next()
            }
            Extract::LastToken => line.split_whitespace().last(),
            Extract::Token { index } => line.split_whitespace().nth(*index),
        }
    }
}

fn parse_number(s: &str) -> Result<f64, String> {
    s.trim()
        .parse()
        .map_err(|e| format!("{s:?} is not a number: {e}"))
}

fn parse_record(stdout: &str) -> Result<serde_json::Map<String, serde_json::Value>, String> {
    let mut records = stdout.lines().filter_map(|line| {
        let rest = line.strip_prefix(RECORD_PREFIX)?;
        rest.starts_with(char::is_whitespace).then_some(rest.trim())
    });
    let record = records
        .next()
        .ok_or_else(|| format!("no {RECORD_PREFIX} line in output"))?;
    if records.next().is_some() {
        return Err(format!("more than one {RECORD_PREFIX} line in output"));
    }
    serde_json::from_str(record)
        .map_err(|e| format!("invalid {RECORD_PREFIX} record {record:?}: {e}"))
}
