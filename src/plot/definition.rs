//! The declarative description of the charts drawn from a result
//! table.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};

use crate::{result_table::RowSelection, sweep::template::placeholders};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename = "Plot")]
pub struct PlotDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// The result table to read
    pub csv: PathBuf,
    pub charts: Vec<ChartDefinition>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ChartKind {
    /// Lines through the points, with markers
    #[default]
    Line,
    Scatter,
    /// One bar per series for each distinct x value
    Bar,
}

/// The value plotted on the y axis.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Measure {
    Column(String),
    /// `numerator / denominator`, 0 where the denominator is not
    /// positive
    Ratio {
        numerator: String,
        denominator: String,
    },
}

impl Measure {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Measure::Column(column) => vec![column.as_str()],
            Measure::Ratio {
                numerator,
                denominator,
            } => vec![numerator.as_str(), denominator.as_str()],
        }
    }

    pub fn description(&self) -> String {
        match self {
            Measure::Column(column) => column.clone(),
            Measure::Ratio {
                numerator,
                denominator,
            } => format!("{numerator} / {denominator}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Svg,
}

/// Where a series' speedup baseline time T0 comes from, when it is
/// not the series' own value at the smallest x. E.g. the serial runs
/// of a benchmark whose chart shows only the parallel ones.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeedupBaseline {
    /// Rows holding baseline times: column -> exact text
    pub filter: BTreeMap<String, String>,
    /// Columns in which a baseline row must agree with the series'
    /// rows
    #[serde(default, rename = "match")]
    pub matching: Vec<String>,
}

impl SpeedupBaseline {
    pub fn new<'a>(
        filter: impl IntoIterator<Item = (&'a str, &'a str)>,
        matching: &[&str],
    ) -> Self {
        Self {
            filter: filter
                .into_iter()
                .map(|(c, v)| (c.to_owned(), v.to_owned()))
                .collect(),
            matching: matching.iter().map(|c| c.to_string()).collect(),
        }
    }
}

fn default_size() -> (u32, u32) {
    (1024, 768)
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartDefinition {
    /// Image file name, relative to the output directory; the
    /// extension selects the format (`png` or `svg`)
    pub output: PathBuf,
    pub title: String,
    #[serde(default)]
    pub kind: ChartKind,
    #[serde(default)]
    pub rows: RowSelection,
    /// Numeric x column
    pub x: String,
    pub y: Measure,
    /// One series per distinct combination of these columns
    #[serde(default)]
    pub group_by: Vec<String>,
    /// Series label template with `{column}` placeholders for
    /// `group_by` columns
    #[serde(default)]
    pub label: Option<String>,
    /// Only use rows where the column has exactly this text
    #[serde(default)]
    pub filter: BTreeMap<String, String>,
    /// Plot `T0 / y` per series instead of y, T0 being the value at
    /// the smallest x unless `speedup_baseline` is given
    #[serde(default)]
    pub speedup: bool,
    #[serde(default)]
    pub speedup_baseline: Option<SpeedupBaseline>,
    /// Plot x on a logarithmic scale with this base
    #[serde(default)]
    pub log_x: Option<f64>,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: Option<String>,
    #[serde(default = "default_size")]
    pub size: (u32, u32),
}

impl ChartDefinition {
    pub fn new(output: &str, title: &str, x: &str, y: Measure) -> Self {
        Self {
            output: output.into(),
            title: title.into(),
            kind: ChartKind::Line,
            rows: RowSelection::Aggregates,
            x: x.into(),
            y,
            group_by: Vec::new(),
            label: None,
            filter: BTreeMap::new(),
            speedup: false,
            speedup_baseline: None,
            log_x: None,
            x_label: None,
            y_label: None,
            size: default_size(),
        }
    }

    pub fn grouped_by(mut self, columns: &[&str], label: Option<&str>) -> Self {
        self.group_by = columns.iter().map(|c| c.to_string()).collect();
        self.label = label.map(String::from);
        self
    }

    pub fn filtered(mut self, column: &str, value: &str) -> Self {
        self.filter.insert(column.into(), value.into());
        self
    }

    pub fn with_speedup(mut self) -> Self {
        self.speedup = true;
        self
    }

    /// Speedup against the mean of the rows `baseline` selects.
    pub fn with_speedup_baseline(mut self, baseline: SpeedupBaseline) -> Self {
        self.speedup = true;
        self.speedup_baseline = Some(baseline);
        self
    }

    pub fn with_log_x(mut self, base: f64) -> Self {
        self.log_x = Some(base);
        self
    }

    pub fn with_rows(mut self, rows: RowSelection) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_kind(mut self, kind: ChartKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_labels(mut self, x_label: &str, y_label: &str) -> Self {
        self.x_label = Some(x_label.into());
        self.y_label = Some(y_label.into());
        self
    }

    pub fn image_format(&self) -> Result<ImageFormat> {
        image_format(&self.output)
    }

    /// All columns the chart reads.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = vec![self.x.as_str()];
        columns.extend(self.y.columns());
        columns.extend(self.group_by.iter().map(String::as_str));
        columns.extend(self.filter.keys().map(String::as_str));
        if let Some(baseline) = &self.speedup_baseline {
            columns.extend(baseline.filter.keys().map(String::as_str));
            columns.extend(baseline.matching.iter().map(String::as_str));
        }
        columns
    }

    pub fn x_description(&self) -> String {
        let x = self.x_label.as_deref().unwrap_or(&self.x);
        match self.log_x {
            Some(base) => format!("{x} (log{base} scale)"),
            None => x.to_owned(),
        }
    }

    pub fn y_description(&self) -> String {
        match (&self.y_label, self.speedup) {
            (Some(label), _) => label.clone(),
            (None, true) => "Speedup".into(),
            (None, false) => self.y.description(),
        }
    }

    pub fn check(&self) -> Result<()> {
        let Self {
            output,
            title: _,
            kind: _,
            rows: _,
            x: _,
            y: _,
            group_by,
            label,
            filter: _,
            speedup,
            speedup_baseline,
            log_x,
            x_label: _,
            y_label: _,
            size,
        } = self;
        self.image_format()?;
        if let Some(label) = label {
            for placeholder in placeholders(label) {
                if !group_by.iter().any(|c| c == placeholder) {
                    bail!(
                        "chart {output:?}: label placeholder {{{placeholder}}} \
                         is not a group_by column"
                    )
                }
            }
        }
        if let Some(baseline) = speedup_baseline {
            if !speedup {
                bail!("chart {output:?}: speedup_baseline given but speedup is off")
            }
            if baseline.filter.is_empty() {
                bail!("chart {output:?}: speedup_baseline needs a filter")
            }
        }
        if let Some(base) = log_x {
            if !(*base > 0. && *base != 1. && base.is_finite()) {
                bail!("chart {output:?}: invalid logarithm base {base}")
            }
        }
        if size.0 == 0 || size.1 == 0 {
            bail!("chart {output:?}: invalid size {size:?}")
        }
        Ok(())
    }
}

fn image_format(path: &Path) -> Result<ImageFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => Ok(ImageFormat::Png),
        Some("svg") => Ok(ImageFormat::Svg),
        _ => bail!("unsupported image file extension in {path:?}, need .png or .svg"),
    }
}

impl PlotDefinition {
    pub fn check(&self) -> Result<()> {
        if self.charts.is_empty() {
            bail!("plot {:?} has no charts", self.name)
        }
        for chart in &self.charts {
            chart.check()?;
        }
        Ok(())
    }
}
