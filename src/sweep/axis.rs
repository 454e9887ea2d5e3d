//! Axes of a sweep and the configuration points generated from them.

use std::{collections::BTreeMap, fmt::Display};

use itertools::Itertools;

use super::definition::SweepDefinition;

/// A scalar axis value as written in definition files.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) => None,
        }
    }
}

/// Numbers compare numerically, so that `1` in an override matches a
/// level written as `1.0` (some formats do not keep the distinction).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Text(_), _) | (_, Value::Text(_)) => false,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

/// One value of an axis; the label, if given, replaces the value in
/// the CSV and on the console (but never on the command line).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Level {
    Labelled { value: Value, label: String },
    Plain(Value),
}

impl Level {
    pub fn labelled(value: impl Into<Value>, label: &str) -> Self {
        Level::Labelled {
            value: value.into(),
            label: label.into(),
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Level::Labelled { value, label: _ } => value,
            Level::Plain(value) => value,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Level::Labelled { value: _, label } => Some(label),
            Level::Plain(_) => None,
        }
    }
}

impl From<Value> for Level {
    fn from(value: Value) -> Self {
        Level::Plain(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CellFormat {
    /// The value as is
    #[default]
    Plain,
    /// `N` shown as `NxN`, for square grids and matrices
    Square,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Axis {
    /// The name used in `{name}` placeholders and overrides
    pub name: String,
    /// The CSV column title, `name` if not given
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub format: CellFormat,
    pub levels: Vec<Level>,
}

impl Axis {
    pub fn new(name: &str, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::labelled(
            name,
            values.into_iter().map(|v| Level::Plain(v.into())).collect(),
        )
    }

    pub fn labelled(name: &str, levels: Vec<Level>) -> Self {
        Self {
            name: name.into(),
            column: None,
            format: CellFormat::Plain,
            levels,
        }
    }

    pub fn with_column(mut self, column: &str) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_format(mut self, format: CellFormat) -> Self {
        self.format = format;
        self
    }

    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    /// The cell content for `level` in the CSV and the console table.
    pub fn cell(&self, level: &Level) -> String {
        if let Some(label) = level.label() {
            return label.to_owned();
        }
        let value = level.value();
        match self.format {
            CellFormat::Plain => value.to_string(),
            CellFormat::Square => format!("{value}x{value}"),
        }
    }
}

/// A parameter computed from axis values, available to templates.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivedParameter {
    pub name: String,
    pub expr: DerivedExpr,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DerivedExpr {
    /// `1 - x` for the numeric axis `of`
    Complement { of: String },
}

impl DerivedExpr {
    pub fn referenced_axis(&self) -> &str {
        match self {
            DerivedExpr::Complement { of } => of,
        }
    }

    fn evaluate(&self, value: &Value) -> Option<Value> {
        match self {
            DerivedExpr::Complement { of: _ } => Some(Value::Float(1.0 - value.as_f64()?)),
        }
    }
}

/// Where all the `when` axes have the given values, replace the
/// values of the `set` axes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Override {
    pub when: BTreeMap<String, Value>,
    pub set: BTreeMap<String, Value>,
}

impl Override {
    pub fn new<'a>(
        when: impl IntoIterator<Item = (&'a str, Value)>,
        set: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> Self {
        let map = |kvs: &mut dyn Iterator<Item = (&'a str, Value)>| {
            kvs.map(|(k, v)| (k.to_owned(), v)).collect()
        };
        Self {
            when: map(&mut when.into_iter()),
            set: map(&mut set.into_iter()),
        }
    }
}

/// One cell of the experiment: an executable and one level per axis
/// (in the order of `SweepDefinition::axes`).
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationPoint {
    pub executable: usize,
    pub levels: Vec<Level>,
}

impl ConfigurationPoint {
    fn apply(&mut self, axes: &[Axis], rule: &Override) {
        let matches = rule.when.iter().all(|(name, value)| {
            axes.iter()
                .position(|axis| &axis.name == name)
                .map(|i| self.levels[i].value() == value)
                .unwrap_or(false)
        });
        if matches {
            for (name, value) in &rule.set {
                if let Some(i) = axes.iter().position(|axis| &axis.name == name) {
                    self.levels[i] = Level::Plain(value.clone());
                }
            }
        }
    }

    /// Placeholder name to command line string, for axes and derived
    /// parameters.
    pub fn parameters(&self, definition: &SweepDefinition) -> BTreeMap<String, String> {
        let mut parameters: BTreeMap<String, String> = definition
            .axes
            .iter()
            .zip(&self.levels)
            .map(|(axis, level)| (axis.name.clone(), level.value().to_string()))
            .collect();
        for derived in &definition.derived {
            let source = definition
                .axes
                .iter()
                .position(|axis| axis.name == derived.expr.referenced_axis())
                .and_then(|i| derived.expr.evaluate(self.levels[i].value()));
            if let Some(value) = source {
                parameters.insert(derived.name.clone(), value.to_string());
            }
        }
        parameters
    }

    /// The CSV/console cells for the axes, preceded by the executable
    /// name if the definition has an executable column.
    pub fn cells(&self, definition: &SweepDefinition) -> Vec<String> {
        let mut cells = Vec::with_capacity(self.levels.len() + 1);
        if definition.executable_column.is_some() {
            cells.push(definition.executables[self.executable].name.clone());
        }
        cells.extend(
            definition
                .axes
                .iter()
                .zip(&self.levels)
                .map(|(axis, level)| axis.cell(level)),
        );
        cells
    }
}

/// All configuration points of the sweep for the given executables,
/// in nested-loop order (executables outermost, then the axes in
/// definition order), with overrides applied and, if `dedupe` is set,
/// later duplicates removed.
pub fn enumerate_points(
    definition: &SweepDefinition,
    executables: &[usize],
) -> Vec<ConfigurationPoint> {
    let mut points = Vec::new();
    for &executable in executables {
        let combinations = definition
            .axes
            .iter()
            .map(|axis| axis.levels.iter().cloned())
            .multi_cartesian_product();
        for levels in combinations {
            let mut point = ConfigurationPoint { executable, levels };
            for rule in &definition.overrides {
                point.apply(&definition.axes, rule);
            }
            if !(definition.dedupe && points.contains(&point)) {
                points.push(point);
            }
        }
    }
    points
}
