//! The declarative description of a sweep, as loaded from a preset or
//! a configuration file.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::result_table::ResultSchema;

use super::{
    axis::{Axis, DerivedParameter, Override},
    metric::Metric,
    template::placeholders,
    SweepError,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Executable {
    /// Shown in the executable column and in messages
    pub name: String,
    /// Relative paths are resolved against `build_dir`
    pub path: PathBuf,
}

impl Executable {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// What to do when an executable is not present at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MissingExecutable {
    /// Refuse to start
    #[default]
    Fail,
    /// Warn and sweep the remaining executables
    Skip,
}

/// What to do when a run exits non-zero or times out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FailurePolicy {
    /// Stop the sweep with an error
    #[default]
    Abort,
    /// Record the run's metrics as unavailable and carry on
    Unavailable,
}

fn default_build_dir() -> PathBuf {
    "../build".into()
}

fn default_dedupe() -> bool {
    true
}

fn default_runs_per_test() -> usize {
    5
}

fn default_metrics() -> Vec<Metric> {
    vec![Metric::wall_clock()]
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename = "Sweep")]
pub struct SweepDefinition {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// The directory relative executable paths are resolved against
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,

    pub executables: Vec<Executable>,

    /// If given, the CSV gets a first column with this title holding
    /// the executable name
    #[serde(default)]
    pub executable_column: Option<String>,

    #[serde(default)]
    pub missing_executable: MissingExecutable,

    /// Files that must exist before anything is run (e.g. an MPI
    /// machines file)
    #[serde(default)]
    pub required_files: Vec<PathBuf>,

    /// Templates placed before the executable path, e.g. `mpiexec -n
    /// {processes}`
    #[serde(default)]
    pub launcher: Vec<String>,

    /// Templates for the arguments after the executable path
    #[serde(default)]
    pub args: Vec<String>,

    /// Template for the text fed to the executable's stdin
    #[serde(default)]
    pub stdin: Option<String>,

    pub axes: Vec<Axis>,

    #[serde(default)]
    pub derived: Vec<DerivedParameter>,

    #[serde(default)]
    pub overrides: Vec<Override>,

    /// Remove configuration points that overrides made identical to
    /// an earlier one
    #[serde(default = "default_dedupe")]
    pub dedupe: bool,

    #[serde(default = "default_runs_per_test")]
    pub runs_per_test: usize,

    #[serde(default)]
    pub timeout_secs: Option<f64>,

    #[serde(default)]
    pub on_failure: FailurePolicy,

    #[serde(default = "default_metrics")]
    pub metrics: Vec<Metric>,

    /// The CSV file to write
    pub output: PathBuf,
}

impl SweepDefinition {
    /// A definition with defaults for everything but the given fields.
    pub fn new(
        name: &str,
        executables: Vec<Executable>,
        axes: Vec<Axis>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            build_dir: default_build_dir(),
            executables,
            executable_column: None,
            missing_executable: MissingExecutable::Fail,
            required_files: Vec::new(),
            launcher: Vec::new(),
            args: Vec::new(),
            stdin: None,
            axes,
            derived: Vec::new(),
            overrides: Vec::new(),
            dedupe: default_dedupe(),
            runs_per_test: default_runs_per_test(),
            timeout_secs: None,
            on_failure: FailurePolicy::Abort,
            metrics: default_metrics(),
            output: output.into(),
        }
    }

    pub fn executable_path(&self, executable: &Executable) -> PathBuf {
        resolve(&self.build_dir, &executable.path)
    }

    /// Values `check` accepts are in range.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// The executable column, if any, followed by one column per axis.
    pub fn axis_columns(&self) -> Vec<String> {
        self.executable_column
            .iter()
            .cloned()
            .chain(self.axes.iter().map(|axis| axis.column().to_owned()))
            .collect()
    }

    pub fn result_schema(&self) -> ResultSchema {
        ResultSchema::new(self.axis_columns(), &self.metrics)
    }

    pub fn needs_stdout(&self) -> bool {
        self.metrics.iter().any(|m| m.source.needs_stdout())
    }

    /// The names available as `{name}` in templates.
    pub fn parameter_names(&self) -> BTreeSet<&str> {
        self.axes
            .iter()
            .map(|a| a.name.as_str())
            .chain(self.derived.iter().map(|d| d.name.as_str()))
            .collect()
    }

    /// Verify internal consistency, before anything is run.
    pub fn check(&self) -> Result<(), SweepError> {
        let Self {
            name,
            description: _,
            build_dir: _,
            executables,
            executable_column,
            missing_executable: _,
            required_files: _,
            launcher,
            args,
            stdin,
            axes,
            derived,
            overrides,
            dedupe: _,
            runs_per_test,
            timeout_secs,
            on_failure: _,
            metrics,
            output: _,
        } = self;

        let invalid = |msg: String| Err(SweepError::InvalidDefinition(format!("{name:?}: {msg}")));

        if executables.is_empty() {
            return invalid("no executables given".into());
        }
        if let Some(duplicate) = first_duplicate(executables.iter().map(|e| e.name.as_str())) {
            return invalid(format!("duplicate executable name {duplicate:?}"));
        }
        if axes.is_empty() {
            return invalid("no axes given".into());
        }
        for axis in axes {
            if axis.levels.is_empty() {
                return invalid(format!("axis {:?} has no levels", axis.name));
            }
        }
        let names = axes
            .iter()
            .map(|a| a.name.as_str())
            .chain(derived.iter().map(|d| d.name.as_str()));
        if let Some(duplicate) = first_duplicate(names) {
            return invalid(format!("duplicate parameter name {duplicate:?}"));
        }
        let axis_names: BTreeSet<&str> = axes.iter().map(|a| a.name.as_str()).collect();
        for d in derived {
            let of = d.expr.referenced_axis();
            if !axis_names.contains(of) {
                return invalid(format!(
                    "derived parameter {:?} refers to unknown axis {of:?}",
                    d.name
                ));
            }
        }
        for rule in overrides {
            for axis in rule.when.keys().chain(rule.set.keys()) {
                if !axis_names.contains(axis.as_str()) {
                    return invalid(format!("override refers to unknown axis {axis:?}"));
                }
            }
        }

        let parameter_names = self.parameter_names();
        for template in launcher.iter().chain(args).chain(stdin) {
            for placeholder in placeholders(template) {
                if !parameter_names.contains(placeholder) {
                    return invalid(format!(
                        "unknown placeholder {{{placeholder}}} in template {template:?}"
                    ));
                }
            }
        }

        if *runs_per_test < 1 {
            return invalid("runs_per_test must be at least 1".into());
        }
        if let Some(secs) = timeout_secs {
            match Duration::try_from_secs_f64(*secs) {
                Ok(timeout) if !timeout.is_zero() => (),
                Ok(_) => return invalid(format!("timeout_secs must be positive, got {secs}")),
                Err(e) => return invalid(format!("timeout_secs {secs} is out of range: {e}")),
            }
        }
        if metrics.is_empty() {
            return invalid("no metrics given".into());
        }
        if let Some(column) = executable_column {
            if column.is_empty() {
                return invalid("empty executable_column".into());
            }
        }
        let header = self.result_schema().header();
        if let Some(duplicate) = first_duplicate(header.iter().map(String::as_str)) {
            return invalid(format!("column {duplicate:?} would appear twice in the CSV header"));
        }
        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_owned()
    } else {
        base.join(path)
    }
}

fn first_duplicate<'a>(items: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = BTreeSet::new();
    items.into_iter().find(|item| !seen.insert(*item))
}
