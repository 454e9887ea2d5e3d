//! The sweep loop: one process at a time, for every configuration
//! point and repetition.

use std::{
    io::{stdout, Write},
    path::PathBuf,
};

use anyhow::Result;

use crate::{
    ctx, debug, info,
    io_utils::bash::bash_string_literal,
    result_table::{ResultWriter, AVERAGE_SENTINEL, RUN_COLUMN, UNAVAILABLE},
    stats::Stats,
    terminal_table::{TerminalTable, TerminalTableOpts},
    utillib::exit_status_ext::{combined_outputs, ExitStatusExt},
    warn,
};

use super::{
    axis::{enumerate_points, ConfigurationPoint},
    definition::{FailurePolicy, SweepDefinition},
    measure::{run_invocation, Invocation, RunOutcome},
    metric::Metric,
    preflight::preflight,
    template::render,
    SweepError,
};

/// Command line overrides of definition settings.
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    pub runs: Option<usize>,
    pub output: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    /// Only print the command lines
    pub dry_run: bool,
    pub table: TerminalTableOpts,
}

impl SweepOptions {
    pub fn apply(&self, definition: &SweepDefinition) -> SweepDefinition {
        let Self {
            runs,
            output,
            build_dir,
            dry_run: _,
            table: _,
        } = self;
        let mut definition = definition.clone();
        if let Some(runs) = runs {
            definition.runs_per_test = *runs;
        }
        if let Some(output) = output {
            definition.output = output.clone();
        }
        if let Some(build_dir) = build_dir {
            definition.build_dir = build_dir.clone();
        }
        definition
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepSummary {
    pub points: usize,
    pub runs: usize,
    pub unavailable_runs: usize,
    /// `None` for dry runs
    pub csv: Option<PathBuf>,
}

/// Resolve templates and paths for running `point`.
pub fn invocation_for(
    definition: &SweepDefinition,
    point: &ConfigurationPoint,
) -> Result<Invocation, SweepError> {
    let parameters = point.parameters(definition);
    let render_all = |templates: &[String]| {
        templates
            .iter()
            .map(|t| render(t, &parameters))
            .collect::<Result<Vec<_>, _>>()
    };
    let executable = definition
        .executable_path(&definition.executables[point.executable])
        .to_string_lossy()
        .into_owned();
    let mut command = render_all(&definition.launcher)?;
    command.push(executable);
    command.extend(render_all(&definition.args)?);
    let program = command.remove(0).into();
    let stdin = definition
        .stdin
        .as_deref()
        .map(|t| render(t, &parameters))
        .transpose()?;
    Ok(Invocation {
        program,
        args: command,
        stdin,
        capture: definition.needs_stdout(),
        timeout: definition.timeout(),
    })
}

fn extract_metrics(
    metrics: &[Metric],
    outcome_elapsed: std::time::Duration,
    stdout: &str,
) -> Result<Vec<Option<f64>>, SweepError> {
    metrics
        .iter()
        .map(|metric| {
            metric
                .source
                .extract(outcome_elapsed, stdout)
                .map(Some)
                .map_err(|reason| SweepError::Extraction {
                    metric: metric.column.clone(),
                    reason: format!("{reason}; output was:\n{stdout}"),
                })
        })
        .collect()
}

fn format_values(metrics: &[Metric], values: &[Option<f64>]) -> Vec<String> {
    metrics
        .iter()
        .zip(values)
        .map(|(metric, value)| match value {
            Some(v) => metric.format_value(*v),
            None => UNAVAILABLE.into(),
        })
        .collect()
}

/// Run the sweep, echoing progress to stdout.
pub fn run_sweep(definition: &SweepDefinition, options: &SweepOptions) -> Result<SweepSummary> {
    let mut out = stdout().lock();
    run_sweep_to(definition, options, &mut out)
}

/// Run the sweep, echoing progress to `out`.
pub fn run_sweep_to(
    definition: &SweepDefinition,
    options: &SweepOptions,
    out: &mut impl Write,
) -> Result<SweepSummary> {
    let definition = options.apply(definition);
    definition.check()?;
    let executables = preflight(&definition)?;
    let points = enumerate_points(&definition, &executables);
    let invocations = points
        .iter()
        .map(|point| invocation_for(&definition, point))
        .collect::<Result<Vec<_>, _>>()?;

    if options.dry_run {
        for invocation in &invocations {
            write!(out, "{}", invocation.to_bash_string())?;
            if let Some(stdin) = &invocation.stdin {
                write!(out, " <<< {}", bash_string_literal(stdin))?;
            }
            writeln!(out)?;
        }
        return Ok(SweepSummary {
            points: points.len(),
            runs: 0,
            unavailable_runs: 0,
            csv: None,
        });
    }

    let runs_per_test = definition.runs_per_test;
    info!(
        "sweep {:?}: {} configuration points, {runs_per_test} runs each, writing to {:?}",
        definition.name,
        points.len(),
        definition.output
    );

    let mut writer = ResultWriter::create(&definition.output, definition.result_schema())?;

    let mut titles: Vec<String> = definition.axis_columns();
    titles.push(RUN_COLUMN.into());
    titles.extend(definition.metrics.iter().map(|m| m.column.clone()));
    let mut samples: Vec<usize> = (0..titles.len() - definition.metrics.len() - 1)
        .map(|i| {
            points
                .iter()
                .map(|p| p.cells(&definition)[i].len())
                .max()
                .unwrap_or(0)
        })
        .collect();
    samples.push(AVERAGE_SENTINEL.len());
    samples.extend(definition.metrics.iter().map(|m| m.precision + 4));
    let table = TerminalTable::new(
        &TerminalTable::widths_for(&titles, &samples),
        &titles,
        &options.table,
    );
    table.write_title_row(out)?;

    let mut summary = SweepSummary {
        points: 0,
        runs: 0,
        unavailable_runs: 0,
        csv: Some(definition.output.clone()),
    };
    for (point, invocation) in points.iter().zip(&invocations) {
        let cells = point.cells(&definition);
        let command = invocation.to_bash_string();
        let mut runs = Vec::with_capacity(runs_per_test);
        for run in 1..=runs_per_test {
            debug!("run {run}: {command}");
            let failure = match run_invocation(invocation)? {
                RunOutcome::Completed { elapsed, stdout } => {
                    runs.push(extract_metrics(&definition.metrics, elapsed, &stdout)?);
                    None
                }
                RunOutcome::Failed {
                    status,
                    stdout,
                    stderr,
                } => {
                    let outputs = combined_outputs(&stdout, &stderr);
                    if !outputs.is_empty() {
                        warn!("output of failed command {command}:\n{outputs}");
                    }
                    Some(SweepError::CommandFailed {
                        command: command.clone(),
                        status: status.describe(),
                    })
                }
                RunOutcome::TimedOut { after } => Some(SweepError::TimedOut {
                    command: command.clone(),
                    secs: after.as_secs_f64(),
                }),
            };
            if let Some(error) = failure {
                match definition.on_failure {
                    FailurePolicy::Abort => return Err(error.into()),
                    FailurePolicy::Unavailable => {
                        warn!("{error}, recording the run as {UNAVAILABLE}");
                        summary.unavailable_runs += 1;
                        runs.push(vec![None; definition.metrics.len()]);
                    }
                }
            }
            summary.runs += 1;

            let values = runs.last().map(Vec::as_slice).unwrap_or_default();
            let mut row = cells.clone();
            row.push(run.to_string());
            row.extend(format_values(&definition.metrics, values));
            table.write_data_row(&row, out)?;
        }

        let means = writer.write_point(&cells, &runs)?;
        summary.points += 1;

        let mut row = cells.clone();
        row.push(AVERAGE_SENTINEL.into());
        row.extend(format_values(&definition.metrics, &means));
        table.write_data_row(&row, out)?;
        out.flush().map_err(ctx!("flushing progress output"))?;

        for (i, metric) in definition.metrics.iter().enumerate() {
            let values: Vec<f64> = runs.iter().filter_map(|run| run[i]).collect();
            if let Ok(stats) = Stats::from_values(&values) {
                info!(
                    "{} for {}: mean {:.5}, median {:.5}, min {:.5}, max {:.5}, sd {:.5}",
                    metric.column,
                    cells.join(" "),
                    stats.mean,
                    stats.median,
                    stats.min,
                    stats.max,
                    stats.standard_deviation
                );
            }
        }
    }

    info!(
        "finished sweep {:?}: {} points, {} runs ({} unavailable)",
        definition.name, summary.points, summary.runs, summary.unavailable_runs
    );
    Ok(summary)
}
