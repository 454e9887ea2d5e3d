//! Turning result table rows into the point series of a chart.

use std::{cmp::Ordering, collections::BTreeMap};

use crate::{
    result_table::{ResultTable, TableError},
    warn,
    stats::{mean, speedup},
    sweep::template::render,
};

use super::definition::{ChartDefinition, Measure};

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    /// Sorted by x, with unique x values
    pub points: Vec<(f64, f64)>,
}

enum ResolvedMeasure {
    Column(usize),
    Ratio(usize, usize),
}

impl ResolvedMeasure {
    fn resolve(table: &ResultTable, measure: &Measure) -> Result<Self, TableError> {
        Ok(match measure {
            Measure::Column(column) => ResolvedMeasure::Column(table.column(column)?),
            Measure::Ratio {
                numerator,
                denominator,
            } => ResolvedMeasure::Ratio(table.column(numerator)?, table.column(denominator)?),
        })
    }

    fn value(&self, table: &ResultTable, row: usize) -> Option<f64> {
        match self {
            ResolvedMeasure::Column(column) => table.number(row, *column),
            ResolvedMeasure::Ratio(numerator, denominator) => Some(speedup(
                table.number(row, *numerator)?,
                table.number(row, *denominator)?,
            )),
        }
    }
}

/// Sort by x and replace the points sharing an x value by one point
/// with their mean y.
fn merge_duplicate_x(mut points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    let mut ys: Vec<f64> = Vec::new();
    for (x, y) in points {
        match merged.last() {
            Some((last_x, _)) if *last_x == x => {}
            _ => {
                if let (Some(last), Some(m)) = (merged.last_mut(), mean(&ys)) {
                    last.1 = m;
                }
                ys.clear();
                merged.push((x, y));
            }
        }
        ys.push(y);
    }
    if let (Some(last), Some(m)) = (merged.last_mut(), mean(&ys)) {
        last.1 = m;
    }
    merged
}

fn log(x: f64, base: f64) -> f64 {
    if base == 10. {
        x.log10()
    } else if base == 2. {
        x.log2()
    } else {
        x.log(base)
    }
}

/// Rows whose `column` texts equal the given values.
fn matching_rows<'t>(
    table: &'t ResultTable,
    rows: impl Iterator<Item = usize> + 't,
    conditions: &'t [(usize, &'t str)],
) -> impl Iterator<Item = usize> + 't {
    rows.filter(move |&row| {
        conditions
            .iter()
            .all(|(column, value)| table.text(row, *column).map(str::trim) == Some(*value))
    })
}

fn default_label(chart: &ChartDefinition, key: &[String]) -> String {
    if key.is_empty() {
        return chart.y_description();
    }
    chart
        .group_by
        .iter()
        .zip(key)
        .map(|(column, value)| format!("{column}: {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The series of `chart`, one per group with at least one point, in
/// order of the groups' first appearance in the table.
pub fn build_series(table: &ResultTable, chart: &ChartDefinition) -> Result<Vec<Series>, TableError> {
    let x_column = table.column(&chart.x)?;
    let measure = ResolvedMeasure::resolve(table, &chart.y)?;
    let group_columns = chart
        .group_by
        .iter()
        .map(|c| table.column(c))
        .collect::<Result<Vec<_>, _>>()?;
    let filters = chart
        .filter
        .iter()
        .map(|(c, value)| Ok((table.column(c)?, value.as_str())))
        .collect::<Result<Vec<_>, TableError>>()?;

    let rows: Vec<usize> =
        matching_rows(table, table.select(chart.rows).into_iter(), &filters).collect();

    // (baseline rows, columns they must share with a series)
    let baseline = match &chart.speedup_baseline {
        Some(baseline) => {
            let conditions = baseline
                .filter
                .iter()
                .map(|(c, value)| Ok((table.column(c)?, value.as_str())))
                .collect::<Result<Vec<_>, TableError>>()?;
            let shared = baseline
                .matching
                .iter()
                .map(|c| table.column(c))
                .collect::<Result<Vec<_>, _>>()?;
            let baseline_rows: Vec<usize> =
                matching_rows(table, table.select(chart.rows).into_iter(), &conditions).collect();
            Some((baseline_rows, shared))
        }
        None => None,
    };

    let mut all_series = Vec::new();
    for (key, members) in table.group_by(&rows, &group_columns) {
        let points = members
            .iter()
            .filter_map(|&row| Some((table.number(row, x_column)?, measure.value(table, row)?)))
            .collect();
        let mut points = merge_duplicate_x(points);

        if chart.speedup {
            let t0 = match &baseline {
                Some((baseline_rows, shared)) => {
                    let Some(&first) = members.first() else { continue };
                    let wanted: Vec<(usize, &str)> = shared
                        .iter()
                        .map(|&c| (c, table.text(first, c).map(str::trim).unwrap_or("")))
                        .collect();
                    let times: Vec<f64> =
                        matching_rows(table, baseline_rows.iter().copied(), &wanted)
                            .filter_map(|row| measure.value(table, row))
                            .collect();
                    let t0 = mean(&times);
                    if t0.is_none() {
                        warn!(
                            "chart {:?}: no speedup baseline for series {key:?}, leaving it out",
                            chart.output
                        );
                    }
                    t0
                }
                None => points.first().map(|&(_, y)| y),
            };
            let Some(t0) = t0 else { continue };
            for point in &mut points {
                point.1 = speedup(t0, point.1);
            }
        }
        if let Some(base) = chart.log_x {
            points = points
                .into_iter()
                .filter(|(x, _)| *x > 0.)
                .map(|(x, y)| (log(x, base), y))
                .collect();
        }
        if points.is_empty() {
            continue;
        }

        let label = match &chart.label {
            Some(template) => {
                let parameters: BTreeMap<String, String> =
                    chart.group_by.iter().cloned().zip(key.iter().cloned()).collect();
                render(template, &parameters).unwrap_or_else(|_| default_label(chart, &key))
            }
            None => default_label(chart, &key),
        };
        all_series.push(Series { label, points });
    }
    Ok(all_series)
}
