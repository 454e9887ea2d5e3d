use crate::{stats::mean, sweep::metric::Metric};

use super::{AVERAGE_SENTINEL, RUN_COLUMN, UNAVAILABLE};

/// Produces the header and all rows of a result table, so that they
/// always agree.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSchema {
    axis_columns: Vec<String>,
    metrics: Vec<Metric>,
}

impl ResultSchema {
    pub fn new(axis_columns: Vec<String>, metrics: &[Metric]) -> Self {
        Self {
            axis_columns,
            metrics: metrics.to_vec(),
        }
    }

    pub fn axis_columns(&self) -> &[String] {
        &self.axis_columns
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = self.axis_columns.clone();
        header.push(RUN_COLUMN.into());
        header.extend(self.metrics.iter().map(|m| m.column.clone()));
        header.extend(self.metrics.iter().map(|m| m.average_column()));
        header
    }

    fn format(&self, values: &[Option<f64>]) -> impl Iterator<Item = String> + '_ {
        assert_eq!(values.len(), self.metrics.len(), "one value per metric");
        self.metrics
            .iter()
            .zip(values.to_vec())
            .map(|(metric, value)| match value {
                Some(value) => metric.format_value(value),
                None => UNAVAILABLE.into(),
            })
    }

    fn empty_metric_cells(&self) -> impl Iterator<Item = String> + '_ {
        self.metrics.iter().map(|_| String::new())
    }

    /// The row for repetition `run` (1-based); `None` values are
    /// written as unavailable.
    pub fn run_row(&self, cells: &[String], run: usize, values: &[Option<f64>]) -> Vec<String> {
        let mut row = cells.to_vec();
        row.push(run.to_string());
        row.extend(self.format(values));
        row.extend(self.empty_metric_cells());
        row
    }

    pub fn aggregate_row(&self, cells: &[String], means: &[Option<f64>]) -> Vec<String> {
        let mut row = cells.to_vec();
        row.push(AVERAGE_SENTINEL.into());
        row.extend(self.empty_metric_cells());
        row.extend(self.format(means));
        row
    }

    /// Per metric, the mean over the runs where it is available.
    pub fn means(&self, runs: &[Vec<Option<f64>>]) -> Vec<Option<f64>> {
        (0..self.metrics.len())
            .map(|i| {
                let available: Vec<f64> = runs.iter().filter_map(|run| run[i]).collect();
                mean(&available)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::metric::{Extract, MetricSource};

    fn schema() -> ResultSchema {
        let pi = Metric::new(
            "Parallel π estimate",
            MetricSource::Marker {
                marker: "Parallel π estimate".into(),
                extract: Extract::LastToken,
            },
        );
        ResultSchema::new(
            vec!["Threads".into(), "Throws".into()],
            &[Metric::wall_clock(), pi],
        )
    }

    #[test]
    fn t_header() {
        assert_eq!(
            schema().header(),
            [
                "Threads",
                "Throws",
                "Run",
                "Execution Time (s)",
                "Parallel π estimate",
                "Average Time (s)",
                "Average Parallel π estimate"
            ]
        );
    }

    #[test]
    fn t_rows_match_header() {
        let s = schema();
        let cells = vec!["4".to_string(), "1000".to_string()];
        let run = s.run_row(&cells, 2, &[Some(0.5), None]);
        assert_eq!(run, ["4", "1000", "2", "0.50000", "N/A", "", ""]);
        let agg = s.aggregate_row(&cells, &[Some(0.25), Some(3.14159)]);
        assert_eq!(agg, ["4", "1000", "Average", "", "", "0.25000", "3.14159"]);
        assert_eq!(run.len(), s.header().len());
    }

    #[test]
    fn t_means_skip_unavailable() {
        let s = schema();
        let means = s.means(&[vec![Some(1.), None], vec![Some(3.), None]]);
        assert_eq!(means, [Some(2.), None]);
    }
}
