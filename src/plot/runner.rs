use std::path::PathBuf;

use anyhow::Result;

use crate::{ctx, info, result_table::ResultTable};

use super::{definition::PlotDefinition, render::render_chart, series::build_series};

/// Command line overrides of definition settings.
#[derive(Debug, Clone, Default)]
pub struct PlotOptions {
    /// Read this CSV file instead of the one in the definition
    pub csv: Option<PathBuf>,
    /// Directory for the image files, the current directory by default
    pub output_dir: Option<PathBuf>,
}

/// Draw every chart of `definition`, returning the paths of the
/// written images.
pub fn run_plot(definition: &PlotDefinition, options: &PlotOptions) -> Result<Vec<PathBuf>> {
    definition.check()?;
    let csv = options.csv.as_ref().unwrap_or(&definition.csv);
    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let table = ResultTable::read(csv)?;
    info!(
        "plot {:?}: read {} rows from {csv:?}",
        definition.name,
        table.num_rows()
    );
    std::fs::create_dir_all(&output_dir).map_err(ctx!("creating directory {output_dir:?}"))?;

    let mut written = Vec::with_capacity(definition.charts.len());
    for chart in &definition.charts {
        let series = build_series(&table, chart)?;
        let path = render_chart(chart, &series, &output_dir)?;
        info!("wrote {path:?} ({} series)", series.len());
        written.push(path);
    }
    Ok(written)
}
