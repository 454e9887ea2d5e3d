use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::Result;

use crate::ctx;

use super::schema::ResultSchema;

/// Writes a result table point by point, flushing after each point
/// so that an aborted sweep leaves the completed points on disk.
pub struct ResultWriter {
    path: PathBuf,
    schema: ResultSchema,
    writer: csv::Writer<File>,
}

impl ResultWriter {
    /// Create (or truncate) the file at `path` and write the header.
    pub fn create(path: &Path, schema: ResultSchema) -> Result<Self> {
        let mut writer =
            csv::Writer::from_path(path).map_err(ctx!("creating CSV file {path:?}"))?;
        writer
            .write_record(schema.header())
            .map_err(ctx!("writing header to {path:?}"))?;
        writer.flush().map_err(ctx!("flushing {path:?}"))?;
        Ok(Self {
            path: path.to_owned(),
            schema,
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &ResultSchema {
        &self.schema
    }

    /// Write the per-run rows and the aggregate row of one
    /// configuration point. `runs` holds, per run, one value per
    /// metric. Returns the means written to the aggregate row.
    pub fn write_point(
        &mut self,
        cells: &[String],
        runs: &[Vec<Option<f64>>],
    ) -> Result<Vec<Option<f64>>> {
        let path = &self.path;
        for (i, values) in runs.iter().enumerate() {
            self.writer
                .write_record(self.schema.run_row(cells, i + 1, values))
                .map_err(ctx!("writing to {path:?}"))?;
        }
        let means = self.schema.means(runs);
        self.writer
            .write_record(self.schema.aggregate_row(cells, &means))
            .map_err(ctx!("writing to {path:?}"))?;
        self.writer.flush().map_err(ctx!("flushing {path:?}"))?;
        Ok(means)
    }
}
