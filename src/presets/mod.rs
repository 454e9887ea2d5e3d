//! Built-in definitions for the course benchmarks: for each, a sweep
//! and the plot reading its result table.

pub mod plots;
pub mod sweeps;

use anyhow::{bail, Result};
use itertools::Itertools;

use crate::{plot::PlotDefinition, sweep::SweepDefinition};

pub struct Preset {
    pub name: &'static str,
    pub sweep: fn() -> SweepDefinition,
    pub plot: fn() -> PlotDefinition,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "array_sum",
        sweep: sweeps::array_sum,
        plot: plots::array_sum,
    },
    Preset {
        name: "barriers",
        sweep: sweeps::barriers,
        plot: plots::barriers,
    },
    Preset {
        name: "increase",
        sweep: sweeps::increase,
        plot: plots::increase,
    },
    Preset {
        name: "monte_carlo",
        sweep: sweeps::monte_carlo,
        plot: plots::monte_carlo,
    },
    Preset {
        name: "rw_lock",
        sweep: sweeps::rw_lock,
        plot: plots::rw_lock,
    },
    Preset {
        name: "game_of_life",
        sweep: sweeps::game_of_life,
        plot: plots::game_of_life,
    },
    Preset {
        name: "game_of_life_tasks",
        sweep: sweeps::game_of_life_tasks,
        plot: plots::game_of_life_tasks,
    },
    Preset {
        name: "gauss_elimination",
        sweep: sweeps::gauss_elimination,
        plot: plots::gauss_elimination,
    },
    Preset {
        name: "game_of_life_mpi",
        sweep: sweeps::game_of_life_mpi,
        plot: plots::game_of_life_mpi,
    },
    Preset {
        name: "game_of_life_hybrid",
        sweep: sweeps::game_of_life_hybrid,
        plot: plots::game_of_life_hybrid,
    },
    Preset {
        name: "matrix_vector_mpi",
        sweep: sweeps::matrix_vector_mpi,
        plot: plots::matrix_vector_mpi,
    },
];

pub fn find_preset(name: &str) -> Result<&'static Preset> {
    match PRESETS.iter().find(|p| p.name == name) {
        Some(preset) => Ok(preset),
        None => bail!(
            "unknown preset {name:?}, known are: {}",
            PRESETS.iter().map(|p| p.name).join(", ")
        ),
    }
}

pub fn find_sweep(name: &str) -> Result<SweepDefinition> {
    Ok((find_preset(name)?.sweep)())
}

pub fn find_plot(name: &str) -> Result<PlotDefinition> {
    Ok((find_preset(name)?.plot)())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_all_presets_are_valid() {
        for preset in PRESETS {
            let sweep = (preset.sweep)();
            assert_eq!(sweep.name, preset.name);
            sweep.check().unwrap();
            let plot = (preset.plot)();
            assert_eq!(plot.name, preset.name);
            assert_eq!(plot.csv, sweep.output);
            plot.check().unwrap();
        }
    }

    /// Every column a chart reads is produced by its sweep.
    #[test]
    fn t_plots_read_existing_columns() {
        for preset in PRESETS {
            let sweep = (preset.sweep)();
            let header = sweep.result_schema().header();
            for chart in (preset.plot)().charts {
                for column in chart.columns() {
                    assert!(
                        header.iter().any(|h| h == column),
                        "{}: {column:?} not in {header:?}",
                        preset.name
                    );
                }
            }
        }
    }

    /// Speedup baselines select rows the sweep actually writes.
    #[test]
    fn t_speedup_baselines_exist() {
        use crate::sweep::axis::enumerate_points;
        let mut checked = 0;
        for preset in PRESETS {
            let sweep = (preset.sweep)();
            let columns = sweep.axis_columns();
            let rows: Vec<Vec<String>> =
                enumerate_points(&sweep, &(0..sweep.executables.len()).collect::<Vec<_>>())
                    .iter()
                    .map(|p| p.cells(&sweep))
                    .collect();
            for chart in (preset.plot)().charts {
                let Some(baseline) = &chart.speedup_baseline else { continue };
                let found = rows.iter().any(|cells| {
                    baseline.filter.iter().all(|(column, value)| {
                        columns
                            .iter()
                            .position(|c| c == column)
                            .map_or(false, |i| cells[i] == *value)
                    })
                });
                assert!(found, "{:?}: no row for {:?}", chart.output, baseline.filter);
                checked += 1;
            }
        }
        // gauss_elimination, game_of_life, 2 x game_of_life_tasks
        assert_eq!(checked, 4);
    }

    #[test]
    fn t_find() {
        assert_eq!(find_sweep("rw_lock").unwrap().timeout_secs, Some(300.));
        let e = find_plot("nope").unwrap_err().to_string();
        assert!(e.contains("array_sum"));
    }
}
