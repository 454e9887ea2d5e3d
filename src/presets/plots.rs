//! Chart definitions matching the sweep presets' result tables.

use std::path::PathBuf;

use crate::{
    plot::definition::{ChartDefinition, ChartKind, Measure, PlotDefinition, SpeedupBaseline},
    result_table::RowSelection,
    sweep::metric::WALL_CLOCK_AVERAGE_COLUMN,
};

use super::sweeps;

fn average_time() -> Measure {
    Measure::Column(WALL_CLOCK_AVERAGE_COLUMN.into())
}

fn plot(name: &str, csv: PathBuf, charts: Vec<ChartDefinition>) -> PlotDefinition {
    PlotDefinition {
        name: name.into(),
        description: String::new(),
        csv,
        charts,
    }
}

pub fn array_sum() -> PlotDefinition {
    plot(
        "array_sum",
        sweeps::array_sum().output,
        vec![ChartDefinition::new(
            "array_sum_results_plot.png",
            "Execution Time for array_sum",
            "Threads",
            average_time(),
        )
        .with_log_x(2.)
        .with_labels("Threads", "Execution Time (s)")],
    )
}

pub fn barriers() -> PlotDefinition {
    plot(
        "barriers",
        sweeps::barriers().output,
        vec![ChartDefinition::new(
            "barrier_execution_times.png",
            "Barrier Implementations: Execution Time vs Threads",
            "Threads",
            average_time(),
        )
        .grouped_by(&["Executable"], Some("{Executable}"))
        .with_log_x(2.)
        .with_labels("Threads", "Average Execution Time (s)")],
    )
}

pub fn increase() -> PlotDefinition {
    plot(
        "increase",
        sweeps::increase().output,
        vec![ChartDefinition::new(
            "increase_results_plot.png",
            "Average Execution Time: increase vs increase_atomic",
            "Threads",
            average_time(),
        )
        .grouped_by(
            &["Implementation", "Iterations"],
            Some("{Implementation}, {Iterations} iterations"),
        )
        .with_log_x(2.)
        .with_labels("Threads", "Average Execution Time (s)")],
    )
}

pub fn monte_carlo() -> PlotDefinition {
    let speedup = Measure::Ratio {
        numerator: "Average Sequential Time (s)".into(),
        denominator: "Average Parallel Time (s)".into(),
    };
    plot(
        "monte_carlo",
        sweeps::monte_carlo().output,
        vec![
            ChartDefinition::new(
                "monte_carlo_speedup.png",
                "Monte Carlo Simulation: Speedup vs Throws",
                "Throws",
                speedup,
            )
            .grouped_by(&["Threads"], Some("Speedup (Threads={Threads})"))
            .with_log_x(10.)
            .with_labels("Throws", "Speedup"),
            ChartDefinition::new(
                "monte_carlo_pi.png",
                "Monte Carlo Simulation: π Estimate vs Throws",
                "Throws",
                Measure::Column("Average Pi".into()),
            )
            .grouped_by(&["Threads"], Some("Threads={Threads}"))
            .with_log_x(10.)
            .with_labels("Throws", "π estimate"),
        ],
    )
}

pub fn rw_lock() -> PlotDefinition {
    plot(
        "rw_lock",
        sweeps::rw_lock().output,
        vec![ChartDefinition::new(
            "combined_plot.png",
            "Average Elapsed Time vs Number of Threads for All Priorities",
            "Threads",
            Measure::Column("Average Elapsed Time (s)".into()),
        )
        .grouped_by(
            &["Priority", "Member Fraction"],
            Some("{Priority} priority, member {Member Fraction}"),
        )
        .with_labels("Number of Threads", "Average Elapsed Time (seconds)")],
    )
}

fn game_of_life_charts(output: &str, modes: &[&str]) -> Vec<ChartDefinition> {
    let time = ChartDefinition::new(
        output,
        "Execution Time vs Number of Threads for Game of Life",
        "Threads",
        average_time(),
    )
    .grouped_by(&["Grid Size", "Mode"], Some("{Mode} ({Grid Size})"))
    .with_labels("Number of Threads", "Execution Time (seconds)");
    let mut charts = vec![time];
    for mode in modes {
        let file = format!(
            "{}_speedup_{}.png",
            output.trim_end_matches(".png"),
            mode.to_lowercase().replace(' ', "_")
        );
        charts.push(
            ChartDefinition::new(
                &file,
                &format!("Game of Life Speedup ({mode})"),
                "Threads",
                average_time(),
            )
            .grouped_by(&["Grid Size"], Some("{Grid Size}"))
            .filtered("Mode", mode)
            .with_speedup_baseline(SpeedupBaseline::new([("Mode", "Serial")], &["Grid Size"]))
            .with_labels("Number of Threads", "Speedup"),
        );
    }
    charts
}

pub fn game_of_life() -> PlotDefinition {
    plot(
        "game_of_life",
        sweeps::game_of_life().output,
        game_of_life_charts("game_of_life_results_plot.png", &["Parallel"]),
    )
}

pub fn game_of_life_tasks() -> PlotDefinition {
    plot(
        "game_of_life_tasks",
        sweeps::game_of_life_tasks().output,
        game_of_life_charts(
            "game_of_life_tasks_results_plot.png",
            &["Parallel For", "Parallel Tasks"],
        ),
    )
}

pub fn gauss_elimination() -> PlotDefinition {
    let chart = |output: &str, title: &str| {
        ChartDefinition::new(output, title, "Threads", average_time())
            .grouped_by(
                &["Grid Size", "Algorithm", "Schedule"],
                Some("Size {Grid Size}, {Algorithm}, {Schedule}"),
            )
            .filtered("Execution", "parallel")
    };
    plot(
        "gauss_elimination",
        sweeps::gauss_elimination().output,
        vec![
            chart(
                "gauss_elimination_results.png",
                "Execution Time for Grid Size, Algorithm and Schedule",
            )
            .with_labels("Threads", "Execution Time (s)"),
            chart(
                "gauss_elimination_speedup.png",
                "Gauss Elimination Speedup (Average)",
            )
            .with_speedup_baseline(SpeedupBaseline::new(
                [("Execution", "serial")],
                &["Grid Size", "Algorithm"],
            ))
            .with_labels("Threads", "Speedup"),
            ChartDefinition::new(
                "gauss_elimination_serial.png",
                "Gauss Elimination, Serial",
                "Threads",
                average_time(),
            )
            .grouped_by(&["Grid Size", "Algorithm"], Some("Size {Grid Size}, {Algorithm}"))
            .filtered("Execution", "serial")
            .with_kind(ChartKind::Bar)
            .with_labels("Threads", "Execution Time (s)"),
        ],
    )
}

pub fn game_of_life_mpi() -> PlotDefinition {
    let chart = ChartDefinition::new(
        "game_of_life_mpi_results.png",
        "Execution Time vs Generations for Game of Life",
        "Generations",
        average_time(),
    )
    .grouped_by(&["Grid Size"], Some("Grid {Grid Size}"))
    .with_kind(ChartKind::Bar)
    .with_labels("Generations", "Execution Time (seconds)");
    plot("game_of_life_mpi", sweeps::game_of_life_mpi().output, vec![chart])
}

pub fn game_of_life_hybrid() -> PlotDefinition {
    plot(
        "game_of_life_hybrid",
        sweeps::game_of_life_hybrid().output,
        vec![
            ChartDefinition::new(
                "game_of_life_hybrid_results.png",
                "Execution Time vs Processes for Hybrid Game of Life",
                "Processes",
                average_time(),
            )
            .grouped_by(&["Grid Size"], Some("Grid {Grid Size}"))
            .with_labels("Processes", "Execution Time (seconds)"),
            ChartDefinition::new(
                "game_of_life_hybrid_runs.png",
                "Individual Runs of the Hybrid Game of Life",
                "Processes",
                Measure::Column("Execution Time (s)".into()),
            )
            .grouped_by(&["Grid Size"], Some("Grid {Grid Size}"))
            .with_kind(ChartKind::Scatter)
            .with_labels("Processes", "Execution Time (seconds)")
            .with_rows(RowSelection::Runs),
        ],
    )
}

pub fn matrix_vector_mpi() -> PlotDefinition {
    let chart = |output: &str, title: &str| {
        ChartDefinition::new(output, title, "Processes", average_time())
            .grouped_by(&["Grid Size"], Some("Size {Grid Size}"))
    };
    plot(
        "matrix_vector_mpi",
        sweeps::matrix_vector_mpi().output,
        vec![
            chart(
                "matrix_vector_mpi_results.png",
                "Execution Time for Different Grid Sizes",
            )
            .with_labels("Processes", "Execution Time (s)"),
            chart(
                "matrix_vector_multiplication_speedup.png",
                "Speedup for Matrix-Vector Multiplication",
            )
            .with_speedup()
            .with_labels("Processes", "Speedup"),
        ],
    )
}
