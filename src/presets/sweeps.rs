//! Sweep definitions for the course benchmarks. Executables are
//! expected in `../build`, MPI machine lists in `../machines`.

use crate::sweep::{
    axis::{Axis, CellFormat, DerivedExpr, DerivedParameter, Level, Override, Value},
    definition::{Executable, FailurePolicy, MissingExecutable, SweepDefinition},
    metric::{Extract, Metric, MetricSource},
};

const THREADS: &str = "Threads";
const GRID_SIZE: &str = "Grid Size";
const GRIDS: [i32; 3] = [64, 1024, 4096];
const GENERATIONS: i32 = 1000;
const MACHINES_FILE: &str = "../machines";

fn single(name: &str) -> Vec<Executable> {
    vec![Executable::new(name, name)]
}

fn args(templates: &[&str]) -> Vec<String> {
    templates.iter().map(|t| t.to_string()).collect()
}

fn threads(levels: &[i32]) -> Axis {
    Axis::new("threads", levels.iter().copied()).with_column(THREADS)
}

fn grid() -> Axis {
    Axis::new("grid", GRIDS)
        .with_column(GRID_SIZE)
        .with_format(CellFormat::Square)
}

fn mpiexec() -> Vec<String> {
    args(&["mpiexec", "-f", MACHINES_FILE, "-n", "{processes}"])
}

fn marker(column: &str, marker: &str, extract: Extract) -> Metric {
    let mut metric = Metric::new(
        column,
        MetricSource::Marker {
            marker: marker.into(),
            extract,
        },
    );
    metric.precision = 6;
    metric
}

pub fn array_sum() -> SweepDefinition {
    let mut def = SweepDefinition::new(
        "array_sum",
        single("array_sum"),
        vec![threads(&[1, 2, 4, 8, 16, 32])],
        "array_sum_results.csv",
    );
    def.description = "Parallel array summation over 1 to 32 threads".into();
    def.args = args(&["{threads}"]);
    def
}

pub fn barriers() -> SweepDefinition {
    let mut def = SweepDefinition::new(
        "barriers",
        ["barrier_mutex_cond", "barrier_pthread", "barrier_sense_reversal"]
            .iter()
            .map(|name| Executable::new(name, *name))
            .collect(),
        vec![threads(&[2, 4, 8, 16])],
        "barrier_results.csv",
    );
    def.description = "Three barrier implementations compared".into();
    def.executable_column = Some("Executable".into());
    def.args = args(&["{threads}"]);
    def
}

pub fn increase() -> SweepDefinition {
    let mut def = SweepDefinition::new(
        "increase",
        vec![
            Executable::new("increase", "increase"),
            Executable::new("increase_atomic", "increase_atomic"),
        ],
        vec![
            Axis::new(
                "iterations",
                [1234567i64, 9876543, 456789012, 1234567890, 34100654080],
            )
            .with_column("Iterations"),
            threads(&[1, 2, 4, 8, 16, 32]),
        ],
        "increase_results.csv",
    );
    def.description = "Shared counter increments, mutex vs atomic".into();
    def.executable_column = Some("Implementation".into());
    def.missing_executable = MissingExecutable::Skip;
    def.args = args(&["{threads}", "{iterations}"]);
    def
}

pub fn monte_carlo() -> SweepDefinition {
    let mut def = SweepDefinition::new(
        "monte_carlo",
        single("monte_carlo"),
        vec![
            threads(&[4, 8, 16, 32]),
            Axis::new("throws", (0..10).map(|i| 10i64.pow(i))).with_column("Throws"),
        ],
        "monte_carlo_results.csv",
    );
    def.description = "Monte Carlo estimation of π, sequential vs parallel".into();
    def.args = args(&["{threads}", "{throws}"]);
    def.metrics = vec![
        marker("Sequential Time (s)", "Sequential time", Extract::AfterColon),
        marker("Parallel Time (s)", "Parallel time", Extract::AfterColon),
        marker("Pi", "Parallel π estimate", Extract::LastToken),
    ];
    def
}

pub fn rw_lock() -> SweepDefinition {
    let mut def = SweepDefinition::new(
        "rw_lock",
        single("rw_lock"),
        vec![
            Axis::new("priority", ["read", "write"]).with_column("Priority"),
            threads(&[2, 4, 8, 16]),
            Axis::new("member", [0.999, 0.95, 0.90]).with_column("Member Fraction"),
        ],
        "rw_lock_results.csv",
    );
    def.description = "Linked list behind a read-write lock, read vs write priority".into();
    def.args = args(&["{threads}", "{priority}"]);
    def.derived = vec![DerivedParameter {
        name: "insert".into(),
        expr: DerivedExpr::Complement {
            of: "member".into(),
        },
    }];
    def.stdin = Some("1000\n500000\n{member}\n{insert}\n".into());
    def.timeout_secs = Some(300.);
    def.on_failure = FailurePolicy::Unavailable;
    def.metrics = vec![marker(
        "Elapsed Time (s)",
        "Elapsed time =",
        Extract::Token { index: 3 },
    )
    .with_average_column("Average Elapsed Time (s)")];
    def
}

fn serial_forces_one_thread(mode_axis: &str, serial: Value) -> Override {
    Override::new([(mode_axis, serial)], [("threads", 1.into())])
}

pub fn game_of_life() -> SweepDefinition {
    let mut def = SweepDefinition::new(
        "game_of_life",
        single("game_of_life"),
        vec![
            grid(),
            Axis::labelled(
                "mode",
                vec![Level::labelled(0, "Serial"), Level::labelled(1, "Parallel")],
            )
            .with_column("Mode"),
            threads(&[2, 4, 8, 16]),
        ],
        "game_of_life_results.csv",
    );
    def.description = "Conway's Game of Life with OpenMP, serial vs parallel for".into();
    def.args = args(&["1000", "{grid}", "{mode}", "{threads}"]);
    def.overrides = vec![serial_forces_one_thread("mode", 0.into())];
    def
}

pub fn game_of_life_tasks() -> SweepDefinition {
    let mut def = SweepDefinition::new(
        "game_of_life_tasks",
        single("game_of_life_tasks"),
        vec![
            grid(),
            Axis::labelled(
                "mode",
                vec![
                    Level::labelled(0, "Serial"),
                    Level::labelled(1, "Parallel For"),
                    Level::labelled(2, "Parallel Tasks"),
                ],
            )
            .with_column("Mode"),
            threads(&[2, 4, 8, 16]),
        ],
        "game_of_life_tasks_results.csv",
    );
    def.description = "Game of Life with OpenMP parallel for vs tasks".into();
    def.args = args(&["1000", "{grid}", "{mode}", "{threads}"]);
    def.overrides = vec![serial_forces_one_thread("mode", 0.into())];
    def
}

pub fn gauss_elimination() -> SweepDefinition {
    let mut def = SweepDefinition::new(
        "gauss_elimination",
        single("gauss_elimination"),
        vec![
            Axis::new("execution", ["serial", "parallel"]).with_column("Execution"),
            threads(&[2, 4, 8, 16]),
            Axis::new("size", [100, 1000, 5000, 10000])
                .with_column(GRID_SIZE)
                .with_format(CellFormat::Square),
            Axis::new("algorithm", ["row", "column"]).with_column("Algorithm"),
            Axis::new("schedule", ["static", "dynamic", "guided", "runtime"])
                .with_column("Schedule"),
        ],
        "gauss_elimination_results.csv",
    );
    def.description = "Gaussian elimination, row vs column oriented, OpenMP schedules".into();
    def.args = args(&["{size}", "{execution}", "{algorithm}", "{schedule}", "{threads}"]);
    def.overrides = vec![Override::new(
        [("execution", "serial".into())],
        [("threads", 1.into()), ("schedule", "none".into())],
    )];
    def.metrics[0].precision = 6;
    def
}

pub fn game_of_life_mpi() -> SweepDefinition {
    let mut def = SweepDefinition::new(
        "game_of_life_mpi",
        single("game_of_life_mpi"),
        vec![
            grid(),
            Axis::new("generations", [GENERATIONS]).with_column("Generations"),
        ],
        "game_of_life_mpi_results.csv",
    );
    def.description = "Game of Life with MPI".into();
    def.args = args(&["{grid}", "{grid}", "{generations}"]);
    def
}

pub fn game_of_life_hybrid() -> SweepDefinition {
    let mut def = SweepDefinition::new(
        "game_of_life_hybrid",
        single("game_of_life_hybrid"),
        vec![
            grid(),
            Axis::new("processes", [2, 4, 8, 16]).with_column("Processes"),
            Axis::new("generations", [GENERATIONS]).with_column("Generations"),
        ],
        "game_of_life_hybrid_results.csv",
    );
    def.description = "Game of Life with MPI and OpenMP, across machines".into();
    def.required_files = vec![MACHINES_FILE.into()];
    def.launcher = mpiexec();
    def.args = args(&["{generations}", "{grid}"]);
    def
}

pub fn matrix_vector_mpi() -> SweepDefinition {
    let mut def = SweepDefinition::new(
        "matrix_vector_mpi",
        single("matrix_vector_mpi"),
        vec![
            Axis::new("processes", [2, 4, 8]).with_column("Processes"),
            Axis::new("size", [100, 1000, 5000, 10000])
                .with_column(GRID_SIZE)
                .with_format(CellFormat::Square),
        ],
        "matrix_vector_mpi_results.csv",
    );
    def.description = "Matrix-vector multiplication with MPI, across machines".into();
    def.required_files = vec![MACHINES_FILE.into()];
    def.launcher = mpiexec();
    def.args = args(&["{size}"]);
    def.metrics[0].precision = 6;
    def
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::{axis::enumerate_points, runner::invocation_for};

    fn command_lines(def: &SweepDefinition) -> Vec<String> {
        enumerate_points(def, &(0..def.executables.len()).collect::<Vec<_>>())
            .iter()
            .map(|p| invocation_for(def, p).unwrap().to_bash_string())
            .collect()
    }

    #[test]
    fn t_game_of_life_points() {
        let def = game_of_life();
        let lines = command_lines(&def);
        // per grid: 1 serial + 4 parallel
        assert_eq!(lines.len(), 15);
        assert_eq!(lines[0], "../build/game_of_life 1000 64 0 1");
        assert_eq!(lines[1], "../build/game_of_life 1000 64 1 2");
        let points = enumerate_points(&def, &[0]);
        assert_eq!(points[0].cells(&def), ["64x64", "Serial", "1"]);
    }

    #[test]
    fn t_gauss_serial_collapses() {
        let def = gauss_elimination();
        let lines = command_lines(&def);
        // serial: 4 sizes x 2 algorithms; parallel: 4 x 4 x 2 x 4
        assert_eq!(lines.len(), 8 + 128);
        assert_eq!(lines[0], "../build/gauss_elimination 100 serial row none 1");
        assert_eq!(lines[8], "../build/gauss_elimination 100 parallel row static 2");
    }

    #[test]
    fn t_rw_lock_stdin() {
        let def = rw_lock();
        let points = enumerate_points(&def, &[0]);
        assert_eq!(points.len(), 24);
        let inv = invocation_for(&def, &points[0]).unwrap();
        assert_eq!(inv.to_bash_string(), "../build/rw_lock 2 read");
        assert!(inv.stdin.unwrap().starts_with("1000\n500000\n0.999\n0.00"));
        assert!(inv.capture);
    }

    #[test]
    fn t_hybrid_launcher() {
        let lines = command_lines(&game_of_life_hybrid());
        assert_eq!(lines.len(), 12);
        assert_eq!(
            lines[0],
            "mpiexec -f ../machines -n 2 ../build/game_of_life_hybrid 1000 64"
        );
    }

    #[test]
    fn t_sizes() {
        assert_eq!(command_lines(&monte_carlo()).len(), 40);
        assert_eq!(command_lines(&increase()).len(), 60);
        assert_eq!(command_lines(&barriers()).len(), 12);
        assert_eq!(command_lines(&game_of_life_tasks()).len(), 27);
        assert_eq!(command_lines(&matrix_vector_mpi()).len(), 12);
        assert_eq!(
            command_lines(&game_of_life_mpi()),
            [
                "../build/game_of_life_mpi 64 64 1000",
                "../build/game_of_life_mpi 1024 1024 1000",
                "../build/game_of_life_mpi 4096 4096 1000"
            ]
        );
    }
}
