use std::path::{Path, PathBuf};

use anyhow::Result;

use parbench::{
    config_file::{load_config_file, save_config_file},
    plot::{
        definition::{ChartDefinition, ChartKind, Measure},
        run_plot, PlotDefinition, PlotOptions,
    },
    result_table::TableError,
};

const RESULTS: &str = "\
Algorithm,Threads,Run,Execution Time (s),Average Time (s)
ijk,1,1,8.0,
ijk,1,Average,,8.0
ijk,2,1,4.0,
ijk,2,Average,,4.0
ijk,4,1,2.5,
ijk,4,Average,,2.5
kij,1,1,6.0,
kij,1,Average,,6.0
kij,4,1,N/A,
kij,4,Average,,N/A
";

fn definition(csv: &Path, charts: Vec<ChartDefinition>) -> PlotDefinition {
    PlotDefinition {
        name: "test".into(),
        description: String::new(),
        csv: csv.to_owned(),
        charts,
    }
}

fn time_chart(output: &str) -> ChartDefinition {
    ChartDefinition::new(
        output,
        "Execution time by algorithm",
        "Threads",
        Measure::Column("Average Time (s)".into()),
    )
    .grouped_by(&["Algorithm"], Some("{Algorithm}"))
}

fn write_results(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("results.csv");
    std::fs::write(&path, RESULTS)?;
    Ok(path)
}

fn options(dir: &Path) -> PlotOptions {
    PlotOptions {
        csv: None,
        output_dir: Some(dir.join("charts")),
    }
}

#[test]
fn t_svg_charts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = write_results(dir.path())?;
    let def = definition(
        &csv,
        vec![
            time_chart("time.svg"),
            time_chart("speedup.svg")
                .with_speedup()
                .with_kind(ChartKind::Scatter),
            time_chart("bars.svg").with_kind(ChartKind::Bar),
        ],
    );

    let written = run_plot(&def, &options(dir.path()))?;
    assert_eq!(
        written,
        ["time.svg", "speedup.svg", "bars.svg"].map(|name| dir.path().join("charts").join(name))
    );
    for path in &written {
        let svg = std::fs::read_to_string(path)?;
        assert!(svg.contains("<svg"), "{path:?}");
        assert!(svg.contains("Execution time by algorithm"), "{path:?}");
        assert!(svg.contains("ijk"), "{path:?}");
        assert!(svg.contains("kij"), "{path:?}");
    }
    Ok(())
}

#[test]
fn t_png_chart() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = write_results(dir.path())?;
    let def = definition(&csv, vec![time_chart("time.png").with_log_x(2.)]);

    let written = run_plot(&def, &options(dir.path()))?;
    let png = std::fs::read(&written[0])?;
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let mut retitled = time_chart("retitled.png").with_log_x(2.);
    retitled.title = "Execution time by loop order".into();
    let written = run_plot(&definition(&csv, vec![retitled]), &options(dir.path()))?;
    assert_ne!(png, std::fs::read(&written[0])?);
    Ok(())
}

#[test]
fn t_deterministic_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = write_results(dir.path())?;
    let def = definition(&csv, vec![time_chart("time.svg").with_speedup()]);

    let first = std::fs::read(&run_plot(&def, &options(dir.path()))?[0])?;
    let second = std::fs::read(&run_plot(&def, &options(dir.path()))?[0])?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn t_csv_override() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = write_results(dir.path())?;
    let def = definition(&dir.path().join("not-there.csv"), vec![time_chart("t.svg")]);

    let written = run_plot(
        &def,
        &PlotOptions {
            csv: Some(csv),
            output_dir: Some(dir.path().to_owned()),
        },
    )?;
    assert!(written[0].exists());
    Ok(())
}

#[test]
fn t_missing_csv() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let def = definition(&dir.path().join("absent.csv"), vec![time_chart("t.svg")]);

    let err = run_plot(&def, &options(dir.path())).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TableError>(),
        Some(TableError::Missing(_))
    ));
    assert!(!dir.path().join("charts").join("t.svg").exists());
    Ok(())
}

#[test]
fn t_unreadable_csv() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = dir.path().join("results.csv");
    std::fs::write(&csv, b"Algorithm,Threads,Run,Average Time (s)\nijk,1,Average,\xff8.0\n")?;
    let def = definition(&csv, vec![time_chart("t.svg")]);

    let err = run_plot(&def, &options(dir.path())).unwrap_err();
    match err.downcast_ref::<TableError>() {
        Some(TableError::Parse { path, .. }) => assert_eq!(path, &csv),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(format!("{err:#}").contains("results.csv"));
    assert!(!dir.path().join("charts").join("t.svg").exists());
    Ok(())
}

#[test]
fn t_missing_column() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = write_results(dir.path())?;
    let chart = ChartDefinition::new(
        "t.svg",
        "Speedup",
        "Processes",
        Measure::Column("Average Time (s)".into()),
    );
    let def = definition(&csv, vec![chart]);

    let err = run_plot(&def, &options(dir.path())).unwrap_err();
    match err.downcast_ref::<TableError>() {
        Some(TableError::MissingColumn(column)) => assert_eq!(column, "Processes"),
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[test]
fn t_definition_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = write_results(dir.path())?;
    let def = definition(
        &csv,
        vec![time_chart("time.svg")
            .filtered("Algorithm", "ijk")
            .with_labels("Threads", "Time (s)")],
    );
    let path = dir.path().join("plot.yml");
    save_config_file(&path, &def)?;
    let loaded: PlotDefinition = load_config_file(&path)?;
    assert_eq!(loaded, def);

    let written = run_plot(&loaded, &options(dir.path()))?;
    let svg = std::fs::read_to_string(&written[0])?;
    assert!(svg.contains("ijk"));
    assert!(!svg.contains("kij"));
    Ok(())
}
