//! Sweeps over throw-away shell scripts. The scripts are run through
//! an `sh` launcher, which avoids `ETXTBSY` when another test thread
//! forks while a script is still open for writing.

use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use anyhow::Result;
use tempfile::TempDir;

use parbench::{
    config_file::{load_config_file, save_config_file},
    result_table::{ResultTable, RowSelection},
    sweep::{
        axis::Axis,
        definition::{Executable, FailurePolicy, MissingExecutable},
        metric::{Extract, Metric, MetricSource},
        runner::run_sweep_to,
        SweepDefinition, SweepError, SweepOptions,
    },
};

fn write_script(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// A definition running `bench` from `dir` once per thread count.
fn definition(dir: &TempDir, threads: &[i32], runs: usize) -> SweepDefinition {
    let mut def = SweepDefinition::new(
        "test",
        vec![Executable::new("bench", "bench")],
        vec![Axis::new("threads", threads.iter().copied()).with_column("Threads")],
        dir.path().join("results.csv"),
    );
    def.build_dir = dir.path().to_owned();
    def.launcher = vec!["sh".into()];
    def.runs_per_test = runs;
    def
}

/// Prints an increasing count (kept in `count` next to the script) as
/// the `t` field of the result record, and fails on the call whose
/// number is in `fail_at`.
const COUNTING_SCRIPT: &str = r#"
dir=$(dirname "$0")
n=$(cat "$dir/count" 2>/dev/null || echo 0)
n=$((n + 1))
echo $n > "$dir/count"
if [ -f "$dir/fail_at" ] && [ "$(cat "$dir/fail_at")" = "$n" ]; then
    echo "failing at call $n" >&2
    exit 3
fi
echo "some chatter"
echo "PARBENCH {\"t\": $n}"
"#;

fn record_metric() -> Metric {
    Metric::new("T", MetricSource::Record { key: "t".into() })
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn t_rows_and_means() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "bench", COUNTING_SCRIPT)?;
    let mut def = definition(&dir, &[1, 2], 3);
    def.metrics = vec![record_metric()];

    let mut progress = Vec::new();
    let summary = run_sweep_to(&def, &SweepOptions::default(), &mut progress)?;
    assert_eq!(summary.points, 2);
    assert_eq!(summary.runs, 6);
    assert_eq!(summary.unavailable_runs, 0);
    assert_eq!(summary.csv.as_deref(), Some(def.output.as_path()));

    assert_eq!(
        read_lines(&def.output),
        [
            "Threads,Run,T,Average T",
            "1,1,1.00000,",
            "1,2,2.00000,",
            "1,3,3.00000,",
            "1,Average,,2.00000",
            "2,1,4.00000,",
            "2,2,5.00000,",
            "2,3,6.00000,",
            "2,Average,,5.00000",
        ]
    );

    let progress = String::from_utf8(progress)?;
    assert_eq!(progress.lines().count(), 1 + 2 * (3 + 1));
    assert!(progress.contains("Average"));
    Ok(())
}

#[test]
fn t_wall_clock_table_shape() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "bench", "true")?;
    let def = definition(&dir, &[1, 2, 4], 2);

    run_sweep_to(&def, &SweepOptions::default(), &mut Vec::new())?;

    let table = ResultTable::read(&def.output)?;
    assert_eq!(table.num_rows(), 3 * 2 + 3);
    assert_eq!(table.select(RowSelection::Aggregates).len(), 3);
    let average = table.column("Average Time (s)")?;
    let time = table.column("Execution Time (s)")?;
    for (key, rows) in table.group_by(&table.select(RowSelection::All), &[0]) {
        let runs: Vec<f64> = rows
            .iter()
            .filter_map(|&row| table.number(row, time))
            .collect();
        assert_eq!(runs.len(), 2, "{key:?}");
        let aggregate = rows
            .iter()
            .find_map(|&row| table.number(row, average))
            .unwrap();
        assert!((aggregate - (runs[0] + runs[1]) / 2.).abs() < 2e-5);
        assert!(runs.iter().all(|t| *t >= 0.));
    }
    Ok(())
}

#[test]
fn t_missing_executable_creates_no_csv() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let def = definition(&dir, &[1], 1);

    let err = run_sweep_to(&def, &SweepOptions::default(), &mut Vec::new()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SweepError>(),
        Some(SweepError::MissingExecutable { .. })
    ));
    assert!(!def.output.exists());
    Ok(())
}

#[test]
fn t_skip_missing_executable() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "bench", "true")?;
    let mut def = definition(&dir, &[1, 2], 1);
    def.executables.push(Executable::new("absent", "absent"));
    def.executable_column = Some("Executable".into());
    def.missing_executable = MissingExecutable::Skip;

    let summary = run_sweep_to(&def, &SweepOptions::default(), &mut Vec::new())?;
    assert_eq!(summary.points, 2);
    let lines = read_lines(&def.output);
    assert_eq!(lines.len(), 1 + 2 * 2);
    assert!(lines[1..].iter().all(|line| line.starts_with("bench,")));
    Ok(())
}

#[test]
fn t_missing_required_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "bench", "true")?;
    let mut def = definition(&dir, &[1], 1);
    def.required_files = vec![dir.path().join("machines")];

    let err = run_sweep_to(&def, &SweepOptions::default(), &mut Vec::new()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SweepError>(),
        Some(SweepError::MissingRequiredFile(_))
    ));
    assert!(!def.output.exists());
    Ok(())
}

#[test]
fn t_failure_keeps_completed_points() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "bench", COUNTING_SCRIPT)?;
    std::fs::write(dir.path().join("fail_at"), "4")?;
    let mut def = definition(&dir, &[1, 2, 3], 2);
    def.metrics = vec![record_metric()];

    let err = run_sweep_to(&def, &SweepOptions::default(), &mut Vec::new()).unwrap_err();
    match err.downcast_ref::<SweepError>() {
        Some(SweepError::CommandFailed { command, status }) => {
            assert!(command.contains("bench"), "{command}");
            assert!(status.contains('3'), "{status}");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(
        read_lines(&def.output),
        [
            "Threads,Run,T,Average T",
            "1,1,1.00000,",
            "1,2,2.00000,",
            "1,Average,,1.50000",
        ]
    );
    Ok(())
}

#[test]
fn t_failure_recorded_as_unavailable() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "bench", COUNTING_SCRIPT)?;
    std::fs::write(dir.path().join("fail_at"), "2")?;
    let mut def = definition(&dir, &[1], 3);
    def.metrics = vec![record_metric()];
    def.on_failure = FailurePolicy::Unavailable;

    let summary = run_sweep_to(&def, &SweepOptions::default(), &mut Vec::new())?;
    assert_eq!(summary.unavailable_runs, 1);
    assert_eq!(
        read_lines(&def.output),
        [
            "Threads,Run,T,Average T",
            "1,1,1.00000,",
            "1,2,N/A,",
            "1,3,3.00000,",
            "1,Average,,2.00000",
        ]
    );
    Ok(())
}

#[test]
fn t_timeout_recorded_as_unavailable() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "bench", "exec sleep 5")?;
    let mut def = definition(&dir, &[1], 1);
    def.timeout_secs = Some(0.2);
    def.on_failure = FailurePolicy::Unavailable;

    let summary = run_sweep_to(&def, &SweepOptions::default(), &mut Vec::new())?;
    assert_eq!(summary.unavailable_runs, 1);
    assert_eq!(
        read_lines(&def.output),
        [
            "Threads,Run,Execution Time (s),Average Time (s)",
            "1,1,N/A,",
            "1,Average,,N/A",
        ]
    );
    Ok(())
}

#[test]
fn t_timeout_aborts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "bench", "exec sleep 5")?;
    let mut def = definition(&dir, &[1], 1);
    def.timeout_secs = Some(0.2);

    let err = run_sweep_to(&def, &SweepOptions::default(), &mut Vec::new()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SweepError>(),
        Some(SweepError::TimedOut { .. })
    ));
    assert_eq!(read_lines(&def.output).len(), 1);
    Ok(())
}

#[test]
fn t_marker_and_stdin() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(
        dir.path(),
        "bench",
        r#"read member
read insert
echo "Member fraction: $member"
echo "Elapsed time: 0.25 seconds"
echo "PARBENCH {\"ops\": $1}""#,
    )?;
    let mut def = definition(&dir, &[8], 1);
    def.args = vec!["{threads}".into()];
    def.stdin = Some("0.9\n0.1\n".into());
    def.metrics = vec![
        Metric::new(
            "Elapsed Time (s)",
            MetricSource::Marker {
                marker: "Elapsed time".into(),
                extract: Extract::AfterColon,
            },
        ),
        Metric::new(
            "Member",
            MetricSource::Marker {
                marker: "Member fraction".into(),
                extract: Extract::LastToken,
            },
        ),
        Metric::new("Ops", MetricSource::Record { key: "ops".into() }),
    ];

    run_sweep_to(&def, &SweepOptions::default(), &mut Vec::new())?;
    let lines = read_lines(&def.output);
    assert_eq!(
        lines[0],
        "Threads,Run,Elapsed Time (s),Member,Ops,\
         Average Elapsed Time (s),Average Member,Average Ops"
    );
    assert_eq!(lines[1], "8,1,0.25000,0.90000,8.00000,,,");
    assert_eq!(lines[2], "8,Average,,,,0.25000,0.90000,8.00000");
    Ok(())
}

#[test]
fn t_parse_failure_is_fatal() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "bench", "echo 'PARBENCH {\"t\": \"fast\"}'")?;
    let mut def = definition(&dir, &[1, 2], 2);
    def.metrics = vec![record_metric()];
    // Even when failed runs would be recorded as unavailable
    def.on_failure = FailurePolicy::Unavailable;

    let err = run_sweep_to(&def, &SweepOptions::default(), &mut Vec::new()).unwrap_err();
    match err.downcast_ref::<SweepError>() {
        Some(SweepError::Extraction { metric, reason }) => {
            assert_eq!(metric, "T");
            assert!(reason.contains("not a number"), "{reason}");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(read_lines(&def.output), ["Threads,Run,T,Average T"]);
    Ok(())
}

#[test]
fn t_dry_run() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "bench", "exit 1")?;
    let mut def = definition(&dir, &[1, 2], 5);
    def.args = vec!["{threads}".into(), "1000".into()];
    let options = SweepOptions {
        dry_run: true,
        ..Default::default()
    };

    let mut out = Vec::new();
    let summary = run_sweep_to(&def, &options, &mut out)?;
    assert_eq!(summary.points, 2);
    assert_eq!(summary.runs, 0);
    assert_eq!(summary.csv, None);
    assert!(!def.output.exists());

    let out = String::from_utf8(out)?;
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("sh "), "{out}");
    assert!(lines[0].ends_with("bench 1 1000"), "{out}");
    assert!(lines[1].ends_with("bench 2 1000"), "{out}");
    Ok(())
}

#[test]
fn t_options_override_runs_and_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "bench", "true")?;
    let def = definition(&dir, &[1], 5);
    let output = dir.path().join("elsewhere.csv");
    let options = SweepOptions {
        runs: Some(1),
        output: Some(output.clone()),
        ..Default::default()
    };

    let summary = run_sweep_to(&def, &options, &mut Vec::new())?;
    assert_eq!(summary.runs, 1);
    assert_eq!(summary.csv, Some(output.clone()));
    assert!(!def.output.exists());
    assert_eq!(read_lines(&output).len(), 3);
    Ok(())
}

#[test]
fn t_definition_file_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "bench", COUNTING_SCRIPT)?;
    let mut def = definition(&dir, &[1, 2], 1);
    def.metrics = vec![record_metric(), Metric::wall_clock()];

    for ext in ["yaml", "json5", "ron"] {
        let path = dir.path().join(format!("sweep.{ext}"));
        save_config_file(&path, &def)?;
        let loaded: SweepDefinition = load_config_file(&path)?;
        assert_eq!(loaded, def, "{ext}");
    }

    let loaded: SweepDefinition = load_config_file(&dir.path().join("sweep.yaml"))?;
    let summary = run_sweep_to(&loaded, &SweepOptions::default(), &mut Vec::new())?;
    assert_eq!(summary.points, 2);
    Ok(())
}
