use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use parbench::{
    config_file::{self, load_config_file, save_config_file},
    get_terminal_width::get_terminal_width,
    info,
    presets::{find_sweep, PRESETS},
    sweep::{axis::enumerate_points, run_sweep, SweepDefinition, SweepOptions},
    terminal_table::{TerminalTable, TerminalTableOpts},
    utillib::logging::{set_log_level, LogLevelOpt},
};

const PROGRAM_NAME: &str = "parbench-sweep";

#[derive(clap::Parser, Debug)]
#[clap(next_line_help = true)]
#[clap(set_term_width = get_terminal_width())]
/// Run benchmark executables over parameter sweeps and record the
/// timings in a CSV file.
struct Opts {
    #[clap(flatten)]
    log_level: LogLevelOpt,

    /// The subcommand to run. Use `--help` after the sub-command to
    /// get a list of the allowed options there.
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Print version
    Version,

    /// Show the built-in sweep presets
    List {
        #[clap(flatten)]
        terminal_table_opts: TerminalTableOpts,
    },

    /// Show the supported config format types.
    ConfigFormats,

    /// Save the definition of a preset at the given path
    /// (serialization type determined by file extension), for editing
    /// and passing back via `run --config`.
    ConfigSave { preset: String, output_path: PathBuf },

    /// Run a sweep
    Run {
        /// The name of a built-in preset (see `list`)
        preset: Option<String>,

        /// Load the sweep definition from this file instead of using
        /// a preset
        #[clap(long)]
        config: Option<PathBuf>,

        /// Override the number of repetitions per configuration point
        #[clap(long)]
        runs: Option<usize>,

        /// Override the path of the CSV file to write
        #[clap(long, short)]
        output: Option<PathBuf>,

        /// Override the directory holding the executables
        #[clap(long)]
        build_dir: Option<PathBuf>,

        /// Only print the command lines that would be run
        #[clap(long)]
        dry_run: bool,

        #[clap(flatten)]
        terminal_table_opts: TerminalTableOpts,
    },
}

fn load_definition(preset: Option<String>, config: Option<PathBuf>) -> Result<SweepDefinition> {
    match (preset, config) {
        (Some(preset), None) => find_sweep(&preset),
        (None, Some(config)) => {
            info!("loading sweep definition from {config:?}");
            load_config_file(&config)
        }
        (Some(_), Some(_)) => bail!("please give either a preset name or `--config`, not both"),
        (None, None) => bail!("please give a preset name or `--config` (see `{PROGRAM_NAME} list`)"),
    }
}

fn list(terminal_table_opts: &TerminalTableOpts) -> Result<()> {
    let titles = ["Preset", "Points", "Runs", "Output"];
    let rows: Vec<[String; 4]> = PRESETS
        .iter()
        .map(|preset| {
            let definition = (preset.sweep)();
            let executables: Vec<usize> = (0..definition.executables.len()).collect();
            [
                preset.name.to_string(),
                enumerate_points(&definition, &executables).len().to_string(),
                definition.runs_per_test.to_string(),
                definition.output.to_string_lossy().into_owned(),
            ]
        })
        .collect();
    let samples: Vec<usize> = (0..titles.len())
        .map(|i| rows.iter().map(|row| row[i].len()).max().unwrap_or(0))
        .collect();
    let table = TerminalTable::new(
        &TerminalTable::widths_for(&titles, &samples),
        &titles,
        terminal_table_opts,
    );
    let mut out = std::io::stdout().lock();
    table.write_title_row(&mut out)?;
    for row in &rows {
        table.write_data_row(row, &mut out)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let Opts {
        log_level,
        subcommand,
    } = Opts::parse();

    set_log_level(log_level.try_into()?);

    match subcommand {
        SubCommand::Version => {
            println!("{PROGRAM_NAME} version {}", env!("CARGO_PKG_VERSION"));
        }
        SubCommand::List {
            terminal_table_opts,
        } => list(&terminal_table_opts)?,
        SubCommand::ConfigFormats => {
            println!(
                "These configuration file extensions / formats are supported:\n\n  {}\n",
                config_file::supported_formats().join("\n  ")
            );
        }
        SubCommand::ConfigSave {
            preset,
            output_path,
        } => {
            let definition = find_sweep(&preset)?;
            save_config_file(&output_path, &definition)?;
            info!("saved sweep preset {preset:?} to {output_path:?}");
        }
        SubCommand::Run {
            preset,
            config,
            runs,
            output,
            build_dir,
            dry_run,
            terminal_table_opts,
        } => {
            let definition = load_definition(preset, config)?;
            let options = SweepOptions {
                runs,
                output,
                build_dir,
                dry_run,
                table: terminal_table_opts,
            };
            let summary = run_sweep(&definition, &options)?;
            if let Some(csv) = &summary.csv {
                info!("results written to {csv:?}");
            }
        }
    }
    Ok(())
}
