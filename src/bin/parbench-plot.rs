use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use parbench::{
    config_file::{self, load_config_file, save_config_file},
    get_terminal_width::get_terminal_width,
    info,
    plot::{run_plot, PlotDefinition, PlotOptions},
    presets::{find_plot, PRESETS},
    terminal_table::{TerminalTable, TerminalTableOpts},
    utillib::logging::{set_log_level, LogLevelOpt},
};

const PROGRAM_NAME: &str = "parbench-plot";

#[derive(clap::Parser, Debug)]
#[clap(next_line_help = true)]
#[clap(set_term_width = get_terminal_width())]
/// Draw charts (execution time, speedup) from the CSV files written
/// by `parbench-sweep`.
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

    /// Show the built-in plot presets
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

    /// Draw the charts of a plot definition
    Run {
        /// The name of a built-in preset (see `list`)
        preset: Option<String>,

        /// Load the plot definition from this file instead of using a
        /// preset
        #[clap(long)]
        config: Option<PathBuf>,

        /// Read this CSV file instead of the one named in the
        /// definition
        #[clap(long)]
        csv: Option<PathBuf>,

        /// Directory to write the images to (default: the current
        /// directory)
        #[clap(long, short)]
        output_dir: Option<PathBuf>,
    },
}

fn load_definition(preset: Option<String>, config: Option<PathBuf>) -> Result<PlotDefinition> {
    match (preset, config) {
        (Some(preset), None) => find_plot(&preset),
        (None, Some(config)) => {
            info!("loading plot definition from {config:?}");
            load_config_file(&config)
        }
        (Some(_), Some(_)) => bail!("please give either a preset name or `--config`, not both"),
        (None, None) => bail!("please give a preset name or `--config` (see `{PROGRAM_NAME} list`)"),
    }
}

fn list(terminal_table_opts: &TerminalTableOpts) -> Result<()> {
    let titles = ["Preset", "Charts", "CSV"];
    let rows: Vec<[String; 3]> = PRESETS
        .iter()
        .map(|preset| {
            let definition = (preset.plot)();
            [
                preset.name.to_string(),
                definition.charts.len().to_string(),
                definition.csv.to_string_lossy().into_owned(),
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
            let definition = find_plot(&preset)?;
            save_config_file(&output_path, &definition)?;
            info!("saved plot preset {preset:?} to {output_path:?}");
        }
        SubCommand::Run {
            preset,
            config,
            csv,
            output_dir,
        } => {
            let definition = load_definition(preset, config)?;
            let written = run_plot(&definition, &PlotOptions { csv, output_dir })?;
            for path in written {
                println!("{}", path.to_string_lossy());
            }
        }
    }
    Ok(())
}
