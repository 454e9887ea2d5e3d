//! Table printing for the console: human-readable with padding (and
//! ANSI formatting for the title row), or tab-separated.
//!
//! Values are printed via `Display` without escaping, so values
//! containing tabs or newlines make the output ambiguous.

use std::{
    fmt::Display,
    io::{IsTerminal, Write},
};

use anyhow::{anyhow, bail, Result};
use itertools::Itertools;
use strum_macros::EnumString;
use yansi::{Paint, Style};

#[derive(Debug, EnumString, PartialEq, Clone, Copy)]
#[strum(serialize_all = "kebab_case")]
pub enum ColorOpt {
    Auto,
    Always,
    Never,
}

impl ColorOpt {
    pub fn want_color(self, detected_terminal: bool) -> bool {
        match self {
            ColorOpt::Auto => detected_terminal,
            ColorOpt::Always => true,
            ColorOpt::Never => false,
        }
    }
}

#[derive(Debug, clap::Args, Clone)]
pub struct TerminalTableOpts {
    /// Show tables tab-separated instead of human-readable
    #[clap(long)]
    pub tsv: bool,

    /// Whether to use ANSI codes to format human-readable output on
    /// terminals (auto, always, never)
    #[clap(long, default_value = "auto")]
    pub color: ColorOpt,
}

impl Default for TerminalTableOpts {
    fn default() -> Self {
        Self {
            tsv: false,
            color: ColorOpt::Auto,
        }
    }
}

impl TerminalTableOpts {
    pub fn want_color(&self) -> bool {
        !self.tsv && self.color.want_color(std::io::stdout().is_terminal())
    }
}

/// Capable of streaming, which requires defining the column widths
/// beforehand. If a value is wider than the defined column width for
/// that value, a single space is still printed between the value and
/// the next. The last column does not need a width, and no padding is
/// printed.
pub struct TerminalTable {
    widths: Vec<usize>,
    titles: Vec<String>,
    padding: String,
    tsv_mode: bool,
    color: bool,
}

impl TerminalTable {
    /// The length of `widths` must be one less than that of `titles`
    /// (the last column does not need a width).
    pub fn new<S: Display>(widths: &[usize], titles: &[S], opts: &TerminalTableOpts) -> Self {
        let titles = titles.iter().map(|title| format!("{title} ")).collect();
        let max_width = widths.iter().max().copied().unwrap_or(0);
        let padding = " ".repeat(max_width);
        Self {
            widths: widths.to_owned(),
            titles,
            padding,
            tsv_mode: opts.tsv,
            color: opts.want_color(),
        }
    }

    /// Widths fitting the titles and the given sample values, plus 2
    /// characters of spacing.
    pub fn widths_for<S: AsRef<str>>(titles: &[S], samples: &[usize]) -> Vec<usize> {
        let mut widths: Vec<usize> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let sample = samples.get(i).copied().unwrap_or(0);
                title.as_ref().len().max(sample) + 2
            })
            .collect();
        widths.pop();
        widths
    }

    fn write_row<V: Display>(
        &self,
        row: &[V],
        line_style: Option<&Style>,
        out: &mut impl Write,
    ) -> Result<()> {
        let lens = (self.widths.len(), row.len());
        let (l1, l2) = lens;
        if l1
            != l2
                .checked_sub(1)
                .ok_or_else(|| anyhow!("need at least 1 column"))?
        {
            bail!("widths.len != data.len - 1: {lens:?}")
        }

        let mut is_first = true;
        for either_or_both in self.widths.iter().zip_longest(row) {
            if self.tsv_mode && !is_first {
                out.write_all(b"\t")?;
            }

            let val = either_or_both
                .as_ref()
                .right()
                .expect("value there because row len checked above");
            let s = val.to_string();
            let s_len = s.len();
            if let Some(style) = line_style {
                write!(out, "{}", s.paint(*style))?;
            } else {
                out.write_all(s.as_bytes())?;
            }

            if let Some(width) = either_or_both.left() {
                if !self.tsv_mode {
                    if *width > s_len {
                        out.write_all(self.padding[0..width - s_len].as_bytes())?;
                    } else {
                        // write out at least 1 space anyway
                        out.write_all(b" ")?;
                    }
                }
            }

            is_first = false;
        }
        out.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_title_row(&self, out: &mut impl Write) -> Result<()> {
        const STYLE: Style = Style::new().bold().italic();
        self.write_row(
            &self.titles,
            if self.color { Some(&STYLE) } else { None },
            out,
        )
    }

    pub fn write_data_row<V: Display>(&self, data: &[V], out: &mut impl Write) -> Result<()> {
        self.write_row(data, None, out)
    }
}
