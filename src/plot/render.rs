//! Drawing series onto PNG or SVG images with plotters.

use std::{
    fmt::Display,
    ops::Range,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{anyhow, bail, Context, Result};
use plotters::{
    coord::Shift,
    prelude::*,
    style::{register_font, FontStyle},
};

use super::{
    definition::{ChartDefinition, ChartKind, ImageFormat},
    series::Series,
};

/// DejaVu Sans, see `assets/fonts/DejaVuSans-LICENSE`. Embedded so
/// that bitmap text does not depend on the fonts of the host.
static SANS_SERIF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

/// Make the embedded font plotters' "sans-serif" family.
fn register_fonts() -> Result<()> {
    let registered = *FONT_REGISTERED
        .get_or_init(|| register_font("sans-serif", FontStyle::Normal, SANS_SERIF).is_ok());
    if !registered {
        bail!("the embedded chart font could not be loaded")
    }
    Ok(())
}

fn plot_error(e: impl Display) -> anyhow::Error {
    anyhow!("{e}")
}

fn format_tick(v: f64) -> String {
    if v != 0. && (v.abs() >= 1e6 || v.abs() < 1e-3) {
        format!("{v:.1e}")
    } else if v.fract() == 0. {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.3}");
        s.trim_end_matches('0').trim_end_matches('.').to_owned()
    }
}

/// The distinct x values of all series, ascending.
fn categories(series: &[Series]) -> Vec<f64> {
    let mut xs: Vec<f64> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|(x, _)| *x))
        .collect();
    xs.sort_by(|a, b| a.total_cmp(b));
    xs.dedup();
    xs
}

fn padded(min: f64, max: f64) -> Range<f64> {
    if max > min {
        let pad = (max - min) * 0.05;
        (min - pad)..(max + pad)
    } else {
        (min - 1.)..(max + 1.)
    }
}

fn ranges(kind: ChartKind, series: &[Series], categories: &[f64]) -> (Range<f64>, Range<f64>) {
    let points = || series.iter().flat_map(|s| s.points.iter());
    let y_min = points().map(|(_, y)| *y).fold(0f64, f64::min);
    let mut y_max = points().map(|(_, y)| *y).fold(f64::NEG_INFINITY, f64::max);
    if y_max <= y_min {
        y_max = y_min + 1.;
    }
    let y_range = y_min..(y_max + (y_max - y_min) * 0.1);
    let x_range = match kind {
        ChartKind::Bar => -0.5..(categories.len() as f64 - 0.5),
        ChartKind::Line | ChartKind::Scatter => {
            let x_min = points().map(|(x, _)| *x).fold(f64::INFINITY, f64::min);
            let x_max = points().map(|(x, _)| *x).fold(f64::NEG_INFINITY, f64::max);
            padded(x_min, x_max)
        }
    };
    (x_range, y_range)
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    chart: &ChartDefinition,
    series: &[Series],
) -> Result<()> {
    root.fill(&WHITE).map_err(plot_error)?;

    let categories = categories(series);
    let (x_range, y_range) = ranges(chart.kind, series, &categories);

    let mut context = ChartBuilder::on(&root)
        .margin(15)
        .caption(&chart.title, ("sans-serif", 24))
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)
        .map_err(plot_error)?;

    let format_x = |v: &f64| -> String {
        match (chart.kind, chart.log_x) {
            (ChartKind::Bar, _) => {
                let i = v.round();
                if (v - i).abs() < 1e-6 && i >= 0. && (i as usize) < categories.len() {
                    format_tick(categories[i as usize])
                } else {
                    String::new()
                }
            }
            (_, Some(base)) => format_tick(base.powf(*v)),
            (_, None) => format_tick(*v),
        }
    };
    let format_y = |v: &f64| format_tick(*v);
    {
        let mut mesh = context.configure_mesh();
        mesh.x_desc(chart.x_description())
            .y_desc(chart.y_description())
            .x_label_formatter(&format_x)
            .y_label_formatter(&format_y);
        if chart.kind == ChartKind::Bar {
            mesh.x_labels(categories.len() + 1).disable_x_mesh();
        }
        mesh.draw().map_err(plot_error)?;
    }

    let bar_width = 0.8 / series.len() as f64;
    for (i, s) in series.iter().enumerate() {
        let color = Palette99::pick(i).mix(0.9);
        let annotation = match chart.kind {
            ChartKind::Line => {
                context
                    .draw_series(s.points.iter().map(|&p| Circle::new(p, 3, color.filled())))
                    .map_err(plot_error)?;
                context
                    .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))
                    .map_err(plot_error)?
            }
            ChartKind::Scatter => context
                .draw_series(s.points.iter().map(|&p| Circle::new(p, 4, color.filled())))
                .map_err(plot_error)?,
            ChartKind::Bar => context
                .draw_series(s.points.iter().map(|&(x, y)| {
                    let category = categories.iter().position(|c| *c == x).unwrap_or(0);
                    let x0 = category as f64 - 0.4 + i as f64 * bar_width;
                    Rectangle::new([(x0, 0.), (x0 + bar_width, y)], color.filled())
                }))
                .map_err(plot_error)?,
        };
        annotation
            .label(s.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    context
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_error)?;
    root.present().map_err(plot_error)?;
    Ok(())
}

/// Draw `series` into the image file `chart.output` below
/// `output_dir`, returning its path.
pub fn render_chart(chart: &ChartDefinition, series: &[Series], output_dir: &Path) -> Result<PathBuf> {
    if series.is_empty() {
        bail!(
            "chart {:?} ({:?}) has no data points to plot",
            chart.title,
            chart.output
        )
    }
    register_fonts()?;
    let path = output_dir.join(&chart.output);
    match chart.image_format()? {
        ImageFormat::Png => draw(
            BitMapBackend::new(&path, chart.size).into_drawing_area(),
            chart,
            series,
        ),
        ImageFormat::Svg => draw(
            SVGBackend::new(&path, chart.size).into_drawing_area(),
            chart,
            series,
        ),
    }
    .with_context(|| anyhow!("drawing chart to {path:?}"))?;
    Ok(path)
}
