use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use super::{Chart, ChartKind, Palette};
use crate::stats::{Histogram, LabelCount, TossDecisionCount};

/// Output encoding for chart images
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

/// Render a chart to an in-memory SVG document.
pub fn render_svg(chart: &Chart) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, chart.size).into_drawing_area();
        draw(&root, chart)?;
        root.present()?;
    }
    Ok(svg)
}

/// Render a chart into `path` using the given format.
pub fn render_to_file(chart: &Chart, path: &Path, format: ImageFormat) -> Result<()> {
    match format {
        ImageFormat::Png => {
            let root = BitMapBackend::new(path, chart.size).into_drawing_area();
            draw(&root, chart)?;
            root.present()?;
        }
        ImageFormat::Svg => {
            let root = SVGBackend::new(path, chart.size).into_drawing_area();
            draw(&root, chart)?;
            root.present()?;
        }
    }
    Ok(())
}

fn draw<DB>(root: &DrawingArea<DB, Shift>, chart: &Chart) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    match &chart.kind {
        ChartKind::Bar { bars, palette } => draw_bars(root, chart, bars, *palette),
        ChartKind::Histogram { histogram, color } => {
            draw_histogram(root, chart, histogram, *color)
        }
        ChartKind::Grouped { groups } => draw_grouped(root, chart, groups),
    }
}

fn label_style(rotate: bool) -> TextStyle<'static> {
    let font = ("sans-serif", 13).into_font();
    if rotate {
        font.transform(FontTransform::Rotate90).into()
    } else {
        font.into()
    }
}

fn y_upper(max: u64) -> f64 {
    (max as f64 * 1.1).max(1.0)
}

fn draw_bars<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &Chart,
    bars: &[LabelCount],
    palette: Palette,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let n = bars.len() as u32;
    let max = bars.iter().map(|b| b.value).max().unwrap_or(0);

    let mut ctx = ChartBuilder::on(root)
        .caption(chart.title, ("sans-serif", 26))
        .margin(20)
        .x_label_area_size(if chart.rotate_x_labels { 140 } else { 45 })
        .y_label_area_size(60)
        .build_cartesian_2d((0..n).into_segmented(), 0f64..y_upper(max))?;

    let formatter = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => bars
            .get(*i as usize)
            .map(|b| b.label.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len().max(1))
        .x_label_formatter(&formatter)
        .x_label_style(label_style(chart.rotate_x_labels))
        .x_desc(chart.x_label)
        .y_desc(chart.y_label)
        .draw()?;

    ctx.draw_series(bars.iter().enumerate().map(|(i, bar)| {
        let color = palette.color(i, bars.len());
        let mut rect = Rectangle::new(
            [
                (SegmentValue::Exact(i as u32), 0.0),
                (SegmentValue::Exact(i as u32 + 1), bar.value as f64),
            ],
            color.filled(),
        );
        rect.set_margin(0, 0, 6, 6);
        rect
    }))?;

    Ok(())
}

fn draw_histogram<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &Chart,
    histogram: &Histogram,
    color: RGBColor,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (lo, hi) = histogram.range().unwrap_or((0.0, 1.0));
    let curve_max = histogram
        .density
        .iter()
        .map(|p| p.y)
        .fold(0.0f64, f64::max);
    let top = y_upper(histogram.max_count()).max(curve_max * 1.1);

    let mut ctx = ChartBuilder::on(root)
        .caption(chart.title, ("sans-serif", 26))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(lo..hi, 0f64..top)?;

    ctx.configure_mesh()
        .x_desc(chart.x_label)
        .y_desc(chart.y_label)
        .draw()?;

    ctx.draw_series(histogram.bins.iter().map(|bin| {
        Rectangle::new(
            [(bin.start, 0.0), (bin.end, bin.count as f64)],
            color.mix(0.6).filled(),
        )
    }))?;
    ctx.draw_series(histogram.bins.iter().map(|bin| {
        Rectangle::new(
            [(bin.start, 0.0), (bin.end, bin.count as f64)],
            color.stroke_width(1),
        )
    }))?;

    if !histogram.density.is_empty() {
        ctx.draw_series(LineSeries::new(
            histogram.density.iter().map(|p| (p.x, p.y)),
            color.stroke_width(2),
        ))?;
    }

    Ok(())
}

fn draw_grouped<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &Chart,
    groups: &[TossDecisionCount],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut categories: Vec<&str> = Vec::new();
    let mut hues: Vec<&str> = Vec::new();
    for g in groups {
        if !categories.contains(&g.decision.as_str()) {
            categories.push(&g.decision);
        }
        if !hues.contains(&g.team.as_str()) {
            hues.push(&g.team);
        }
    }
    let max = groups.iter().map(|g| g.count).max().unwrap_or(0);
    let n = categories.len().max(1) as f64;

    let mut ctx = ChartBuilder::on(root)
        .caption(chart.title, ("sans-serif", 26))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..n, 0f64..y_upper(max))?;

    // Category names sit on the half-unit ticks
    let formatter = |x: &f64| {
        let centre = x - x.floor();
        if (centre - 0.5).abs() < 1e-6 {
            categories
                .get(x.floor() as usize)
                .map(|c| c.to_string())
                .unwrap_or_default()
        } else {
            String::new()
        }
    };
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len() * 2 + 1)
        .x_label_formatter(&formatter)
        .x_desc(chart.x_label)
        .y_desc(chart.y_label)
        .draw()?;

    let slot = 0.8 / hues.len().max(1) as f64;
    for (h, hue) in hues.iter().enumerate() {
        let color = Palette::Deep.color(h, hues.len());
        let bars: Vec<Rectangle<(f64, f64)>> = groups
            .iter()
            .filter(|g| g.team == *hue)
            .filter_map(|g| {
                let c = categories.iter().position(|c| *c == g.decision)? as f64;
                let x0 = c + 0.1 + slot * h as f64;
                Some(Rectangle::new(
                    [(x0, 0.0), (x0 + slot, g.count as f64)],
                    color.filled(),
                ))
            })
            .collect();
        ctx.draw_series(bars)?
            .label(*hue)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    if !hues.is_empty() {
        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    Ok(())
}
