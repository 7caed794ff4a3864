use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::debug;
use plotters::coord::Shift;
use plotters::coord::CoordTranslate;
use plotters::prelude::*;
use std::path::Path;

use crate::config::Config;
use crate::errors::{ChartError, Result};
use crate::models::chart::{PreparedChart, SupportMarkers};
use crate::models::style::{LineStyle, SeriesKey, Stroke, StyleConfig};
use crate::util;

/// 坐标轴上的日期格式
pub const DATE_LABEL_FORMAT: &str = "%d.%m.%Y";

const LEGEND_COLUMNS: usize = 4;
const LEGEND_ROW_HEIGHT: i32 = 28;
const X_LABEL_AREA: u32 = 50;
const Y_LABEL_AREA: u32 = 90;

fn render_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::RenderError(e.to_string())
}

/// `<WKN>_<最后日期 ddmmyyyy>_<运行日期>_<运行时间>.png`
pub fn chart_file_name(entity: &str, last_date: Option<NaiveDate>, run_at: NaiveDateTime) -> String {
    let last = last_date
        .map(|d| d.format("%d%m%Y").to_string())
        .unwrap_or_else(|| "nodate".to_string());
    format!(
        "{}_{}_{}_{}.png",
        util::sanitize_file_component(entity),
        last,
        run_at.format("%Y-%m-%d"),
        run_at.format("%H%M%S")
    )
}

/// 成交量轴标签：1.2k / 3.4M / 5.0B
pub fn format_volume(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("{:.1}B", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}

/// 图例中的一项
#[derive(Debug, Clone, PartialEq)]
pub enum LegendGlyph {
    Line(LineStyle),
    Patch(LineStyle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub glyph: LegendGlyph,
}

/// 上下两个子图的图例合并，顺序与绘制顺序一致
pub fn legend_entries(chart: &PreparedChart, styles: &StyleConfig) -> Vec<LegendEntry> {
    let mut entries: Vec<LegendEntry> = chart
        .lines
        .iter()
        .map(|line| LegendEntry {
            label: line.key.label().to_string(),
            glyph: LegendGlyph::Line(styles.get(line.key)),
        })
        .collect();

    if let Some(support) = chart.support.as_ref().filter(|s| !s.is_empty()) {
        let label = match support {
            SupportMarkers::Dates(_) => "Unterstützung (Datum)",
            SupportMarkers::Levels(_) => "Unterstützung (Niveau)",
        };
        entries.push(LegendEntry {
            label: label.to_string(),
            glyph: LegendGlyph::Line(styles.get(SeriesKey::Support)),
        });
    }

    for key in [SeriesKey::VolumeGreen, SeriesKey::VolumeRed, SeriesKey::VolumeNeutral] {
        if chart.volume_bars(key).next().is_some() {
            entries.push(LegendEntry {
                label: key.label().to_string(),
                glyph: LegendGlyph::Patch(styles.get(key)),
            });
        }
    }
    entries
}

/// 实线或虚线
fn draw_stroke<DB, CT>(
    chart: &mut ChartContext<'_, DB, CT>,
    points: Vec<(NaiveDate, f64)>,
    style: &LineStyle,
) -> Result<()>
where
    DB: DrawingBackend,
    CT: CoordTranslate<From = (NaiveDate, f64)>,
{
    match style.stroke.dash() {
        None => {
            chart
                .draw_series(LineSeries::new(points, style.shape()))
                .map_err(render_err)?;
        }
        Some((size, spacing)) => {
            chart
                .draw_series(DashedLineSeries::new(points, size, spacing, style.shape()))
                .map_err(render_err)?;
        }
    }
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, entries: &[LegendEntry]) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let (width, _) = area.dim_in_pixel();
    let columns = entries.len().min(LEGEND_COLUMNS);
    let rows = (entries.len() + LEGEND_COLUMNS - 1) / LEGEND_COLUMNS;
    let column_width = 300;
    let box_width = column_width * columns as i32 + 20;
    let box_height = LEGEND_ROW_HEIGHT * rows as i32 + 16;
    let left = (width as i32 - box_width) / 2;
    let top = 10;

    area.draw(&Rectangle::new(
        [(left, top), (left + box_width, top + box_height)],
        BLACK.mix(0.3).stroke_width(1),
    ))
    .map_err(render_err)?;

    for (i, entry) in entries.iter().enumerate() {
        let x = left + 10 + column_width * (i % LEGEND_COLUMNS) as i32;
        let y = top + 8 + LEGEND_ROW_HEIGHT * (i / LEGEND_COLUMNS) as i32 + LEGEND_ROW_HEIGHT / 2;

        match &entry.glyph {
            LegendGlyph::Line(style) => {
                area.draw(&PathElement::new(vec![(x, y), (x + 36, y)], style.shape()))
                    .map_err(render_err)?;
            }
            LegendGlyph::Patch(style) => {
                area.draw(&Rectangle::new([(x + 6, y - 8), (x + 30, y + 8)], style.fill()))
                    .map_err(render_err)?;
            }
        }
        area.draw(&Text::new(
            entry.label.clone(),
            (x + 46, y - 9),
            ("sans-serif", 18).into_font(),
        ))
        .map_err(render_err)?;
    }
    Ok(())
}

/// 在任意绘图后端上绘制两栏图表：上方价格与指标 (6)，下方成交量 (1)，图例在最下方
pub fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &PreparedChart,
    styles: &StyleConfig,
) -> Result<()> {
    let (first, last) = chart
        .date_range
        .ok_or_else(|| ChartError::DataError(format!("WKN {} has no valid dates", chart.entity)))?;
    let x_start = first - Duration::days(1);
    let x_end = last + Duration::days(1);
    let (y_min, y_max) = chart.y_range;

    root.fill(&WHITE).map_err(render_err)?;

    let (_, height) = root.dim_in_pixel();
    let legend_height = (height as f64 * 0.16) as u32;
    let (plot_area, legend_area) = root.split_vertically(height - legend_height);
    let plot_area = plot_area
        .titled(
            &format!("WKN {} – Kurs & Indikatoren", chart.entity),
            ("sans-serif", 30),
        )
        .map_err(render_err)?;

    let (_, plot_height) = plot_area.dim_in_pixel();
    let panel_height = plot_height.saturating_sub(X_LABEL_AREA);
    let (price_area, volume_area) = plot_area.split_vertically(panel_height * 6 / 7);

    // --- 价格与指标 ---
    let mut price = ChartBuilder::on(&price_area)
        .margin_left(15)
        .margin_right(30)
        .x_label_area_size(0)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_start..x_end, y_min..y_max)
        .map_err(render_err)?;

    price
        .configure_mesh()
        .x_labels(10)
        .max_light_lines(0)
        .bold_line_style(BLACK.mix(0.25).stroke_width(1))
        .y_desc("Preis")
        .x_label_formatter(&|d: &NaiveDate| d.format(DATE_LABEL_FORMAT).to_string())
        .draw()
        .map_err(render_err)?;

    if let Some(band) = &chart.band {
        price
            .draw_series(std::iter::once(Polygon::new(band.polygon(), styles.band_fill.fill())))
            .map_err(render_err)?;
    }

    for line in &chart.lines {
        draw_stroke(&mut price, line.points.clone(), &styles.get(line.key))?;
    }

    let support_style = styles.get(SeriesKey::Support);
    match &chart.support {
        Some(SupportMarkers::Dates(dates)) => {
            for &date in dates {
                draw_stroke(&mut price, vec![(date, y_min), (date, y_max)], &support_style)?;
            }
        }
        Some(SupportMarkers::Levels(levels)) => {
            for &level in levels {
                draw_stroke(&mut price, vec![(x_start, level), (x_end, level)], &support_style)?;
            }
        }
        None => {}
    }

    // --- 成交量 ---
    let volume_limit = chart.volume_limit();
    let mut volume = ChartBuilder::on(&volume_area)
        .margin_left(15)
        .margin_right(30)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_start..x_end, 0.0..volume_limit)
        .map_err(render_err)?;

    volume
        .configure_mesh()
        .x_labels(10)
        .y_labels(3)
        .max_light_lines(0)
        .bold_line_style(BLACK.mix(0.15).stroke_width(1))
        .y_desc("Vol.")
        .x_label_formatter(&|d: &NaiveDate| d.format(DATE_LABEL_FORMAT).to_string())
        .y_label_formatter(&|v: &f64| format_volume(*v))
        .draw()
        .map_err(render_err)?;

    if !chart.volume.is_empty() {
        volume
            .draw_series(chart.volume.iter().map(|bar| {
                Rectangle::new(
                    [(bar.date, bar.base), (bar.date + Duration::days(1), bar.top)],
                    styles.get(bar.key).fill(),
                )
            }))
            .map_err(render_err)?;

        let baseline = LineStyle::new(Stroke::Dashed, 0.8, RGBColor(0x66, 0x66, 0x66)).with_alpha(0.6);
        draw_stroke(&mut volume, vec![(x_start, 0.0), (x_end, 0.0)], &baseline)?;
    }

    // --- 图例放在图表下方 ---
    draw_legend(&legend_area, &legend_entries(chart, styles))?;

    Ok(())
}

/// 渲染为 PNG 文件，绘图对象在写入后立即释放
pub fn render_to_file(chart: &PreparedChart, styles: &StyleConfig, config: &Config, path: &Path) -> Result<()> {
    debug!("Rendering {} to {}", chart.entity, path.display());
    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    draw_chart(&root, chart, styles)?;
    root.present().map_err(render_err)?;
    Ok(())
}
