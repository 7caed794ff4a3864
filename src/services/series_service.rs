use chrono::NaiveDate;
use log::debug;

use crate::config::{Config, SupportStyle, VolumeMode};
use crate::data_provider::EntityGroup;
use crate::errors::Result;
use crate::models::chart::{BandArea, LinePoints, PreparedChart, SupportMarkers, VolumeBar};
use crate::models::style::SeriesKey;
use crate::util::arrow_utils;
use arrow_array::{Date32Array, Float64Array};

/// 画在 Bollinger 线之后的辅助线与趋势线，按绘制顺序
const TREND_LINES: [SeriesKey; 7] = [
    SeriesKey::Line6,
    SeriesKey::Line8,
    SeriesKey::Line50,
    SeriesKey::Line100,
    SeriesKey::Line200,
    SeriesKey::SupertrendUp,
    SeriesKey::SupertrendDown,
];

/// Y 轴留白：范围的 7%；所有值相同时取 |值| 的 5% (值为 0 时取 1.0)
pub fn padded_range<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return None;
    }

    let pad = if min == max {
        0.05 * if min != 0.0 { min.abs() } else { 1.0 }
    } else {
        (max - min) * 0.07
    };
    Some((min - pad, max + pad))
}

/// 日期和数值都有效的点
fn points(dates: &Date32Array, values: &Float64Array) -> Vec<(NaiveDate, f64)> {
    (0..dates.len())
        .filter_map(|i| {
            let date = arrow_utils::date_at(dates, i)?;
            let value = arrow_utils::value_at(values, i).filter(|v| v.is_finite())?;
            Some((date, value))
        })
        .collect()
}

fn line(group: &EntityGroup, dates: &Date32Array, key: SeriesKey) -> Result<Option<LinePoints>> {
    let values = match arrow_utils::optional_f64(&group.batch, key.column())? {
        Some(values) => values,
        None => return Ok(None),
    };
    let points = points(dates, values);
    if points.is_empty() {
        return Ok(None);
    }
    Ok(Some(LinePoints { key, points }))
}

fn band(group: &EntityGroup, dates: &Date32Array) -> Result<Option<BandArea>> {
    let upper = arrow_utils::optional_f64(&group.batch, SeriesKey::BollingerUpper.column())?;
    let lower = arrow_utils::optional_f64(&group.batch, SeriesKey::BollingerLower.column())?;
    let (upper, lower) = match (upper, lower) {
        (Some(upper), Some(lower)) => (upper, lower),
        _ => return Ok(None),
    };

    let points: Vec<(NaiveDate, f64, f64)> = (0..dates.len())
        .filter_map(|i| {
            let date = arrow_utils::date_at(dates, i)?;
            let up = arrow_utils::value_at(upper, i).filter(|v| v.is_finite())?;
            let low = arrow_utils::value_at(lower, i).filter(|v| v.is_finite())?;
            Some((date, low, up))
        })
        .collect();

    if points.is_empty() {
        Ok(None)
    } else {
        Ok(Some(BandArea { points }))
    }
}

/// 返回标记和原始的 (日期, 价位) 点
fn support(
    group: &EntityGroup,
    dates: &Date32Array,
    style: SupportStyle,
) -> Result<Option<(SupportMarkers, Vec<(NaiveDate, f64)>)>> {
    let values = match arrow_utils::optional_f64(&group.batch, SeriesKey::Support.column())? {
        Some(values) => values,
        None => return Ok(None),
    };
    let points = points(dates, values);
    if points.is_empty() {
        return Ok(None);
    }

    let markers = match style {
        SupportStyle::Vertical => {
            let mut dates: Vec<NaiveDate> = points.iter().map(|&(d, _)| d).collect();
            dates.sort();
            dates.dedup();
            SupportMarkers::Dates(dates)
        }
        SupportStyle::Horizontal => {
            let mut distinct: Vec<f64> = points.iter().map(|&(_, v)| v).collect();
            distinct.sort_by(|a, b| a.total_cmp(b));
            distinct.dedup();
            SupportMarkers::Levels(distinct)
        }
    };
    Ok(Some((markers, points)))
}

/// Auto 模式下根据可用列决定成交量的着色方式
pub fn resolve_volume_mode(group: &EntityGroup, mode: VolumeMode) -> Option<VolumeMode> {
    let has = |key: SeriesKey| group.batch.column_by_name(key.column()).is_some();
    let has_total = has(SeriesKey::VolumeNeutral);
    let has_split = has(SeriesKey::VolumeGreen) || has(SeriesKey::VolumeRed);

    match mode {
        VolumeMode::Auto if has_total => Some(VolumeMode::PriceDirection),
        VolumeMode::Auto if has_split => Some(VolumeMode::PreSplit),
        VolumeMode::Auto => None,
        VolumeMode::PriceDirection if has_total => Some(VolumeMode::PriceDirection),
        VolumeMode::PreSplit if has_split => Some(VolumeMode::PreSplit),
        _ => None,
    }
}

/// 预先拆分的绿/红列，红柱叠在绿柱上方，缺失按 0 计
fn split_volume(group: &EntityGroup, dates: &Date32Array) -> Result<Vec<VolumeBar>> {
    let green = arrow_utils::optional_f64(&group.batch, SeriesKey::VolumeGreen.column())?;
    let red = arrow_utils::optional_f64(&group.batch, SeriesKey::VolumeRed.column())?;
    let cell = |column: Option<&Float64Array>, i: usize| {
        column
            .and_then(|c| arrow_utils::value_at(c, i))
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    };

    let mut bars = Vec::new();
    for i in 0..dates.len() {
        let date = match arrow_utils::date_at(dates, i) {
            Some(date) => date,
            None => continue,
        };
        let g = cell(green, i);
        let r = cell(red, i);
        if g != 0.0 {
            bars.push(VolumeBar { date, key: SeriesKey::VolumeGreen, base: 0.0, top: g });
        }
        if r != 0.0 {
            bars.push(VolumeBar { date, key: SeriesKey::VolumeRed, base: g, top: g + r });
        }
    }
    Ok(bars)
}

/// 按收盘价相对前一行的涨跌着色：涨为绿，跌为红，其余 (首行、持平、缺价) 为中性
fn direction_volume(group: &EntityGroup, dates: &Date32Array) -> Result<Vec<VolumeBar>> {
    let volume = match arrow_utils::optional_f64(&group.batch, SeriesKey::VolumeNeutral.column())? {
        Some(volume) => volume,
        None => return Ok(Vec::new()),
    };
    let close = arrow_utils::optional_f64(&group.batch, SeriesKey::ClosingPrice.column())?;
    let price = |i: usize| {
        close
            .and_then(|c| arrow_utils::value_at(c, i))
            .filter(|v| v.is_finite())
    };

    let mut bars = Vec::new();
    for i in 0..dates.len() {
        let date = match arrow_utils::date_at(dates, i) {
            Some(date) => date,
            None => continue,
        };
        let value = match arrow_utils::value_at(volume, i).filter(|v| v.is_finite()) {
            Some(value) => value,
            None => continue,
        };

        let previous = if i > 0 { price(i - 1) } else { None };
        let key = match (previous, price(i)) {
            (Some(prev), Some(now)) if now > prev => SeriesKey::VolumeGreen,
            (Some(prev), Some(now)) if now < prev => SeriesKey::VolumeRed,
            _ => SeriesKey::VolumeNeutral,
        };
        bars.push(VolumeBar { date, key, base: 0.0, top: value });
    }
    Ok(bars)
}

/// 从单个WKN的数据中提取所有要绘制的序列
pub fn prepare_chart(group: &EntityGroup, config: &Config) -> Result<PreparedChart> {
    let dates = arrow_utils::required_dates(&group.batch, &config.date_column)?;

    let mut lines = Vec::new();
    for key in [SeriesKey::ClosingPrice, SeriesKey::Mean20] {
        lines.extend(line(group, dates, key)?);
    }

    // 上下轨只在两列都存在时绘制
    let band = band(group, dates)?;
    let has_band_columns = group.batch.column_by_name(SeriesKey::BollingerUpper.column()).is_some()
        && group.batch.column_by_name(SeriesKey::BollingerLower.column()).is_some();
    if has_band_columns {
        for key in [SeriesKey::BollingerUpper, SeriesKey::BollingerLower] {
            lines.extend(line(group, dates, key)?);
        }
    }

    for key in TREND_LINES {
        lines.extend(line(group, dates, key)?);
    }

    let mut y_values: Vec<f64> = lines.iter().flat_map(|l| l.points.iter().map(|&(_, v)| v)).collect();

    let mut support_dates = Vec::new();
    let support = match support(group, dates, config.support_style)? {
        Some((markers, points)) => {
            y_values.extend(points.iter().map(|&(_, v)| v));
            support_dates.extend(points.iter().map(|&(d, _)| d));
            Some(markers)
        }
        None => None,
    };

    let volume = match resolve_volume_mode(group, config.volume_mode) {
        Some(VolumeMode::PreSplit) => split_volume(group, dates)?,
        Some(VolumeMode::PriceDirection) => direction_volume(group, dates)?,
        _ => Vec::new(),
    };

    // 只统计实际绘制了内容的日期
    let drawn_dates = || {
        lines
            .iter()
            .flat_map(|l| l.points.iter().map(|&(d, _)| d))
            .chain(band.iter().flat_map(|b| b.points.iter().map(|&(d, _, _)| d)))
            .chain(support_dates.iter().copied())
            .chain(volume.iter().map(|b| b.date))
    };
    let date_range = drawn_dates().min().zip(drawn_dates().max());

    let y_range = padded_range(y_values).unwrap_or((0.0, 1.0));
    debug!(
        "{}: {} line series, {} volume bars, y range {:?}",
        group.entity,
        lines.len(),
        volume.len(),
        y_range
    );

    Ok(PreparedChart {
        entity: group.entity.clone(),
        lines,
        band,
        support,
        volume,
        y_range,
        date_range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_provider::ChartTable;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn prepare(csv: &str, config: &Config) -> PreparedChart {
        let table = ChartTable::from_reader(csv.as_bytes(), config).unwrap();
        let group = table.groups().next().unwrap().unwrap();
        prepare_chart(&group, config).unwrap()
    }

    #[test]
    fn range_is_padded_by_seven_percent() {
        let (lo, hi) = padded_range([10.0, 20.0, f64::NAN, f64::INFINITY]).unwrap();
        assert!((lo - 9.3).abs() < 1e-9);
        assert!((hi - 20.7).abs() < 1e-9);
    }

    #[test]
    fn single_value_range_is_not_degenerate() {
        let (lo, hi) = padded_range([42.0, 42.0]).unwrap();
        assert!(lo < hi);
        assert!((hi - 42.0 - 2.1).abs() < 1e-9);

        let (lo, hi) = padded_range([0.0]).unwrap();
        assert_eq!((lo, hi), (-0.05, 0.05));

        assert_eq!(padded_range(std::iter::empty()), None);
    }

    #[test]
    fn missing_values_only_drop_their_own_series() {
        let csv = "\
WKN;WP_Bollinger_Baender.Datum;Schlusskurs;Mean_20
A;01.01.2024;10,0;n/a
A;02.01.2024;11,0;10,5
A;;12,0;11,0
";
        let chart = prepare(csv, &Config::new());
        assert_eq!(chart.line(SeriesKey::ClosingPrice).unwrap().points.len(), 2);
        assert_eq!(chart.line(SeriesKey::Mean20).unwrap().points, vec![(ymd(2024, 1, 2), 10.5)]);
        assert!(chart.line(SeriesKey::Line6).is_none());
        assert_eq!(chart.date_range, Some((ymd(2024, 1, 1), ymd(2024, 1, 2))));
    }

    #[test]
    fn band_requires_both_bounds() {
        let csv = "\
WKN;WP_Bollinger_Baender.Datum;Bollinger_upper;Bollinger_lower
A;01.01.2024;12;8
A;02.01.2024;13;
A;03.01.2024;14;10
";
        let chart = prepare(csv, &Config::new());
        let band = chart.band.as_ref().unwrap();
        assert_eq!(band.points.len(), 2);
        assert_eq!(band.polygon().len(), 4);
        assert_eq!(chart.line(SeriesKey::BollingerUpper).unwrap().points.len(), 3);

        let only_upper = "WKN;WP_Bollinger_Baender.Datum;Bollinger_upper\nA;01.01.2024;12\n";
        let chart = prepare(only_upper, &Config::new());
        assert!(chart.band.is_none());
        assert!(chart.line(SeriesKey::BollingerUpper).is_none());
    }

    #[test]
    fn volume_follows_price_direction() {
        let csv = "\
WKN;WP_Bollinger_Baender.Datum;Schlusskurs;Volumen
A;01.01.2024;10;100
A;02.01.2024;11;200
A;03.01.2024;9;300
A;04.01.2024;9;400
A;05.01.2024;12;500
";
        let chart = prepare(csv, &Config::new());
        let days = |key| chart.volume_bars(key).map(|b| b.date).collect::<Vec<_>>();

        assert_eq!(days(SeriesKey::VolumeGreen), vec![ymd(2024, 1, 2), ymd(2024, 1, 5)]);
        assert_eq!(days(SeriesKey::VolumeRed), vec![ymd(2024, 1, 3)]);
        assert_eq!(days(SeriesKey::VolumeNeutral), vec![ymd(2024, 1, 1), ymd(2024, 1, 4)]);
        assert_eq!(chart.volume.len(), 5);
        assert_eq!(chart.volume_limit(), 625.0);
    }

    #[test]
    fn split_volume_is_stacked() {
        let csv = "\
WKN;WP_Bollinger_Baender.Datum;Linie_Volumen_gruen;Linie_Volumen_rot
A;01.01.2024;100;
A;02.01.2024;;50
A;03.01.2024;30;20
";
        let chart = prepare(csv, &Config::new());
        let red: Vec<&VolumeBar> = chart.volume_bars(SeriesKey::VolumeRed).collect();
        assert_eq!(red.len(), 2);
        assert_eq!((red[1].base, red[1].top), (30.0, 50.0));
        assert_eq!(chart.volume_bars(SeriesKey::VolumeGreen).count(), 2);
    }

    #[test]
    fn explicit_mode_without_columns_draws_no_volume() {
        let csv = "WKN;WP_Bollinger_Baender.Datum;Linie_Volumen_gruen\nA;01.01.2024;100\n";
        let config = Config::new().with_volume_mode(VolumeMode::PriceDirection);
        let chart = prepare(csv, &config);
        assert!(chart.volume.is_empty());
        assert_eq!(chart.volume_limit(), 1.0);
    }

    #[test]
    fn support_markers_extend_y_range() {
        let csv = "\
WKN;WP_Bollinger_Baender.Datum;Schlusskurs;Unterstuetzungspunkte
A;01.01.2024;10;
A;02.01.2024;11;5
A;03.01.2024;12;5
";
        let chart = prepare(csv, &Config::new());
        assert_eq!(
            chart.support,
            Some(SupportMarkers::Dates(vec![ymd(2024, 1, 2), ymd(2024, 1, 3)]))
        );
        assert!(chart.y_range.0 < 5.0);

        let config = Config::new().with_support_style(SupportStyle::Horizontal);
        let chart = prepare(csv, &config);
        assert_eq!(chart.support, Some(SupportMarkers::Levels(vec![5.0])));
    }

    #[test]
    fn group_without_values_gets_unit_range() {
        let csv = "WKN;WP_Bollinger_Baender.Datum;Schlusskurs\nA;01.01.2024;n/a\n";
        let chart = prepare(csv, &Config::new());
        assert!(chart.lines.is_empty());
        assert_eq!(chart.y_range, (0.0, 1.0));
        assert_eq!(chart.date_range, None);
    }

    #[test]
    fn date_range_ends_at_last_drawn_date() {
        let csv = "\
WKN;WP_Bollinger_Baender.Datum;Schlusskurs;Mean_20
A;31.12.2023;n/a;
A;01.01.2024;10,0;
A;02.01.2024;;10,5
A;03.01.2024;n/a;n/a
";
        let chart = prepare(csv, &Config::new());
        assert_eq!(chart.date_range, Some((ymd(2024, 1, 1), ymd(2024, 1, 2))));
        assert_eq!(chart.last_date(), Some(ymd(2024, 1, 2)));
    }

    #[test]
    fn volume_and_support_dates_count_as_drawn() {
        let csv = "\
WKN;WP_Bollinger_Baender.Datum;Schlusskurs;Unterstuetzungspunkte;Volumen
A;01.01.2024;;7;
A;02.01.2024;10;;
A;03.01.2024;;;500
";
        let config = Config::new().with_support_style(SupportStyle::Horizontal);
        let chart = prepare(csv, &config);
        assert_eq!(chart.date_range, Some((ymd(2024, 1, 1), ymd(2024, 1, 3))));
    }
}
