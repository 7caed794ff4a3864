use chrono::NaiveDate;

use crate::models::style::SeriesKey;

/// 一条折线序列，只包含日期和数值都有效的行
#[derive(Debug, Clone, PartialEq)]
pub struct LinePoints {
    pub key: SeriesKey,
    pub points: Vec<(NaiveDate, f64)>,
}

/// 布林带上下轨之间的填充区域
#[derive(Debug, Clone, PartialEq)]
pub struct BandArea {
    /// (日期, 下轨, 上轨)
    pub points: Vec<(NaiveDate, f64, f64)>,
}

impl BandArea {
    /// 上轨正向 + 下轨反向，组成闭合多边形
    pub fn polygon(&self) -> Vec<(NaiveDate, f64)> {
        let mut polygon: Vec<(NaiveDate, f64)> =
            self.points.iter().map(|&(d, _, upper)| (d, upper)).collect();
        polygon.extend(self.points.iter().rev().map(|&(d, lower, _)| (d, lower)));
        polygon
    }
}

/// 支撑点
#[derive(Debug, Clone, PartialEq)]
pub enum SupportMarkers {
    /// 竖线所在的日期 (去重、升序)
    Dates(Vec<NaiveDate>),
    /// 横线所在的价位 (去重、升序)
    Levels(Vec<f64>),
}

impl SupportMarkers {
    pub fn is_empty(&self) -> bool {
        match self {
            SupportMarkers::Dates(dates) => dates.is_empty(),
            SupportMarkers::Levels(levels) => levels.is_empty(),
        }
    }
}

/// 单根成交量柱 (可堆叠: base..top)
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeBar {
    pub date: NaiveDate,
    pub key: SeriesKey,
    pub base: f64,
    pub top: f64,
}

/// 单个WKN的绘图数据，与绘图后端无关
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedChart {
    pub entity: String,
    pub lines: Vec<LinePoints>,
    pub band: Option<BandArea>,
    pub support: Option<SupportMarkers>,
    pub volume: Vec<VolumeBar>,
    /// 上图 Y 轴范围 (已留白)
    pub y_range: (f64, f64),
    /// 第一个和最后一个有效日期
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl PreparedChart {
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.date_range.map(|(_, last)| last)
    }

    pub fn line(&self, key: SeriesKey) -> Option<&LinePoints> {
        self.lines.iter().find(|l| l.key == key)
    }

    pub fn volume_bars(&self, key: SeriesKey) -> impl Iterator<Item = &VolumeBar> + '_ {
        self.volume.iter().filter(move |b| b.key == key)
    }

    /// 成交量轴上限：最高柱的 1.25 倍，全为 0 时为 1
    pub fn volume_limit(&self) -> f64 {
        let max = self
            .volume
            .iter()
            .map(|b| b.top)
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);
        if max > 0.0 {
            max * 1.25
        } else {
            1.0
        }
    }
}
