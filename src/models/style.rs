use plotters::style::{Color, RGBColor, ShapeStyle};
use std::collections::HashMap;

/// 图表中的逻辑序列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesKey {
    ClosingPrice,
    Mean20,
    BollingerUpper,
    BollingerLower,
    Line6,
    Line8,
    Line50,
    Line100,
    Line200,
    SupertrendUp,
    SupertrendDown,
    Support,
    VolumeGreen,
    VolumeRed,
    VolumeNeutral,
}

impl SeriesKey {
    /// 输入表中的数据列；成交量序列的来源取决于 VolumeMode，这里返回拆分列
    pub fn column(&self) -> &'static str {
        match self {
            SeriesKey::ClosingPrice => "Schlusskurs",
            SeriesKey::Mean20 => "Mean_20",
            SeriesKey::BollingerUpper => "Bollinger_upper",
            SeriesKey::BollingerLower => "Bollinger_lower",
            SeriesKey::Line6 => "Linie_6",
            SeriesKey::Line8 => "Linie_8",
            SeriesKey::Line50 => "Linie_50",
            SeriesKey::Line100 => "Linie_100",
            SeriesKey::Line200 => "Linie_200",
            SeriesKey::SupertrendUp => "Supertrend_up",
            SeriesKey::SupertrendDown => "Supertrend_down",
            SeriesKey::Support => "Unterstuetzungspunkte",
            SeriesKey::VolumeGreen => "Linie_Volumen_gruen",
            SeriesKey::VolumeRed => "Linie_Volumen_rot",
            SeriesKey::VolumeNeutral => "Volumen",
        }
    }

    /// 图例文字
    pub fn label(&self) -> &'static str {
        match self {
            SeriesKey::ClosingPrice => "Schlusskurs",
            SeriesKey::Mean20 => "Mean 20",
            SeriesKey::BollingerUpper => "Bollinger upper",
            SeriesKey::BollingerLower => "Bollinger lower",
            SeriesKey::Line6 => "Linie_6",
            SeriesKey::Line8 => "Linie_8",
            SeriesKey::Line50 => "Linie_50",
            SeriesKey::Line100 => "Linie_100",
            SeriesKey::Line200 => "Linie_200",
            SeriesKey::SupertrendUp => "Supertrend up",
            SeriesKey::SupertrendDown => "Supertrend down",
            SeriesKey::Support => "Unterstützung",
            SeriesKey::VolumeGreen => "Volumen grün",
            SeriesKey::VolumeRed => "Volumen rot",
            SeriesKey::VolumeNeutral => "Volumen",
        }
    }
}

/// 线型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl Stroke {
    /// (线段长度, 间隔)，单位像素
    pub fn dash(&self) -> Option<(i32, i32)> {
        match self {
            Stroke::Solid => None,
            Stroke::Dashed => Some((12, 6)),
            Stroke::Dotted => Some((3, 5)),
            Stroke::DashDot => Some((16, 5)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub stroke: Stroke,
    /// 线宽，单位 pt (按 150 dpi 换算成像素)
    pub width: f64,
    pub color: RGBColor,
    pub alpha: f64,
}

impl LineStyle {
    pub const fn new(stroke: Stroke, width: f64, color: RGBColor) -> Self {
        Self { stroke, width, color, alpha: 1.0 }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn pixel_width(&self) -> u32 {
        (self.width * 150.0 / 72.0).round().max(1.0) as u32
    }

    pub fn shape(&self) -> ShapeStyle {
        self.color.mix(self.alpha).stroke_width(self.pixel_width())
    }

    pub fn fill(&self) -> ShapeStyle {
        self.color.mix(self.alpha).filled()
    }
}

pub const CLR_PRICE: RGBColor = RGBColor(0x1f, 0x3a, 0x93);
pub const CLR_MEAN: RGBColor = RGBColor(0x6f, 0x42, 0xc1);
pub const CLR_BUP: RGBColor = RGBColor(0xff, 0x8c, 0x00);
pub const CLR_BLOW: RGBColor = RGBColor(0x7f, 0xd1, 0xd1);
pub const CLR_LIN: RGBColor = RGBColor(0x6c, 0x75, 0x7d);
pub const CLR_STUP: RGBColor = RGBColor(0x2e, 0x8b, 0x57);
pub const CLR_STDN: RGBColor = RGBColor(0xcc, 0x00, 0x00);
pub const CLR_SUPPORT: RGBColor = RGBColor(0x77, 0x77, 0x77);
pub const CLR_VOL_G: RGBColor = RGBColor(0x2c, 0xa0, 0x2c);
pub const CLR_VOL_R: RGBColor = RGBColor(0xd6, 0x27, 0x28);
pub const CLR_VOL_N: RGBColor = RGBColor(0x99, 0x99, 0x99);

/// 进程内只读的样式表，显式传给渲染器
#[derive(Debug, Clone)]
pub struct StyleConfig {
    styles: HashMap<SeriesKey, LineStyle>,
    /// 布林带之间的填充
    pub band_fill: LineStyle,
    pub fallback: LineStyle,
}

impl Default for StyleConfig {
    fn default() -> Self {
        use SeriesKey::*;
        use Stroke::*;

        let styles = HashMap::from([
            (ClosingPrice, LineStyle::new(Solid, 2.2, CLR_PRICE)),
            (Mean20, LineStyle::new(Dashed, 1.6, CLR_MEAN)),
            (BollingerUpper, LineStyle::new(Solid, 1.2, CLR_BUP)),
            (BollingerLower, LineStyle::new(Solid, 1.2, CLR_BLOW)),
            (Line6, LineStyle::new(Dashed, 1.0, CLR_LIN)),
            (Line8, LineStyle::new(Dashed, 1.0, CLR_LIN)),
            (Line50, LineStyle::new(Dotted, 1.2, CLR_LIN)),
            (Line100, LineStyle::new(Dotted, 1.2, CLR_LIN)),
            (Line200, LineStyle::new(DashDot, 1.4, CLR_LIN)),
            (SupertrendUp, LineStyle::new(Solid, 1.5, CLR_STUP)),
            (SupertrendDown, LineStyle::new(Solid, 1.5, CLR_STDN)),
            (Support, LineStyle::new(Dashed, 0.9, CLR_SUPPORT).with_alpha(0.6)),
            (VolumeGreen, LineStyle::new(Solid, 1.0, CLR_VOL_G).with_alpha(0.8)),
            (VolumeRed, LineStyle::new(Solid, 1.0, CLR_VOL_R).with_alpha(0.8)),
            (VolumeNeutral, LineStyle::new(Solid, 1.0, CLR_VOL_N).with_alpha(0.8)),
        ]);

        Self {
            styles,
            band_fill: LineStyle::new(Solid, 0.0, CLR_BLOW).with_alpha(0.12),
            fallback: LineStyle::new(Solid, 1.0, CLR_LIN),
        }
    }
}

impl StyleConfig {
    pub fn get(&self, key: SeriesKey) -> LineStyle {
        self.styles.get(&key).copied().unwrap_or(self.fallback)
    }

    pub fn with_style(mut self, key: SeriesKey, style: LineStyle) -> Self {
        self.styles.insert(key, style);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_styles_follow_palette() {
        let styles = StyleConfig::default();
        assert_eq!(styles.get(SeriesKey::ClosingPrice).color, CLR_PRICE);
        assert_eq!(styles.get(SeriesKey::Line200).stroke, Stroke::DashDot);
        assert_eq!(styles.get(SeriesKey::Support).alpha, 0.6);
    }

    #[test]
    fn widths_are_at_least_one_pixel() {
        assert_eq!(LineStyle::new(Stroke::Solid, 0.1, CLR_LIN).pixel_width(), 1);
        assert_eq!(LineStyle::new(Stroke::Solid, 2.2, CLR_LIN).pixel_width(), 5);
    }

    #[test]
    fn overrides_replace_single_series() {
        let styles = StyleConfig::default()
            .with_style(SeriesKey::Mean20, LineStyle::new(Stroke::Solid, 3.0, CLR_STDN));
        assert_eq!(styles.get(SeriesKey::Mean20).color, CLR_STDN);
        assert_eq!(styles.get(SeriesKey::Line6).color, CLR_LIN);
    }
}
