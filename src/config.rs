use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::ChartError;

/// 需要把小数逗号转换为浮点数的列
pub const DECIMAL_COLUMNS: &[&str] = &[
    "Schlusskurs",
    "Mean_20",
    "Variance_20",
    "Bollinger_upper",
    "Bollinger_lower",
    "Linie_6",
    "Linie_8",
    "Linie_50",
    "Linie_100",
    "Linie_200",
    "Unterstuetzungspunkte",
    "Supertrend_up",
    "Supertrend_down",
    "Linie_Volumen_gruen",
    "Linie_Volumen_rot",
    "Volumen",
];

/// 成交量柱的着色方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeMode {
    /// 有 `Volumen` 列时按涨跌着色，否则使用预先拆分好的绿/红列
    Auto,
    /// 使用 `Linie_Volumen_gruen` / `Linie_Volumen_rot` 堆叠
    PreSplit,
    /// 使用 `Volumen`，按收盘价相对前一行的涨跌着色
    PriceDirection,
}

impl FromStr for VolumeMode {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(VolumeMode::Auto),
            "split" | "presplit" => Ok(VolumeMode::PreSplit),
            "direction" => Ok(VolumeMode::PriceDirection),
            _ => Err(ChartError::DataError(format!(
                "Unknown volume mode: '{}'. Supported: auto, split, direction",
                s
            ))),
        }
    }
}

/// 支撑点的画法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStyle {
    /// 在有支撑值的日期处画竖线
    Vertical,
    /// 在每个支撑价位画横线
    Horizontal,
}

impl FromStr for SupportStyle {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vertical" => Ok(SupportStyle::Vertical),
            "horizontal" => Ok(SupportStyle::Horizontal),
            _ => Err(ChartError::DataError(format!(
                "Unknown support style: '{}'. Supported: vertical, horizontal",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub separator: u8,
    pub date_column: String,
    pub id_column: String,
    pub decimal_columns: Vec<String>,
    /// 未选择输出目录时，默认目录 `charts_<日期>` 创建在这里
    pub output_root: PathBuf,
    pub volume_mode: VolumeMode,
    pub support_style: SupportStyle,
    pub width: u32,
    pub height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            separator: b';',
            date_column: "WP_Bollinger_Baender.Datum".to_string(),
            id_column: "WKN".to_string(),
            decimal_columns: DECIMAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
            output_root: PathBuf::from("."),
            volume_mode: VolumeMode::Auto,
            support_style: SupportStyle::Vertical,
            // 13 x 8 英寸, 150 dpi
            width: 1950,
            height: 1200,
        }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_date_column(mut self, column: &str) -> Self {
        self.date_column = column.to_string();
        self
    }

    pub fn with_id_column(mut self, column: &str) -> Self {
        self.id_column = column.to_string();
        self
    }

    /// 额外的数值列 (逗号小数)
    pub fn with_decimal_columns(mut self, columns: &[&str]) -> Self {
        for column in columns {
            if !self.is_decimal_column(column) {
                self.decimal_columns.push(column.to_string());
            }
        }
        self
    }

    pub fn with_output_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn with_volume_mode(mut self, mode: VolumeMode) -> Self {
        self.volume_mode = mode;
        self
    }

    pub fn with_support_style(mut self, style: SupportStyle) -> Self {
        self.support_style = style;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn is_decimal_column(&self, name: &str) -> bool {
        self.decimal_columns.iter().any(|c| c == name)
    }
}
