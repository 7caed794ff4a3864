use chrono::{Duration, NaiveDate};

// 日期转换工具
// NaiveDate::default() 即 1970-01-01
fn epoch() -> NaiveDate {
    NaiveDate::default()
}

/// NaiveDate -> Arrow Date32 (距 1970-01-01 的天数)
pub fn date_to_days(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

/// Arrow Date32 -> NaiveDate
pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    epoch().checked_add_signed(Duration::days(days as i64))
}

/// 小数逗号 -> 浮点数，无法转换时返回 None
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    match normalized.parse::<f64>() {
        Ok(v) if !v.is_nan() => Some(v),
        _ => None,
    }
}

/// 两位年份: 69-99 -> 19xx, 00-68 -> 20xx
pub fn expand_two_digit_year(yy: i32) -> i32 {
    if yy >= 69 {
        1900 + yy
    } else {
        2000 + yy
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// 严格解析 `dd.mm.yyyy` (year_digits = 4) 或 `dd.mm.yy` (year_digits = 2)
pub fn parse_strict_date(raw: &str, year_digits: usize) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let (d, m, y) = (parts[0], parts[1], parts[2]);
    if !all_digits(d) || !all_digits(m) || !all_digits(y) {
        return None;
    }
    if d.len() > 2 || m.len() > 2 || y.len() != year_digits {
        return None;
    }

    let day = d.parse::<u32>().ok()?;
    let month = m.parse::<u32>().ok()?;
    let mut year = y.parse::<i32>().ok()?;
    if year_digits == 2 {
        year = expand_two_digit_year(year);
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// 宽松解析，日在前。支持 `.` `/` `-` 分隔、ISO 日期、英文月份名以及带时间的值。
pub fn parse_lenient_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // 去掉时间部分
    let date_part = s
        .split(|c| c == ' ' || c == 'T')
        .next()
        .filter(|p| p.len() < s.len() && s[p.len() + 1..].contains(':'))
        .unwrap_or(s);

    let parts: Vec<&str> = date_part
        .split(|c| c == '.' || c == '/' || c == '-')
        .collect();
    if parts.len() == 3 && parts.iter().all(|p| all_digits(p)) {
        let nums: Vec<i32> = parts.iter().filter_map(|p| p.parse().ok()).collect();
        if nums.len() != 3 {
            return None;
        }
        // ISO: yyyy-mm-dd
        if parts[0].len() == 4 {
            return NaiveDate::from_ymd_opt(nums[0], nums[1] as u32, nums[2] as u32);
        }
        let year = match parts[2].len() {
            1 | 2 => expand_two_digit_year(nums[2]),
            4 => nums[2],
            _ => return None,
        };
        return NaiveDate::from_ymd_opt(year, nums[1] as u32, nums[0] as u32)
            // 日在前失败时再尝试月在前
            .or_else(|| NaiveDate::from_ymd_opt(year, nums[0] as u32, nums[1] as u32));
    }

    // 紧凑格式 ddmmyyyy
    if all_digits(s) && s.len() == 8 {
        return NaiveDate::parse_from_str(s, "%d%m%Y").ok();
    }

    for fmt in ["%d %b %Y", "%d-%b-%Y", "%d %B %Y", "%d. %B %Y", "%b %d %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    None
}

/// 日期列最终采用的解析方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    FourDigitYear,
    TwoDigitYear,
    Lenient,
}

/// 解析整列日期：先整列尝试 `dd.mm.yyyy`，再 `dd.mm.yy`，都失败时逐个宽松解析
pub fn parse_date_column(values: &[&str]) -> (Vec<Option<NaiveDate>>, DateFormat) {
    for (digits, format) in [(4, DateFormat::FourDigitYear), (2, DateFormat::TwoDigitYear)] {
        let parsed: Option<Vec<NaiveDate>> =
            values.iter().map(|v| parse_strict_date(v, digits)).collect();
        if let Some(dates) = parsed {
            return (dates.into_iter().map(Some).collect(), format);
        }
    }

    let dates = values.iter().map(|v| parse_lenient_date(v)).collect();
    (dates, DateFormat::Lenient)
}

/// 文件名中不允许出现的字符替换为 `_`
pub fn sanitize_file_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

// Arrow数据转换工具
pub mod arrow_utils {
    use super::*;
    use crate::errors::{ChartError, Result};
    use arrow::array::{Array, ArrayRef};
    use arrow::record_batch::RecordBatch;
    use arrow_array::{Date32Array, Float64Array, StringArray};
    use std::sync::Arc;

    pub fn float_column(values: Vec<Option<f64>>) -> ArrayRef {
        Arc::new(Float64Array::from(values))
    }

    pub fn date_column(values: &[Option<NaiveDate>]) -> ArrayRef {
        let days: Vec<Option<i32>> = values.iter().map(|d| d.map(date_to_days)).collect();
        Arc::new(Date32Array::from(days))
    }

    /// 空字符串记为 null
    pub fn string_column(values: Vec<String>) -> ArrayRef {
        let values: Vec<Option<String>> = values
            .into_iter()
            .map(|v| if v.trim().is_empty() { None } else { Some(v) })
            .collect();
        Arc::new(StringArray::from(values))
    }

    /// 可选的数值列；不存在时返回 None
    pub fn optional_f64<'a>(batch: &'a RecordBatch, name: &str) -> Result<Option<&'a Float64Array>> {
        match batch.column_by_name(name) {
            None => Ok(None),
            Some(column) => column
                .as_any()
                .downcast_ref::<Float64Array>()
                .map(Some)
                .ok_or_else(|| ChartError::ArrowError(format!("Failed to downcast {} column", name))),
        }
    }

    pub fn required_dates<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Date32Array> {
        batch
            .column_by_name(name)
            .ok_or_else(|| ChartError::MissingColumn(name.to_string()))?
            .as_any()
            .downcast_ref::<Date32Array>()
            .ok_or_else(|| ChartError::ArrowError(format!("Failed to downcast {} column", name)))
    }

    pub fn required_strings<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
        batch
            .column_by_name(name)
            .ok_or_else(|| ChartError::MissingColumn(name.to_string()))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| ChartError::ArrowError(format!("Failed to downcast {} column", name)))
    }

    /// 读取第 i 行的日期，null 返回 None
    pub fn date_at(dates: &Date32Array, i: usize) -> Option<NaiveDate> {
        if dates.is_null(i) {
            None
        } else {
            days_to_date(dates.value(i))
        }
    }

    /// 读取第 i 行的数值，null 返回 None
    pub fn value_at(values: &Float64Array, i: usize) -> Option<f64> {
        if values.is_null(i) {
            None
        } else {
            Some(values.value(i))
        }
    }
}
