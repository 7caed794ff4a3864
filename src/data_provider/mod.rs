use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::compute::take_record_batch;
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, Schema};
use log::{debug, info, warn};

use crate::config::Config;
use crate::errors::{ChartError, Result};
use crate::util::{self, arrow_utils, DateFormat};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// 单个WKN的数据视图，按日期升序 (缺失日期排在最后)
#[derive(Debug, Clone)]
pub struct EntityGroup {
    pub entity: String,
    pub batch: RecordBatch,
}

impl EntityGroup {
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}

/// 规范化后的数据表：日期列为 Date32，数值列为 Float64，其余为 Utf8
pub struct ChartTable {
    batch: RecordBatch,
    date_column: String,
    id_column: String,
    date_format: DateFormat,
    // 索引用于按WKN分组
    entity_index: BTreeMap<String, Vec<u32>>,
}

impl ChartTable {
    /// 从CSV文件加载
    pub fn load_from_file(path: &Path, config: &Config) -> Result<Self> {
        info!("Loading table from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(file, config)
    }

    /// 从任意输入流加载，字段分隔符取自配置
    pub fn from_reader<R: Read>(reader: R, config: &Config) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(config.separator)
            .flexible(true)
            .from_reader(reader);

        // 非UTF-8内容按有损方式转换，不中断
        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();

        if !headers.iter().any(|h| h == &config.date_column) {
            return Err(ChartError::MissingColumn(config.date_column.clone()));
        }
        if !headers.iter().any(|h| h == &config.id_column) {
            return Err(ChartError::MissingColumn(config.id_column.clone()));
        }

        let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.byte_records() {
            let record = record?;
            for (i, column) in raw_columns.iter_mut().enumerate() {
                let cell = record.get(i).map(String::from_utf8_lossy).unwrap_or_default();
                column.push(cell.into_owned());
            }
        }
        let num_rows = raw_columns.first().map(|c| c.len()).unwrap_or(0);
        info!("Read {} rows with {} columns", num_rows, headers.len());

        let mut fields = Vec::with_capacity(headers.len());
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(headers.len());
        let mut date_format = DateFormat::FourDigitYear;

        for (name, raw) in headers.iter().zip(raw_columns) {
            if name == &config.date_column {
                let cells: Vec<&str> = raw.iter().map(|s| s.as_str()).collect();
                let (dates, format) = util::parse_date_column(&cells);
                let missing = dates.iter().filter(|d| d.is_none()).count();
                if missing > 0 {
                    warn!("{} of {} values in '{}' could not be parsed as dates", missing, num_rows, name);
                }
                info!("Date column '{}' parsed as {:?}", name, format);
                date_format = format;
                fields.push(Field::new(name.as_str(), DataType::Date32, true));
                columns.push(arrow_utils::date_column(&dates));
            } else if config.is_decimal_column(name) {
                let values: Vec<Option<f64>> = raw.iter().map(|s| util::parse_decimal(s)).collect();
                debug!(
                    "Column '{}': {} missing values",
                    name,
                    values.iter().filter(|v| v.is_none()).count()
                );
                fields.push(Field::new(name.as_str(), DataType::Float64, true));
                columns.push(arrow_utils::float_column(values));
            } else {
                fields.push(Field::new(name.as_str(), DataType::Utf8, true));
                columns.push(arrow_utils::string_column(raw));
            }
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;

        let mut table = Self {
            batch,
            date_column: config.date_column.clone(),
            id_column: config.id_column.clone(),
            date_format,
            entity_index: BTreeMap::new(),
        };
        table.rebuild_indices()?;

        Ok(table)
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn date_format(&self) -> DateFormat {
        self.date_format
    }

    /// 所有WKN，升序
    pub fn entities(&self) -> Vec<&str> {
        self.entity_index.keys().map(|k| k.as_str()).collect()
    }

    /// 取出单个WKN的数据并按日期排序
    pub fn group(&self, entity: &str) -> Result<Option<EntityGroup>> {
        let indices = match self.entity_index.get(entity) {
            Some(indices) => indices,
            None => return Ok(None),
        };

        let dates = arrow_utils::required_dates(&self.batch, &self.date_column)?;
        let mut sorted = indices.clone();
        // 稳定排序，缺失日期排在最后
        sorted.sort_by_key(|&i| {
            let i = i as usize;
            (dates.is_null(i), if dates.is_null(i) { 0 } else { dates.value(i) })
        });

        let batch = take_record_batch(&self.batch, &UInt32Array::from(sorted))?;
        Ok(Some(EntityGroup {
            entity: entity.to_string(),
            batch,
        }))
    }

    /// 按WKN升序逐个产生分组
    pub fn groups(&self) -> impl Iterator<Item = Result<EntityGroup>> + '_ {
        self.entity_index.keys().filter_map(move |entity| self.group(entity).transpose())
    }

    /// 重建索引
    fn rebuild_indices(&mut self) -> Result<()> {
        self.entity_index.clear();
        let ids = arrow_utils::required_strings(&self.batch, &self.id_column)?;

        let mut dropped = 0;
        for i in 0..ids.len() {
            if ids.is_null(i) {
                dropped += 1;
                continue;
            }
            self.entity_index
                .entry(ids.value(i).trim().to_string())
                .or_insert_with(Vec::new)
                .push(i as u32);
        }

        if dropped > 0 {
            warn!("Dropped {} rows without '{}'", dropped, self.id_column);
        }
        info!("Found {} distinct {} values", self.entity_index.len(), self.id_column);
        Ok(())
    }
}
