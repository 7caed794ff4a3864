use crate::config::Config;
use crate::data_provider::{ChartTable, EntityGroup};
use crate::errors::Result;
use crate::models::style::StyleConfig;
use crate::paths::base::PathProvider;
use crate::services::{chart_service, series_service};
use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

/// 一次运行的结果
#[derive(Debug, Default)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub written: Vec<PathBuf>,
    /// 没有有效日期而跳过的WKN
    pub skipped: Vec<String>,
    /// (WKN, 错误信息)
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// 用户未选择文件
    Aborted,
    Completed(RunSummary),
}

/// 运行服务：选择路径、加载数据、逐个WKN渲染图表
pub struct RunService {
    config: Config,
    styles: StyleConfig,
    paths: Box<dyn PathProvider>,
}

impl RunService {
    /// 创建新的运行服务实例
    pub fn new(config: Config, styles: StyleConfig, paths: Box<dyn PathProvider>) -> Self {
        Self { config, styles, paths }
    }

    pub fn run(&self) -> Result<RunOutcome> {
        self.run_at(Local::now().naive_local())
    }

    /// 以给定的时间戳运行 (决定默认目录名和文件名)
    pub fn run_at(&self, now: NaiveDateTime) -> Result<RunOutcome> {
        let source = match self.paths.source_file() {
            Some(path) => path,
            None => {
                info!("No file selected ({}), exiting", self.paths.provider_name());
                return Ok(RunOutcome::Aborted);
            }
        };

        // 日期列缺失在这里直接返回错误，不会创建输出目录
        let table = ChartTable::load_from_file(&source, &self.config)?;

        let output_dir = self.resolve_output_dir(now.date())?;
        info!("Writing charts to {}", output_dir.display());

        let summary = self.render_all(&table, &output_dir, now)?;
        info!(
            "Charts saved in {}: {} written, {} skipped, {} failed",
            summary.output_dir.display(),
            summary.written.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        Ok(RunOutcome::Completed(summary))
    }

    /// 用户选择的目录，或在 output_root 下创建 `charts_<日期>`
    pub fn resolve_output_dir(&self, today: NaiveDate) -> Result<PathBuf> {
        let dir = match self.paths.output_dir() {
            Some(dir) => dir,
            None => self
                .config
                .output_root
                .join(format!("charts_{}", today.format("%Y-%m-%d"))),
        };
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// 渲染所有WKN；单个WKN失败时记录错误并继续
    pub fn render_all(&self, table: &ChartTable, output_dir: &Path, now: NaiveDateTime) -> Result<RunSummary> {
        let mut summary = RunSummary {
            output_dir: output_dir.to_path_buf(),
            ..Default::default()
        };

        for group in table.groups() {
            let group = group?;
            match self.render_group(&group, output_dir, now) {
                Ok(Some(path)) => {
                    info!("  - WKN {}: {}", group.entity, path.display());
                    summary.written.push(path);
                }
                Ok(None) => {
                    warn!("WKN {} has no valid dates, skipped", group.entity);
                    summary.skipped.push(group.entity.clone());
                }
                Err(e) => {
                    error!("Failed to render WKN {}: {}", group.entity, e);
                    summary.failed.push((group.entity.clone(), e.to_string()));
                }
            }
        }

        Ok(summary)
    }

    /// 渲染单个WKN，返回写入的文件路径
    pub fn render_group(&self, group: &EntityGroup, output_dir: &Path, now: NaiveDateTime) -> Result<Option<PathBuf>> {
        let chart = series_service::prepare_chart(group, &self.config)?;
        if chart.date_range.is_none() {
            return Ok(None);
        }

        let path = output_dir.join(chart_service::chart_file_name(&chart.entity, chart.last_date(), now));
        chart_service::render_to_file(&chart, &self.styles, &self.config, &path)?;
        Ok(Some(path))
    }
}
