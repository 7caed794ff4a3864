use crate::paths::base::PathProvider;
use std::path::PathBuf;

/// 命令行或测试中直接给定的路径
#[derive(Debug, Clone, Default)]
pub struct FixedPathProvider {
    source: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl FixedPathProvider {
    pub fn new<P: Into<PathBuf>>(source: P) -> Self {
        Self {
            source: Some(source.into()),
            output: None,
        }
    }

    /// 模拟用户取消文件选择
    pub fn cancelled() -> Self {
        Self::default()
    }

    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output = Some(dir.into());
        self
    }
}

impl PathProvider for FixedPathProvider {
    fn provider_name(&self) -> &'static str {
        "fixed"
    }

    fn source_file(&self) -> Option<PathBuf> {
        self.source.clone()
    }

    fn output_dir(&self) -> Option<PathBuf> {
        self.output.clone()
    }
}
