use std::path::PathBuf;

/// 输入文件与输出目录的来源 (原生对话框或固定路径)
pub trait PathProvider {
    /// Name used in log messages
    fn provider_name(&self) -> &'static str;

    /// 选择源 CSV 文件，None 表示用户取消
    fn source_file(&self) -> Option<PathBuf>;

    /// 选择输出目录，None 表示使用默认目录
    fn output_dir(&self) -> Option<PathBuf>;
}
