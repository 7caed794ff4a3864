use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    ArrowError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Required column '{0}' not found")]
    MissingColumn(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, ChartError>;

impl From<arrow_schema::ArrowError> for ChartError {
    fn from(e: arrow_schema::ArrowError) -> Self {
        ChartError::ArrowError(e.to_string())
    }
}

// 用于从字符串创建错误
impl From<String> for ChartError {
    fn from(s: String) -> Self {
        ChartError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for ChartError {
    fn from(s: &str) -> Self {
        ChartError::Unknown(s.to_string())
    }
}
