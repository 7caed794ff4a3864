// 公开导出的模块，供外部使用
pub mod config;
pub mod data_provider;
pub mod errors;
pub mod models;
pub mod paths;
pub mod services;

#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use config::{Config, SupportStyle, VolumeMode};
pub use data_provider::{ChartTable, EntityGroup};
pub use errors::{ChartError, Result};
pub use models::style::StyleConfig;
pub use paths::base::PathProvider;
pub use paths::fixed::FixedPathProvider;
pub use services::run_service::{RunOutcome, RunService, RunSummary};
