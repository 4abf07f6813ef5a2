pub mod cli;
pub mod errors;
pub mod loader;
pub mod settings;

use std::path::PathBuf;

use errors::FrontendError;
use feetcad_config::AppConfig;
use tracing::info;

/// 启动 CLI 演示或返回错误。
pub fn run_cli_demo(config: &AppConfig, scheme: Option<PathBuf>) -> Result<(), FrontendError> {
    info!("启动 CLI 演示前端");
    cli::run_demo(config, scheme)
}
