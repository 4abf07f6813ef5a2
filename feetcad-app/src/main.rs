use std::path::PathBuf;

use clap::Parser;
use feetcad_config::{AppConfig, ConfigError};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// FEETCAD 原理图查看器（命令行演示）。
#[derive(Debug, Parser)]
#[command(name = "feetcad", version, about)]
struct Args {
    /// 配置文件路径，缺省时按 `FEETCAD_CONFIG` 或 `./config/default.toml` 查找
    #[arg(long)]
    config: Option<PathBuf>,
    /// 方案文件（.jschem），优先于环境变量与配置
    #[arg(long)]
    scheme: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let config = load_configuration(args.config);
    init_logging(&config);
    info!("启动 FEETCAD Rust 应用");

    if let Err(err) = feetcad_frontend::run_cli_demo(&config, args.scheme) {
        error!(error = %err, "执行 CLI 演示失败");
        std::process::exit(1);
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
