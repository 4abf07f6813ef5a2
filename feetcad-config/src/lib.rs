use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "FEETCAD_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub grid: GridConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `FEETCAD_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 前端配置：默认方案文件与视口尺寸（像素）。
#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    #[serde(default)]
    pub scheme_path: Option<PathBuf>,
    #[serde(default = "FrontendConfig::default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "FrontendConfig::default_viewport_height")]
    pub viewport_height: f64,
}

impl FrontendConfig {
    fn default_viewport_width() -> f64 {
        720.0
    }

    fn default_viewport_height() -> f64 {
        480.0
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            scheme_path: None,
            viewport_width: Self::default_viewport_width(),
            viewport_height: Self::default_viewport_height(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub magnifier: f64,
    /// 世界单位。
    pub fit_margin: f64,
    /// 方案单位，使用时乘以 `magnifier`。
    pub hit_tolerance: f64,
    pub zoom_step: f64,
    pub double_click_ms: u64,
    pub dimmed_opacity: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            magnifier: 1.0,
            fit_margin: 10.0,
            hit_tolerance: 0.5,
            zoom_step: 5.0,
            double_click_ms: 250,
            dimmed_opacity: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub visible: bool,
    pub step: f64,
    pub steps: usize,
    /// 像素。
    pub min_cell_width: f64,
    pub zoom_step: u32,
    pub line_width: f64,
    pub zero_color: [u8; 4],
    pub primary_color: [u8; 4],
    pub middle_color: [u8; 4],
    pub secondary_color: [u8; 4],
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            visible: true,
            step: 1.0,
            steps: 40,
            min_cell_width: 20.0,
            zoom_step: 10,
            line_width: 2.0,
            zero_color: [255, 255, 255, 150],
            primary_color: [255, 255, 255, 100],
            middle_color: [255, 255, 255, 50],
            secondary_color: [255, 255, 255, 25],
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_cover_every_section() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.frontend.scheme_path.is_none());
        assert_eq!(cfg.frontend.viewport_width, 720.0);
        assert_eq!(cfg.frontend.viewport_height, 480.0);
        assert_eq!(cfg.viewer.zoom_step, 5.0);
        assert_eq!(cfg.viewer.double_click_ms, 250);
        assert!(cfg.grid.visible);
        assert_eq!(cfg.grid.steps, 40);
        assert_eq!(cfg.grid.zoom_step, 10);
        assert_eq!(cfg.grid.secondary_color, [255, 255, 255, 25]);
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [frontend]
            scheme_path = "schemes/test.jschem"
            viewport_width = 1024

            [viewer]
            magnifier = 10.0
            hit_tolerance = 1.5

            [grid]
            visible = false
            zoom_step = 5
            primary_color = [0, 128, 255, 90]
            "#
        )
        .expect("write config");

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(
            cfg.frontend
                .scheme_path
                .as_deref()
                .map(|p| p.to_string_lossy().to_string()),
            Some("schemes/test.jschem".to_string())
        );
        assert_eq!(cfg.frontend.viewport_width, 1024.0);
        assert_eq!(cfg.frontend.viewport_height, 480.0);
        assert_eq!(cfg.viewer.magnifier, 10.0);
        assert_eq!(cfg.viewer.hit_tolerance, 1.5);
        // 未写出的字段保留默认值
        assert_eq!(cfg.viewer.fit_margin, 10.0);
        assert!(!cfg.grid.visible);
        assert_eq!(cfg.grid.zoom_step, 5);
        assert_eq!(cfg.grid.primary_color, [0, 128, 255, 90]);
        assert_eq!(cfg.grid.zero_color, [255, 255, 255, 150]);
    }

    #[test]
    fn invalid_values_are_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[grid]\nzero_color = [255, 255, 300, 1]").expect("write config");
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = AppConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
