use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use feetcad_config::AppConfig;
use feetcad_core::color::Rgba;
use feetcad_core::geometry::Point2;
use feetcad_core::scheme::{LabelShape, Scheme};
use feetcad_io::{JsonSchemeFacade, SchemeLoader};
use tracing::{info, warn};

use crate::errors::FrontendError;

pub const SCHEME_ENV: &str = "FEETCAD_SCHEME";

/// 方案来源，便于前端呈现加载信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemeSource {
    File(PathBuf),
    Demo,
}

/// 统一封装加载后的方案与来源。
#[derive(Debug)]
pub struct LoadedScheme {
    pub scheme: Scheme,
    pub source: SchemeSource,
}

/// 方案路径：环境变量 `FEETCAD_SCHEME` 优先，其次是配置中的 `scheme_path`。
pub fn scheme_path(env_value: Option<OsString>, config: &AppConfig) -> Option<PathBuf> {
    env_value
        .map(PathBuf::from)
        .or_else(|| config.frontend.scheme_path.clone())
}

pub fn load_scheme_file(path: &Path) -> Result<Scheme, FrontendError> {
    let scheme = JsonSchemeFacade::new().load(path)?;
    Ok(scheme)
}

/// 按环境变量与配置加载方案，失败时回退到内置示例。
pub fn load_scheme_from_config_or_demo(config: &AppConfig) -> LoadedScheme {
    load_scheme_or_demo(scheme_path(env::var_os(SCHEME_ENV), config))
}

pub fn load_scheme_or_demo(path: Option<PathBuf>) -> LoadedScheme {
    if let Some(path) = path {
        match load_scheme_file(&path) {
            Ok(scheme) => {
                info!(path = %path.display(), components = scheme.len(), "从文件加载方案成功");
                return LoadedScheme {
                    scheme,
                    source: SchemeSource::File(path),
                };
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载方案失败，回退到内置示例");
            }
        }
    }

    LoadedScheme {
        scheme: demo_scheme(),
        source: SchemeSource::Demo,
    }
}

fn label(field: &str, text: &str, anchor: Point2) -> LabelShape {
    LabelShape {
        anchor,
        font: "Arial".to_string(),
        size: 3.0,
        text: Some(text.to_string()),
        field: field.to_string(),
    }
}

/// 内置示例：两个电阻夹着一个芯片，视图中心正好落在芯片上。
pub fn demo_scheme() -> Scheme {
    const BODY: Rgba = Rgba::new(255, 255, 255, 255);
    const LEAD: Rgba = Rgba::new(120, 200, 255, 255);

    let mut scheme = Scheme::new();

    let r1 = scheme.add_component("R1", Point2::new(0.0, 18.0));
    if let Some(component) = scheme.component_mut(r1) {
        component.add_rectangle(Point2::new(0.0, 0.0), Point2::new(10.0, 4.0), 1.0, BODY);
        component.add_line(Point2::new(10.0, 2.0), Point2::new(20.0, 2.0), 1.0, LEAD);
        component.labels.push(label("value", "10k", Point2::new(2.0, 5.0)));
    }

    let u1 = scheme.add_component("U1", Point2::new(20.0, 10.0));
    if let Some(component) = scheme.component_mut(u1) {
        component.add_rectangle(Point2::new(0.0, 0.0), Point2::new(20.0, 20.0), 2.0, BODY);
        component.add_line(Point2::new(4.0, 4.0), Point2::new(16.0, 16.0), 1.0, LEAD);
        component.labels.push(label("ref", "U1", Point2::new(8.0, 10.0)));
    }

    let r2 = scheme.add_component("R2", Point2::new(50.0, 18.0));
    if let Some(component) = scheme.component_mut(r2) {
        component.add_rectangle(Point2::new(0.0, 0.0), Point2::new(10.0, 4.0), 1.0, BODY);
        component.add_line(Point2::new(-10.0, 2.0), Point2::new(0.0, 2.0), 1.0, LEAD);
        component.labels.push(label("value", "4k7", Point2::new(2.0, 5.0)));
    }

    scheme
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_value_takes_precedence_over_config() {
        let mut config = AppConfig::default();
        assert_eq!(scheme_path(None, &config), None);

        config.frontend.scheme_path = Some(PathBuf::from("from_config.jschem"));
        assert_eq!(
            scheme_path(None, &config),
            Some(PathBuf::from("from_config.jschem"))
        );
        assert_eq!(
            scheme_path(Some(OsString::from("from_env.jschem")), &config),
            Some(PathBuf::from("from_env.jschem"))
        );
    }

    #[test]
    fn missing_file_falls_back_to_demo() {
        let dir = std::env::temp_dir().join("feetcad-missing-scheme.jschem");
        let loaded = load_scheme_or_demo(Some(dir));
        assert_eq!(loaded.source, SchemeSource::Demo);
        assert_eq!(loaded.scheme.len(), 3);

        let loaded = load_scheme_or_demo(None);
        assert_eq!(loaded.source, SchemeSource::Demo);
    }

    #[test]
    fn demo_scheme_has_unique_ids_and_labels() {
        let scheme = demo_scheme();
        assert!(scheme.has_unique_ids());
        let names: Vec<&str> = scheme.components().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["R1", "U1", "R2"]);
        assert_eq!(scheme.shape_count(), 9);
    }
}
