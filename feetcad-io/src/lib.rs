use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use feetcad_core::{
    color::Rgba,
    geometry::Point2,
    scheme::{Component, ComponentId, LabelShape, LineShape, RectangleShape, Scheme, ShapeSpec},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 方案文件本身的结构错误。载入因此失败，不做部分恢复。
#[derive(Debug, Error)]
pub enum SchemeParseError {
    #[error("invalid scheme json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate component id {0}")]
    DuplicateComponentId(u64),
    #[error("component {component}: invalid {field} {value}")]
    InvalidValue {
        component: u64,
        field: &'static str,
        value: f64,
    },
}

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scheme {path:?}: {source}")]
    SchemeParse {
        path: PathBuf,
        #[source]
        source: SchemeParseError,
    },
}

pub trait SchemeLoader {
    fn load(&self, path: &Path) -> Result<Scheme, IoError>;
}

pub trait SchemeSaver {
    fn save(&self, scheme: &Scheme, path: &Path) -> Result<(), IoError>;
}

/// `.jschem` 文件的读写入口。
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSchemeFacade;

impl JsonSchemeFacade {
    pub fn new() -> Self {
        Self
    }
}

impl SchemeLoader for JsonSchemeFacade {
    fn load(&self, path: &Path) -> Result<Scheme, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        parse_scheme(&data).map_err(|source| IoError::SchemeParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl SchemeSaver for JsonSchemeFacade {
    fn save(&self, scheme: &Scheme, path: &Path) -> Result<(), IoError> {
        let data = write_scheme(scheme).map_err(|err| IoError::WriteError {
            path: path.to_path_buf(),
            source: err.into(),
        })?;
        fs::write(path, data).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// 解析方案 JSON。缺省的 `components` / `shapes` / `labels` 视为空序列，
/// 缺省的 ID 在保留所有显式 ID 之后按文档顺序取最小未用值。
pub fn parse_scheme(data: &str) -> Result<Scheme, SchemeParseError> {
    let raw: RawScheme = serde_json::from_str(data)?;

    let mut reserved = HashSet::with_capacity(raw.components.len());
    for component in &raw.components {
        if let Some(id) = component.id {
            if !reserved.insert(id) {
                return Err(SchemeParseError::DuplicateComponentId(id));
            }
        }
    }

    let mut scheme = Scheme::new();
    let mut next_free = 0_u64;
    for component in raw.components {
        let id = match component.id {
            Some(id) => id,
            None => {
                while reserved.contains(&next_free) {
                    next_free += 1;
                }
                reserved.insert(next_free);
                next_free
            }
        };
        let component = component.into_component(ComponentId::new(id))?;
        if scheme.insert_component(component).is_none() {
            return Err(SchemeParseError::DuplicateComponentId(id));
        }
    }
    Ok(scheme)
}

/// 序列化为带缩进的 JSON，ID 全部显式写出，再次载入得到相同的方案。
pub fn write_scheme(scheme: &Scheme) -> Result<String, serde_json::Error> {
    let raw = RawScheme {
        components: scheme.components().map(RawComponent::from_component).collect(),
    };
    serde_json::to_string_pretty(&raw)
}

#[derive(Debug, Serialize, Deserialize)]
struct RawScheme {
    #[serde(default)]
    components: Vec<RawComponent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    #[serde(default)]
    name: String,
    x: f64,
    y: f64,
    #[serde(default)]
    shapes: Vec<RawShape>,
    #[serde(default)]
    labels: Vec<RawLabel>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawShape {
    Line(RawSegment),
    Rectangle(RawSegment),
}

#[derive(Debug, Serialize, Deserialize)]
struct RawSegment {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    width: f64,
    color: [u8; 4],
}

#[derive(Debug, Serialize, Deserialize)]
struct RawLabel {
    field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    x: f64,
    y: f64,
    #[serde(default = "RawLabel::default_font")]
    font: String,
    #[serde(default = "RawLabel::default_size")]
    size: f64,
}

impl RawLabel {
    fn default_font() -> String {
        "Arial".to_string()
    }

    fn default_size() -> f64 {
        10.0
    }
}

fn check_width(component: ComponentId, width: f64) -> Result<f64, SchemeParseError> {
    if width.is_finite() && width >= 0.0 {
        Ok(width)
    } else {
        Err(SchemeParseError::InvalidValue {
            component: component.get(),
            field: "width",
            value: width,
        })
    }
}

impl RawComponent {
    fn into_component(self, id: ComponentId) -> Result<Component, SchemeParseError> {
        let mut component = Component::new(id, self.name, Point2::new(self.x, self.y));
        for shape in self.shapes {
            let spec = match shape {
                RawShape::Line(segment) => ShapeSpec::Line(LineShape {
                    start: Point2::new(segment.x1, segment.y1),
                    end: Point2::new(segment.x2, segment.y2),
                    width: check_width(id, segment.width)?,
                    color: Rgba::from(segment.color),
                }),
                RawShape::Rectangle(segment) => ShapeSpec::Rectangle(RectangleShape {
                    first: Point2::new(segment.x1, segment.y1),
                    second: Point2::new(segment.x2, segment.y2),
                    width: check_width(id, segment.width)?,
                    color: Rgba::from(segment.color),
                }),
            };
            component.shapes.push(spec);
        }
        for label in self.labels {
            if !(label.size.is_finite() && label.size > 0.0) {
                return Err(SchemeParseError::InvalidValue {
                    component: id.get(),
                    field: "size",
                    value: label.size,
                });
            }
            component.labels.push(LabelShape {
                anchor: Point2::new(label.x, label.y),
                font: label.font,
                size: label.size,
                text: label.text,
                field: label.field,
            });
        }
        Ok(component)
    }

    fn from_component(component: &Component) -> Self {
        let segment = |a: Point2, b: Point2, width: f64, color: Rgba| RawSegment {
            x1: a.x(),
            y1: a.y(),
            x2: b.x(),
            y2: b.y(),
            width,
            color: color.0,
        };
        let label = |label: &LabelShape| RawLabel {
            field: label.field.clone(),
            text: label.text.clone(),
            x: label.anchor.x(),
            y: label.anchor.y(),
            font: label.font.clone(),
            size: label.size,
        };

        let mut shapes = Vec::with_capacity(component.shapes.len());
        let mut labels: Vec<RawLabel> = Vec::with_capacity(component.labels.len());
        for shape in &component.shapes {
            match shape {
                ShapeSpec::Line(line) => shapes.push(RawShape::Line(segment(
                    line.start, line.end, line.width, line.color,
                ))),
                ShapeSpec::Rectangle(rect) => shapes.push(RawShape::Rectangle(segment(
                    rect.first,
                    rect.second,
                    rect.width,
                    rect.color,
                ))),
                // 文件格式里标签只放在 `labels` 中
                ShapeSpec::Label(inline) => labels.push(label(inline)),
            }
        }
        labels.extend(component.labels.iter().map(label));

        Self {
            id: Some(component.id.get()),
            name: component.name.clone(),
            x: component.origin.x(),
            y: component.origin.y(),
            shapes,
            labels,
        }
    }
}
