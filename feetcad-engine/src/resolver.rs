use std::collections::HashMap;

use feetcad_core::color::Rgba;
use feetcad_core::geometry::{BoundingBox, Point2};
use feetcad_core::scheme::{Component, ComponentId, LabelShape, Scheme, ShapeSpec};
use tracing::debug;

/// 世界坐标下的图形几何。
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedGeometry {
    Line {
        start: Point2,
        end: Point2,
        width: f64,
        color: Rgba,
    },
    Rectangle {
        first: Point2,
        second: Point2,
        width: f64,
        color: Rgba,
    },
    Label {
        anchor: Point2,
        font: String,
        size: f64,
        text: String,
    },
}

impl ResolvedGeometry {
    /// 渲染用的线段：矩形拆成四条边（底、右、左、顶），标签没有线段。
    pub fn segments(&self) -> Vec<(Point2, Point2)> {
        match self {
            ResolvedGeometry::Line { start, end, .. } => vec![(*start, *end)],
            ResolvedGeometry::Rectangle { first, second, .. } => {
                let (x1, y1, x2, y2) = (first.x(), first.y(), second.x(), second.y());
                vec![
                    (Point2::new(x1, y1), Point2::new(x2, y1)),
                    (Point2::new(x2, y1), Point2::new(x2, y2)),
                    (Point2::new(x1, y1), Point2::new(x1, y2)),
                    (Point2::new(x1, y2), Point2::new(x2, y2)),
                ]
            }
            ResolvedGeometry::Label { .. } => Vec::new(),
        }
    }

    pub fn color(&self) -> Option<Rgba> {
        match self {
            ResolvedGeometry::Line { color, .. } | ResolvedGeometry::Rectangle { color, .. } => {
                Some(*color)
            }
            ResolvedGeometry::Label { .. } => None,
        }
    }
}

/// 已解析图形。`opacity` 只是显示提示（宏编辑时其他元件变淡），不影响几何。
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedShape {
    pub component: ComponentId,
    pub geometry: ResolvedGeometry,
    pub opacity: f32,
}

impl ResolvedShape {
    /// 叠加透明度提示后的颜色。
    pub fn display_color(&self) -> Option<Rgba> {
        self.geometry
            .color()
            .map(|color| color.with_alpha_scaled(self.opacity))
    }
}

/// 单个元件的解析结果与局部包围盒。
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedComponent {
    pub id: ComponentId,
    /// 元件原点的世界坐标（`origin * magnifier`）。
    pub origin: Point2,
    pub shapes: Vec<ResolvedShape>,
    pub bounds: BoundingBox,
}

/// 同时维护全局包围盒与每个元件的局部包围盒。
#[derive(Debug, Default)]
pub struct BoundsAggregator {
    global: BoundingBox,
    local: HashMap<ComponentId, BoundingBox>,
}

impl BoundsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记元件，没有任何图形的元件也会得到一个空的局部包围盒。
    pub fn register(&mut self, component: ComponentId) {
        self.local.entry(component).or_insert_with(BoundingBox::empty);
    }

    pub fn merge(&mut self, component: ComponentId, point: Point2) {
        self.global.include_point(point);
        self.local
            .entry(component)
            .or_insert_with(BoundingBox::empty)
            .include_point(point);
    }

    #[inline]
    pub fn global(&self) -> BoundingBox {
        self.global
    }

    pub fn local(&self, component: ComponentId) -> Option<BoundingBox> {
        self.local.get(&component).copied()
    }

    /// `target` 为空时返回全局包围盒，否则返回该元件的局部包围盒（不存在则为空盒）。
    pub fn bounds_for(&self, target: Option<ComponentId>) -> BoundingBox {
        match target {
            None => self.global,
            Some(id) => self.local(id).unwrap_or_default(),
        }
    }
}

/// 把元件局部坐标映射到世界坐标：`(local + origin) * magnifier`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchemeGeometryResolver {
    magnifier: f64,
}

impl SchemeGeometryResolver {
    pub fn new(magnifier: f64) -> Self {
        Self { magnifier }
    }

    #[inline]
    pub fn magnifier(&self) -> f64 {
        self.magnifier
    }

    #[inline]
    pub fn to_world(&self, component: &Component, local: Point2) -> Point2 {
        Point2::from_vec((local.as_vec2() + component.origin.as_vec2()) * self.magnifier)
    }

    /// 按方案顺序解析全部元件。相同输入总得到逐位相同的结果。
    pub fn resolve(&self, scheme: &Scheme) -> ResolvedScheme {
        let mut aggregator = BoundsAggregator::new();
        let mut order = Vec::with_capacity(scheme.len());
        let mut components = HashMap::with_capacity(scheme.len());

        for component in scheme.components() {
            aggregator.register(component.id);
            let mut shapes = Vec::with_capacity(component.shapes.len() + component.labels.len());
            for shape in &component.shapes {
                shapes.push(self.resolve_shape(component, shape, &mut aggregator));
            }
            for label in &component.labels {
                shapes.push(self.resolve_label(component, label, &mut aggregator));
            }
            order.push(component.id);
            components.insert(
                component.id,
                ResolvedComponent {
                    id: component.id,
                    origin: component.origin.scale(self.magnifier),
                    shapes,
                    bounds: aggregator.bounds_for(Some(component.id)),
                },
            );
        }

        let bounds = aggregator.global();
        debug!(
            components = order.len(),
            magnifier = self.magnifier,
            empty = bounds.is_empty(),
            "方案几何解析完成"
        );
        ResolvedScheme {
            magnifier: self.magnifier,
            order,
            components,
            bounds,
        }
    }

    fn resolve_shape(
        &self,
        component: &Component,
        shape: &ShapeSpec,
        aggregator: &mut BoundsAggregator,
    ) -> ResolvedShape {
        let geometry = match shape {
            ShapeSpec::Line(line) => {
                let start = self.to_world(component, line.start);
                let end = self.to_world(component, line.end);
                aggregator.merge(component.id, start);
                aggregator.merge(component.id, end);
                ResolvedGeometry::Line {
                    start,
                    end,
                    width: line.width,
                    color: line.color,
                }
            }
            ShapeSpec::Rectangle(rect) => {
                let first = self.to_world(component, rect.first);
                let second = self.to_world(component, rect.second);
                aggregator.merge(component.id, first);
                aggregator.merge(component.id, second);
                ResolvedGeometry::Rectangle {
                    first,
                    second,
                    width: rect.width,
                    color: rect.color,
                }
            }
            ShapeSpec::Label(label) => return self.resolve_label(component, label, aggregator),
        };
        ResolvedShape {
            component: component.id,
            geometry,
            opacity: 1.0,
        }
    }

    /// 标签只以锚点（零面积）参与包围盒。
    fn resolve_label(
        &self,
        component: &Component,
        label: &LabelShape,
        aggregator: &mut BoundsAggregator,
    ) -> ResolvedShape {
        let anchor = self.to_world(component, label.anchor);
        aggregator.merge(component.id, anchor);
        ResolvedShape {
            component: component.id,
            geometry: ResolvedGeometry::Label {
                anchor,
                font: label.font.clone(),
                size: label.size,
                text: label.display_text().to_string(),
            },
            opacity: 1.0,
        }
    }
}

/// 解析方案的便捷入口。
pub fn resolve_all(scheme: &Scheme, magnifier: f64) -> ResolvedScheme {
    SchemeGeometryResolver::new(magnifier).resolve(scheme)
}

/// 解析结果的旁路表：以元件 ID 为键，不写回文档模型。
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScheme {
    magnifier: f64,
    order: Vec<ComponentId>,
    components: HashMap<ComponentId, ResolvedComponent>,
    bounds: BoundingBox,
}

impl ResolvedScheme {
    pub fn empty(magnifier: f64) -> Self {
        Self {
            magnifier,
            order: Vec::new(),
            components: HashMap::new(),
            bounds: BoundingBox::empty(),
        }
    }

    #[inline]
    pub fn magnifier(&self) -> f64 {
        self.magnifier
    }

    /// 全局包围盒。
    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn local_bounds(&self, id: ComponentId) -> Option<BoundingBox> {
        self.components.get(&id).map(|component| component.bounds)
    }

    /// `target` 为空时返回全局包围盒，否则返回目标元件的局部包围盒。
    pub fn bounds_for(&self, target: Option<ComponentId>) -> BoundingBox {
        match target {
            None => self.bounds,
            Some(id) => self.local_bounds(id).unwrap_or_default(),
        }
    }

    pub fn component(&self, id: ComponentId) -> Option<&ResolvedComponent> {
        self.components.get(&id)
    }

    /// 按方案顺序迭代。
    pub fn components(&self) -> impl Iterator<Item = &ResolvedComponent> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.components.get(id))
    }

    /// 按方案顺序展开所有图形（即绘制顺序）。
    pub fn shapes(&self) -> impl Iterator<Item = &ResolvedShape> + '_ {
        self.components()
            .flat_map(|component| component.shapes.iter())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 设置聚焦元件：`target` 以外的元件图形透明度降为 `dimmed_opacity`，为空时全部恢复。
    pub fn set_focus(&mut self, target: Option<ComponentId>, dimmed_opacity: f32) {
        for component in self.components.values_mut() {
            let opacity = match target {
                Some(id) if id != component.id => dimmed_opacity,
                _ => 1.0,
            };
            for shape in &mut component.shapes {
                shape.opacity = opacity;
            }
        }
    }
}
