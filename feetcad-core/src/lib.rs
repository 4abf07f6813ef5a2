pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示。既用于世界坐标，也用于屏幕坐标。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        pub const ORIGIN: Point2 = Point2(DVec2::ZERO);

        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        /// 按比例缩放坐标（相对原点）。
        #[inline]
        pub fn scale(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn is_finite(self) -> bool {
            self.0.is_finite()
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量。用于平移量、视口尺寸等。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        pub const ZERO: Vector2 = Vector2(DVec2::ZERO);

        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn scale(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐包围盒。
    ///
    /// "空"是独立的哨兵状态（尚未合并任何点），与零尺寸的盒子不同；
    /// 合并第一个点后 `min <= max` 在两个轴上始终成立。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct BoundingBox {
        min: Point2,
        max: Point2,
    }

    impl BoundingBox {
        /// 由任意两个角点构造，自动规整为 min/max。
        pub fn from_corners(a: Point2, b: Point2) -> Self {
            Self {
                min: Point2::from_vec(a.as_vec2().min(b.as_vec2())),
                max: Point2::from_vec(a.as_vec2().max(b.as_vec2())),
            }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        /// 空盒宽度记为 0。
        #[inline]
        pub fn width(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.x() - self.min.x()
            }
        }

        #[inline]
        pub fn height(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.y() - self.min.y()
            }
        }

        /// 空盒，或宽高同时为零（只合并过同一个点）。
        #[inline]
        pub fn is_degenerate(&self) -> bool {
            self.is_empty() || (self.width() == 0.0 && self.height() == 0.0)
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &BoundingBox) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let center = (self.min.as_vec2() + self.max.as_vec2()) * 0.5;
            Point2::from_vec(center)
        }

        /// 在四周各外扩 `tolerance` 后判断点是否落在盒内（含边界）。
        pub fn contains(&self, point: Point2, tolerance: f64) -> bool {
            if self.is_empty() {
                return false;
            }
            point.x() >= self.min.x() - tolerance
                && point.x() <= self.max.x() + tolerance
                && point.y() >= self.min.y() - tolerance
                && point.y() <= self.max.y() + tolerance
        }
    }

    impl Default for BoundingBox {
        fn default() -> Self {
            Self::empty()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn merging_points_tracks_min_and_max() {
            let mut bounds = BoundingBox::empty();
            assert!(bounds.is_empty());

            bounds.include_point(Point2::new(5.0, 5.0));
            assert!(!bounds.is_empty());
            assert!(bounds.is_degenerate());
            assert_eq!(bounds.min(), Point2::new(5.0, 5.0));
            assert_eq!(bounds.max(), Point2::new(5.0, 5.0));

            bounds.include_point(Point2::new(-3.0, 10.0));
            assert_eq!(bounds.min(), Point2::new(-3.0, 5.0));
            assert_eq!(bounds.max(), Point2::new(5.0, 10.0));
            assert!(!bounds.is_degenerate());
            assert_eq!(bounds.width(), 8.0);
            assert_eq!(bounds.height(), 5.0);
        }

        #[test]
        fn empty_bounds_are_ignored_when_merging() {
            let mut bounds = BoundingBox::from_corners(Point2::new(1.0, 1.0), Point2::new(2.0, 2.0));
            bounds.include_bounds(&BoundingBox::empty());
            assert_eq!(bounds.min(), Point2::new(1.0, 1.0));
            assert_eq!(bounds.max(), Point2::new(2.0, 2.0));

            let mut empty = BoundingBox::empty();
            empty.include_bounds(&bounds);
            assert_eq!(empty, bounds);
        }

        #[test]
        fn from_corners_normalizes_reversed_order() {
            let bounds = BoundingBox::from_corners(Point2::new(10.0, -2.0), Point2::new(-4.0, 6.0));
            assert_eq!(bounds.min(), Point2::new(-4.0, -2.0));
            assert_eq!(bounds.max(), Point2::new(10.0, 6.0));
            let center = bounds.center();
            assert!((center.x() - 3.0).abs() < 1e-9);
            assert!((center.y() - 2.0).abs() < 1e-9);
        }

        #[test]
        fn contains_respects_tolerance() {
            let bounds = BoundingBox::from_corners(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0));
            assert!(bounds.contains(Point2::new(5.0, 5.0), 0.0));
            assert!(bounds.contains(Point2::new(10.0, 0.0), 0.0));
            assert!(!bounds.contains(Point2::new(11.0, 5.0), 0.0));
            assert!(bounds.contains(Point2::new(11.0, 5.0), 2.0));
            assert!(!BoundingBox::empty().contains(Point2::ORIGIN, 100.0));
        }
    }
}

pub mod color {
    use serde::{Deserialize, Serialize};

    /// RGBA 颜色，每通道 0..=255，与方案文件中的 `[r, g, b, a]` 数组一一对应。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Rgba(pub [u8; 4]);

    impl Rgba {
        pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);

        #[inline]
        pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
            Self([r, g, b, a])
        }

        #[inline]
        pub fn r(self) -> u8 {
            self.0[0]
        }

        #[inline]
        pub fn g(self) -> u8 {
            self.0[1]
        }

        #[inline]
        pub fn b(self) -> u8 {
            self.0[2]
        }

        #[inline]
        pub fn a(self) -> u8 {
            self.0[3]
        }

        /// 按系数缩放透明度，系数截断到 `[0, 1]`。
        pub fn with_alpha_scaled(self, factor: f32) -> Self {
            let factor = if factor.is_finite() {
                factor.clamp(0.0, 1.0)
            } else {
                1.0
            };
            let alpha = (f32::from(self.a()) * factor).round() as u8;
            Self([self.r(), self.g(), self.b(), alpha])
        }
    }

    impl From<[u8; 4]> for Rgba {
        fn from(value: [u8; 4]) -> Self {
            Self(value)
        }
    }
}

pub mod scheme {
    use std::collections::HashSet;

    use serde::{Deserialize, Serialize};

    use crate::color::Rgba;
    use crate::geometry::Point2;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct ComponentId(u64);

    impl ComponentId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    /// 线段，坐标为元件局部坐标（未加原点偏移、未放大）。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct LineShape {
        pub start: Point2,
        pub end: Point2,
        pub width: f64,
        pub color: Rgba,
    }

    /// 矩形，由两个对角点给出，角点顺序不限。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RectangleShape {
        pub first: Point2,
        pub second: Point2,
        pub width: f64,
        pub color: Rgba,
    }

    /// 标签：锚点 + 字体信息。`field` 为引用的字段名，`text` 为可选的字面文本。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct LabelShape {
        pub anchor: Point2,
        pub font: String,
        pub size: f64,
        pub text: Option<String>,
        pub field: String,
    }

    impl LabelShape {
        /// 显示文本：优先字面文本，否则回退到字段名。
        pub fn display_text(&self) -> &str {
            self.text.as_deref().unwrap_or(&self.field)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum ShapeSpec {
        Line(LineShape),
        Rectangle(RectangleShape),
        Label(LabelShape),
    }

    impl ShapeSpec {
        pub fn kind_name(&self) -> &'static str {
            match self {
                ShapeSpec::Line(_) => "line",
                ShapeSpec::Rectangle(_) => "rectangle",
                ShapeSpec::Label(_) => "label",
            }
        }
    }

    /// 方案中的一个元件。`origin` 会加到每个局部坐标上，然后整体乘以放大倍数。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Component {
        pub id: ComponentId,
        pub name: String,
        pub origin: Point2,
        #[serde(default)]
        pub shapes: Vec<ShapeSpec>,
        #[serde(default)]
        pub labels: Vec<LabelShape>,
    }

    impl Component {
        pub fn new(id: ComponentId, name: impl Into<String>, origin: Point2) -> Self {
            Self {
                id,
                name: name.into(),
                origin,
                shapes: Vec::new(),
                labels: Vec::new(),
            }
        }

        pub fn with_shape(mut self, shape: ShapeSpec) -> Self {
            self.shapes.push(shape);
            self
        }

        pub fn with_label(mut self, label: LabelShape) -> Self {
            self.labels.push(label);
            self
        }

        pub fn add_line(&mut self, start: Point2, end: Point2, width: f64, color: Rgba) {
            self.shapes.push(ShapeSpec::Line(LineShape {
                start,
                end,
                width,
                color,
            }));
        }

        pub fn add_rectangle(&mut self, first: Point2, second: Point2, width: f64, color: Rgba) {
            self.shapes.push(ShapeSpec::Rectangle(RectangleShape {
                first,
                second,
                width,
                color,
            }));
        }
    }

    /// 元件的有序集合，插入顺序即显示顺序（z 序），必须保持。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Scheme {
        components: Vec<Component>,
        #[serde(default)]
        next_component_id: u64,
    }

    impl Scheme {
        pub fn new() -> Self {
            Self::default()
        }

        /// 新建一个空元件并分配 ID。
        pub fn add_component(&mut self, name: impl Into<String>, origin: Point2) -> ComponentId {
            let id = self.next_id();
            self.components.push(Component::new(id, name, origin));
            id
        }

        /// 插入已构造的元件。ID 已被占用时返回 `None`，方案保持不变。
        pub fn insert_component(&mut self, component: Component) -> Option<ComponentId> {
            let id = component.id;
            if self.component(id).is_some() {
                return None;
            }
            self.next_component_id = self.next_component_id.max(id.get().saturating_add(1));
            self.components.push(component);
            Some(id)
        }

        pub fn component(&self, id: ComponentId) -> Option<&Component> {
            self.components.iter().find(|component| component.id == id)
        }

        pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
            self.components.iter_mut().find(|component| component.id == id)
        }

        #[inline]
        pub fn components(&self) -> impl Iterator<Item = &Component> {
            self.components.iter()
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.components.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.components.is_empty()
        }

        /// 所有元件的图形与标签总数。
        pub fn shape_count(&self) -> usize {
            self.components
                .iter()
                .map(|component| component.shapes.len() + component.labels.len())
                .sum()
        }

        /// 检查是否存在重复 ID（`insert_component` 已阻止，反序列化得到的方案需另行校验）。
        pub fn has_unique_ids(&self) -> bool {
            let mut seen = HashSet::with_capacity(self.components.len());
            self.components.iter().all(|component| seen.insert(component.id))
        }

        #[inline]
        fn next_id(&mut self) -> ComponentId {
            while self.component(ComponentId(self.next_component_id)).is_some() {
                self.next_component_id += 1;
            }
            let id = self.next_component_id;
            self.next_component_id += 1;
            ComponentId(id)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn scheme_preserves_insertion_order() {
            let mut scheme = Scheme::new();
            let a = scheme.add_component("R1", Point2::new(0.0, 0.0));
            let b = scheme.add_component("C1", Point2::new(5.0, 0.0));
            let c = scheme.add_component("U1", Point2::new(-5.0, 2.0));

            let order: Vec<_> = scheme.components().map(|component| component.id).collect();
            assert_eq!(order, vec![a, b, c]);
            assert_eq!(a.get(), 0);
            assert_eq!(c.get(), 2);
            assert_eq!(scheme.component(b).map(|c| c.name.as_str()), Some("C1"));
        }

        #[test]
        fn insert_component_rejects_duplicate_ids() {
            let mut scheme = Scheme::new();
            let first = Component::new(ComponentId::new(7), "A", Point2::ORIGIN);
            let second = Component::new(ComponentId::new(7), "B", Point2::ORIGIN);
            assert_eq!(scheme.insert_component(first), Some(ComponentId::new(7)));
            assert_eq!(scheme.insert_component(second), None);
            assert_eq!(scheme.len(), 1);
            assert!(scheme.has_unique_ids());

            // 自动分配的 ID 跳过已占用的值
            let next = scheme.add_component("C", Point2::ORIGIN);
            assert_eq!(next.get(), 8);
        }

        #[test]
        fn shape_count_includes_labels() {
            let mut scheme = Scheme::new();
            let id = scheme.add_component("R1", Point2::ORIGIN);
            let component = scheme.component_mut(id).expect("component exists");
            component.add_line(Point2::ORIGIN, Point2::new(1.0, 1.0), 1.0, Rgba::WHITE);
            component.add_rectangle(Point2::ORIGIN, Point2::new(2.0, 1.0), 1.0, Rgba::WHITE);
            component.labels.push(LabelShape {
                anchor: Point2::new(0.0, -1.0),
                font: "Arial".to_string(),
                size: 8.0,
                text: None,
                field: "value".to_string(),
            });
            assert_eq!(scheme.shape_count(), 3);
            assert_eq!(component_label(&scheme, id), "value");
        }

        fn component_label(scheme: &Scheme, id: ComponentId) -> &str {
            scheme
                .component(id)
                .and_then(|component| component.labels.first())
                .map(LabelShape::display_text)
                .unwrap_or_default()
        }
    }
}
