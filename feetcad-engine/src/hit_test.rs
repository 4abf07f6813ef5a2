use feetcad_core::geometry::{BoundingBox, Point2};
use feetcad_core::scheme::ComponentId;

use crate::resolver::{ResolvedComponent, ResolvedGeometry, ResolvedScheme};

/// 单个图形的命中判定（世界坐标，`tolerance` 为世界单位）。
///
/// 线段按其外接矩形近似判定，斜线在包围盒角落附近会多报命中。
/// 标签不参与命中。
pub fn geometry_contains(geometry: &ResolvedGeometry, point: Point2, tolerance: f64) -> bool {
    match geometry {
        ResolvedGeometry::Line { start, end, .. } => {
            BoundingBox::from_corners(*start, *end).contains(point, tolerance)
        }
        ResolvedGeometry::Rectangle { first, second, .. } => {
            BoundingBox::from_corners(*first, *second).contains(point, tolerance)
        }
        ResolvedGeometry::Label { .. } => false,
    }
}

/// 在已解析方案上做点选。`target` 非空时只有该元件参与（宏编辑）。
#[derive(Debug, Clone, Copy)]
pub struct HitTester<'a> {
    resolved: &'a ResolvedScheme,
    target: Option<ComponentId>,
}

impl<'a> HitTester<'a> {
    pub fn new(resolved: &'a ResolvedScheme) -> Self {
        Self {
            resolved,
            target: None,
        }
    }

    pub fn with_target(mut self, target: Option<ComponentId>) -> Self {
        self.target = target;
        self
    }

    /// 返回包含该点的元件，按方案顺序，每个元件最多出现一次。
    pub fn query(&self, point: Point2, tolerance: f64) -> Vec<ComponentId> {
        let tolerance = if tolerance.is_finite() {
            tolerance.max(0.0)
        } else {
            0.0
        };
        self.resolved
            .components()
            .filter(|component| self.target.is_none_or(|target| target == component.id))
            .filter(|component| component_contains(component, point, tolerance))
            .map(|component| component.id)
            .collect()
    }
}

fn component_contains(component: &ResolvedComponent, point: Point2, tolerance: f64) -> bool {
    component
        .shapes
        .iter()
        .any(|shape| geometry_contains(&shape.geometry, point, tolerance))
}

#[cfg(test)]
mod tests {
    use feetcad_core::color::Rgba;
    use feetcad_core::scheme::Scheme;

    use super::*;
    use crate::resolver::resolve_all;

    fn rectangle(first: Point2, second: Point2) -> ResolvedGeometry {
        ResolvedGeometry::Rectangle {
            first,
            second,
            width: 1.0,
            color: Rgba::WHITE,
        }
    }

    #[test]
    fn rectangle_hit_respects_tolerance() {
        let rect = rectangle(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0));
        assert!(geometry_contains(&rect, Point2::new(5.0, 5.0), 0.0));
        assert!(!geometry_contains(&rect, Point2::new(11.0, 5.0), 0.0));
        assert!(geometry_contains(&rect, Point2::new(11.0, 5.0), 2.0));
        assert!(!geometry_contains(&rect, Point2::new(12.5, 5.0), 2.0));
    }

    #[test]
    fn rectangle_corner_order_does_not_matter() {
        let rect = rectangle(Point2::new(10.0, 10.0), Point2::new(0.0, 0.0));
        assert!(geometry_contains(&rect, Point2::new(5.0, 5.0), 0.0));
        let rect = rectangle(Point2::new(0.0, 10.0), Point2::new(10.0, 0.0));
        assert!(geometry_contains(&rect, Point2::new(0.0, 0.0), 0.0));
    }

    #[test]
    fn diagonal_line_uses_bounding_rectangle() {
        let line = ResolvedGeometry::Line {
            start: Point2::new(0.0, 0.0),
            end: Point2::new(10.0, 10.0),
            width: 1.0,
            color: Rgba::WHITE,
        };
        // (9, 1) 离线段很远，但落在外接矩形内
        assert!(geometry_contains(&line, Point2::new(9.0, 1.0), 0.0));
        assert!(!geometry_contains(&line, Point2::new(-1.0, 5.0), 0.5));
        assert!(geometry_contains(&line, Point2::new(-1.0, 5.0), 1.0));
    }

    #[test]
    fn labels_are_not_hit_testable() {
        let label = ResolvedGeometry::Label {
            anchor: Point2::new(1.0, 1.0),
            font: "Arial".to_string(),
            size: 10.0,
            text: "R1".to_string(),
        };
        assert!(!geometry_contains(&label, Point2::new(1.0, 1.0), 100.0));
    }

    fn overlapping_scheme() -> (Scheme, Vec<ComponentId>) {
        let mut scheme = Scheme::new();
        let mut ids = Vec::new();
        for (name, x) in [("A", 0.0), ("B", 5.0), ("C", 100.0)] {
            let id = scheme.add_component(name, Point2::new(x, 0.0));
            let component = scheme.component_mut(id).expect("component");
            component.add_rectangle(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0), 1.0, Rgba::WHITE);
            // 同一元件内第二个重叠图形，不应导致重复
            component.add_line(Point2::new(0.0, 0.0), Point2::new(10.0, 10.0), 1.0, Rgba::WHITE);
            ids.push(id);
        }
        (scheme, ids)
    }

    #[test]
    fn query_returns_components_in_scheme_order_once() {
        let (scheme, ids) = overlapping_scheme();
        let resolved = resolve_all(&scheme, 1.0);
        let tester = HitTester::new(&resolved);

        let hits = tester.query(Point2::new(7.0, 5.0), 0.0);
        assert_eq!(hits, vec![ids[0], ids[1]]);
        assert_eq!(tester.query(Point2::new(7.0, 5.0), 0.0), hits);

        assert!(tester.query(Point2::new(50.0, 5.0), 0.0).is_empty());
        assert_eq!(tester.query(Point2::new(105.0, 5.0), 0.0), vec![ids[2]]);
    }

    #[test]
    fn target_restricts_query() {
        let (scheme, ids) = overlapping_scheme();
        let resolved = resolve_all(&scheme, 1.0);
        let tester = HitTester::new(&resolved).with_target(Some(ids[1]));
        assert_eq!(tester.query(Point2::new(7.0, 5.0), 0.0), vec![ids[1]]);
        assert!(tester.query(Point2::new(2.0, 5.0), 0.0).is_empty());
    }

    #[test]
    fn invalid_tolerance_is_treated_as_zero() {
        let (scheme, ids) = overlapping_scheme();
        let resolved = resolve_all(&scheme, 1.0);
        let tester = HitTester::new(&resolved);
        assert!(tester.query(Point2::new(-1.0, 5.0), -5.0).is_empty());
        assert!(tester.query(Point2::new(-1.0, 5.0), f64::NAN).is_empty());
        assert_eq!(tester.query(Point2::new(-1.0, 5.0), 1.0), vec![ids[0]]);
    }
}
