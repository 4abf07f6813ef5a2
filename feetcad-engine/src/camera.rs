use feetcad_core::geometry::{BoundingBox, Point2, Vector2};
use tracing::debug;

use crate::errors::EngineError;

const DEFAULT_ZOOM: f64 = 1.0;
pub const MIN_ZOOM: f64 = 1e-9;
pub const MAX_ZOOM: f64 = 1e9;

/// 相机状态：屏幕中心对应的世界坐标 + 缩放倍数（恒为正）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Point2,
    pub zoom: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Point2::ORIGIN,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// 把任意输入的缩放值收敛到 `[MIN_ZOOM, MAX_ZOOM]`，非有限值或非正值落到下限。
#[inline]
fn clamp_zoom(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value.clamp(MIN_ZOOM, MAX_ZOOM)
    } else if value == f64::INFINITY {
        MAX_ZOOM
    } else {
        MIN_ZOOM
    }
}

/// 二维相机变换，采用"屏幕中心即相机位置"的约定：
/// `screen = (world - offset) * zoom`，其中 `offset = position - viewport / 2 / zoom`。
#[derive(Debug, Clone, Default)]
pub struct CameraTransform {
    state: CameraState,
}

impl CameraTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(position: Point2, zoom: f64) -> Self {
        Self {
            state: CameraState {
                position,
                zoom: clamp_zoom(zoom),
            },
        }
    }

    #[inline]
    pub fn state(&self) -> CameraState {
        self.state
    }

    #[inline]
    pub fn position(&self) -> Point2 {
        self.state.position
    }

    #[inline]
    pub fn zoom(&self) -> f64 {
        self.state.zoom
    }

    pub fn set_position(&mut self, position: Point2) {
        self.state.position = position;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.state.zoom = clamp_zoom(zoom);
    }

    pub fn reset(&mut self) {
        self.state = CameraState::default();
    }

    /// 屏幕左下角对应的世界坐标。
    #[inline]
    fn offset(&self, viewport: Vector2) -> Point2 {
        self.state
            .position
            .translate(viewport.scale(-0.5 / self.state.zoom))
    }

    pub fn world_to_screen(&self, point: Point2, viewport: Vector2) -> Point2 {
        let offset = self.offset(viewport);
        Point2::from_vec((point.as_vec2() - offset.as_vec2()) * self.state.zoom)
    }

    pub fn screen_to_world(&self, point: Point2, viewport: Vector2) -> Point2 {
        let offset = self.offset(viewport);
        Point2::from_vec(point.as_vec2() / self.state.zoom + offset.as_vec2())
    }

    /// 按屏幕位移平移相机（拖拽平移）：`position -= delta / zoom`。
    pub fn pan_by(&mut self, delta_screen: Vector2) {
        self.state.position = self
            .state
            .position
            .translate(delta_screen.scale(-1.0 / self.state.zoom));
    }

    /// 以屏幕点为锚缩放：缩放前后锚点下的世界坐标保持不变。
    pub fn zoom_around(&mut self, screen_point: Point2, zoom_delta: f64, viewport: Vector2) {
        let anchor_world = self.screen_to_world(screen_point, viewport);
        let factor = if zoom_delta.is_finite() {
            1.0 + zoom_delta
        } else {
            1.0
        };
        self.state.zoom = clamp_zoom(self.state.zoom * factor);

        // 反解：anchor_world = screen / zoom + position - viewport / 2 / zoom
        let shift = (screen_point.as_vec2() - viewport.as_vec2() * 0.5) / self.state.zoom;
        self.state.position = Point2::from_vec(anchor_world.as_vec2() - shift);
    }

    /// 适配包围盒：宽、高中较大者（两侧各加 `margin`）恰好铺满视口对应边，相机居中。
    pub fn fit_to_bounds(
        &mut self,
        bounds: &BoundingBox,
        viewport: Vector2,
        margin: f64,
    ) -> Result<(), EngineError> {
        if bounds.is_degenerate() {
            return Err(EngineError::DegenerateBounds);
        }
        let margin = if margin.is_finite() { margin.max(0.0) } else { 0.0 };
        let width = bounds.width() + 2.0 * margin;
        let height = bounds.height() + 2.0 * margin;

        let (scheme_extent, window_extent) = if width > height {
            (width, viewport.x())
        } else {
            (height, viewport.y())
        };

        self.state.zoom = clamp_zoom(window_extent / scheme_extent);
        self.state.position = bounds.center();
        debug!(
            zoom = self.state.zoom,
            x = self.state.position.x(),
            y = self.state.position.y(),
            "相机已适配包围盒"
        );
        Ok(())
    }
}
