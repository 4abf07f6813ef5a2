use std::time::Duration;

use feetcad_core::geometry::{BoundingBox, Point2, Vector2};
use feetcad_core::scheme::{ComponentId, Scheme};
use tracing::{debug, info, warn};

use crate::camera::{CameraState, CameraTransform};
use crate::errors::EngineError;
use crate::grid::{AdaptiveGrid, GridLine, GridSettings};
use crate::hit_test::HitTester;
use crate::macro_edit::{MacroEditContext, MacroEditState};
use crate::resolver::{ResolvedScheme, SchemeGeometryResolver};
use crate::selection::SelectionState;

/// 查看器参数，由前端从配置映射而来。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerSettings {
    /// 方案单位到世界单位的倍数。
    pub magnifier: f64,
    /// 适配视图时四周留白（世界单位）。
    pub fit_margin: f64,
    /// 点选容差（方案单位，使用时乘以 `magnifier`）。
    pub hit_tolerance: f64,
    /// 每格滚轮缩放 `1 / zoom_step`。
    pub zoom_step: f64,
    pub double_click: Duration,
    pub dimmed_opacity: f32,
    pub show_grid: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            magnifier: 1.0,
            fit_margin: 10.0,
            hit_tolerance: 0.5,
            zoom_step: 5.0,
            double_click: Duration::from_millis(250),
            dimmed_opacity: 0.3,
            show_grid: true,
        }
    }
}

#[inline]
fn valid_magnifier(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// 单线程的查看会话：持有方案、解析旁路表、相机、网格、高亮集与宏编辑作用域。
///
/// 所有会改变相机的操作都会立即重算网格，之后的查询总能看到最新状态。
#[derive(Debug)]
pub struct Viewer {
    settings: ViewerSettings,
    scheme: Scheme,
    resolved: ResolvedScheme,
    camera: CameraTransform,
    grid: AdaptiveGrid,
    selection: SelectionState,
    macro_edit: Option<MacroEditContext>,
    viewport: Vector2,
}

impl Viewer {
    pub fn new(settings: ViewerSettings, grid: GridSettings, viewport: Vector2) -> Self {
        let mut settings = settings;
        if !valid_magnifier(settings.magnifier) {
            warn!(magnifier = settings.magnifier, "放大倍数无效，使用 1.0");
            settings.magnifier = 1.0;
        }
        let mut grid = AdaptiveGrid::new(grid);
        grid.set_visible(settings.show_grid);

        let mut viewer = Self {
            resolved: ResolvedScheme::empty(settings.magnifier),
            settings,
            scheme: Scheme::new(),
            camera: CameraTransform::new(),
            grid,
            selection: SelectionState::new(),
            macro_edit: None,
            viewport,
        };
        viewer.recompute_grid();
        viewer
    }

    #[inline]
    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    #[inline]
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    #[inline]
    pub fn resolved(&self) -> &ResolvedScheme {
        &self.resolved
    }

    #[inline]
    pub fn camera(&self) -> CameraState {
        self.camera.state()
    }

    #[inline]
    pub fn grid(&self) -> &AdaptiveGrid {
        &self.grid
    }

    #[inline]
    pub fn grid_lines(&self) -> &[GridLine] {
        self.grid.lines()
    }

    #[inline]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    #[inline]
    pub fn viewport(&self) -> Vector2 {
        self.viewport
    }

    #[inline]
    pub fn magnifier(&self) -> f64 {
        self.settings.magnifier
    }

    pub fn macro_edit(&self) -> Option<&MacroEditContext> {
        self.macro_edit.as_ref()
    }

    pub fn macro_edit_state(&self) -> MacroEditState {
        self.macro_edit
            .map(|context| context.state())
            .unwrap_or_default()
    }

    /// 当前作用域下用于适配的包围盒：全局，或宏编辑元件的局部包围盒。
    pub fn active_bounds(&self) -> BoundingBox {
        self.resolved.bounds_for(self.macro_edit_state().target())
    }

    /// 载入新方案：重新解析、清空高亮、退出宏编辑并适配视图。
    pub fn load_scheme(&mut self, scheme: Scheme) {
        self.scheme = scheme;
        self.selection.clear();
        self.macro_edit = None;
        self.grid.set_anchor(Point2::ORIGIN);
        self.camera.reset();
        self.resolve();
        info!(
            components = self.scheme.len(),
            shapes = self.scheme.shape_count(),
            "方案已载入"
        );
        self.fit_or_keep();
    }

    /// 修改放大倍数。非法取值会被忽略并返回 `false`。
    pub fn set_magnifier(&mut self, magnifier: f64) -> bool {
        if !valid_magnifier(magnifier) {
            warn!(magnifier, "放大倍数无效，已忽略");
            return false;
        }
        self.settings.magnifier = magnifier;
        self.resolve();
        if let Some(context) = self.macro_edit {
            // 原点的世界坐标随倍数变化，需要重新取局部作用域
            let mut selection = SelectionState::new();
            selection.insert(context.component());
            match MacroEditContext::enter(&selection, &self.resolved) {
                Ok(rescoped) => {
                    self.grid.set_anchor(rescoped.grid_anchor());
                    self.macro_edit = Some(rescoped);
                }
                Err(err) => {
                    warn!(%err, "宏编辑作用域失效，已退出");
                    self.macro_edit = None;
                    self.resolved.set_focus(None, self.settings.dimmed_opacity);
                    self.grid.set_anchor(Point2::ORIGIN);
                }
            }
        }
        self.fit_or_keep();
        true
    }

    pub fn resize(&mut self, viewport: Vector2) {
        self.viewport = viewport;
        self.recompute_grid();
    }

    pub fn pan_by(&mut self, delta_screen: Vector2) {
        self.camera.pan_by(delta_screen);
        self.recompute_grid();
    }

    pub fn zoom_around(&mut self, screen_point: Point2, zoom_delta: f64) {
        self.camera
            .zoom_around(screen_point, zoom_delta, self.viewport);
        self.recompute_grid();
    }

    pub fn screen_to_world(&self, point: Point2) -> Point2 {
        self.camera.screen_to_world(point, self.viewport)
    }

    pub fn world_to_screen(&self, point: Point2) -> Point2 {
        self.camera.world_to_screen(point, self.viewport)
    }

    /// 把视图适配到当前作用域的包围盒。
    pub fn reset_view(&mut self) -> Result<(), EngineError> {
        let bounds = self.active_bounds();
        self.camera
            .fit_to_bounds(&bounds, self.viewport, self.settings.fit_margin)?;
        self.recompute_grid();
        info!(zoom = self.camera.zoom(), "视图已重置");
        Ok(())
    }

    /// 点选，`tolerance` 为方案单位。
    pub fn hit_test(&self, world_point: Point2, tolerance: f64) -> Vec<ComponentId> {
        HitTester::new(&self.resolved)
            .with_target(self.macro_edit_state().target())
            .query(world_point, tolerance * self.settings.magnifier)
    }

    /// 指针移动后按配置容差重新计算高亮集，返回高亮是否变化。
    pub fn pointer_moved(&mut self, screen_point: Point2) -> bool {
        let world = self.screen_to_world(screen_point);
        let hits = self.hit_test(world, self.settings.hit_tolerance);
        let changed = self.selection.replace(hits);
        if changed {
            debug!(
                x = world.x(),
                y = world.y(),
                highlighted = self.selection.len(),
                "高亮已更新"
            );
        }
        changed
    }

    /// 直接高亮某个元件。
    pub fn select(&mut self, id: ComponentId) -> Result<bool, EngineError> {
        if self.scheme.component(id).is_none() {
            return Err(EngineError::ComponentNotFound(id.get()));
        }
        Ok(self.selection.insert(id))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        self.grid.set_visible(visible);
        self.recompute_grid();
    }

    /// 切换网格显示，返回切换后的状态。
    pub fn toggle_grid(&mut self) -> bool {
        let visible = !self.grid.is_visible();
        self.set_grid_visible(visible);
        info!(visible, "网格显示已切换");
        visible
    }

    /// 以唯一高亮元件进入宏编辑：其他元件变淡，网格锚到元件原点，视图适配局部包围盒。
    pub fn enter_macro_edit(&mut self) -> Result<ComponentId, EngineError> {
        let context = MacroEditContext::enter(&self.selection, &self.resolved)?;
        let component = context.component();
        self.macro_edit = Some(context);
        self.resolved
            .set_focus(Some(component), self.settings.dimmed_opacity);
        self.grid.set_anchor(context.grid_anchor());
        info!(component = component.get(), "进入宏编辑");
        self.fit_or_keep();
        Ok(component)
    }

    /// 退出宏编辑并恢复全局作用域，返回之前是否处于宏编辑。
    pub fn exit_macro_edit(&mut self) -> bool {
        let Some(context) = self.macro_edit.take() else {
            return false;
        };
        self.resolved.set_focus(None, self.settings.dimmed_opacity);
        self.grid.set_anchor(Point2::ORIGIN);
        info!(component = context.component().get(), "退出宏编辑");
        self.fit_or_keep();
        true
    }

    fn resolve(&mut self) {
        self.resolved = SchemeGeometryResolver::new(self.settings.magnifier).resolve(&self.scheme);
        let target = self.macro_edit_state().target();
        if target.is_some() {
            self.resolved
                .set_focus(target, self.settings.dimmed_opacity);
        }
    }

    /// 适配失败（空方案或零尺寸）时保持相机不变，只记录日志。
    fn fit_or_keep(&mut self) {
        if let Err(err) = self.reset_view() {
            warn!(%err, "视图适配已跳过");
            self.recompute_grid();
        }
    }

    fn recompute_grid(&mut self) {
        self.grid.recompute(&self.camera.state());
    }
}
