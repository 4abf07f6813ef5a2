use feetcad_core::color::Rgba;
use feetcad_core::geometry::Point2;
use tracing::debug;

use crate::camera::CameraState;

/// 细节层级循环的上限，防止极端缩放下无限放大步长。
const MAX_LOD_LEVELS: u32 = 64;
/// 判定"整除"时允许的相对误差。
const TIER_EPSILON: f64 = 1e-9;
/// 网格线在世界坐标中的半长。
pub const GRID_LINE_HALF_LENGTH: f64 = 200_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPalette {
    pub zero: Rgba,
    pub primary: Rgba,
    pub middle: Rgba,
    pub secondary: Rgba,
}

impl GridPalette {
    pub fn color(&self, tier: GridTier) -> Rgba {
        match tier {
            GridTier::Zero => self.zero,
            GridTier::Primary => self.primary,
            GridTier::Middle => self.middle,
            GridTier::Secondary => self.secondary,
        }
    }
}

impl Default for GridPalette {
    fn default() -> Self {
        Self {
            zero: Rgba::new(255, 255, 255, 150),
            primary: Rgba::new(255, 255, 255, 100),
            middle: Rgba::new(255, 255, 255, 50),
            secondary: Rgba::new(255, 255, 255, 25),
        }
    }
}

/// 网格参数。`step` 为世界单位下的基础间距，`min_cell_width` 与 `line_width` 为屏幕像素。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    pub step: f64,
    pub steps: usize,
    pub min_cell_width: f64,
    pub zoom_step: u32,
    pub line_width: f64,
    pub palette: GridPalette,
}

impl GridSettings {
    /// 修正非法取值：步长必须为正，层级倍数至少为 2。
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.step.is_finite() && self.step > 0.0) {
            self.step = defaults.step;
        }
        if !(self.min_cell_width.is_finite() && self.min_cell_width >= 0.0) {
            self.min_cell_width = defaults.min_cell_width;
        }
        if !(self.line_width.is_finite() && self.line_width >= 0.0) {
            self.line_width = defaults.line_width;
        }
        self.zoom_step = self.zoom_step.max(2);
        self
    }
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            step: 1.0,
            steps: 40,
            min_cell_width: 20.0,
            zoom_step: 10,
            line_width: 2.0,
            palette: GridPalette::default(),
        }
    }
}

/// `X` 轴上的线是竖线（位置为 x 坐标），`Y` 轴上的线是横线。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridAxis {
    X,
    Y,
}

impl GridAxis {
    #[inline]
    fn component(self, point: Point2) -> f64 {
        match self {
            GridAxis::X => point.x(),
            GridAxis::Y => point.y(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridTier {
    Zero,
    Primary,
    Middle,
    Secondary,
}

impl GridTier {
    /// 按优先级判定网格线等级：原点 > 大格 (`zoom_step * zoom_factor`) > 半格 > 其他。
    pub fn classify(position: f64, zoom_factor: f64, zoom_step: u32) -> GridTier {
        let zoom_step = f64::from(zoom_step);
        if (position / zoom_factor).abs() <= TIER_EPSILON {
            GridTier::Zero
        } else if is_multiple(position, zoom_step * zoom_factor) {
            GridTier::Primary
        } else if is_multiple(position, zoom_step / 2.0 * zoom_factor) {
            GridTier::Middle
        } else {
            GridTier::Secondary
        }
    }
}

fn is_multiple(value: f64, period: f64) -> bool {
    if !(period.is_finite() && period > 0.0) {
        return false;
    }
    let quotient = value / period;
    (quotient - quotient.round()).abs() <= TIER_EPSILON
}

/// 一条网格线。每次重算整体替换，生成后不再原地修改。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub axis: GridAxis,
    pub position: f64,
    pub tier: GridTier,
    /// 世界单位下的线宽，等于 `line_width / zoom`，使屏幕线宽恒定。
    pub width: f64,
}

impl GridLine {
    /// 线段两端的世界坐标。
    pub fn endpoints(&self) -> (Point2, Point2) {
        match self.axis {
            GridAxis::X => (
                Point2::new(self.position, -GRID_LINE_HALF_LENGTH),
                Point2::new(self.position, GRID_LINE_HALF_LENGTH),
            ),
            GridAxis::Y => (
                Point2::new(-GRID_LINE_HALF_LENGTH, self.position),
                Point2::new(GRID_LINE_HALF_LENGTH, self.position),
            ),
        }
    }
}

/// 自适应网格：根据相机缩放选择 `1, k, k², …` 的离散步长，
/// 并把线集合对齐到世界坐标上的固定格点。
#[derive(Debug, Clone)]
pub struct AdaptiveGrid {
    settings: GridSettings,
    visible: bool,
    last_applied_visible: bool,
    anchor: Point2,
    zoom_factor: f64,
    lines: Vec<GridLine>,
}

impl AdaptiveGrid {
    pub fn new(settings: GridSettings) -> Self {
        Self {
            settings: settings.sanitized(),
            visible: false,
            // 首次重算必须执行，即使网格尚未显示
            last_applied_visible: true,
            anchor: Point2::ORIGIN,
            zoom_factor: 1.0,
            lines: Vec::new(),
        }
    }

    #[inline]
    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// 只修改可见标记，线集合保持存在；由调用方随后触发重算。
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[inline]
    pub fn anchor(&self) -> Point2 {
        self.anchor
    }

    /// 设置格点原点（宏编辑时为元件原点的世界坐标）。
    pub fn set_anchor(&mut self, anchor: Point2) {
        self.anchor = anchor;
    }

    #[inline]
    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    #[inline]
    pub fn lines(&self) -> &[GridLine] {
        &self.lines
    }

    /// 当前层级下网格单元在屏幕上的宽度（像素）。
    pub fn cell_width(&self, zoom: f64) -> f64 {
        self.settings.step * zoom * self.zoom_factor
    }

    /// 选取最小的 `zoom_step` 幂次，使单元屏幕宽度不小于 `min_cell_width`。
    pub fn select_zoom_factor(&self, zoom: f64) -> f64 {
        let zoom_step = f64::from(self.settings.zoom_step);
        let mut zoom_factor = 1.0;
        let mut cell_width = self.settings.step * zoom;
        let mut levels = 0;
        while cell_width < self.settings.min_cell_width && levels < MAX_LOD_LEVELS {
            zoom_factor *= zoom_step;
            cell_width = self.settings.step * zoom * zoom_factor;
            levels += 1;
        }
        zoom_factor
    }

    /// 根据相机状态重算网格线。网格隐藏且上次应用时也隐藏时直接返回缓存结果。
    pub fn recompute(&mut self, camera: &CameraState) -> &[GridLine] {
        if !self.visible && !self.last_applied_visible {
            return &self.lines;
        }

        let zoom_factor = self.select_zoom_factor(camera.zoom);
        if zoom_factor != self.zoom_factor {
            debug!(zoom_factor, zoom = camera.zoom, "网格层级已切换");
        }
        self.zoom_factor = zoom_factor;

        let period = self.settings.step * zoom_factor;
        let half_extent = self.settings.steps as f64 * period / 2.0;
        let width = self.settings.line_width / camera.zoom;

        self.lines.clear();
        self.lines.reserve(self.settings.steps * 2);
        for axis in [GridAxis::X, GridAxis::Y] {
            let origin = axis.component(self.anchor);
            let relative = axis.component(camera.position) - origin;
            let lattice = relative - relative.rem_euclid(period);
            for index in 0..self.settings.steps {
                let local = index as f64 * period - half_extent + lattice;
                self.lines.push(GridLine {
                    axis,
                    position: origin + local,
                    tier: GridTier::classify(local, zoom_factor, self.settings.zoom_step),
                    width,
                });
            }
        }

        self.last_applied_visible = self.visible;
        &self.lines
    }

    /// 当前层级下各等级线的数量，供概要输出使用。
    pub fn tier_counts(&self) -> [(GridTier, usize); 4] {
        let mut counts = [
            (GridTier::Zero, 0),
            (GridTier::Primary, 0),
            (GridTier::Middle, 0),
            (GridTier::Secondary, 0),
        ];
        for line in &self.lines {
            if let Some(entry) = counts.iter_mut().find(|(tier, _)| *tier == line.tier) {
                entry.1 += 1;
            }
        }
        counts
    }
}

impl Default for AdaptiveGrid {
    fn default() -> Self {
        Self::new(GridSettings::default())
    }
}
