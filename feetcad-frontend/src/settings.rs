//! 配置到引擎参数的映射。引擎本身不依赖配置 crate。

use std::time::Duration;

use feetcad_config::{AppConfig, FrontendConfig, GridConfig, ViewerConfig};
use feetcad_core::color::Rgba;
use feetcad_core::geometry::Vector2;
use feetcad_engine::grid::{GridPalette, GridSettings};
use feetcad_engine::viewer::{Viewer, ViewerSettings};

pub fn viewer_settings(viewer: &ViewerConfig, grid: &GridConfig) -> ViewerSettings {
    ViewerSettings {
        magnifier: viewer.magnifier,
        fit_margin: viewer.fit_margin,
        hit_tolerance: viewer.hit_tolerance,
        zoom_step: viewer.zoom_step,
        double_click: Duration::from_millis(viewer.double_click_ms),
        dimmed_opacity: viewer.dimmed_opacity.clamp(0.0, 1.0),
        show_grid: grid.visible,
    }
}

pub fn grid_settings(grid: &GridConfig) -> GridSettings {
    GridSettings {
        step: grid.step,
        steps: grid.steps,
        min_cell_width: grid.min_cell_width,
        zoom_step: grid.zoom_step,
        line_width: grid.line_width,
        palette: GridPalette {
            zero: Rgba::from(grid.zero_color),
            primary: Rgba::from(grid.primary_color),
            middle: Rgba::from(grid.middle_color),
            secondary: Rgba::from(grid.secondary_color),
        },
    }
    .sanitized()
}

pub fn viewport_size(frontend: &FrontendConfig) -> Vector2 {
    Vector2::new(
        frontend.viewport_width.max(0.0),
        frontend.viewport_height.max(0.0),
    )
}

/// 按配置创建空的查看器。
pub fn build_viewer(config: &AppConfig) -> Viewer {
    Viewer::new(
        viewer_settings(&config.viewer, &config.grid),
        grid_settings(&config.grid),
        viewport_size(&config.frontend),
    )
}
