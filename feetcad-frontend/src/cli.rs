use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Instant;

use feetcad_config::AppConfig;
use feetcad_core::geometry::{BoundingBox, Point2};
use feetcad_engine::input::{InputHandler, Key, Modifiers, MouseButton, ViewerEvent};
use feetcad_engine::viewer::Viewer;
use tracing::{info, warn};

use crate::errors::FrontendError;
use crate::loader::{
    LoadedScheme, SchemeSource, load_scheme_from_config_or_demo, load_scheme_or_demo,
};
use crate::settings::build_viewer;

/// 简易 CLI 演示：加载方案（失败则回退到内置示例），用合成输入驱动查看器并打印结果。
/// `scheme_override` 来自命令行，优先于环境变量与配置。
pub fn run_demo(config: &AppConfig, scheme_override: Option<PathBuf>) -> Result<(), FrontendError> {
    let loaded = match scheme_override {
        Some(path) => load_scheme_or_demo(Some(path)),
        None => load_scheme_from_config_or_demo(config),
    };
    let report = demo_report(config, loaded)?;
    print!("{report}");
    Ok(())
}

fn format_bounds(bounds: &BoundingBox) -> String {
    if bounds.is_empty() {
        return "空".to_string();
    }
    format!(
        "({:.2}, {:.2}) - ({:.2}, {:.2})",
        bounds.min().x(),
        bounds.min().y(),
        bounds.max().x(),
        bounds.max().y()
    )
}

fn write_camera(out: &mut String, title: &str, viewer: &Viewer) {
    let camera = viewer.camera();
    let _ = writeln!(
        out,
        "{title}: 中心=({:.2}, {:.2}), 缩放={:.3}",
        camera.position.x(),
        camera.position.y(),
        camera.zoom
    );
}

fn write_grid(out: &mut String, viewer: &Viewer) {
    let grid = viewer.grid();
    let counts: Vec<String> = grid
        .tier_counts()
        .iter()
        .map(|(tier, count)| format!("{tier:?}={count}"))
        .collect();
    let _ = writeln!(
        out,
        "网格: 可见={}, 层级倍数={}, 锚点=({:.2}, {:.2}), 线条 {}",
        grid.is_visible(),
        grid.zoom_factor(),
        grid.anchor().x(),
        grid.anchor().y(),
        counts.join(", ")
    );
}

/// 生成演示报告。单独拆出便于测试。
pub fn demo_report(config: &AppConfig, loaded: LoadedScheme) -> Result<String, FrontendError> {
    let mut viewer = build_viewer(config);
    viewer.load_scheme(loaded.scheme);
    let mut input = InputHandler::new(viewer.settings().double_click);

    let mut out = String::new();
    let _ = writeln!(out, "Rust 版 FEETCAD CLI 演示");
    match &loaded.source {
        SchemeSource::File(path) => {
            let _ = writeln!(out, "已从文件加载方案：{}", path.display());
        }
        SchemeSource::Demo => {
            let _ = writeln!(out, "已构建内置示例方案");
        }
    }

    let mut commands: Vec<&str> = input.bus().available_commands().copied().collect();
    commands.sort_unstable();
    let _ = writeln!(out, "支持的命令: {}", commands.join(", "));

    let resolved = viewer.resolved();
    info!(
        components = resolved.len(),
        shapes = resolved.shapes().count(),
        "CLI 演示方案统计"
    );
    let _ = writeln!(
        out,
        "元件 {} 个, 放大倍数 {}, 全局包围盒 {}",
        resolved.len(),
        resolved.magnifier(),
        format_bounds(&resolved.bounds())
    );
    for component in viewer.scheme().components() {
        let bounds = resolved
            .local_bounds(component.id)
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  - #{} {} 原点=({:.2}, {:.2}) 图形 {} 个 标签 {} 个 包围盒 {}",
            component.id.get(),
            component.name,
            component.origin.x(),
            component.origin.y(),
            component.shapes.len(),
            component.labels.len(),
            format_bounds(&bounds)
        );
    }

    write_camera(&mut out, "视图", &viewer);
    write_grid(&mut out, &viewer);

    let center = Point2::new(viewer.viewport().x() / 2.0, viewer.viewport().y() / 2.0);
    input.handle(&mut viewer, ViewerEvent::PointerMoved(center));
    let hovered: Vec<String> = viewer
        .selection()
        .highlighted()
        .iter()
        .map(|id| id.get().to_string())
        .collect();
    if hovered.is_empty() {
        let _ = writeln!(out, "屏幕中心下没有元件。");
    } else {
        let _ = writeln!(out, "屏幕中心下的元件 ID：{}", hovered.join(", "));
    }

    if viewer.selection().single().is_none() {
        let _ = writeln!(out, "高亮不是单个元件，跳过宏编辑演示。");
        return Ok(out);
    }

    // 左键双击进入宏编辑
    let now = Instant::now();
    for at in [now, now + viewer.settings().double_click / 2] {
        let event = ViewerEvent::ButtonPressed {
            button: MouseButton::Left,
            position: center,
            at,
        };
        if let Some(response) = input.handle(&mut viewer, event) {
            if !response.success {
                warn!(message = ?response.message, "进入宏编辑失败");
            }
        }
    }
    let Some(context) = viewer.macro_edit().copied() else {
        let _ = writeln!(out, "未能进入宏编辑。");
        return Ok(out);
    };
    let _ = writeln!(
        out,
        "宏编辑元件 #{}，局部包围盒 {}",
        context.component().get(),
        format_bounds(&context.bounds())
    );
    write_camera(&mut out, "宏编辑视图", &viewer);
    write_grid(&mut out, &viewer);

    input.handle(
        &mut viewer,
        ViewerEvent::KeyPressed {
            key: Key::Escape,
            modifiers: Modifiers::NONE,
        },
    );
    let _ = writeln!(out, "已退出宏编辑");
    write_camera(&mut out, "视图", &viewer);

    // 空方案或零尺寸时重置视图会返回错误，演示中作为失败上报
    viewer.reset_view()?;
    Ok(out)
}
