//! 与窗口系统无关的输入事件，以及把事件映射到查看器操作的绑定表。

use std::time::{Duration, Instant};

use feetcad_core::geometry::{Point2, Vector2};
use tracing::debug;

use crate::command::{CommandBus, CommandContext, CommandRequest, CommandResponse};
use crate::viewer::Viewer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
        alt: false,
    };
}

/// 屏幕坐标下的输入事件（原点在视口左下角）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEvent {
    PointerMoved(Point2),
    Drag {
        button: MouseButton,
        delta: Vector2,
    },
    Scroll {
        position: Point2,
        notches: f64,
    },
    ButtonPressed {
        button: MouseButton,
        position: Point2,
        at: Instant,
    },
    Resized(Vector2),
    KeyPressed {
        key: Key,
        modifiers: Modifiers,
    },
}

/// 双击判定：两次按下间隔小于 `window` 即为双击。
/// 判定成功后清空记录，三连击不会触发两次。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoubleClickGate {
    window: Duration,
    last: Option<Instant>,
}

impl DoubleClickGate {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    #[inline]
    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn press(&mut self, at: Instant) -> bool {
        let double = self
            .last
            .and_then(|last| at.checked_duration_since(last))
            .is_some_and(|elapsed| elapsed < self.window);
        self.last = if double { None } else { Some(at) };
        double
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// 输入绑定：
/// - 中键拖拽平移，滚轮以光标为锚缩放 `notches / zoom_step`
/// - 中键双击重置视图，左键双击进入宏编辑
/// - `Escape` 退出宏编辑，`Ctrl+G` 切换网格
pub struct InputHandler {
    bus: CommandBus,
    left: DoubleClickGate,
    middle: DoubleClickGate,
}

impl InputHandler {
    pub fn new(double_click: Duration) -> Self {
        Self::with_bus(CommandBus::new(), double_click)
    }

    pub fn with_bus(bus: CommandBus, double_click: Duration) -> Self {
        Self {
            bus,
            left: DoubleClickGate::new(double_click),
            middle: DoubleClickGate::new(double_click),
        }
    }

    pub fn bus(&self) -> &CommandBus {
        &self.bus
    }

    /// 处理单个事件。事件触发命令时返回命令结果。
    pub fn handle(&mut self, viewer: &mut Viewer, event: ViewerEvent) -> Option<CommandResponse> {
        match event {
            ViewerEvent::PointerMoved(position) => {
                viewer.pointer_moved(position);
                None
            }
            ViewerEvent::Drag {
                button: MouseButton::Middle,
                delta,
            } => {
                viewer.pan_by(delta);
                None
            }
            ViewerEvent::Drag { .. } => None,
            ViewerEvent::Scroll { position, notches } => {
                let zoom_step = viewer.settings().zoom_step;
                if zoom_step.is_finite() && zoom_step > 0.0 {
                    viewer.zoom_around(position, notches / zoom_step);
                }
                None
            }
            ViewerEvent::ButtonPressed { button, at, .. } => {
                let command = match button {
                    MouseButton::Middle if self.middle.press(at) => "reset_view",
                    MouseButton::Left if self.left.press(at) => "enter_macro_edit",
                    _ => return None,
                };
                Some(self.run(viewer, command))
            }
            ViewerEvent::Resized(size) => {
                viewer.resize(size);
                None
            }
            ViewerEvent::KeyPressed { key, modifiers } => match key {
                Key::Escape => Some(self.run(viewer, "exit_macro_edit")),
                Key::Char(c) if modifiers.ctrl && c.eq_ignore_ascii_case(&'g') => {
                    Some(self.run(viewer, "toggle_grid"))
                }
                Key::Char(_) => None,
            },
        }
    }

    fn run(&self, viewer: &mut Viewer, command: &str) -> CommandResponse {
        debug!(command, "输入触发命令");
        let mut context = CommandContext { viewer };
        self.bus
            .dispatch(&CommandRequest::named(command), &mut context)
    }
}

#[cfg(test)]
mod tests {
    use feetcad_core::color::Rgba;
    use feetcad_core::scheme::Scheme;

    use super::*;
    use crate::grid::GridSettings;
    use crate::macro_edit::MacroEditState;
    use crate::viewer::ViewerSettings;

    const WINDOW: Duration = Duration::from_millis(250);

    #[test]
    fn gate_detects_presses_inside_window() {
        let start = Instant::now();
        let mut gate = DoubleClickGate::new(WINDOW);
        assert!(!gate.press(start));
        assert!(gate.press(start + Duration::from_millis(100)));
        // 三连击的第三下重新开始计时
        assert!(!gate.press(start + Duration::from_millis(200)));
        assert!(gate.press(start + Duration::from_millis(300)));
    }

    #[test]
    fn gate_rejects_slow_or_out_of_order_presses() {
        let start = Instant::now();
        let mut gate = DoubleClickGate::new(WINDOW);
        assert!(!gate.press(start + Duration::from_millis(100)));
        assert!(!gate.press(start + Duration::from_millis(350)));
        assert!(!gate.press(start));

        gate.reset();
        assert!(!gate.press(start + Duration::from_millis(500)));
        assert!(!gate.press(start + Duration::from_millis(750)));
    }

    fn viewer() -> (Viewer, feetcad_core::scheme::ComponentId) {
        let mut scheme = Scheme::new();
        let id = scheme.add_component("R1", Point2::new(0.0, 0.0));
        scheme
            .component_mut(id)
            .expect("component")
            .add_rectangle(Point2::new(0.0, 0.0), Point2::new(40.0, 20.0), 1.0, Rgba::WHITE);
        let mut viewer = Viewer::new(
            ViewerSettings::default(),
            GridSettings::default(),
            Vector2::new(720.0, 480.0),
        );
        viewer.load_scheme(scheme);
        (viewer, id)
    }

    fn press(button: MouseButton, at: Instant) -> ViewerEvent {
        ViewerEvent::ButtonPressed {
            button,
            position: Point2::new(360.0, 240.0),
            at,
        }
    }

    #[test]
    fn middle_drag_pans_and_double_click_resets() {
        let (mut viewer, _) = viewer();
        let mut input = InputHandler::new(WINDOW);
        let fitted = viewer.camera();

        input.handle(
            &mut viewer,
            ViewerEvent::Drag {
                button: MouseButton::Left,
                delta: Vector2::new(50.0, 0.0),
            },
        );
        assert_eq!(viewer.camera(), fitted);

        input.handle(
            &mut viewer,
            ViewerEvent::Drag {
                button: MouseButton::Middle,
                delta: Vector2::new(50.0, 0.0),
            },
        );
        let expected = fitted.position.x() - 50.0 / fitted.zoom;
        assert!((viewer.camera().position.x() - expected).abs() < 1e-9);

        let start = Instant::now();
        assert!(input.handle(&mut viewer, press(MouseButton::Middle, start)).is_none());
        let response = input
            .handle(
                &mut viewer,
                press(MouseButton::Middle, start + Duration::from_millis(120)),
            )
            .expect("double click runs reset_view");
        assert!(response.success);
        assert_eq!(viewer.camera(), fitted);
    }

    #[test]
    fn scroll_zooms_by_notch_over_zoom_step() {
        let (mut viewer, _) = viewer();
        let mut input = InputHandler::new(WINDOW);
        let before = viewer.camera().zoom;
        let cursor = Point2::new(100.0, 100.0);
        let anchor = viewer.screen_to_world(cursor);

        input.handle(
            &mut viewer,
            ViewerEvent::Scroll {
                position: cursor,
                notches: 1.0,
            },
        );
        assert!((viewer.camera().zoom - before * 1.2).abs() < 1e-9);
        let after = viewer.screen_to_world(cursor);
        assert!((after.x() - anchor.x()).abs() < 1e-9);
        assert!((after.y() - anchor.y()).abs() < 1e-9);
    }

    #[test]
    fn left_double_click_enters_and_escape_exits_macro_edit() {
        let (mut viewer, id) = viewer();
        let mut input = InputHandler::new(WINDOW);
        let center = Point2::new(360.0, 240.0);
        input.handle(&mut viewer, ViewerEvent::PointerMoved(center));
        assert_eq!(viewer.selection().single(), Some(id));

        let start = Instant::now();
        input.handle(&mut viewer, press(MouseButton::Left, start));
        let response = input
            .handle(
                &mut viewer,
                press(MouseButton::Left, start + Duration::from_millis(50)),
            )
            .expect("double click");
        assert!(response.success);
        assert_eq!(viewer.macro_edit_state(), MacroEditState::MacroEditing(id));

        let response = input
            .handle(
                &mut viewer,
                ViewerEvent::KeyPressed {
                    key: Key::Escape,
                    modifiers: Modifiers::NONE,
                },
            )
            .expect("escape");
        assert!(response.success);
        assert_eq!(viewer.macro_edit_state(), MacroEditState::Normal);
    }

    #[test]
    fn ctrl_g_toggles_grid_and_resize_updates_viewport() {
        let (mut viewer, _) = viewer();
        let mut input = InputHandler::new(WINDOW);

        let plain = input.handle(
            &mut viewer,
            ViewerEvent::KeyPressed {
                key: Key::Char('g'),
                modifiers: Modifiers::NONE,
            },
        );
        assert!(plain.is_none());
        assert!(viewer.grid().is_visible());

        input.handle(
            &mut viewer,
            ViewerEvent::KeyPressed {
                key: Key::Char('G'),
                modifiers: Modifiers::CTRL,
            },
        );
        assert!(!viewer.grid().is_visible());

        input.handle(&mut viewer, ViewerEvent::Resized(Vector2::new(1024.0, 768.0)));
        assert_eq!(viewer.viewport(), Vector2::new(1024.0, 768.0));
    }
}
