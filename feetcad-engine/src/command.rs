use std::collections::HashMap;

use tracing::warn;

use crate::viewer::Viewer;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub viewer: &'a mut Viewer,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(ResetViewCommand);
        bus.register(ToggleGridCommand);
        bus.register(EnterMacroEditCommand);
        bus.register(ExitMacroEditCommand);
        bus.register(ClearSelectionCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

struct ResetViewCommand;

impl CommandHandler for ResetViewCommand {
    fn name(&self) -> &'static str {
        "reset_view"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        match context.viewer.reset_view() {
            Ok(()) => CommandResponse::ok("视图已适配当前作用域"),
            Err(err) => {
                warn!(%err, "重置视图失败");
                CommandResponse::err(err.to_string())
            }
        }
    }
}

struct ToggleGridCommand;

impl CommandHandler for ToggleGridCommand {
    fn name(&self) -> &'static str {
        "toggle_grid"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if context.viewer.toggle_grid() {
            CommandResponse::ok("网格已显示")
        } else {
            CommandResponse::ok("网格已隐藏")
        }
    }
}

struct EnterMacroEditCommand;

impl CommandHandler for EnterMacroEditCommand {
    fn name(&self) -> &'static str {
        "enter_macro_edit"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        match context.viewer.enter_macro_edit() {
            Ok(component) => CommandResponse::ok(format!("正在编辑元件 {}", component.get())),
            Err(err) => {
                warn!(%err, "无法进入宏编辑");
                CommandResponse::err(err.to_string())
            }
        }
    }
}

struct ExitMacroEditCommand;

impl CommandHandler for ExitMacroEditCommand {
    fn name(&self) -> &'static str {
        "exit_macro_edit"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if context.viewer.exit_macro_edit() {
            CommandResponse::ok("已退出宏编辑")
        } else {
            CommandResponse::err("当前不在宏编辑中")
        }
    }
}

struct ClearSelectionCommand;

impl CommandHandler for ClearSelectionCommand {
    fn name(&self) -> &'static str {
        "clear_selection"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        context.viewer.clear_selection();
        CommandResponse::ok("高亮已清空")
    }
}
