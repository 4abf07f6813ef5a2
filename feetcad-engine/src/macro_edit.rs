use feetcad_core::geometry::{BoundingBox, Point2};
use feetcad_core::scheme::ComponentId;

use crate::errors::EngineError;
use crate::resolver::ResolvedScheme;
use crate::selection::SelectionState;

/// 宏编辑状态机：普通模式或正在编辑某一个元件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacroEditState {
    #[default]
    Normal,
    MacroEditing(ComponentId),
}

impl MacroEditState {
    /// 当前参与适配与点选的目标元件。
    pub fn target(self) -> Option<ComponentId> {
        match self {
            MacroEditState::Normal => None,
            MacroEditState::MacroEditing(id) => Some(id),
        }
    }

    #[inline]
    pub fn is_editing(self) -> bool {
        matches!(self, MacroEditState::MacroEditing(_))
    }
}

/// 进入宏编辑时冻结的作用域：目标元件、网格锚点（`origin * magnifier`）与局部包围盒。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroEditContext {
    component: ComponentId,
    grid_anchor: Point2,
    bounds: BoundingBox,
}

impl MacroEditContext {
    /// 仅当恰好高亮一个元件时允许进入。
    pub fn enter(
        selection: &SelectionState,
        resolved: &ResolvedScheme,
    ) -> Result<Self, EngineError> {
        let component = selection
            .single()
            .ok_or(EngineError::NotSingleSelection {
                highlighted: selection.len(),
            })?;
        let scoped = resolved
            .component(component)
            .ok_or(EngineError::ComponentNotFound(component.get()))?;
        Ok(Self {
            component,
            grid_anchor: scoped.origin,
            bounds: scoped.bounds,
        })
    }

    #[inline]
    pub fn component(&self) -> ComponentId {
        self.component
    }

    #[inline]
    pub fn grid_anchor(&self) -> Point2 {
        self.grid_anchor
    }

    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    #[inline]
    pub fn state(&self) -> MacroEditState {
        MacroEditState::MacroEditing(self.component)
    }
}
