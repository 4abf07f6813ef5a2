use feetcad_core::scheme::ComponentId;

/// 高亮集合：保持插入顺序且不重复（点选结果按方案顺序写入）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    highlighted: Vec<ComponentId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn highlighted(&self) -> &[ComponentId] {
        &self.highlighted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.highlighted.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.highlighted.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.highlighted.contains(&id)
    }

    /// 恰好高亮一个元件时返回它。
    pub fn single(&self) -> Option<ComponentId> {
        match self.highlighted.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// 加入高亮集，返回是否新加入。
    pub fn insert(&mut self, id: ComponentId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.highlighted.push(id);
        true
    }

    /// 移出高亮集，返回之前是否处于高亮状态。
    pub fn remove(&mut self, id: ComponentId) -> bool {
        let before = self.highlighted.len();
        self.highlighted.retain(|current| *current != id);
        before != self.highlighted.len()
    }

    /// 用新结果整体替换高亮集（重复项只保留第一次出现），返回集合是否变化。
    pub fn replace<I>(&mut self, ids: I) -> bool
    where
        I: IntoIterator<Item = ComponentId>,
    {
        let mut next = SelectionState::new();
        for id in ids {
            next.insert(id);
        }
        if next == *self {
            return false;
        }
        *self = next;
        true
    }

    #[inline]
    pub fn clear(&mut self) {
        self.highlighted.clear();
    }
}
