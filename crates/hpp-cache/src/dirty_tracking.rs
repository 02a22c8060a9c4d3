//! 髒標記追蹤

use hpp_core::EntityKind;
use std::collections::HashSet;

/// 髒標記追蹤器
///
/// 記錄自上次載入後在儲存層被修改的實體，用來決定是否需要重新載入快取。
#[derive(Debug, Default)]
pub struct DirtyTracker {
    dirty_entities: HashSet<(EntityKind, String)>,
}

impl DirtyTracker {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記實體為髒
    pub fn mark_dirty(&mut self, kind: EntityKind, id: impl Into<String>) {
        self.dirty_entities.insert((kind, id.into()));
    }

    /// 是否有任何髒標記
    pub fn has_dirty(&self) -> bool {
        !self.dirty_entities.is_empty()
    }

    /// 取出所有髒標記並清空
    pub fn take(&mut self) -> HashSet<(EntityKind, String)> {
        std::mem::take(&mut self.dirty_entities)
    }

    /// 放回先前取出的髒標記（重新載入失敗時使用）
    pub fn restore(&mut self, entities: HashSet<(EntityKind, String)>) {
        self.dirty_entities.extend(entities);
    }

    /// 髒標記數量
    pub fn len(&self) -> usize {
        self.dirty_entities.len()
    }

    /// 是否沒有髒標記
    pub fn is_empty(&self) -> bool {
        self.dirty_entities.is_empty()
    }
}
