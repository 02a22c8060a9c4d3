//! 主資料快取

use chrono::{DateTime, Utc};
use hpp_core::{
    ComponentKind, EntityKind, HppError, Ingredient, MasterDataStore, Recipe, Result,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::DirtyTracker;

/// 快取中的實體引用
#[derive(Debug, Clone, Copy)]
pub enum CachedEntity<'a> {
    Ingredient(&'a Ingredient),
    Recipe(&'a Recipe),
}

/// 主資料快照（不可變）
#[derive(Debug, Clone, Default)]
pub struct MasterData {
    ingredients: HashMap<String, Ingredient>,
    recipes: HashMap<String, Recipe>,
    loaded_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl MasterData {
    /// 由原料與配方列表建立快照（ID 重複時後者覆蓋前者）
    pub fn from_parts(ingredients: Vec<Ingredient>, recipes: Vec<Recipe>) -> Self {
        Self {
            ingredients: ingredients
                .into_iter()
                .map(|i| (i.id.clone(), i))
                .collect(),
            recipes: recipes.into_iter().map(|r| (r.id.clone(), r)).collect(),
            loaded_at: Some(Utc::now()),
            generation: 0,
        }
    }

    /// 從儲存層讀取完整快照
    pub fn load(store: &dyn MasterDataStore) -> Result<Self> {
        let ingredients = store.fetch_all_ingredients()?;
        let recipes = store.fetch_all_recipes()?;
        Ok(Self::from_parts(ingredients, recipes))
    }

    /// 依種類查詢
    pub fn lookup(&self, id: &str, kind: ComponentKind) -> Result<CachedEntity<'_>> {
        match kind {
            ComponentKind::Ingredient => self.ingredient(id).map(CachedEntity::Ingredient),
            ComponentKind::Recipe => self.recipe(id).map(CachedEntity::Recipe),
        }
    }

    /// 查詢原料
    pub fn ingredient(&self, id: &str) -> Result<&Ingredient> {
        self.ingredients
            .get(id)
            .ok_or_else(|| HppError::not_found(EntityKind::Ingredient, id))
    }

    /// 查詢配方
    pub fn recipe(&self, id: &str) -> Result<&Recipe> {
        self.recipes
            .get(id)
            .ok_or_else(|| HppError::not_found(EntityKind::Recipe, id))
    }

    /// 所有配方
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    pub fn ingredient_count(&self) -> usize {
        self.ingredients.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// 載入時間（空快取為 None）
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// 載入代次（0 表示從未由快取載入）
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// 行程共用的主資料快取
///
/// 讀取者持有 `Arc<MasterData>`，重新載入時先建立新快照再一次替換，
/// 進行中的成本計算不會看到半成品。重新載入彼此串行，
/// 較晚開始的載入一定較晚發佈。
#[derive(Debug, Default)]
pub struct MasterDataCache {
    current: RwLock<Arc<MasterData>>,
    dirty: Mutex<DirtyTracker>,
    reload_lock: Mutex<()>,
    generation: AtomicU64,
}

impl MasterDataCache {
    /// 創建空的快取
    pub fn new() -> Self {
        Self::default()
    }

    /// 創建並完成首次載入；失敗時應視為啟動失敗
    pub fn warm_up(store: &dyn MasterDataStore) -> Result<Self> {
        let cache = Self::new();
        if let Err(e) = cache.reload(store) {
            tracing::error!("主資料快取首次載入失敗: {}", e);
            return Err(e);
        }
        Ok(cache)
    }

    /// 取得目前快照
    pub fn snapshot(&self) -> Arc<MasterData> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// 從儲存層重新載入並原子替換
    ///
    /// 讀取失敗時保留舊快照與髒標記。
    pub fn reload(&self, store: &dyn MasterDataStore) -> Result<Arc<MasterData>> {
        // 取標記、讀取、發佈必須在同一把鎖內完成
        let _reloading = self
            .reload_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let pending = self.dirty().take();

        match MasterData::load(store) {
            Ok(data) => {
                tracing::info!(
                    "主資料快取已載入：原料 {} 筆，配方 {} 筆",
                    data.ingredient_count(),
                    data.recipe_count()
                );
                Ok(self.publish(data))
            }
            Err(e) => {
                tracing::warn!("主資料快取重新載入失敗，保留舊快照: {}", e);
                self.dirty().restore(pending);
                Err(e)
            }
        }
    }

    /// 有髒標記時才重新載入
    pub fn reload_if_dirty(&self, store: &dyn MasterDataStore) -> Result<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        tracing::debug!("偵測到 {} 筆髒標記，重新載入主資料", self.dirty().len());
        self.reload(store)?;
        Ok(true)
    }

    /// 標記外部修改的實體
    pub fn mark_dirty(&self, kind: EntityKind, id: impl Into<String>) {
        self.dirty().mark_dirty(kind, id);
    }

    /// 是否有待重新載入的修改
    pub fn is_dirty(&self) -> bool {
        self.dirty().has_dirty()
    }

    fn publish(&self, mut data: MasterData) -> Arc<MasterData> {
        data.generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let data = Arc::new(data);
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::clone(&data);
        data
    }

    fn dirty(&self) -> MutexGuard<'_, DirtyTracker> {
        self.dirty
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
