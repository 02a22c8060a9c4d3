//! 主資料儲存介面
//!
//! 引擎只透過此介面讀取主資料與寫入快照，CRUD 與傳輸層不在本 crate 範圍內。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::{
    CostSnapshot, HppError, Ingredient, PriceSnapshot, Promotion, Recipe, Result,
};

/// 主資料儲存
pub trait MasterDataStore: Send + Sync {
    /// 讀取所有原料
    fn fetch_all_ingredients(&self) -> Result<Vec<Ingredient>>;

    /// 讀取所有配方（含組件）
    fn fetch_all_recipes(&self) -> Result<Vec<Recipe>>;

    /// 追加成本快照
    fn save_cost_snapshot(&self, snapshot: &CostSnapshot) -> Result<()>;

    /// 取得配方最新的成本快照
    fn find_latest_cost_snapshot(&self, recipe_id: &str) -> Result<Option<CostSnapshot>>;

    /// 寫入售價快照（同ID覆蓋）
    fn save_price_snapshot(&self, snapshot: &PriceSnapshot) -> Result<()>;

    /// 依ID取得售價快照
    fn find_price_snapshot(&self, id: Uuid) -> Result<Option<PriceSnapshot>>;

    /// 依（配方、產品名稱、渠道）取得售價快照
    fn find_price_snapshot_by_key(
        &self,
        recipe_id: &str,
        product_name: &str,
        channel: &str,
    ) -> Result<Option<PriceSnapshot>>;

    /// 依ID取得促銷活動
    fn find_promotion(&self, id: &str) -> Result<Option<Promotion>>;
}

#[derive(Debug, Default)]
struct StoreState {
    ingredients: Vec<Ingredient>,
    recipes: Vec<Recipe>,
    promotions: HashMap<String, Promotion>,
    cost_snapshots: Vec<CostSnapshot>,
    price_snapshots: Vec<PriceSnapshot>,
    unavailable: bool,
    cost_writes: usize,
    price_writes: usize,
}

/// 記憶體內儲存（測試與示例用）
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// 創建空的儲存
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：添加原料
    pub fn with_ingredient(self, ingredient: Ingredient) -> Self {
        self.upsert_ingredient(ingredient);
        self
    }

    /// 建構器模式：添加配方
    pub fn with_recipe(self, recipe: Recipe) -> Self {
        self.upsert_recipe(recipe);
        self
    }

    /// 建構器模式：添加促銷活動
    pub fn with_promotion(self, promotion: Promotion) -> Self {
        self.lock().promotions.insert(promotion.id.clone(), promotion);
        self
    }

    /// 新增或替換原料（模擬外部修改）
    pub fn upsert_ingredient(&self, ingredient: Ingredient) {
        let mut state = self.lock();
        state.ingredients.retain(|i| i.id != ingredient.id);
        state.ingredients.push(ingredient);
    }

    /// 新增或替換配方（模擬外部修改）
    pub fn upsert_recipe(&self, recipe: Recipe) {
        let mut state = self.lock();
        state.recipes.retain(|r| r.id != recipe.id);
        state.recipes.push(recipe);
    }

    /// 模擬儲存層中斷
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// 某配方的所有成本快照（依寫入順序）
    pub fn cost_snapshots(&self, recipe_id: &str) -> Vec<CostSnapshot> {
        self.lock()
            .cost_snapshots
            .iter()
            .filter(|s| s.recipe_id == recipe_id)
            .cloned()
            .collect()
    }

    /// 所有售價快照
    pub fn price_snapshots(&self) -> Vec<PriceSnapshot> {
        self.lock().price_snapshots.clone()
    }

    /// 成本快照寫入次數
    pub fn cost_write_count(&self) -> usize {
        self.lock().cost_writes
    }

    /// 售價快照寫入次數
    pub fn price_write_count(&self) -> usize {
        self.lock().price_writes
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn available(&self) -> Result<MutexGuard<'_, StoreState>> {
        let state = self.lock();
        if state.unavailable {
            return Err(HppError::StoreUnavailable("記憶體儲存已被設為不可用".to_string()));
        }
        Ok(state)
    }
}

impl MasterDataStore for InMemoryStore {
    fn fetch_all_ingredients(&self) -> Result<Vec<Ingredient>> {
        Ok(self.available()?.ingredients.clone())
    }

    fn fetch_all_recipes(&self) -> Result<Vec<Recipe>> {
        Ok(self.available()?.recipes.clone())
    }

    fn save_cost_snapshot(&self, snapshot: &CostSnapshot) -> Result<()> {
        let mut state = self.available()?;
        state.cost_snapshots.push(snapshot.clone());
        state.cost_writes += 1;
        Ok(())
    }

    fn find_latest_cost_snapshot(&self, recipe_id: &str) -> Result<Option<CostSnapshot>> {
        let state = self.available()?;
        // 時間相同時取較晚寫入者
        Ok(state
            .cost_snapshots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.recipe_id == recipe_id)
            .max_by_key(|(idx, s)| (s.created_at, *idx))
            .map(|(_, s)| s.clone()))
    }

    fn save_price_snapshot(&self, snapshot: &PriceSnapshot) -> Result<()> {
        let mut state = self.available()?;
        state.price_snapshots.retain(|s| s.id != snapshot.id);
        state.price_snapshots.push(snapshot.clone());
        state.price_writes += 1;
        Ok(())
    }

    fn find_price_snapshot(&self, id: Uuid) -> Result<Option<PriceSnapshot>> {
        let state = self.available()?;
        Ok(state.price_snapshots.iter().find(|s| s.id == id).cloned())
    }

    fn find_price_snapshot_by_key(
        &self,
        recipe_id: &str,
        product_name: &str,
        channel: &str,
    ) -> Result<Option<PriceSnapshot>> {
        let state = self.available()?;
        let key = (recipe_id, product_name, channel);
        Ok(state.price_snapshots.iter().find(|s| s.key() == key).cloned())
    }

    fn find_promotion(&self, id: &str) -> Result<Option<Promotion>> {
        Ok(self.available()?.promotions.get(id).cloned())
    }
}
