//! HPP 主計算器

use chrono::Utc;
use hpp_cache::MasterDataCache;
use hpp_core::money::round_to;
use hpp_core::{
    CostSnapshot, EngineConfig, EntityKind, HppError, MasterDataStore, PriceSnapshot, Result,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::pricing::{PriceBreakdown, PricingCriterion, PricingSolver};
use crate::promotion::{OrderEconomics, OrderSimulation, PromotionSimulator};
use crate::report::CostReport;
use crate::resolver::CostResolver;

/// 售價計算請求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub recipe_id: String,
    pub product_name: String,
    pub channel: String,

    /// 產品包含的份數（僅記錄）
    #[serde(default = "default_portions")]
    pub product_portions: Decimal,

    #[serde(flatten)]
    pub criterion: PricingCriterion,

    #[serde(default)]
    pub tax_percent: Decimal,
    #[serde(default)]
    pub commission_percent: Decimal,

    /// 毛售價無條件進位的單位（例如 500）
    #[serde(default)]
    pub round_up_to: Option<Decimal>,
}

fn default_portions() -> Decimal {
    Decimal::ONE
}

impl PriceRequest {
    pub fn new(
        recipe_id: impl Into<String>,
        product_name: impl Into<String>,
        channel: impl Into<String>,
        criterion: PricingCriterion,
    ) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            product_name: product_name.into(),
            channel: channel.into(),
            product_portions: Decimal::ONE,
            criterion,
            tax_percent: Decimal::ZERO,
            commission_percent: Decimal::ZERO,
            round_up_to: None,
        }
    }

    pub fn with_tax_percent(mut self, percent: Decimal) -> Self {
        self.tax_percent = percent;
        self
    }

    pub fn with_commission_percent(mut self, percent: Decimal) -> Self {
        self.commission_percent = percent;
        self
    }

    pub fn with_product_portions(mut self, portions: Decimal) -> Self {
        self.product_portions = portions;
        self
    }

    pub fn with_round_up_to(mut self, step: Decimal) -> Self {
        self.round_up_to = Some(step);
        self
    }
}

/// 訂單模擬請求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub gross_unit_price: Decimal,
    pub hpp_unit_price: Decimal,
    pub quantity: Decimal,
    #[serde(default)]
    pub promotion_id: Option<String>,
    #[serde(default)]
    pub tax_percent: Decimal,
    #[serde(default)]
    pub commission_percent: Decimal,
    #[serde(default)]
    pub shipping_subsidy_enabled: bool,
    #[serde(default)]
    pub shipping_subsidy_amount: Decimal,
}

impl SimulationRequest {
    pub fn new(gross_unit_price: Decimal, hpp_unit_price: Decimal, quantity: Decimal) -> Self {
        Self {
            gross_unit_price,
            hpp_unit_price,
            quantity,
            promotion_id: None,
            tax_percent: Decimal::ZERO,
            commission_percent: Decimal::ZERO,
            shipping_subsidy_enabled: false,
            shipping_subsidy_amount: Decimal::ZERO,
        }
    }

    pub fn with_promotion_id(mut self, promotion_id: impl Into<String>) -> Self {
        self.promotion_id = Some(promotion_id.into());
        self
    }

    pub fn with_tax_percent(mut self, percent: Decimal) -> Self {
        self.tax_percent = percent;
        self
    }

    pub fn with_commission_percent(mut self, percent: Decimal) -> Self {
        self.commission_percent = percent;
        self
    }

    pub fn with_shipping_subsidy(mut self, amount: Decimal) -> Self {
        self.shipping_subsidy_enabled = true;
        self.shipping_subsidy_amount = amount;
        self
    }
}

/// HPP 計算器
pub struct HppCalculator {
    /// 行程共用的主資料快取
    cache: Arc<MasterDataCache>,

    /// 持久化層
    store: Arc<dyn MasterDataStore>,

    config: EngineConfig,
}

impl HppCalculator {
    /// 創建新的 HPP 計算器
    pub fn new(
        cache: Arc<MasterDataCache>,
        store: Arc<dyn MasterDataStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            cache,
            store,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<MasterDataCache> {
        &self.cache
    }

    /// 以目前快照建立解析器
    pub fn resolver(&self) -> CostResolver {
        CostResolver::new(self.cache.snapshot())
    }

    /// 計算配方成本並寫入成本快照
    ///
    /// 與最新快照差異小於容差時不寫入，直接回傳既有快照。
    pub fn calculate_cost(&self, recipe_id: &str) -> Result<CostSnapshot> {
        tracing::info!("開始計算配方成本: {}", recipe_id);
        let start_time = std::time::Instant::now();

        // Step 1: 視需要重新載入快取
        self.refresh_cache()?;

        // Step 2: 解析成本
        let resolution = self.resolver().resolve(recipe_id)?;
        let hpp_per_unit = round_to(resolution.batch_cost, self.config.cost_scale);
        let hpp_per_portion = round_to(resolution.per_portion_cost, self.config.cost_scale);

        // Step 3: 去重
        if let Some(latest) = self.store.find_latest_cost_snapshot(recipe_id)? {
            let tolerance = self.config.dedup_tolerance;
            if latest.is_effectively_same(hpp_per_unit, hpp_per_portion, tolerance) {
                tracing::info!(
                    "配方 {} 成本未變動（{}），沿用快照 {}",
                    recipe_id,
                    latest.hpp_per_portion,
                    latest.id
                );
                return Ok(latest);
            }
        }

        // Step 4: 寫入新快照
        let snapshot = CostSnapshot::new(
            resolution.recipe_id,
            resolution.recipe_name,
            hpp_per_unit,
            hpp_per_portion,
        );
        self.store.save_cost_snapshot(&snapshot)?;

        tracing::info!(
            "配方 {} 成本計算完成：每批 {}，每份 {}，耗時 {:?}",
            recipe_id,
            snapshot.hpp_per_unit,
            snapshot.hpp_per_portion,
            start_time.elapsed()
        );

        Ok(snapshot)
    }

    /// 反推售價並寫入售價快照
    ///
    /// 同一（配方、產品名稱、渠道）已有快照時覆寫該筆，保留 ID 與創建時間。
    pub fn calculate_price(&self, request: &PriceRequest) -> Result<PriceSnapshot> {
        let existing = self.store.find_price_snapshot_by_key(
            &request.recipe_id,
            &request.product_name,
            &request.channel,
        )?;
        let (id, created_at) = match &existing {
            Some(existing) => {
                tracing::debug!("沿用既有售價快照 {}", existing.id);
                (existing.id, Some(existing.created_at))
            }
            None => (Uuid::new_v4(), None),
        };

        let snapshot = self.price_snapshot(id, created_at, request)?;
        self.store.save_price_snapshot(&snapshot)?;

        tracing::info!(
            "產品 '{}'（{}）售價 {}，方法 {}",
            snapshot.product_name,
            snapshot.channel,
            snapshot.gross_price,
            snapshot.method
        );
        Ok(snapshot)
    }

    /// 重新計算既有售價快照（保留 ID 與創建時間）
    ///
    /// 改名或換渠道時，新的鍵不得與其他快照重複。
    pub fn recalculate_price(
        &self,
        snapshot_id: Uuid,
        request: &PriceRequest,
    ) -> Result<PriceSnapshot> {
        let existing = self
            .store
            .find_price_snapshot(snapshot_id)?
            .ok_or_else(|| {
                HppError::not_found(EntityKind::PriceSnapshot, snapshot_id.to_string())
            })?;

        let key = (
            request.recipe_id.as_str(),
            request.product_name.as_str(),
            request.channel.as_str(),
        );
        if existing.key() != key {
            let (recipe_id, product_name, channel) = key;
            let other = self
                .store
                .find_price_snapshot_by_key(recipe_id, product_name, channel)?;
            if let Some(other) = other.filter(|other| other.id != existing.id) {
                return Err(HppError::Duplicate {
                    kind: EntityKind::PriceSnapshot,
                    key: format!("{} / {} / {}（{}）", recipe_id, product_name, channel, other.id),
                });
            }
        }

        let snapshot = self.price_snapshot(existing.id, Some(existing.created_at), request)?;
        self.store.save_price_snapshot(&snapshot)?;

        tracing::info!(
            "售價快照 {} 已重新計算：{} -> {}",
            snapshot.id,
            existing.gross_price,
            snapshot.gross_price
        );
        Ok(snapshot)
    }

    /// 模擬一筆促銷訂單
    pub fn simulate_order(&self, request: &SimulationRequest) -> Result<OrderEconomics> {
        let mut simulation = OrderSimulation::new(
            request.gross_unit_price,
            request.hpp_unit_price,
            request.quantity,
        )
        .with_tax_percent(request.tax_percent)
        .with_commission_percent(request.commission_percent)
        .with_scales(
            self.config.cost_scale,
            self.config.currency_scale,
            self.config.percent_scale,
        );

        if request.shipping_subsidy_enabled {
            simulation = simulation.with_shipping_subsidy(request.shipping_subsidy_amount);
        }

        if let Some(promotion_id) = &request.promotion_id {
            let promotion = self
                .store
                .find_promotion(promotion_id)?
                .ok_or_else(|| HppError::not_found(EntityKind::Promotion, promotion_id.as_str()))?;
            simulation = simulation.with_promotion(promotion);
        }

        PromotionSimulator::simulate(&simulation)
    }

    /// 成本總覽
    pub fn cost_report(&self) -> Result<CostReport> {
        self.refresh_cache()?;
        let report = CostReport::build(&self.cache.snapshot(), self.config.top_recipes_limit);
        tracing::info!(
            "成本總覽：原料 {} 筆，配方 {} 筆，失敗 {} 筆",
            report.ingredient_count,
            report.recipe_count,
            report.failures.len()
        );
        Ok(report)
    }

    fn refresh_cache(&self) -> Result<()> {
        if self.config.reload_before_costing {
            self.cache.reload(self.store.as_ref())?;
        } else {
            self.cache.reload_if_dirty(self.store.as_ref())?;
        }
        Ok(())
    }

    /// 取得每份 HPP：最新快照優先，沒有時先計算
    fn hpp_per_portion(&self, recipe_id: &str) -> Result<CostSnapshot> {
        match self.store.find_latest_cost_snapshot(recipe_id)? {
            Some(snapshot) => Ok(snapshot),
            None => {
                tracing::debug!("配方 {} 尚無成本快照，先行計算", recipe_id);
                self.calculate_cost(recipe_id)
            }
        }
    }

    fn price_snapshot(
        &self,
        id: Uuid,
        created_at: Option<chrono::DateTime<Utc>>,
        request: &PriceRequest,
    ) -> Result<PriceSnapshot> {
        if request.product_portions <= Decimal::ZERO {
            return Err(HppError::InvalidQuantity(format!(
                "產品份數必須大於 0，目前為 {}",
                request.product_portions
            )));
        }

        let cost = self.hpp_per_portion(&request.recipe_id)?;
        let mut breakdown = PricingSolver::quote(
            cost.hpp_per_portion,
            request.tax_percent,
            request.commission_percent,
            &request.criterion,
        )?;
        if let Some(step) = request.round_up_to {
            breakdown = breakdown.rounded_up_to(step)?;
        }

        let now = Utc::now();
        Ok(self.persistable(id, created_at.unwrap_or(now), now, request, &breakdown))
    }

    fn persistable(
        &self,
        id: Uuid,
        created_at: chrono::DateTime<Utc>,
        updated_at: chrono::DateTime<Utc>,
        request: &PriceRequest,
        breakdown: &PriceBreakdown,
    ) -> PriceSnapshot {
        let amount = |value: Decimal| round_to(value, self.config.cost_scale);
        let percent = |value: Decimal| round_to(value, self.config.percent_scale);

        PriceSnapshot {
            id,
            recipe_id: request.recipe_id.clone(),
            product_name: request.product_name.clone(),
            channel: request.channel.clone(),
            hpp: amount(breakdown.hpp),
            product_portions: request.product_portions,
            method: breakdown.method.clone(),
            criterion_value: breakdown.criterion_value,
            tax_percent: percent(breakdown.tax_percent),
            commission_percent: percent(breakdown.commission_percent),
            gross_price: amount(breakdown.gross_price),
            net_price: amount(breakdown.net_price),
            tax_amount: amount(breakdown.tax_amount),
            commission_amount: amount(breakdown.commission_amount),
            profit: amount(breakdown.profit),
            profit_percent: percent(breakdown.profit_percent),
            created_at,
            updated_at,
        }
    }
}
