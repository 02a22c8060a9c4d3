//! 配方成本解析
//!
//! 以記憶化遞迴走訪配方組件圖，得出每批總成本與每份成本。
//! 記憶表與進行中集合都只屬於單次頂層呼叫。

use hpp_cache::MasterData;
use hpp_core::{ComponentKind, HppError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{add, div, mul, CostWarning};

/// 單一配方的成本解析結果
#[derive(Debug, Clone)]
pub struct CostResolution {
    pub recipe_id: String,
    pub recipe_name: String,

    /// 每批總成本
    pub batch_cost: Decimal,

    /// 每份成本
    pub per_portion_cost: Decimal,

    /// 實際用來除的份數（份數 ≤ 0 時為 1）
    pub portions: Decimal,

    pub warnings: Vec<CostWarning>,

    /// 本次呼叫實際計算過的配方數（不含記憶表命中）
    pub evaluated_recipes: usize,
}

/// 單次呼叫的解析狀態
#[derive(Debug, Default)]
struct ResolutionContext {
    memo: HashMap<String, Decimal>,
    in_progress: Vec<String>,
    warnings: Vec<CostWarning>,
    evaluated: usize,
}

/// 成本解析器
#[derive(Debug, Clone)]
pub struct CostResolver {
    data: Arc<MasterData>,
}

impl CostResolver {
    /// 以快取快照創建解析器
    pub fn new(data: Arc<MasterData>) -> Self {
        Self { data }
    }

    /// 計算配方每批總成本
    pub fn resolve_cost(&self, recipe_id: &str) -> Result<Decimal> {
        let mut ctx = ResolutionContext::default();
        self.resolve_batch(recipe_id, &mut ctx)
    }

    /// 計算配方成本（含每份成本與警告）
    pub fn resolve(&self, recipe_id: &str) -> Result<CostResolution> {
        let mut ctx = ResolutionContext::default();
        let batch_cost = self.resolve_batch(recipe_id, &mut ctx)?;
        let recipe = self.data.recipe(recipe_id)?;

        let (per_portion_cost, portions) = if recipe.has_valid_portions() {
            (
                div(batch_cost, recipe.portions, "每份成本")?,
                recipe.portions,
            )
        } else {
            tracing::warn!(
                "配方 '{}'（ID: {}）份數為 {}，每份成本等於每批總成本",
                recipe.name,
                recipe.id,
                recipe.portions
            );
            ctx.warnings.push(CostWarning::warning(
                recipe.id.clone(),
                format!("份數為 {}，每份成本以每批總成本計", recipe.portions),
            ));
            (batch_cost, Decimal::ONE)
        };

        tracing::debug!(
            "配方 {} 成本：每批 {}，每份 {}（計算 {} 個配方）",
            recipe_id,
            batch_cost,
            per_portion_cost,
            ctx.evaluated
        );

        Ok(CostResolution {
            recipe_id: recipe.id.clone(),
            recipe_name: recipe.name.clone(),
            batch_cost,
            per_portion_cost,
            portions,
            warnings: ctx.warnings,
            evaluated_recipes: ctx.evaluated,
        })
    }

    fn resolve_batch(&self, recipe_id: &str, ctx: &mut ResolutionContext) -> Result<Decimal> {
        if let Some(cost) = ctx.memo.get(recipe_id) {
            return Ok(*cost);
        }

        if let Some(start) = ctx.in_progress.iter().position(|id| id == recipe_id) {
            let mut path = ctx.in_progress[start..].to_vec();
            path.push(recipe_id.to_string());
            return Err(HppError::CyclicComposition { path });
        }

        let recipe = self.data.recipe(recipe_id)?;
        ctx.in_progress.push(recipe_id.to_string());

        if recipe.components.is_empty() {
            ctx.warnings.push(CostWarning::info(
                recipe.id.clone(),
                "配方沒有任何組件，成本為 0".to_string(),
            ));
        }

        let mut total = Decimal::ZERO;
        for component in &recipe.components {
            if component.quantity <= Decimal::ZERO {
                return Err(HppError::InvalidQuantity(format!(
                    "配方 '{}' 的組件 '{}' 用量必須大於 0，目前為 {}",
                    recipe.name, component.target_id, component.quantity
                )));
            }

            let component_cost = match component.kind {
                ComponentKind::Ingredient => {
                    self.data.ingredient(&component.target_id)?.unit_cost()?
                }
                ComponentKind::Recipe => {
                    let sub_total = self.resolve_batch(&component.target_id, ctx)?;
                    let sub_recipe = self.data.recipe(&component.target_id)?;
                    if sub_recipe.has_valid_portions() {
                        div(sub_total, sub_recipe.portions, "子配方每份成本")?
                    } else {
                        tracing::warn!(
                            "子配方 '{}'（ID: {}）份數為 {}，以整批成本作為單位成本",
                            sub_recipe.name,
                            sub_recipe.id,
                            sub_recipe.portions
                        );
                        ctx.warnings.push(CostWarning::warning(
                            sub_recipe.id.clone(),
                            format!(
                                "子配方份數為 {}，在 '{}' 中以整批成本計",
                                sub_recipe.portions, recipe.name
                            ),
                        ));
                        sub_total
                    }
                }
            };

            let line_cost = mul(component_cost, component.quantity, "組件成本")?;
            total = add(total, line_cost, "配方總成本")?;

            tracing::trace!(
                "{} <- {} {} x {} = {}",
                recipe_id,
                component.kind,
                component.target_id,
                component.quantity,
                line_cost
            );
        }

        ctx.in_progress.pop();
        ctx.memo.insert(recipe_id.to_string(), total);
        ctx.evaluated += 1;

        Ok(total)
    }
}
