//! 成本總覽
//!
//! 平行解析快照內所有配方，列出每份成本最高的配方。

use chrono::{DateTime, Utc};
use hpp_cache::MasterData;
use hpp_core::money::round_cost;
use hpp_core::Recipe;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::resolver::{CostResolution, CostResolver};
use crate::CostWarning;

/// 單一配方的成本摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCostLine {
    pub recipe_id: String,
    pub recipe_name: String,
    pub batch_cost: Decimal,
    pub per_portion_cost: Decimal,
}

/// 無法解析的配方
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCostFailure {
    pub recipe_id: String,
    pub recipe_name: String,
    pub reason: String,
}

/// 成本總覽
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostReport {
    pub generated_at: DateTime<Utc>,
    pub ingredient_count: usize,
    pub recipe_count: usize,

    /// 每份成本由高到低
    pub top_recipes: Vec<RecipeCostLine>,
    pub failures: Vec<RecipeCostFailure>,

    #[serde(skip)]
    pub warnings: Vec<CostWarning>,
}

impl CostReport {
    /// 由快照建立總覽
    pub fn build(data: &Arc<MasterData>, limit: usize) -> Self {
        let recipes: Vec<&Recipe> = data.recipes().collect();

        // 每個配方一個解析器，記憶表互不共享
        let results: Vec<(&Recipe, hpp_core::Result<CostResolution>)> = recipes
            .par_iter()
            .map(|recipe| {
                let resolver = CostResolver::new(Arc::clone(data));
                (*recipe, resolver.resolve(&recipe.id))
            })
            .collect();

        let mut lines = Vec::new();
        let mut failures = Vec::new();
        let mut warnings = Vec::new();

        for (recipe, result) in results {
            match result {
                Ok(resolution) => {
                    warnings.extend(resolution.warnings);
                    if resolution.per_portion_cost > Decimal::ZERO {
                        lines.push(RecipeCostLine {
                            recipe_id: resolution.recipe_id,
                            recipe_name: resolution.recipe_name,
                            batch_cost: round_cost(resolution.batch_cost),
                            per_portion_cost: round_cost(resolution.per_portion_cost),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!("配方 '{}' 無法計算成本: {}", recipe.name, e);
                    warnings.push(CostWarning::error(recipe.id.clone(), e.to_string()));
                    failures.push(RecipeCostFailure {
                        recipe_id: recipe.id.clone(),
                        recipe_name: recipe.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        lines.sort_by(|a, b| {
            b.per_portion_cost
                .cmp(&a.per_portion_cost)
                .then_with(|| a.recipe_name.cmp(&b.recipe_name))
        });
        lines.truncate(limit);
        failures.sort_by(|a, b| a.recipe_id.cmp(&b.recipe_id));

        Self {
            generated_at: Utc::now(),
            ingredient_count: data.ingredient_count(),
            recipe_count: data.recipe_count(),
            top_recipes: lines,
            failures,
            warnings,
        }
    }
}
