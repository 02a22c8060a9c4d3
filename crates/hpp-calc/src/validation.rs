//! 寫入前驗證
//!
//! 在資料進入儲存層之前擋下無效的原料、促銷與會形成循環的配方。

use hpp_cache::MasterData;
use hpp_core::money::is_valid_percent;
use hpp_core::{ComponentKind, DiscountKind, HppError, Ingredient, Promotion, Recipe, Result};
use rust_decimal::Decimal;
use std::collections::HashSet;

/// 驗證原料
pub fn validate_ingredient(ingredient: &Ingredient) -> Result<()> {
    if ingredient.name.trim().is_empty() {
        return Err(HppError::InvalidIngredient(format!(
            "原料 '{}' 名稱不得為空",
            ingredient.id
        )));
    }
    ingredient.unit_cost().map(|_| ())
}

/// 驗證促銷活動
pub fn validate_promotion(promotion: &Promotion) -> Result<()> {
    let invalid = |reason: String| {
        Err(HppError::InvalidPromotion(format!(
            "促銷 '{}': {}",
            promotion.name, reason
        )))
    };

    match promotion.discount_kind {
        DiscountKind::Percentage => {
            let value = promotion.discount_value;
            if value <= Decimal::ZERO || !is_valid_percent(value) {
                return invalid(format!(
                    "折扣百分比必須介於 0（不含）到 100，目前為 {}",
                    promotion.discount_value
                ));
            }
        }
        DiscountKind::FlatAmount => {
            if promotion.discount_value < Decimal::ZERO {
                return invalid(format!("折扣金額不得為負數，目前為 {}", promotion.discount_value));
            }
        }
    }

    if promotion.min_spend < Decimal::ZERO {
        return invalid(format!("最低消費不得為負數，目前為 {}", promotion.min_spend));
    }
    if !is_valid_percent(promotion.merchant_borne_percent) {
        return invalid(format!(
            "商家分攤比例必須介於 0 到 100，目前為 {}",
            promotion.merchant_borne_percent
        ));
    }
    if let Some(cap) = promotion.max_discount {
        if cap < Decimal::ZERO {
            return invalid(format!("折扣上限不得為負數，目前為 {}", cap));
        }
    }
    Ok(())
}

/// 驗證配方並回傳正規化後的副本（份數 ≤ 0 時設為 1）
///
/// 以目前快照檢查引用是否存在，並確認以候選配方取代後不會形成循環。
pub fn validate_recipe(data: &MasterData, recipe: &Recipe) -> Result<Recipe> {
    for component in &recipe.components {
        if component.quantity <= Decimal::ZERO {
            return Err(HppError::InvalidQuantity(format!(
                "配方 '{}' 的組件 '{}' 用量必須大於 0，目前為 {}",
                recipe.name, component.target_id, component.quantity
            )));
        }

        match component.kind {
            ComponentKind::Ingredient => {
                data.ingredient(&component.target_id)?;
            }
            ComponentKind::Recipe if component.target_id == recipe.id => {
                return Err(HppError::CyclicComposition {
                    path: vec![recipe.id.clone(), recipe.id.clone()],
                });
            }
            ComponentKind::Recipe => {
                let target = data.recipe(&component.target_id)?;
                if !target.is_sub_recipe {
                    tracing::warn!(
                        "配方 '{}' 引用了未標記為子配方的 '{}'",
                        recipe.name,
                        target.name
                    );
                }
            }
        }
    }

    let mut visited = HashSet::new();
    for sub_id in recipe.sub_recipe_ids() {
        let mut path = vec![recipe.id.clone()];
        if reaches(data, recipe, sub_id, &mut path, &mut visited) {
            return Err(HppError::CyclicComposition { path });
        }
    }

    let mut normalized = recipe.clone();
    if !normalized.has_valid_portions() {
        tracing::debug!(
            "配方 '{}' 份數為 {}，正規化為 1",
            normalized.name,
            normalized.portions
        );
        normalized.portions = normalized.normalized_portions();
    }
    Ok(normalized)
}

/// 從 `current` 出發是否會走回候選配方；找到時 `path` 為完整循環路徑
fn reaches(
    data: &MasterData,
    candidate: &Recipe,
    current: &str,
    path: &mut Vec<String>,
    visited: &mut HashSet<String>,
) -> bool {
    path.push(current.to_string());
    if current == candidate.id {
        return true;
    }
    if !visited.insert(current.to_string()) {
        path.pop();
        return false;
    }

    // 快照中缺少的配方不在此處理
    if let Ok(recipe) = data.recipe(current) {
        for next in recipe.sub_recipe_ids() {
            if reaches(data, candidate, next, path, visited) {
                return true;
            }
        }
    }

    path.pop();
    false
}
