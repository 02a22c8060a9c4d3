//! 原料模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{HppError, Result};

/// 原料（採購資料）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// 原料ID
    pub id: String,

    /// 名稱（唯一）
    pub name: String,

    /// 分類
    pub category: String,

    /// 每次採購的價格
    pub purchase_price: Decimal,

    /// 採購單位
    pub purchase_unit: String,

    /// 每次採購實際可用的淨量（以使用單位計，已扣除損耗）
    pub net_quantity_per_purchase: Decimal,

    /// 使用單位
    pub usage_unit: String,

    /// 備註
    #[serde(default)]
    pub note: String,
}

impl Ingredient {
    /// 創建新的原料
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        purchase_price: Decimal,
        net_quantity_per_purchase: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            purchase_price,
            purchase_unit: String::new(),
            net_quantity_per_purchase,
            usage_unit: String::new(),
            note: String::new(),
        }
    }

    /// 建構器模式：設置分類
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// 建構器模式：設置採購單位與使用單位
    pub fn with_units(
        mut self,
        purchase_unit: impl Into<String>,
        usage_unit: impl Into<String>,
    ) -> Self {
        self.purchase_unit = purchase_unit.into();
        self.usage_unit = usage_unit.into();
        self
    }

    /// 建構器模式：設置備註
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// 每個使用單位的成本 = 採購價 ÷ 淨量
    pub fn unit_cost(&self) -> Result<Decimal> {
        if self.net_quantity_per_purchase <= Decimal::ZERO {
            return Err(HppError::InvalidIngredient(format!(
                "原料 '{}'（ID: {}）的每次採購淨量必須大於 0，目前為 {}",
                self.name, self.id, self.net_quantity_per_purchase
            )));
        }
        if self.purchase_price < Decimal::ZERO {
            return Err(HppError::InvalidIngredient(format!(
                "原料 '{}'（ID: {}）的採購價不得為負數，目前為 {}",
                self.name, self.id, self.purchase_price
            )));
        }
        self.purchase_price
            .checked_div(self.net_quantity_per_purchase)
            .ok_or_else(|| {
                HppError::InvalidIngredient(format!("原料 '{}' 的單位成本溢位", self.name))
            })
    }
}
