//! 成本與售價快照（持久化記錄）

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 成本快照（每個配方按時間追加）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSnapshot {
    /// 快照ID
    pub id: Uuid,

    /// 配方ID
    pub recipe_id: String,

    /// 配方名稱
    pub recipe_name: String,

    /// 每批 HPP
    pub hpp_per_unit: Decimal,

    /// 每份 HPP
    pub hpp_per_portion: Decimal,

    /// 建立時間
    pub created_at: DateTime<Utc>,
}

impl CostSnapshot {
    /// 創建新的成本快照
    pub fn new(
        recipe_id: impl Into<String>,
        recipe_name: impl Into<String>,
        hpp_per_unit: Decimal,
        hpp_per_portion: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipe_id: recipe_id.into(),
            recipe_name: recipe_name.into(),
            hpp_per_unit,
            hpp_per_portion,
            created_at: Utc::now(),
        }
    }

    /// 與另一組數值的差異是否都小於容差
    pub fn is_effectively_same(
        &self,
        hpp_per_unit: Decimal,
        hpp_per_portion: Decimal,
        tolerance: Decimal,
    ) -> bool {
        (self.hpp_per_unit - hpp_per_unit).abs() < tolerance
            && (self.hpp_per_portion - hpp_per_portion).abs() < tolerance
    }
}

/// 售價快照（每個配方 / 產品名稱 / 渠道一筆）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// 快照ID
    pub id: Uuid,

    /// 配方ID
    pub recipe_id: String,

    /// 產品名稱
    pub product_name: String,

    /// 銷售渠道
    pub channel: String,

    /// 使用的每份 HPP
    pub hpp: Decimal,

    /// 產品包含的份數
    pub product_portions: Decimal,

    /// 定價方法
    pub method: String,

    /// 定價準則參數
    pub criterion_value: Decimal,

    /// 稅率（%）
    pub tax_percent: Decimal,

    /// 渠道佣金（%）
    pub commission_percent: Decimal,

    /// 毛售價
    pub gross_price: Decimal,

    /// 淨售價（扣除稅與佣金）
    pub net_price: Decimal,

    /// 稅額
    pub tax_amount: Decimal,

    /// 佣金額
    pub commission_amount: Decimal,

    /// 利潤
    pub profit: Decimal,

    /// 利潤率（相對 HPP，%）
    pub profit_percent: Decimal,

    /// 建立時間
    pub created_at: DateTime<Utc>,

    /// 更新時間
    pub updated_at: DateTime<Utc>,
}

impl PriceSnapshot {
    /// 快照識別鍵（配方、產品名稱、渠道）
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.recipe_id, &self.product_name, &self.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_effectively_same_within_tolerance() {
        let snapshot = CostSnapshot::new("KUE", "Kue Lapis", dec!(12000.1234), dec!(1000.0103));

        assert!(snapshot.is_effectively_same(dec!(12000.1238), dec!(1000.0100), dec!(0.001)));
        assert!(!snapshot.is_effectively_same(dec!(12000.1250), dec!(1000.0103), dec!(0.001)));
        assert!(!snapshot.is_effectively_same(dec!(12000.1234), dec!(1000.0200), dec!(0.001)));
    }

    #[test]
    fn test_tolerance_is_strict() {
        let snapshot = CostSnapshot::new("KUE", "Kue Lapis", dec!(10), dec!(10));
        assert!(!snapshot.is_effectively_same(dec!(10.001), dec!(10), dec!(0.001)));
    }
}
