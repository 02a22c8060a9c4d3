//! 促銷活動模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{percent_of, round_to};
use crate::Result;

/// 折扣類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// 百分比折扣（可設上限）
    #[serde(alias = "persentase")]
    Percentage,
    /// 固定金額折扣
    #[serde(alias = "nominal")]
    FlatAmount,
}

/// 渠道促銷活動
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    /// 促銷ID
    pub id: String,

    /// 名稱（唯一）
    pub name: String,

    /// 銷售渠道
    pub channel: String,

    /// 折扣類型
    pub discount_kind: DiscountKind,

    /// 折扣值（百分比或金額）
    pub discount_value: Decimal,

    /// 最低消費門檻
    #[serde(default)]
    pub min_spend: Decimal,

    /// 折扣上限（None 表示不設上限）
    #[serde(default)]
    pub max_discount: Option<Decimal>,

    /// 商家負擔的折扣比例（0–100，其餘由渠道負擔）
    #[serde(default)]
    pub merchant_borne_percent: Decimal,

    /// 備註
    #[serde(default)]
    pub note: String,
}

impl Promotion {
    /// 百分比折扣
    pub fn percentage(id: impl Into<String>, name: impl Into<String>, percent: Decimal) -> Self {
        Self::new(id, name, DiscountKind::Percentage, percent)
    }

    /// 固定金額折扣
    pub fn flat_amount(id: impl Into<String>, name: impl Into<String>, amount: Decimal) -> Self {
        Self::new(id, name, DiscountKind::FlatAmount, amount)
    }

    fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        discount_kind: DiscountKind,
        discount_value: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            channel: String::new(),
            discount_kind,
            discount_value,
            min_spend: Decimal::ZERO,
            max_discount: None,
            merchant_borne_percent: Decimal::ZERO,
            note: String::new(),
        }
    }

    /// 建構器模式：設置渠道
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// 建構器模式：設置最低消費
    pub fn with_min_spend(mut self, min_spend: Decimal) -> Self {
        self.min_spend = min_spend;
        self
    }

    /// 建構器模式：設置折扣上限
    pub fn with_max_discount(mut self, max_discount: Decimal) -> Self {
        self.max_discount = Some(max_discount);
        self
    }

    /// 建構器模式：設置商家負擔比例
    pub fn with_merchant_borne_percent(mut self, percent: Decimal) -> Self {
        self.merchant_borne_percent = percent;
        self
    }

    /// 建構器模式：設置備註
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// 訂單小計是否達到門檻
    pub fn qualifies(&self, subtotal: Decimal) -> bool {
        subtotal >= self.min_spend
    }

    /// 依小計計算折扣金額（未檢查門檻，未四捨五入）
    pub fn discount_for(&self, subtotal: Decimal) -> Result<Decimal> {
        match self.discount_kind {
            DiscountKind::Percentage => {
                let raw = percent_of(subtotal, self.discount_value)?;
                Ok(match self.max_discount {
                    Some(cap) => raw.min(cap),
                    None => raw,
                })
            }
            DiscountKind::FlatAmount => Ok(self.discount_value),
        }
    }

    /// 金額與百分比欄位四捨五入後的副本
    pub fn rounded(&self, currency_scale: u32, percent_scale: u32) -> Self {
        let value_scale = match self.discount_kind {
            DiscountKind::Percentage => percent_scale,
            DiscountKind::FlatAmount => currency_scale,
        };
        Self {
            discount_value: round_to(self.discount_value, value_scale),
            min_spend: round_to(self.min_spend, currency_scale),
            max_discount: self.max_discount.map(|cap| round_to(cap, currency_scale)),
            merchant_borne_percent: round_to(self.merchant_borne_percent, percent_scale),
            ..self.clone()
        }
    }
}
