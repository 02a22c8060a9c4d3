//! 反推售價
//!
//! 由每份 HPP 與選定的定價準則，代數反推毛售價，再計算稅、佣金與利潤。

use hpp_core::money::{is_valid_percent, percent_of, ratio_percent, HUNDRED};
use hpp_core::{HppError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{add, div, mul, sub};

/// 定價準則（每次只能選一個）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "criterion", content = "value", rename_all = "snake_case")]
pub enum PricingCriterion {
    /// 利潤佔淨銷售額的百分比
    ProfitPercentOfNetSales(Decimal),
    /// HPP 之上的固定利潤金額
    ProfitAmountOverHpp(Decimal),
    /// 利潤佔 HPP 的百分比
    ProfitPercentOfHpp(Decimal),
    /// 利潤為 HPP 的倍數
    ProfitMultipleOfHpp(Decimal),
    /// HPP 佔淨銷售額的最高百分比
    MaxHppPercentOfNetSales(Decimal),
    /// 淨銷售額為 HPP 的倍數
    NetSalesMultipleOfHpp(Decimal),
    /// 目標淨銷售額
    TargetNetSales(Decimal),
    /// 直接指定毛售價
    TargetGrossPrice(Decimal),
    /// 消費者含稅價
    ConsumerPriceInclTax(Decimal),
    /// 目標未稅淨價
    TargetNetPriceExclTax(Decimal),
}

impl PricingCriterion {
    /// 由準則名稱與參數建立；名稱未知或缺少參數皆為無效準則
    pub fn from_selection(name: &str, value: Option<Decimal>) -> Result<Self> {
        let build: fn(Decimal) -> Self = match name.trim() {
            "profit_percent_of_net_sales" | "min_profit_net_sales_persen" => {
                Self::ProfitPercentOfNetSales
            }
            "profit_amount_over_hpp" | "min_profit_rp_hpp" => Self::ProfitAmountOverHpp,
            "profit_percent_of_hpp" | "min_profit_persen_hpp" => Self::ProfitPercentOfHpp,
            "profit_multiple_of_hpp" | "min_profit_x_lipat_hpp" => Self::ProfitMultipleOfHpp,
            "max_hpp_percent_of_net_sales" | "max_hpp_net_sales_persen" => {
                Self::MaxHppPercentOfNetSales
            }
            "net_sales_multiple_of_hpp" | "target_net_sales_x_lipat_hpp" => {
                Self::NetSalesMultipleOfHpp
            }
            "target_net_sales" | "target_net_sales_rp" => Self::TargetNetSales,
            "target_gross_price" | "target_harga_jual_rp" => Self::TargetGrossPrice,
            "consumer_price_incl_tax" | "consumer_pays_including_tax_rp" => {
                Self::ConsumerPriceInclTax
            }
            "target_net_price_excl_tax" | "target_harga_jual_excl_tax_rp" => {
                Self::TargetNetPriceExclTax
            }
            "" => {
                return Err(HppError::InvalidCriterion("未選擇定價準則".to_string()));
            }
            other => {
                return Err(HppError::InvalidCriterion(format!("未知的定價準則: {}", other)));
            }
        };

        let value = value.ok_or_else(|| {
            HppError::InvalidCriterion(format!("定價準則 '{}' 缺少參數", name.trim()))
        })?;
        Ok(build(value))
    }

    /// 準則參數
    pub fn value(&self) -> Decimal {
        match *self {
            Self::ProfitPercentOfNetSales(v)
            | Self::ProfitAmountOverHpp(v)
            | Self::ProfitPercentOfHpp(v)
            | Self::ProfitMultipleOfHpp(v)
            | Self::MaxHppPercentOfNetSales(v)
            | Self::NetSalesMultipleOfHpp(v)
            | Self::TargetNetSales(v)
            | Self::TargetGrossPrice(v)
            | Self::ConsumerPriceInclTax(v)
            | Self::TargetNetPriceExclTax(v) => v,
        }
    }

    /// 存入售價快照的方法名稱
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::ProfitPercentOfNetSales(_) => "profit_percent_of_net_sales",
            Self::ProfitAmountOverHpp(_) => "profit_amount_over_hpp",
            Self::ProfitPercentOfHpp(_) => "profit_percent_of_hpp",
            Self::ProfitMultipleOfHpp(_) => "profit_multiple_of_hpp",
            Self::MaxHppPercentOfNetSales(_) => "max_hpp_percent_of_net_sales",
            Self::NetSalesMultipleOfHpp(_) => "net_sales_multiple_of_hpp",
            Self::TargetNetSales(_) => "target_net_sales",
            Self::TargetGrossPrice(_) => "target_gross_price",
            Self::ConsumerPriceInclTax(_) => "consumer_price_incl_tax",
            Self::TargetNetPriceExclTax(_) => "target_net_price_excl_tax",
        }
    }
}

/// 售價明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// 使用的每份 HPP
    pub hpp: Decimal,
    pub tax_percent: Decimal,
    pub commission_percent: Decimal,

    /// 實際使用的定價方法
    pub method: String,
    pub criterion_value: Decimal,

    pub gross_price: Decimal,
    pub commission_amount: Decimal,
    pub tax_amount: Decimal,

    /// 毛售價扣除佣金與稅
    pub net_price: Decimal,
    pub profit: Decimal,

    /// 利潤佔 HPP 的百分比（HPP 為 0 時為 0）
    pub profit_percent: Decimal,
}

impl PriceBreakdown {
    /// 由毛售價計算明細（與產生它的準則無關）
    pub fn from_gross(
        hpp: Decimal,
        tax_percent: Decimal,
        commission_percent: Decimal,
        gross_price: Decimal,
        criterion: &PricingCriterion,
    ) -> Result<Self> {
        let base = Self {
            hpp,
            tax_percent,
            commission_percent,
            method: criterion.method_name().to_string(),
            criterion_value: criterion.value(),
            gross_price: Decimal::ZERO,
            commission_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            net_price: Decimal::ZERO,
            profit: Decimal::ZERO,
            profit_percent: Decimal::ZERO,
        };
        base.with_gross(gross_price)
    }

    /// 將毛售價無條件進位到 `step` 的倍數並重算明細
    pub fn rounded_up_to(&self, step: Decimal) -> Result<Self> {
        if step <= Decimal::ZERO {
            return Err(HppError::InvalidCriterion(format!(
                "售價取整單位必須大於 0，目前為 {}",
                step
            )));
        }
        let steps = div(self.gross_price, step, "售價取整")?.ceil();
        self.with_gross(mul(steps, step, "售價取整")?)
    }

    fn with_gross(&self, gross_price: Decimal) -> Result<Self> {
        let commission_amount = percent_of(gross_price, self.commission_percent)?;
        let tax_amount = percent_of(gross_price, self.tax_percent)?;
        let net_price = sub(
            sub(gross_price, commission_amount, "淨價")?,
            tax_amount,
            "淨價",
        )?;
        let profit = sub(net_price, self.hpp, "利潤")?;
        let profit_percent = if self.hpp > Decimal::ZERO {
            ratio_percent(profit, self.hpp)?
        } else {
            Decimal::ZERO
        };

        Ok(Self {
            gross_price,
            commission_amount,
            tax_amount,
            net_price,
            profit,
            profit_percent,
            ..self.clone()
        })
    }
}

/// 售價反推器
pub struct PricingSolver;

impl PricingSolver {
    /// 扣除係數 = 1 − (佣金 + 稅) / 100
    pub fn deduction_factor(tax_percent: Decimal, commission_percent: Decimal) -> Result<Decimal> {
        if !is_valid_percent(tax_percent) {
            return Err(HppError::InvalidPercent(format!(
                "稅率必須介於 0 到 100，目前為 {}",
                tax_percent
            )));
        }
        if !is_valid_percent(commission_percent) {
            return Err(HppError::InvalidPercent(format!(
                "佣金比例必須介於 0 到 100，目前為 {}",
                commission_percent
            )));
        }

        let factor = Decimal::ONE - (commission_percent + tax_percent) / HUNDRED;
        if factor <= Decimal::ZERO {
            return Err(HppError::OverCommitted {
                commission_percent,
                tax_percent,
            });
        }
        Ok(factor)
    }

    /// 反推毛售價，回傳（毛售價, 方法名稱）
    pub fn solve_price(
        hpp_per_portion: Decimal,
        tax_percent: Decimal,
        commission_percent: Decimal,
        criterion: &PricingCriterion,
    ) -> Result<(Decimal, &'static str)> {
        let factor = Self::deduction_factor(tax_percent, commission_percent)?;
        let hpp = hpp_per_portion;

        let gross = match *criterion {
            PricingCriterion::ProfitPercentOfNetSales(p) => {
                let margin = p / HUNDRED;
                if margin >= Decimal::ONE {
                    return Err(HppError::InvalidCriterion(format!(
                        "利潤佔淨銷售額不得達到 100%，目前為 {}%",
                        p
                    )));
                }
                let net_sales_target = div(hpp, Decimal::ONE - margin, "目標淨銷售額")?;
                div(net_sales_target, factor, "毛售價")?
            }
            PricingCriterion::ProfitAmountOverHpp(amount) => {
                div(add(hpp, amount, "目標淨價")?, factor, "毛售價")?
            }
            PricingCriterion::ProfitPercentOfHpp(p) => {
                let target = mul(hpp, Decimal::ONE + p / HUNDRED, "目標淨價")?;
                div(target, factor, "毛售價")?
            }
            PricingCriterion::ProfitMultipleOfHpp(x) => {
                let target = mul(hpp, add(Decimal::ONE, x, "倍數")?, "目標淨價")?;
                div(target, factor, "毛售價")?
            }
            PricingCriterion::MaxHppPercentOfNetSales(p) => {
                if p <= Decimal::ZERO {
                    return Err(HppError::InvalidCriterion(format!(
                        "HPP 佔淨銷售額的上限必須大於 0，目前為 {}%",
                        p
                    )));
                }
                let net_sales_target = div(hpp, p / HUNDRED, "目標淨銷售額")?;
                div(net_sales_target, factor, "毛售價")?
            }
            PricingCriterion::NetSalesMultipleOfHpp(x) => {
                div(mul(hpp, x, "目標淨銷售額")?, factor, "毛售價")?
            }
            PricingCriterion::TargetNetSales(amount) => div(amount, factor, "毛售價")?,
            PricingCriterion::TargetGrossPrice(amount) => amount,
            PricingCriterion::ConsumerPriceInclTax(amount) => amount,
            PricingCriterion::TargetNetPriceExclTax(amount) => div(amount, factor, "毛售價")?,
        };

        if gross <= Decimal::ZERO {
            return Err(HppError::InvalidResult(format!(
                "以 {} 計算出的毛售價為 {}，必須大於 0",
                criterion.method_name(),
                gross
            )));
        }

        Ok((gross, criterion.method_name()))
    }

    /// 反推毛售價並計算完整明細
    pub fn quote(
        hpp_per_portion: Decimal,
        tax_percent: Decimal,
        commission_percent: Decimal,
        criterion: &PricingCriterion,
    ) -> Result<PriceBreakdown> {
        let (gross, method) =
            Self::solve_price(hpp_per_portion, tax_percent, commission_percent, criterion)?;
        tracing::debug!("定價方法 {}：HPP {} → 毛售價 {}", method, hpp_per_portion, gross);
        PriceBreakdown::from_gross(
            hpp_per_portion,
            tax_percent,
            commission_percent,
            gross,
            criterion,
        )
    }
}
