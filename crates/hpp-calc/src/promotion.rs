//! 促銷訂單模擬
//!
//! 計算順序固定，每一步先四捨五入再交給下一步，
//! 結果與持久化、顯示的數值逐位一致。

use hpp_core::money::{
    is_valid_percent, percent_of, ratio_percent, round_to, COST_SCALE, CURRENCY_SCALE,
    PERCENT_SCALE,
};
use hpp_core::{DiscountKind, HppError, Promotion, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{mul, sub};

/// 訂單模擬輸入
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSimulation {
    pub gross_unit_price: Decimal,
    pub hpp_unit_price: Decimal,
    pub quantity: Decimal,
    pub promotion: Option<Promotion>,
    pub tax_percent: Decimal,
    pub commission_percent: Decimal,
    pub shipping_subsidy_enabled: bool,
    pub shipping_subsidy_amount: Decimal,
    pub cost_scale: u32,
    pub currency_scale: u32,
    pub percent_scale: u32,
}

impl OrderSimulation {
    /// 創建無促銷、無扣除的模擬
    pub fn new(gross_unit_price: Decimal, hpp_unit_price: Decimal, quantity: Decimal) -> Self {
        Self {
            gross_unit_price,
            hpp_unit_price,
            quantity,
            promotion: None,
            tax_percent: Decimal::ZERO,
            commission_percent: Decimal::ZERO,
            shipping_subsidy_enabled: false,
            shipping_subsidy_amount: Decimal::ZERO,
            cost_scale: COST_SCALE,
            currency_scale: CURRENCY_SCALE,
            percent_scale: PERCENT_SCALE,
        }
    }

    pub fn with_promotion(mut self, promotion: Promotion) -> Self {
        self.promotion = Some(promotion);
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

    /// 啟用運費補貼
    pub fn with_shipping_subsidy(mut self, amount: Decimal) -> Self {
        self.shipping_subsidy_enabled = true;
        self.shipping_subsidy_amount = amount;
        self
    }

    /// 覆寫成本、金額、百分比的小數位數
    pub fn with_scales(mut self, cost: u32, currency: u32, percent: u32) -> Self {
        self.cost_scale = cost;
        self.currency_scale = currency;
        self.percent_scale = percent;
        self
    }

    fn cost(&self, value: Decimal) -> Decimal {
        round_to(value, self.cost_scale)
    }

    fn currency(&self, value: Decimal) -> Decimal {
        round_to(value, self.currency_scale)
    }

    fn percent(&self, value: Decimal) -> Decimal {
        round_to(value, self.percent_scale)
    }

    fn validate(&self) -> Result<()> {
        if self.quantity <= Decimal::ZERO {
            return Err(HppError::InvalidQuantity(format!(
                "訂單數量必須大於 0，目前為 {}",
                self.quantity
            )));
        }
        if self.gross_unit_price < Decimal::ZERO || self.hpp_unit_price < Decimal::ZERO {
            return Err(HppError::InvalidQuantity(format!(
                "單價不得為負數（售價 {}，HPP {}）",
                self.gross_unit_price, self.hpp_unit_price
            )));
        }
        if self.shipping_subsidy_enabled && self.shipping_subsidy_amount < Decimal::ZERO {
            return Err(HppError::InvalidQuantity(format!(
                "運費補貼不得為負數，目前為 {}",
                self.shipping_subsidy_amount
            )));
        }
        let percents = [("稅率", self.tax_percent), ("佣金比例", self.commission_percent)];
        for (label, percent) in percents {
            if !is_valid_percent(percent) {
                return Err(HppError::InvalidPercent(format!(
                    "{}必須介於 0 到 100，目前為 {}",
                    label, percent
                )));
            }
        }
        Ok(())
    }
}

/// 套用的促銷摘要（顯示用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionSummary {
    pub name: String,
    pub discount_kind: DiscountKind,
    pub discount_value: Decimal,
    pub min_spend: Decimal,
    pub max_discount: Option<Decimal>,
    pub merchant_borne_percent: Decimal,
}

impl From<&Promotion> for PromotionSummary {
    fn from(promotion: &Promotion) -> Self {
        Self {
            name: promotion.name.clone(),
            discount_kind: promotion.discount_kind,
            discount_value: promotion.discount_value,
            min_spend: promotion.min_spend,
            max_discount: promotion.max_discount,
            merchant_borne_percent: promotion.merchant_borne_percent,
        }
    }
}

/// 訂單經濟效益
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEconomics {
    pub quantity: Decimal,
    pub gross_unit_price: Decimal,
    pub hpp_unit_price: Decimal,

    pub hpp_total: Decimal,
    pub gross_total: Decimal,

    /// 有提供促銷時的摘要（不論是否達到門檻）
    pub promotion: Option<PromotionSummary>,
    pub promo_applied: bool,
    pub consumer_discount: Decimal,
    pub merchant_share: Decimal,
    pub channel_share: Decimal,
    pub consumer_final_price: Decimal,

    pub commission_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_subsidy: Decimal,

    pub pre_deduction_sales: Decimal,
    /// 可能為負
    pub net_sales: Decimal,
    pub gross_profit: Decimal,

    pub hpp_to_net_sales_percent: Decimal,
    pub gross_profit_to_net_sales_percent: Decimal,
}

/// 促銷模擬器
pub struct PromotionSimulator;

impl PromotionSimulator {
    /// 模擬一筆訂單
    pub fn simulate(simulation: &OrderSimulation) -> Result<OrderEconomics> {
        simulation.validate()?;
        let sim = simulation;

        let hpp_total = sim.cost(mul(sim.hpp_unit_price, sim.quantity, "HPP 總額")?);
        let gross_total = sim.cost(mul(sim.gross_unit_price, sim.quantity, "銷售總額")?);

        // 促銷參數先依顯示精度取整再參與計算
        let promotion = sim
            .promotion
            .as_ref()
            .map(|promotion| promotion.rounded(sim.currency_scale, sim.percent_scale));

        let (promo_applied, consumer_discount, merchant_share, channel_share) = match &promotion {
            Some(promotion) if promotion.qualifies(gross_total) => {
                let discount = promotion.discount_for(gross_total)?;
                let merchant = percent_of(discount, promotion.merchant_borne_percent)?;
                let channel = sub(discount, merchant, "平台分攤")?;
                (
                    true,
                    sim.currency(discount),
                    sim.currency(merchant),
                    sim.currency(channel),
                )
            }
            Some(promotion) => {
                tracing::debug!(
                    "訂單小計 {} 未達促銷 '{}' 門檻 {}",
                    gross_total,
                    promotion.name,
                    promotion.min_spend
                );
                (false, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
            }
            None => (false, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        };

        let consumer_final_price =
            sim.currency(sub(gross_total, consumer_discount, "消費者支付")?.max(Decimal::ZERO));

        let commission_amount = sim.currency(percent_of(gross_total, sim.commission_percent)?);
        let tax_amount = sim.currency(percent_of(gross_total, sim.tax_percent)?);

        let shipping_subsidy = if sim.shipping_subsidy_enabled {
            sim.currency(sim.shipping_subsidy_amount)
        } else {
            Decimal::ZERO
        };

        let pre_deduction_sales =
            sim.currency(sub(gross_total, merchant_share, "扣除前銷售額")?.max(Decimal::ZERO));
        let mut net_sales = pre_deduction_sales;
        for deduction in [commission_amount, tax_amount, shipping_subsidy] {
            net_sales = sub(net_sales, deduction, "淨銷售額")?;
        }
        let net_sales = sim.currency(net_sales);
        let gross_profit = sim.currency(sub(net_sales, hpp_total, "毛利")?);

        let hpp_to_net_sales_percent = sim.percent(ratio_percent(hpp_total, net_sales)?);
        let gross_profit_to_net_sales_percent =
            sim.percent(ratio_percent(gross_profit, net_sales)?);

        tracing::debug!(
            "訂單模擬：銷售 {}，折扣 {}，淨銷售 {}，毛利 {}",
            gross_total,
            consumer_discount,
            net_sales,
            gross_profit
        );

        Ok(OrderEconomics {
            quantity: sim.quantity,
            gross_unit_price: sim.gross_unit_price,
            hpp_unit_price: sim.hpp_unit_price,
            hpp_total,
            gross_total,
            promotion: promotion.as_ref().map(PromotionSummary::from),
            promo_applied,
            consumer_discount,
            merchant_share,
            channel_share,
            consumer_final_price,
            commission_amount,
            tax_amount,
            shipping_subsidy,
            pre_deduction_sales,
            net_sales,
            gross_profit,
            hpp_to_net_sales_percent,
            gross_profit_to_net_sales_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn flash_sale() -> Promotion {
        Promotion::percentage("FLASH", "Flash Sale", dec!(20))
            .with_max_discount(dec!(15000))
            .with_merchant_borne_percent(dec!(50))
    }

    #[test]
    fn test_capped_percentage_promotion() {
        let simulation = OrderSimulation::new(dec!(25000), dec!(10000), dec!(4))
            .with_promotion(flash_sale());
        let result = PromotionSimulator::simulate(&simulation).unwrap();

        assert_eq!(result.gross_total, dec!(100000));
        assert!(result.promo_applied);
        assert_eq!(result.consumer_discount, dec!(15000));
        assert_eq!(result.merchant_share, dec!(7500));
        assert_eq!(result.channel_share, dec!(7500));
        assert_eq!(result.consumer_final_price, dec!(85000));
        assert_eq!(result.pre_deduction_sales, dec!(92500));
        assert_eq!(result.net_sales, dec!(92500));
        assert_eq!(result.gross_profit, dec!(52500));
        assert_eq!(result.promotion.as_ref().map(|p| p.name.as_str()), Some("Flash Sale"));
    }

    #[test]
    fn test_full_deductions() {
        let simulation = OrderSimulation::new(dec!(50000), dec!(20000), dec!(2))
            .with_tax_percent(dec!(10))
            .with_commission_percent(dec!(20))
            .with_shipping_subsidy(dec!(5000));
        let result = PromotionSimulator::simulate(&simulation).unwrap();

        assert_eq!(result.commission_amount, dec!(20000));
        assert_eq!(result.tax_amount, dec!(10000));
        assert_eq!(result.shipping_subsidy, dec!(5000));
        assert_eq!(result.net_sales, dec!(65000));
        assert_eq!(result.gross_profit, dec!(25000));
        assert_eq!(result.hpp_to_net_sales_percent, dec!(61.54));
        assert_eq!(result.gross_profit_to_net_sales_percent, dec!(38.46));
    }

    #[test]
    fn test_threshold_not_met() {
        let promotion = Promotion::flat_amount("HEMAT", "Hemat", dec!(10000))
            .with_min_spend(dec!(200000))
            .with_merchant_borne_percent(dec!(100));
        let simulation =
            OrderSimulation::new(dec!(30000), dec!(12000), dec!(3)).with_promotion(promotion);
        let result = PromotionSimulator::simulate(&simulation).unwrap();

        assert!(!result.promo_applied);
        assert_eq!(result.consumer_discount, Decimal::ZERO);
        assert_eq!(result.merchant_share, Decimal::ZERO);
        assert_eq!(result.consumer_final_price, dec!(90000));
        assert!(result.promotion.is_some());
    }

    #[test]
    fn test_flat_discount_larger_than_order_floors_at_zero() {
        let promotion = Promotion::flat_amount("BIG", "Big", dec!(50000))
            .with_merchant_borne_percent(dec!(100));
        let simulation =
            OrderSimulation::new(dec!(10000), dec!(4000), dec!(1)).with_promotion(promotion);
        let result = PromotionSimulator::simulate(&simulation).unwrap();

        assert_eq!(result.consumer_final_price, Decimal::ZERO);
        assert_eq!(result.pre_deduction_sales, Decimal::ZERO);
        assert_eq!(result.net_sales, Decimal::ZERO);
    }

    #[test]
    fn test_zero_net_sales_ratios_are_zero() {
        // 佣金 60% + 稅 40% 剛好吃掉全部銷售額
        let simulation = OrderSimulation::new(dec!(10000), dec!(3000), dec!(1))
            .with_commission_percent(dec!(60))
            .with_tax_percent(dec!(40));
        let result = PromotionSimulator::simulate(&simulation).unwrap();

        assert_eq!(result.net_sales, Decimal::ZERO);
        assert_eq!(result.hpp_to_net_sales_percent, Decimal::ZERO);
        assert_eq!(result.gross_profit_to_net_sales_percent, Decimal::ZERO);
        assert_eq!(result.gross_profit, dec!(-3000));
    }

    #[test]
    fn test_negative_net_sales_is_not_floored() {
        let simulation = OrderSimulation::new(dec!(10000), dec!(3000), dec!(1))
            .with_commission_percent(dec!(50))
            .with_shipping_subsidy(dec!(8000));
        let result = PromotionSimulator::simulate(&simulation).unwrap();
        assert_eq!(result.net_sales, dec!(-3000));
    }

    #[test]
    fn test_uncapped_percentage() {
        let promotion = Promotion::percentage("HALF", "Half", dec!(50));
        let simulation =
            OrderSimulation::new(dec!(100000), dec!(0), dec!(1)).with_promotion(promotion);
        let result = PromotionSimulator::simulate(&simulation).unwrap();

        assert_eq!(result.consumer_discount, dec!(50000));
        // 商家不分攤
        assert_eq!(result.merchant_share, Decimal::ZERO);
        assert_eq!(result.channel_share, dec!(50000));
        assert_eq!(result.net_sales, dec!(100000));
    }

    #[rstest]
    #[case(Decimal::ZERO)]
    #[case(dec!(-2))]
    fn test_invalid_quantity(#[case] quantity: Decimal) {
        let simulation = OrderSimulation::new(dec!(10000), dec!(4000), quantity);
        assert!(matches!(
            PromotionSimulator::simulate(&simulation),
            Err(HppError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_invalid_percent() {
        let simulation =
            OrderSimulation::new(dec!(10000), dec!(4000), dec!(1)).with_tax_percent(dec!(120));
        assert!(matches!(
            PromotionSimulator::simulate(&simulation),
            Err(HppError::InvalidPercent(_))
        ));
    }

    #[test]
    fn test_huge_gross_with_commission_is_invalid_result() {
        let simulation = OrderSimulation::new(Decimal::MAX, dec!(0), dec!(1))
            .with_commission_percent(dec!(20));
        assert!(matches!(
            PromotionSimulator::simulate(&simulation),
            Err(HppError::InvalidResult(_))
        ));
    }

    #[test]
    fn test_huge_gross_with_promotion_is_invalid_result() {
        let promotion = Promotion::percentage("HALF", "Half", dec!(50));
        let simulation =
            OrderSimulation::new(Decimal::MAX, dec!(0), dec!(1)).with_promotion(promotion);
        assert!(matches!(
            PromotionSimulator::simulate(&simulation),
            Err(HppError::InvalidResult(_))
        ));
    }

    #[test]
    fn test_custom_currency_scale() {
        let simulation = OrderSimulation::new(dec!(12345.67), dec!(5000), dec!(1))
            .with_promotion(
                Promotion::percentage("P20", "Hemat 20%", dec!(20))
                    .with_merchant_borne_percent(dec!(50)),
            )
            .with_scales(4, 0, 2);
        let result = PromotionSimulator::simulate(&simulation).unwrap();

        assert_eq!(result.consumer_discount, dec!(2469));
        assert_eq!(result.merchant_share, dec!(1235));
        assert_eq!(result.consumer_final_price, dec!(9877));
    }

    #[test]
    fn test_promotion_terms_are_rounded_before_use() {
        // 12.345% 取整為 12.35%，門檻 99999.995 取整為 100000
        let promotion = Promotion::percentage("ODD", "Odd", dec!(12.345))
            .with_min_spend(dec!(99999.995))
            .with_merchant_borne_percent(dec!(33.335));
        let simulation =
            OrderSimulation::new(dec!(100000), dec!(0), dec!(1)).with_promotion(promotion);
        let result = PromotionSimulator::simulate(&simulation).unwrap();

        assert!(result.promo_applied);
        assert_eq!(result.consumer_discount, dec!(12350));
        // 12350 * 33.34% = 4117.49
        assert_eq!(result.merchant_share, dec!(4117.49));
        let summary = result.promotion.unwrap();
        assert_eq!(summary.discount_value, dec!(12.35));
        assert_eq!(summary.min_spend, dec!(100000.00));
        assert_eq!(summary.merchant_borne_percent, dec!(33.34));
    }
}
