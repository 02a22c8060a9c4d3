//! 渠道促銷模擬示例

use hpp::hpp_core::Promotion;
use hpp::{OrderSimulation, PromotionSimulator};
use rust_decimal::Decimal;

fn main() -> anyhow::Result<()> {
    hpp::init_tracing("info");

    println!("=== 促銷訂單模擬示例 ===\n");

    let promotion = Promotion::percentage("GAJIAN", "Promo Gajian", Decimal::from(20))
        .with_channel("GoFood")
        .with_min_spend(Decimal::from(50000))
        .with_max_discount(Decimal::from(15000))
        .with_merchant_borne_percent(Decimal::from(50));

    for quantity in [1, 2, 4] {
        let simulation = OrderSimulation::new(
            Decimal::from(25000),
            Decimal::from(9500),
            Decimal::from(quantity),
        )
        .with_promotion(promotion.clone())
        .with_commission_percent(Decimal::from(20))
        .with_tax_percent(Decimal::from(10))
        .with_shipping_subsidy(Decimal::from(2000));

        let economics = PromotionSimulator::simulate(&simulation)?;
        println!("數量 {}:", quantity);
        println!("  銷售總額     {}", economics.gross_total);
        println!(
            "  促銷         {}（商家 {}，平台 {}）",
            if economics.promo_applied { "已套用" } else { "未達門檻" },
            economics.merchant_share,
            economics.channel_share
        );
        println!("  消費者支付   {}", economics.consumer_final_price);
        println!("  淨銷售額     {}", economics.net_sales);
        println!(
            "  毛利         {}（{}%）",
            economics.gross_profit, economics.gross_profit_to_net_sales_percent
        );
        println!();
    }

    Ok(())
}
