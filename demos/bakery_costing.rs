//! 烘焙坊成本與定價示例

use hpp::hpp_core::{Ingredient, Recipe};
use hpp::{
    EngineConfig, HppCalculator, InMemoryStore, MasterDataCache, PriceRequest, PricingCriterion,
};
use rust_decimal::Decimal;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    hpp::init_tracing("info");

    println!("=== 烘焙坊 HPP 計算示例 ===\n");

    let store = Arc::new(
        InMemoryStore::new()
            .with_ingredient(
                Ingredient::new("FLOUR", "Tepung Terigu", Decimal::from(15000), Decimal::from(1000))
                    .with_category("Bahan Kering")
                    .with_units("kg", "gram"),
            )
            .with_ingredient(Ingredient::new(
                "SUGAR",
                "Gula Pasir",
                Decimal::from(18000),
                Decimal::from(1000),
            ))
            .with_ingredient(Ingredient::new(
                "BUTTER",
                "Mentega",
                Decimal::from(60000),
                Decimal::from(500),
            ))
            .with_ingredient(Ingredient::new(
                "EGG",
                "Telur",
                Decimal::from(30000),
                Decimal::from(15),
            ))
            .with_recipe(
                Recipe::new("DOUGH", "Adonan Dasar")
                    .as_sub_recipe()
                    .with_portions(Decimal::from(12))
                    .with_ingredient("FLOUR", Decimal::from(1000))
                    .with_ingredient("SUGAR", Decimal::from(150))
                    .with_ingredient("BUTTER", Decimal::from(100))
                    .with_ingredient("EGG", Decimal::from(3)),
            )
            .with_recipe(
                Recipe::new("CINNAMON_ROLL", "Cinnamon Roll")
                    .with_portions(Decimal::from(6))
                    .with_sub_recipe("DOUGH", Decimal::from(6))
                    .with_ingredient("SUGAR", Decimal::from(60))
                    .with_ingredient("BUTTER", Decimal::from(40)),
            ),
    );

    let config = EngineConfig::default();
    let cache = Arc::new(MasterDataCache::warm_up(store.as_ref())?);
    let calculator = HppCalculator::new(cache, store.clone(), config);

    let cost = calculator.calculate_cost("CINNAMON_ROLL")?;
    println!("配方: {}", cost.recipe_name);
    println!("  每批成本: {}", cost.hpp_per_unit);
    println!("  每份成本: {}", cost.hpp_per_portion);

    println!("\n定價（佣金 20%，稅 10%）:");
    let criteria = [
        PricingCriterion::ProfitPercentOfHpp(Decimal::from(60)),
        PricingCriterion::ProfitPercentOfNetSales(Decimal::from(35)),
        PricingCriterion::MaxHppPercentOfNetSales(Decimal::from(30)),
        PricingCriterion::TargetGrossPrice(Decimal::from(25000)),
    ];
    for criterion in criteria {
        let request = PriceRequest::new("CINNAMON_ROLL", "Cinnamon Roll", "GoFood", criterion)
            .with_commission_percent(Decimal::from(20))
            .with_tax_percent(Decimal::from(10))
            .with_round_up_to(Decimal::from(500));
        let price = calculator.calculate_price(&request)?;
        println!(
            "  - {:<30} 售價 {:>10}  淨價 {:>10}  利潤 {:>10} ({}%)",
            price.method, price.gross_price, price.net_price, price.profit, price.profit_percent
        );
    }

    let report = calculator.cost_report()?;
    println!("\n每份成本最高的配方:");
    for line in &report.top_recipes {
        println!("  - {}: {}", line.recipe_name, line.per_portion_cost);
    }

    Ok(())
}
