//! 集成測試

use hpp::hpp_calc::validation::validate_recipe;
use hpp::hpp_core::{CostSnapshot, EntityKind, Ingredient, Promotion, Recipe};
use hpp::{
    EngineConfig, HppCalculator, HppError, InMemoryStore, MasterDataCache, MasterDataStore,
    PriceRequest, PricingCriterion, SimulationRequest,
};
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use std::sync::Arc;

fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

fn d(value: i64) -> Decimal {
    Decimal::from(value)
}

/// 烘焙坊主資料
///
/// - BREAD（10 份）：麵粉 500g + 奶油 50g + 蛋 2 顆 = 17500
/// - SANDWICH（1 份）：BREAD 2 份 + 起司 20g = 3500 + 3600 = 7100
/// - PAKET（2 份）：SANDWICH 2 份 + 蛋 1 顆 = 14200 + 2000 = 16200
fn bakery_store() -> InMemoryStore {
    InMemoryStore::new()
        .with_ingredient(
            Ingredient::new("FLOUR", "Tepung Terigu", d(15000), d(1000)).with_units("kg", "gram"),
        )
        .with_ingredient(Ingredient::new("BUTTER", "Mentega", d(60000), d(500)))
        .with_ingredient(Ingredient::new("EGG", "Telur", d(30000), d(15)))
        .with_ingredient(Ingredient::new("CHEESE", "Keju", d(45000), d(250)))
        .with_recipe(
            Recipe::new("BREAD", "Roti Tawar")
                .as_sub_recipe()
                .with_portions(d(10))
                .with_ingredient("FLOUR", d(500))
                .with_ingredient("BUTTER", d(50))
                .with_ingredient("EGG", d(2)),
        )
        .with_recipe(
            Recipe::new("SANDWICH", "Sandwich Keju")
                .as_sub_recipe()
                .with_sub_recipe("BREAD", d(2))
                .with_ingredient("CHEESE", d(20)),
        )
        .with_recipe(
            Recipe::new("PAKET", "Paket Sarapan")
                .with_portions(d(2))
                .with_sub_recipe("SANDWICH", d(2))
                .with_ingredient("EGG", d(1)),
        )
        .with_promotion(
            Promotion::percentage("GAJIAN", "Promo Gajian", d(20))
                .with_channel("GoFood")
                .with_max_discount(d(15000))
                .with_merchant_borne_percent(d(50)),
        )
}

fn engine(store: InMemoryStore, config: EngineConfig) -> (Arc<InMemoryStore>, HppCalculator) {
    init_test_tracing();
    let store = Arc::new(store);
    let cache = Arc::new(MasterDataCache::warm_up(store.as_ref()).expect("warm up"));
    let calculator = HppCalculator::new(cache, store.clone(), config);
    (store, calculator)
}

#[rstest]
#[case::depth_1("BREAD", d(17500), d(1750))]
#[case::depth_2("SANDWICH", d(7100), d(7100))]
#[case::depth_3("PAKET", d(16200), d(8100))]
fn test_nested_recipe_costs(
    #[case] recipe_id: &str,
    #[case] batch: Decimal,
    #[case] per_portion: Decimal,
) {
    let (_, calculator) = engine(bakery_store(), EngineConfig::default());

    let snapshot = calculator.calculate_cost(recipe_id).unwrap();
    assert_eq!(snapshot.hpp_per_unit, batch);
    assert_eq!(snapshot.hpp_per_portion, per_portion);
}

#[test]
fn test_shared_sub_recipe_resolved_once() {
    let store = bakery_store().with_recipe(
        Recipe::new("CATERING", "Katering")
            .with_sub_recipe("SANDWICH", d(5))
            .with_sub_recipe("PAKET", d(3))
            .with_sub_recipe("BREAD", d(4)),
    );
    let (_, calculator) = engine(store, EngineConfig::default());

    let resolution = calculator.resolver().resolve("CATERING").unwrap();
    // CATERING、PAKET、SANDWICH、BREAD 各計算一次
    assert_eq!(resolution.evaluated_recipes, 4);
    // 5 * 7100 + 3 * 8100 + 4 * 1750
    assert_eq!(resolution.batch_cost, d(66800));
}

#[test]
fn test_repeat_costing_writes_one_snapshot() {
    let (store, calculator) = engine(bakery_store(), EngineConfig::default());

    let first = calculator.calculate_cost("PAKET").unwrap();
    let second = calculator.calculate_cost("PAKET").unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.cost_snapshots("PAKET").len(), 1);
    assert_eq!(store.cost_write_count(), 1);
}

#[test]
fn test_change_below_tolerance_is_ignored() {
    let (store, calculator) = engine(bakery_store(), EngineConfig::default());
    let existing = CostSnapshot::new(
        "BREAD",
        "Roti Tawar",
        Decimal::new(175_000_005, 4),
        Decimal::new(17_500_005, 4),
    );
    store.save_cost_snapshot(&existing).unwrap();

    let result = calculator.calculate_cost("BREAD").unwrap();
    assert_eq!(result.id, existing.id);
    assert_eq!(store.cost_snapshots("BREAD").len(), 1);
}

#[test]
fn test_reload_before_costing_picks_up_changes() {
    let (store, calculator) = engine(
        bakery_store(),
        EngineConfig::default().with_reload_before_costing(true),
    );
    calculator.calculate_cost("BREAD").unwrap();

    store.upsert_ingredient(Ingredient::new("EGG", "Telur", d(36000), d(15)));
    let updated = calculator.calculate_cost("BREAD").unwrap();

    // 蛋 2400 / 顆
    assert_eq!(updated.hpp_per_unit, d(18300));
    assert_eq!(store.cost_snapshots("BREAD").len(), 2);
}

#[test]
fn test_reload_failure_keeps_stale_cache() {
    let (store, calculator) = engine(bakery_store(), EngineConfig::default());
    let before = calculator.calculate_cost("SANDWICH").unwrap();

    store.upsert_ingredient(Ingredient::new("CHEESE", "Keju", d(90000), d(250)));
    calculator.cache().mark_dirty(EntityKind::Ingredient, "CHEESE");
    store.set_unavailable(true);

    let err = calculator.calculate_cost("SANDWICH").unwrap_err();
    assert!(matches!(err, HppError::StoreUnavailable(_)));

    // 舊快照仍可使用
    let stale = calculator.resolver().resolve_cost("SANDWICH").unwrap();
    assert_eq!(stale, before.hpp_per_unit);
    assert_eq!(calculator.cache().snapshot().generation(), 1);

    store.set_unavailable(false);
    let after = calculator.calculate_cost("SANDWICH").unwrap();
    assert_eq!(after.hpp_per_unit, d(10700));
}

#[test]
fn test_cycle_in_stored_data_is_reported() {
    let store = bakery_store()
        .with_recipe(Recipe::new("A", "A").with_sub_recipe("B", d(1)))
        .with_recipe(Recipe::new("B", "B").with_sub_recipe("A", d(1)));
    let (store, calculator) = engine(store, EngineConfig::default());

    match calculator.calculate_cost("A") {
        Err(HppError::CyclicComposition { path }) => assert_eq!(path, vec!["A", "B", "A"]),
        other => panic!("expected cycle error, got {:?}", other),
    }
    assert!(store.cost_snapshots("A").is_empty());

    // 其他配方不受影響
    assert!(calculator.calculate_cost("PAKET").is_ok());
}

#[test]
fn test_cycle_rejected_before_write() {
    let (_, calculator) = engine(bakery_store(), EngineConfig::default());
    let snapshot = calculator.cache().snapshot();

    let updated = Recipe::new("BREAD", "Roti Tawar")
        .as_sub_recipe()
        .with_sub_recipe("PAKET", d(1));
    assert!(matches!(
        validate_recipe(&snapshot, &updated),
        Err(HppError::CyclicComposition { .. })
    ));
}

#[rstest]
#[case::zero_quantity(
    Recipe::new("BAD", "Bad").with_sub_recipe("BREAD", Decimal::ZERO),
    "quantity"
)]
#[case::broken_ingredient(
    Recipe::new("BAD", "Bad").with_ingredient("WATER", d(100)),
    "ingredient"
)]
fn test_invalid_data_anywhere_in_tree(#[case] bad: Recipe, #[case] expected: &str) {
    let store = bakery_store()
        .with_ingredient(Ingredient::new("WATER", "Air", d(5000), Decimal::ZERO))
        .with_recipe(bad)
        .with_recipe(Recipe::new("TOP", "Top").with_sub_recipe("BAD", d(1)));
    let (_, calculator) = engine(store, EngineConfig::default());

    let err = calculator.calculate_cost("TOP").unwrap_err();
    match expected {
        "quantity" => assert!(matches!(err, HppError::InvalidQuantity(_))),
        _ => assert!(matches!(err, HppError::InvalidIngredient(_))),
    }
}

#[test]
fn test_price_persist_and_recalculate() {
    let (store, calculator) = engine(bakery_store(), EngineConfig::default());
    calculator.calculate_cost("PAKET").unwrap();

    let request = PriceRequest::new(
        "PAKET",
        "Paket Sarapan",
        "GoFood",
        PricingCriterion::ProfitPercentOfNetSales(d(40)),
    )
    .with_commission_percent(d(20))
    .with_tax_percent(d(10));

    let price = calculator.calculate_price(&request).unwrap();
    // 8100 / 0.6 / 0.7 = 19285.714285...
    assert_eq!(price.hpp, d(8100));
    assert_eq!(price.gross_price, Decimal::new(192_857_143, 4));
    assert_eq!(price.method, "profit_percent_of_net_sales");

    let rounded = request.clone().with_round_up_to(d(500));
    let recalculated = calculator.recalculate_price(price.id, &rounded).unwrap();
    assert_eq!(recalculated.id, price.id);
    assert_eq!(recalculated.gross_price, d(19500));
    assert_eq!(store.price_snapshots().len(), 1);
    assert_eq!(store.price_write_count(), 2);
}

#[test]
fn test_price_over_committed() {
    let (_, calculator) = engine(bakery_store(), EngineConfig::default());
    let request = PriceRequest::new(
        "PAKET",
        "Paket Sarapan",
        "GoFood",
        PricingCriterion::TargetNetSales(d(20000)),
    )
    .with_commission_percent(d(60))
    .with_tax_percent(d(45));

    assert!(matches!(
        calculator.calculate_price(&request),
        Err(HppError::OverCommitted { .. })
    ));
}

#[test]
fn test_promotion_simulation_literal_case() {
    let (_, calculator) = engine(bakery_store(), EngineConfig::default());
    let request = SimulationRequest::new(d(50000), d(8100), d(2)).with_promotion_id("GAJIAN");

    let economics = calculator.simulate_order(&request).unwrap();
    assert_eq!(economics.gross_total, d(100000));
    assert_eq!(economics.consumer_discount, d(15000));
    assert_eq!(economics.merchant_share, d(7500));
    assert_eq!(economics.channel_share, d(7500));
    assert_eq!(economics.consumer_final_price, d(85000));
    assert!(economics.promo_applied);
}

#[test]
fn test_cost_report() {
    let (_, calculator) = engine(bakery_store(), EngineConfig::default().with_top_recipes_limit(2));

    let report = calculator.cost_report().unwrap();
    assert_eq!(report.ingredient_count, 4);
    assert_eq!(report.recipe_count, 3);
    let top: Vec<&str> = report.top_recipes.iter().map(|l| l.recipe_id.as_str()).collect();
    assert_eq!(top, vec!["PAKET", "SANDWICH"]);
    assert!(report.failures.is_empty());
}

#[test]
fn test_concurrent_resolution_during_reload() {
    let (store, calculator) = engine(bakery_store(), EngineConfig::default());

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| calculator.resolver().resolve_cost("PAKET")))
            .collect();

        calculator.cache().reload(store.as_ref()).unwrap();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), d(16200));
        }
    });
}

#[test]
fn test_config_from_toml() {
    let config = EngineConfig::from_toml_str(
        r#"
        dedup_tolerance = "0.01"
        reload_before_costing = true
        top_recipes_limit = 3
        "#,
    )
    .unwrap();
    assert!(config.reload_before_costing);
    assert_eq!(config.top_recipes_limit, 3);
    assert_eq!(config.dedup_tolerance, Decimal::new(1, 2));
}

proptest! {
    #[test]
    fn prop_single_ingredient_cost_is_linear(
        price in 1i64..10_000_000,
        net in 1i64..100_000,
        quantity in 1i64..10_000,
    ) {
        let store = InMemoryStore::new()
            .with_ingredient(Ingredient::new("X", "X", d(price), d(net)))
            .with_recipe(Recipe::new("R", "R").with_ingredient("X", d(quantity)));
        let cache = MasterDataCache::warm_up(&store).unwrap();

        let cost = hpp::CostResolver::new(cache.snapshot()).resolve_cost("R").unwrap();
        let expected = d(price) / d(net) * d(quantity);
        prop_assert!((cost - expected).abs() < Decimal::new(1, 6));
    }
}
