//! # HPP
//!
//! 餐飲配方成本（HPP）與售價引擎。
//!
//! - [`hpp_core`]：資料模型、錯誤、設定與儲存層介面
//! - [`hpp_cache`]：可原子替換的主資料快取
//! - [`hpp_calc`]：成本解析、反推售價、促銷模擬

pub use hpp_cache;
pub use hpp_calc;
pub use hpp_core;

pub use hpp_cache::{MasterData, MasterDataCache};
pub use hpp_calc::{
    CostReport, CostResolver, HppCalculator, OrderEconomics, OrderSimulation, PriceBreakdown,
    PriceRequest, PricingCriterion, PricingSolver, PromotionSimulator, SimulationRequest,
};
pub use hpp_core::{EngineConfig, HppError, InMemoryStore, MasterDataStore, Result};

use tracing_subscriber::EnvFilter;

/// 初始化日誌輸出
///
/// 以 `RUST_LOG` 控制層級，未設定時使用 `default_filter`。重複呼叫不會出錯。
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
