//! # HPP Calculation Engine
//!
//! 成本（HPP）解析、反推售價、促銷模擬

pub mod calculator;
pub mod pricing;
pub mod promotion;
pub mod report;
pub mod resolver;
pub mod validation;

// Re-export 主要類型
pub use calculator::{HppCalculator, PriceRequest, SimulationRequest};
pub use pricing::{PriceBreakdown, PricingCriterion, PricingSolver};
pub use promotion::{OrderEconomics, OrderSimulation, PromotionSimulator, PromotionSummary};
pub use report::{CostReport, RecipeCostFailure, RecipeCostLine};
pub use resolver::{CostResolution, CostResolver};

use rust_decimal::Decimal;

/// 成本計算警告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostWarning {
    pub recipe_id: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl CostWarning {
    pub fn new(recipe_id: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            recipe_id,
            message,
            severity,
        }
    }

    pub fn info(recipe_id: String, message: String) -> Self {
        Self::new(recipe_id, message, WarningSeverity::Info)
    }

    pub fn warning(recipe_id: String, message: String) -> Self {
        Self::new(recipe_id, message, WarningSeverity::Warning)
    }

    pub fn error(recipe_id: String, message: String) -> Self {
        Self::new(recipe_id, message, WarningSeverity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}

/// Decimal 運算溢位時的錯誤
pub(crate) fn overflow(context: &str) -> hpp_core::HppError {
    hpp_core::HppError::InvalidResult(format!("{} 數值溢位", context))
}

/// 不會 panic 的乘法
pub(crate) fn mul(a: Decimal, b: Decimal, context: &str) -> hpp_core::Result<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(context))
}

/// 不會 panic 的除法（除數為零亦視為無效結果）
pub(crate) fn div(a: Decimal, b: Decimal, context: &str) -> hpp_core::Result<Decimal> {
    a.checked_div(b).ok_or_else(|| overflow(context))
}

/// 不會 panic 的加法
pub(crate) fn add(a: Decimal, b: Decimal, context: &str) -> hpp_core::Result<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow(context))
}

/// 不會 panic 的減法
pub(crate) fn sub(a: Decimal, b: Decimal, context: &str) -> hpp_core::Result<Decimal> {
    a.checked_sub(b).ok_or_else(|| overflow(context))
}
