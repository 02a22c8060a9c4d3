//! 金額與百分比工具
//!
//! 計算過程一律使用 `Decimal`，只在持久化與顯示邊界做四捨五入。

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{HppError, Result};

/// 成本的小數位數
pub const COST_SCALE: u32 = 4;

/// 顯示金額的小數位數
pub const CURRENCY_SCALE: u32 = 2;

/// 百分比的小數位數
pub const PERCENT_SCALE: u32 = 2;

/// 一百
pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// 四捨五入到指定位數（.5 遠離零）
pub fn round_to(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// 成本四捨五入（4 位）
pub fn round_cost(value: Decimal) -> Decimal {
    round_to(value, COST_SCALE)
}

/// 金額四捨五入（2 位）
pub fn round_currency(value: Decimal) -> Decimal {
    round_to(value, CURRENCY_SCALE)
}

/// 百分比四捨五入（2 位）
pub fn round_percent(value: Decimal) -> Decimal {
    round_to(value, PERCENT_SCALE)
}

/// `amount` 的 `percent`%（百分比為 0–100 刻度），溢位時為無效結果
pub fn percent_of(amount: Decimal, percent: Decimal) -> Result<Decimal> {
    amount
        .checked_mul(percent)
        .and_then(|product| product.checked_div(HUNDRED))
        .ok_or_else(|| {
            HppError::InvalidResult(format!("{} 的 {}% 數值溢位", amount, percent))
        })
}

/// 百分比是否落在 [0, 100]
pub fn is_valid_percent(percent: Decimal) -> bool {
    percent >= Decimal::ZERO && percent <= HUNDRED
}

/// `part / whole * 100`，分母為零時回傳 0
pub fn ratio_percent(part: Decimal, whole: Decimal) -> Result<Decimal> {
    if whole.is_zero() {
        return Ok(Decimal::ZERO);
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .ok_or_else(|| HppError::InvalidResult(format!("{} / {} 比例數值溢位", part, whole)))
}
