//! # HPP Core
//!
//! 核心資料模型與類型定義

pub mod config;
pub mod ingredient;
pub mod money;
pub mod promotion;
pub mod recipe;
pub mod snapshot;
pub mod store;

// Re-export 主要類型
pub use config::EngineConfig;
pub use ingredient::Ingredient;
pub use promotion::{DiscountKind, Promotion};
pub use recipe::{Component, ComponentKind, Recipe};
pub use snapshot::{CostSnapshot, PriceSnapshot};
pub use store::{InMemoryStore, MasterDataStore};

use std::fmt;

/// 實體種類（用於 NotFound 錯誤）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EntityKind {
    Ingredient,
    Recipe,
    Promotion,
    CostSnapshot,
    PriceSnapshot,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Ingredient => "原料",
            EntityKind::Recipe => "配方",
            EntityKind::Promotion => "促銷活動",
            EntityKind::CostSnapshot => "成本快照",
            EntityKind::PriceSnapshot => "售價快照",
        };
        f.write_str(label)
    }
}

/// HPP 錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum HppError {
    #[error("找不到{kind}: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("{kind}已存在: {key}")]
    Duplicate { kind: EntityKind, key: String },

    #[error("無效的用量: {0}")]
    InvalidQuantity(String),

    #[error("無效的原料: {0}")]
    InvalidIngredient(String),

    #[error("無效的組件類型: {0}")]
    InvalidComponentType(String),

    #[error("配方循環引用: {}", path.join(" -> "))]
    CyclicComposition { path: Vec<String> },

    #[error("佣金與稅率合計不得達到 100%（佣金 {commission_percent}%，稅 {tax_percent}%）")]
    OverCommitted {
        commission_percent: rust_decimal::Decimal,
        tax_percent: rust_decimal::Decimal,
    },

    #[error("無效的百分比: {0}")]
    InvalidPercent(String),

    #[error("無效的定價準則: {0}")]
    InvalidCriterion(String),

    #[error("定價結果無效: {0}")]
    InvalidResult(String),

    #[error("無效的促銷活動: {0}")]
    InvalidPromotion(String),

    #[error("資料儲存不可用: {0}")]
    StoreUnavailable(String),

    #[error("配置錯誤: {0}")]
    Config(String),
}

impl HppError {
    /// 建立 NotFound 錯誤
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        HppError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// 是否為 NotFound
    pub fn is_not_found(&self) -> bool {
        matches!(self, HppError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, HppError>;
