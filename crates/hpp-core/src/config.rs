//! 引擎配置

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::money::{COST_SCALE, CURRENCY_SCALE, PERCENT_SCALE};
use crate::{HppError, Result};

/// HPP 引擎參數配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 成本快照去重的絕對容差（貨幣單位）
    pub dedup_tolerance: Decimal,

    /// 成本持久化小數位數
    pub cost_scale: u32,

    /// 顯示金額小數位數
    pub currency_scale: u32,

    /// 百分比小數位數
    pub percent_scale: u32,

    /// 每次計算成本前是否重新載入主資料快取
    /// - true: 每次都從儲存層重新載入（可取得外部修改）
    /// - false: 只有在有髒標記時才重新載入（預設）
    pub reload_before_costing: bool,

    /// 成本報表中列出的配方數量
    pub top_recipes_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dedup_tolerance: Decimal::new(1, 3), // 0.001
            cost_scale: COST_SCALE,
            currency_scale: CURRENCY_SCALE,
            percent_scale: PERCENT_SCALE,
            reload_before_costing: false,
            top_recipes_limit: 5,
        }
    }
}

impl EngineConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置去重容差
    pub fn with_dedup_tolerance(mut self, tolerance: Decimal) -> Self {
        self.dedup_tolerance = tolerance;
        self
    }

    /// 建構器模式：設置是否每次重新載入快取
    pub fn with_reload_before_costing(mut self, reload: bool) -> Self {
        self.reload_before_costing = reload;
        self
    }

    /// 建構器模式：設置報表配方數量
    pub fn with_top_recipes_limit(mut self, limit: usize) -> Self {
        self.top_recipes_limit = limit;
        self
    }

    /// 從 TOML 字串解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)
            .map_err(|e| HppError::Config(format!("無法解析 TOML 配置: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 從 TOML 檔案載入
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = std::fs::read_to_string(path_ref).map_err(|e| {
            HppError::Config(format!("無法讀取配置檔 {:?}: {}", path_ref, e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// 檢查配置是否合理
    pub fn validate(&self) -> Result<()> {
        if self.dedup_tolerance < Decimal::ZERO {
            return Err(HppError::Config(format!(
                "去重容差不得為負數: {}",
                self.dedup_tolerance
            )));
        }
        if self.cost_scale > 28 || self.currency_scale > 28 || self.percent_scale > 28 {
            return Err(HppError::Config("小數位數不得超過 28".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.dedup_tolerance, dec!(0.001));
        assert_eq!(config.cost_scale, 4);
        assert_eq!(config.currency_scale, 2);
        assert_eq!(config.percent_scale, 2);
        assert!(!config.reload_before_costing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::new()
            .with_dedup_tolerance(dec!(0.01))
            .with_reload_before_costing(true)
            .with_top_recipes_limit(10);

        assert_eq!(config.dedup_tolerance, dec!(0.01));
        assert!(config.reload_before_costing);
        assert_eq!(config.top_recipes_limit, 10);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = EngineConfig::from_toml_str(
            r#"
            dedup_tolerance = "0.005"
            reload_before_costing = true
            "#,
        )
        .unwrap();

        assert_eq!(config.dedup_tolerance, dec!(0.005));
        assert!(config.reload_before_costing);
        // 未指定的欄位使用預設值
        assert_eq!(config.cost_scale, 4);
        assert_eq!(config.top_recipes_limit, 5);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let result = EngineConfig::from_toml_str(r#"dedup_tolerance = "-1""#);
        assert!(matches!(result, Err(HppError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = EngineConfig::from_toml_str("dedup_tolerance = ");
        assert!(matches!(result, Err(HppError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = EngineConfig::load("/nonexistent/hpp.toml");
        assert!(matches!(result, Err(HppError::Config(_))));
    }
}
