//! 配方模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::HppError;

/// 組件類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComponentKind {
    /// 原料（以使用單位計量）
    Ingredient,
    /// 子配方（以子配方份數計量）
    Recipe,
}

impl ComponentKind {
    /// 標準標籤
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Ingredient => "ingredient",
            ComponentKind::Recipe => "recipe",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = HppError;

    /// 同時接受舊資料使用的 `bahan_baku` / `resep` 標籤
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ingredient" | "bahan_baku" => Ok(ComponentKind::Ingredient),
            "recipe" | "resep" => Ok(ComponentKind::Recipe),
            other => Err(HppError::InvalidComponentType(other.to_string())),
        }
    }
}

impl TryFrom<String> for ComponentKind {
    type Error = HppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        kind.as_str().to_string()
    }
}

/// 配方組件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// 引用的原料或子配方ID
    pub target_id: String,

    /// 組件類型
    pub kind: ComponentKind,

    /// 每批用量
    pub quantity: Decimal,
}

impl Component {
    /// 原料組件
    pub fn ingredient(target_id: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            target_id: target_id.into(),
            kind: ComponentKind::Ingredient,
            quantity,
        }
    }

    /// 子配方組件
    pub fn recipe(target_id: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            target_id: target_id.into(),
            kind: ComponentKind::Recipe,
            quantity,
        }
    }

    /// 是否為子配方
    pub fn is_sub_recipe(&self) -> bool {
        self.kind == ComponentKind::Recipe
    }
}

/// 配方
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// 配方ID
    pub id: String,

    /// 名稱（唯一）
    pub name: String,

    /// 是否可作為其他配方的子配方
    #[serde(default)]
    pub is_sub_recipe: bool,

    /// 每批產出份數
    pub portions: Decimal,

    /// 組件（有序）
    #[serde(default)]
    pub components: Vec<Component>,
}

impl Recipe {
    /// 創建新的配方（預設 1 份）
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_sub_recipe: false,
            portions: Decimal::ONE,
            components: Vec::new(),
        }
    }

    /// 建構器模式：設置份數
    pub fn with_portions(mut self, portions: Decimal) -> Self {
        self.portions = portions;
        self
    }

    /// 建構器模式：標記為子配方
    pub fn as_sub_recipe(mut self) -> Self {
        self.is_sub_recipe = true;
        self
    }

    /// 建構器模式：添加原料組件
    pub fn with_ingredient(mut self, ingredient_id: impl Into<String>, quantity: Decimal) -> Self {
        self.components.push(Component::ingredient(ingredient_id, quantity));
        self
    }

    /// 建構器模式：添加子配方組件
    pub fn with_sub_recipe(mut self, recipe_id: impl Into<String>, quantity: Decimal) -> Self {
        self.components.push(Component::recipe(recipe_id, quantity));
        self
    }

    /// 份數是否有效（> 0）
    pub fn has_valid_portions(&self) -> bool {
        self.portions > Decimal::ZERO
    }

    /// 份數 ≤ 0 時視為 1 份
    pub fn normalized_portions(&self) -> Decimal {
        if self.has_valid_portions() {
            self.portions
        } else {
            Decimal::ONE
        }
    }

    /// 直接引用的子配方ID
    pub fn sub_recipe_ids(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .filter(|c| c.is_sub_recipe())
            .map(|c| c.target_id.as_str())
    }
}
