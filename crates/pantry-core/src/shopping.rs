//! 購物清單模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 成分短缺明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeficitLine {
    /// 成分ID
    pub id: String,

    pub name: String,

    pub unit: String,

    /// 短缺數量
    pub quantity: Decimal,

    /// 計算時該成分是否已在購物清單中（僅為提示）
    pub update_item: bool,
}

/// 購物清單項目（每個項目ID唯一）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListEntry {
    /// 項目ID
    pub id: String,

    pub name: String,

    pub category: String,

    /// 待購數量
    pub quantity: Decimal,

    /// 已勾選（已購買）
    pub checked: bool,

    /// 已計入庫存
    pub added_to_inventory: bool,

    /// 最後更新時間
    pub updated_at: DateTime<Utc>,

    /// 組合項目的成分短缺明細（存在即為餐點項目）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<DeficitLine>>,
}

impl ShoppingListEntry {
    /// 創建未勾選的項目
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            quantity,
            checked: false,
            added_to_inventory: false,
            updated_at: Utc::now(),
            ingredients: None,
        }
    }

    /// 檢查是否為餐點項目
    pub fn is_composite(&self) -> bool {
        self.ingredients.is_some()
    }
}

/// 合併請求：`checked`/`added_to_inventory` 為 None 表示未指定
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingEntry {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quantity: Decimal,
    pub checked: Option<bool>,
    pub added_to_inventory: Option<bool>,
    pub updated_at: DateTime<Utc>,
    pub ingredients: Option<Vec<DeficitLine>>,
}

impl IncomingEntry {
    /// 創建合併請求
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            quantity,
            checked: None,
            added_to_inventory: None,
            updated_at: Utc::now(),
            ingredients: None,
        }
    }

    /// 建構器模式：設置勾選狀態
    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// 建構器模式：設置是否已計入庫存
    pub fn with_added_to_inventory(mut self, added: bool) -> Self {
        self.added_to_inventory = Some(added);
        self
    }

    /// 建構器模式：設置成分短缺明細
    pub fn with_ingredients(mut self, ingredients: Vec<DeficitLine>) -> Self {
        self.ingredients = Some(ingredients);
        self
    }

    /// 建構器模式：設置更新時間
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// 轉為新項目（未指定的旗標預設為 false）
    pub fn into_entry(self) -> ShoppingListEntry {
        ShoppingListEntry {
            id: self.id,
            name: self.name,
            category: self.category,
            quantity: self.quantity,
            checked: self.checked.unwrap_or(false),
            added_to_inventory: self.added_to_inventory.unwrap_or(false),
            updated_at: self.updated_at,
            ingredients: self.ingredients,
        }
    }
}

impl From<DeficitLine> for IncomingEntry {
    fn from(line: DeficitLine) -> Self {
        IncomingEntry::new(line.id, line.name, String::new(), line.quantity)
    }
}
