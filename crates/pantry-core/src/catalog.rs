//! 食物庫（目錄）模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{PantryError, Result};

/// 組合項目的成分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    /// 成分對應的食物庫項目ID
    pub id: String,

    /// 名稱
    pub name: String,

    /// 單位
    pub unit: String,

    /// 每一單位組合項目所需數量（必須 > 0）
    pub quantity_per_unit: Decimal,
}

impl Ingredient {
    /// 創建新的成分
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit: impl Into<String>,
        quantity_per_unit: Decimal,
    ) -> Result<Self> {
        let id = id.into();
        if quantity_per_unit <= Decimal::ZERO {
            return Err(PantryError::InvalidQuantity(format!(
                "成分 {} 的單位用量必須大於 0，實際為 {}",
                id, quantity_per_unit
            )));
        }
        Ok(Self {
            id,
            name: name.into(),
            unit: unit.into(),
            quantity_per_unit,
        })
    }
}

/// 食物庫項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// 項目ID
    pub id: String,

    /// 名稱
    pub name: String,

    /// 單位（count、lbs、oz…，不做換算）
    pub unit: String,

    /// 類別
    pub category: String,

    /// 是否自動補貨
    pub auto_restock: bool,

    /// 補貨門檻
    pub restock_threshold: Decimal,

    /// 補貨數量
    pub restock_quantity: Decimal,

    /// 成分（存在即為組合項目／餐點）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<Ingredient>>,
}

impl CatalogItem {
    /// 創建新的食物庫項目（自動產生ID）
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            unit: unit.into(),
            category: category.into(),
            auto_restock: false,
            restock_threshold: Decimal::ZERO,
            restock_quantity: Decimal::ZERO,
            ingredients: None,
        }
    }

    /// 建構器模式：設置ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// 建構器模式：啟用自動補貨
    pub fn with_auto_restock(mut self, threshold: Decimal, quantity: Decimal) -> Self {
        self.auto_restock = true;
        self.restock_threshold = threshold;
        self.restock_quantity = quantity;
        self
    }

    /// 建構器模式：設置成分，使其成為組合項目
    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients = Some(ingredients);
        self
    }

    /// 檢查是否為組合項目（餐點）
    pub fn is_composite(&self) -> bool {
        self.ingredients.is_some()
    }

    /// 成分列表（非組合項目為空）
    pub fn ingredients(&self) -> &[Ingredient] {
        self.ingredients.as_deref().unwrap_or(&[])
    }

    /// 驗證項目資料
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(PantryError::InvalidName(self.id.clone()));
        }
        if self.restock_threshold < Decimal::ZERO || self.restock_quantity < Decimal::ZERO {
            return Err(PantryError::InvalidQuantity(format!(
                "項目 {} 的補貨參數不可為負",
                self.id
            )));
        }
        for ingredient in self.ingredients() {
            if ingredient.id == self.id {
                return Err(PantryError::SelfReferencingComposite(self.id.clone()));
            }
            if ingredient.quantity_per_unit <= Decimal::ZERO {
                return Err(PantryError::InvalidQuantity(format!(
                    "成分 {} 的單位用量必須大於 0",
                    ingredient.id
                )));
            }
        }
        Ok(())
    }
}

/// 食物庫集合中的持久化記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CatalogRecord {
    Item(CatalogItem),
    Category { name: String },
}

impl CatalogRecord {
    /// 記錄ID
    pub fn record_id(&self) -> String {
        match self {
            CatalogRecord::Item(item) => item.id.clone(),
            CatalogRecord::Category { name } => Self::category_record_id(name),
        }
    }

    /// 類別記錄ID
    pub fn category_record_id(name: &str) -> String {
        format!("category:{}", name)
    }
}

/// 食物庫
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<String, CatalogItem>,
    categories: Vec<String>,
}

impl Catalog {
    /// 創建空的食物庫
    pub fn new() -> Self {
        Self::default()
    }

    /// 從持久化記錄重建
    pub fn from_records(records: Vec<CatalogRecord>) -> Self {
        let mut catalog = Self::new();
        for record in records {
            match record {
                CatalogRecord::Item(item) => {
                    catalog.register_category(&item.category);
                    catalog.items.insert(item.id.clone(), item);
                }
                CatalogRecord::Category { name } => catalog.register_category(&name),
            }
        }
        catalog
    }

    /// 轉換為持久化記錄（類別在前，項目依ID排序）
    pub fn to_records(&self) -> Vec<CatalogRecord> {
        let mut items: Vec<_> = self.items.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));

        self.categories
            .iter()
            .map(|name| CatalogRecord::Category { name: name.clone() })
            .chain(items.into_iter().map(CatalogRecord::Item))
            .collect()
    }

    /// 查詢項目
    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.items.get(id)
    }

    /// 查詢項目，找不到時回傳錯誤
    pub fn require(&self, id: &str) -> Result<&CatalogItem> {
        self.get(id)
            .ok_or_else(|| PantryError::ItemNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// 所有項目
    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 所有類別（依加入順序）
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }

    fn register_category(&mut self, name: &str) {
        if !name.trim().is_empty() && !self.has_category(name) {
            self.categories.push(name.to_string());
        }
    }

    /// 新增類別
    pub fn add_category(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PantryError::InvalidName(name.to_string()));
        }
        if self.has_category(name) {
            return Err(PantryError::CategoryExists(name.to_string()));
        }
        self.categories.push(name.to_string());
        Ok(())
    }

    /// 重新命名類別，回傳受影響的項目ID
    pub fn rename_category(&mut self, old: &str, new: &str) -> Result<Vec<String>> {
        let new = new.trim();
        if new.is_empty() {
            return Err(PantryError::InvalidName(new.to_string()));
        }
        let position = self
            .categories
            .iter()
            .position(|c| c == old)
            .ok_or_else(|| PantryError::CategoryNotFound(old.to_string()))?;
        if old != new && self.has_category(new) {
            return Err(PantryError::CategoryExists(new.to_string()));
        }

        self.categories[position] = new.to_string();
        Ok(self.move_items(old, new))
    }

    /// 刪除類別，其項目改歸後備類別，回傳受影響的項目ID
    ///
    /// 後備類別本身不可刪除。
    pub fn delete_category(&mut self, name: &str, fallback: &str) -> Result<Vec<String>> {
        if name == fallback {
            return Err(PantryError::ProtectedCategory(name.to_string()));
        }
        let position = self
            .categories
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PantryError::CategoryNotFound(name.to_string()))?;
        self.categories.remove(position);

        let affected = self.move_items(name, fallback);
        if !affected.is_empty() {
            self.register_category(fallback);
        }
        Ok(affected)
    }

    fn move_items(&mut self, from: &str, to: &str) -> Vec<String> {
        let mut affected: Vec<String> = self
            .items
            .values_mut()
            .filter(|item| item.category == from)
            .map(|item| {
                item.category = to.to_string();
                item.id.clone()
            })
            .collect();
        affected.sort();
        affected
    }

    /// 新增項目
    pub fn add_item(&mut self, item: CatalogItem) -> Result<()> {
        item.validate()?;
        if self.items.contains_key(&item.id) {
            return Err(PantryError::DuplicateItem(item.id));
        }
        self.register_category(&item.category);
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    /// 編輯項目，回傳舊版本
    pub fn edit_item(&mut self, item: CatalogItem) -> Result<CatalogItem> {
        item.validate()?;
        let slot = self
            .items
            .get_mut(&item.id)
            .ok_or_else(|| PantryError::ItemNotFound(item.id.clone()))?;
        let previous = std::mem::replace(slot, item);
        let category = slot.category.clone();
        self.register_category(&category);
        Ok(previous)
    }

    /// 移除項目
    pub fn remove_item(&mut self, id: &str) -> Result<CatalogItem> {
        self.items
            .remove(id)
            .ok_or_else(|| PantryError::ItemNotFound(id.to_string()))
    }
}
