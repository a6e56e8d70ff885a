//! 庫存模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{PantryError, Result};

/// 庫存記錄（數量為 0 的記錄視為不存在）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    /// 項目ID
    pub id: String,

    /// 名稱
    pub name: String,

    /// 類別
    pub category: String,

    /// 現有數量
    pub quantity: Decimal,

    /// 最後更新時間
    pub date_updated: DateTime<Utc>,
}

impl InventoryEntry {
    /// 創建新的庫存記錄
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
            date_updated: Utc::now(),
        }
    }
}

/// 庫存變動結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// 寫入（新增或更新）記錄
    Upserted,
    /// 數量歸零，移除記錄
    Removed,
    /// 數量未變
    Unchanged,
}

/// 單筆庫存變動
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryChange {
    pub item_id: String,
    pub old_quantity: Decimal,
    pub new_quantity: Decimal,
    pub outcome: ChangeOutcome,
    /// 變動後的記錄（移除時為 None）
    pub entry: Option<InventoryEntry>,
}

impl InventoryChange {
    /// 是否為減少
    pub fn is_decrease(&self) -> bool {
        self.new_quantity < self.old_quantity
    }
}

/// 庫存帳本：項目ID → 現有數量
#[derive(Debug, Clone, Default)]
pub struct InventoryLedger {
    entries: HashMap<String, InventoryEntry>,
}

impl InventoryLedger {
    /// 創建空的帳本
    pub fn new() -> Self {
        Self::default()
    }

    /// 從持久化記錄重建，略過數量非正的記錄
    pub fn from_entries(entries: Vec<InventoryEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|e| e.quantity > Decimal::ZERO)
            .map(|e| (e.id.clone(), e))
            .collect();
        Self { entries }
    }

    /// 現有數量，不存在時為 0
    pub fn quantity(&self, id: &str) -> Decimal {
        self.entries
            .get(id)
            .map(|e| e.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn get(&self, id: &str) -> Option<&InventoryEntry> {
        self.entries.get(id)
    }

    /// 所有記錄
    pub fn entries(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 計算設定數量後的變動（不修改帳本）
    ///
    /// 數量為 0 時結果為移除；`name`/`category` 僅在建立新記錄時使用。
    pub fn plan_set(
        &self,
        id: &str,
        name: &str,
        category: &str,
        quantity: Decimal,
    ) -> Result<InventoryChange> {
        if quantity < Decimal::ZERO {
            return Err(PantryError::InvalidQuantity(format!(
                "庫存 {} 不可為負：{}",
                id, quantity
            )));
        }

        let old_quantity = self.quantity(id);
        if quantity == old_quantity {
            return Ok(InventoryChange {
                item_id: id.to_string(),
                old_quantity,
                new_quantity: quantity,
                outcome: ChangeOutcome::Unchanged,
                entry: self.entries.get(id).cloned(),
            });
        }

        if quantity == Decimal::ZERO {
            return Ok(InventoryChange {
                item_id: id.to_string(),
                old_quantity,
                new_quantity: Decimal::ZERO,
                outcome: ChangeOutcome::Removed,
                entry: None,
            });
        }

        let entry = match self.entries.get(id) {
            Some(existing) => InventoryEntry {
                quantity,
                date_updated: Utc::now(),
                ..existing.clone()
            },
            None => InventoryEntry::new(id, name, category, quantity),
        };

        Ok(InventoryChange {
            item_id: id.to_string(),
            old_quantity,
            new_quantity: quantity,
            outcome: ChangeOutcome::Upserted,
            entry: Some(entry),
        })
    }

    /// 計算增加數量後的變動
    pub fn plan_increment(
        &self,
        id: &str,
        name: &str,
        category: &str,
        by: Decimal,
    ) -> Result<InventoryChange> {
        if by < Decimal::ZERO {
            return Err(PantryError::InvalidQuantity(format!(
                "增加量不可為負：{}",
                by
            )));
        }
        let target = self.quantity(id).checked_add(by).ok_or_else(|| {
            PantryError::InvalidQuantity(format!("庫存 {} 數量溢位", id))
        })?;
        self.plan_set(id, name, category, target)
    }

    /// 計算減少數量後的變動，最低為 0
    pub fn plan_decrement(&self, id: &str, by: Decimal) -> Result<InventoryChange> {
        if by < Decimal::ZERO {
            return Err(PantryError::InvalidQuantity(format!(
                "減少量不可為負：{}",
                by
            )));
        }
        let remaining = (self.quantity(id) - by).max(Decimal::ZERO);
        self.plan_set(id, "", "", remaining)
    }

    /// 套用變動
    pub fn apply(&mut self, change: &InventoryChange) {
        match change.outcome {
            ChangeOutcome::Upserted => {
                if let Some(entry) = &change.entry {
                    self.entries.insert(entry.id.clone(), entry.clone());
                }
            }
            ChangeOutcome::Removed => {
                self.entries.remove(&change.item_id);
            }
            ChangeOutcome::Unchanged => {}
        }
    }

    /// 設定數量並套用
    pub fn set_quantity(
        &mut self,
        id: &str,
        name: &str,
        category: &str,
        quantity: Decimal,
    ) -> Result<InventoryChange> {
        let change = self.plan_set(id, name, category, quantity)?;
        self.apply(&change);
        Ok(change)
    }
}
