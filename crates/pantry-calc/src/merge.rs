//! 購物清單項目合併
//!
//! 以逐欄位策略表描述合併規則：覆寫、加總、未指定時保留。

use pantry_core::{IncomingEntry, PantryError, ShoppingListEntry};
use std::collections::HashMap;

/// 可合併的欄位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryField {
    Name,
    Category,
    Quantity,
    Checked,
    AddedToInventory,
    UpdatedAt,
    Ingredients,
}

impl EntryField {
    pub const ALL: [EntryField; 7] = [
        EntryField::Name,
        EntryField::Category,
        EntryField::Quantity,
        EntryField::Checked,
        EntryField::AddedToInventory,
        EntryField::UpdatedAt,
        EntryField::Ingredients,
    ];
}

/// 欄位合併策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    /// 以新值取代
    Overwrite,
    /// 新舊值相加（僅限數量）
    Sum,
    /// 新值有指定時才取代
    PreserveUnlessSet,
}

/// 合併策略表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePolicy {
    rules: HashMap<EntryField, FieldPolicy>,
}

impl Default for MergePolicy {
    /// 數量加總；勾選與入庫旗標未指定時保留；其餘欄位覆寫
    fn default() -> Self {
        let rules = EntryField::ALL
            .iter()
            .map(|&field| {
                let policy = match field {
                    EntryField::Quantity => FieldPolicy::Sum,
                    EntryField::Checked | EntryField::AddedToInventory => {
                        FieldPolicy::PreserveUnlessSet
                    }
                    _ => FieldPolicy::Overwrite,
                };
                (field, policy)
            })
            .collect();
        Self { rules }
    }
}

impl MergePolicy {
    /// 建構器模式：設置單一欄位的策略
    pub fn with(mut self, field: EntryField, policy: FieldPolicy) -> pantry_core::Result<Self> {
        let allowed = match policy {
            FieldPolicy::Overwrite => true,
            FieldPolicy::Sum => field == EntryField::Quantity,
            FieldPolicy::PreserveUnlessSet => {
                !matches!(field, EntryField::Quantity | EntryField::UpdatedAt)
            }
        };
        if !allowed {
            return Err(PantryError::InvalidMergePolicy(format!(
                "{:?} 不支援 {:?}",
                field, policy
            )));
        }
        self.rules.insert(field, policy);
        Ok(self)
    }

    /// 查詢欄位策略
    pub fn policy_for(&self, field: EntryField) -> FieldPolicy {
        self.rules
            .get(&field)
            .copied()
            .unwrap_or(FieldPolicy::Overwrite)
    }
}

/// 將合併請求套用到既有項目；數量加總溢位時回傳錯誤
pub fn merge(
    existing: &ShoppingListEntry,
    incoming: &IncomingEntry,
    policy: &MergePolicy,
) -> pantry_core::Result<ShoppingListEntry> {
    let text = |field: EntryField, old: &str, new: &str| -> String {
        match policy.policy_for(field) {
            FieldPolicy::PreserveUnlessSet if new.trim().is_empty() => old.to_string(),
            _ => new.to_string(),
        }
    };
    let flag = |field: EntryField, old: bool, new: Option<bool>| -> bool {
        match policy.policy_for(field) {
            FieldPolicy::PreserveUnlessSet => new.unwrap_or(old),
            _ => new.unwrap_or(false),
        }
    };

    let quantity = match policy.policy_for(EntryField::Quantity) {
        FieldPolicy::Sum => existing
            .quantity
            .checked_add(incoming.quantity)
            .ok_or_else(|| {
                PantryError::InvalidQuantity(format!(
                    "{} 數量溢位：{} + {}",
                    existing.id, existing.quantity, incoming.quantity
                ))
            })?,
        _ => incoming.quantity,
    };

    let ingredients = match policy.policy_for(EntryField::Ingredients) {
        FieldPolicy::PreserveUnlessSet if incoming.ingredients.is_none() => {
            existing.ingredients.clone()
        }
        _ => incoming.ingredients.clone(),
    };

    Ok(ShoppingListEntry {
        id: existing.id.clone(),
        name: text(EntryField::Name, &existing.name, &incoming.name),
        category: text(EntryField::Category, &existing.category, &incoming.category),
        quantity,
        checked: flag(EntryField::Checked, existing.checked, incoming.checked),
        added_to_inventory: flag(
            EntryField::AddedToInventory,
            existing.added_to_inventory,
            incoming.added_to_inventory,
        ),
        updated_at: incoming.updated_at,
        ingredients,
    })
}
