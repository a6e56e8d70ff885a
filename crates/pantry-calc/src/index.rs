//! 購物清單索引
//!
//! 項目ID → 項目的唯一映射，加上使用者控制的排列順序。
//! 清單分為三段：未勾選（依使用者順序）、已勾選、餐點。

use pantry_core::{IncomingEntry, PantryError, ShoppingListEntry};
use std::collections::{HashMap, HashSet};

use crate::merge::{merge, MergePolicy};
use crate::CalcWarning;

/// 新項目的插入位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// 加到最後
    #[default]
    Append,
    /// 插入未勾選段落的指定位置
    UncheckedIndex(usize),
}

/// 購物清單索引
#[derive(Debug, Clone, Default)]
pub struct ShoppingListIndex {
    entries: HashMap<String, ShoppingListEntry>,
    order: Vec<String>,
}

impl ShoppingListIndex {
    /// 創建空的索引
    pub fn new() -> Self {
        Self::default()
    }

    /// 從持久化記錄重建，重複的ID依策略合併並產生警告
    pub fn from_entries(
        entries: Vec<ShoppingListEntry>,
        policy: &MergePolicy,
    ) -> (Self, Vec<CalcWarning>) {
        let mut index = Self::new();
        let mut warnings = Vec::new();

        for entry in entries {
            match index.entries.get(&entry.id) {
                Some(existing) => {
                    tracing::warn!("購物清單重複項目 {}，合併數量", entry.id);
                    let incoming = IncomingEntry {
                        id: entry.id.clone(),
                        name: entry.name.clone(),
                        category: entry.category.clone(),
                        quantity: entry.quantity,
                        checked: Some(entry.checked),
                        added_to_inventory: Some(entry.added_to_inventory),
                        updated_at: entry.updated_at,
                        ingredients: entry.ingredients.clone(),
                    };
                    match merge(existing, &incoming, policy) {
                        Ok(merged) => {
                            warnings.push(CalcWarning::warning(
                                entry.id.clone(),
                                "購物清單中有重複項目，已合併".to_string(),
                            ));
                            index.entries.insert(entry.id, merged);
                        }
                        Err(e) => warnings.push(CalcWarning::warning(
                            entry.id.clone(),
                            format!("重複項目無法合併，保留第一筆: {}", e),
                        )),
                    }
                }
                None => {
                    index.order.push(entry.id.clone());
                    index.entries.insert(entry.id.clone(), entry);
                }
            }
        }

        (index, warnings)
    }

    pub fn get(&self, id: &str) -> Option<&ShoppingListEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn section<'a>(
        &'a self,
        keep: impl Fn(&ShoppingListEntry) -> bool + 'a,
    ) -> impl Iterator<Item = &'a ShoppingListEntry> + 'a {
        self.order
            .iter()
            .filter_map(move |id| self.entries.get(id))
            .filter(move |e| keep(e))
    }

    /// 未勾選的一般項目（使用者順序）
    pub fn unchecked(&self) -> Vec<&ShoppingListEntry> {
        self.section(|e| !e.checked && !e.is_composite()).collect()
    }

    /// 已勾選的一般項目
    pub fn checked(&self) -> Vec<&ShoppingListEntry> {
        self.section(|e| e.checked && !e.is_composite()).collect()
    }

    /// 餐點項目
    pub fn composite(&self) -> Vec<&ShoppingListEntry> {
        self.section(|e| e.is_composite()).collect()
    }

    /// 完整清單：未勾選、已勾選、餐點
    pub fn ordered(&self) -> Vec<&ShoppingListEntry> {
        let mut all = self.unchecked();
        all.extend(self.checked());
        all.extend(self.composite());
        all
    }

    /// 計算合併結果（不修改索引），回傳項目與是否為新項目
    pub fn resolve(
        &self,
        incoming: IncomingEntry,
        policy: &MergePolicy,
    ) -> pantry_core::Result<(ShoppingListEntry, bool)> {
        match self.entries.get(&incoming.id) {
            Some(existing) => Ok((merge(existing, &incoming, policy)?, false)),
            None => Ok((incoming.into_entry(), true)),
        }
    }

    /// 寫入項目：已存在則原地取代，否則依位置插入。回傳是否為新項目
    pub fn upsert(&mut self, entry: ShoppingListEntry, placement: Placement) -> bool {
        if self.entries.contains_key(&entry.id) {
            self.entries.insert(entry.id.clone(), entry);
            return false;
        }

        let position = match placement {
            Placement::Append => None,
            Placement::UncheckedIndex(index) => self
                .unchecked()
                .get(index)
                .and_then(|anchor| self.order.iter().position(|id| id == &anchor.id)),
        };
        match position {
            Some(position) => self.order.insert(position, entry.id.clone()),
            None => self.order.push(entry.id.clone()),
        }
        self.entries.insert(entry.id.clone(), entry);
        true
    }

    /// 移除項目
    pub fn remove(&mut self, id: &str) -> Option<ShoppingListEntry> {
        let removed = self.entries.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    /// 移除所有符合條件的項目，回傳被移除的項目
    pub fn remove_where(
        &mut self,
        predicate: impl Fn(&ShoppingListEntry) -> bool,
    ) -> Vec<ShoppingListEntry> {
        let ids: Vec<String> = self
            .section(|e| predicate(e))
            .map(|e| e.id.clone())
            .collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    /// 以新的未勾選順序取代目前順序
    pub fn apply_unchecked_order(&mut self, ids: &[String]) -> pantry_core::Result<()> {
        let current: HashSet<&str> = self.unchecked().iter().map(|e| e.id.as_str()).collect();
        let requested: HashSet<&str> = ids.iter().map(String::as_str).collect();
        if current != requested || requested.len() != ids.len() {
            return Err(PantryError::InvalidOrder(
                "排序必須包含所有未勾選項目且不可重複".to_string(),
            ));
        }

        let rest: Vec<String> = self
            .order
            .iter()
            .filter(|id| !requested.contains(id.as_str()))
            .cloned()
            .collect();
        self.order = ids.iter().cloned().chain(rest).collect();
        Ok(())
    }
}
