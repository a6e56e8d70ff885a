//! 購物清單操作：合併／新增、餐點加入、勾選與復原、清除、排序

use chrono::Utc;
use pantry_calc::{DeficitCalculator, Placement};
use pantry_core::{
    CatalogItem, CollectionKind, DeficitLine, IncomingEntry, PantryError, Result,
    ShoppingListEntry,
};
use pantry_sync::Record;
use rust_decimal::Decimal;

use crate::engine::GroceryEngine;
use crate::outcome::{
    AddOutcome, CompositeAddOutcome, InventoryUpdate, PurchaseOutcome, ShoppingAddOutcome,
};

impl GroceryEngine {
    async fn write_entry(&self, entry: &ShoppingListEntry) -> Result<()> {
        self.store
            .write_record(
                CollectionKind::ShoppingList,
                Record::from_value(entry.id.clone(), entry)?,
            )
            .await
    }

    /// 合併或新增單一項目
    ///
    /// 同ID已存在時依合併策略合併（預設數量加總），否則以未勾選狀態新增。
    pub async fn add_or_merge(
        &mut self,
        mut incoming: IncomingEntry,
        placement: Placement,
    ) -> Result<AddOutcome> {
        self.ordering.flush().await?;
        self.prepare_incoming(&mut incoming)?;

        let (entry, created) = self.list.resolve(incoming, &self.policy)?;
        self.write_entry(&entry).await?;
        self.list.upsert(entry.clone(), placement);

        tracing::debug!(
            "購物清單{}: {} 數量 {}",
            if created { "新增" } else { "合併" },
            entry.id,
            entry.quantity
        );
        Ok(AddOutcome { entry, created })
    }

    /// 檢查數量並以食物庫資料補齊名稱與類別
    fn prepare_incoming(&self, incoming: &mut IncomingEntry) -> Result<()> {
        if incoming.quantity < Decimal::ZERO {
            return Err(PantryError::InvalidQuantity(format!(
                "購物清單數量不可為負：{}",
                incoming.quantity
            )));
        }
        let (name, category) =
            self.identity_for(&incoming.id, &incoming.name, &incoming.category);
        incoming.name = name;
        incoming.category = category;
        Ok(())
    }

    /// 加入餐點項目及其短缺成分
    ///
    /// `is_update` 與各成分的 `update_item` 只是提示；實際是否合併
    /// 一律以寫入當下的清單狀態為準。餐點與成分全部寫入成功後才更新清單，
    /// 任一筆失敗時還原已寫入的記錄。
    pub async fn add_composite(
        &mut self,
        item: &CatalogItem,
        quantity: Decimal,
        lines: Vec<DeficitLine>,
        is_update: bool,
    ) -> Result<CompositeAddOutcome> {
        self.ordering.flush().await?;
        if is_update != self.list.contains(&item.id) {
            tracing::debug!("餐點 {} 的更新提示已過期，以目前清單為準", item.id);
        }

        let mut staged = self.list.clone();

        let mut incoming = IncomingEntry::new(
            item.id.clone(),
            item.name.clone(),
            item.category.clone(),
            quantity,
        )
        .with_ingredients(lines.clone());
        self.prepare_incoming(&mut incoming)?;
        let (entry, created) = staged.resolve(incoming, &self.policy)?;
        staged.upsert(entry.clone(), Placement::Append);
        let meal = AddOutcome { entry, created };

        let mut ingredients = Vec::with_capacity(lines.len());
        for line in &lines {
            if line.update_item != staged.contains(&line.id) {
                tracing::debug!("成分 {} 的更新提示已過期，以目前清單為準", line.id);
            }
            let mut incoming = IncomingEntry::from(line.clone());
            self.prepare_incoming(&mut incoming)?;
            let (entry, created) = staged.resolve(incoming, &self.policy)?;
            staged.upsert(entry.clone(), Placement::Append);
            ingredients.push(AddOutcome { entry, created });
        }

        let written: Vec<&ShoppingListEntry> = std::iter::once(&meal.entry)
            .chain(ingredients.iter().map(|o| &o.entry))
            .collect();
        self.write_entries_or_rollback(&written).await?;
        self.list = staged;

        tracing::info!(
            "餐點 {} 加入購物清單，短缺成分 {} 項",
            item.id,
            lines.len()
        );
        Ok(CompositeAddOutcome {
            meal,
            ingredients,
            deficit: lines,
            warnings: Vec::new(),
        })
    }

    /// 依序寫入多筆項目；失敗時把已寫入的記錄還原為目前清單中的狀態
    async fn write_entries_or_rollback(&self, entries: &[&ShoppingListEntry]) -> Result<()> {
        for (index, entry) in entries.iter().enumerate() {
            let Err(e) = self.write_entry(entry).await else {
                continue;
            };
            tracing::warn!(
                "購物清單寫入失敗於 {}，還原已寫入的 {} 筆: {}",
                entry.id,
                index,
                e
            );
            for done in entries[..index].iter().rev() {
                let restored = match self.list.get(&done.id) {
                    Some(previous) => self.write_entry(previous).await,
                    None => {
                        self.store
                            .delete_record(CollectionKind::ShoppingList, &done.id)
                            .await
                    }
                };
                if let Err(restore_err) = restored {
                    tracing::error!("購物清單還原失敗 {}: {}", done.id, restore_err);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// 依食物庫項目加入購物清單：餐點先計算短缺成分，一般項目直接合併
    pub async fn add_to_shopping_list(
        &mut self,
        item_id: &str,
        quantity: Decimal,
    ) -> Result<ShoppingAddOutcome> {
        if quantity <= Decimal::ZERO {
            return Err(PantryError::InvalidQuantity(format!(
                "加入數量必須大於 0：{}",
                quantity
            )));
        }
        let item = self.catalog.require(item_id)?.clone();

        if item.is_composite() {
            // 每次都重新計算，即使結果為空
            let report = DeficitCalculator::compute(
                &item,
                quantity,
                &self.catalog,
                &self.inventory,
                &self.list,
            )?;
            let is_update = self.list.contains(&item.id);
            let mut outcome = self
                .add_composite(&item, quantity, report.lines, is_update)
                .await?;
            outcome.warnings = report.warnings;
            Ok(ShoppingAddOutcome::Composite(outcome))
        } else {
            let incoming = IncomingEntry::new(
                item.id.clone(),
                item.name.clone(),
                item.category.clone(),
                quantity,
            );
            let outcome = self.add_or_merge(incoming, Placement::Append).await?;
            Ok(ShoppingAddOutcome::Simple(outcome))
        }
    }

    fn require_entry(&self, id: &str) -> Result<ShoppingListEntry> {
        self.list
            .get(id)
            .cloned()
            .ok_or_else(|| PantryError::EntryNotFound(id.to_string()))
    }

    /// 寫入項目；失敗時以補償寫入還原庫存記錄
    async fn write_entry_or_restore(&self, entry: &ShoppingListEntry) -> Result<()> {
        if let Err(e) = self.write_entry(entry).await {
            tracing::warn!("購物清單寫入失敗，還原庫存 {}: {}", entry.id, e);
            if let Err(restore_err) = self.restore_inventory(&entry.id).await {
                tracing::error!("庫存還原失敗 {}: {}", entry.id, restore_err);
            }
            return Err(e);
        }
        Ok(())
    }

    /// 勾選（已購買）：同時把購買數量加入庫存
    pub async fn mark_purchased(
        &mut self,
        id: &str,
        purchased_quantity: Decimal,
    ) -> Result<PurchaseOutcome> {
        self.ordering.flush().await?;
        let entry = self.require_entry(id)?;
        if entry.checked && entry.added_to_inventory {
            tracing::debug!("{} 已勾選，略過", id);
            return Ok(PurchaseOutcome {
                entry,
                inventory: None,
            });
        }

        let (name, category) = self.identity_for(id, &entry.name, &entry.category);
        let change = self
            .inventory
            .plan_increment(id, &name, &category, purchased_quantity)?;

        let updated = ShoppingListEntry {
            checked: true,
            added_to_inventory: true,
            updated_at: Utc::now(),
            ..entry
        };

        self.write_inventory_change(&change).await?;
        self.write_entry_or_restore(&updated).await?;

        self.inventory.apply(&change);
        self.list.upsert(updated.clone(), Placement::Append);
        tracing::info!("{} 已購買，庫存 {} → {}", id, change.old_quantity, change.new_quantity);

        Ok(PurchaseOutcome {
            entry: updated,
            inventory: Some(InventoryUpdate {
                change,
                restock: None,
            }),
        })
    }

    /// 取消勾選：從庫存扣回項目數量（最低為 0）
    pub async fn undo_purchase(&mut self, id: &str) -> Result<PurchaseOutcome> {
        self.ordering.flush().await?;
        let entry = self.require_entry(id)?;
        if !entry.checked {
            return Ok(PurchaseOutcome {
                entry,
                inventory: None,
            });
        }

        let change = if entry.added_to_inventory {
            Some(self.inventory.plan_decrement(id, entry.quantity)?)
        } else {
            None
        };
        let updated = ShoppingListEntry {
            checked: false,
            added_to_inventory: false,
            updated_at: Utc::now(),
            ..entry
        };

        if let Some(change) = &change {
            self.write_inventory_change(change).await?;
        }
        self.write_entry_or_restore(&updated).await?;
        self.list.upsert(updated.clone(), Placement::Append);

        let inventory = match change {
            Some(change) => {
                // 庫存已寫入；套用並進行補貨判斷
                self.inventory.apply(&change);
                let restock = self.evaluate_restock(&change).await?;
                Some(InventoryUpdate { change, restock })
            }
            None => None,
        };
        tracing::info!("{} 已取消勾選", id);

        Ok(PurchaseOutcome {
            entry: updated,
            inventory,
        })
    }

    /// 刪除項目（不影響庫存）
    pub async fn delete_entry(&mut self, id: &str) -> Result<ShoppingListEntry> {
        self.ordering.flush().await?;
        self.require_entry(id)?;
        self.store
            .delete_record(CollectionKind::ShoppingList, id)
            .await?;
        self.list
            .remove(id)
            .ok_or_else(|| PantryError::EntryNotFound(id.to_string()))
    }

    /// 一次清除所有已勾選項目（整批寫入，全部成功或全部不變）
    pub async fn clear_purchased(&mut self) -> Result<Vec<ShoppingListEntry>> {
        self.ordering.flush().await?;
        if !self.list.ordered().iter().any(|e| e.checked) {
            return Ok(Vec::new());
        }

        let remaining = self
            .list
            .ordered()
            .into_iter()
            .filter(|e| !e.checked)
            .map(|e| Record::from_value(e.id.clone(), e))
            .collect::<Result<Vec<_>>>()?;
        self.store
            .write_collection(CollectionKind::ShoppingList, remaining)
            .await?;

        let removed = self.list.remove_where(|e| e.checked);
        tracing::info!("清除已購買項目 {} 筆", removed.len());
        Ok(removed)
    }

    // ---------------------------------------------------------------
    // 排序
    // ---------------------------------------------------------------

    fn load_ordering(&mut self) {
        let unchecked = self.list.unchecked().into_iter().cloned().collect();
        let mut trailing: Vec<ShoppingListEntry> =
            self.list.checked().into_iter().cloned().collect();
        trailing.extend(self.list.composite().into_iter().cloned());
        self.ordering.load(unchecked, trailing);
    }

    fn apply_ordering(&mut self, moved: bool) -> Result<bool> {
        if moved {
            self.list.apply_unchecked_order(&self.ordering.view_ids())?;
        }
        Ok(moved)
    }

    /// 未勾選項目上移一格，立即生效並延遲寫回
    pub fn move_up(&mut self, id: &str) -> Result<bool> {
        self.load_ordering();
        let moved = self.ordering.move_up(id)?;
        self.apply_ordering(moved)
    }

    /// 未勾選項目下移一格，立即生效並延遲寫回
    pub fn move_down(&mut self, id: &str) -> Result<bool> {
        self.load_ordering();
        let moved = self.ordering.move_down(id)?;
        self.apply_ordering(moved)
    }

    /// 立即寫回尚未寫入的排序
    pub async fn flush_ordering(&mut self) -> Result<bool> {
        self.ordering.flush().await
    }

    /// 是否有等待寫回的排序
    pub fn has_pending_ordering(&self) -> bool {
        self.ordering.has_pending()
    }
}
