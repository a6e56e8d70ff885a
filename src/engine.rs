//! 對帳引擎
//!
//! 持有食物庫、庫存帳本與購物清單索引，所有修改都先寫入持久化層，
//! 寫入成功後才套用到記憶體狀態。排序是唯一的例外（先更新畫面，延遲寫回）。

use pantry_calc::{
    AutoRestockTrigger, CalcWarning, DeficitCalculator, MergePolicy, Placement, RestockDecision,
    ShoppingListIndex,
};
use pantry_core::{
    normalize_category, Catalog, CatalogItem, CatalogRecord, ChangeOutcome, CollectionKind,
    EngineConfig, IncomingEntry, InventoryChange, InventoryEntry, InventoryLedger, PantryError,
    Result, ShoppingListEntry,
};
use pantry_sync::{OrderingBuffer, Persistence, Record, TaskScheduler};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::outcome::{InventoryUpdate, RestockOutcome, ShoppingAddOutcome};

/// 食物庫／庫存／購物清單對帳引擎
pub struct GroceryEngine {
    pub(crate) config: EngineConfig,
    pub(crate) store: Arc<dyn Persistence>,
    pub(crate) catalog: Catalog,
    pub(crate) inventory: InventoryLedger,
    pub(crate) list: ShoppingListIndex,
    pub(crate) policy: MergePolicy,
    pub(crate) ordering: OrderingBuffer,
    load_warnings: Vec<CalcWarning>,
}

impl GroceryEngine {
    /// 從持久化層載入三個集合並建立引擎
    ///
    /// 必須在 tokio runtime 中呼叫（排序寫回使用背景計時器）。
    pub async fn load(store: Arc<dyn Persistence>, config: EngineConfig) -> Result<Self> {
        let scheduler = TaskScheduler::current()?;
        let mut warnings = Vec::new();

        let catalog_records: Vec<CatalogRecord> = parse_records(
            store.read_collection(CollectionKind::Catalog).await?,
            CollectionKind::Catalog,
            &mut warnings,
        );
        let catalog = Catalog::from_records(catalog_records);

        let inventory_entries: Vec<InventoryEntry> = parse_records(
            store.read_collection(CollectionKind::Inventory).await?,
            CollectionKind::Inventory,
            &mut warnings,
        );
        let inventory = InventoryLedger::from_entries(inventory_entries);

        let mut list_entries: Vec<ShoppingListEntry> = parse_records(
            store.read_collection(CollectionKind::ShoppingList).await?,
            CollectionKind::ShoppingList,
            &mut warnings,
        );
        for entry in &mut list_entries {
            entry.category = normalize_category(&entry.category, &config.fallback_category);
        }
        let policy = MergePolicy::default();
        let (list, list_warnings) = ShoppingListIndex::from_entries(list_entries, &policy);
        warnings.extend(list_warnings);

        tracing::info!(
            "引擎載入完成：食物庫 {} 項，庫存 {} 項，購物清單 {} 項，警告 {} 則",
            catalog.len(),
            inventory.len(),
            list.len(),
            warnings.len()
        );

        let ordering = OrderingBuffer::new(store.clone(), scheduler, config.reorder_debounce());
        Ok(Self {
            config,
            store,
            catalog,
            inventory,
            list,
            policy,
            ordering,
            load_warnings: warnings,
        })
    }

    /// 建構器模式：設置合併策略
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn inventory(&self) -> &InventoryLedger {
        &self.inventory
    }

    pub fn shopping_list(&self) -> &ShoppingListIndex {
        &self.list
    }

    /// 載入時發現的資料完整性警告
    pub fn load_warnings(&self) -> &[CalcWarning] {
        &self.load_warnings
    }

    /// 項目的顯示名稱與類別：優先使用食物庫，其次使用提供的值
    pub(crate) fn identity_for(&self, id: &str, name: &str, category: &str) -> (String, String) {
        match self.catalog.get(id) {
            Some(item) => (
                item.name.clone(),
                normalize_category(&item.category, &self.config.fallback_category),
            ),
            None => {
                let name = if name.trim().is_empty() { id } else { name };
                (
                    name.to_string(),
                    normalize_category(category, &self.config.fallback_category),
                )
            }
        }
    }

    // ---------------------------------------------------------------
    // 食物庫編輯
    // ---------------------------------------------------------------

    async fn write_catalog_item(&self, item: &CatalogItem) -> Result<()> {
        let record = CatalogRecord::Item(item.clone());
        self.store
            .write_record(
                CollectionKind::Catalog,
                Record::from_value(record.record_id(), &record)?,
            )
            .await
    }

    async fn write_category(&self, name: &str) -> Result<()> {
        let record = CatalogRecord::Category {
            name: name.to_string(),
        };
        self.store
            .write_record(
                CollectionKind::Catalog,
                Record::from_value(record.record_id(), &record)?,
            )
            .await
    }

    async fn write_catalog_items(&self, staged: &Catalog, ids: &[String]) -> Result<()> {
        for id in ids {
            if let Some(item) = staged.get(id) {
                self.write_catalog_item(item).await?;
            }
        }
        Ok(())
    }

    /// 新增類別
    pub async fn add_category(&mut self, name: &str) -> Result<()> {
        let mut staged = self.catalog.clone();
        staged.add_category(name)?;
        self.write_category(name.trim()).await?;
        self.catalog = staged;
        Ok(())
    }

    /// 重新命名類別，並更新該類別下的所有項目
    pub async fn rename_category(&mut self, old: &str, new: &str) -> Result<Vec<String>> {
        let mut staged = self.catalog.clone();
        let affected = staged.rename_category(old, new)?;

        self.write_category(new.trim()).await?;
        self.write_catalog_items(&staged, &affected).await?;
        if old != new.trim() {
            self.store
                .delete_record(
                    CollectionKind::Catalog,
                    &CatalogRecord::category_record_id(old),
                )
                .await?;
        }

        tracing::info!("類別 {} 重新命名為 {}，影響 {} 項", old, new, affected.len());
        self.catalog = staged;
        Ok(affected)
    }

    /// 刪除類別，其下項目改歸後備類別（後備類別本身不可刪除）
    pub async fn delete_category(&mut self, name: &str) -> Result<Vec<String>> {
        let fallback = self.config.fallback_category.clone();
        let mut staged = self.catalog.clone();
        let affected = staged.delete_category(name, &fallback)?;

        if staged.has_category(&fallback) && !self.catalog.has_category(&fallback) {
            self.write_category(&fallback).await?;
        }
        self.write_catalog_items(&staged, &affected).await?;
        self.store
            .delete_record(
                CollectionKind::Catalog,
                &CatalogRecord::category_record_id(name),
            )
            .await?;

        tracing::info!("類別 {} 已刪除，{} 項改歸 {}", name, affected.len(), fallback);
        self.catalog = staged;
        Ok(affected)
    }

    /// 新增食物庫項目，回傳項目ID
    pub async fn add_item(&mut self, item: CatalogItem) -> Result<String> {
        let mut staged = self.catalog.clone();
        let id = item.id.clone();
        let is_new_category = !staged.has_category(&item.category);
        staged.add_item(item)?;

        if let Some(item) = staged.get(&id) {
            if is_new_category && staged.has_category(&item.category) {
                self.write_category(&item.category).await?;
            }
            self.write_catalog_item(item).await?;
        }
        self.catalog = staged;
        Ok(id)
    }

    /// 編輯食物庫項目，回傳舊版本
    pub async fn edit_item(&mut self, item: CatalogItem) -> Result<CatalogItem> {
        let mut staged = self.catalog.clone();
        let previous = staged.edit_item(item.clone())?;
        if !self.catalog.has_category(&item.category) && staged.has_category(&item.category) {
            self.write_category(&item.category).await?;
        }
        self.write_catalog_item(&item).await?;
        self.catalog = staged;
        Ok(previous)
    }

    /// 移除食物庫項目（不影響庫存與購物清單）
    pub async fn remove_item(&mut self, id: &str) -> Result<CatalogItem> {
        let mut staged = self.catalog.clone();
        let removed = staged.remove_item(id)?;
        self.store
            .delete_record(CollectionKind::Catalog, id)
            .await?;
        self.catalog = staged;
        Ok(removed)
    }

    // ---------------------------------------------------------------
    // 庫存
    // ---------------------------------------------------------------

    /// 寫入庫存變動（新增／更新或刪除記錄）
    pub(crate) async fn write_inventory_change(&self, change: &InventoryChange) -> Result<()> {
        match (change.outcome, &change.entry) {
            (ChangeOutcome::Upserted, Some(entry)) => {
                self.store
                    .write_record(
                        CollectionKind::Inventory,
                        Record::from_value(entry.id.clone(), entry)?,
                    )
                    .await
            }
            (ChangeOutcome::Removed, _) => {
                self.store
                    .delete_record(CollectionKind::Inventory, &change.item_id)
                    .await
            }
            _ => Ok(()),
        }
    }

    /// 還原庫存記錄到變動前的狀態（補償寫入）
    pub(crate) async fn restore_inventory(&self, item_id: &str) -> Result<()> {
        match self.inventory.get(item_id) {
            Some(entry) => {
                self.store
                    .write_record(
                        CollectionKind::Inventory,
                        Record::from_value(entry.id.clone(), entry)?,
                    )
                    .await
            }
            None => {
                self.store
                    .delete_record(CollectionKind::Inventory, item_id)
                    .await
            }
        }
    }

    /// 設定庫存數量；數量為 0 時移除記錄
    pub async fn set_inventory(&mut self, id: &str, quantity: Decimal) -> Result<InventoryUpdate> {
        let (name, category) = self.inventory_identity(id);
        let change = self.inventory.plan_set(id, &name, &category, quantity)?;
        self.commit_inventory_change(change).await
    }

    /// 以增減量調整庫存，最低為 0
    pub async fn adjust_inventory(&mut self, id: &str, delta: Decimal) -> Result<InventoryUpdate> {
        let target = self
            .inventory
            .quantity(id)
            .checked_add(delta)
            .ok_or_else(|| PantryError::InvalidQuantity(format!("庫存 {} 數量溢位", id)))?
            .max(Decimal::ZERO);
        self.set_inventory(id, target).await
    }

    fn inventory_identity(&self, id: &str) -> (String, String) {
        match self.inventory.get(id) {
            Some(entry) => self.identity_for(id, &entry.name, &entry.category),
            None => self.identity_for(id, "", ""),
        }
    }

    /// 寫入並套用庫存變動，接著進行自動補貨判斷
    ///
    /// 補貨寫入失敗時回傳錯誤，但庫存變動已寫入且已套用。
    pub(crate) async fn commit_inventory_change(
        &mut self,
        change: InventoryChange,
    ) -> Result<InventoryUpdate> {
        self.write_inventory_change(&change).await?;
        self.inventory.apply(&change);
        tracing::debug!(
            "庫存變動: {} {} → {} ({:?})",
            change.item_id,
            change.old_quantity,
            change.new_quantity,
            change.outcome
        );

        let restock = self.evaluate_restock(&change).await?;
        Ok(InventoryUpdate { change, restock })
    }

    pub(crate) async fn evaluate_restock(
        &mut self,
        change: &InventoryChange,
    ) -> Result<Option<RestockOutcome>> {
        if !self.config.restock_enabled || change.outcome == ChangeOutcome::Unchanged {
            return Ok(None);
        }
        let Some(item) = self.catalog.get(&change.item_id).cloned() else {
            return Ok(None);
        };
        if !item.auto_restock {
            return Ok(None);
        }

        let decision = AutoRestockTrigger::on_inventory_change(
            change.old_quantity,
            change.new_quantity,
            &item,
            &self.list,
        );

        let added = match &decision {
            RestockDecision::Skip(_) => None,
            RestockDecision::Fire { quantity, .. } => {
                Some(self.enqueue_restock(&item, *quantity).await?)
            }
        };

        Ok(Some(RestockOutcome { decision, added }))
    }

    async fn enqueue_restock(
        &mut self,
        item: &CatalogItem,
        quantity: Decimal,
    ) -> Result<ShoppingAddOutcome> {
        if item.is_composite() {
            let report = DeficitCalculator::compute(
                item,
                quantity,
                &self.catalog,
                &self.inventory,
                &self.list,
            )?;
            let is_update = self.list.contains(&item.id);
            let mut outcome = self
                .add_composite(item, quantity, report.lines, is_update)
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
}

/// 解析集合記錄，無法解析的記錄略過並產生警告
fn parse_records<T: DeserializeOwned>(
    records: Vec<Record>,
    kind: CollectionKind,
    warnings: &mut Vec<CalcWarning>,
) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| match record.parse::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("無法解析 {} 記錄 {}: {}", kind, record.id, e);
                warnings.push(CalcWarning::warning(
                    record.id.clone(),
                    format!("無法解析 {} 記錄: {}", kind, e),
                ));
                None
            }
        })
        .collect()
}
