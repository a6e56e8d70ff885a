//! 購物清單排序緩衝
//!
//! 上移／下移只交換記憶體中的未勾選順序並立即生效；
//! 寫回延遲到靜止時間結束，期間的新操作會取消並重新排程，
//! 因此只有最後穩定的順序會被寫入。

use pantry_core::{CollectionKind, PantryError, Result, ShoppingListEntry};
use std::sync::Arc;
use std::time::Duration;

use crate::persistence::{Persistence, Record};
use crate::scheduler::{TaskHandle, TaskScheduler};

/// 排序緩衝
pub struct OrderingBuffer {
    store: Arc<dyn Persistence>,
    scheduler: TaskScheduler,
    window: Duration,
    /// 未勾選項目（使用者順序）
    view: Vec<ShoppingListEntry>,
    /// 已勾選項目與餐點項目（維持原順序）
    trailing: Vec<ShoppingListEntry>,
    pending: Option<TaskHandle>,
}

impl OrderingBuffer {
    /// 創建排序緩衝
    pub fn new(store: Arc<dyn Persistence>, scheduler: TaskScheduler, window: Duration) -> Self {
        Self {
            store,
            scheduler,
            window,
            view: Vec::new(),
            trailing: Vec::new(),
            pending: None,
        }
    }

    /// 載入目前清單內容（不影響已排程的寫入）
    pub fn load(&mut self, unchecked: Vec<ShoppingListEntry>, trailing: Vec<ShoppingListEntry>) {
        self.view = unchecked;
        self.trailing = trailing;
    }

    /// 目前的未勾選順序
    pub fn view(&self) -> &[ShoppingListEntry] {
        &self.view
    }

    /// 目前的未勾選項目ID
    pub fn view_ids(&self) -> Vec<String> {
        self.view.iter().map(|e| e.id.clone()).collect()
    }

    /// 是否有尚未開始的寫入
    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| h.is_pending())
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.view
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| PantryError::EntryNotFound(id.to_string()))
    }

    /// 與前一個項目交換；已在最前面時不動作。回傳是否有移動
    pub fn move_up(&mut self, id: &str) -> Result<bool> {
        let index = self.position(id)?;
        if index == 0 {
            return Ok(false);
        }
        self.swap(index - 1, index)
    }

    /// 與後一個項目交換；已在最後面時不動作。回傳是否有移動
    pub fn move_down(&mut self, id: &str) -> Result<bool> {
        let index = self.position(id)?;
        if index + 1 >= self.view.len() {
            return Ok(false);
        }
        self.swap(index, index + 1)
    }

    fn swap(&mut self, a: usize, b: usize) -> Result<bool> {
        self.view.swap(a, b);
        tracing::debug!("排序交換: {} ↔ {}", self.view[a].id, self.view[b].id);
        self.schedule_write()?;
        Ok(true)
    }

    /// 完整清單記錄：未勾選順序在前，其後為已勾選與餐點項目
    pub fn payload(&self) -> Result<Vec<Record>> {
        self.view
            .iter()
            .chain(self.trailing.iter())
            .map(|entry| Record::from_value(entry.id.clone(), entry))
            .collect()
    }

    fn schedule_write(&mut self) -> Result<()> {
        let records = self.payload()?;
        let store = self.store.clone();
        let task = async move {
            let len = records.len();
            match store
                .write_collection(CollectionKind::ShoppingList, records)
                .await
            {
                Ok(()) => tracing::debug!("排序已寫回，共 {} 筆", len),
                Err(e) => tracing::error!("排序寫回失敗: {}", e),
            }
        };

        let handle = self
            .scheduler
            .reschedule(self.pending.take(), self.window, task);
        self.pending = Some(handle);
        Ok(())
    }

    /// 立即寫回尚未開始的排序；若寫入已在背景進行則等待其完成。
    /// 回傳是否由此呼叫執行了寫入
    pub async fn flush(&mut self) -> Result<bool> {
        let Some(handle) = self.pending.take() else {
            return Ok(false);
        };

        if handle.cancel() {
            handle.wait().await;
            let records = self.payload()?;
            self.store
                .write_collection(CollectionKind::ShoppingList, records)
                .await?;
            tracing::debug!("排序已提前寫回");
            Ok(true)
        } else {
            handle.wait().await;
            Ok(false)
        }
    }
}

impl Drop for OrderingBuffer {
    fn drop(&mut self) {
        if self.has_pending() {
            tracing::warn!("排序緩衝釋放時仍有未寫回的排序，交由背景任務完成");
        }
    }
}
