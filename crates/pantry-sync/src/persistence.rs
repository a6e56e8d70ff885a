//! 持久化協作者
//!
//! 引擎只透過此介面讀寫遠端文件庫，不實作重試。

use async_trait::async_trait;
use pantry_core::{CollectionKind, PantryError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// 一筆持久化記錄
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub body: Value,
}

impl Record {
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }

    /// 由可序列化的值建立記錄
    pub fn from_value<T: Serialize>(id: impl Into<String>, value: &T) -> Result<Self> {
        Ok(Self::new(id, serde_json::to_value(value)?))
    }

    /// 解析記錄內容
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// 持久化介面
#[async_trait]
pub trait Persistence: Send + Sync {
    /// 讀取整個集合（依儲存順序）
    async fn read_collection(&self, kind: CollectionKind) -> Result<Vec<Record>>;

    /// 寫入單筆記錄（存在則取代）
    async fn write_record(&self, kind: CollectionKind, record: Record) -> Result<()>;

    /// 以整批記錄取代整個集合
    async fn write_collection(&self, kind: CollectionKind, records: Vec<Record>) -> Result<()>;

    /// 刪除單筆記錄
    async fn delete_record(&self, kind: CollectionKind, id: &str) -> Result<()>;
}

/// 寫入操作紀錄
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Record { kind: CollectionKind, id: String },
    Collection { kind: CollectionKind, len: usize },
    Delete { kind: CollectionKind, id: String },
}

#[derive(Debug, Default)]
struct StoreState {
    collections: HashMap<CollectionKind, Vec<Record>>,
    log: Vec<WriteOp>,
    failing: Vec<CollectionKind>,
    /// 集合 → 距離下一次失敗的寫入次數
    fail_at: HashMap<CollectionKind, usize>,
}

/// 記憶體內的文件庫（測試與示範用）
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 預先放入集合內容
    pub fn seed(&self, kind: CollectionKind, records: Vec<Record>) {
        let mut state = self.lock();
        state.collections.insert(kind, records);
    }

    /// 讓指定集合的寫入失敗（用於測試錯誤處理）
    pub fn set_failing(&self, kind: CollectionKind, failing: bool) {
        let mut state = self.lock();
        state.failing.retain(|k| *k != kind);
        if failing {
            state.failing.push(kind);
        }
    }

    /// 讓指定集合接下來的第 `n` 次寫入失敗一次（從 1 起算）
    pub fn fail_nth_write(&self, kind: CollectionKind, n: usize) {
        self.lock().fail_at.insert(kind, n);
    }

    /// 所有成功的寫入操作
    pub fn write_log(&self) -> Vec<WriteOp> {
        self.lock().log.clone()
    }

    /// 指定集合的整批寫入次數
    pub fn collection_writes(&self, kind: CollectionKind) -> usize {
        self.lock()
            .log
            .iter()
            .filter(|op| matches!(op, WriteOp::Collection { kind: k, .. } if *k == kind))
            .count()
    }

    /// 目前的集合內容
    pub fn snapshot(&self, kind: CollectionKind) -> Vec<Record> {
        self.lock()
            .collections
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// 查詢單筆記錄
    pub fn record(&self, kind: CollectionKind, id: &str) -> Option<Record> {
        self.lock()
            .collections
            .get(&kind)
            .and_then(|records| records.iter().find(|r| r.id == id).cloned())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // 鎖不會跨越 await，中毒時沿用內部狀態
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(state: &mut StoreState, kind: CollectionKind) -> Result<()> {
        let tripped = match state.fail_at.get_mut(&kind) {
            Some(remaining) if *remaining <= 1 => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        };
        if tripped {
            state.fail_at.remove(&kind);
        }
        if tripped || state.failing.contains(&kind) {
            return Err(PantryError::Persistence(format!("寫入 {} 失敗", kind)));
        }
        Ok(())
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn read_collection(&self, kind: CollectionKind) -> Result<Vec<Record>> {
        Ok(self.snapshot(kind))
    }

    async fn write_record(&self, kind: CollectionKind, record: Record) -> Result<()> {
        let mut state = self.lock();
        Self::check_writable(&mut state, kind)?;

        let id = record.id.clone();
        let records = state.collections.entry(kind).or_default();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        state.log.push(WriteOp::Record { kind, id });
        Ok(())
    }

    async fn write_collection(&self, kind: CollectionKind, records: Vec<Record>) -> Result<()> {
        let mut state = self.lock();
        Self::check_writable(&mut state, kind)?;

        let len = records.len();
        state.collections.insert(kind, records);
        state.log.push(WriteOp::Collection { kind, len });
        Ok(())
    }

    async fn delete_record(&self, kind: CollectionKind, id: &str) -> Result<()> {
        let mut state = self.lock();
        Self::check_writable(&mut state, kind)?;

        if let Some(records) = state.collections.get_mut(&kind) {
            records.retain(|r| r.id != id);
        }
        state.log.push(WriteOp::Delete {
            kind,
            id: id.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_record_replaces_in_place() {
        let store = MemoryStore::new();
        let kind = CollectionKind::ShoppingList;

        store.write_record(kind, Record::new("a", json!({"q": 1}))).await.unwrap();
        store.write_record(kind, Record::new("b", json!({"q": 2}))).await.unwrap();
        store.write_record(kind, Record::new("a", json!({"q": 3}))).await.unwrap();

        let records = store.read_collection(kind).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[0].body["q"], 3);
        assert_eq!(store.write_log().len(), 3);
    }

    #[tokio::test]
    async fn test_write_collection_and_delete() {
        let store = MemoryStore::new();
        let kind = CollectionKind::Inventory;

        store
            .write_collection(
                kind,
                vec![Record::new("x", json!({})), Record::new("y", json!({}))],
            )
            .await
            .unwrap();
        store.delete_record(kind, "x").await.unwrap();

        assert_eq!(store.snapshot(kind).len(), 1);
        assert_eq!(store.collection_writes(kind), 1);
        assert!(store.record(kind, "y").is_some());
    }

    #[tokio::test]
    async fn test_failing_collection_rejects_writes() {
        let store = MemoryStore::new();
        store.set_failing(CollectionKind::Catalog, true);

        let result = store
            .write_record(CollectionKind::Catalog, Record::new("a", json!({})))
            .await;
        assert!(matches!(result, Err(PantryError::Persistence(_))));
        assert!(store.write_log().is_empty());

        store.set_failing(CollectionKind::Catalog, false);
        assert!(store
            .write_record(CollectionKind::Catalog, Record::new("a", json!({})))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_nth_write_fails_once() {
        let store = MemoryStore::new();
        let kind = CollectionKind::ShoppingList;
        store.fail_nth_write(kind, 2);

        assert!(store.write_record(kind, Record::new("a", json!({}))).await.is_ok());
        assert!(store.write_record(kind, Record::new("b", json!({}))).await.is_err());
        assert!(store.write_record(kind, Record::new("c", json!({}))).await.is_ok());

        let ids: Vec<String> = store.snapshot(kind).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_record_parse() {
        let record = Record::new("a", json!({"name": "x"}));
        let parsed: HashMap<String, String> = record.parse().unwrap();
        assert_eq!(parsed["name"], "x");
    }
}
