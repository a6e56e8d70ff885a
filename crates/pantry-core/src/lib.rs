//! # Pantry Core
//!
//! 核心資料模型與類型定義：食物庫（目錄）、庫存、購物清單

pub mod catalog;
pub mod collection;
pub mod config;
pub mod inventory;
pub mod shopping;

// Re-export 主要類型
pub use catalog::{Catalog, CatalogItem, CatalogRecord, Ingredient};
pub use collection::CollectionKind;
pub use config::EngineConfig;
pub use inventory::{ChangeOutcome, InventoryChange, InventoryEntry, InventoryLedger};
pub use shopping::{DeficitLine, IncomingEntry, ShoppingListEntry};

/// 未分類時使用的預設類別名稱
pub const UNCATEGORIZED: &str = "Uncategorized";

/// 將空白類別正規化為後備類別
pub fn normalize_category(category: &str, fallback: &str) -> String {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Pantry 錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum PantryError {
    #[error("找不到食物庫項目: {0}")]
    ItemNotFound(String),

    #[error("找不到購物清單項目: {0}")]
    EntryNotFound(String),

    #[error("食物庫項目已存在: {0}")]
    DuplicateItem(String),

    #[error("找不到類別: {0}")]
    CategoryNotFound(String),

    #[error("無效的名稱: {0:?}")]
    InvalidName(String),

    #[error("類別已存在: {0}")]
    CategoryExists(String),

    #[error("後備類別不可刪除: {0}")]
    ProtectedCategory(String),

    #[error("無效的數量: {0}")]
    InvalidQuantity(String),

    #[error("組合項目不可引用自身: {0}")]
    SelfReferencingComposite(String),

    #[error("無效的合併策略: {0}")]
    InvalidMergePolicy(String),

    #[error("無效的排序: {0}")]
    InvalidOrder(String),

    #[error("持久化失敗: {0}")]
    Persistence(String),

    #[error("排程錯誤: {0}")]
    Scheduler(String),

    #[error("序列化錯誤: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PantryError>;
