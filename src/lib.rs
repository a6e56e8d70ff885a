//! # Pantry
//!
//! 食物庫、庫存與購物清單的對帳引擎
//!
//! - 依庫存計算餐點的成分短缺
//! - 購物清單的合併／新增判斷
//! - 庫存向下穿越門檻時自動補貨
//! - 購物清單排序的即時更新與延遲寫回

pub mod engine;
pub mod outcome;
mod shopping;

// Re-export 主要類型
pub use engine::GroceryEngine;
pub use outcome::{
    AddOutcome, CompositeAddOutcome, CompositeNotice, InventoryUpdate, PurchaseOutcome,
    RestockOutcome, ShoppingAddOutcome,
};

pub use pantry_calc::{
    CalcWarning, DeficitCalculator, DeficitReport, MergePolicy, Placement, RestockDecision,
    RestockSkip, ShoppingListIndex,
};
pub use pantry_core::{
    Catalog, CatalogItem, CollectionKind, DeficitLine, EngineConfig, IncomingEntry, Ingredient,
    InventoryEntry, InventoryLedger, PantryError, Result, ShoppingListEntry,
};
pub use pantry_sync::{MemoryStore, Persistence, Record};
