//! # Pantry Calculation Engine
//!
//! 食物短缺計算、購物清單合併與自動補貨判斷

pub mod deficit;
pub mod index;
pub mod merge;
pub mod restock;

// Re-export 主要類型
pub use deficit::{DeficitCalculator, DeficitReport};
pub use index::{Placement, ShoppingListIndex};
pub use merge::{merge, EntryField, FieldPolicy, MergePolicy};
pub use restock::{AutoRestockTrigger, RestockDecision, RestockSkip};

/// 計算警告（非致命的資料完整性問題）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcWarning {
    pub item_id: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl CalcWarning {
    pub fn new(item_id: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            item_id,
            message,
            severity,
        }
    }

    pub fn info(item_id: String, message: String) -> Self {
        Self::new(item_id, message, WarningSeverity::Info)
    }

    pub fn warning(item_id: String, message: String) -> Self {
        Self::new(item_id, message, WarningSeverity::Warning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Info,
    Warning,
}
