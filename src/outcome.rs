//! 引擎操作結果

use pantry_calc::{CalcWarning, RestockDecision};
use pantry_core::{DeficitLine, InventoryChange, ShoppingListEntry};

/// 單一項目加入購物清單的結果
#[derive(Debug, Clone, PartialEq)]
pub struct AddOutcome {
    /// 寫入後的項目
    pub entry: ShoppingListEntry,
    /// 是否為新建立的項目（否則為合併）
    pub created: bool,
}

/// 呼叫端提示訊息的種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeNotice {
    /// 已加入，並附帶 N 個短缺成分
    AddedWithIngredients(usize),
    /// 已加入，成分庫存足夠
    AlreadyInStock,
}

/// 組合項目（餐點）加入購物清單的結果
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeAddOutcome {
    /// 餐點項目本身
    pub meal: AddOutcome,
    /// 各短缺成分的寫入結果
    pub ingredients: Vec<AddOutcome>,
    /// 本次計算出的短缺明細
    pub deficit: Vec<DeficitLine>,
    /// 計算時的資料完整性警告
    pub warnings: Vec<CalcWarning>,
}

impl CompositeAddOutcome {
    /// 是否有短缺成分
    pub fn has_deficit(&self) -> bool {
        !self.deficit.is_empty()
    }

    pub fn notice(&self) -> CompositeNotice {
        if self.has_deficit() {
            CompositeNotice::AddedWithIngredients(self.deficit.len())
        } else {
            CompositeNotice::AlreadyInStock
        }
    }
}

/// 手動加入購物清單的結果
#[derive(Debug, Clone, PartialEq)]
pub enum ShoppingAddOutcome {
    Simple(AddOutcome),
    Composite(CompositeAddOutcome),
}

impl ShoppingAddOutcome {
    /// 清單中被寫入的主項目
    pub fn entry(&self) -> &ShoppingListEntry {
        match self {
            ShoppingAddOutcome::Simple(outcome) => &outcome.entry,
            ShoppingAddOutcome::Composite(outcome) => &outcome.meal.entry,
        }
    }
}

/// 自動補貨的處理結果
#[derive(Debug, Clone, PartialEq)]
pub struct RestockOutcome {
    pub decision: RestockDecision,
    /// 觸發時寫入購物清單的結果
    pub added: Option<ShoppingAddOutcome>,
}

/// 庫存變動的處理結果
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryUpdate {
    pub change: InventoryChange,
    /// 有自動補貨設定的項目才會有判斷結果
    pub restock: Option<RestockOutcome>,
}

impl InventoryUpdate {
    /// 是否觸發了補貨寫入
    pub fn restocked(&self) -> bool {
        self.restock
            .as_ref()
            .is_some_and(|r| r.added.is_some())
    }
}

/// 勾選／取消勾選的結果
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseOutcome {
    pub entry: ShoppingListEntry,
    /// 庫存未變動時為 None
    pub inventory: Option<InventoryUpdate>,
}
