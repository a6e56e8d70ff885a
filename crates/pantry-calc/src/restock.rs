//! 自動補貨觸發
//!
//! 邊緣觸發：庫存向下穿越門檻時觸發一次，之後持續低於門檻不再觸發。

use pantry_core::CatalogItem;
use rust_decimal::Decimal;

use crate::index::ShoppingListIndex;

/// 不觸發補貨的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestockSkip {
    /// 未啟用自動補貨
    Disabled,
    /// 非向下穿越門檻的變動
    NotCrossing,
    /// 補貨數量為 0
    ZeroQuantity,
    /// 購物清單中的項目已足量（不論是否已勾選）
    AlreadyListed,
}

/// 補貨判斷結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestockDecision {
    /// 觸發補貨
    Fire {
        item_id: String,
        /// 需加入購物清單的數量（已扣除清單中既有數量）
        quantity: Decimal,
        composite: bool,
    },
    /// 不觸發
    Skip(RestockSkip),
}

impl RestockDecision {
    pub fn is_fire(&self) -> bool {
        matches!(self, RestockDecision::Fire { .. })
    }
}

/// 自動補貨觸發器
pub struct AutoRestockTrigger;

impl AutoRestockTrigger {
    /// 判斷數量變動是否向下穿越補貨門檻
    ///
    /// - 門檻為 0：由正數降至 0 時觸發
    /// - 嚴格減少且恰好落在門檻上時觸發
    /// - 其他（增加、越過門檻）不觸發
    pub fn crosses_threshold(
        old_quantity: Decimal,
        new_quantity: Decimal,
        threshold: Decimal,
    ) -> bool {
        if threshold == Decimal::ZERO
            && new_quantity == Decimal::ZERO
            && old_quantity > Decimal::ZERO
        {
            return true;
        }
        new_quantity < old_quantity && new_quantity == threshold
    }

    /// 庫存變動時的補貨判斷，並與目前購物清單比對
    pub fn on_inventory_change(
        old_quantity: Decimal,
        new_quantity: Decimal,
        item: &CatalogItem,
        list: &ShoppingListIndex,
    ) -> RestockDecision {
        if !item.auto_restock {
            return RestockDecision::Skip(RestockSkip::Disabled);
        }
        if !Self::crosses_threshold(old_quantity, new_quantity, item.restock_threshold) {
            return RestockDecision::Skip(RestockSkip::NotCrossing);
        }
        if item.restock_quantity <= Decimal::ZERO {
            return RestockDecision::Skip(RestockSkip::ZeroQuantity);
        }

        let quantity = match list.get(&item.id) {
            Some(existing) if existing.quantity >= item.restock_quantity => {
                tracing::debug!(
                    "補貨略過: {} 清單中已有 {}，補貨數量 {}",
                    item.id,
                    existing.quantity,
                    item.restock_quantity
                );
                return RestockDecision::Skip(RestockSkip::AlreadyListed);
            }
            Some(existing) => item.restock_quantity - existing.quantity,
            None => item.restock_quantity,
        };

        tracing::info!(
            "觸發自動補貨: {} ({} → {}, 門檻 {})，加入 {}",
            item.id,
            old_quantity,
            new_quantity,
            item.restock_threshold,
            quantity
        );
        RestockDecision::Fire {
            item_id: item.id.clone(),
            quantity,
            composite: item.is_composite(),
        }
    }
}
