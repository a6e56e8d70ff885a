//! 成分短缺計算
//!
//! 對組合項目（餐點）的每個成分：
//! 所需數量 = 單位用量 × 需求數量，短缺 = 所需數量 − 現有庫存。
//! 庫存足夠的成分不輸出；每次呼叫都重新計算。

use pantry_core::{Catalog, CatalogItem, DeficitLine, InventoryLedger, PantryError};
use rust_decimal::Decimal;

use crate::index::ShoppingListIndex;
use crate::CalcWarning;

/// 短缺計算結果
#[derive(Debug, Clone, PartialEq)]
pub struct DeficitReport {
    /// 組合項目ID
    pub item_id: String,

    /// 需求數量
    pub requested: Decimal,

    /// 短缺明細（庫存足夠時為空）
    pub lines: Vec<DeficitLine>,

    /// 資料完整性警告
    pub warnings: Vec<CalcWarning>,
}

impl DeficitReport {
    /// 庫存是否已完全涵蓋
    pub fn is_covered(&self) -> bool {
        self.lines.is_empty()
    }

    /// 短缺總數
    pub fn total_shortage(&self) -> Decimal {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// 短缺計算器
pub struct DeficitCalculator;

impl DeficitCalculator {
    /// 計算組合項目的成分短缺
    ///
    /// 純函數：相同輸入必得相同輸出。非組合項目回傳空明細。
    /// 食物庫中找不到的成分會略過並產生警告。
    pub fn compute(
        item: &CatalogItem,
        requested: Decimal,
        catalog: &Catalog,
        inventory: &InventoryLedger,
        list: &ShoppingListIndex,
    ) -> pantry_core::Result<DeficitReport> {
        if requested < Decimal::ZERO {
            return Err(PantryError::InvalidQuantity(format!(
                "需求數量不可為負：{}",
                requested
            )));
        }

        let mut report = DeficitReport {
            item_id: item.id.clone(),
            requested,
            lines: Vec::new(),
            warnings: Vec::new(),
        };

        // 同一成分出現多次時合併所需數量，保留首次出現的順序
        let mut needs: Vec<(&pantry_core::Ingredient, Decimal)> = Vec::new();
        for ingredient in item.ingredients() {
            if !catalog.contains(&ingredient.id) {
                tracing::warn!(
                    "組合項目 {} 的成分 {} 不在食物庫中，略過",
                    item.id,
                    ingredient.id
                );
                report.warnings.push(CalcWarning::warning(
                    ingredient.id.clone(),
                    format!("成分不在食物庫中（來自 {}）", item.id),
                ));
                continue;
            }
            if ingredient.quantity_per_unit <= Decimal::ZERO {
                report.warnings.push(CalcWarning::warning(
                    ingredient.id.clone(),
                    format!("單位用量無效：{}", ingredient.quantity_per_unit),
                ));
                continue;
            }

            let overflow = || {
                PantryError::InvalidQuantity(format!(
                    "成分 {} 所需數量溢位（需求 {}）",
                    ingredient.id, requested
                ))
            };
            let total_needed = ingredient
                .quantity_per_unit
                .checked_mul(requested)
                .ok_or_else(overflow)?;
            match needs.iter_mut().find(|(i, _)| i.id == ingredient.id) {
                Some((_, needed)) => {
                    *needed = needed.checked_add(total_needed).ok_or_else(overflow)?;
                    report.warnings.push(CalcWarning::info(
                        ingredient.id.clone(),
                        "成分重複出現，已合併所需數量".to_string(),
                    ));
                }
                None => needs.push((ingredient, total_needed)),
            }
        }

        for (ingredient, total_needed) in needs {
            let on_hand = inventory.quantity(&ingredient.id);
            if on_hand >= total_needed {
                continue;
            }

            let shortage = total_needed - on_hand;
            tracing::debug!(
                "成分短缺: {} 需要 {}, 現有 {}, 短缺 {}",
                ingredient.id,
                total_needed,
                on_hand,
                shortage
            );
            report.lines.push(DeficitLine {
                id: ingredient.id.clone(),
                name: ingredient.name.clone(),
                unit: ingredient.unit.clone(),
                quantity: shortage,
                update_item: list.contains(&ingredient.id),
            });
        }

        Ok(report)
    }
}
