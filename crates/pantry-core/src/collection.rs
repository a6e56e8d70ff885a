//! 持久化集合種類

use serde::{Deserialize, Serialize};
use std::fmt;

/// 遠端文件庫中的集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectionKind {
    /// 食物庫
    Catalog,
    /// 庫存
    Inventory,
    /// 購物清單
    ShoppingList,
}

impl CollectionKind {
    /// 所有集合
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Catalog,
        CollectionKind::Inventory,
        CollectionKind::ShoppingList,
    ];

    /// 集合名稱
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Catalog => "catalog",
            CollectionKind::Inventory => "inventory",
            CollectionKind::ShoppingList => "shoppingList",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
