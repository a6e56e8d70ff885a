//! 引擎配置

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::UNCATEGORIZED;

/// 對帳引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfig {
    /// 重新排序後延遲寫回的靜止時間（毫秒）
    pub reorder_debounce_ms: u64,

    /// 類別空白時使用的後備類別
    pub fallback_category: String,

    /// 是否啟用自動補貨
    pub restock_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reorder_debounce_ms: 1000,
            fallback_category: UNCATEGORIZED.to_string(),
            restock_enabled: true,
        }
    }
}

impl EngineConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 JSON 字串載入配置，未提供的欄位使用預設值
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 建構器模式：設置防抖時間
    pub fn with_reorder_debounce_ms(mut self, millis: u64) -> Self {
        self.reorder_debounce_ms = millis;
        self
    }

    /// 建構器模式：設置後備類別
    pub fn with_fallback_category(mut self, category: impl Into<String>) -> Self {
        self.fallback_category = category.into();
        self
    }

    /// 建構器模式：設置是否啟用自動補貨
    pub fn with_restock_enabled(mut self, enabled: bool) -> Self {
        self.restock_enabled = enabled;
        self
    }

    /// 防抖時間
    pub fn reorder_debounce(&self) -> Duration {
        Duration::from_millis(self.reorder_debounce_ms)
    }
}
