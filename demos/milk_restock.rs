//! 牛奶自動補貨示例：庫存向下穿越門檻時加入購物清單

use pantry::{CatalogItem, EngineConfig, GroceryEngine, MemoryStore};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("=== 牛奶自動補貨示例 ===\n");

    let store = Arc::new(MemoryStore::new());
    let mut engine = GroceryEngine::load(store, EngineConfig::new()).await?;

    engine
        .add_item(
            CatalogItem::new("Milk", "gallon", "Dairy")
                .with_id("milk")
                .with_auto_restock(Decimal::from(1), Decimal::from(2)),
        )
        .await?;

    for level in [2, 1, 0] {
        let update = engine.set_inventory("milk", Decimal::from(level)).await?;
        let listed = engine
            .shopping_list()
            .get("milk")
            .map(|e| e.quantity.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "庫存 {} → {}，補貨: {}，清單數量: {}",
            update.change.old_quantity,
            update.change.new_quantity,
            if update.restocked() { "是" } else { "否" },
            listed
        );
    }

    // 買回來後勾選，庫存自動增加
    let purchase = engine.mark_purchased("milk", Decimal::from(2)).await?;
    println!(
        "\n已購買 {}，目前庫存 {}",
        purchase.entry.name,
        engine.inventory().quantity("milk")
    );

    let cleared = engine.clear_purchased().await?;
    println!("清除已購買項目 {} 筆", cleared.len());

    Ok(())
}
