//! 義大利麵醬示例：依庫存計算短缺成分並加入購物清單

use pantry::{
    CatalogItem, CompositeNotice, EngineConfig, GroceryEngine, Ingredient, MemoryStore,
    ShoppingAddOutcome,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("=== 義大利麵醬示例 ===\n");

    let store = Arc::new(MemoryStore::new());
    let mut engine = GroceryEngine::load(store, EngineConfig::new()).await?;

    engine
        .add_item(CatalogItem::new("Tomato", "count", "Produce").with_id("tomato"))
        .await?;
    engine
        .add_item(CatalogItem::new("Basil", "bunch", "Produce").with_id("basil"))
        .await?;
    engine
        .add_item(
            CatalogItem::new("Pasta Sauce", "jar", "Meals")
                .with_id("pasta-sauce")
                .with_ingredients(vec![
                    Ingredient::new("tomato", "Tomato", "count", Decimal::from(2))?,
                    Ingredient::new("basil", "Basil", "bunch", Decimal::from(1))?,
                ]),
        )
        .await?;

    engine.set_inventory("tomato", Decimal::from(1)).await?;
    println!("庫存: 番茄 1，羅勒 0\n");

    let ShoppingAddOutcome::Composite(outcome) =
        engine.add_to_shopping_list("pasta-sauce", Decimal::from(1)).await?
    else {
        anyhow::bail!("義大利麵醬應為組合項目");
    };

    match outcome.notice() {
        CompositeNotice::AddedWithIngredients(count) => {
            println!("已加入 {} 項短缺成分:", count);
            for line in &outcome.deficit {
                println!("  - {} ({}): 缺 {}", line.name, line.unit, line.quantity);
            }
        }
        CompositeNotice::AlreadyInStock => println!("所有成分皆有庫存"),
    }

    println!("\n購物清單:");
    for entry in engine.shopping_list().ordered() {
        println!(
            "  [{}] {} x{} ({})",
            if entry.checked { "x" } else { " " },
            entry.name,
            entry.quantity,
            entry.category
        );
    }

    Ok(())
}
