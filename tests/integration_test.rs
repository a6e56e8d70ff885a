//! 集成測試

use pantry::*;
use rstest::rstest;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

const WINDOW_MS: u64 = 500;

fn d(value: i64) -> Decimal {
    Decimal::from(value)
}

async fn engine(store: &Arc<MemoryStore>) -> GroceryEngine {
    let config = EngineConfig::new().with_reorder_debounce_ms(WINDOW_MS);
    GroceryEngine::load(store.clone(), config).await.unwrap()
}

/// 食物庫：番茄、羅勒、義大利麵醬（2 番茄 + 1 羅勒）、牛奶（門檻 1，補 2）
async fn pantry_engine(store: &Arc<MemoryStore>) -> GroceryEngine {
    let mut engine = engine(store).await;
    engine
        .add_item(CatalogItem::new("Tomato", "count", "Produce").with_id("tomato"))
        .await
        .unwrap();
    engine
        .add_item(CatalogItem::new("Basil", "bunch", "Produce").with_id("basil"))
        .await
        .unwrap();
    engine
        .add_item(
            CatalogItem::new("Pasta Sauce", "jar", "Meals")
                .with_id("pasta-sauce")
                .with_ingredients(vec![
                    Ingredient::new("tomato", "Tomato", "count", d(2)).unwrap(),
                    Ingredient::new("basil", "Basil", "bunch", d(1)).unwrap(),
                ]),
        )
        .await
        .unwrap();
    engine
        .add_item(
            CatalogItem::new("Milk", "gallon", "Dairy")
                .with_id("milk")
                .with_auto_restock(d(1), d(2)),
        )
        .await
        .unwrap();
    engine
}

fn quantity(engine: &GroceryEngine, id: &str) -> Option<Decimal> {
    engine.shopping_list().get(id).map(|e| e.quantity)
}

fn unchecked_ids(engine: &GroceryEngine) -> Vec<String> {
    engine
        .shopping_list()
        .unchecked()
        .iter()
        .map(|e| e.id.clone())
        .collect()
}

#[tokio::test]
async fn test_pasta_sauce_partial_inventory() {
    // 場景 A：番茄 1，羅勒 0，需求 1 份
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.set_inventory("tomato", d(1)).await.unwrap();

    let outcome = engine
        .add_to_shopping_list("pasta-sauce", d(1))
        .await
        .unwrap();

    let ShoppingAddOutcome::Composite(outcome) = outcome else {
        panic!("義大利麵醬應為組合項目");
    };
    let deficit: Vec<(String, Decimal)> = outcome
        .deficit
        .iter()
        .map(|l| (l.id.clone(), l.quantity))
        .collect();
    assert_eq!(
        deficit,
        vec![("tomato".to_string(), d(1)), ("basil".to_string(), d(1))]
    );
    assert_eq!(outcome.notice(), CompositeNotice::AddedWithIngredients(2));

    assert_eq!(quantity(&engine, "pasta-sauce"), Some(d(1)));
    assert_eq!(quantity(&engine, "tomato"), Some(d(1)));
    assert_eq!(quantity(&engine, "basil"), Some(d(1)));
    assert_eq!(engine.shopping_list().composite().len(), 1);
    assert_eq!(
        engine.shopping_list().get("basil").unwrap().category,
        "Produce"
    );
}

#[tokio::test]
async fn test_pasta_sauce_fully_stocked() {
    // 場景 B：番茄 5，羅勒 3
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.set_inventory("tomato", d(5)).await.unwrap();
    engine.set_inventory("basil", d(3)).await.unwrap();

    let outcome = engine
        .add_to_shopping_list("pasta-sauce", d(1))
        .await
        .unwrap();

    let ShoppingAddOutcome::Composite(outcome) = outcome else {
        panic!("義大利麵醬應為組合項目");
    };
    assert!(outcome.deficit.is_empty());
    assert!(outcome.ingredients.is_empty());
    assert_eq!(outcome.notice(), CompositeNotice::AlreadyInStock);

    // 餐點本身仍加入清單，成分不加入
    assert_eq!(engine.shopping_list().len(), 1);
    assert!(engine.shopping_list().get("pasta-sauce").is_some());
}

#[tokio::test]
async fn test_milk_auto_restock() {
    // 場景 C：牛奶 2 → 1 觸發補貨，1 → 0 不再新增
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;

    let update = engine.set_inventory("milk", d(2)).await.unwrap();
    assert!(!update.restocked());

    let update = engine.set_inventory("milk", d(1)).await.unwrap();
    assert!(update.restocked());
    assert_eq!(quantity(&engine, "milk"), Some(d(2)));

    let update = engine.set_inventory("milk", d(0)).await.unwrap();
    assert!(!update.restocked());
    assert_eq!(engine.shopping_list().len(), 1);
    assert_eq!(quantity(&engine, "milk"), Some(d(2)));

    // 數量 0 的庫存記錄被移除
    assert!(engine.inventory().get("milk").is_none());
    assert!(store.record(CollectionKind::Inventory, "milk").is_none());
}

#[tokio::test]
async fn test_restock_fires_once_per_crossing() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine(&store).await;
    engine
        .add_item(
            CatalogItem::new("Eggs", "count", "Dairy")
                .with_id("eggs")
                .with_auto_restock(d(2), d(12)),
        )
        .await
        .unwrap();

    let mut fired = Vec::new();
    for level in [5, 3, 2, 1] {
        let update = engine.set_inventory("eggs", d(level)).await.unwrap();
        fired.push(
            update
                .restock
                .map(|r| r.decision.is_fire())
                .unwrap_or(false),
        );
    }
    assert_eq!(fired, vec![false, false, true, false]);
    assert_eq!(quantity(&engine, "eggs"), Some(d(12)));
}

#[tokio::test]
async fn test_restock_disabled_by_config() {
    let store = Arc::new(MemoryStore::new());
    let config = EngineConfig::new().with_restock_enabled(false);
    let mut engine = GroceryEngine::load(store.clone(), config).await.unwrap();
    engine
        .add_item(
            CatalogItem::new("Milk", "gallon", "Dairy")
                .with_id("milk")
                .with_auto_restock(d(1), d(2)),
        )
        .await
        .unwrap();

    engine.set_inventory("milk", d(2)).await.unwrap();
    let update = engine.set_inventory("milk", d(1)).await.unwrap();
    assert!(update.restock.is_none());
    assert!(engine.shopping_list().is_empty());
}

#[tokio::test]
async fn test_merge_same_item_twice() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;

    let first = engine.add_to_shopping_list("tomato", d(2)).await.unwrap();
    let second = engine.add_to_shopping_list("tomato", d(3)).await.unwrap();

    assert!(matches!(first, ShoppingAddOutcome::Simple(AddOutcome { created: true, .. })));
    assert!(matches!(second, ShoppingAddOutcome::Simple(AddOutcome { created: false, .. })));
    assert_eq!(engine.shopping_list().len(), 1);
    assert_eq!(quantity(&engine, "tomato"), Some(d(5)));
    assert_eq!(store.snapshot(CollectionKind::ShoppingList).len(), 1);
}

#[tokio::test]
async fn test_composite_merges_into_existing_ingredient() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.add_to_shopping_list("basil", d(1)).await.unwrap();

    engine
        .add_to_shopping_list("pasta-sauce", d(1))
        .await
        .unwrap();

    // 羅勒已在清單中：合併而非新增
    assert_eq!(quantity(&engine, "basil"), Some(d(2)));
    assert_eq!(quantity(&engine, "tomato"), Some(d(2)));
    assert_eq!(engine.shopping_list().len(), 3);
    assert_eq!(unchecked_ids(&engine), vec!["basil", "tomato"]);
}

#[tokio::test]
async fn test_purchase_and_undo_are_inverse() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.set_inventory("tomato", d(4)).await.unwrap();
    engine.add_to_shopping_list("tomato", d(3)).await.unwrap();

    let purchased = engine.mark_purchased("tomato", d(3)).await.unwrap();
    assert!(purchased.entry.checked);
    assert!(purchased.entry.added_to_inventory);
    assert_eq!(engine.inventory().quantity("tomato"), d(7));

    let undone = engine.undo_purchase("tomato").await.unwrap();
    assert!(!undone.entry.checked);
    assert!(!undone.entry.added_to_inventory);
    assert_eq!(engine.inventory().quantity("tomato"), d(4));
}

#[tokio::test]
async fn test_purchase_creates_inventory_from_catalog() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.add_to_shopping_list("basil", d(2)).await.unwrap();

    engine.mark_purchased("basil", d(2)).await.unwrap();

    let entry = engine.inventory().get("basil").unwrap();
    assert_eq!(entry.name, "Basil");
    assert_eq!(entry.category, "Produce");
    assert_eq!(entry.quantity, d(2));
    assert!(store.record(CollectionKind::Inventory, "basil").is_some());

    // 重複勾選不會重複入庫
    engine.mark_purchased("basil", d(2)).await.unwrap();
    assert_eq!(engine.inventory().quantity("basil"), d(2));
}

#[tokio::test]
async fn test_undo_after_consumption_floors_at_zero() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.add_to_shopping_list("tomato", d(3)).await.unwrap();
    engine.mark_purchased("tomato", d(3)).await.unwrap();

    // 購買後另外消耗了 2 個
    engine.adjust_inventory("tomato", d(-2)).await.unwrap();
    assert_eq!(engine.inventory().quantity("tomato"), d(1));

    engine.undo_purchase("tomato").await.unwrap();
    assert_eq!(engine.inventory().quantity("tomato"), Decimal::ZERO);
    assert!(engine.inventory().get("tomato").is_none());
}

#[tokio::test]
async fn test_delete_entry_keeps_inventory() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.add_to_shopping_list("tomato", d(1)).await.unwrap();
    engine.mark_purchased("tomato", d(1)).await.unwrap();

    engine.delete_entry("tomato").await.unwrap();
    assert!(engine.shopping_list().is_empty());
    assert_eq!(engine.inventory().quantity("tomato"), d(1));
    assert!(matches!(
        engine.delete_entry("tomato").await,
        Err(PantryError::EntryNotFound(_))
    ));
}

#[tokio::test]
async fn test_clear_purchased_removes_checked_batch() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    for id in ["tomato", "basil", "milk"] {
        engine.add_to_shopping_list(id, d(1)).await.unwrap();
    }
    engine.mark_purchased("tomato", d(1)).await.unwrap();
    engine.mark_purchased("milk", d(1)).await.unwrap();

    let removed = engine.clear_purchased().await.unwrap();
    assert_eq!(removed.len(), 2);
    assert_eq!(unchecked_ids(&engine), vec!["basil"]);
    assert_eq!(store.collection_writes(CollectionKind::ShoppingList), 1);
    assert_eq!(store.snapshot(CollectionKind::ShoppingList).len(), 1);

    // 沒有已勾選項目時不寫入
    assert!(engine.clear_purchased().await.unwrap().is_empty());
    assert_eq!(store.collection_writes(CollectionKind::ShoppingList), 1);
}

#[tokio::test]
async fn test_clear_purchased_failure_changes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.add_to_shopping_list("tomato", d(1)).await.unwrap();
    engine.add_to_shopping_list("basil", d(1)).await.unwrap();
    engine.mark_purchased("tomato", d(1)).await.unwrap();
    engine.mark_purchased("basil", d(1)).await.unwrap();

    store.set_failing(CollectionKind::ShoppingList, true);
    assert!(engine.clear_purchased().await.is_err());
    assert_eq!(engine.shopping_list().checked().len(), 2);
    assert_eq!(store.snapshot(CollectionKind::ShoppingList).len(), 2);
}

#[tokio::test]
async fn test_failed_write_leaves_memory_unchanged() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.add_to_shopping_list("tomato", d(1)).await.unwrap();

    store.set_failing(CollectionKind::ShoppingList, true);
    assert!(matches!(
        engine.add_to_shopping_list("tomato", d(1)).await,
        Err(PantryError::Persistence(_))
    ));
    assert_eq!(quantity(&engine, "tomato"), Some(d(1)));

    // 勾選失敗時庫存以補償寫入還原
    assert!(engine.mark_purchased("tomato", d(1)).await.is_err());
    assert_eq!(engine.inventory().quantity("tomato"), Decimal::ZERO);
    assert!(store.record(CollectionKind::Inventory, "tomato").is_none());
    assert!(!engine.shopping_list().get("tomato").unwrap().checked);
}

#[tokio::test]
async fn test_missing_ingredient_is_reported_not_fatal() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.remove_item("basil").await.unwrap();

    let outcome = engine
        .add_to_shopping_list("pasta-sauce", d(1))
        .await
        .unwrap();
    let ShoppingAddOutcome::Composite(outcome) = outcome else {
        panic!("義大利麵醬應為組合項目");
    };
    assert_eq!(outcome.deficit.len(), 1);
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].item_id, "basil");
}

#[tokio::test]
async fn test_unknown_item_and_invalid_quantity() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;

    assert!(matches!(
        engine.add_to_shopping_list("caviar", d(1)).await,
        Err(PantryError::ItemNotFound(_))
    ));
    assert!(matches!(
        engine.add_to_shopping_list("tomato", d(0)).await,
        Err(PantryError::InvalidQuantity(_))
    ));
    assert!(engine.set_inventory("tomato", d(-1)).await.is_err());
}

#[rstest]
#[case::zero(0)]
#[case::negative(-2)]
#[tokio::test]
async fn test_non_positive_add_is_rejected(#[case] amount: i64) {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;

    let result = engine.add_to_shopping_list("pasta-sauce", d(amount)).await;
    assert!(matches!(result, Err(PantryError::InvalidQuantity(_))));
    assert!(engine.shopping_list().is_empty());
    assert!(store.snapshot(CollectionKind::ShoppingList).is_empty());
}

#[tokio::test]
async fn test_blank_category_falls_back() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine(&store).await;

    let outcome = engine
        .add_or_merge(
            IncomingEntry::new("napkins", "Napkins", "  ", d(1)),
            Placement::Append,
        )
        .await
        .unwrap();
    assert_eq!(outcome.entry.category, "Uncategorized");
}

#[tokio::test]
async fn test_insert_at_unchecked_index() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.add_to_shopping_list("tomato", d(1)).await.unwrap();
    engine.add_to_shopping_list("basil", d(1)).await.unwrap();

    engine
        .add_or_merge(
            IncomingEntry::new("milk", "Milk", "Dairy", d(1)),
            Placement::UncheckedIndex(0),
        )
        .await
        .unwrap();
    assert_eq!(unchecked_ids(&engine), vec!["milk", "tomato", "basil"]);
}

#[tokio::test(start_paused = true)]
async fn test_reorder_debounced_single_write() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine(&store).await;
    for id in ["a", "b", "c", "d", "e"] {
        engine
            .add_or_merge(IncomingEntry::new(id, id, "Misc", d(1)), Placement::Append)
            .await
            .unwrap();
    }

    // 索引 2 移到索引 1：0、3、4 不變
    assert!(engine.move_up("c").unwrap());
    assert_eq!(unchecked_ids(&engine), vec!["a", "c", "b", "d", "e"]);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(engine.move_down("d").unwrap());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(engine.move_up("d").unwrap());
    assert_eq!(unchecked_ids(&engine), vec!["a", "c", "b", "d", "e"]);
    assert_eq!(store.collection_writes(CollectionKind::ShoppingList), 0);

    tokio::time::sleep(Duration::from_millis(WINDOW_MS * 2)).await;
    tokio::task::yield_now().await;

    assert_eq!(store.collection_writes(CollectionKind::ShoppingList), 1);
    let persisted: Vec<String> = store
        .snapshot(CollectionKind::ShoppingList)
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(persisted, vec!["a", "c", "b", "d", "e"]);
}

#[tokio::test(start_paused = true)]
async fn test_reorder_boundaries_and_pending_flush() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    for id in ["tomato", "basil", "milk"] {
        engine.add_to_shopping_list(id, d(1)).await.unwrap();
    }

    assert!(!engine.move_up("tomato").unwrap());
    assert!(!engine.move_down("milk").unwrap());
    assert!(!engine.has_pending_ordering());

    assert!(engine.move_down("tomato").unwrap());
    assert!(engine.has_pending_ordering());

    // 其他寫入前先寫回排序，避免整批寫入覆蓋新項目
    engine.add_to_shopping_list("pasta-sauce", d(1)).await.unwrap();
    assert!(!engine.has_pending_ordering());
    assert_eq!(store.collection_writes(CollectionKind::ShoppingList), 1);

    let persisted: Vec<String> = store
        .snapshot(CollectionKind::ShoppingList)
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert!(persisted.contains(&"pasta-sauce".to_string()));
    assert_eq!(&persisted[..3], &["basil", "tomato", "milk"]);
}

#[tokio::test]
async fn test_reload_from_store() {
    let store = Arc::new(MemoryStore::new());
    {
        let mut engine = pantry_engine(&store).await;
        engine.add_category("Spices").await.unwrap();
        engine.set_inventory("tomato", d(1)).await.unwrap();
        engine
            .add_to_shopping_list("pasta-sauce", d(1))
            .await
            .unwrap();
    }

    let engine = engine(&store).await;
    assert!(engine.load_warnings().is_empty());
    assert_eq!(engine.catalog().len(), 4);
    assert!(engine.catalog().has_category("Spices"));
    assert_eq!(engine.inventory().quantity("tomato"), d(1));
    assert_eq!(quantity(&engine, "basil"), Some(d(1)));
    assert!(engine
        .shopping_list()
        .get("pasta-sauce")
        .unwrap()
        .is_composite());
}

#[tokio::test]
async fn test_load_skips_malformed_records() {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        CollectionKind::ShoppingList,
        vec![Record::new("broken", serde_json::json!({"id": "broken"}))],
    );

    let engine = engine(&store).await;
    assert!(engine.shopping_list().is_empty());
    assert_eq!(engine.load_warnings().len(), 1);
}

#[tokio::test]
async fn test_catalog_category_edits_persist() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;

    let affected = engine.rename_category("Produce", "Veg").await.unwrap();
    assert_eq!(affected, vec!["basil".to_string(), "tomato".to_string()]);
    assert!(store
        .record(CollectionKind::Catalog, "category:Produce")
        .is_none());
    assert!(store.record(CollectionKind::Catalog, "category:Veg").is_some());

    engine.delete_category("Veg").await.unwrap();
    assert_eq!(
        engine.catalog().get("tomato").unwrap().category,
        "Uncategorized"
    );

    let tomato = store.record(CollectionKind::Catalog, "tomato").unwrap();
    assert_eq!(tomato.body["category"], "Uncategorized");
}

#[tokio::test]
async fn test_composite_partial_failure_leaves_nothing_behind() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;

    // 餐點寫入成功，番茄寫入失敗
    store.fail_nth_write(CollectionKind::ShoppingList, 2);
    assert!(matches!(
        engine.add_to_shopping_list("pasta-sauce", d(1)).await,
        Err(PantryError::Persistence(_))
    ));
    assert!(engine.shopping_list().is_empty());
    assert!(store.snapshot(CollectionKind::ShoppingList).is_empty());

    // 重試只計入一次
    engine
        .add_to_shopping_list("pasta-sauce", d(1))
        .await
        .unwrap();
    assert_eq!(quantity(&engine, "pasta-sauce"), Some(d(1)));
    assert_eq!(quantity(&engine, "tomato"), Some(d(2)));
    assert_eq!(quantity(&engine, "basil"), Some(d(1)));
}

#[tokio::test]
async fn test_composite_failure_restores_merged_records() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine
        .add_to_shopping_list("pasta-sauce", d(1))
        .await
        .unwrap();

    // 餐點與番茄已合併寫入，羅勒寫入失敗
    store.fail_nth_write(CollectionKind::ShoppingList, 3);
    assert!(engine
        .add_to_shopping_list("pasta-sauce", d(1))
        .await
        .is_err());

    for (id, expected) in [("pasta-sauce", 1), ("tomato", 2), ("basil", 1)] {
        assert_eq!(quantity(&engine, id), Some(d(expected)));
        let stored: ShoppingListEntry = store
            .record(CollectionKind::ShoppingList, id)
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(stored.quantity, d(expected));
    }
}

#[tokio::test]
async fn test_restock_skips_purchased_entry_with_enough_quantity() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.add_to_shopping_list("milk", d(2)).await.unwrap();
    engine.mark_purchased("milk", d(2)).await.unwrap();
    let writes_before = store.write_log().len();

    let update = engine.set_inventory("milk", d(1)).await.unwrap();

    let restock = update.restock.unwrap();
    assert_eq!(
        restock.decision,
        RestockDecision::Skip(RestockSkip::AlreadyListed)
    );
    assert!(restock.added.is_none());
    // 只有庫存寫入，購物清單不變
    assert_eq!(store.write_log().len(), writes_before + 1);
    let entry = engine.shopping_list().get("milk").unwrap();
    assert!(entry.checked);
    assert!(entry.added_to_inventory);
    assert_eq!(entry.quantity, d(2));
}

#[tokio::test]
async fn test_composite_restock_goes_through_deficit() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine
        .add_item(
            CatalogItem::new("Lasagna", "tray", "Meals")
                .with_id("lasagna")
                .with_auto_restock(d(1), d(1))
                .with_ingredients(vec![
                    Ingredient::new("tomato", "Tomato", "count", d(3)).unwrap(),
                ]),
        )
        .await
        .unwrap();
    engine.set_inventory("tomato", d(1)).await.unwrap();
    engine.set_inventory("lasagna", d(2)).await.unwrap();

    let update = engine.set_inventory("lasagna", d(1)).await.unwrap();

    let Some(ShoppingAddOutcome::Composite(outcome)) =
        update.restock.and_then(|r| r.added)
    else {
        panic!("千層麵補貨應走餐點流程");
    };
    assert_eq!(outcome.deficit.len(), 1);
    assert_eq!(outcome.deficit[0].quantity, d(2));
    assert!(engine.shopping_list().get("lasagna").unwrap().is_composite());
    assert_eq!(quantity(&engine, "lasagna"), Some(d(1)));
    assert_eq!(quantity(&engine, "tomato"), Some(d(2)));
}

#[tokio::test]
async fn test_stale_update_hints_still_merge() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.add_to_shopping_list("basil", d(1)).await.unwrap();
    let sauce = engine.catalog().get("pasta-sauce").unwrap().clone();

    let line = |id: &str, name: &str, unit: &str, qty: i64, update_item: bool| DeficitLine {
        id: id.to_string(),
        name: name.to_string(),
        unit: unit.to_string(),
        quantity: d(qty),
        update_item,
    };
    // 番茄標記為已在清單（實際沒有），羅勒標記為不在清單（實際已有）
    let lines = vec![
        line("tomato", "Tomato", "count", 2, true),
        line("basil", "Basil", "bunch", 1, false),
    ];

    let outcome = engine.add_composite(&sauce, d(1), lines, true).await.unwrap();

    assert!(outcome.meal.created);
    assert!(outcome.ingredients[0].created);
    assert!(!outcome.ingredients[1].created);
    assert_eq!(engine.shopping_list().len(), 3);
    assert_eq!(quantity(&engine, "basil"), Some(d(2)));
    assert_eq!(quantity(&engine, "tomato"), Some(d(2)));
    assert_eq!(store.snapshot(CollectionKind::ShoppingList).len(), 3);
}

#[tokio::test]
async fn test_quantity_overflow_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine
        .add_to_shopping_list("tomato", Decimal::MAX)
        .await
        .unwrap();

    assert!(matches!(
        engine.add_to_shopping_list("tomato", d(1)).await,
        Err(PantryError::InvalidQuantity(_))
    ));
    assert_eq!(quantity(&engine, "tomato"), Some(Decimal::MAX));

    assert!(matches!(
        engine.add_to_shopping_list("pasta-sauce", Decimal::MAX).await,
        Err(PantryError::InvalidQuantity(_))
    ));
    assert!(engine.shopping_list().get("pasta-sauce").is_none());
}

#[tokio::test]
async fn test_fallback_category_cannot_be_deleted() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = pantry_engine(&store).await;
    engine.delete_category("Dairy").await.unwrap();
    assert_eq!(
        engine.catalog().get("milk").unwrap().category,
        "Uncategorized"
    );

    assert!(matches!(
        engine.delete_category("Uncategorized").await,
        Err(PantryError::ProtectedCategory(_))
    ));
    assert!(engine.catalog().has_category("Uncategorized"));
    assert!(store
        .record(CollectionKind::Catalog, "category:Uncategorized")
        .is_some());
}
