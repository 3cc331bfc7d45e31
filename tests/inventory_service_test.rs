mod common;

use common::TestApp;
use sea_orm::ConnectionTrait;
use stockbook_api::{errors::ServiceError, services::StockStatus};
use uuid::Uuid;

#[tokio::test]
async fn scenario_supplier_intake_then_fulfillment() {
    let app = TestApp::new().await;
    let svc = app.inventory();
    let product = Uuid::new_v4();

    let record = svc.create_record(product).await.expect("create");
    assert_eq!(record.quantity, 0);
    assert_eq!(record.min_stock_level, 0);

    svc.set_min_stock_level(product, 5).await.expect("set min");

    let record = svc
        .adjust(product, 20, "supplier_intake", None)
        .await
        .expect("intake");
    assert_eq!(record.quantity, 20);

    let order_1 = Uuid::new_v4();
    let record = svc
        .adjust(product, -3, "order_fulfillment", Some(order_1))
        .await
        .expect("fulfillment");
    assert_eq!(record.quantity, 17);

    // Removing more than is available is rejected and writes nothing
    let order_2 = Uuid::new_v4();
    let err = svc
        .adjust(product, -25, "order_fulfillment", Some(order_2))
        .await
        .expect_err("should reject below-zero adjustment");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let record = svc.get_by_product(product).await.expect("get");
    assert_eq!(record.quantity, 17);

    let (movements, total) = svc
        .ledger()
        .list_by_product(product, 1, 50)
        .await
        .expect("history");
    assert_eq!(total, 2);
    assert_eq!(movements.len(), 2);

    // Newest first: the fulfillment, then the intake
    assert_eq!(movements[0].quantity_change, -3);
    assert_eq!(movements[0].reason, "order_fulfillment");
    assert_eq!(movements[0].related_order_id, Some(order_1));
    assert_eq!(movements[1].quantity_change, 20);
    assert_eq!(movements[1].reason, "supplier_intake");
    assert_eq!(movements[1].related_order_id, None);
}

#[tokio::test]
async fn balance_equals_sum_of_movements() {
    let app = TestApp::new().await;
    let svc = app.inventory();
    let product = Uuid::new_v4();
    svc.create_record(product).await.expect("create");

    let deltas: [(i32, &str); 6] = [
        (50, "supplier_intake"),
        (-12, "order_fulfillment"),
        (3, "customer_return"),
        (-1, "loss_or_damage"),
        (-40, "order_fulfillment"),
        (7, "manual_adjustment"),
    ];
    for (delta, reason) in deltas {
        svc.adjust(product, delta, reason, None).await.expect("adjust");
    }

    let record = svc.get_by_product(product).await.expect("get");
    let (movements, total) = svc
        .ledger()
        .list_by_product(product, 1, 100)
        .await
        .expect("history");

    assert_eq!(total, deltas.len() as u64);
    let sum: i32 = movements.iter().map(|m| m.quantity_change).sum();
    assert_eq!(record.quantity, sum);
    assert_eq!(record.quantity, 7);
}

#[tokio::test]
async fn rejected_adjustment_leaves_no_partial_state() {
    let app = TestApp::new().await;
    let svc = app.inventory();
    let product = Uuid::new_v4();
    svc.create_record(product).await.expect("create");
    svc.adjust(product, 10, "supplier_intake", None)
        .await
        .expect("seed");

    let err = svc
        .adjust(product, -11, "order_fulfillment", None)
        .await
        .expect_err("below zero");
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let record = svc.get_by_product(product).await.expect("get");
    assert_eq!(record.quantity, 10);
    let (_, total) = svc
        .ledger()
        .list_by_product(product, 1, 10)
        .await
        .expect("history");
    assert_eq!(total, 1, "no ledger row may exist for the rejected adjustment");
}

#[tokio::test]
async fn failed_ledger_append_rolls_back_balance_update() {
    let app = TestApp::new().await;
    let svc = app.inventory();
    let product = Uuid::new_v4();
    svc.create_record(product).await.expect("create");
    svc.adjust(product, 10, "supplier_intake", None)
        .await
        .expect("seed");
    let before = svc.get_by_product(product).await.expect("get");

    // Break the ledger table so the append fails after the balance write
    app.state
        .db
        .execute_unprepared("ALTER TABLE stock_movements RENAME TO stock_movements_broken")
        .await
        .expect("rename table");

    let err = svc
        .adjust(product, 5, "supplier_intake", None)
        .await
        .expect_err("append must fail");
    assert!(matches!(err, ServiceError::DatabaseError(_)));

    // The whole transaction rolled back: quantity and version untouched
    let after = svc.get_by_product(product).await.expect("get");
    assert_eq!(after.quantity, before.quantity);
    assert_eq!(after.version, before.version);
}

#[tokio::test]
async fn validation_rejects_zero_delta_and_unknown_reason() {
    let app = TestApp::new().await;
    let svc = app.inventory();
    let product = Uuid::new_v4();
    svc.create_record(product).await.expect("create");

    let err = svc
        .adjust(product, 0, "manual_adjustment", None)
        .await
        .expect_err("zero delta");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = svc
        .adjust(product, 5, "shrinkage", None)
        .await
        .expect_err("unknown reason");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = svc
        .set_min_stock_level(product, -1)
        .await
        .expect_err("negative threshold");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // Nothing was recorded
    let (_, total) = svc
        .ledger()
        .list_by_product(product, 1, 10)
        .await
        .expect("history");
    assert_eq!(total, 0);
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let app = TestApp::new().await;
    let svc = app.inventory();
    let unknown = Uuid::new_v4();

    assert!(matches!(
        svc.get_by_product(unknown).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        svc.adjust(unknown, 5, "supplier_intake", None).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        svc.set_min_stock_level(unknown, 3).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        svc.delete_record(unknown).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn duplicate_record_creation_conflicts() {
    let app = TestApp::new().await;
    let svc = app.inventory();
    let product = Uuid::new_v4();

    svc.create_record(product).await.expect("first create");
    let err = svc
        .create_record(product)
        .await
        .expect_err("second create must fail");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn min_stock_level_change_is_not_ledgered() {
    let app = TestApp::new().await;
    let svc = app.inventory();
    let product = Uuid::new_v4();
    svc.create_record(product).await.expect("create");

    let record = svc.set_min_stock_level(product, 15).await.expect("set min");
    assert_eq!(record.min_stock_level, 15);
    assert_eq!(record.quantity, 0);

    let (_, total) = svc
        .ledger()
        .list_by_product(product, 1, 10)
        .await
        .expect("history");
    assert_eq!(total, 0, "threshold configuration must not create movements");
}

#[tokio::test]
async fn delete_cascades_to_movement_history() {
    let app = TestApp::new().await;
    let svc = app.inventory();
    let product = Uuid::new_v4();
    svc.create_record(product).await.expect("create");
    svc.adjust(product, 8, "supplier_intake", None)
        .await
        .expect("seed");

    svc.delete_record(product).await.expect("delete");

    assert!(matches!(
        svc.get_by_product(product).await,
        Err(ServiceError::NotFound(_))
    ));
    let (movements, total) = svc
        .ledger()
        .list_by_product(product, 1, 10)
        .await
        .expect("history query still answers");
    assert_eq!(total, 0);
    assert!(movements.is_empty());
}

#[tokio::test]
async fn status_follows_quantity_against_threshold() {
    let app = TestApp::new().await;
    let svc = app.inventory();
    let product = Uuid::new_v4();
    svc.create_record(product).await.expect("create");
    svc.set_min_stock_level(product, 10).await.expect("set min");

    let record = svc.get_by_product(product).await.expect("get");
    assert_eq!(svc.status_of(&record), StockStatus::OutOfStock);

    let record = svc
        .adjust(product, 5, "supplier_intake", None)
        .await
        .expect("to 5");
    assert_eq!(svc.status_of(&record), StockStatus::LowStock);

    let record = svc
        .adjust(product, 5, "supplier_intake", None)
        .await
        .expect("to 10");
    assert_eq!(svc.status_of(&record), StockStatus::LowStock);

    let record = svc
        .adjust(product, 1, "supplier_intake", None)
        .await
        .expect("to 11");
    assert_eq!(svc.status_of(&record), StockStatus::Ok);
}

#[tokio::test]
async fn low_stock_listing_flags_depleted_records() {
    let app = TestApp::new().await;
    let svc = app.inventory();

    let depleted = Uuid::new_v4();
    svc.create_record(depleted).await.expect("create");
    svc.set_min_stock_level(depleted, 10).await.expect("min");
    svc.adjust(depleted, 4, "supplier_intake", None)
        .await
        .expect("seed");

    let healthy = Uuid::new_v4();
    svc.create_record(healthy).await.expect("create");
    svc.set_min_stock_level(healthy, 2).await.expect("min");
    svc.adjust(healthy, 50, "supplier_intake", None)
        .await
        .expect("seed");

    let (records, total) = svc.list_low_stock(1, 20).await.expect("low stock");
    assert_eq!(total, 1);
    assert_eq!(records[0].product_id, depleted);
}
