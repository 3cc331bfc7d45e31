use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockbook API",
        version = "0.1.0",
        description = r#"
Inventory tracking API: per-product stock balances backed by an append-only
ledger of stock movements.

Every change to a balance is recorded as a movement with a reason tag; the
balance always equals the sum of the product's movements. Adjustments that
would drive a balance below zero are rejected. Movement history is immutable:
corrections are made by offsetting movements, never by editing the past.
"#
    ),
    paths(
        crate::handlers::inventory::create_inventory,
        crate::handlers::inventory::get_inventory,
        crate::handlers::inventory::delete_inventory,
        crate::handlers::inventory::set_min_stock_level,
        crate::handlers::inventory::adjust_inventory,
        crate::handlers::inventory::list_movements,
        crate::handlers::inventory::list_low_stock,
    ),
    components(schemas(
        crate::handlers::inventory::InventoryRecordResponse,
        crate::handlers::inventory::StockMovementResponse,
        crate::handlers::inventory::CreateInventoryRequest,
        crate::handlers::inventory::SetMinStockLevelRequest,
        crate::handlers::inventory::AdjustInventoryRequest,
        crate::services::StockStatus,
        crate::errors::ErrorResponse,
    )),
    tags(
        (name = "inventory", description = "Stock balances, thresholds and movement history")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
