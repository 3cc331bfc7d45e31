use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{inventory_level, stock_movement},
    errors::ServiceError,
    services::StockStatus,
    AppState, ListQuery, PaginatedResponse,
};

/// Inventory record as returned by the API, with the derived status badge.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryRecordResponse {
    pub product_id: Uuid,
    pub quantity: i32,
    pub min_stock_level: i32,
    /// Derived classification: out_of_stock, low_stock or ok
    pub status: StockStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<inventory_level::Model> for InventoryRecordResponse {
    fn from(record: inventory_level::Model) -> Self {
        let status = StockStatus::classify(&record);
        Self {
            product_id: record.product_id,
            quantity: record.quantity,
            min_stock_level: record.min_stock_level,
            status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// One ledger row in the movement history.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StockMovementResponse {
    pub id: i64,
    pub product_id: Uuid,
    pub quantity_change: i32,
    pub reason: String,
    pub related_order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<stock_movement::Model> for StockMovementResponse {
    fn from(movement: stock_movement::Model) -> Self {
        Self {
            id: movement.id,
            product_id: movement.product_id,
            quantity_change: movement.quantity_change,
            reason: movement.reason,
            related_order_id: movement.related_order_id,
            created_at: movement.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInventoryRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetMinStockLevelRequest {
    pub min_stock_level: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustInventoryRequest {
    /// Signed delta; positive = stock in, negative = stock out. Must be non-zero.
    pub quantity_change: i32,
    /// One of: manual_adjustment, supplier_intake, customer_return,
    /// loss_or_damage, order_fulfillment
    pub reason: String,
    /// Set when the movement originates from an order fulfillment event.
    /// The subsystem records it verbatim and does not deduplicate on it;
    /// retry-safety by order id is the calling order subsystem's contract.
    pub related_order_id: Option<Uuid>,
}

/// Create the inventory router
pub fn inventory_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_inventory))
        .route("/low-stock", get(list_low_stock))
        .route(
            "/:product_id",
            get(get_inventory).delete(delete_inventory),
        )
        .route("/:product_id/min-stock-level", put(set_min_stock_level))
        .route("/:product_id/adjustments", post(adjust_inventory))
        .route("/:product_id/movements", get(list_movements))
}

/// Create the inventory record for a newly created product
#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateInventoryRequest,
    responses(
        (status = 201, description = "Inventory record created", body = InventoryRecordResponse),
        (status = 409, description = "Record already exists", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_inventory(
    State(state): State<AppState>,
    Json(payload): Json<CreateInventoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .inventory_service
        .create_record(payload.product_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InventoryRecordResponse::from(record)),
    ))
}

/// Get the current stock projection for a product
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Inventory record returned", body = InventoryRecordResponse),
        (status = 404, description = "No record for product", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state.inventory_service.get_by_product(product_id).await?;

    Ok((StatusCode::OK, Json(InventoryRecordResponse::from(record))))
}

/// Delete a product's inventory record (cascades to its movement history)
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Inventory record deleted"),
        (status = 404, description = "No record for product", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn delete_inventory(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.inventory_service.delete_record(product_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Configure the minimum stock level threshold
#[utoipa::path(
    put,
    path = "/api/v1/inventory/{product_id}/min-stock-level",
    params(("product_id" = Uuid, Path, description = "Product id")),
    request_body = SetMinStockLevelRequest,
    responses(
        (status = 200, description = "Threshold updated", body = InventoryRecordResponse),
        (status = 400, description = "Negative threshold", body = crate::errors::ErrorResponse),
        (status = 404, description = "No record for product", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn set_min_stock_level(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<SetMinStockLevelRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .inventory_service
        .set_min_stock_level(product_id, payload.min_stock_level)
        .await?;

    Ok((StatusCode::OK, Json(InventoryRecordResponse::from(record))))
}

/// Apply a signed stock movement to a product's balance
#[utoipa::path(
    post,
    path = "/api/v1/inventory/{product_id}/adjustments",
    params(("product_id" = Uuid, Path, description = "Product id")),
    request_body = AdjustInventoryRequest,
    responses(
        (status = 200, description = "Balance adjusted", body = InventoryRecordResponse),
        (status = 400, description = "Zero delta or unknown reason", body = crate::errors::ErrorResponse),
        (status = 404, description = "No record for product", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent-write retries exhausted; retryable", body = crate::errors::ErrorResponse),
        (status = 422, description = "Adjustment would drive quantity below zero", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<AdjustInventoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state
        .inventory_service
        .adjust(
            product_id,
            payload.quantity_change,
            &payload.reason,
            payload.related_order_id,
        )
        .await?;

    Ok((StatusCode::OK, Json(InventoryRecordResponse::from(record))))
}

/// List a product's movement history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{product_id}/movements",
    params(
        ("product_id" = Uuid, Path, description = "Product id"),
        ("page" = u64, Query, description = "1-based page number"),
        ("limit" = u64, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Movement history returned"),
        (status = 404, description = "No record for product", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    // 404 on unknown products rather than an empty history
    state.inventory_service.get_by_product(product_id).await?;

    let (movements, total) = state
        .inventory_service
        .ledger()
        .list_by_product(product_id, query.page, query.limit)
        .await?;

    let response = PaginatedResponse {
        total,
        page: query.page,
        limit: query.limit,
        total_pages: total.div_ceil(query.limit.max(1)),
        items: movements
            .into_iter()
            .map(StockMovementResponse::from)
            .collect::<Vec<_>>(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// List records at or below their configured threshold
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    params(
        ("page" = u64, Query, description = "1-based page number"),
        ("limit" = u64, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Low stock records returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (records, total) = state
        .inventory_service
        .list_low_stock(query.page, query.limit)
        .await?;

    let response = PaginatedResponse {
        total,
        page: query.page,
        limit: query.limit,
        total_pages: total.div_ceil(query.limit.max(1)),
        items: records
            .into_iter()
            .map(InventoryRecordResponse::from)
            .collect::<Vec<_>>(),
    };

    Ok((StatusCode::OK, Json(response)))
}
