use crate::{
    db::DbPool,
    entities::{
        inventory_level::{self, Entity as InventoryLevel},
        stock_movement::{self, MovementReason},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger::LedgerStore,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Bounded retry count for optimistic-concurrency conflicts inside `adjust`.
const MAX_ADJUST_ATTEMPTS: u32 = 5;

/// Stock status classification derived from a record; purely a display
/// policy, never enforced as a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    Ok,
}

impl StockStatus {
    /// Classifies a record against its configured threshold. The boundary is
    /// inclusive: a quantity exactly at the threshold is low stock.
    pub fn classify(record: &inventory_level::Model) -> Self {
        if record.quantity == 0 {
            StockStatus::OutOfStock
        } else if record.quantity <= record.min_stock_level {
            StockStatus::LowStock
        } else {
            StockStatus::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::Ok => "ok",
        }
    }
}

/// Owns the projected per-product balance and the policy for changing it.
///
/// This service is the only component that appends to the ledger on the
/// stock-adjustment path; the balance update and the ledger append always
/// commit or roll back together.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    ledger: LedgerStore,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        let ledger = LedgerStore::new(db_pool.clone());
        Self {
            db_pool,
            ledger,
            event_sender,
        }
    }

    /// Read access to the ledger for history/audit queries.
    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Creates the zeroed inventory record for a newly created product.
    /// Fails with `Conflict` if the product already has one.
    #[instrument(skip(self))]
    pub async fn create_record(
        &self,
        product_id: Uuid,
    ) -> Result<inventory_level::Model, ServiceError> {
        let now = Utc::now();
        let record = inventory_level::ActiveModel {
            product_id: Set(product_id),
            quantity: Set(0),
            min_stock_level: Set(0),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = record.insert(self.db_pool.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) {
                ServiceError::Conflict(format!(
                    "inventory record already exists for product {}",
                    product_id
                ))
            } else {
                ServiceError::from(e)
            }
        })?;

        self.publish(Event::InventoryRecordCreated { product_id }).await;

        Ok(created)
    }

    /// Returns the current projection for a product.
    #[instrument(skip(self))]
    pub async fn get_by_product(
        &self,
        product_id: Uuid,
    ) -> Result<inventory_level::Model, ServiceError> {
        InventoryLevel::find_by_id(product_id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::from)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("no inventory record for product {}", product_id))
            })
    }

    /// Updates the configured minimum stock level. Configuration only: the
    /// quantity and the ledger are untouched and no movement is recorded.
    #[instrument(skip(self))]
    pub async fn set_min_stock_level(
        &self,
        product_id: Uuid,
        level: i32,
    ) -> Result<inventory_level::Model, ServiceError> {
        if level < 0 {
            return Err(ServiceError::ValidationError(
                "min_stock_level must be >= 0".to_string(),
            ));
        }

        let record = self.get_by_product(product_id).await?;

        let mut active: inventory_level::ActiveModel = record.into();
        active.min_stock_level = Set(level);
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::from)?;

        self.publish(Event::MinStockLevelSet {
            product_id,
            min_stock_level: level,
        })
        .await;

        Ok(updated)
    }

    /// Applies a signed stock movement to a product's balance.
    ///
    /// The ledger append and the balance update commit in one transaction;
    /// neither is ever observable without the other. An adjustment that
    /// would drive the balance below zero is rejected with
    /// `InsufficientStock` and writes nothing. Concurrent adjustments on the
    /// same product are resolved optimistically: the balance write is
    /// conditioned on the version read at the start of the attempt, and a
    /// lost race retries the whole attempt (floor check included) up to
    /// `MAX_ADJUST_ATTEMPTS` before surfacing a retryable `Conflict`.
    #[instrument(skip(self))]
    pub async fn adjust(
        &self,
        product_id: Uuid,
        quantity_change: i32,
        reason: &str,
        related_order_id: Option<Uuid>,
    ) -> Result<inventory_level::Model, ServiceError> {
        if quantity_change == 0 {
            return Err(ServiceError::ValidationError(
                "quantity_change must be non-zero".to_string(),
            ));
        }
        let reason = MovementReason::from_str(reason).ok_or_else(|| {
            ServiceError::ValidationError(format!("unrecognized movement reason '{}'", reason))
        })?;

        let mut attempt = 1;
        let (updated, movement) = loop {
            match self
                .try_adjust(product_id, quantity_change, reason, related_order_id)
                .await
            {
                Err(ServiceError::Conflict(msg)) if attempt < MAX_ADJUST_ATTEMPTS => {
                    warn!(%product_id, attempt, "adjust lost version race, retrying: {}", msg);
                    attempt += 1;
                }
                Err(e) => return Err(e),
                Ok(result) => break result,
            }
        };

        self.publish(Event::InventoryAdjusted {
            product_id,
            movement_id: movement.id,
            old_quantity: updated.quantity - quantity_change,
            new_quantity: updated.quantity,
            reason: movement.reason.clone(),
            related_order_id,
            occurred_at: movement.created_at,
        })
        .await;

        Ok(updated)
    }

    /// One optimistic attempt: read, check the floor, write the balance
    /// conditioned on the read version, append the movement.
    async fn try_adjust(
        &self,
        product_id: Uuid,
        quantity_change: i32,
        reason: MovementReason,
        related_order_id: Option<Uuid>,
    ) -> Result<(inventory_level::Model, stock_movement::Model), ServiceError> {
        let ledger = self.ledger.clone();

        self.db_pool
            .transaction::<_, (inventory_level::Model, stock_movement::Model), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let record = InventoryLevel::find_by_id(product_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::from)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "no inventory record for product {}",
                                    product_id
                                ))
                            })?;

                        let new_quantity =
                            record.quantity.checked_add(quantity_change).ok_or_else(|| {
                                ServiceError::ValidationError(
                                    "quantity_change overflows the stock balance".to_string(),
                                )
                            })?;

                        if new_quantity < 0 {
                            return Err(ServiceError::InsufficientStock(format!(
                                "adjustment of {} would drive quantity below zero (current {})",
                                quantity_change, record.quantity
                            )));
                        }

                        let now = Utc::now();
                        let result = InventoryLevel::update_many()
                            .col_expr(inventory_level::Column::Quantity, Expr::value(new_quantity))
                            .col_expr(
                                inventory_level::Column::Version,
                                Expr::value(record.version + 1),
                            )
                            .col_expr(inventory_level::Column::UpdatedAt, Expr::value(now))
                            .filter(inventory_level::Column::ProductId.eq(product_id))
                            .filter(inventory_level::Column::Version.eq(record.version))
                            .exec(txn)
                            .await
                            .map_err(ServiceError::from)?;

                        if result.rows_affected == 0 {
                            return Err(ServiceError::Conflict(format!(
                                "concurrent write detected on product {}",
                                product_id
                            )));
                        }

                        let movement = ledger
                            .append(
                                txn,
                                product_id,
                                quantity_change,
                                reason.as_str(),
                                related_order_id,
                            )
                            .await?;

                        let updated = inventory_level::Model {
                            quantity: new_quantity,
                            version: record.version + 1,
                            updated_at: now,
                            ..record
                        };

                        Ok((updated, movement))
                    })
                },
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::from(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })
    }

    /// Removes a product's record and, via cascade, its movement history.
    /// Called only when the product itself is deleted upstream.
    #[instrument(skip(self))]
    pub async fn delete_record(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let result = InventoryLevel::delete_by_id(product_id)
            .exec(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::from)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "no inventory record for product {}",
                product_id
            )));
        }

        self.publish(Event::InventoryRecordDeleted { product_id }).await;

        Ok(())
    }

    /// Pure classification of a record against its configured threshold.
    pub fn status_of(&self, record: &inventory_level::Model) -> StockStatus {
        StockStatus::classify(record)
    }

    /// Records at or below their threshold, for the reorder view.
    #[instrument(skip(self))]
    pub async fn list_low_stock(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<inventory_level::Model>, u64), ServiceError> {
        let paginator = InventoryLevel::find()
            .filter(
                Expr::col(inventory_level::Column::Quantity)
                    .lte(Expr::col(inventory_level::Column::MinStockLevel)),
            )
            .order_by_asc(inventory_level::Column::Quantity)
            .order_by_asc(inventory_level::Column::ProductId)
            .paginate(self.db_pool.as_ref(), limit.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::from)?;
        let records = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from)?;

        Ok((records, total))
    }

    /// Best-effort post-commit publication; never fails the operation.
    async fn publish(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!("failed to publish inventory event: {}", e);
        }
    }
}
