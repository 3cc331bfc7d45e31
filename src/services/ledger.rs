use crate::{
    db::DbPool,
    entities::stock_movement::{self, Entity as StockMovement, MovementReason},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Append-only store of stock movements: the durable record of everything
/// that ever happened to a product's balance.
///
/// The store exposes no update or delete surface. Corrections are made by
/// appending an offsetting movement, which is what keeps balance
/// reconciliation possible.
#[derive(Clone)]
pub struct LedgerStore {
    db_pool: Arc<DbPool>,
}

impl LedgerStore {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Appends one movement row on the given connection.
    ///
    /// Runs on the caller's connection so the adjust path can place the
    /// append inside the same transaction as the balance update. Fails with
    /// `ValidationError` on a zero delta or an unrecognized reason tag.
    pub async fn append<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
        quantity_change: i32,
        reason: &str,
        related_order_id: Option<Uuid>,
    ) -> Result<stock_movement::Model, ServiceError> {
        if quantity_change == 0 {
            return Err(ServiceError::ValidationError(
                "quantity_change must be non-zero".to_string(),
            ));
        }
        let reason = MovementReason::from_str(reason).ok_or_else(|| {
            ServiceError::ValidationError(format!("unrecognized movement reason '{}'", reason))
        })?;

        let movement = stock_movement::ActiveModel {
            product_id: Set(product_id),
            quantity_change: Set(quantity_change),
            reason: Set(reason.as_str().to_string()),
            related_order_id: Set(related_order_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        movement.insert(conn).await.map_err(ServiceError::from)
    }

    /// Lists a product's movements, newest first, with the insertion id as
    /// tie-break. Pure read; pages are 1-based.
    #[instrument(skip(self))]
    pub async fn list_by_product(
        &self,
        product_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();

        let paginator = StockMovement::find()
            .filter(stock_movement::Column::ProductId.eq(product_id))
            .order_by_desc(stock_movement::Column::CreatedAt)
            .order_by_desc(stock_movement::Column::Id)
            .paginate(db, limit.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::from)?;
        let movements = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::from)?;

        Ok((movements, total))
    }
}
