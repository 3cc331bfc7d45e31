use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reason tags for stock movements.
///
/// The set is closed: a movement always carries one of these tags, never
/// free text. Corrections to past mistakes are made by inserting an
/// offsetting `ManualAdjustment` movement, not by editing history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementReason {
    ManualAdjustment,
    SupplierIntake,
    CustomerReturn,
    LossOrDamage,
    OrderFulfillment,
}

impl MovementReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementReason::ManualAdjustment => "manual_adjustment",
            MovementReason::SupplierIntake => "supplier_intake",
            MovementReason::CustomerReturn => "customer_return",
            MovementReason::LossOrDamage => "loss_or_damage",
            MovementReason::OrderFulfillment => "order_fulfillment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manual_adjustment" => Some(MovementReason::ManualAdjustment),
            "supplier_intake" => Some(MovementReason::SupplierIntake),
            "customer_return" => Some(MovementReason::CustomerReturn),
            "loss_or_damage" => Some(MovementReason::LossOrDamage),
            "order_fulfillment" => Some(MovementReason::OrderFulfillment),
            _ => None,
        }
    }
}

/// One append-only ledger row.
///
/// Rows are inserted by the adjust path and never updated or deleted; the
/// auto-increment `id` gives movements for a product a total insertion
/// order. `related_order_id` is set when the movement originates from an
/// order fulfillment event and serves as the caller's idempotency hint.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_id: Uuid,
    pub quantity_change: i32,
    pub reason: String, // stored as string, converted to/from MovementReason
    pub related_order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_level::Entity",
        from = "Column::ProductId",
        to = "super::inventory_level::Column::ProductId"
    )]
    InventoryLevel,
}

impl Related<super::inventory_level::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryLevel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
