pub mod inventory_level;
pub mod stock_movement;

pub use stock_movement::MovementReason;
