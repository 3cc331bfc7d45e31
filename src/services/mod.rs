pub mod inventory;
pub mod ledger;

pub use inventory::{InventoryService, StockStatus};
pub use ledger::LedgerStore;
