pub mod alert;
pub mod category;
pub mod inventory_item;
pub mod order;
pub mod order_item;
pub mod user;

pub use alert::{AlertStatus, AlertType};
pub use inventory_item::{InventoryItemView, ItemUnit};
pub use order::{OrderStatus, OrderType};
pub use order_item::OrderLine;
pub use user::UserRole;
