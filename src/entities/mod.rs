pub mod branch;
pub mod inventory;
pub mod item;
pub mod order;
pub mod order_item;
pub mod po_item;
pub mod purchase_order;
