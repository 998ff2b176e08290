pub mod status;

pub use status::{OrderStatus, PurchaseOrderStatus};
