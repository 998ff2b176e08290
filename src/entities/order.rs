use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Internal replenishment request, branch-to-branch or branch-to-supplier.
///
/// `to_type` is an optional column: stores predating it carry the receiver
/// id in `to_id` alone. Inserts and filters against it are gated on the
/// schema capability descriptor.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// "branch" for operator-created orders, "warehouse" for auto-orders.
    pub from_type: String,
    /// Creating branch; null for system-generated auto-orders.
    pub from_id: Option<i64>,
    /// "branch" or "supplier"; optional legacy column.
    pub to_type: Option<String>,
    /// Receiving branch id or supplier user id.
    pub to_id: i64,
    pub status: String,
    pub auto: bool,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
