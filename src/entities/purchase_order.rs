use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Priced restocking document, addressed either to a supplier
/// (`supplier_id` set) or to another branch (`to_branch` set).
///
/// `branch_id` is always the AUTHORING branch; the addressed branch lives in
/// the explicit `to_branch` column. `to_branch` and `orig_order_id` are
/// optional columns gated on the schema capability descriptor.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub created_by: i64,
    pub supplier_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub to_branch: Option<i64>,
    /// Back-reference to the order this PO was spawned from, when any.
    pub orig_order_id: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::po_item::Entity")]
    PoItem,
}

impl Related<super::po_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PoItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
