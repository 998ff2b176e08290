//! Lifecycle services. Handlers stay thin; every transition rule, role
//! check, and inventory mutation lives here.

pub mod inventory;
pub mod orders;
pub mod purchase_orders;

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::sea_query::Expr;
use sea_orm::{EntityTrait, QuerySelect, Select};

use crate::entities::{order, purchase_order};
use crate::errors::ServiceError;
use crate::schema::SchemaCapabilities;

static ITEM_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid item id pattern"));

/// Item ids are free-form strings but must stay URL- and SQL-safe.
pub fn validate_item_id(item_id: &str) -> Result<(), ServiceError> {
    if ITEM_ID_PATTERN.is_match(item_id) {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(format!(
            "invalid item id: {}",
            item_id
        )))
    }
}

/// Order select honoring the schema capability descriptor. Stores without
/// the `to_type` column get a reduced projection with the column aliased to
/// null so `order::Model` still materializes.
pub(crate) fn order_select(caps: SchemaCapabilities) -> Select<order::Entity> {
    if caps.orders_to_type {
        return order::Entity::find();
    }
    order::Entity::find()
        .select_only()
        .columns([
            order::Column::Id,
            order::Column::FromType,
            order::Column::FromId,
            order::Column::ToId,
            order::Column::Status,
            order::Column::Auto,
            order::Column::CreatedAt,
            order::Column::ShippedAt,
            order::Column::ReceivedAt,
        ])
        .expr_as(Expr::value(Option::<String>::None), "to_type")
}

/// Purchase-order select honoring the schema capability descriptor; missing
/// optional columns are aliased to null.
pub(crate) fn po_select(caps: SchemaCapabilities) -> Select<purchase_order::Entity> {
    if caps.po_to_branch && caps.po_orig_order_id {
        return purchase_order::Entity::find();
    }
    let mut select = purchase_order::Entity::find().select_only().columns([
        purchase_order::Column::Id,
        purchase_order::Column::CreatedBy,
        purchase_order::Column::SupplierId,
        purchase_order::Column::BranchId,
        purchase_order::Column::Status,
        purchase_order::Column::CreatedAt,
        purchase_order::Column::ShippedAt,
        purchase_order::Column::DeliveredAt,
        purchase_order::Column::ReceivedAt,
    ]);
    select = if caps.po_to_branch {
        select.column(purchase_order::Column::ToBranch)
    } else {
        select.expr_as(Expr::value(Option::<i64>::None), "to_branch")
    };
    select = if caps.po_orig_order_id {
        select.column(purchase_order::Column::OrigOrderId)
    } else {
        select.expr_as(Expr::value(Option::<i64>::None), "orig_order_id")
    };
    select
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_pattern() {
        assert!(validate_item_id("BERAS-01").is_ok());
        assert!(validate_item_id("minyak_goreng").is_ok());
        assert!(validate_item_id("").is_err());
        assert!(validate_item_id("beras putih").is_err());
        assert!(validate_item_id("x'; drop table items;--").is_err());
    }
}
