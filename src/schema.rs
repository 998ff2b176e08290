//! Schema capability detection.
//!
//! Two historical schema generations of the `orders` and `purchase_orders`
//! tables exist in the field: newer ones carry `orders.to_type`,
//! `purchase_orders.to_branch` and `purchase_orders.orig_order_id`, older
//! ones do not. Instead of probing before every statement, the capability
//! set is resolved once at startup and passed into the lifecycle services,
//! which pick a reduced insert/query path when a column is absent.

use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, Statement};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaCapabilities {
    /// `orders.to_type` exists.
    pub orders_to_type: bool,
    /// `purchase_orders.to_branch` exists.
    pub po_to_branch: bool,
    /// `purchase_orders.orig_order_id` exists.
    pub po_orig_order_id: bool,
}

impl SchemaCapabilities {
    /// All optional columns present; what the embedded migrator creates.
    pub const fn full() -> Self {
        Self {
            orders_to_type: true,
            po_to_branch: true,
            po_orig_order_id: true,
        }
    }

    /// Oldest supported schema generation.
    pub const fn minimal() -> Self {
        Self {
            orders_to_type: false,
            po_to_branch: false,
            po_orig_order_id: false,
        }
    }

    /// Probes the connected store once. Intended to run during startup,
    /// after migrations.
    pub async fn detect<C: ConnectionTrait>(db: &C) -> Result<Self, DbErr> {
        let caps = Self {
            orders_to_type: has_column(db, "orders", "to_type").await?,
            po_to_branch: has_column(db, "purchase_orders", "to_branch").await?,
            po_orig_order_id: has_column(db, "purchase_orders", "orig_order_id").await?,
        };
        if caps == Self::full() {
            info!("schema capabilities: full");
        } else {
            warn!(?caps, "schema capabilities: reduced; using fallback paths");
        }
        Ok(caps)
    }
}

/// Backend-aware column existence probe.
pub async fn has_column<C: ConnectionTrait>(
    db: &C,
    table: &str,
    column: &str,
) -> Result<bool, DbErr> {
    let backend = db.get_database_backend();
    let stmt = match backend {
        DatabaseBackend::Sqlite => Statement::from_sql_and_values(
            backend,
            "SELECT COUNT(*) AS cnt FROM pragma_table_info(?) WHERE name = ?",
            [table.into(), column.into()],
        ),
        DatabaseBackend::MySql => Statement::from_sql_and_values(
            backend,
            "SELECT COUNT(*) AS cnt FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = ? AND column_name = ?",
            [table.into(), column.into()],
        ),
        DatabaseBackend::Postgres => Statement::from_sql_and_values(
            backend,
            "SELECT COUNT(*) AS cnt FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2",
            [table.into(), column.into()],
        ),
    };

    let row = db
        .query_one(stmt)
        .await?
        .ok_or_else(|| DbErr::Custom("column probe returned no row".into()))?;
    let count: i64 = row.try_get("", "cnt")?;
    Ok(count > 0)
}
