use std::sync::Arc;

use futures::future::join_all;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    auth::{Actor, Role},
    db::DbPool,
    entities::{branch, inventory, item, order, order_item},
    errors::ServiceError,
    events::{Event, EventLine, EventSender},
    models::OrderStatus,
    schema::SchemaCapabilities,
    services::{order_select, validate_item_id},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UsageLine {
    #[validate(length(min = 1))]
    pub item_id: String,
    #[validate(range(min = 1))]
    pub qty: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RecordUsageRequest {
    #[validate(length(min = 1, message = "at least one usage line is required"))]
    pub lines: Vec<UsageLine>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AdjustInventoryRequest {
    #[validate(length(min = 1))]
    pub item_id: String,
    #[validate(range(min = 0, message = "qty must be non-negative"))]
    pub qty: i32,
}

/// Inventory listing row with the item name joined in.
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct InventoryRow {
    pub item_id: String,
    pub name: String,
    pub qty: i32,
    pub reorder_level: i32,
}

#[derive(Debug, Serialize)]
pub struct MonitorBranch {
    pub branch: branch::Model,
    pub inventory: Vec<InventoryRow>,
}

#[derive(Debug, Serialize)]
pub struct MonitorSnapshot {
    pub branches: Vec<MonitorBranch>,
    pub recent_orders: Vec<order::Model>,
}

/// Service owning the per-branch stock ledger and the auto-reorder rule.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    caps: SchemaCapabilities,
    default_reorder_level: i32,
}

impl InventoryService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        caps: SchemaCapabilities,
        default_reorder_level: i32,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            caps,
            default_reorder_level,
        }
    }

    /// Records kitchen usage for the actor's branch. Every line is validated
    /// before any stock moves; the per-line mutations then run concurrently
    /// and are joined, so one failing line does not abort its siblings.
    #[instrument(skip(self, request), fields(user_id = actor.user_id))]
    pub async fn record_usage(
        &self,
        actor: &Actor,
        request: RecordUsageRequest,
    ) -> Result<Vec<inventory::Model>, ServiceError> {
        actor.require_role(Role::Kitchen, "record usage")?;
        let branch_id = actor.own_branch()?;

        request.validate()?;
        for line in &request.lines {
            validate_item_id(&line.item_id)?;
            if line.qty <= 0 {
                return Err(ServiceError::ValidationError(
                    "usage qty must be positive".into(),
                ));
            }
        }

        let results = join_all(
            request
                .lines
                .iter()
                .map(|line| self.apply_usage(branch_id, line)),
        )
        .await;

        let mut levels = Vec::with_capacity(results.len());
        for result in results {
            levels.push(result?);
        }
        Ok(levels)
    }

    /// Decrements one line, floored at zero, then re-reads the level and
    /// triggers the auto-reorder rule when the threshold is crossed.
    async fn apply_usage(
        &self,
        branch_id: i64,
        line: &UsageLine,
    ) -> Result<inventory::Model, ServiceError> {
        let db = &*self.db_pool;

        let updated = inventory::Entity::update_many()
            .col_expr(
                inventory::Column::Qty,
                Expr::cust_with_values(
                    "CASE WHEN qty > ? THEN qty - ? ELSE 0 END",
                    [line.qty, line.qty],
                ),
            )
            .filter(inventory::Column::BranchId.eq(branch_id))
            .filter(inventory::Column::ItemId.eq(line.item_id.as_str()))
            .exec(db)
            .await?;

        if updated.rows_affected == 0 {
            // First touch of this item at this branch: track it at zero so
            // the reorder rule below can kick in.
            self.create_entry(branch_id, &line.item_id, 0).await?;
        }

        let level = self.get_entry(branch_id, &line.item_id).await?;

        self.event_sender
            .publish(Event::InventoryUpdated {
                branch_id,
                item_id: level.item_id.clone(),
                qty: level.qty,
            })
            .await;

        if level.qty <= level.reorder_level {
            // Best-effort: a failed auto order never rolls back the usage.
            if let Err(e) = self.create_auto_order(&level).await {
                warn!(
                    branch_id,
                    item_id = %level.item_id,
                    error = %e,
                    "auto reorder failed"
                );
            }
        }

        Ok(level)
    }

    /// Sets an absolute stock level. Restaurant staff only, own branch only;
    /// the executive role is explicitly read-only.
    #[instrument(skip(self, request), fields(user_id = actor.user_id, branch_id))]
    pub async fn adjust_inventory(
        &self,
        actor: &Actor,
        branch_id: i64,
        request: AdjustInventoryRequest,
    ) -> Result<inventory::Model, ServiceError> {
        if actor.role == Role::Pimpinan {
            return Err(ServiceError::Forbidden(
                "pimpinan access is read-only".into(),
            ));
        }
        actor.require_role(Role::Restaurant, "adjust inventory")?;
        if actor.own_branch()? != branch_id {
            return Err(ServiceError::Forbidden(
                "cannot adjust another branch's inventory".into(),
            ));
        }

        request.validate()?;
        validate_item_id(&request.item_id)?;

        let db = &*self.db_pool;
        let updated = inventory::Entity::update_many()
            .col_expr(inventory::Column::Qty, Expr::value(request.qty))
            .filter(inventory::Column::BranchId.eq(branch_id))
            .filter(inventory::Column::ItemId.eq(request.item_id.as_str()))
            .exec(db)
            .await?;

        if updated.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "no inventory entry for item {} at branch {}",
                request.item_id, branch_id
            )));
        }

        let level = self.get_entry(branch_id, &request.item_id).await?;

        self.event_sender
            .publish(Event::InventoryUpdated {
                branch_id,
                item_id: level.item_id.clone(),
                qty: level.qty,
            })
            .await;

        Ok(level)
    }

    /// Receipt-side increment shared by order-finish and po-receive. Creates
    /// the entry lazily with the default reorder level.
    pub async fn add_stock(
        &self,
        branch_id: i64,
        item_id: &str,
        qty: i32,
    ) -> Result<inventory::Model, ServiceError> {
        validate_item_id(item_id)?;
        if qty <= 0 {
            return Err(ServiceError::ValidationError(
                "receipt qty must be positive".into(),
            ));
        }

        let db = &*self.db_pool;
        let updated = inventory::Entity::update_many()
            .col_expr(
                inventory::Column::Qty,
                Expr::col(inventory::Column::Qty).add(qty),
            )
            .filter(inventory::Column::BranchId.eq(branch_id))
            .filter(inventory::Column::ItemId.eq(item_id))
            .exec(db)
            .await?;

        if updated.rows_affected == 0 {
            if let Err(e) = self.create_entry(branch_id, item_id, qty).await {
                // Lost the insert race; fall back to the increment.
                warn!(branch_id, item_id, error = %e, "insert raced, retrying increment");
                inventory::Entity::update_many()
                    .col_expr(
                        inventory::Column::Qty,
                        Expr::col(inventory::Column::Qty).add(qty),
                    )
                    .filter(inventory::Column::BranchId.eq(branch_id))
                    .filter(inventory::Column::ItemId.eq(item_id))
                    .exec(db)
                    .await?;
            }
        }

        let level = self.get_entry(branch_id, item_id).await?;

        self.event_sender
            .publish(Event::InventoryUpdated {
                branch_id,
                item_id: level.item_id.clone(),
                qty: level.qty,
            })
            .await;

        Ok(level)
    }

    /// Item-name-joined stock listing for one branch. Branch staff may only
    /// read their own branch.
    #[instrument(skip(self), fields(user_id = actor.user_id))]
    pub async fn get_branch_inventory(
        &self,
        actor: &Actor,
        branch_id: i64,
    ) -> Result<Vec<InventoryRow>, ServiceError> {
        match actor.role {
            Role::Admin | Role::Pimpinan => {}
            Role::Restaurant | Role::Kitchen => {
                if actor.own_branch()? != branch_id {
                    return Err(ServiceError::Forbidden(
                        "cannot read another branch's inventory".into(),
                    ));
                }
            }
            Role::Supplier => {
                return Err(ServiceError::Forbidden(
                    "suppliers cannot read branch inventory".into(),
                ));
            }
        }

        self.list_branch_rows(branch_id).await
    }

    /// Dashboard feed: per-branch stock snapshot plus the 50 most recent
    /// orders.
    #[instrument(skip(self), fields(user_id = actor.user_id))]
    pub async fn monitor(&self, actor: &Actor) -> Result<MonitorSnapshot, ServiceError> {
        if !matches!(actor.role, Role::Admin | Role::Pimpinan) {
            return Err(ServiceError::Forbidden(
                "monitor is limited to admin and pimpinan".into(),
            ));
        }

        let db = &*self.db_pool;
        let branches = branch::Entity::find()
            .order_by_asc(branch::Column::Id)
            .all(db)
            .await?;

        let mut snapshot = Vec::with_capacity(branches.len());
        for b in branches {
            let inventory = self.list_branch_rows(b.id).await?;
            snapshot.push(MonitorBranch {
                branch: b,
                inventory,
            });
        }

        let recent_orders = order_select(self.caps)
            .order_by_desc(order::Column::Id)
            .limit(50)
            .into_model::<order::Model>()
            .all(db)
            .await?;

        Ok(MonitorSnapshot {
            branches: snapshot,
            recent_orders,
        })
    }

    async fn list_branch_rows(&self, branch_id: i64) -> Result<Vec<InventoryRow>, ServiceError> {
        let db = &*self.db_pool;
        let rows = inventory::Entity::find()
            .join(JoinType::InnerJoin, inventory::Relation::Item.def())
            .select_only()
            .column(inventory::Column::ItemId)
            .column(item::Column::Name)
            .column(inventory::Column::Qty)
            .column(inventory::Column::ReorderLevel)
            .filter(inventory::Column::BranchId.eq(branch_id))
            .order_by_asc(inventory::Column::ItemId)
            .into_model::<InventoryRow>()
            .all(db)
            .await?;
        Ok(rows)
    }

    async fn get_entry(
        &self,
        branch_id: i64,
        item_id: &str,
    ) -> Result<inventory::Model, ServiceError> {
        let db = &*self.db_pool;
        inventory::Entity::find_by_id((branch_id, item_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "no inventory entry for item {} at branch {}",
                    item_id, branch_id
                ))
            })
    }

    async fn create_entry(
        &self,
        branch_id: i64,
        item_id: &str,
        qty: i32,
    ) -> Result<inventory::Model, ServiceError> {
        let db = &*self.db_pool;
        let entry = inventory::ActiveModel {
            branch_id: Set(branch_id),
            item_id: Set(item_id.to_string()),
            qty: Set(qty),
            reorder_level: Set(self.default_reorder_level),
        };
        Ok(entry.insert(db).await?)
    }

    /// Synthesizes a warehouse-sourced replenishment order when stock falls
    /// to or below the reorder level. Target quantity refills to three times
    /// the threshold, never less than one unit.
    async fn create_auto_order(&self, level: &inventory::Model) -> Result<i64, ServiceError> {
        let db = &*self.db_pool;
        let needed = (level.reorder_level * 3 - level.qty).max(1);

        let mut new_order = order::ActiveModel {
            from_type: Set("warehouse".to_string()),
            from_id: Set(None),
            to_id: Set(level.branch_id),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            auto: Set(true),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };
        if self.caps.orders_to_type {
            new_order.to_type = Set(Some("branch".to_string()));
        }
        let created = new_order.insert(db).await?;

        order_item::ActiveModel {
            order_id: Set(created.id),
            item_id: Set(level.item_id.clone()),
            qty: Set(needed),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(
            order_id = created.id,
            branch_id = level.branch_id,
            item_id = %level.item_id,
            qty = needed,
            "auto reorder created"
        );

        self.event_sender
            .publish(Event::OrderCreated {
                order_id: created.id,
                from_id: None,
                to_id: level.branch_id,
                auto: true,
                items: vec![EventLine {
                    item_id: level.item_id.clone(),
                    qty: needed,
                }],
            })
            .await;

        Ok(created.id)
    }
}
