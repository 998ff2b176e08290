use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    auth::{Actor, Role},
    db::DbPool,
    entities::{order, po_item, purchase_order},
    errors::ServiceError,
    events::{Event, EventLine, EventSender},
    models::{OrderStatus, PurchaseOrderStatus},
    schema::SchemaCapabilities,
    services::{inventory::InventoryService, order_select, po_select, validate_item_id},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PoLine {
    #[validate(length(min = 1))]
    pub item_id: String,
    #[validate(range(min = 1, message = "qty must be positive"))]
    pub qty: i32,
    /// Free-form price text from the client; sanitized before storage.
    pub unit_price: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreatePurchaseOrderRequest {
    /// Supplier user id for supplier-addressed POs.
    pub supplier_id: Option<i64>,
    /// Receiving branch for internal transfers.
    pub to_branch: Option<i64>,
    /// Back-reference to the order this PO answers, internal transfers only.
    pub orig_order_id: Option<i64>,
    #[validate(length(min = 1, message = "at least one line is required"))]
    pub items: Vec<PoLine>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseOrderResponse {
    #[serde(flatten)]
    pub purchase_order: purchase_order::Model,
    pub items: Vec<po_item::Model>,
}

/// Strips everything but digits and the decimal point, then parses. Returns
/// None when nothing parseable remains, matching the lenient price handling
/// clients rely on ("Rp 12.500" and friends).
pub fn sanitize_unit_price(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

/// Service owning the priced purchase-order state machine.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    inventory: InventoryService,
    caps: SchemaCapabilities,
}

impl PurchaseOrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        inventory: InventoryService,
        caps: SchemaCapabilities,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            inventory,
            caps,
        }
    }

    /// Creates a PENDING purchase order, supplier-addressed or as an
    /// internal transfer to another branch.
    #[instrument(skip(self, request), fields(user_id = actor.user_id))]
    pub async fn create_purchase_order(
        &self,
        actor: &Actor,
        request: CreatePurchaseOrderRequest,
    ) -> Result<PurchaseOrderResponse, ServiceError> {
        actor.require_role(Role::Restaurant, "create a purchase order")?;
        let branch_id = actor.own_branch()?;

        request.validate()?;
        for line in &request.items {
            validate_item_id(&line.item_id)?;
            if line.qty <= 0 {
                return Err(ServiceError::ValidationError(
                    "qty must be positive".into(),
                ));
            }
        }
        match (request.supplier_id, request.to_branch) {
            (Some(_), Some(_)) | (None, None) => {
                return Err(ServiceError::ValidationError(
                    "exactly one of supplier_id or to_branch is required".into(),
                ));
            }
            _ => {}
        }
        if request.orig_order_id.is_some() && request.to_branch.is_none() {
            return Err(ServiceError::ValidationError(
                "orig_order_id only applies to internal transfers".into(),
            ));
        }

        let db = &*self.db_pool;
        let mut new_po = purchase_order::ActiveModel {
            created_by: Set(actor.user_id),
            supplier_id: Set(request.supplier_id),
            branch_id: Set(Some(branch_id)),
            status: Set(PurchaseOrderStatus::Pending.as_str().to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        // Reduced schemas silently drop the transfer columns; receive then
        // falls back to the authoring branch.
        if self.caps.po_to_branch {
            new_po.to_branch = Set(request.to_branch);
        }
        if self.caps.po_orig_order_id {
            new_po.orig_order_id = Set(request.orig_order_id);
        }
        let created = new_po.insert(db).await?;

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            items.push(self.insert_line(created.id, line).await?);
        }

        info!(po_id = created.id, "purchase order created");

        self.event_sender
            .publish(Event::PurchaseOrderCreated {
                po_id: created.id,
                branch_id: created.branch_id,
                supplier_id: created.supplier_id,
                to_branch: request.to_branch,
                items: items
                    .iter()
                    .map(|i| EventLine {
                        item_id: i.item_id.clone(),
                        qty: i.qty,
                    })
                    .collect(),
            })
            .await;

        Ok(PurchaseOrderResponse {
            purchase_order: created,
            items,
        })
    }

    /// Inserts one line; a failure with the price present is retried without
    /// it so a bad decimal never sinks the whole document.
    async fn insert_line(
        &self,
        po_id: i64,
        line: &PoLine,
    ) -> Result<po_item::Model, ServiceError> {
        let db = &*self.db_pool;
        let price = line.unit_price.as_deref().and_then(sanitize_unit_price);

        let insert = po_item::ActiveModel {
            po_id: Set(po_id),
            item_id: Set(line.item_id.clone()),
            qty: Set(line.qty),
            unit_price: Set(price),
            ..Default::default()
        }
        .insert(db)
        .await;

        match insert {
            Ok(model) => Ok(model),
            Err(e) if price.is_some() => {
                warn!(po_id, item_id = %line.item_id, error = %e, "line insert failed, retrying without price");
                Ok(po_item::ActiveModel {
                    po_id: Set(po_id),
                    item_id: Set(line.item_id.clone()),
                    qty: Set(line.qty),
                    unit_price: Set(None),
                    ..Default::default()
                }
                .insert(db)
                .await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Role-gated listing: suppliers see POs addressed to them, restaurant
    /// staff their branch's outgoing and incoming, admin and pimpinan the
    /// recent history.
    #[instrument(skip(self), fields(user_id = actor.user_id))]
    pub async fn list_purchase_orders(
        &self,
        actor: &Actor,
    ) -> Result<Vec<purchase_order::Model>, ServiceError> {
        let db = &*self.db_pool;
        let base = po_select(self.caps).order_by_desc(purchase_order::Column::Id);

        let select = match actor.role {
            Role::Supplier => base.filter(purchase_order::Column::SupplierId.eq(actor.user_id)),
            Role::Restaurant => {
                let branch_id = actor.own_branch()?;
                let mut visible =
                    Condition::any().add(purchase_order::Column::BranchId.eq(branch_id));
                if self.caps.po_to_branch {
                    visible = visible.add(purchase_order::Column::ToBranch.eq(branch_id));
                }
                base.filter(visible)
            }
            Role::Admin | Role::Pimpinan => base.limit(200),
            Role::Kitchen => {
                return Err(ServiceError::Forbidden(
                    "kitchen staff cannot list purchase orders".into(),
                ));
            }
        };

        Ok(select.into_model::<purchase_order::Model>().all(db).await?)
    }

    pub async fn get_purchase_order(
        &self,
        po_id: i64,
    ) -> Result<PurchaseOrderResponse, ServiceError> {
        let purchase_order = self.load_po(po_id).await?;
        let items = self.load_items(po_id).await?;
        Ok(PurchaseOrderResponse {
            purchase_order,
            items,
        })
    }

    /// PENDING -> APPROVED, only by the branch that created the originating
    /// order. POs without a back-reference cannot travel this path.
    #[instrument(skip(self), fields(user_id = actor.user_id))]
    pub async fn approve(&self, actor: &Actor, po_id: i64) -> Result<(), ServiceError> {
        let po = self.load_po(po_id).await?;
        let orig_order_id = po.orig_order_id.ok_or_else(|| {
            ServiceError::InvalidOperation(
                "approval requires a purchase order linked to an originating order".into(),
            )
        })?;

        let branch_id = actor.require_branch_staff("approve a purchase order")?;
        let orig = self.load_orig_order(orig_order_id).await?;
        if orig.from_id != Some(branch_id) {
            return Err(ServiceError::Forbidden(
                "only the branch that created the original order can approve".into(),
            ));
        }

        self.transition_po(
            po_id,
            &[PurchaseOrderStatus::Pending],
            PurchaseOrderStatus::Approved,
            |_| {},
        )
        .await?;

        self.event_sender
            .publish(Event::PurchaseOrderApproved {
                po_id,
                orig_order_id,
            })
            .await;

        Ok(())
    }

    /// PENDING|APPROVED -> SHIPPED. Supplier-addressed POs ship only by that
    /// supplier; everything else only by the creator. A linked originating
    /// order cascades to dikirimkan.
    #[instrument(skip(self), fields(user_id = actor.user_id))]
    pub async fn ship(&self, actor: &Actor, po_id: i64) -> Result<(), ServiceError> {
        let po = self.load_po(po_id).await?;

        let eligible = match po.supplier_id {
            Some(supplier_id) => actor.role == Role::Supplier && actor.user_id == supplier_id,
            None => actor.user_id == po.created_by,
        };
        if !eligible {
            return Err(ServiceError::Forbidden(
                "not allowed to ship this purchase order".into(),
            ));
        }

        self.transition_po(
            po_id,
            &[PurchaseOrderStatus::Pending, PurchaseOrderStatus::Approved],
            PurchaseOrderStatus::Shipped,
            |am| {
                am.shipped_at = Set(Some(Utc::now()));
            },
        )
        .await?;

        if let Some(orig_order_id) = po.orig_order_id {
            // Cascade is best-effort: a counter-order already past menunggu
            // stays where it is.
            let cascade = order::Entity::update_many()
                .set(order::ActiveModel {
                    status: Set(OrderStatus::Shipped.as_str().to_string()),
                    shipped_at: Set(Some(Utc::now())),
                    ..Default::default()
                })
                .filter(order::Column::Id.eq(orig_order_id))
                .filter(order::Column::Status.is_in(OrderStatus::Waiting.accepted().to_vec()))
                .exec(&*self.db_pool)
                .await?;
            if cascade.rows_affected == 0 {
                warn!(po_id, orig_order_id, "originating order did not cascade");
            }
        }

        self.event_sender
            .publish(Event::PurchaseOrderShipped {
                po_id,
                orig_order_id: po.orig_order_id,
            })
            .await;

        Ok(())
    }

    /// SHIPPED -> DELIVERED, supplier role only.
    #[instrument(skip(self), fields(user_id = actor.user_id))]
    pub async fn deliver(&self, actor: &Actor, po_id: i64) -> Result<(), ServiceError> {
        self.load_po(po_id).await?;
        actor.require_role(Role::Supplier, "mark a purchase order delivered")?;

        self.transition_po(
            po_id,
            &[PurchaseOrderStatus::Shipped],
            PurchaseOrderStatus::Delivered,
            |am| {
                am.delivered_at = Set(Some(Utc::now()));
            },
        )
        .await?;

        self.event_sender
            .publish(Event::PurchaseOrderDelivered { po_id })
            .await;

        Ok(())
    }

    /// DELIVERED -> RECEIVED by the target branch, settling stock into its
    /// ledger. The target is the originating order's creating branch when
    /// linked, else the PO's authoring branch.
    #[instrument(skip(self), fields(user_id = actor.user_id))]
    pub async fn receive(&self, actor: &Actor, po_id: i64) -> Result<(), ServiceError> {
        let po = self.load_po(po_id).await?;
        actor.require_role(Role::Restaurant, "receive a purchase order")?;
        let branch_id = actor.own_branch()?;

        let target_branch = match po.orig_order_id {
            Some(orig_order_id) => {
                let orig = self.load_orig_order(orig_order_id).await?;
                orig.from_id.ok_or_else(|| {
                    ServiceError::InvalidOperation(
                        "originating order has no creating branch".into(),
                    )
                })?
            }
            None => po.branch_id.ok_or_else(|| {
                ServiceError::InvalidOperation("purchase order has no receiving branch".into())
            })?,
        };
        if target_branch != branch_id {
            return Err(ServiceError::Forbidden(
                "only the target branch can receive this purchase order".into(),
            ));
        }

        self.transition_po(
            po_id,
            &[PurchaseOrderStatus::Delivered],
            PurchaseOrderStatus::Received,
            |am| {
                am.received_at = Set(Some(Utc::now()));
            },
        )
        .await?;

        let items = self.load_items(po_id).await?;
        let receipts = join_all(items.iter().map(|line| {
            self.inventory
                .add_stock(target_branch, &line.item_id, line.qty)
        }))
        .await;
        for receipt in receipts {
            receipt?;
        }

        self.event_sender
            .publish(Event::PurchaseOrderReceived {
                po_id,
                target_branch,
            })
            .await;

        Ok(())
    }

    async fn transition_po(
        &self,
        po_id: i64,
        from: &[PurchaseOrderStatus],
        to: PurchaseOrderStatus,
        stamp: impl FnOnce(&mut purchase_order::ActiveModel),
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let mut update = purchase_order::ActiveModel {
            status: Set(to.as_str().to_string()),
            ..Default::default()
        };
        stamp(&mut update);

        let accepted: Vec<&str> = from.iter().map(|s| s.as_str()).collect();
        let result = purchase_order::Entity::update_many()
            .set(update)
            .filter(purchase_order::Column::Id.eq(po_id))
            .filter(purchase_order::Column::Status.is_in(accepted))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "purchase order {} is not in an eligible state",
                po_id
            )));
        }
        Ok(())
    }

    async fn load_po(&self, po_id: i64) -> Result<purchase_order::Model, ServiceError> {
        let db = &*self.db_pool;
        po_select(self.caps)
            .filter(purchase_order::Column::Id.eq(po_id))
            .into_model::<purchase_order::Model>()
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("purchase order {} not found", po_id)))
    }

    async fn load_orig_order(&self, order_id: i64) -> Result<order::Model, ServiceError> {
        let db = &*self.db_pool;
        order_select(self.caps)
            .filter(order::Column::Id.eq(order_id))
            .into_model::<order::Model>()
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("originating order {} not found", order_id))
            })
    }

    async fn load_items(&self, po_id: i64) -> Result<Vec<po_item::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(po_item::Entity::find()
            .filter(po_item::Column::PoId.eq(po_id))
            .order_by_asc(po_item::Column::Id)
            .all(db)
            .await?)
    }
}
