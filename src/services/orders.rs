use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    auth::{Actor, Role},
    db::DbPool,
    entities::{order, order_item, po_item, purchase_order},
    errors::ServiceError,
    events::{Event, EventLine, EventSender},
    models::{OrderStatus, PurchaseOrderStatus},
    schema::SchemaCapabilities,
    services::{inventory::InventoryService, order_select, validate_item_id},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderLine {
    #[validate(length(min = 1))]
    pub item_id: String,
    #[validate(range(min = 1, message = "qty must be positive"))]
    pub qty: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    /// Receiving branch id, or supplier user id when `to_type` is "supplier".
    pub to_id: i64,
    pub to_type: Option<String>,
    /// Authoring branch. Branch staff may only name their own branch (and
    /// default to it); admins must name one for the order to be sendable.
    pub from_id: Option<i64>,
    #[validate(length(min = 1, message = "at least one order line is required"))]
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Service owning the internal-order state machine, including the legacy
/// order-as-PO acceptance path which shares the same status helpers.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    inventory: InventoryService,
    caps: SchemaCapabilities,
}

impl OrderService {
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

    /// Creates a pending order addressed to a branch or a supplier.
    #[instrument(skip(self, request), fields(user_id = actor.user_id))]
    pub async fn create_order(
        &self,
        actor: &Actor,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        for line in &request.items {
            validate_item_id(&line.item_id)?;
            if line.qty <= 0 {
                return Err(ServiceError::ValidationError(
                    "qty must be positive".into(),
                ));
            }
        }
        if let Some(to_type) = request.to_type.as_deref() {
            if !matches!(to_type, "branch" | "supplier") {
                return Err(ServiceError::ValidationError(format!(
                    "invalid to_type: {}",
                    to_type
                )));
            }
        }

        // Branch staff always author from their own branch; admins may
        // author on behalf of a named branch.
        let from_id = match actor.role {
            Role::Restaurant | Role::Kitchen => {
                let branch_id = actor.own_branch()?;
                if request.from_id.is_some() && request.from_id != Some(branch_id) {
                    return Err(ServiceError::Forbidden(
                        "staff can only author orders from their own branch".into(),
                    ));
                }
                Some(branch_id)
            }
            _ => request.from_id.or(actor.branch_id),
        };

        let db = &*self.db_pool;
        let mut new_order = order::ActiveModel {
            from_type: Set("branch".to_string()),
            from_id: Set(from_id),
            to_id: Set(request.to_id),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            auto: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        if self.caps.orders_to_type {
            new_order.to_type = Set(Some(
                request.to_type.unwrap_or_else(|| "branch".to_string()),
            ));
        }
        let created = new_order.insert(db).await?;

        let inserts = join_all(request.items.iter().map(|line| {
            order_item::ActiveModel {
                order_id: Set(created.id),
                item_id: Set(line.item_id.clone()),
                qty: Set(line.qty),
                ..Default::default()
            }
            .insert(db)
        }))
        .await;

        let mut items = Vec::with_capacity(inserts.len());
        for insert in inserts {
            items.push(insert?);
        }

        info!(order_id = created.id, to_id = created.to_id, "order created");

        self.event_sender
            .publish(Event::OrderCreated {
                order_id: created.id,
                from_id: created.from_id,
                to_id: created.to_id,
                auto: false,
                items: items
                    .iter()
                    .map(|i| EventLine {
                        item_id: i.item_id.clone(),
                        qty: i.qty,
                    })
                    .collect(),
            })
            .await;

        Ok(OrderResponse {
            order: created,
            items,
        })
    }

    /// Role-gated listing: branch staff see their own traffic, suppliers see
    /// orders addressed to them once sent, admin and pimpinan see the recent
    /// history.
    #[instrument(skip(self), fields(user_id = actor.user_id))]
    pub async fn list_orders(&self, actor: &Actor) -> Result<Vec<order::Model>, ServiceError> {
        let db = &*self.db_pool;
        let base = order_select(self.caps).order_by_desc(order::Column::Id);

        let select = match actor.role {
            Role::Restaurant | Role::Kitchen => {
                let branch_id = actor.own_branch()?;
                let mut incoming = Condition::all()
                    .add(order::Column::ToId.eq(branch_id))
                    .add(order::Column::Status.is_not_in(OrderStatus::Pending.accepted().to_vec()));
                if self.caps.orders_to_type {
                    incoming = incoming.add(
                        Condition::any()
                            .add(order::Column::ToType.eq("branch"))
                            .add(order::Column::ToType.is_null()),
                    );
                }
                base.filter(
                    Condition::any()
                        .add(order::Column::FromId.eq(branch_id))
                        .add(incoming),
                )
            }
            Role::Supplier => {
                let mut addressed = Condition::all()
                    .add(order::Column::ToId.eq(actor.user_id))
                    .add(order::Column::Status.is_not_in(OrderStatus::Pending.accepted().to_vec()));
                if self.caps.orders_to_type {
                    addressed = addressed.add(order::Column::ToType.eq("supplier"));
                }
                base.filter(addressed)
            }
            Role::Admin | Role::Pimpinan => base.limit(200),
        };

        Ok(select.into_model::<order::Model>().all(db).await?)
    }

    pub async fn get_order(&self, order_id: i64) -> Result<OrderResponse, ServiceError> {
        let order = self.load_order(order_id).await?;
        let items = self.load_items(order_id).await?;
        Ok(OrderResponse { order, items })
    }

    /// pending -> menunggu by the authoring branch's restaurant staff.
    #[instrument(skip(self), fields(user_id = actor.user_id))]
    pub async fn send_order(&self, actor: &Actor, order_id: i64) -> Result<(), ServiceError> {
        let order = self.load_order(order_id).await?;
        actor.require_role(Role::Restaurant, "send an order")?;
        if order.from_id != Some(actor.own_branch()?) {
            return Err(ServiceError::Forbidden(
                "only the creating branch can send this order".into(),
            ));
        }

        self.transition_order(order_id, OrderStatus::Pending, OrderStatus::Waiting, |am| {
            am.shipped_at = Set(Some(Utc::now()));
        })
        .await?;

        self.event_sender
            .publish(Event::OrderSent {
                order_id,
                from_id: order.from_id,
                to_id: order.to_id,
            })
            .await;

        Ok(())
    }

    /// The receiver of a waiting order spawns a priced counter-PO carrying
    /// a back-reference to the order. The order's own status is untouched.
    #[instrument(skip(self), fields(user_id = actor.user_id))]
    pub async fn convert_to_po(
        &self,
        actor: &Actor,
        order_id: i64,
    ) -> Result<purchase_order::Model, ServiceError> {
        let order = self.load_order(order_id).await?;

        let status: OrderStatus = order
            .status
            .parse()
            .map_err(|_| ServiceError::InternalError(format!("bad stored status: {}", order.status)))?;
        if status != OrderStatus::Waiting {
            return Err(ServiceError::Conflict(
                "order is not awaiting a receiver".into(),
            ));
        }

        let is_receiver = match actor.role {
            Role::Supplier => actor.user_id == order.to_id,
            Role::Restaurant => actor.own_branch()? == order.to_id,
            _ => false,
        };
        if !is_receiver {
            return Err(ServiceError::Forbidden(
                "only the order's receiver can convert it".into(),
            ));
        }

        let db = &*self.db_pool;
        let mut new_po = purchase_order::ActiveModel {
            created_by: Set(actor.user_id),
            supplier_id: Set(None),
            branch_id: Set(actor.branch_id),
            status: Set(PurchaseOrderStatus::Pending.as_str().to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        if self.caps.po_to_branch {
            new_po.to_branch = Set(order.from_id);
        }
        if self.caps.po_orig_order_id {
            new_po.orig_order_id = Set(Some(order.id));
        }
        let created = new_po.insert(db).await?;

        let order_items = self.load_items(order_id).await?;
        let inserts = join_all(order_items.iter().map(|line| {
            po_item::ActiveModel {
                po_id: Set(created.id),
                item_id: Set(line.item_id.clone()),
                qty: Set(line.qty),
                unit_price: Set(None),
                ..Default::default()
            }
            .insert(db)
        }))
        .await;
        for insert in inserts {
            insert?;
        }

        info!(po_id = created.id, order_id, "counter purchase order created");

        self.event_sender
            .publish(Event::PurchaseOrderBackCreated {
                po_id: created.id,
                created_by_branch: actor.branch_id,
                to_branch: order.from_id,
                orig_order_id: order.id,
                items: order_items
                    .iter()
                    .map(|i| EventLine {
                        item_id: i.item_id.clone(),
                        qty: i.qty,
                    })
                    .collect(),
            })
            .await;

        Ok(created)
    }

    /// dikirimkan -> selesai by the authoring branch, settling stock into the
    /// branch's ledger line by line.
    #[instrument(skip(self), fields(user_id = actor.user_id))]
    pub async fn finish_by_creator(
        &self,
        actor: &Actor,
        order_id: i64,
    ) -> Result<(), ServiceError> {
        let order = self.load_order(order_id).await?;
        actor.require_role(Role::Restaurant, "finish an order")?;
        let branch_id = actor.own_branch()?;
        let from_id = order.from_id.ok_or_else(|| {
            ServiceError::InvalidOperation("system-generated orders have no creating branch".into())
        })?;
        if from_id != branch_id {
            return Err(ServiceError::Forbidden(
                "only the creating branch can finish this order".into(),
            ));
        }

        self.transition_order(order_id, OrderStatus::Shipped, OrderStatus::Done, |am| {
            am.received_at = Set(Some(Utc::now()));
        })
        .await?;

        let items = self.load_items(order_id).await?;
        let receipts = join_all(
            items
                .iter()
                .map(|line| self.inventory.add_stock(from_id, &line.item_id, line.qty)),
        )
        .await;
        for receipt in receipts {
            receipt?;
        }

        self.event_sender
            .publish(Event::OrderFinished {
                order_id,
                from_id: order.from_id,
            })
            .await;

        Ok(())
    }

    /// Legacy path treating a pending order addressed to a branch as a PO:
    /// the receiver accepts it (-> received_po) and the most recent waiting
    /// counter-order travelling the opposite direction cascades to
    /// dikirimkan.
    #[instrument(skip(self), fields(user_id = actor.user_id))]
    pub async fn accept_po(&self, actor: &Actor, order_id: i64) -> Result<(), ServiceError> {
        let order = self.load_order(order_id).await?;
        let branch_id = actor.require_branch_staff("accept a purchase order")?;
        if order.to_id != branch_id {
            return Err(ServiceError::Forbidden(
                "only the addressed branch can accept this purchase order".into(),
            ));
        }

        self.transition_order(
            order_id,
            OrderStatus::Pending,
            OrderStatus::ReceivedPo,
            |am| {
                am.received_at = Set(Some(Utc::now()));
            },
        )
        .await?;

        // Cascade: the counter-order the accepting branch had sent the other
        // way starts shipping.
        let db = &*self.db_pool;
        let mut cascaded = None;
        if let Some(from_id) = order.from_id {
            let counter = order_select(self.caps)
                .filter(order::Column::FromId.eq(order.to_id))
                .filter(order::Column::ToId.eq(from_id))
                .filter(order::Column::Status.is_in(OrderStatus::Waiting.accepted().to_vec()))
                .order_by_desc(order::Column::Id)
                .into_model::<order::Model>()
                .one(db)
                .await?;
            if let Some(counter) = counter {
                self.transition_order(
                    counter.id,
                    OrderStatus::Waiting,
                    OrderStatus::Shipped,
                    |am| {
                        am.shipped_at = Set(Some(Utc::now()));
                    },
                )
                .await?;
                cascaded = Some(counter.id);
            }
        }

        self.event_sender
            .publish(Event::PurchaseOrderAccepted {
                po_order_id: order_id,
                orig_order_id: cascaded,
            })
            .await;

        Ok(())
    }

    /// Conditional status update; zero affected rows means another actor won
    /// the race or the order never was in `from`, surfaced as a conflict.
    async fn transition_order(
        &self,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
        stamp: impl FnOnce(&mut order::ActiveModel),
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let mut update = order::ActiveModel {
            status: Set(to.as_str().to_string()),
            ..Default::default()
        };
        stamp(&mut update);

        let result = order::Entity::update_many()
            .set(update)
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.is_in(from.accepted().to_vec()))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "order {} is not in the {} state",
                order_id, from
            )));
        }
        Ok(())
    }

    async fn load_order(&self, order_id: i64) -> Result<order::Model, ServiceError> {
        let db = &*self.db_pool;
        order_select(self.caps)
            .filter(order::Column::Id.eq(order_id))
            .into_model::<order::Model>()
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {} not found", order_id)))
    }

    async fn load_items(&self, order_id: i64) -> Result<Vec<order_item::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Id)
            .all(db)
            .await?)
    }
}
