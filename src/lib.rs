pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod schema;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use services::{
    inventory::InventoryService, orders::OrderService, purchase_orders::PurchaseOrderService,
};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: events::EventSender,
    pub caps: schema::SchemaCapabilities,
    pub inventory_service: InventoryService,
    pub order_service: OrderService,
    pub purchase_order_service: PurchaseOrderService,
}

impl AppState {
    /// Wires the service graph. The inventory service is shared: the order
    /// and purchase-order services use it for receipt-side stock settlement.
    pub fn build(
        db: Arc<DatabaseConnection>,
        config: Arc<config::AppConfig>,
        event_sender: events::EventSender,
        caps: schema::SchemaCapabilities,
    ) -> Self {
        let inventory_service = InventoryService::new(
            db.clone(),
            event_sender.clone(),
            caps,
            config.default_reorder_level,
        );
        let order_service = OrderService::new(
            db.clone(),
            event_sender.clone(),
            inventory_service.clone(),
            caps,
        );
        let purchase_order_service = PurchaseOrderService::new(
            db.clone(),
            event_sender.clone(),
            inventory_service.clone(),
            caps,
        );

        Self {
            db,
            config,
            event_sender,
            caps,
            inventory_service,
            order_service,
            purchase_order_service,
        }
    }
}

/// Uniform response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Versioned API surface, 1:1 with the lifecycle actions.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route("/orders/:id/send", post(handlers::orders::send_order))
        .route("/orders/:id/accept-po", post(handlers::orders::accept_po))
        .route("/orders/:id/finish", post(handlers::orders::finish_order))
        .route("/orders/:id/po", post(handlers::orders::convert_to_po))
        .route(
            "/purchase-orders",
            post(handlers::purchase_orders::create_purchase_order)
                .get(handlers::purchase_orders::list_purchase_orders),
        )
        .route(
            "/purchase-orders/:id",
            get(handlers::purchase_orders::get_purchase_order),
        )
        .route(
            "/purchase-orders/:id/approve",
            post(handlers::purchase_orders::approve_purchase_order),
        )
        .route(
            "/purchase-orders/:id/ship",
            post(handlers::purchase_orders::ship_purchase_order),
        )
        .route(
            "/purchase-orders/:id/deliver",
            post(handlers::purchase_orders::deliver_purchase_order),
        )
        .route(
            "/purchase-orders/:id/receive",
            post(handlers::purchase_orders::receive_purchase_order),
        )
        .route(
            "/inventory/usage",
            post(handlers::inventory::record_usage),
        )
        .route(
            "/inventory/:branch_id",
            get(handlers::inventory::get_branch_inventory),
        )
        .route(
            "/inventory/:branch_id/adjust",
            post(handlers::inventory::adjust_inventory),
        )
        .route("/items", get(handlers::catalog::list_items))
        .route("/branches", get(handlers::catalog::list_branches))
        .route("/monitor", get(handlers::inventory::monitor))
}

/// Full application router with the ambient middleware stack.
pub fn app_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(timeout))
        .with_state(state)
}
