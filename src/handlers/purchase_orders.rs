use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    auth::AuthenticatedActor,
    errors::ServiceError,
    services::purchase_orders::CreatePurchaseOrderRequest,
    ApiResponse, AppState,
};

pub async fn create_purchase_order(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(request): Json<CreatePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let po = state
        .purchase_order_service
        .create_purchase_order(&actor, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(po))))
}

pub async fn list_purchase_orders(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> Result<impl IntoResponse, ServiceError> {
    let pos = state
        .purchase_order_service
        .list_purchase_orders(&actor)
        .await?;
    Ok(Json(ApiResponse::success(pos)))
}

pub async fn get_purchase_order(
    State(state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
    Path(po_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let po = state
        .purchase_order_service
        .get_purchase_order(po_id)
        .await?;
    Ok(Json(ApiResponse::success(po)))
}

pub async fn approve_purchase_order(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(po_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.purchase_order_service.approve(&actor, po_id).await?;
    Ok(Json(ApiResponse::success(json!({ "po_id": po_id }))))
}

pub async fn ship_purchase_order(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(po_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.purchase_order_service.ship(&actor, po_id).await?;
    Ok(Json(ApiResponse::success(json!({ "po_id": po_id }))))
}

pub async fn deliver_purchase_order(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(po_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.purchase_order_service.deliver(&actor, po_id).await?;
    Ok(Json(ApiResponse::success(json!({ "po_id": po_id }))))
}

pub async fn receive_purchase_order(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(po_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.purchase_order_service.receive(&actor, po_id).await?;
    Ok(Json(ApiResponse::success(json!({ "po_id": po_id }))))
}
