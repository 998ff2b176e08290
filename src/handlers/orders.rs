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
    services::orders::CreateOrderRequest,
    ApiResponse, AppState,
};

pub async fn create_order(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.order_service.create_order(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

pub async fn list_orders(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.order_service.list_orders(&actor).await?;
    Ok(Json(ApiResponse::success(orders)))
}

pub async fn get_order(
    State(state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.order_service.get_order(order_id).await?;
    Ok(Json(ApiResponse::success(order)))
}

pub async fn send_order(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.order_service.send_order(&actor, order_id).await?;
    Ok(Json(ApiResponse::success(json!({ "order_id": order_id }))))
}

pub async fn accept_po(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.order_service.accept_po(&actor, order_id).await?;
    Ok(Json(ApiResponse::success(json!({ "order_id": order_id }))))
}

pub async fn finish_order(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .order_service
        .finish_by_creator(&actor, order_id)
        .await?;
    Ok(Json(ApiResponse::success(json!({ "order_id": order_id }))))
}

pub async fn convert_to_po(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let po = state.order_service.convert_to_po(&actor, order_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(po))))
}
