use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::{
    auth::AuthenticatedActor,
    errors::ServiceError,
    services::inventory::{AdjustInventoryRequest, RecordUsageRequest},
    ApiResponse, AppState,
};

pub async fn get_branch_inventory(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(branch_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state
        .inventory_service
        .get_branch_inventory(&actor, branch_id)
        .await?;
    Ok(Json(ApiResponse::success(rows)))
}

pub async fn adjust_inventory(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(branch_id): Path<i64>,
    Json(request): Json<AdjustInventoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let level = state
        .inventory_service
        .adjust_inventory(&actor, branch_id, request)
        .await?;
    Ok(Json(ApiResponse::success(level)))
}

pub async fn record_usage(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(request): Json<RecordUsageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let levels = state
        .inventory_service
        .record_usage(&actor, request)
        .await?;
    Ok(Json(ApiResponse::success(levels)))
}

pub async fn monitor(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> Result<impl IntoResponse, ServiceError> {
    let snapshot = state.inventory_service.monitor(&actor).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}
