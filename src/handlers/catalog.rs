use axum::{extract::State, response::IntoResponse, Json};
use sea_orm::{EntityTrait, QueryOrder};

use crate::{
    auth::AuthenticatedActor,
    entities::{branch, item},
    errors::ServiceError,
    ApiResponse, AppState,
};

pub async fn list_items(
    State(state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
) -> Result<impl IntoResponse, ServiceError> {
    let items = item::Entity::find()
        .order_by_asc(item::Column::Id)
        .all(&*state.db)
        .await?;
    Ok(Json(ApiResponse::success(items)))
}

pub async fn list_branches(
    State(state): State<AppState>,
    AuthenticatedActor(_actor): AuthenticatedActor,
) -> Result<impl IntoResponse, ServiceError> {
    let branches = branch::Entity::find()
        .order_by_asc(branch::Column::Id)
        .all(&*state.db)
        .await?;
    Ok(Json(ApiResponse::success(branches)))
}
