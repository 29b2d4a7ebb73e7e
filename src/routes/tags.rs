use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    error::AppResult, models::Tag, response::ApiResponse, services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags))
        .route("/{id}", get(get_tag))
}

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "List tags", body = ApiResponse<Vec<Tag>>)
    ),
    tag = "Tags"
)]
pub async fn list_tags(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Tag>>>> {
    let resp = catalog_service::list_tags(&state.pool).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    params(
        ("id" = Uuid, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Get tag", body = ApiResponse<Tag>),
        (status = 404, description = "Tag not found")
    ),
    tag = "Tags"
)]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Tag>>> {
    let resp = catalog_service::get_tag(&state.pool, id).await?;
    Ok(Json(resp))
}
