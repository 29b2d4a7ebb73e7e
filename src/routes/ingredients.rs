use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    error::AppResult, models::Ingredient, response::ApiResponse,
    routes::params::IngredientQuery, services::catalog_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ingredients))
        .route("/{id}", get(get_ingredient))
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(
        ("search" = Option<String>, Query, description = "Name prefix filter")
    ),
    responses(
        (status = 200, description = "List ingredients", body = ApiResponse<Vec<Ingredient>>)
    ),
    tag = "Ingredients"
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> AppResult<Json<ApiResponse<Vec<Ingredient>>>> {
    let resp = catalog_service::list_ingredients(&state.pool, query.search).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    params(
        ("id" = Uuid, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Get ingredient", body = ApiResponse<Ingredient>),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "Ingredients"
)]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Ingredient>>> {
    let resp = catalog_service::get_ingredient(&state.pool, id).await?;
    Ok(Json(resp))
}
