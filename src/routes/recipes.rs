use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::recipes::{RecipeList, RecipeMinified, RecipeResponse, RecipeWriteRequest},
    error::AppResult,
    middleware::auth::{AuthUser, OptionalAuthUser},
    response::ApiResponse,
    routes::params::RecipeQuery,
    services::{
        link_service::{self, Favorite, ShoppingCart},
        recipe_service, shopping_list,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route("/download_shopping_cart", get(download_shopping_cart))
        .route("/{id}", get(get_recipe).patch(update_recipe).delete(delete_recipe))
        .route("/{id}/favorite", post(add_favorite).delete(remove_favorite))
        .route(
            "/{id}/shopping_cart",
            post(add_to_cart).delete(remove_from_cart),
        )
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("author" = Option<Uuid>, Query, description = "Filter by author"),
        ("tags" = Option<String>, Query, description = "Comma-separated tag slugs"),
        ("is_favorited" = Option<u8>, Query, description = "1 = only favorited recipes"),
        ("is_in_shopping_cart" = Option<u8>, Query, description = "1 = only recipes in the cart")
    ),
    responses(
        (status = 200, description = "List recipes", body = ApiResponse<RecipeList>)
    ),
    tag = "Recipes"
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Query(query): Query<RecipeQuery>,
) -> AppResult<Json<ApiResponse<RecipeList>>> {
    let resp = recipe_service::list_recipes(
        &state.pool,
        viewer.user_id(),
        query,
        state.config.page_size,
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Get recipe", body = ApiResponse<RecipeResponse>),
        (status = 404, description = "Recipe not found")
    ),
    tag = "Recipes"
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RecipeResponse>>> {
    let resp = recipe_service::get_recipe(&state.pool, viewer.user_id(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = RecipeWriteRequest,
    responses(
        (status = 200, description = "Create recipe", body = ApiResponse<RecipeResponse>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn create_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RecipeWriteRequest>,
) -> AppResult<Json<ApiResponse<RecipeResponse>>> {
    let resp = recipe_service::create_recipe(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = RecipeWriteRequest,
    responses(
        (status = 200, description = "Update recipe", body = ApiResponse<RecipeResponse>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn update_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecipeWriteRequest>,
) -> AppResult<Json<ApiResponse<RecipeResponse>>> {
    let resp = recipe_service::update_recipe(&state.pool, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Delete recipe", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = recipe_service::delete_recipe(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Added to favorites", body = ApiResponse<RecipeMinified>),
        (status = 400, description = "Already in favorites"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RecipeMinified>>> {
    let resp = link_service::add_link::<Favorite>(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Removed from favorites", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Not in favorites"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = link_service::remove_link::<Favorite>(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Added to shopping cart", body = ApiResponse<RecipeMinified>),
        (status = 400, description = "Already in shopping cart"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RecipeMinified>>> {
    let resp = link_service::add_link::<ShoppingCart>(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Removed from shopping cart", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Not in shopping cart"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = link_service::remove_link::<ShoppingCart>(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    responses(
        (status = 200, description = "Plain-text shopping list attachment", content_type = "text/plain"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Response> {
    let totals = shopping_list::cart_totals(&state.pool, user.user_id).await?;
    let body = shopping_list::render_wishlist(&totals);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=wishlist.txt",
            ),
        ],
        body,
    )
        .into_response())
}
