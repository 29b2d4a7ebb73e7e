use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::users::{SubscriptionList, SubscriptionUser, UserList, UserResponse},
    error::AppResult,
    middleware::auth::{AuthUser, OptionalAuthUser},
    response::ApiResponse,
    routes::params::{Pagination, SubscriptionQuery},
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(me))
        .route("/subscriptions", get(subscriptions))
        .route("/{id}", get(get_user))
        .route("/{id}/subscribe", post(subscribe).delete(unsubscribe))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List users", body = ApiResponse<UserList>)
    ),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = user_service::list_users(
        &state.pool,
        viewer.user_id(),
        pagination,
        state.config.page_size,
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let resp = user_service::get_me(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("limit" = Option<i64>, Query, description = "Items per page"),
        ("recipes_limit" = Option<i64>, Query, description = "Cap on embedded recipe previews")
    ),
    responses(
        (status = 200, description = "Followed authors", body = ApiResponse<SubscriptionList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn subscriptions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SubscriptionQuery>,
) -> AppResult<Json<ApiResponse<SubscriptionList>>> {
    let resp =
        user_service::list_subscriptions(&state.pool, &user, query, state.config.page_size)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Get user", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let resp = user_service::get_user(&state.pool, viewer.user_id(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    params(
        ("id" = Uuid, Path, description = "User ID to follow"),
        ("recipes_limit" = Option<i64>, Query, description = "Cap on embedded recipe previews")
    ),
    responses(
        (status = 200, description = "Subscribed", body = ApiResponse<SubscriptionUser>),
        (status = 400, description = "Self-subscription or already following"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<SubscriptionQuery>,
) -> AppResult<Json<ApiResponse<SubscriptionUser>>> {
    let resp = user_service::subscribe(&state.pool, &user, id, query.recipes_limit).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    params(
        ("id" = Uuid, Path, description = "User ID to unfollow")
    ),
    responses(
        (status = 200, description = "Unsubscribed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Not following"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::unsubscribe(&state.pool, &user, id).await?;
    Ok(Json(resp))
}
