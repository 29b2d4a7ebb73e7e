use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::{
        recipes::RecipeMinified,
        users::{SubscriptionList, SubscriptionUser, UserList, UserResponse},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, SubscriptionQuery},
    validators::validate_subscription,
};

async fn fetch_user(pool: &DbPool, id: Uuid) -> AppResult<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)
}

async fn is_subscribed(pool: &DbPool, viewer: Option<Uuid>, author: Uuid) -> AppResult<bool> {
    let Some(viewer) = viewer else {
        return Ok(false);
    };
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM subscriptions WHERE user_id = $1 AND following_id = $2")
            .bind(viewer)
            .bind(author)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

pub async fn list_users(
    pool: &DbPool,
    viewer: Option<Uuid>,
    pagination: Pagination,
    default_limit: i64,
) -> AppResult<ApiResponse<UserList>> {
    let (page, limit, offset) = pagination.normalize(default_limit);
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users ORDER BY username LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    // One batched lookup for the whole page instead of a query per row.
    let mut followed: HashSet<Uuid> = HashSet::new();
    if let Some(viewer) = viewer {
        let user_ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT following_id FROM subscriptions WHERE user_id = $1 AND following_id = ANY($2)",
        )
        .bind(viewer)
        .bind(&user_ids)
        .fetch_all(pool)
        .await?;
        followed.extend(rows.into_iter().map(|(id,)| id));
    }

    let items = users
        .iter()
        .map(|user| UserResponse::from_user(user, followed.contains(&user.id)))
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", UserList { items }, Some(meta)))
}

pub async fn get_user(
    pool: &DbPool,
    viewer: Option<Uuid>,
    id: Uuid,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = fetch_user(pool, id).await?;
    let subscribed = is_subscribed(pool, viewer, user.id).await?;
    Ok(ApiResponse::success(
        "OK",
        UserResponse::from_user(&user, subscribed),
        None,
    ))
}

pub async fn get_me(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<UserResponse>> {
    let me = fetch_user(pool, user.user_id).await?;
    Ok(ApiResponse::success(
        "OK",
        UserResponse::from_user(&me, false),
        None,
    ))
}

async fn subscription_user(
    pool: &DbPool,
    author: &User,
    recipes_limit: Option<i64>,
) -> AppResult<SubscriptionUser> {
    let mut query = String::from(
        "SELECT id, name, image, cooking_time FROM recipes WHERE author_id = $1 ORDER BY pub_date DESC",
    );
    if recipes_limit.is_some() {
        query.push_str(" LIMIT $2");
    }
    let mut recipes = sqlx::query_as::<_, RecipeMinified>(&query).bind(author.id);
    if let Some(limit) = recipes_limit {
        recipes = recipes.bind(limit.max(0));
    }
    let recipes = recipes.fetch_all(pool).await?;

    let recipes_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author.id)
            .fetch_one(pool)
            .await?;

    Ok(SubscriptionUser {
        user: UserResponse::from_user(author, true),
        recipes,
        recipes_count: recipes_count.0,
    })
}

pub async fn list_subscriptions(
    pool: &DbPool,
    user: &AuthUser,
    query: SubscriptionQuery,
    default_limit: i64,
) -> AppResult<ApiResponse<SubscriptionList>> {
    let (page, limit, offset) = query.pagination().normalize(default_limit);
    let authors = sqlx::query_as::<_, User>(
        r#"
        SELECT u.*
        FROM subscriptions s
        JOIN users u ON u.id = s.following_id
        WHERE s.user_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let mut items = Vec::with_capacity(authors.len());
    for author in &authors {
        items.push(subscription_user(pool, author, query.recipes_limit).await?);
    }

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "OK",
        SubscriptionList { items },
        Some(meta),
    ))
}

pub async fn subscribe(
    pool: &DbPool,
    user: &AuthUser,
    following_id: Uuid,
    recipes_limit: Option<i64>,
) -> AppResult<ApiResponse<SubscriptionUser>> {
    let following = fetch_user(pool, following_id).await?;

    validate_subscription(user.user_id, following_id)?;

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM subscriptions WHERE user_id = $1 AND following_id = $2")
            .bind(user.user_id)
            .bind(following_id)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::validation("following", "Already following"));
    }

    // The unique constraint still catches a concurrent duplicate here.
    sqlx::query("INSERT INTO subscriptions (id, user_id, following_id) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(following_id)
        .execute(pool)
        .await?;

    let data = subscription_user(pool, &following, recipes_limit).await?;
    Ok(ApiResponse::success("Subscribed", data, Some(Meta::empty())))
}

pub async fn unsubscribe(
    pool: &DbPool,
    user: &AuthUser,
    following_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    fetch_user(pool, following_id).await?;

    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND following_id = $2")
        .bind(user.user_id)
        .bind(following_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::validation("following", "Not following"));
    }

    Ok(ApiResponse::success(
        "Unsubscribed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
