use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::recipes::RecipeMinified,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
};

/// The favorites and shopping-cart relations share one shape: a unique
/// (user, recipe) pair with no payload. Parameterizing over the table keeps
/// the two concepts independent instead of coupling them through a base type.
pub trait UserRecipeLink {
    /// Table name; must be a compile-time constant, it is spliced into SQL.
    const TABLE: &'static str;
    const DUPLICATE_MSG: &'static str;
    const MISSING_MSG: &'static str;
}

pub struct Favorite;

impl UserRecipeLink for Favorite {
    const TABLE: &'static str = "favorites";
    const DUPLICATE_MSG: &'static str = "Already in favorites";
    const MISSING_MSG: &'static str = "Not in favorites";
}

pub struct ShoppingCart;

impl UserRecipeLink for ShoppingCart {
    const TABLE: &'static str = "shopping_carts";
    const DUPLICATE_MSG: &'static str = "Already in shopping cart";
    const MISSING_MSG: &'static str = "Not in shopping cart";
}

async fn fetch_recipe_minified(pool: &DbPool, recipe_id: Uuid) -> AppResult<RecipeMinified> {
    sqlx::query_as::<_, RecipeMinified>(
        "SELECT id, name, image, cooking_time FROM recipes WHERE id = $1",
    )
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)
}

pub async fn add_link<L: UserRecipeLink>(
    pool: &DbPool,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<RecipeMinified>> {
    let recipe = fetch_recipe_minified(pool, recipe_id).await?;

    let existing: Option<(Uuid,)> = sqlx::query_as(&format!(
        "SELECT id FROM {} WHERE user_id = $1 AND recipe_id = $2",
        L::TABLE
    ))
    .bind(user.user_id)
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?;

    if existing.is_some() {
        return Err(AppError::validation("recipe", L::DUPLICATE_MSG));
    }

    // The unique constraint still catches a concurrent duplicate here.
    sqlx::query(&format!(
        "INSERT INTO {} (id, user_id, recipe_id) VALUES ($1, $2, $3)",
        L::TABLE
    ))
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    Ok(ApiResponse::success("Added", recipe, Some(Meta::empty())))
}

pub async fn remove_link<L: UserRecipeLink>(
    pool: &DbPool,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    fetch_recipe_minified(pool, recipe_id).await?;

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        L::TABLE
    ))
    .bind(user.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::validation("recipe", L::MISSING_MSG));
    }

    Ok(ApiResponse::success(
        "Removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
