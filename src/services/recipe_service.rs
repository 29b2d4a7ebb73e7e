use std::collections::{HashMap, HashSet};

use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::{
        recipes::{
            IngredientAmount, RecipeIngredientDto, RecipeList, RecipeResponse, RecipeWriteRequest,
        },
        users::UserResponse,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Recipe, Tag, User},
    response::{ApiResponse, Meta},
    routes::params::RecipeQuery,
    validators::validate_recipe_payload,
};

#[derive(FromRow)]
struct TagRow {
    recipe_id: Uuid,
    id: Uuid,
    name: String,
    color: String,
    slug: String,
}

#[derive(FromRow)]
struct IngredientRow {
    recipe_id: Uuid,
    id: Uuid,
    name: String,
    measurement_unit: String,
    amount: i32,
}

async fn fetch_recipe(pool: &DbPool, id: Uuid) -> AppResult<Recipe> {
    sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)
}

/// Assemble full recipe payloads for a page of rows with a fixed number of
/// batched queries instead of one round-trip per recipe.
async fn build_responses(
    pool: &DbPool,
    recipes: Vec<Recipe>,
    viewer: Option<Uuid>,
) -> AppResult<Vec<RecipeResponse>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let author_ids: Vec<Uuid> = recipes
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let tag_rows = sqlx::query_as::<_, TagRow>(
        r#"
        SELECT rt.recipe_id, t.id, t.name, t.color, t.slug
        FROM recipe_tags rt
        JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY t.name
        "#,
    )
    .bind(&recipe_ids)
    .fetch_all(pool)
    .await?;

    let ingredient_rows = sqlx::query_as::<_, IngredientRow>(
        r#"
        SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY i.name
        "#,
    )
    .bind(&recipe_ids)
    .fetch_all(pool)
    .await?;

    let authors = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
        .bind(&author_ids)
        .fetch_all(pool)
        .await?;

    let mut favorited: HashSet<Uuid> = HashSet::new();
    let mut in_cart: HashSet<Uuid> = HashSet::new();
    let mut followed: HashSet<Uuid> = HashSet::new();
    if let Some(viewer) = viewer {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT recipe_id FROM favorites WHERE user_id = $1 AND recipe_id = ANY($2)")
                .bind(viewer)
                .bind(&recipe_ids)
                .fetch_all(pool)
                .await?;
        favorited.extend(rows.into_iter().map(|(id,)| id));

        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT recipe_id FROM shopping_carts WHERE user_id = $1 AND recipe_id = ANY($2)",
        )
        .bind(viewer)
        .bind(&recipe_ids)
        .fetch_all(pool)
        .await?;
        in_cart.extend(rows.into_iter().map(|(id,)| id));

        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT following_id FROM subscriptions WHERE user_id = $1 AND following_id = ANY($2)",
        )
        .bind(viewer)
        .bind(&author_ids)
        .fetch_all(pool)
        .await?;
        followed.extend(rows.into_iter().map(|(id,)| id));
    }

    let mut tags_by_recipe: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for row in tag_rows {
        tags_by_recipe.entry(row.recipe_id).or_default().push(Tag {
            id: row.id,
            name: row.name,
            color: row.color,
            slug: row.slug,
        });
    }

    let mut ingredients_by_recipe: HashMap<Uuid, Vec<RecipeIngredientDto>> = HashMap::new();
    for row in ingredient_rows {
        ingredients_by_recipe
            .entry(row.recipe_id)
            .or_default()
            .push(RecipeIngredientDto {
                id: row.id,
                name: row.name,
                measurement_unit: row.measurement_unit,
                amount: row.amount,
            });
    }

    let authors_by_id: HashMap<Uuid, User> =
        authors.into_iter().map(|u| (u.id, u)).collect();

    let mut responses = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let author = authors_by_id
            .get(&recipe.author_id)
            .ok_or(AppError::NotFound)?;
        responses.push(RecipeResponse {
            id: recipe.id,
            tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
            author: UserResponse::from_user(author, followed.contains(&author.id)),
            ingredients: ingredients_by_recipe
                .remove(&recipe.id)
                .unwrap_or_default(),
            is_favorited: favorited.contains(&recipe.id),
            is_in_shopping_cart: in_cart.contains(&recipe.id),
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        });
    }

    Ok(responses)
}

pub async fn list_recipes(
    pool: &DbPool,
    viewer: Option<Uuid>,
    query: RecipeQuery,
    default_limit: i64,
) -> AppResult<ApiResponse<RecipeList>> {
    let (page, limit, offset) = query.pagination().normalize(default_limit);
    let tag_slugs: Vec<String> = query
        .tags
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    // Personalized filters are a no-op for anonymous callers.
    let favorited_by = viewer.filter(|_| query.is_favorited.unwrap_or(0) == 1);
    let in_cart_of = viewer.filter(|_| query.is_in_shopping_cart.unwrap_or(0) == 1);

    let filter_sql = r#"
        FROM recipes r
        WHERE ($1::uuid IS NULL OR r.author_id = $1)
          AND (cardinality($2::text[]) = 0 OR EXISTS (
                SELECT 1 FROM recipe_tags rt
                JOIN tags t ON t.id = rt.tag_id
                WHERE rt.recipe_id = r.id AND t.slug = ANY($2)))
          AND ($3::uuid IS NULL OR EXISTS (
                SELECT 1 FROM favorites f
                WHERE f.user_id = $3 AND f.recipe_id = r.id))
          AND ($4::uuid IS NULL OR EXISTS (
                SELECT 1 FROM shopping_carts sc
                WHERE sc.user_id = $4 AND sc.recipe_id = r.id))
    "#;

    let recipes = sqlx::query_as::<_, Recipe>(&format!(
        "SELECT r.* {filter_sql} ORDER BY r.pub_date DESC LIMIT $5 OFFSET $6"
    ))
    .bind(query.author)
    .bind(&tag_slugs)
    .bind(favorited_by)
    .bind(in_cart_of)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {filter_sql}"))
        .bind(query.author)
        .bind(&tag_slugs)
        .bind(favorited_by)
        .bind(in_cart_of)
        .fetch_one(pool)
        .await?;

    let items = build_responses(pool, recipes, viewer).await?;
    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", RecipeList { items }, Some(meta)))
}

pub async fn get_recipe(
    pool: &DbPool,
    viewer: Option<Uuid>,
    id: Uuid,
) -> AppResult<ApiResponse<RecipeResponse>> {
    let recipe = fetch_recipe(pool, id).await?;
    let mut responses = build_responses(pool, vec![recipe], viewer).await?;
    let response = responses.pop().ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", response, None))
}

/// Reject ids that do not reference existing rows before opening the
/// transaction, so every failure leaves the store untouched.
async fn check_referenced_ids(pool: &DbPool, payload: &RecipeWriteRequest) -> AppResult<()> {
    let tag_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
        .bind(&payload.tags)
        .fetch_one(pool)
        .await?;
    if tag_count.0 != payload.tags.len() as i64 {
        return Err(AppError::validation("tags", "Unknown tag id"));
    }

    let ingredient_ids: Vec<Uuid> = payload.ingredients.iter().map(|i| i.id).collect();
    let ingredient_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
            .bind(&ingredient_ids)
            .fetch_one(pool)
            .await?;
    if ingredient_count.0 != payload.ingredients.len() as i64 {
        return Err(AppError::validation("ingredients", "Unknown ingredient id"));
    }

    Ok(())
}

async fn replace_associations(
    txn: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    recipe_id: Uuid,
    tags: &[Uuid],
    ingredients: &[IngredientAmount],
) -> AppResult<()> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **txn)
        .await?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **txn)
        .await?;

    sqlx::query(
        "INSERT INTO recipe_tags (recipe_id, tag_id) SELECT $1, tag_id FROM UNNEST($2::uuid[]) AS t(tag_id)",
    )
    .bind(recipe_id)
    .bind(tags)
    .execute(&mut **txn)
    .await?;

    let ingredient_ids: Vec<Uuid> = ingredients.iter().map(|i| i.id).collect();
    let amounts: Vec<i32> = ingredients.iter().map(|i| i.amount).collect();
    sqlx::query(
        r#"
        INSERT INTO recipe_ingredients (id, recipe_id, ingredient_id, amount)
        SELECT gen_random_uuid(), $1, t.ingredient_id, t.amount
        FROM UNNEST($2::uuid[], $3::int[]) AS t(ingredient_id, amount)
        "#,
    )
    .bind(recipe_id)
    .bind(&ingredient_ids)
    .bind(&amounts)
    .execute(&mut **txn)
    .await?;

    Ok(())
}

pub async fn create_recipe(
    pool: &DbPool,
    user: &AuthUser,
    payload: RecipeWriteRequest,
) -> AppResult<ApiResponse<RecipeResponse>> {
    validate_recipe_payload(payload.cooking_time, &payload.tags, &payload.ingredients)?;
    check_referenced_ids(pool, &payload).await?;

    let id = Uuid::new_v4();
    let mut txn = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO recipes (id, author_id, name, text, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(user.user_id)
    .bind(payload.name.as_str())
    .bind(payload.text.as_str())
    .bind(payload.image.as_str())
    .bind(payload.cooking_time)
    .execute(&mut *txn)
    .await?;

    replace_associations(&mut txn, id, &payload.tags, &payload.ingredients).await?;
    txn.commit().await?;

    tracing::info!(recipe_id = %id, author_id = %user.user_id, "recipe created");
    get_recipe(pool, Some(user.user_id), id).await
}

pub async fn update_recipe(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: RecipeWriteRequest,
) -> AppResult<ApiResponse<RecipeResponse>> {
    let recipe = fetch_recipe(pool, id).await?;
    if recipe.author_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    validate_recipe_payload(payload.cooking_time, &payload.tags, &payload.ingredients)?;
    check_referenced_ids(pool, &payload).await?;

    let mut txn = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE recipes
        SET name = $2, text = $3, image = $4, cooking_time = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(payload.name.as_str())
    .bind(payload.text.as_str())
    .bind(payload.image.as_str())
    .bind(payload.cooking_time)
    .execute(&mut *txn)
    .await?;

    replace_associations(&mut txn, id, &payload.tags, &payload.ingredients).await?;
    txn.commit().await?;

    get_recipe(pool, Some(user.user_id), id).await
}

pub async fn delete_recipe(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let recipe = fetch_recipe(pool, id).await?;
    if recipe.author_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    tracing::info!(recipe_id = %id, "recipe deleted");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
