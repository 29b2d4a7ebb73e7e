use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    models::{Ingredient, Tag},
    response::ApiResponse,
};

pub async fn list_tags(pool: &DbPool) -> AppResult<ApiResponse<Vec<Tag>>> {
    let tags = sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(ApiResponse::success("OK", tags, None))
}

pub async fn get_tag(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<Tag>> {
    let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", tag, None))
}

// LIKE wildcards in the search term must match literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Unpaginated; an optional `search` term prefix-matches ingredient names.
pub async fn list_ingredients(
    pool: &DbPool,
    search: Option<String>,
) -> AppResult<ApiResponse<Vec<Ingredient>>> {
    let prefix = escape_like(search.as_deref().unwrap_or_default());
    let ingredients = sqlx::query_as::<_, Ingredient>(
        "SELECT * FROM ingredients WHERE name ILIKE $1 || '%' ORDER BY name",
    )
    .bind(prefix)
    .fetch_all(pool)
    .await?;
    Ok(ApiResponse::success("OK", ingredients, None))
}

pub async fn get_ingredient(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<Ingredient>> {
    let ingredient = sqlx::query_as::<_, Ingredient>("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", ingredient, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_passes_plain_terms_through() {
        assert_eq!(escape_like("Salt"), "Salt");
    }

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("100% cocoa"), "100\\% cocoa");
        assert_eq!(escape_like("sea_salt"), "sea\\_salt");
    }

    #[test]
    fn escape_like_handles_backslash_first() {
        assert_eq!(escape_like("a\\%b"), "a\\\\\\%b");
    }
}
