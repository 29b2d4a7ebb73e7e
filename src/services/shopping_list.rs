use sqlx::FromRow;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct IngredientTotal {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Grouped sums over every recipe currently in the user's shopping cart.
/// Ordered by total ascending, ties broken by name, so the output is
/// deterministic. An empty cart yields an empty list.
pub async fn cart_totals(pool: &DbPool, user_id: Uuid) -> AppResult<Vec<IngredientTotal>> {
    let totals = sqlx::query_as::<_, IngredientTotal>(
        r#"
        SELECT i.name, i.measurement_unit, SUM(ri.amount)::BIGINT AS total
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        JOIN shopping_carts sc ON sc.recipe_id = ri.recipe_id
        WHERE sc.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY total ASC, i.name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(totals)
}

/// One line per ingredient: `<name>: <total> <unit>.` with a trailing newline.
pub fn render_wishlist(totals: &[IngredientTotal]) -> String {
    totals
        .iter()
        .map(|t| format!("{}: {} {}.\n", t.name, t.total, t.measurement_unit))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(name: &str, unit: &str, total: i64) -> IngredientTotal {
        IngredientTotal {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total,
        }
    }

    #[test]
    fn renders_one_line_per_ingredient() {
        let totals = vec![total("Salt", "g", 15), total("Milk", "ml", 200)];
        assert_eq!(render_wishlist(&totals), "Salt: 15 g.\nMilk: 200 ml.\n");
    }

    #[test]
    fn renders_single_row() {
        let totals = vec![total("Salt", "g", 15)];
        assert_eq!(render_wishlist(&totals), "Salt: 15 g.\n");
    }

    #[test]
    fn empty_cart_renders_empty_body() {
        assert_eq!(render_wishlist(&[]), "");
    }
}
