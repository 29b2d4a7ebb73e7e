use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    dto::recipes::IngredientAmount,
    error::{AppError, AppResult},
};

pub const COOKING_TIME_MIN: i32 = 1;
pub const COOKING_TIME_MAX: i32 = 1440;
pub const AMOUNT_MIN: i32 = 1;
pub const AMOUNT_MAX: i32 = 10000;

/// Pre-write checks for a recipe payload. Runs fully before anything is
/// persisted; storage constraints back these up under concurrency.
pub fn validate_recipe_payload(
    cooking_time: i32,
    tags: &[Uuid],
    ingredients: &[IngredientAmount],
) -> AppResult<()> {
    if ingredients.is_empty() {
        return Err(AppError::validation("ingredients", "List is empty"));
    }
    if tags.is_empty() {
        return Err(AppError::validation("tags", "List is empty"));
    }

    let unique_tags: HashSet<&Uuid> = tags.iter().collect();
    if unique_tags.len() != tags.len() {
        return Err(AppError::validation("tags", "Tags are not unique"));
    }

    let unique_ingredients: HashSet<&Uuid> = ingredients.iter().map(|item| &item.id).collect();
    if unique_ingredients.len() != ingredients.len() {
        return Err(AppError::validation("ingredients", "Duplicate ingredients"));
    }

    if !(COOKING_TIME_MIN..=COOKING_TIME_MAX).contains(&cooking_time) {
        return Err(AppError::validation(
            "cooking_time",
            format!("Must be between {COOKING_TIME_MIN} and {COOKING_TIME_MAX}"),
        ));
    }

    for item in ingredients {
        if !(AMOUNT_MIN..=AMOUNT_MAX).contains(&item.amount) {
            return Err(AppError::validation(
                "ingredients",
                format!("Amount must be between {AMOUNT_MIN} and {AMOUNT_MAX}"),
            ));
        }
    }

    Ok(())
}

/// Self-reference check for subscriptions. The duplicate-pair check needs the
/// store and lives in the user service.
pub fn validate_subscription(user_id: Uuid, following_id: Uuid) -> AppResult<()> {
    if user_id == following_id {
        return Err(AppError::validation(
            "following",
            "Cannot follow yourself",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(id: Uuid, amount: i32) -> IngredientAmount {
        IngredientAmount { id, amount }
    }

    fn field_of(err: AppError) -> &'static str {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_payload() {
        let tags = vec![Uuid::new_v4(), Uuid::new_v4()];
        let ingredients = vec![ingredient(Uuid::new_v4(), 10), ingredient(Uuid::new_v4(), 5)];
        assert!(validate_recipe_payload(30, &tags, &ingredients).is_ok());
    }

    #[test]
    fn rejects_empty_ingredients() {
        let tags = vec![Uuid::new_v4()];
        let err = validate_recipe_payload(30, &tags, &[]).unwrap_err();
        assert_eq!(field_of(err), "ingredients");
    }

    #[test]
    fn rejects_empty_tags() {
        let ingredients = vec![ingredient(Uuid::new_v4(), 10)];
        let err = validate_recipe_payload(30, &[], &ingredients).unwrap_err();
        assert_eq!(field_of(err), "tags");
    }

    #[test]
    fn rejects_duplicate_tags() {
        let tag = Uuid::new_v4();
        let ingredients = vec![ingredient(Uuid::new_v4(), 10)];
        let err = validate_recipe_payload(30, &[tag, tag], &ingredients).unwrap_err();
        assert_eq!(field_of(err), "tags");
    }

    #[test]
    fn rejects_duplicate_ingredients() {
        let tags = vec![Uuid::new_v4()];
        let id = Uuid::new_v4();
        let ingredients = vec![ingredient(id, 10), ingredient(id, 5)];
        let err = validate_recipe_payload(30, &tags, &ingredients).unwrap_err();
        assert_eq!(field_of(err), "ingredients");
    }

    #[test]
    fn rejects_cooking_time_out_of_bounds() {
        let tags = vec![Uuid::new_v4()];
        let ingredients = vec![ingredient(Uuid::new_v4(), 10)];
        assert!(validate_recipe_payload(0, &tags, &ingredients).is_err());
        assert!(validate_recipe_payload(1441, &tags, &ingredients).is_err());
        assert!(validate_recipe_payload(1440, &tags, &ingredients).is_ok());
    }

    #[test]
    fn rejects_amount_out_of_bounds() {
        let tags = vec![Uuid::new_v4()];
        let low = vec![ingredient(Uuid::new_v4(), 0)];
        let high = vec![ingredient(Uuid::new_v4(), 10001)];
        assert!(validate_recipe_payload(30, &tags, &low).is_err());
        assert!(validate_recipe_payload(30, &tags, &high).is_err());
    }

    #[test]
    fn rejects_self_subscription() {
        let id = Uuid::new_v4();
        let err = validate_subscription(id, id).unwrap_err();
        assert_eq!(field_of(err), "following");
    }

    #[test]
    fn allows_subscription_to_other_user() {
        assert!(validate_subscription(Uuid::new_v4(), Uuid::new_v4()).is_ok());
    }
}
