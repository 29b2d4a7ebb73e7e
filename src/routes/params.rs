use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self, default_limit: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, 100);
        let offset = (page - 1) * limit;
        (page, limit, offset)
    }
}

// page/limit are inlined rather than flattened: serde_urlencoded cannot
// deserialize numeric fields behind #[serde(flatten)].
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipeQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub author: Option<Uuid>,
    /// Comma-separated tag slugs.
    pub tags: Option<String>,
    pub is_favorited: Option<u8>,
    pub is_in_shopping_cart: Option<u8>,
}

impl RecipeQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscriptionQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub recipes_limit: Option<i64>,
}

impl SubscriptionQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngredientQuery {
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::Uri};

    #[test]
    fn pagination_defaults_to_first_page() {
        let pagination = Pagination::default();
        assert_eq!(pagination.normalize(6), (1, 6, 0));
    }

    #[test]
    fn pagination_clamps_limit_and_page() {
        let pagination = Pagination {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(pagination.normalize(6), (1, 100, 0));
    }

    #[test]
    fn pagination_computes_offset() {
        let pagination = Pagination {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(pagination.normalize(6), (3, 10, 20));
    }

    #[test]
    fn pagination_parses_from_uri() {
        let uri: Uri = "/api/users?page=2&limit=5".parse().unwrap();
        let Query(pagination) = Query::<Pagination>::try_from_uri(&uri).unwrap();
        assert_eq!(pagination.normalize(6), (2, 5, 5));
    }

    #[test]
    fn recipe_query_parses_page_and_limit_from_uri() {
        let uri: Uri =
            "/api/recipes?page=2&limit=10&tags=dinner,lunch&is_favorited=1".parse().unwrap();
        let Query(query) = Query::<RecipeQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.pagination().normalize(6), (2, 10, 10));
        assert_eq!(query.tags.as_deref(), Some("dinner,lunch"));
        assert_eq!(query.is_favorited, Some(1));
    }

    #[test]
    fn recipe_query_parses_without_pagination() {
        let uri: Uri = "/api/recipes?is_in_shopping_cart=1".parse().unwrap();
        let Query(query) = Query::<RecipeQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.pagination().normalize(6), (1, 6, 0));
        assert_eq!(query.is_in_shopping_cart, Some(1));
    }

    #[test]
    fn subscription_query_parses_from_uri() {
        let uri: Uri = "/api/users/subscriptions?page=3&limit=2&recipes_limit=1"
            .parse()
            .unwrap();
        let Query(query) = Query::<SubscriptionQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.pagination().normalize(6), (3, 2, 4));
        assert_eq!(query.recipes_limit, Some(1));
    }
}
