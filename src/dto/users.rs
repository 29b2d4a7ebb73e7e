use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::recipes::RecipeMinified, models::User};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserResponse {
    pub fn from_user(user: &User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<UserResponse>,
}

/// A followed author together with a capped preview of their recipes.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionUser {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<RecipeMinified>,
    pub recipes_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionList {
    pub items: Vec<SubscriptionUser>,
}
