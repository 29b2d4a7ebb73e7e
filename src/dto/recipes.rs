use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::users::UserResponse, models::Tag};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipeWriteRequest {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeIngredientDto {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientDto>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct RecipeMinified {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeList {
    pub items: Vec<RecipeResponse>,
}
