use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        recipes::{
            IngredientAmount, RecipeIngredientDto, RecipeList, RecipeMinified, RecipeResponse,
            RecipeWriteRequest,
        },
        users::{SubscriptionList, SubscriptionUser, UserList, UserResponse},
    },
    models::{Ingredient, Tag},
    response::{ApiResponse, Meta},
    routes::{auth, health, ingredients, params, recipes, tags, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        users::list_users,
        users::me,
        users::subscriptions,
        users::get_user,
        users::subscribe,
        users::unsubscribe,
        recipes::list_recipes,
        recipes::get_recipe,
        recipes::create_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::add_favorite,
        recipes::remove_favorite,
        recipes::add_to_cart,
        recipes::remove_from_cart,
        recipes::download_shopping_cart,
        tags::list_tags,
        tags::get_tag,
        ingredients::list_ingredients,
        ingredients::get_ingredient
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UserResponse,
            UserList,
            SubscriptionUser,
            SubscriptionList,
            Tag,
            Ingredient,
            IngredientAmount,
            RecipeWriteRequest,
            RecipeIngredientDto,
            RecipeResponse,
            RecipeMinified,
            RecipeList,
            params::Pagination,
            params::RecipeQuery,
            params::SubscriptionQuery,
            params::IngredientQuery,
            Meta,
            ApiResponse<RecipeResponse>,
            ApiResponse<RecipeList>,
            ApiResponse<UserResponse>,
            ApiResponse<SubscriptionList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "User profiles and subscriptions"),
        (name = "Recipes", description = "Recipes, favorites and shopping cart"),
        (name = "Tags", description = "Read-only tag catalog"),
        (name = "Ingredients", description = "Read-only ingredient catalog"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
