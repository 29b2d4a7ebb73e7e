use foodgram_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::recipes::{IngredientAmount, RecipeWriteRequest},
    entity::{ingredients::ActiveModel as IngredientActive, tags::ActiveModel as TagActive,
        users::ActiveModel as UserActive},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{Pagination, RecipeQuery, SubscriptionQuery},
    services::{
        catalog_service,
        link_service::{self, Favorite, ShoppingCart},
        recipe_service, shopping_list, user_service,
    },
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

// Integration flow: recipes with tags and ingredients, favorites, cart
// aggregation, and subscriptions against a real Postgres.
#[tokio::test]
async fn recipe_cart_and_subscription_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    reset_tables(&state).await?;

    let author_id = create_user(&state, "author", "author@example.com").await?;
    let reader_id = create_user(&state, "reader", "reader@example.com").await?;
    let author = AuthUser { user_id: author_id };
    let reader = AuthUser { user_id: reader_id };

    let tag_id = create_tag(&state, "Dinner", "#8775D2", "dinner").await?;
    let salt_id = create_ingredient(&state, "Salt", "g").await?;
    let pepper_id = create_ingredient(&state, "Pepper", "g").await?;
    create_ingredient(&state, "100% Cocoa", "g").await?;
    create_ingredient(&state, "100g Chocolate", "pcs").await?;

    // Prefix search matches LIKE wildcards literally, not as patterns.
    let found = catalog_service::list_ingredients(&state.pool, Some("100%".into()))
        .await?
        .data
        .expect("ingredient list");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "100% Cocoa");

    let found = catalog_service::list_ingredients(&state.pool, Some("Pe".into()))
        .await?
        .data
        .expect("ingredient list");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Pepper");

    // Create two recipes sharing an ingredient.
    let recipe_a = recipe_service::create_recipe(
        &state.pool,
        &author,
        write_request("Soup", tag_id, vec![IngredientAmount { id: salt_id, amount: 10 }]),
    )
    .await?
    .data
    .expect("recipe data");

    let recipe_b = recipe_service::create_recipe(
        &state.pool,
        &author,
        write_request(
            "Stew",
            tag_id,
            vec![
                IngredientAmount { id: salt_id, amount: 5 },
                IngredientAmount { id: pepper_id, amount: 7 },
            ],
        ),
    )
    .await?
    .data
    .expect("recipe data");

    // Validation failures leave no partial state behind.
    let err = recipe_service::create_recipe(
        &state.pool,
        &author,
        write_request("Broken", tag_id, vec![]),
    )
    .await
    .unwrap_err();
    assert_validation(err, "ingredients");

    let err = recipe_service::create_recipe(
        &state.pool,
        &author,
        RecipeWriteRequest {
            name: "Broken".into(),
            text: "text".into(),
            image: "http://example.com/x.png".into(),
            cooking_time: 30,
            tags: vec![tag_id, tag_id],
            ingredients: vec![IngredientAmount { id: salt_id, amount: 1 }],
        },
    )
    .await
    .unwrap_err();
    assert_validation(err, "tags");

    let recipe_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes")
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(recipe_count.0, 2);

    // Favorites: duplicate add and double remove are both 400s.
    link_service::add_link::<Favorite>(&state.pool, &reader, recipe_a.id).await?;
    let err = link_service::add_link::<Favorite>(&state.pool, &reader, recipe_a.id)
        .await
        .unwrap_err();
    assert_validation(err, "recipe");

    link_service::remove_link::<Favorite>(&state.pool, &reader, recipe_a.id).await?;
    let err = link_service::remove_link::<Favorite>(&state.pool, &reader, recipe_a.id)
        .await
        .unwrap_err();
    assert_validation(err, "recipe");

    // Shopping cart aggregation groups by (name, unit) and sums amounts.
    link_service::add_link::<ShoppingCart>(&state.pool, &reader, recipe_a.id).await?;
    link_service::add_link::<ShoppingCart>(&state.pool, &reader, recipe_b.id).await?;

    let totals = shopping_list::cart_totals(&state.pool, reader_id).await?;
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].name, "Pepper");
    assert_eq!(totals[0].total, 7);
    assert_eq!(totals[1].name, "Salt");
    assert_eq!(totals[1].total, 15);

    let wishlist = shopping_list::render_wishlist(&totals);
    assert!(wishlist.contains("Salt: 15 g.\n"));
    assert!(wishlist.contains("Pepper: 7 g.\n"));

    // Empty cart: empty output, not an error.
    let empty = shopping_list::cart_totals(&state.pool, author_id).await?;
    assert!(empty.is_empty());
    assert_eq!(shopping_list::render_wishlist(&empty), "");

    // Subscriptions: no self-follow, no duplicates, removal is not idempotent.
    let err = user_service::subscribe(&state.pool, &reader, reader_id, None)
        .await
        .unwrap_err();
    assert_validation(err, "following");

    user_service::subscribe(&state.pool, &reader, author_id, Some(1)).await?;
    let err = user_service::subscribe(&state.pool, &reader, author_id, None)
        .await
        .unwrap_err();
    assert_validation(err, "following");

    // User listing flags followed authors for the viewer.
    let users_page = user_service::list_users(
        &state.pool,
        Some(reader_id),
        Pagination::default(),
        state.config.page_size,
    )
    .await?
    .data
    .expect("user list");
    let author_row = users_page
        .items
        .iter()
        .find(|u| u.id == author_id)
        .expect("author listed");
    assert!(author_row.is_subscribed);
    let reader_row = users_page
        .items
        .iter()
        .find(|u| u.id == reader_id)
        .expect("reader listed");
    assert!(!reader_row.is_subscribed);

    let subs = user_service::list_subscriptions(
        &state.pool,
        &reader,
        SubscriptionQuery {
            page: None,
            limit: None,
            recipes_limit: Some(1),
        },
        state.config.page_size,
    )
    .await?
    .data
    .expect("subscription data");
    assert_eq!(subs.items.len(), 1);
    assert_eq!(subs.items[0].recipes_count, 2);
    assert_eq!(subs.items[0].recipes.len(), 1);

    user_service::unsubscribe(&state.pool, &reader, author_id).await?;
    let err = user_service::unsubscribe(&state.pool, &reader, author_id)
        .await
        .unwrap_err();
    assert_validation(err, "following");

    // Update replaces the association rows atomically.
    let updated = recipe_service::update_recipe(
        &state.pool,
        &author,
        recipe_a.id,
        write_request(
            "Soup v2",
            tag_id,
            vec![IngredientAmount { id: pepper_id, amount: 3 }],
        ),
    )
    .await?
    .data
    .expect("recipe data");
    assert_eq!(updated.name, "Soup v2");
    assert_eq!(updated.ingredients.len(), 1);
    assert_eq!(updated.ingredients[0].name, "Pepper");

    // Only the author may mutate a recipe.
    let err = recipe_service::delete_recipe(&state.pool, &reader, recipe_a.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Filtered listing: recipes in the reader's cart.
    let listed = recipe_service::list_recipes(
        &state.pool,
        Some(reader_id),
        RecipeQuery {
            page: None,
            limit: None,
            author: None,
            tags: None,
            is_favorited: None,
            is_in_shopping_cart: Some(1),
        },
        state.config.page_size,
    )
    .await?
    .data
    .expect("recipe list");
    assert_eq!(listed.items.len(), 2);
    assert!(listed.items.iter().all(|r| r.is_in_shopping_cart));

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    Ok(AppState {
        pool,
        orm,
        config: AppConfig {
            database_url: database_url.to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            page_size: 6,
        },
    })
}

async fn reset_tables(state: &AppState) -> anyhow::Result<()> {
    sqlx::query(
        "TRUNCATE subscriptions, shopping_carts, favorites, recipe_ingredients, recipe_tags, recipes, ingredients, tags, users CASCADE",
    )
    .execute(&state.pool)
    .await?;
    Ok(())
}

async fn create_user(state: &AppState, username: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.into()),
        username: Set(username.into()),
        first_name: Set("Test".into()),
        last_name: Set("User".into()),
        password_hash: Set("not-a-real-hash".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}

async fn create_tag(state: &AppState, name: &str, color: &str, slug: &str) -> anyhow::Result<Uuid> {
    let tag = TagActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        color: Set(color.into()),
        slug: Set(slug.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(tag.id)
}

async fn create_ingredient(state: &AppState, name: &str, unit: &str) -> anyhow::Result<Uuid> {
    let ingredient = IngredientActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        measurement_unit: Set(unit.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(ingredient.id)
}

fn write_request(name: &str, tag_id: Uuid, ingredients: Vec<IngredientAmount>) -> RecipeWriteRequest {
    RecipeWriteRequest {
        name: name.into(),
        text: "Step by step.".into(),
        image: "http://example.com/image.png".into(),
        cooking_time: 30,
        tags: vec![tag_id],
        ingredients,
    }
}

fn assert_validation(err: AppError, expected_field: &str) {
    match err {
        AppError::Validation { field, .. } => assert_eq!(field, expected_field),
        other => panic!("expected validation error on {expected_field}, got {other:?}"),
    }
}
