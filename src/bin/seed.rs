use foodgram_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool},
    entity::{ingredients, tags},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

const TAGS: &[(&str, &str, &str)] = &[
    ("Breakfast", "#E26C2D", "breakfast"),
    ("Lunch", "#49B64E", "lunch"),
    ("Dinner", "#8775D2", "dinner"),
];

const INGREDIENTS: &[(&str, &str)] = &[
    ("Salt", "g"),
    ("Sugar", "g"),
    ("Flour", "g"),
    ("Milk", "ml"),
    ("Eggs", "pcs"),
    ("Butter", "g"),
    ("Olive oil", "ml"),
    ("Onion", "pcs"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let orm = create_orm_conn(&config.database_url).await?;

    for (name, color, slug) in TAGS {
        let exists = tags::Entity::find()
            .filter(tags::Column::Name.eq(*name))
            .one(&orm)
            .await?;
        if exists.is_none() {
            tags::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set((*name).to_string()),
                color: Set((*color).to_string()),
                slug: Set((*slug).to_string()),
            }
            .insert(&orm)
            .await?;
        }
    }

    for (name, unit) in INGREDIENTS {
        let exists = ingredients::Entity::find()
            .filter(ingredients::Column::Name.eq(*name))
            .filter(ingredients::Column::MeasurementUnit.eq(*unit))
            .one(&orm)
            .await?;
        if exists.is_none() {
            ingredients::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set((*name).to_string()),
                measurement_unit: Set((*unit).to_string()),
            }
            .insert(&orm)
            .await?;
        }
    }

    println!("Seed completed");
    Ok(())
}
