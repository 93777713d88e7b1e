use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use secrecy::ExposeSecret;
use uuid::Uuid;

use flower_shop_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    middleware::auth::Claims,
    models::Role,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "Shop Admin", "admin@example.com", Role::Admin).await?;
    let user_id = ensure_user(&orm, "Rosa Customer", "user@example.com", Role::Customer).await?;
    seed_products(&orm).await?;

    let key = EncodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes());
    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    println!("Admin token: {}", token(&key, admin_id, Role::Admin)?);
    println!("User token: {}", token(&key, user_id, Role::Customer)?);
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    name: &str,
    email: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        role: Set(role.as_str().to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    Ok(user.id)
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let products = [
        ("Red Rose Bouquet", "Twelve long-stem red roses", 4_500, 40, "bouquets"),
        ("Sunflower Bundle", "Five sunflowers wrapped in kraft paper", 2_800, 60, "bouquets"),
        ("White Orchid", "Phalaenopsis in a ceramic pot", 3_900, 15, "plants"),
        ("Tulip Mix", "Twenty tulips in seasonal colours", 3_200, 4, "bouquets"),
        ("Succulent Trio", "Three succulents for the windowsill", 1_900, 80, "plants"),
    ];

    for (name, description, price, stock, category) in products {
        let exists = Products::find()
            .filter(ProdCol::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            price: Set(price),
            stock: Set(stock),
            category: Set(category.to_string()),
            images: Set(serde_json::json!([])),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

fn token(key: &EncodingKey, user_id: Uuid, role: Role) -> anyhow::Result<String> {
    let exp = Utc::now() + chrono::TimeDelta::days(30);
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: usize::try_from(exp.timestamp())?,
    };
    Ok(encode(&Header::default(), &claims, key)?)
}
