#![allow(dead_code)]

use chrono::Utc;
use flower_shop_api::{
    db::{connect, run_migrations},
    dto::orders::{NewOrderItem, NewOrderRequest},
    entity::{
        Products,
        products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    models::{OrderStatus, Role, ShippingInfo},
    services::{lifecycle, order_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use secrecy::SecretString;
use uuid::Uuid;

/// Fresh in-memory database with the schema applied. One connection keeps the
/// database alive and serializes transactions.
pub async fn setup() -> anyhow::Result<AppState> {
    let orm = connect("sqlite::memory:", 1).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, SecretString::from("test-secret")))
}

pub async fn create_user(state: &AppState, name: &str, role: Role) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    UserActive {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(format!("{}@example.com", id.simple())),
        role: Set(role.as_str().to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    ProductActive {
        id: Set(id),
        name: Set(name.to_string()),
        description: Set(None),
        price: Set(price),
        stock: Set(stock),
        category: Set("bouquets".to_string()),
        images: Set(serde_json::json!([format!("/img/{}.jpg", id.simple())])),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

pub fn customer(user_id: Uuid) -> AuthUser {
    AuthUser {
        user_id,
        role: Role::Customer,
    }
}

pub fn admin(user_id: Uuid) -> AuthUser {
    AuthUser {
        user_id,
        role: Role::Admin,
    }
}

pub fn shipping() -> ShippingInfo {
    ShippingInfo {
        address: "12 Garden Lane".to_string(),
        city: "Springfield".to_string(),
        phone: "555-0100".to_string(),
        postal_code: "12345".to_string(),
        country: "US".to_string(),
    }
}

/// Place an order as `user_id` and return its id.
pub async fn place_order(
    state: &AppState,
    user_id: Uuid,
    lines: &[(Uuid, i32)],
) -> anyhow::Result<Uuid> {
    let payload = NewOrderRequest {
        items: lines
            .iter()
            .map(|&(product_id, quantity)| NewOrderItem {
                product_id,
                quantity,
            })
            .collect(),
        shipping_info: shipping(),
        payment_info: None,
        tax_price: 0,
        shipping_price: 0,
    };
    let resp = order_service::create_order(state, &customer(user_id), payload).await?;
    let data = resp.data.ok_or_else(|| anyhow::anyhow!("missing order"))?;
    Ok(data.order.id)
}

/// Walk an order forward to `target` one step at a time.
pub async fn advance_to(
    state: &AppState,
    order_id: Uuid,
    target: OrderStatus,
) -> anyhow::Result<()> {
    for next in [OrderStatus::Shipped, OrderStatus::Delivered] {
        if next > target {
            break;
        }
        lifecycle::update_status(state, None, order_id, next).await?;
    }
    Ok(())
}

pub async fn stock(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?;
    Ok(product.stock)
}

/// Lets tests delete rows that other rows still reference.
pub async fn disable_foreign_keys(state: &AppState) -> anyhow::Result<()> {
    state
        .orm
        .execute_unprepared("PRAGMA foreign_keys = OFF")
        .await?;
    Ok(())
}
