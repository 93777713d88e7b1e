mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::{admin, create_product, create_user, customer, disable_foreign_keys, setup};
use flower_shop_api::{
    dto::sales::SalesWindow,
    entity::{
        Users, order_items::ActiveModel as OrderItemActive, orders::ActiveModel as OrderActive,
    },
    error::AppError,
    models::{OrderStatus, Role},
    services::{admin_service, sales_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

/// Insert an order with a fixed sale date and a single line.
async fn order(
    state: &AppState,
    user_id: Uuid,
    product: (Uuid, &str, i64),
    quantity: i32,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
) -> anyhow::Result<Uuid> {
    let (product_id, name, price) = product;
    let total = price * i64::from(quantity);
    let id = Uuid::new_v4();
    OrderActive {
        id: Set(id),
        user_id: Set(user_id),
        shipping_address: Set("12 Garden Lane".into()),
        shipping_city: Set("Springfield".into()),
        shipping_phone: Set("555-0100".into()),
        shipping_postal_code: Set("12345".into()),
        shipping_country: Set("US".into()),
        payment_id: Set(None),
        payment_status: Set(None),
        items_price: Set(total),
        tax_price: Set(0),
        shipping_price: Set(0),
        total_price: Set(total),
        status: Set(OrderStatus::Processing.as_str().to_string()),
        paid_at: Set(paid_at.map(Into::into)),
        delivered_at: Set(None),
        created_at: Set(created_at.into()),
        updated_at: Set(created_at.into()),
    }
    .insert(&state.orm)
    .await?;

    OrderItemActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(id),
        product_id: Set(product_id),
        name: Set(name.to_string()),
        quantity: Set(quantity),
        price: Set(price),
        image: Set(None),
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

struct Shop {
    state: AppState,
    alice: Uuid,
    bob: Uuid,
    roses: (Uuid, &'static str, i64),
    tulips: (Uuid, &'static str, i64),
}

async fn shop() -> anyhow::Result<Shop> {
    let state = setup().await?;
    let alice = create_user(&state, "Alice", Role::Customer).await?;
    let bob = create_user(&state, "Bob", Role::Customer).await?;
    let roses = (create_product(&state, "Roses", 1_000, 50).await?, "Roses", 1_000);
    let tulips = (create_product(&state, "Tulips", 250, 50).await?, "Tulips", 250);

    // Alice: 3000 in Sep 2025, 1000 in Jan 2026. Bob: 500 in Sep 2025, 250
    // created in Oct 2025 but never marked paid.
    order(&state, alice, roses, 3, Some(at(2025, 9, 3)), at(2025, 9, 1)).await?;
    order(&state, alice, roses, 1, Some(at(2026, 1, 10)), at(2026, 1, 10)).await?;
    order(&state, bob, tulips, 2, Some(at(2025, 9, 20)), at(2025, 9, 20)).await?;
    order(&state, bob, tulips, 1, None, at(2025, 10, 5)).await?;

    Ok(Shop {
        state,
        alice,
        bob,
        roses,
        tulips,
    })
}

#[tokio::test]
async fn totals_cover_every_order() -> anyhow::Result<()> {
    let shop = shop().await?;
    let all = SalesWindow::all_time();

    assert_eq!(sales_service::total_order_count(&shop.state.orm, &all).await?, 4);
    assert_eq!(
        sales_service::total_sales_amount(&shop.state.orm, &all).await?,
        4_750
    );
    Ok(())
}

#[tokio::test]
async fn customer_totals_sum_to_total_sales() -> anyhow::Result<()> {
    let shop = shop().await?;
    let all = SalesWindow::all_time();

    let rows = sales_service::sales_by_customer(&shop.state.orm, &all).await?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].user_id, shop.alice);
    assert_eq!(rows[0].total, 4_000);
    assert_eq!(rows[0].name.as_deref(), Some("Alice"));
    assert_eq!(rows[1].user_id, shop.bob);
    assert_eq!(rows[1].total, 750);

    let grand = sales_service::total_sales_amount(&shop.state.orm, &all).await?;
    assert_eq!(rows.iter().map(|r| r.total).sum::<i64>(), grand);
    Ok(())
}

#[tokio::test]
async fn deleted_customers_still_count() -> anyhow::Result<()> {
    let shop = shop().await?;
    disable_foreign_keys(&shop.state).await?;
    Users::delete_by_id(shop.bob).exec(&shop.state.orm).await?;

    let rows = sales_service::sales_by_customer(&shop.state.orm, &SalesWindow::all_time()).await?;
    let bob = rows
        .iter()
        .find(|row| row.user_id == shop.bob)
        .ok_or_else(|| anyhow::anyhow!("bob missing"))?;
    assert_eq!(bob.name, None);
    assert_eq!(bob.total, 750);
    assert_eq!(rows.iter().map(|r| r.total).sum::<i64>(), 4_750);
    Ok(())
}

#[tokio::test]
async fn monthly_totals_use_the_sale_date() -> anyhow::Result<()> {
    let shop = shop().await?;
    let months = sales_service::sales_by_month(&shop.state.orm, &SalesWindow::all_time()).await?;

    let rows: Vec<(i32, u32, &str, i64)> = months
        .iter()
        .map(|m| (m.year, m.month, m.label.as_str(), m.total))
        .collect();
    assert_eq!(
        rows,
        vec![
            (2025, 9, "Sep", 3_500),
            (2025, 10, "Oct", 250),
            (2026, 1, "Jan", 1_000),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn window_bounds_are_half_open() -> anyhow::Result<()> {
    let shop = shop().await?;
    let window = SalesWindow {
        from: Some(at(2025, 9, 20)),
        to: Some(at(2026, 1, 10)),
    };

    // Bob's paid Sep 20 order and his unpaid Oct order; Alice's Jan 10 order
    // falls on the exclusive bound.
    assert_eq!(sales_service::total_order_count(&shop.state.orm, &window).await?, 2);
    assert_eq!(
        sales_service::total_sales_amount(&shop.state.orm, &window).await?,
        750
    );
    let customers = sales_service::sales_by_customer(&shop.state.orm, &window).await?;
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].user_id, shop.bob);
    Ok(())
}

#[tokio::test]
async fn product_sales_rank_by_revenue() -> anyhow::Result<()> {
    let shop = shop().await?;
    let rows = sales_service::sales_by_product(&shop.state.orm, &SalesWindow::all_time()).await?;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].product_id, shop.roses.0);
    assert_eq!((rows[0].quantity, rows[0].revenue), (4, 4_000));
    assert_eq!(rows[1].product_id, shop.tulips.0);
    assert_eq!((rows[1].quantity, rows[1].revenue), (3, 750));
    Ok(())
}

#[tokio::test]
async fn empty_shop_reports_zero() -> anyhow::Result<()> {
    let state = setup().await?;
    let all = SalesWindow::all_time();
    assert_eq!(sales_service::total_order_count(&state.orm, &all).await?, 0);
    assert_eq!(sales_service::total_sales_amount(&state.orm, &all).await?, 0);
    assert!(sales_service::sales_by_customer(&state.orm, &all).await?.is_empty());
    assert!(sales_service::sales_by_month(&state.orm, &all).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn sales_endpoints_are_admin_only() -> anyhow::Result<()> {
    let shop = shop().await?;
    let err = admin_service::total_sales(&shop.state, &customer(shop.alice), SalesWindow::all_time())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let boss = create_user(&shop.state, "Boss", Role::Admin).await?;
    let resp =
        admin_service::total_sales(&shop.state, &admin(boss), SalesWindow::all_time()).await?;
    assert_eq!(resp.data.map(|d| d.total_sales), Some(4_750));
    Ok(())
}
