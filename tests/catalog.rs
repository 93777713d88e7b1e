mod common;

use common::{admin, create_product, create_user, customer, place_order, setup, stock};
use flower_shop_api::{
    dto::products::{
        BulkDeleteRequest, CreateProductRequest, InventoryAdjustRequest, UpdateProductRequest,
    },
    error::AppError,
    models::Role,
    routes::params::{LowStockQuery, ProductQuery, ProductSortBy, SortOrder},
    services::{admin_service, product_service},
};

#[tokio::test]
async fn admin_manages_products() -> anyhow::Result<()> {
    let state = setup().await?;
    let boss = admin(create_user(&state, "Ada", Role::Admin).await?);

    let created = product_service::create_product(
        &state,
        &boss,
        CreateProductRequest {
            name: "  Lavender Pot ".into(),
            description: Some("Fragrant".into()),
            price: 1_500,
            stock: 12,
            category: "plants".into(),
            images: vec!["/img/lavender.jpg".into()],
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(created.name, "Lavender Pot");
    assert_eq!(created.images, vec!["/img/lavender.jpg".to_string()]);

    let updated = product_service::update_product(
        &state,
        &boss,
        created.id,
        UpdateProductRequest {
            price: Some(1_800),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(updated.price, 1_800);
    assert_eq!(updated.stock, 12);

    let err = product_service::update_product(
        &state,
        &boss,
        created.id,
        UpdateProductRequest {
            price: Some(-1),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let shopper = customer(create_user(&state, "Rosa", Role::Customer).await?);
    let err = product_service::create_product(
        &state,
        &shopper,
        CreateProductRequest {
            name: "Weeds".into(),
            description: None,
            price: 1,
            stock: 1,
            category: "plants".into(),
            images: vec![],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

#[tokio::test]
async fn product_listing_filters_and_sorts() -> anyhow::Result<()> {
    let state = setup().await?;
    create_product(&state, "Red Roses", 4_500, 10).await?;
    create_product(&state, "White Roses", 5_000, 10).await?;
    create_product(&state, "Tulips", 3_200, 10).await?;

    let resp = product_service::list_products(
        &state,
        ProductQuery {
            q: Some("Roses".into()),
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?;
    let names: Vec<String> = resp
        .data
        .expect("list")
        .items
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Red Roses".to_string(), "White Roses".to_string()]);
    assert_eq!(resp.meta.and_then(|m| m.total), Some(2));

    let resp = product_service::list_products(
        &state,
        ProductQuery {
            max_price: Some(4_000),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(resp.data.expect("list").items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn manual_adjustments_cannot_go_negative() -> anyhow::Result<()> {
    let state = setup().await?;
    let boss = admin(create_user(&state, "Ada", Role::Admin).await?);
    let roses = create_product(&state, "Roses", 4_500, 3).await?;

    let restocked = admin_service::adjust_inventory(
        &state,
        &boss,
        roses,
        InventoryAdjustRequest { delta: 7 },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(restocked.stock, 10);

    let err = admin_service::adjust_inventory(
        &state,
        &boss,
        roses,
        InventoryAdjustRequest { delta: -11 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(stock(&state, roses).await?, 10);

    admin_service::adjust_inventory(&state, &boss, roses, InventoryAdjustRequest { delta: -10 })
        .await?;
    assert_eq!(stock(&state, roses).await?, 0);

    let err = admin_service::adjust_inventory(
        &state,
        &boss,
        uuid::Uuid::new_v4(),
        InventoryAdjustRequest { delta: 1 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::ProductNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn low_stock_lists_products_at_or_below_threshold() -> anyhow::Result<()> {
    let state = setup().await?;
    let boss = admin(create_user(&state, "Ada", Role::Admin).await?);
    create_product(&state, "Roses", 4_500, 2).await?;
    create_product(&state, "Tulips", 3_200, 5).await?;
    create_product(&state, "Orchid", 3_900, 30).await?;

    let resp = admin_service::list_low_stock(&state, &boss, LowStockQuery::default()).await?;
    let names: Vec<String> = resp
        .data
        .expect("list")
        .items
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Roses".to_string(), "Tulips".to_string()]);
    Ok(())
}

#[tokio::test]
async fn bulk_delete_keeps_products_on_orders() -> anyhow::Result<()> {
    let state = setup().await?;
    let boss = admin(create_user(&state, "Ada", Role::Admin).await?);
    let user = create_user(&state, "Rosa", Role::Customer).await?;
    let roses = create_product(&state, "Roses", 4_500, 10).await?;
    let tulips = create_product(&state, "Tulips", 3_200, 10).await?;
    let orchid = create_product(&state, "Orchid", 3_900, 10).await?;
    place_order(&state, user, &[(roses, 1)]).await?;

    let err = product_service::bulk_delete(
        &state,
        &boss,
        BulkDeleteRequest {
            ids: vec![roses, tulips],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(stock(&state, tulips).await?, 10);

    let deleted = product_service::bulk_delete(
        &state,
        &boss,
        BulkDeleteRequest {
            ids: vec![tulips, orchid],
        },
    )
    .await?
    .data
    .expect("result");
    assert_eq!(deleted.deleted, 2);

    let err = product_service::get_product(&state, tulips).await.unwrap_err();
    assert!(matches!(err, AppError::ProductNotFound(_)));
    Ok(())
}
