mod common;

use common::{admin, advance_to, create_product, create_user, customer, place_order, setup};
use flower_shop_api::{
    dto::reviews::{CreateReviewRequest, DeleteReviewQuery, UpdateReviewRequest},
    error::AppError,
    models::{OrderStatus, Role},
    routes::params::AdminProductQuery,
    services::{lifecycle, product_service, review_service},
};
use uuid::Uuid;

fn review(product_id: Uuid, rating: i32, comment: &str) -> CreateReviewRequest {
    CreateReviewRequest {
        product_id,
        rating,
        comment: comment.into(),
    }
}

#[tokio::test]
async fn only_delivered_purchases_may_be_reviewed() -> anyhow::Result<()> {
    let state = setup().await?;
    let rosa = create_user(&state, "Rosa", Role::Customer).await?;
    let shopper = customer(rosa);
    let roses = create_product(&state, "Roses", 4_500, 10).await?;
    let order_id = place_order(&state, rosa, &[(roses, 1)]).await?;

    let eligibility = review_service::check_eligibility(&state, &shopper, roses)
        .await?
        .data
        .expect("eligibility");
    assert!(!eligibility.eligible);

    advance_to(&state, order_id, OrderStatus::Shipped).await?;
    let err = review_service::create_review(&state, &shopper, review(roses, 5, "Lovely"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotEligibleToReview), "{err:?}");

    lifecycle::update_status(&state, None, order_id, OrderStatus::Delivered).await?;
    let eligibility = review_service::check_eligibility(&state, &shopper, roses)
        .await?
        .data
        .expect("eligibility");
    assert!(eligibility.eligible);
    assert!(!eligibility.has_reviewed);

    let created = review_service::create_review(&state, &shopper, review(roses, 5, " Lovely "))
        .await?
        .data
        .expect("review");
    assert_eq!(created.name, "Rosa");
    assert_eq!(created.comment, "Lovely");

    let eligibility = review_service::check_eligibility(&state, &shopper, roses)
        .await?
        .data
        .expect("eligibility");
    assert!(eligibility.has_reviewed);
    Ok(())
}

#[tokio::test]
async fn one_review_per_customer_and_product() -> anyhow::Result<()> {
    let state = setup().await?;
    let rosa = create_user(&state, "Rosa", Role::Customer).await?;
    let shopper = customer(rosa);
    let roses = create_product(&state, "Roses", 4_500, 10).await?;
    let order_id = place_order(&state, rosa, &[(roses, 1)]).await?;
    advance_to(&state, order_id, OrderStatus::Delivered).await?;

    review_service::create_review(&state, &shopper, review(roses, 4, "Nice")).await?;
    let err = review_service::create_review(&state, &shopper, review(roses, 1, "Again"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");

    let updated = review_service::update_review(
        &state,
        &shopper,
        UpdateReviewRequest {
            product_id: roses,
            rating: Some(2),
            comment: None,
        },
    )
    .await?
    .data
    .expect("review");
    assert_eq!(updated.rating, 2);
    assert_eq!(updated.comment, "Nice");

    let list = review_service::list_reviews(&state, roses)
        .await?
        .data
        .expect("list");
    assert_eq!(list.count, 1);
    assert_eq!(list.average_rating, 2.0);
    Ok(())
}

#[tokio::test]
async fn invalid_reviews_are_rejected() -> anyhow::Result<()> {
    let state = setup().await?;
    let rosa = create_user(&state, "Rosa", Role::Customer).await?;
    let shopper = customer(rosa);
    let roses = create_product(&state, "Roses", 4_500, 10).await?;
    let order_id = place_order(&state, rosa, &[(roses, 1)]).await?;
    advance_to(&state, order_id, OrderStatus::Delivered).await?;

    for bad in [review(roses, 0, "Meh"), review(roses, 6, "Wow"), review(roses, 3, "  ")] {
        let err = review_service::create_review(&state, &shopper, bad)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");
    }

    let err = review_service::create_review(&state, &shopper, review(Uuid::new_v4(), 3, "Hm"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ProductNotFound(_)), "{err:?}");

    // Nothing to update yet.
    let err = review_service::update_review(
        &state,
        &shopper,
        UpdateReviewRequest {
            product_id: roses,
            rating: Some(3),
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::ReviewNotFound), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn listing_averages_every_review_of_the_product() -> anyhow::Result<()> {
    let state = setup().await?;
    let roses = create_product(&state, "Roses", 4_500, 10).await?;
    let tulips = create_product(&state, "Tulips", 3_200, 10).await?;

    for (name, rating) in [("Rosa", 5), ("Lily", 4), ("Iris", 2)] {
        let id = create_user(&state, name, Role::Customer).await?;
        let order_id = place_order(&state, id, &[(roses, 1), (tulips, 1)]).await?;
        advance_to(&state, order_id, OrderStatus::Delivered).await?;
        review_service::create_review(&state, &customer(id), review(roses, rating, "ok")).await?;
    }

    let list = review_service::list_reviews(&state, roses)
        .await?
        .data
        .expect("list");
    assert_eq!(list.count, 3);
    assert!((list.average_rating - 11.0 / 3.0).abs() < 1e-9);

    let empty = review_service::list_reviews(&state, tulips)
        .await?
        .data
        .expect("list");
    assert_eq!(empty.count, 0);
    assert_eq!(empty.average_rating, 0.0);
    Ok(())
}

#[tokio::test]
async fn only_admins_delete_reviews() -> anyhow::Result<()> {
    let state = setup().await?;
    let boss = admin(create_user(&state, "Ada", Role::Admin).await?);
    let rosa = create_user(&state, "Rosa", Role::Customer).await?;
    let shopper = customer(rosa);
    let roses = create_product(&state, "Roses", 4_500, 10).await?;
    let order_id = place_order(&state, rosa, &[(roses, 1)]).await?;
    advance_to(&state, order_id, OrderStatus::Delivered).await?;

    let created = review_service::create_review(&state, &shopper, review(roses, 1, "Wilted"))
        .await?
        .data
        .expect("review");
    let query = || DeleteReviewQuery {
        product_id: roses,
        id: created.id,
    };

    let err = review_service::delete_review(&state, &shopper, query())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let deleted = review_service::delete_review(&state, &boss, query())
        .await?
        .data
        .expect("review");
    assert_eq!(deleted.id, created.id);

    let err = review_service::delete_review(&state, &boss, query())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ReviewNotFound));

    let list = review_service::list_reviews(&state, roses)
        .await?
        .data
        .expect("list");
    assert_eq!(list.count, 0);
    Ok(())
}

#[tokio::test]
async fn admin_product_list_includes_sold_out_items() -> anyhow::Result<()> {
    let state = setup().await?;
    let boss = admin(create_user(&state, "Ada", Role::Admin).await?);
    let shopper = customer(create_user(&state, "Rosa", Role::Customer).await?);
    create_product(&state, "Tulips", 3_200, 0).await?;
    create_product(&state, "Roses", 4_500, 10).await?;

    let resp = product_service::admin_products(&state, &boss, AdminProductQuery::default()).await?;
    let names: Vec<String> = resp
        .data
        .expect("list")
        .items
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Roses".to_string(), "Tulips".to_string()]);
    assert_eq!(resp.meta.and_then(|m| m.total), Some(2));

    let err = product_service::admin_products(&state, &shopper, AdminProductQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}
