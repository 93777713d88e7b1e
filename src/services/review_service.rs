//! Product reviews. Only customers with a delivered order containing the
//! product may write or edit a review, and each customer gets one review per
//! product.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit_or_warn,
    dto::reviews::{
        CreateReviewRequest, DeleteReviewQuery, ReviewEligibility, ReviewList, UpdateReviewRequest,
    },
    entity::{
        order_items::{self, Column as OrderItemCol, Entity as OrderItems},
        orders::Column as OrderCol,
        products::Entity as Products,
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{OrderStatus, Review},
    response::ApiResponse,
    state::AppState,
};

/// Whether `user_id` has received `product_id` on at least one delivered order.
pub async fn has_delivered_purchase<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<bool> {
    let lines = OrderItems::find()
        .join(JoinType::InnerJoin, order_items::Relation::Orders.def())
        .filter(OrderItemCol::ProductId.eq(product_id))
        .filter(OrderCol::UserId.eq(user_id))
        .filter(OrderCol::Status.eq(OrderStatus::Delivered.as_str()))
        .count(conn)
        .await?;
    Ok(lines > 0)
}

pub async fn check_eligibility(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<ReviewEligibility>> {
    let eligible = has_delivered_purchase(&state.orm, user.user_id, product_id).await?;
    let has_reviewed = find_own(state, user.user_id, product_id).await?.is_some();
    Ok(ApiResponse::ok(
        "OK",
        ReviewEligibility {
            product_id,
            eligible,
            has_reviewed,
        },
    ))
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    validate_rating(payload.rating)?;
    let comment = validate_comment(&payload.comment)?;

    Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::ProductNotFound(payload.product_id))?;
    if !has_delivered_purchase(&state.orm, user.user_id, payload.product_id).await? {
        return Err(AppError::NotEligibleToReview);
    }
    if find_own(state, user.user_id, payload.product_id).await?.is_some() {
        return Err(AppError::BadRequest(
            "product already reviewed, update the existing review".into(),
        ));
    }
    let reviewer = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let now = Utc::now();
    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(payload.product_id),
        user_id: Set(user.user_id),
        name: Set(reviewer.name),
        rating: Set(payload.rating),
        comment: Set(comment),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(
        review_id = %review.id,
        product_id = %review.product_id,
        rating = review.rating,
        "review created"
    );
    log_audit_or_warn(
        &state.orm,
        Some(user.user_id),
        "review_create",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": review.id, "product_id": review.product_id })),
    )
    .await;

    Ok(ApiResponse::ok("Review created", Review::from(review)))
}

pub async fn update_review(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }
    let comment = payload.comment.as_deref().map(validate_comment).transpose()?;

    let existing = find_own(state, user.user_id, payload.product_id)
        .await?
        .ok_or(AppError::ReviewNotFound)?;
    if !has_delivered_purchase(&state.orm, user.user_id, payload.product_id).await? {
        return Err(AppError::NotEligibleToReview);
    }

    let review_id = existing.id;
    let mut active: ReviewActive = existing.into();
    if let Some(rating) = payload.rating {
        active.rating = Set(rating);
    }
    if let Some(comment) = comment {
        active.comment = Set(comment);
    }
    active.updated_at = Set(Utc::now().into());
    let review = active.update(&state.orm).await?;

    log_audit_or_warn(
        &state.orm,
        Some(user.user_id),
        "review_update",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": review_id, "product_id": payload.product_id })),
    )
    .await;

    Ok(ApiResponse::ok("Review updated", Review::from(review)))
}

/// Reviews of one product, newest first, with the mean rating.
pub async fn list_reviews(state: &AppState, product_id: Uuid) -> AppResult<ApiResponse<ReviewList>> {
    Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::ProductNotFound(product_id))?;

    let items: Vec<Review> = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product_id))
        .order_by_desc(ReviewCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();

    let count = items.len() as u64;
    let average_rating = average(items.iter().map(|r| r.rating));

    Ok(ApiResponse::ok(
        "Reviews",
        ReviewList {
            product_id,
            average_rating,
            count,
            items,
        },
    ))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    query: DeleteReviewQuery,
) -> AppResult<ApiResponse<Review>> {
    ensure_admin(user)?;

    let review = Reviews::find_by_id(query.id)
        .filter(ReviewCol::ProductId.eq(query.product_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::ReviewNotFound)?;
    Reviews::delete_by_id(review.id).exec(&state.orm).await?;

    log_audit_or_warn(
        &state.orm,
        Some(user.user_id),
        "review_delete",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": review.id, "product_id": review.product_id })),
    )
    .await;

    Ok(ApiResponse::ok("Review deleted", Review::from(review)))
}

async fn find_own(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<Option<crate::entity::reviews::Model>> {
    Ok(Reviews::find()
        .filter(ReviewCol::UserId.eq(user_id))
        .filter(ReviewCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?)
}

fn validate_rating(rating: i32) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest("rating must be between 1 and 5".into()));
    }
    Ok(())
}

fn validate_comment(comment: &str) -> AppResult<String> {
    let comment = comment.trim();
    if comment.is_empty() {
        return Err(AppError::BadRequest("comment must not be empty".into()));
    }
    Ok(comment.to_string())
}

fn average(ratings: impl Iterator<Item = i32>) -> f64 {
    let (sum, n) = ratings.fold((0i64, 0u32), |(sum, n), r| (sum + i64::from(r), n + 1));
    if n == 0 {
        0.0
    } else {
        sum as f64 / f64::from(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average(std::iter::empty()), 0.0);
        assert_eq!(average([5, 4].into_iter()), 4.5);
    }

    #[test]
    fn ratings_outside_one_to_five_are_rejected() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
    }
}
