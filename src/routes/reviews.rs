use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, patch, put},
};
use uuid::Uuid;

use crate::{
    dto::reviews::{
        CreateReviewRequest, DeleteReviewQuery, ReviewEligibility, ReviewList, ReviewQuery,
        UpdateReviewRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Review,
    response::ApiResponse,
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/review", put(create_review))
        .route("/review/update", patch(update_review))
        .route("/review/eligibility", get(check_eligibility))
        .route("/reviews", get(list_reviews).delete(delete_review))
}

#[utoipa::path(
    put,
    path = "/api/review",
    request_body = CreateReviewRequest,
    responses(
        (status = 200, description = "Review created", body = ApiResponse<Review>),
        (status = 400, description = "Invalid rating, empty comment or already reviewed"),
        (status = 403, description = "No delivered order contains the product"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::create_review(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/review/update",
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ApiResponse<Review>),
        (status = 400, description = "Invalid rating or empty comment"),
        (status = 403, description = "No delivered order contains the product"),
        (status = 404, description = "Review not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn update_review(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::update_review(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reviews",
    params(("product_id" = Uuid, Query, description = "Product ID")),
    responses(
        (status = 200, description = "Reviews of a product", body = ApiResponse<ReviewList>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewQuery>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let resp = review_service::list_reviews(&state, query.product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/review/eligibility",
    params(("product_id" = Uuid, Query, description = "Product ID")),
    responses(
        (status = 200, description = "Whether the caller may review", body = ApiResponse<ReviewEligibility>),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn check_eligibility(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReviewQuery>,
) -> AppResult<Json<ApiResponse<ReviewEligibility>>> {
    let resp = review_service::check_eligibility(&state, &user, query.product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/reviews",
    params(
        ("product_id" = Uuid, Query, description = "Product ID"),
        ("id" = Uuid, Query, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Review deleted", body = ApiResponse<Review>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Review not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn delete_review(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DeleteReviewQuery>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::delete_review(&state, &user, query).await?;
    Ok(Json(resp))
}
