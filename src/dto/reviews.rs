use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Review;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub product_id: Uuid,
    /// 1 to 5.
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub product_id: Uuid,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewQuery {
    pub product_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteReviewQuery {
    pub product_id: Uuid,
    /// Review ID.
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub product_id: Uuid,
    /// Mean rating, 0 when there are no reviews.
    pub average_rating: f64,
    pub count: u64,
    pub items: Vec<Review>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewEligibility {
    pub product_id: Uuid,
    /// The caller has a delivered order containing the product.
    pub eligible: bool,
    pub has_reviewed: bool,
}
