use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Optional bounds on the sale date (`paid_at`, else `created_at`).
/// `from` is inclusive, `to` exclusive.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct SalesWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl SalesWindow {
    pub fn all_time() -> Self {
        Self::default()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TotalOrders {
    pub count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TotalSales {
    pub total_sales: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CustomerSales {
    pub user_id: Uuid,
    /// `None` when the customer record no longer exists.
    pub name: Option<String>,
    pub email: Option<String>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlySales {
    pub year: i32,
    pub month: u32,
    /// Three-letter English month name, e.g. `Sep`.
    pub label: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProductSales {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub revenue: i64,
}
