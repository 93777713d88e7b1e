use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, OrderStatus, PaymentInfo, ShippingInfo};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Checkout payload. Item prices are taken from the catalogue, tax and
/// shipping are computed by the storefront.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewOrderRequest {
    pub items: Vec<NewOrderItem>,
    pub shipping_info: ShippingInfo,
    pub payment_info: Option<PaymentInfo>,
    #[serde(default)]
    pub tax_price: i64,
    #[serde(default)]
    pub shipping_price: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Admin listing; `total_amount` covers every order matching the filter,
/// not only the current page.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminOrderList {
    pub total_amount: i64,
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusUpdate {
    pub order: Order,
    /// True when a customer email was queued for this transition.
    pub notification_queued: bool,
}
