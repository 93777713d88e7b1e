use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{order_items, orders, products, reviews, users},
    error::AppError,
};

/// Fulfilment status of an order. Variants are declared in lifecycle order,
/// so `Ord` reflects how far an order has progressed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
}

#[derive(Debug, Error)]
#[error("unknown order status `{0}`")]
pub struct ParseStatusError(String);

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Delivered
    }

    /// Transitions only move forward; a delivered order never changes again.
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        !self.is_terminal() && next > self
    }

    /// Whether reaching this status sends the customer an email.
    pub fn notifies_customer(self) -> bool {
        matches!(self, OrderStatus::Shipped | OrderStatus::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" | "user" => Some(Role::Customer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Minor currency units.
    pub price: i64,
    pub stock: i32,
    pub category: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub phone: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentInfo {
    /// Payment provider reference.
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shipping_info: ShippingInfo,
    pub payment_info: Option<PaymentInfo>,
    pub items_price: i64,
    pub tax_price: i64,
    pub shipping_price: i64,
    pub total_price: i64,
    pub status: OrderStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: i64,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

impl TryFrom<orders::Model> for Order {
    type Error = AppError;

    fn try_from(model: orders::Model) -> Result<Self, Self::Error> {
        let status = model
            .status
            .parse::<OrderStatus>()
            .map_err(|err| AppError::Internal(err.into()))?;
        let payment_info = match (model.payment_id, model.payment_status) {
            (Some(id), Some(status)) => Some(PaymentInfo { id, status }),
            (Some(id), None) => Some(PaymentInfo {
                id,
                status: String::new(),
            }),
            _ => None,
        };

        Ok(Order {
            id: model.id,
            user_id: model.user_id,
            shipping_info: ShippingInfo {
                address: model.shipping_address,
                city: model.shipping_city,
                phone: model.shipping_phone,
                postal_code: model.shipping_postal_code,
                country: model.shipping_country,
            },
            payment_info,
            items_price: model.items_price,
            tax_price: model.tax_price,
            shipping_price: model.shipping_price,
            total_price: model.total_price,
            status,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        OrderItem {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            name: model.name,
            quantity: model.quantity,
            price: model.price,
            image: model.image,
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Product {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            stock: model.stock,
            category: model.category,
            images: serde_json::from_value(model.images).unwrap_or_default(),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Review {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            name: model.name,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl TryFrom<users::Model> for User {
    type Error = AppError;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        let role = Role::parse(&model.role).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("unknown role `{}`", model.role))
        })?;
        Ok(User {
            id: model.id,
            name: model.name,
            email: model.email,
            role,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        use OrderStatus::*;
        assert!(Processing.can_advance_to(Shipped));
        assert!(Processing.can_advance_to(Delivered));
        assert!(Shipped.can_advance_to(Delivered));
        assert!(!Shipped.can_advance_to(Processing));
        assert!(!Processing.can_advance_to(Processing));
        assert!(!Delivered.can_advance_to(Delivered));
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Shipped".parse::<OrderStatus>().ok(), Some(OrderStatus::Shipped));
        assert_eq!(" delivered ".parse::<OrderStatus>().ok(), Some(OrderStatus::Delivered));
        assert!("cancelled".parse::<OrderStatus>().is_err());
    }
}
