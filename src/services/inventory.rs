//! Stock changes as explicit commands.
//!
//! Every stock mutation goes through [`apply`], whether it comes from a
//! delivered order or from an admin restocking the shelf.

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    entity::products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentReason {
    /// Goods left the shop with a delivered order.
    OrderDelivered { order_id: Uuid },
    /// Admin correction or restock.
    Manual { admin_id: Uuid },
}

impl AdjustmentReason {
    /// Deliveries record what physically left the shop, so they may drive
    /// stock below zero. Manual corrections may not.
    pub fn allows_negative(&self) -> bool {
        matches!(self, AdjustmentReason::OrderDelivered { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentReason::OrderDelivered { .. } => "order_delivered",
            AdjustmentReason::Manual { .. } => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryAdjustment {
    pub product_id: Uuid,
    pub delta: i32,
    pub reason: AdjustmentReason,
}

impl InventoryAdjustment {
    pub fn order_delivered(order_id: Uuid, product_id: Uuid, quantity: i32) -> Self {
        Self {
            product_id,
            delta: quantity.saturating_neg(),
            reason: AdjustmentReason::OrderDelivered { order_id },
        }
    }

    pub fn manual(admin_id: Uuid, product_id: Uuid, delta: i32) -> Self {
        Self {
            product_id,
            delta,
            reason: AdjustmentReason::Manual { admin_id },
        }
    }
}

/// Apply one adjustment as a single atomic `stock = stock + delta` update and
/// return the product as it stands afterwards.
pub async fn apply<C: ConnectionTrait>(
    conn: &C,
    adjustment: &InventoryAdjustment,
) -> AppResult<ProductModel> {
    let mut update = Products::update_many()
        .col_expr(
            ProdCol::Stock,
            Expr::col(ProdCol::Stock).add(adjustment.delta),
        )
        .filter(ProdCol::Id.eq(adjustment.product_id));
    if !adjustment.reason.allows_negative() {
        update = update.filter(ProdCol::Stock.gte(adjustment.delta.saturating_neg()));
    }
    let result = update.exec(conn).await?;

    let product = Products::find_by_id(adjustment.product_id)
        .one(conn)
        .await?
        .ok_or(AppError::ProductNotFound(adjustment.product_id))?;

    if result.rows_affected == 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }

    if product.stock < 0 {
        tracing::warn!(
            product_id = %product.id,
            stock = product.stock,
            reason = adjustment.reason.as_str(),
            "product stock is negative"
        );
    } else {
        tracing::debug!(
            product_id = %product.id,
            delta = adjustment.delta,
            stock = product.stock,
            reason = adjustment.reason.as_str(),
            "inventory adjusted"
        );
    }

    Ok(product)
}
