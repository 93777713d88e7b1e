use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit_or_warn,
    dto::orders::{NewOrderItem, NewOrderRequest, OrderList, OrderWithItems},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus, Product},
    response::ApiResponse,
    state::AppState,
};

/// Place an order for the authenticated customer.
///
/// Unit prices, names and images are copied from the catalogue so later
/// catalogue edits do not change past orders. Stock is only adjusted once the
/// order is delivered.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: NewOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let lines = merge_lines(&payload.items)?;
    if payload.tax_price < 0 || payload.shipping_price < 0 {
        return Err(AppError::BadRequest("prices must not be negative".into()));
    }

    let txn = state.orm.begin().await?;

    let ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
    let products: HashMap<Uuid, Product> = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|model| (model.id, Product::from(model)))
        .collect();

    let mut items_price: i64 = 0;
    for line in &lines {
        let product = products
            .get(&line.product_id)
            .ok_or(AppError::ProductNotFound(line.product_id))?;
        items_price = product
            .price
            .checked_mul(i64::from(line.quantity))
            .and_then(|line_total| items_price.checked_add(line_total))
            .ok_or_else(|| AppError::BadRequest("order total is too large".into()))?;
    }
    let total_price = items_price
        .checked_add(payload.tax_price)
        .and_then(|sum| sum.checked_add(payload.shipping_price))
        .ok_or_else(|| AppError::BadRequest("order total is too large".into()))?;

    let now = Utc::now();
    let shipping = payload.shipping_info;
    let (payment_id, payment_status) = match payload.payment_info {
        Some(payment) => (Some(payment.id), Some(payment.status)),
        None => (None, None),
    };

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        shipping_address: Set(shipping.address),
        shipping_city: Set(shipping.city),
        shipping_phone: Set(shipping.phone),
        shipping_postal_code: Set(shipping.postal_code),
        shipping_country: Set(shipping.country),
        payment_id: Set(payment_id),
        payment_status: Set(payment_status),
        items_price: Set(items_price),
        tax_price: Set(payload.tax_price),
        shipping_price: Set(payload.shipping_price),
        total_price: Set(total_price),
        status: Set(OrderStatus::Processing.as_str().to_string()),
        paid_at: Set(Some(now.into())),
        delivered_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let Some(product) = products.get(&line.product_id) else {
            return Err(AppError::ProductNotFound(line.product_id));
        };
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            name: Set(product.name.clone()),
            quantity: Set(line.quantity),
            price: Set(product.price),
            image: Set(product.images.first().cloned()),
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from(item));
    }

    txn.commit().await?;

    tracing::info!(order_id = %order.id, user_id = %user.user_id, total_price, "order created");
    log_audit_or_warn(
        &state.orm,
        Some(user.user_id),
        "order_created",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_price": total_price })),
    )
    .await;

    Ok(ApiResponse::ok(
        "Order created",
        OrderWithItems {
            order: Order::try_from(order)?,
            items,
        },
    ))
}

/// Orders of the authenticated customer, newest first.
pub async fn my_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let items = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::ok("Ok", OrderList { items }))
}

/// A single order with its line items. Customers only see their own orders;
/// admins see any.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|order| user.is_admin() || order.user_id == user.user_id)
        .ok_or(AppError::OrderNotFound)?;

    let items = load_items(state, order.id).await?;

    Ok(ApiResponse::ok(
        "OK",
        OrderWithItems {
            order: Order::try_from(order)?,
            items,
        },
    ))
}

pub(crate) async fn load_items(state: &AppState, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect())
}

/// Validate quantities and fold repeated products into one line, keeping the
/// order in which products first appear.
fn merge_lines(items: &[NewOrderItem]) -> AppResult<Vec<NewOrderItem>> {
    if items.is_empty() {
        return Err(AppError::BadRequest("order has no items".into()));
    }

    let mut merged: Vec<NewOrderItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest("quantity must be positive".into()));
        }
        match merged.iter_mut().find(|line| line.product_id == item.product_id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| AppError::BadRequest("quantity is too large".into()))?;
            }
            None => merged.push(item.clone()),
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_products_are_merged_in_first_seen_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let lines = merge_lines(&[
            NewOrderItem { product_id: a, quantity: 1 },
            NewOrderItem { product_id: b, quantity: 2 },
            NewOrderItem { product_id: a, quantity: 3 },
        ])
        .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].product_id, lines[0].quantity), (a, 4));
        assert_eq!((lines[1].product_id, lines[1].quantity), (b, 2));
    }

    #[test]
    fn empty_or_non_positive_lines_are_rejected() {
        assert!(merge_lines(&[]).is_err());
        let zero = NewOrderItem {
            product_id: Uuid::new_v4(),
            quantity: 0,
        };
        assert!(matches!(merge_lines(&[zero]), Err(AppError::BadRequest(_))));
    }
}
