//! Order status transitions.
//!
//! The order is read and validated first. The transition is then applied in
//! one transaction: a compare-and-swap on the status that was read, the
//! inventory adjustments for a delivery, and the outbox row for the customer
//! email. Either all of it commits or none of it does, and of two concurrent
//! requests for the same order only one can win the swap.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, TransactionTrait,
    prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit::log_audit_or_warn,
    dto::orders::StatusUpdate,
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    models::{Order, OrderStatus},
    notify::outbox,
    services::inventory::{self, InventoryAdjustment},
    state::AppState,
};

/// Move order `order_id` to `next`.
///
/// `actor` is the admin performing the change, recorded in the audit log.
pub async fn update_status(
    state: &AppState,
    actor: Option<Uuid>,
    order_id: Uuid,
    next: OrderStatus,
) -> AppResult<StatusUpdate> {
    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::OrderNotFound)?;
    let current = Order::try_from(order.clone())?.status;

    if current.is_terminal() {
        return Err(AppError::AlreadyDelivered);
    }

    Users::find_by_id(order.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::UserNotFound)?;

    apply_transition(state, actor, order_id, current, next).await
}

/// Apply `expected -> next` to an order last seen in `expected`.
///
/// Fails with [`AppError::StatusConflict`] and changes nothing when the order
/// has moved on since it was read.
pub async fn apply_transition(
    state: &AppState,
    actor: Option<Uuid>,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
) -> AppResult<StatusUpdate> {
    if !expected.can_advance_to(next) {
        return Err(AppError::InvalidTransition {
            from: expected,
            to: next,
        });
    }

    let txn = state.orm.begin().await?;
    let now = Utc::now();
    if !transition_status(&txn, order_id, expected, next, now).await? {
        tracing::info!(order_id = %order_id, from = %expected, to = %next, "status changed concurrently");
        return Err(AppError::StatusConflict);
    }

    if next == OrderStatus::Delivered {
        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order_id))
            .all(&txn)
            .await?;
        for item in &items {
            let adjustment =
                InventoryAdjustment::order_delivered(order_id, item.product_id, item.quantity);
            inventory::apply(&txn, &adjustment).await?;
        }
    }

    let notification_queued = next.notifies_customer();
    if notification_queued {
        outbox::enqueue(&txn, order_id, next, now).await?;
    }

    let updated = Orders::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(AppError::OrderNotFound)?;

    txn.commit().await?;

    if notification_queued {
        state.notifications.wake();
    }

    tracing::info!(order_id = %order_id, from = %expected, to = %next, "order status updated");
    log_audit_or_warn(
        &state.orm,
        actor,
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order_id,
            "from": expected.as_str(),
            "to": next.as_str(),
        })),
    )
    .await;

    Ok(StatusUpdate {
        order: Order::try_from(updated)?,
        notification_queued,
    })
}

/// Conditional update of the status column. Returns `false` when the order
/// is no longer in `expected`, meaning another writer got there first.
pub async fn transition_status<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let now: DateTimeWithTimeZone = now.into();
    let mut update = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(next.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now))
        .filter(OrderCol::Id.eq(order_id))
        .filter(OrderCol::Status.eq(expected.as_str()));
    if next == OrderStatus::Delivered {
        update = update.col_expr(OrderCol::DeliveredAt, Expr::value(Some(now)));
    }

    let result = update.exec(conn).await?;
    Ok(result.rows_affected == 1)
}
