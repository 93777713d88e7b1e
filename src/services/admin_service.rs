use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit_or_warn,
    dto::{
        orders::{AdminOrderList, StatusUpdate, UpdateOrderStatusRequest},
        products::{InventoryAdjustRequest, ProductList},
        sales::{CustomerSales, MonthlySales, ProductSales, SalesWindow, TotalOrders, TotalSales},
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, Product},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, OrderListQuery, SortOrder},
    services::{
        inventory::{self, InventoryAdjustment},
        lifecycle, sales_service,
    },
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<AdminOrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition.clone());
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await?;

    let total_amount: i64 = Orders::find()
        .select_only()
        .column(OrderCol::TotalPrice)
        .filter(condition)
        .into_tuple::<i64>()
        .all(&state.orm)
        .await?
        .into_iter()
        .sum();

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Orders",
        AdminOrderList {
            total_amount,
            items,
        },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<StatusUpdate>> {
    ensure_admin(user)?;
    let update = lifecycle::update_status(state, Some(user.user_id), id, payload.status).await?;

    let message = if update.notification_queued {
        format!("Order status updated to {}. Email notification queued.", update.order.status)
    } else {
        format!("Order status updated to {}", update.order.status)
    };
    Ok(ApiResponse::ok(message, update))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::OrderNotFound)?;

    OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(id))
        .exec(&txn)
        .await?;
    Orders::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %id, "order deleted");
    log_audit_or_warn(
        &state.orm,
        Some(user.user_id),
        "order_delete",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id, "status": order.status })),
    )
    .await;

    Ok(ApiResponse::ok("Order deleted", Order::try_from(order)?))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(ProdCol::Stock.lte(threshold))
        .order_by_asc(ProdCol::Stock)
        .order_by_asc(ProdCol::Name);

    let total = finder.clone().count(&state.orm).await?;

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::success(
        "Low stock",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let adjustment = InventoryAdjustment::manual(user.user_id, id, payload.delta);
    let updated = inventory::apply(&state.orm, &adjustment).await?;

    log_audit_or_warn(
        &state.orm,
        Some(user.user_id),
        "inventory_adjust",
        Some("products"),
        Some(serde_json::json!({ "product_id": updated.id, "delta": payload.delta })),
    )
    .await;

    Ok(ApiResponse::ok("Inventory updated", Product::from(updated)))
}

pub async fn total_orders(
    state: &AppState,
    user: &AuthUser,
    window: SalesWindow,
) -> AppResult<ApiResponse<TotalOrders>> {
    ensure_admin(user)?;
    let count = sales_service::total_order_count(&state.orm, &window).await?;
    Ok(ApiResponse::ok("Total orders", TotalOrders { count }))
}

pub async fn total_sales(
    state: &AppState,
    user: &AuthUser,
    window: SalesWindow,
) -> AppResult<ApiResponse<TotalSales>> {
    ensure_admin(user)?;
    let total_sales = sales_service::total_sales_amount(&state.orm, &window).await?;
    Ok(ApiResponse::ok("Total sales", TotalSales { total_sales }))
}

pub async fn customer_sales(
    state: &AppState,
    user: &AuthUser,
    window: SalesWindow,
) -> AppResult<ApiResponse<Vec<CustomerSales>>> {
    ensure_admin(user)?;
    let rows = sales_service::sales_by_customer(&state.orm, &window).await?;
    Ok(ApiResponse::ok("Customer sales", rows))
}

pub async fn sales_per_month(
    state: &AppState,
    user: &AuthUser,
    window: SalesWindow,
) -> AppResult<ApiResponse<Vec<MonthlySales>>> {
    ensure_admin(user)?;
    let rows = sales_service::sales_by_month(&state.orm, &window).await?;
    Ok(ApiResponse::ok("Sales per month", rows))
}

pub async fn product_sales(
    state: &AppState,
    user: &AuthUser,
    window: SalesWindow,
) -> AppResult<ApiResponse<Vec<ProductSales>>> {
    ensure_admin(user)?;
    let rows = sales_service::sales_by_product(&state.orm, &window).await?;
    Ok(ApiResponse::ok("Product sales", rows))
}
