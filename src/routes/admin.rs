use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{AdminOrderList, StatusUpdate, UpdateOrderStatusRequest},
        products::{
            BulkDeleteRequest, BulkDeleteResult, CreateProductRequest, InventoryAdjustRequest,
            ProductList, UpdateProductRequest,
        },
        sales::{CustomerSales, MonthlySales, ProductSales, SalesWindow, TotalOrders, TotalSales},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, Product},
    response::ApiResponse,
    routes::params::{AdminProductQuery, LowStockQuery, OrderListQuery},
    services::{admin_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", put(update_order_status).delete(delete_order))
        .route("/total-orders", get(total_orders))
        .route("/total-sales", get(total_sales))
        .route("/customer-sales", get(customer_sales))
        .route("/sales-per-month", get(sales_per_month))
        .route("/product-sales", get(product_sales))
        .route("/products", get(list_admin_products).post(create_product))
        .route("/products/bulk", delete(bulk_delete_products))
        .route("/products/{id}", put(update_product))
        .route("/inventory/low-stock", get(list_low_stock))
        .route("/inventory/{id}", patch(adjust_inventory))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<u64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Processing, Shipped or Delivered"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Get all orders (admin only)", body = ApiResponse<AdminOrderList>),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal Server Error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<AdminOrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<StatusUpdate>),
        (status = 400, description = "Already delivered or not a forward move"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order, customer or product missing"),
        (status = 409, description = "Status changed concurrently"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<StatusUpdate>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order deleted", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::delete_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/total-orders",
    params(
        ("from" = Option<String>, Query, description = "RFC 3339, inclusive"),
        ("to" = Option<String>, Query, description = "RFC 3339, exclusive"),
    ),
    responses((status = 200, description = "Number of orders", body = ApiResponse<TotalOrders>)),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn total_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(window): Query<SalesWindow>,
) -> AppResult<Json<ApiResponse<TotalOrders>>> {
    Ok(Json(admin_service::total_orders(&state, &user, window).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/total-sales",
    params(
        ("from" = Option<String>, Query, description = "RFC 3339, inclusive"),
        ("to" = Option<String>, Query, description = "RFC 3339, exclusive"),
    ),
    responses((status = 200, description = "Sum of order totals", body = ApiResponse<TotalSales>)),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn total_sales(
    State(state): State<AppState>,
    user: AuthUser,
    Query(window): Query<SalesWindow>,
) -> AppResult<Json<ApiResponse<TotalSales>>> {
    Ok(Json(admin_service::total_sales(&state, &user, window).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/customer-sales",
    params(
        ("from" = Option<String>, Query, description = "RFC 3339, inclusive"),
        ("to" = Option<String>, Query, description = "RFC 3339, exclusive"),
    ),
    responses((status = 200, description = "Totals per customer", body = ApiResponse<Vec<CustomerSales>>)),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn customer_sales(
    State(state): State<AppState>,
    user: AuthUser,
    Query(window): Query<SalesWindow>,
) -> AppResult<Json<ApiResponse<Vec<CustomerSales>>>> {
    Ok(Json(admin_service::customer_sales(&state, &user, window).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/sales-per-month",
    params(
        ("from" = Option<String>, Query, description = "RFC 3339, inclusive"),
        ("to" = Option<String>, Query, description = "RFC 3339, exclusive"),
    ),
    responses((status = 200, description = "Totals per calendar month", body = ApiResponse<Vec<MonthlySales>>)),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn sales_per_month(
    State(state): State<AppState>,
    user: AuthUser,
    Query(window): Query<SalesWindow>,
) -> AppResult<Json<ApiResponse<Vec<MonthlySales>>>> {
    Ok(Json(admin_service::sales_per_month(&state, &user, window).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/product-sales",
    params(
        ("from" = Option<String>, Query, description = "RFC 3339, inclusive"),
        ("to" = Option<String>, Query, description = "RFC 3339, exclusive"),
    ),
    responses((status = 200, description = "Units and revenue per product", body = ApiResponse<Vec<ProductSales>>)),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn product_sales(
    State(state): State<AppState>,
    user: AuthUser,
    Query(window): Query<SalesWindow>,
) -> AppResult<Json<ApiResponse<Vec<ProductSales>>>> {
    Ok(Json(admin_service::product_sales(&state, &user, window).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/products",
    params(
        ("page" = Option<u64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<u64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "All products (admin only)", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_admin_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AdminProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::admin_products(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Invalid product"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 404, description = "Not Found"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/bulk",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Products deleted", body = ApiResponse<BulkDeleteResult>),
        (status = 400, description = "Some products appear on orders"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn bulk_delete_products(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BulkDeleteRequest>,
) -> AppResult<Json<ApiResponse<BulkDeleteResult>>> {
    let resp = product_service::bulk_delete(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/inventory/low-stock",
    params(
        ("threshold" = Option<i32>, Query, description = "Stock threshold, default 5"),
        ("page" = Option<u64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<u64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List low stock products", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = admin_service::list_low_stock(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/inventory/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = InventoryAdjustRequest,
    responses(
        (status = 200, description = "Adjust inventory", body = ApiResponse<Product>),
        (status = 400, description = "Stock would go negative"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InventoryAdjustRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = admin_service::adjust_inventory(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
