use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit_or_warn,
    dto::products::{
        BulkDeleteRequest, BulkDeleteResult, CreateProductRequest, ProductList,
        UpdateProductRequest,
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{AdminProductQuery, ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        condition = condition.add(ProdCol::Name.contains(q));
    }
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        condition = condition.add(ProdCol::Category.eq(category));
    }
    if let Some(min) = query.min_price {
        condition = condition.add(ProdCol::Price.gte(min));
    }
    if let Some(max) = query.max_price {
        condition = condition.add(ProdCol::Price.lte(max));
    }

    let sort_column = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => ProdCol::CreatedAt,
        ProductSortBy::Price => ProdCol::Price,
        ProductSortBy::Name => ProdCol::Name,
    };
    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_column),
        SortOrder::Desc => finder.order_by_desc(sort_column),
    };

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
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Full catalogue for administrators, including products that are out of
/// stock, ordered by name.
pub async fn admin_products(
    state: &AppState,
    user: &AuthUser,
    query: AdminProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .order_by_asc(ProdCol::Name)
        .order_by_asc(ProdCol::Id);
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
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::ProductNotFound(id))?;
    Ok(ApiResponse::ok("OK", Product::from(product)))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    validate_product(&payload.name, payload.price, payload.stock)?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        category: Set(payload.category),
        images: Set(serde_json::json!(payload.images)),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    log_audit_or_warn(
        &state.orm,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(ApiResponse::ok("Product created", Product::from(product)))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::ProductNotFound(id))?;
    validate_product(
        payload.name.as_deref().unwrap_or(&existing.name),
        payload.price.unwrap_or(existing.price),
        payload.stock.unwrap_or(existing.stock),
    )?;

    let mut active: ProductActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(images) = payload.images {
        active.images = Set(serde_json::json!(images));
    }
    let product = active.update(&state.orm).await?;

    Ok(ApiResponse::ok("Product updated", Product::from(product)))
}

/// Delete several products at once. Products that appear on any order are
/// kept, since line items reference them.
pub async fn bulk_delete(
    state: &AppState,
    user: &AuthUser,
    payload: BulkDeleteRequest,
) -> AppResult<ApiResponse<BulkDeleteResult>> {
    ensure_admin(user)?;
    if payload.ids.is_empty() {
        return Err(AppError::BadRequest("no product ids given".into()));
    }

    let txn = state.orm.begin().await?;
    let referenced = OrderItems::find()
        .filter(OrderItemCol::ProductId.is_in(payload.ids.clone()))
        .count(&txn)
        .await?;
    if referenced > 0 {
        return Err(AppError::BadRequest(
            "products that appear on orders cannot be deleted".into(),
        ));
    }

    let result = Products::delete_many()
        .filter(ProdCol::Id.is_in(payload.ids.clone()))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    log_audit_or_warn(
        &state.orm,
        Some(user.user_id),
        "product_bulk_delete",
        Some("products"),
        Some(serde_json::json!({ "ids": payload.ids, "deleted": result.rows_affected })),
    )
    .await;

    Ok(ApiResponse::ok(
        "Products deleted",
        BulkDeleteResult {
            deleted: result.rows_affected,
        },
    ))
}

fn validate_product(name: &str, price: i64, stock: i32) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    if price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    Ok(())
}
