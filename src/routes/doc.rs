use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        orders::{
            AdminOrderList, NewOrderItem, NewOrderRequest, OrderList, OrderWithItems,
            StatusUpdate, UpdateOrderStatusRequest,
        },
        products::{
            BulkDeleteRequest, BulkDeleteResult, CreateProductRequest, InventoryAdjustRequest,
            ProductList, UpdateProductRequest,
        },
        reviews::{
            CreateReviewRequest, DeleteReviewQuery, ReviewEligibility, ReviewList, ReviewQuery,
            UpdateReviewRequest,
        },
        sales::{CustomerSales, MonthlySales, ProductSales, TotalOrders, TotalSales},
    },
    models::{
        Order, OrderItem, OrderStatus, PaymentInfo, Product, Review, Role, ShippingInfo, User,
    },
    response::{ApiResponse, Meta},
    routes::{admin, health, orders, params, products as product_routes, reviews},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        product_routes::list_products,
        product_routes::get_product,
        orders::create_order,
        orders::my_orders,
        orders::get_order,
        reviews::create_review,
        reviews::update_review,
        reviews::list_reviews,
        reviews::check_eligibility,
        reviews::delete_review,
        admin::list_all_orders,
        admin::update_order_status,
        admin::delete_order,
        admin::total_orders,
        admin::total_sales,
        admin::customer_sales,
        admin::sales_per_month,
        admin::product_sales,
        admin::list_admin_products,
        admin::create_product,
        admin::update_product,
        admin::bulk_delete_products,
        admin::list_low_stock,
        admin::adjust_inventory
    ),
    components(
        schemas(
            User,
            Role,
            Product,
            Order,
            OrderItem,
            OrderStatus,
            ShippingInfo,
            PaymentInfo,
            NewOrderItem,
            NewOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            AdminOrderList,
            StatusUpdate,
            CreateProductRequest,
            UpdateProductRequest,
            BulkDeleteRequest,
            BulkDeleteResult,
            InventoryAdjustRequest,
            ProductList,
            TotalOrders,
            TotalSales,
            CustomerSales,
            MonthlySales,
            ProductSales,
            Review,
            CreateReviewRequest,
            UpdateReviewRequest,
            ReviewQuery,
            DeleteReviewQuery,
            ReviewList,
            ReviewEligibility,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::LowStockQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<StatusUpdate>,
            ApiResponse<Review>,
            ApiResponse<ReviewList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalogue endpoints"),
        (name = "Orders", description = "Customer order endpoints"),
        (name = "Reviews", description = "Product reviews by customers who received the product"),
        (name = "Admin", description = "Order, catalogue and inventory administration"),
        (name = "Sales", description = "Sales statistics"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
