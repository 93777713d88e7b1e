pub mod admin_service;
pub mod inventory;
pub mod lifecycle;
pub mod order_service;
pub mod product_service;
pub mod review_service;
pub mod sales_service;
