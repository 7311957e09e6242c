//! OpenAPI documentation.

use utoipa::OpenApi;

use common::ErrorResponse;
use domain::{CreateOrder, Order, UpdateOrder};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::order_handler::create_order,
        crate::handlers::order_handler::list_orders,
        crate::handlers::order_handler::get_order,
        crate::handlers::order_handler::update_order,
        crate::handlers::order_handler::delete_order,
    ),
    components(
        schemas(Order, CreateOrder, UpdateOrder, ErrorResponse)
    ),
    tags(
        (name = "Orders", description = "Order management endpoints"),
    )
)]
pub struct ApiDoc;
