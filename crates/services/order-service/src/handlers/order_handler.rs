//! Order handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tracing::info;

use common::{parse_id, AppResult, BodyRejection, JsonBody, OptionExt};
use domain::{CreateOrder, Order, Resource, UpdateOrder};

use crate::state::AppState;

/// Create order routes
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
}

/// Create an order
#[utoipa::path(
    post,
    path = "/orders",
    tag = "Orders",
    request_body = CreateOrder,
    responses(
        (status = 201, description = "Order created", body = Order),
        (status = 400, description = "Malformed JSON body", body = common::ErrorResponse),
        (status = 500, description = "Missing field or store failure", body = common::ErrorResponse)
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<JsonBody<CreateOrder>, BodyRejection>,
) -> Response {
    let result: AppResult<Order> = async {
        let JsonBody(payload) = payload?;
        let new_order = payload.into_new_order()?;
        state.orders.create(new_order).await
    }
    .await;

    match result {
        Ok(order) => {
            info!(
                orderId = order.id,
                userId = order.user_id,
                product = order.product.as_str(),
                quantity = order.quantity,
                price = order.price,
                status = order.status.as_str(),
                "Order created"
            );
            (StatusCode::CREATED, Json(order)).into_response()
        }
        Err(err) => err.reply(Order::NAME, "create", None),
    }
}

/// List all orders, newest first
#[utoipa::path(
    get,
    path = "/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "All orders, newest first", body = Vec<Order>),
        (status = 500, description = "Store failure", body = common::ErrorResponse)
    )
)]
pub async fn list_orders(State(state): State<AppState>) -> Response {
    match state.orders.list().await {
        Ok(orders) => {
            info!(count = orders.len(), "Orders listed");
            Json(orders).into_response()
        }
        Err(err) => err.reply(Order::NAME, "list", None),
    }
}

/// Get order by ID
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "Orders",
    params(
        ("id" = i32, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order", body = Order),
        (status = 404, description = "Order not found", body = common::ErrorResponse),
        (status = 500, description = "Store failure", body = common::ErrorResponse)
    )
)]
pub async fn get_order(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let result: AppResult<Order> = async {
        let id = parse_id(&raw_id)?;
        state.orders.find_by_id(id).await?.ok_or_not_found()
    }
    .await;

    match result {
        Ok(order) => {
            info!(orderId = order.id, "Order retrieved");
            Json(order).into_response()
        }
        Err(err) => err.reply(Order::NAME, "get", Some(&raw_id)),
    }
}

/// Update order fields present in the body
#[utoipa::path(
    put,
    path = "/orders/{id}",
    tag = "Orders",
    params(
        ("id" = i32, Path, description = "Order ID")
    ),
    request_body = UpdateOrder,
    responses(
        (status = 200, description = "Updated order", body = Order),
        (status = 400, description = "Malformed JSON body", body = common::ErrorResponse),
        (status = 404, description = "Order not found", body = common::ErrorResponse),
        (status = 500, description = "Store failure", body = common::ErrorResponse)
    )
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<JsonBody<UpdateOrder>, BodyRejection>,
) -> Response {
    let result: AppResult<Order> = async {
        let id = parse_id(&raw_id)?;
        let JsonBody(changes) = payload?;
        state.orders.update(id, changes).await
    }
    .await;

    match result {
        Ok(order) => {
            info!(
                orderId = order.id,
                status = order.status.as_str(),
                "Order updated"
            );
            Json(order).into_response()
        }
        Err(err) => err.reply(Order::NAME, "update", Some(&raw_id)),
    }
}

/// Delete order
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    tag = "Orders",
    params(
        ("id" = i32, Path, description = "Order ID")
    ),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = common::ErrorResponse),
        (status = 500, description = "Store failure", body = common::ErrorResponse)
    )
)]
pub async fn delete_order(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let result: AppResult<i32> = async {
        let id = parse_id(&raw_id)?;
        state.orders.delete(id).await?;
        Ok(id)
    }
    .await;

    match result {
        Ok(id) => {
            info!(orderId = id, "Order deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => err.reply(Order::NAME, "delete", Some(&raw_id)),
    }
}
