use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        payments::{PayOrderRequest, PaymentReceipt, RefundReceipt, RefundRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{order_service, payment_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/checkout", post(checkout))
        .route("/{id}", get(get_order))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/cancel", post(cancel_order))
        .route("/{id}/pay", post(pay_order))
        .route("/{id}/refund", post(refund_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders placed by the current user", body = ApiResponse<OrderList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order placed from the cart", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Empty cart, missing address or negative tip"),
        (status = 404, description = "Restaurant or address not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::checkout(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status advanced", body = ApiResponse<Order>),
        (status = 403, description = "Caller may not perform this transition"),
        (status = 409, description = "Transition not allowed from the current status"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::advance_status(&state, &user, id, payload.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<Order>),
        (status = 409, description = "Order already progressed or was paid"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::cancel_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/pay",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = PayOrderRequest,
    responses(
        (status = 200, description = "Payment captured", body = ApiResponse<PaymentReceipt>),
        (status = 409, description = "Already paid, refunded or closed"),
        (status = 502, description = "Payment provider failed or timed out"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn pay_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PayOrderRequest>,
) -> AppResult<Json<ApiResponse<PaymentReceipt>>> {
    let resp = payment_service::pay(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/refund",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = RefundRequest,
    responses(
        (status = 200, description = "Order refunded", body = ApiResponse<RefundReceipt>),
        (status = 409, description = "Order not paid or already delivered"),
        (status = 502, description = "Payment provider failed or timed out"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn refund_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RefundRequest>,
) -> AppResult<Json<ApiResponse<RefundReceipt>>> {
    let resp = payment_service::refund(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
