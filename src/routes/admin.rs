use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::{
        orders::OrderList,
        payments::{CommissionList, RefundList, TransactionList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::{OrderListQuery, PaymentListQuery},
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/payments", get(list_transactions))
        .route("/refunds", get(list_refunds))
        .route("/commissions", get(list_commissions))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Get all orders (admin only)", body = ApiResponse<OrderList>),
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
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/payments",
    params(PaymentListQuery),
    responses(
        (status = 200, description = "Payment transactions, successful and failed", body = ApiResponse<TransactionList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PaymentListQuery>,
) -> AppResult<Json<ApiResponse<TransactionList>>> {
    let resp = admin_service::list_transactions(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/refunds",
    params(PaymentListQuery),
    responses(
        (status = 200, description = "Refunds", body = ApiResponse<RefundList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_refunds(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PaymentListQuery>,
) -> AppResult<Json<ApiResponse<RefundList>>> {
    let resp = admin_service::list_refunds(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/commissions",
    params(PaymentListQuery),
    responses(
        (status = 200, description = "Platform commission per paid order", body = ApiResponse<CommissionList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_commissions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PaymentListQuery>,
) -> AppResult<Json<ApiResponse<CommissionList>>> {
    let resp = admin_service::list_commissions(&state, &user, query).await?;
    Ok(Json(resp))
}
