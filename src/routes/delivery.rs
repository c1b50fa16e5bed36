use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        delivery::{AcceptedDelivery, ShiftList, UpdateDriverProfileRequest},
        orders::{OrderList, UpdateOrderStatusRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{DriverProfile, DriverShift, Order},
    response::ApiResponse,
    routes::params::Pagination,
    services::delivery_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).patch(update_profile))
        .route("/orders/eligible", get(list_eligible_orders))
        .route("/orders/{id}/accept", post(accept_order))
        .route("/orders/{id}/status", patch(update_delivery_status))
        .route("/shifts", get(list_shifts))
        .route("/shifts/start", post(start_shift))
        .route("/shifts/end", post(end_shift))
}

#[utoipa::path(
    get,
    path = "/api/driver/profile",
    responses(
        (status = 200, description = "Driver profile, created with defaults on first use", body = ApiResponse<DriverProfile>),
        (status = 403, description = "Caller is not a driver"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DriverProfile>>> {
    let resp = delivery_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/driver/profile",
    request_body = UpdateDriverProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<DriverProfile>),
        (status = 400, description = "Invalid rate, radius or coordinates"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateDriverProfileRequest>,
) -> AppResult<Json<ApiResponse<DriverProfile>>> {
    let resp = delivery_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/driver/orders/eligible",
    responses(
        (status = 200, description = "Unassigned delivery orders ready for pickup in the driver's city", body = ApiResponse<OrderList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver"
)]
pub async fn list_eligible_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = delivery_service::list_eligible_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/driver/orders/{id}/accept",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order assigned to the caller", body = ApiResponse<AcceptedDelivery>),
        (status = 409, description = "Already assigned or not ready"),
        (status = 422, description = "Outside service area or vehicle range"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver"
)]
pub async fn accept_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<AcceptedDelivery>>> {
    let resp = delivery_service::accept_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/driver/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Delivery progressed", body = ApiResponse<Order>),
        (status = 400, description = "Drivers may only set on_the_way or delivered"),
        (status = 404, description = "No such order assigned to the caller"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver"
)]
pub async fn update_delivery_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = delivery_service::update_delivery_status(&state, &user, id, payload.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/driver/shifts/start",
    responses(
        (status = 200, description = "Shift opened", body = ApiResponse<DriverShift>),
        (status = 400, description = "A shift is already open"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver"
)]
pub async fn start_shift(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DriverShift>>> {
    let resp = delivery_service::start_shift(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/driver/shifts/end",
    responses(
        (status = 200, description = "Shift closed", body = ApiResponse<DriverShift>),
        (status = 400, description = "No open shift"),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver"
)]
pub async fn end_shift(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DriverShift>>> {
    let resp = delivery_service::end_shift(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/driver/shifts",
    params(Pagination),
    responses(
        (status = 200, description = "Shift history, newest first", body = ApiResponse<ShiftList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Driver"
)]
pub async fn list_shifts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ShiftList>>> {
    let resp = delivery_service::list_shifts(&state, &user, pagination).await?;
    Ok(Json(resp))
}
