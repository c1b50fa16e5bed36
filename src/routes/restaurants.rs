use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::orders::OrderList,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{restaurant_id}/orders", get(list_restaurant_orders))
}

#[utoipa::path(
    get,
    path = "/api/restaurants/{restaurant_id}/orders",
    params(
        ("restaurant_id" = Uuid, Path, description = "Restaurant ID"),
        OrderListQuery
    ),
    responses(
        (status = 200, description = "Orders received by the restaurant", body = ApiResponse<OrderList>),
        (status = 403, description = "Caller does not run this restaurant"),
        (status = 404, description = "Restaurant not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn list_restaurant_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(restaurant_id): Path<Uuid>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_restaurant_orders(&state, &user, restaurant_id, query).await?;
    Ok(Json(resp))
}
