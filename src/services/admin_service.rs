use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    authz::{Action, Resource},
    dto::{
        orders::OrderList,
        payments::{CommissionList, RefundList, TransactionList},
    },
    entity::{
        OrderCommissions, PaymentTransactions, Refunds,
        order_commissions::Column as CommissionCol, orders::Column as OrderCol,
        payment_transactions::Column as TransactionCol, refunds::Column as RefundCol,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, PaymentListQuery},
    services::{
        mapping::{commission_from_entity, refund_from_entity, transaction_from_entity},
        order_service,
    },
    state::AppState,
};

fn authorize(state: &AppState, user: &AuthUser) -> AppResult<()> {
    state
        .policy
        .authorize(user, &Resource::platform(), Action::Administer)
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    authorize(state, user)?;

    let mut condition = Condition::all();
    if let Some(restaurant_id) = query.restaurant_id {
        condition = condition.add(OrderCol::RestaurantId.eq(restaurant_id));
    }
    order_service::paginate_orders(state, condition, &query).await
}

pub async fn list_transactions(
    state: &AppState,
    user: &AuthUser,
    query: PaymentListQuery,
) -> AppResult<ApiResponse<TransactionList>> {
    authorize(state, user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(order_id) = query.order_id {
        condition = condition.add(TransactionCol::OrderId.eq(order_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(TransactionCol::Status.eq(status.as_str()));
    }

    let finder = PaymentTransactions::find()
        .filter(condition)
        .order_by_desc(TransactionCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(transaction_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Payments",
        TransactionList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_refunds(
    state: &AppState,
    user: &AuthUser,
    query: PaymentListQuery,
) -> AppResult<ApiResponse<RefundList>> {
    authorize(state, user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(order_id) = query.order_id {
        condition = condition.add(RefundCol::OrderId.eq(order_id));
    }
    // Refund statuses share their text with transaction statuses.
    if let Some(status) = query.status {
        condition = condition.add(RefundCol::Status.eq(status.as_str()));
    }

    let finder = Refunds::find()
        .filter(condition)
        .order_by_desc(RefundCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(refund_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Refunds",
        RefundList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_commissions(
    state: &AppState,
    user: &AuthUser,
    query: PaymentListQuery,
) -> AppResult<ApiResponse<CommissionList>> {
    authorize(state, user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(order_id) = query.order_id {
        condition = condition.add(CommissionCol::OrderId.eq(order_id));
    }
    if let Some(restaurant_id) = query.restaurant_id {
        condition = condition.add(CommissionCol::RestaurantId.eq(restaurant_id));
    }

    let finder = OrderCommissions::find()
        .filter(condition)
        .order_by_desc(CommissionCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(commission_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Commissions",
        CommissionList { items },
        Some(Meta::new(page, limit, total)),
    ))
}
