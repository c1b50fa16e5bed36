//! Capture, commission and refund.
//!
//! Both workflows hold the order row for the duration of the provider call,
//! so a duplicate request waits and then sees the settled payment status
//! instead of charging twice.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    authz::Action,
    dto::payments::{PayOrderRequest, PaymentReceipt, RefundReceipt, RefundRequest},
    entity::{
        OrderCommissions, Orders, PaymentTransactions,
        order_commissions::{
            ActiveModel as CommissionActive, Column as CommissionCol, Model as CommissionModel,
        },
        orders::{Column as OrderCol, Model as OrderModel},
        payment_transactions::{
            ActiveModel as TransactionActive, Column as TransactionCol,
            Model as TransactionModel,
        },
        refunds::ActiveModel as RefundActive,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{
        DeliveryMode, OrderStatus, PaymentMethod, PaymentStatus, RefundStatus, TransactionStatus,
    },
    money::{from_cents, rate_to_bp, round_money, to_cents},
    response::ApiResponse,
    services::{
        gateway::{self, CaptureRequest, GatewayError, GatewayReceipt},
        lifecycle,
        mapping::{
            commission_from_entity, order_from_entity, refund_from_entity,
            transaction_from_entity,
        },
        order_service,
    },
    state::AppState,
};

/// Commission owed on a food subtotal and what remains for the restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionSplit {
    pub commission: Decimal,
    pub restaurant_net: Decimal,
}

pub fn split_commission(food_subtotal: Decimal, rate: Decimal) -> CommissionSplit {
    let commission = round_money(food_subtotal * rate);
    CommissionSplit {
        commission,
        restaurant_net: round_money(food_subtotal - commission),
    }
}

/// Captures the order total and records the platform commission.
///
/// A failed or timed-out capture is recorded as a `failed` transaction and
/// leaves the order as it was.
pub async fn pay(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: PayOrderRequest,
) -> AppResult<ApiResponse<PaymentReceipt>> {
    let txn = state.orm.begin().await?;
    let order = order_service::lock_order(&txn, order_id).await?;
    let resource = order_service::order_resource(&txn, &order).await?;
    state.policy.authorize(user, &resource, Action::Pay)?;
    ensure_payable(&order)?;

    let method = match payload.payment_method {
        Some(method) => method,
        None => order.payment_method.parse()?,
    };
    let amount = from_cents(order.total_cents);
    let request = CaptureRequest {
        amount,
        currency: order.currency.clone(),
        method,
    };

    let captured = gateway::with_timeout(
        state.config.payment_timeout,
        state.gateway.capture(request),
    )
    .await;

    let receipt = match captured {
        Ok(receipt) => receipt,
        Err(err) => {
            record_failed_capture(&txn, &order, method, &err).await?;
            txn.commit().await?;
            tracing::warn!(order_id = %order.id, error = %err, "payment capture failed");
            return Err(AppError::Upstream(err.to_string()));
        }
    };

    let (order, transaction, commission) =
        settle_capture(txn, &order, method, receipt, state.config.commission_rate).await?;

    tracing::info!(
        order_id = %order.id,
        amount = %amount,
        method = %method,
        commission = %from_cents(commission.commission_cents),
        "order paid"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "order_paid",
        "payment_transactions",
        json!({ "order_id": order.id, "transaction_id": transaction.id }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Payment recorded",
        PaymentReceipt {
            order: order_from_entity(order)?,
            transaction: transaction_from_entity(transaction)?,
            commission: commission_from_entity(commission),
        },
    ))
}

/// Full refund of the latest successful capture; the order ends `refunded`.
pub async fn refund(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: RefundRequest,
) -> AppResult<ApiResponse<RefundReceipt>> {
    let txn = state.orm.begin().await?;
    let order = order_service::lock_order(&txn, order_id).await?;
    let resource = order_service::order_resource(&txn, &order).await?;
    state.policy.authorize(user, &resource, Action::Refund)?;

    if order.payment_status != PaymentStatus::Paid.as_str() {
        return Err(AppError::NotPaid);
    }
    let current: OrderStatus = order.status.parse()?;
    let mode: DeliveryMode = order.delivery_mode.parse()?;
    lifecycle::edge(current, OrderStatus::Refunded, mode)?;

    let captured = latest_capture(&txn, order.id)
        .await?
        .ok_or(AppError::NoCapturedPayment)?;
    let captured_model = transaction_from_entity(captured.clone())?;

    let refunded = gateway::with_timeout(
        state.config.payment_timeout,
        state.gateway.refund(&captured_model),
    )
    .await
    .map_err(|err| {
        tracing::warn!(order_id = %order.id, error = %err, "refund failed at provider");
        AppError::Upstream(err.to_string())
    })?;

    let now = Utc::now();
    let updated = Orders::update_many()
        .col_expr(
            OrderCol::PaymentStatus,
            Expr::value(PaymentStatus::Refunded.as_str()),
        )
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Refunded.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now.fixed_offset()))
        .filter(OrderCol::Id.eq(order.id))
        .filter(OrderCol::PaymentStatus.eq(PaymentStatus::Paid.as_str()))
        .filter(OrderCol::Status.eq(current.as_str()))
        .exec(&txn)
        .await?;
    if updated.rows_affected == 0 {
        return Err(AppError::NotPaid);
    }

    let refund = RefundActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        payment_transaction_id: Set(Some(captured.id)),
        amount_cents: Set(captured.amount_cents),
        currency: Set(captured.currency.clone()),
        status: Set(RefundStatus::Success.as_str().to_string()),
        reason: Set(payload.reason),
        provider_reference: Set(refunded.reference),
        raw_response: Set(refunded.raw_response),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let order = order_service::load_order(&txn, order.id).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        amount = %from_cents(refund.amount_cents),
        from = %current,
        "order refunded"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "order_refunded",
        "refunds",
        json!({ "order_id": order.id, "refund_id": refund.id }),
    )
    .await;

    Ok(ApiResponse::ok(
        "Refund recorded",
        RefundReceipt {
            order: order_from_entity(order)?,
            refund: refund_from_entity(refund)?,
        },
    ))
}

/// Books a successful capture against the locked `order`: the transaction,
/// the paid flag and the commission commit together.
///
/// The paid update only lands while the order still looks as it did when it
/// was locked. If it does not, the captured transaction is committed on its
/// own so the money taken stays on record for reversal.
async fn settle_capture(
    txn: DatabaseTransaction,
    order: &OrderModel,
    method: PaymentMethod,
    receipt: GatewayReceipt,
    rate: Decimal,
) -> AppResult<(OrderModel, TransactionModel, CommissionModel)> {
    let now = Utc::now();
    let transaction = TransactionActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        amount_cents: Set(order.total_cents),
        currency: Set(order.currency.clone()),
        method: Set(method.as_str().to_string()),
        status: Set(TransactionStatus::Success.as_str().to_string()),
        provider_reference: Set(receipt.reference.clone()),
        raw_response: Set(receipt.raw_response),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let paid = Orders::update_many()
        .col_expr(
            OrderCol::PaymentStatus,
            Expr::value(PaymentStatus::Paid.as_str()),
        )
        .col_expr(OrderCol::PaymentMethod, Expr::value(method.as_str()))
        .col_expr(OrderCol::PaymentReference, Expr::value(receipt.reference))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now.fixed_offset()))
        .filter(OrderCol::Id.eq(order.id))
        .filter(OrderCol::PaymentStatus.eq(order.payment_status.as_str()))
        .filter(OrderCol::Status.eq(order.status.as_str()))
        .exec(&txn)
        .await?;
    if paid.rows_affected == 0 {
        let latest = order_service::load_order(&txn, order.id).await?;
        txn.commit().await?;
        tracing::error!(
            order_id = %order.id,
            transaction_id = %transaction.id,
            reference = %transaction.provider_reference,
            "order changed under a captured payment; capture needs reversal"
        );
        ensure_payable(&latest)?;
        return Err(AppError::AlreadyPaid);
    }

    let commission = ensure_commission(&txn, order, rate).await?;
    let order = order_service::load_order(&txn, order.id).await?;
    txn.commit().await?;
    Ok((order, transaction, commission))
}

fn ensure_payable(order: &OrderModel) -> AppResult<()> {
    let payment_status: PaymentStatus = order.payment_status.parse()?;
    match payment_status {
        PaymentStatus::Paid => return Err(AppError::AlreadyPaid),
        PaymentStatus::Refunded => return Err(AppError::AlreadyRefunded),
        PaymentStatus::Pending | PaymentStatus::Failed => {}
    }
    let status: OrderStatus = order.status.parse()?;
    if matches!(status, OrderStatus::Cancelled | OrderStatus::Refunded) {
        return Err(AppError::OrderClosed(status));
    }
    Ok(())
}

async fn latest_capture<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<Option<TransactionModel>> {
    Ok(PaymentTransactions::find()
        .filter(TransactionCol::OrderId.eq(order_id))
        .filter(TransactionCol::Status.eq(TransactionStatus::Success.as_str()))
        .order_by_desc(TransactionCol::CreatedAt)
        .one(conn)
        .await?)
}

async fn record_failed_capture<C: ConnectionTrait>(
    conn: &C,
    order: &OrderModel,
    method: PaymentMethod,
    err: &GatewayError,
) -> AppResult<()> {
    TransactionActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        amount_cents: Set(order.total_cents),
        currency: Set(order.currency.clone()),
        method: Set(method.as_str().to_string()),
        status: Set(TransactionStatus::Failed.as_str().to_string()),
        provider_reference: Set(String::new()),
        raw_response: Set(Some(json!({ "error": err.to_string() }))),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Inserts the order's commission unless one exists; either way returns the
/// stored row. The unique index on `order_id` makes this safe to repeat.
async fn ensure_commission<C: ConnectionTrait>(
    conn: &C,
    order: &OrderModel,
    rate: Decimal,
) -> AppResult<CommissionModel> {
    let food_subtotal = from_cents(order.food_subtotal_cents);
    let split = split_commission(food_subtotal, rate);

    let fresh = CommissionActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        restaurant_id: Set(order.restaurant_id),
        commission_rate_bp: Set(rate_to_bp(rate)?),
        food_subtotal_cents: Set(order.food_subtotal_cents),
        commission_cents: Set(to_cents(split.commission)?),
        restaurant_net_cents: Set(to_cents(split.restaurant_net)?),
        created_at: Set(Utc::now().into()),
    };

    OrderCommissions::insert(fresh)
        .on_conflict(
            OnConflict::column(CommissionCol::OrderId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    OrderCommissions::find()
        .filter(CommissionCol::OrderId.eq(order.id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}
