use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    models::OrderStatus,
    response::{ApiResponse, Meta},
};

/// Failure classes surfaced to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Forbidden,
    NotFound,
    Conflict,
    Capacity,
    Upstream,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid status transition from {current} to {requested}")]
    InvalidTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },

    #[error("Order already has a driver assigned")]
    AlreadyAssigned,

    #[error("Order is not ready for pickup")]
    NotReady,

    #[error("Order is already paid")]
    AlreadyPaid,

    #[error("Order has been refunded and cannot be paid again")]
    AlreadyRefunded,

    #[error("Order is {0} and cannot be paid")]
    OrderClosed(OrderStatus),

    #[error("Paid orders must be refunded instead of cancelled")]
    RefundRequired,

    #[error("Only paid orders can be refunded")]
    NotPaid,

    #[error("No successful payment transaction found to refund")]
    NoCapturedPayment,

    #[error("Order is outside your service area")]
    OutOfServiceArea,

    #[error("Order distance ({distance_km:.1} km) exceeds your vehicle limit ({max_km} km)")]
    DistanceExceeded { distance_km: f64, max_km: f64 },

    #[error("Payment provider failure: {0}")]
    Upstream(String),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound => ErrorKind::NotFound,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Forbidden => ErrorKind::Forbidden,
            AppError::InvalidTransition { .. }
            | AppError::AlreadyAssigned
            | AppError::NotReady
            | AppError::AlreadyPaid
            | AppError::AlreadyRefunded
            | AppError::OrderClosed(_)
            | AppError::RefundRequired
            | AppError::NotPaid
            | AppError::NoCapturedPayment => ErrorKind::Conflict,
            AppError::OutOfServiceArea | AppError::DistanceExceeded { .. } => ErrorKind::Capacity,
            AppError::Upstream(_) => ErrorKind::Upstream,
            AppError::OrmError(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Capacity => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    kind: ErrorKind,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                kind: self.kind(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
