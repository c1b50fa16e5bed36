//! Payment provider capability.
//!
//! The payment workflow only sees [`PaymentGateway`]; the simulated provider
//! below stands in until a real one is wired up.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use thiserror::Error;

use crate::models::{PaymentMethod, PaymentTransaction};

#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub amount: Decimal,
    pub currency: String,
    pub method: PaymentMethod,
}

/// What the provider hands back on success.
#[derive(Debug, Clone)]
pub struct GatewayReceipt {
    pub reference: String,
    pub raw_response: Option<Value>,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment declined: {0}")]
    Declined(String),
    #[error("payment provider unreachable: {0}")]
    Unreachable(String),
    #[error("payment provider timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn capture(&self, request: CaptureRequest) -> Result<GatewayReceipt, GatewayError>;

    async fn refund(
        &self,
        transaction: &PaymentTransaction,
    ) -> Result<GatewayReceipt, GatewayError>;
}

/// Always-approving provider used until a real integration exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedGateway;

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn capture(&self, request: CaptureRequest) -> Result<GatewayReceipt, GatewayError> {
        tracing::debug!(amount = %request.amount, method = %request.method, "simulated capture");
        Ok(GatewayReceipt {
            reference: "SIMULATED_PROVIDER_TXN".to_string(),
            raw_response: Some(json!({ "simulated": true })),
        })
    }

    async fn refund(
        &self,
        transaction: &PaymentTransaction,
    ) -> Result<GatewayReceipt, GatewayError> {
        tracing::debug!(transaction_id = %transaction.id, "simulated refund");
        Ok(GatewayReceipt {
            reference: "SIMULATED_PROVIDER_REFUND".to_string(),
            raw_response: Some(json!({ "simulated": true })),
        })
    }
}

/// Bounds a provider call; running out of time counts as a failed call.
pub async fn with_timeout<F>(limit: Duration, call: F) -> Result<GatewayReceipt, GatewayError>
where
    F: Future<Output = Result<GatewayReceipt, GatewayError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(limit)),
    }
}
