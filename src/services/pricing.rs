//! Cart pricing.
//!
//! Totals are computed from the snapshotted cart lines only; checkout freezes
//! the result into the order and nothing recomputes it afterwards.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{models::DeliveryMode, money::round_money};

/// One cart line as seen by the pricing engine.
#[derive(Debug, Clone, Copy)]
pub struct PricedLine {
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl PricedLine {
    pub fn line_total(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity))
    }
}

/// Inputs a fee rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct FeeContext<'a> {
    pub restaurant_id: Uuid,
    pub restaurant_city: &'a str,
    pub delivery_mode: DeliveryMode,
    pub lines: &'a [PricedLine],
    pub subtotal: Decimal,
}

pub trait FeePolicy: Send + Sync {
    fn service_fee(&self, ctx: &FeeContext<'_>) -> Decimal;
    fn delivery_fee(&self, ctx: &FeeContext<'_>) -> Decimal;
}

/// Launch pricing: no service or delivery fee.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineFees;

impl FeePolicy for BaselineFees {
    fn service_fee(&self, _ctx: &FeeContext<'_>) -> Decimal {
        Decimal::ZERO
    }

    fn delivery_fee(&self, _ctx: &FeeContext<'_>) -> Decimal {
        Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub service_fee: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

pub fn subtotal(lines: &[PricedLine]) -> Decimal {
    round_money(lines.iter().map(PricedLine::line_total).sum())
}

/// Prices a cart. Pickup orders never carry a delivery fee.
pub fn price(
    restaurant_id: Uuid,
    restaurant_city: &str,
    delivery_mode: DeliveryMode,
    lines: &[PricedLine],
    fees: &dyn FeePolicy,
) -> PriceBreakdown {
    let subtotal = subtotal(lines);
    let ctx = FeeContext {
        restaurant_id,
        restaurant_city,
        delivery_mode,
        lines,
        subtotal,
    };

    let service_fee = round_money(fees.service_fee(&ctx));
    let delivery_fee = match delivery_mode {
        DeliveryMode::Pickup => round_money(Decimal::ZERO),
        DeliveryMode::Delivery => round_money(fees.delivery_fee(&ctx)),
    };

    PriceBreakdown {
        subtotal,
        service_fee,
        delivery_fee,
        total: subtotal + service_fee + delivery_fee,
    }
}
