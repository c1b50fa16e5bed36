//! Driver-to-order matching rules: service area, range and payout.

use rust_decimal::Decimal;

use crate::{
    config::FulfillmentConfig,
    error::{AppError, AppResult},
    models::VehicleType,
    money::{decimal_from_f64, round_money},
};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two lat/lon points.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Some(Self {
            latitude: latitude?,
            longitude: longitude?,
        })
    }
}

/// Distance used for range checks and pay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TripDistance {
    Measured(f64),
    /// At least one endpoint had no coordinates; counted as zero.
    Unknown,
}

impl TripDistance {
    pub fn between(from: Option<GeoPoint>, to: Option<GeoPoint>) -> Self {
        match (from, to) {
            (Some(a), Some(b)) => {
                TripDistance::Measured(haversine_km(a.latitude, a.longitude, b.latitude, b.longitude))
            }
            _ => TripDistance::Unknown,
        }
    }

    pub fn km(&self) -> f64 {
        match self {
            TripDistance::Measured(km) => *km,
            TripDistance::Unknown => 0.0,
        }
    }

    pub fn is_unverified(&self) -> bool {
        matches!(self, TripDistance::Unknown)
    }
}

/// Case-insensitive service-city check; an empty driver city means "anywhere".
pub fn serves_city(driver_city: &str, restaurant_city: &str) -> bool {
    let driver_city = driver_city.trim();
    driver_city.is_empty() || driver_city.to_lowercase() == restaurant_city.trim().to_lowercase()
}

pub fn check_range(
    config: &FulfillmentConfig,
    vehicle: VehicleType,
    distance: TripDistance,
) -> AppResult<()> {
    let max_km = config.max_distance_km(vehicle);
    let distance_km = distance.km();
    if distance_km > max_km {
        return Err(AppError::DistanceExceeded {
            distance_km,
            max_km,
        });
    }
    Ok(())
}

/// Facts a bonus rule may use when an assignment is created.
#[derive(Debug, Clone, Copy)]
pub struct PayoutContext {
    pub distance_km: f64,
    pub vehicle: VehicleType,
    pub accepted_at: chrono::DateTime<chrono::Utc>,
}

pub trait BonusPolicy: Send + Sync {
    fn bonus(&self, ctx: &PayoutContext) -> Decimal;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoBonus;

impl BonusPolicy for NoBonus {
    fn bonus(&self, _ctx: &PayoutContext) -> Decimal {
        Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub per_km_rate: Decimal,
    pub distance_pay: Decimal,
    pub bonus: Decimal,
}

/// `distance_pay = distance_km * per_km_rate`, with the rate copied as-is.
pub fn payout(
    distance_km: f64,
    per_km_rate: Decimal,
    bonus_policy: &dyn BonusPolicy,
    ctx: &PayoutContext,
) -> AppResult<Payout> {
    let distance = decimal_from_f64(distance_km)?;
    Ok(Payout {
        per_km_rate,
        distance_pay: round_money(distance * per_km_rate),
        bonus: round_money(bonus_policy.bonus(ctx)),
    })
}
