use std::{env, str::FromStr, time::Duration};

use anyhow::Context;
use rust_decimal::Decimal;

use crate::models::VehicleType;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub max_connections: u32,
    pub fulfillment: FulfillmentConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(10);
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            max_connections,
            fulfillment: FulfillmentConfig::from_env()?,
        })
    }
}

/// Business knobs for matching and payment, injected into the workflows.
#[derive(Debug, Clone)]
pub struct FulfillmentConfig {
    /// Platform cut of the food subtotal, as a fraction (`0.20` is 20%).
    pub commission_rate: Decimal,
    pub car_max_distance_km: f64,
    pub bike_max_distance_km: f64,
    pub payment_timeout: Duration,
    pub currency: String,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            commission_rate: Decimal::new(20, 2),
            car_max_distance_km: 15.0,
            bike_max_distance_km: 8.0,
            payment_timeout: Duration::from_secs(5),
            currency: "EUR".to_string(),
        }
    }
}

impl FulfillmentConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let payment_timeout = match env::var("PAYMENT_TIMEOUT_MS") {
            Ok(ms) => Duration::from_millis(ms.parse().context("PAYMENT_TIMEOUT_MS")?),
            Err(_) => defaults.payment_timeout,
        };
        Ok(Self {
            commission_rate: parse_var("COMMISSION_RATE", defaults.commission_rate)?,
            car_max_distance_km: parse_var("CAR_MAX_DISTANCE_KM", defaults.car_max_distance_km)?,
            bike_max_distance_km: parse_var(
                "BIKE_MAX_DISTANCE_KM",
                defaults.bike_max_distance_km,
            )?,
            payment_timeout,
            currency: env::var("DEFAULT_CURRENCY").unwrap_or(defaults.currency),
        })
    }

    pub fn max_distance_km(&self, vehicle: VehicleType) -> f64 {
        match vehicle {
            VehicleType::Car => self.car_max_distance_km,
            VehicleType::Bike => self.bike_max_distance_km,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} has an invalid value {raw:?}")),
        Err(_) => Ok(default),
    }
}
