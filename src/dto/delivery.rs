use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{DeliveryAssignment, DriverShift, Order, VehicleType};

/// Partial profile update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDriverProfileRequest {
    pub vehicle_type: Option<VehicleType>,
    pub is_active: Option<bool>,
    pub hourly_rate: Option<Decimal>,
    pub per_km_rate: Option<Decimal>,
    pub service_area_city: Option<String>,
    pub service_radius_km: Option<f64>,
    pub home_latitude: Option<f64>,
    pub home_longitude: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptedDelivery {
    pub order: Order,
    pub assignment: DeliveryAssignment,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShiftList {
    pub items: Vec<DriverShift>,
}
