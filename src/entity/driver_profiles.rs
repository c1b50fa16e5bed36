use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "driver_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub vehicle_type: String,
    pub is_active: bool,
    pub hourly_rate_cents: i64,
    pub per_km_rate_cents: i64,
    pub service_area_city: String,
    pub service_radius_km: f64,
    pub home_latitude: Option<f64>,
    pub home_longitude: Option<f64>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::driver_shifts::Entity")]
    DriverShifts,
    #[sea_orm(has_many = "super::delivery_assignments::Entity")]
    DeliveryAssignments,
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::driver_shifts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DriverShifts.def()
    }
}

impl Related<super::delivery_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryAssignments.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
