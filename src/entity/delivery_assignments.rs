use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "delivery_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_id: Uuid,
    pub driver_id: Uuid,
    pub distance_km: f64,
    pub distance_unverified: bool,
    pub per_km_rate_cents: i64,
    pub distance_pay_cents: i64,
    pub bonus_cents: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id"
    )]
    Orders,
    #[sea_orm(
        belongs_to = "super::driver_profiles::Entity",
        from = "Column::DriverId",
        to = "super::driver_profiles::Column::Id"
    )]
    DriverProfiles,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::driver_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DriverProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
