use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "driver_shifts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub driver_id: Uuid,
    pub start_time: DateTimeWithTimeZone,
    pub end_time: Option<DateTimeWithTimeZone>,
    pub total_minutes: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::driver_profiles::Entity",
        from = "Column::DriverId",
        to = "super::driver_profiles::Column::Id"
    )]
    DriverProfiles,
}

impl Related<super::driver_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DriverProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
