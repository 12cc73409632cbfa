use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "astronauts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub group: i32,
    pub status: String,
    pub birth_date: String,
    pub birth_place: String,
    pub gender: String,
    pub alma_mater: String, // JSON array stored as string
    pub undergraduate_major: String, // JSON array stored as string
    pub graduate_major: String, // JSON array stored as string
    pub military_rank: Option<String>,
    pub military_branch: Option<String>,
    pub space_flights: i32,
    pub space_flight_hours: i32,
    pub space_walks: i32,
    pub space_walk_hours: i32,
    pub missions: String, // JSON array stored as string
    pub death_date: Option<String>,
    pub death_mission: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
