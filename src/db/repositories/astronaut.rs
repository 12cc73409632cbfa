use async_trait::async_trait;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::db::{AstronautStore, StoreError, StoreResult};
use crate::entities::{astronauts, prelude::*};
use crate::models::Astronaut;

pub struct AstronautRepository {
    conn: DatabaseConnection,
}

impl AstronautRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_model(model: astronauts::Model) -> StoreResult<Astronaut> {
        Ok(Astronaut {
            id: model.id,
            name: model.name,
            year: model.year,
            group: model.group,
            status: model.status,
            birth_date: model.birth_date,
            birth_place: model.birth_place,
            gender: model.gender,
            alma_mater: decode_list(&model.alma_mater)?,
            undergraduate_major: decode_list(&model.undergraduate_major)?,
            graduate_major: decode_list(&model.graduate_major)?,
            military_rank: model.military_rank,
            military_branch: model.military_branch,
            space_flights: model.space_flights,
            space_flight_hours: model.space_flight_hours,
            space_walks: model.space_walks,
            space_walk_hours: model.space_walk_hours,
            missions: decode_list(&model.missions)?,
            death_date: model.death_date,
            death_mission: model.death_mission,
        })
    }

    fn to_active_model(a: &Astronaut) -> StoreResult<astronauts::ActiveModel> {
        Ok(astronauts::ActiveModel {
            id: NotSet,
            name: Set(a.name.clone()),
            year: Set(a.year),
            group: Set(a.group),
            status: Set(a.status.clone()),
            birth_date: Set(a.birth_date.clone()),
            birth_place: Set(a.birth_place.clone()),
            gender: Set(a.gender.clone()),
            alma_mater: Set(encode_list(&a.alma_mater)?),
            undergraduate_major: Set(encode_list(&a.undergraduate_major)?),
            graduate_major: Set(encode_list(&a.graduate_major)?),
            military_rank: Set(a.military_rank.clone()),
            military_branch: Set(a.military_branch.clone()),
            space_flights: Set(a.space_flights),
            space_flight_hours: Set(a.space_flight_hours),
            space_walks: Set(a.space_walks),
            space_walk_hours: Set(a.space_walk_hours),
            missions: Set(encode_list(&a.missions)?),
            death_date: Set(a.death_date.clone()),
            death_mission: Set(a.death_mission.clone()),
        })
    }
}

fn encode_list(values: &[String]) -> StoreResult<String> {
    serde_json::to_string(values).map_err(|e| StoreError::Database(e.to_string()))
}

fn decode_list(raw: &str) -> StoreResult<Vec<String>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| StoreError::Database(format!("Invalid list column: {e}")))
}

#[async_trait]
impl AstronautStore for AstronautRepository {
    async fn create(&self, astronaut: &Astronaut) -> StoreResult<i32> {
        let active_model = Self::to_active_model(astronaut)?;
        let res = Astronauts::insert(active_model).exec(&self.conn).await?;
        Ok(res.last_insert_id)
    }

    async fn list(&self, limit: u64, offset: u64) -> StoreResult<Vec<Astronaut>> {
        let rows = Astronauts::find()
            .order_by_asc(astronauts::Column::Name)
            .order_by_asc(astronauts::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::map_model).collect()
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Astronaut>> {
        let row = Astronauts::find_by_id(id).one(&self.conn).await?;
        row.map(Self::map_model).transpose()
    }

    async fn update(&self, astronaut: &Astronaut) -> StoreResult<()> {
        let active = Self::to_active_model(astronaut)?;

        let result = Astronauts::update_many()
            .set(active)
            .filter(astronauts::Column::Id.eq(astronaut.id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let result = Astronauts::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
