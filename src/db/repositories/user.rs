use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::db::{StoreError, StoreResult, UserStore};
use crate::entities::{prelude::*, users};
use crate::models::{Role, User};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: users::Model) -> StoreResult<User> {
        let role = model
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::Database(format!("user {}: {e}", model.id)))?;

        Ok(User {
            id: model.id,
            first_name: model.first_name,
            surname: model.surname,
            email: model.email,
            password: model.password_hash,
            api_key: model.api_key,
            role,
            created_at: parse_timestamp(&model.created_at)?,
            updated_at: parse_timestamp(&model.updated_at)?,
        })
    }

    async fn update_columns(&self, id: i32, active: users::ActiveModel) -> StoreResult<()> {
        let result = Users::update_many()
            .set(active)
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn parse_timestamp(value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Database(format!("Invalid timestamp '{value}': {e}")))
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, user: &User) -> StoreResult<i32> {
        let active_model = users::ActiveModel {
            id: NotSet,
            first_name: Set(user.first_name.clone()),
            surname: Set(user.surname.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password.clone()),
            api_key: Set(user.api_key.clone()),
            role: Set(user.role.as_str().to_string()),
            created_at: Set(user.created_at.to_rfc3339()),
            updated_at: Set(user.updated_at.to_rfc3339()),
        };

        let res = Users::insert(active_model).exec(&self.conn).await?;
        Ok(res.last_insert_id)
    }

    async fn list(&self, limit: u64, offset: u64) -> StoreResult<Vec<User>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Surname)
            .order_by_asc(users::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::map_model).collect()
    }

    async fn get(&self, id: i32) -> StoreResult<Option<User>> {
        let user = Users::find_by_id(id).one(&self.conn).await?;
        user.map(Self::map_model).transpose()
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let active = users::ActiveModel {
            first_name: Set(user.first_name.clone()),
            surname: Set(user.surname.clone()),
            email: Set(user.email.clone()),
            role: Set(user.role.as_str().to_string()),
            updated_at: Set(user.updated_at.to_rfc3339()),
            ..Default::default()
        };

        self.update_columns(user.id, active).await
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let result = Users::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    async fn search_by_api_key(&self, key: &str) -> StoreResult<Option<User>> {
        let user = Users::find()
            .filter(users::Column::ApiKey.eq(key))
            .one(&self.conn)
            .await?;

        user.map(Self::map_model).transpose()
    }

    async fn update_password(&self, user: &User) -> StoreResult<()> {
        let active = users::ActiveModel {
            password_hash: Set(user.password.clone()),
            updated_at: Set(user.updated_at.to_rfc3339()),
            ..Default::default()
        };

        self.update_columns(user.id, active).await
    }

    async fn update_api_key(&self, user: &User) -> StoreResult<()> {
        let active = users::ActiveModel {
            api_key: Set(user.api_key.clone()),
            updated_at: Set(user.updated_at.to_rfc3339()),
            ..Default::default()
        };

        self.update_columns(user.id, active).await
    }
}
