//! ProfileRepository - Repository per i profili utente

use super::{PoolType, Read, Update};
use crate::dtos::UpdateProfileDTO;
use crate::entities::Profile;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{Error, QueryBuilder, Sqlite};

const PROFILE_COLUMNS: &str = "user_id, timetable, remote_days, remote_days_count, \
     vacation_days_remaining, vacation_start, vacation_end, looking_for, created_at, updated_at";

pub struct ProfileRepository {
    connection_pool: PoolType,
}

impl ProfileRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }

    /// Crea il profilo con orario e giorni remoti di default
    pub async fn create_default(&self, user_id: &i32) -> Result<Profile, Error> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, timetable, remote_days, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(Json(Profile::default_timetable()))
        .bind(Json(Profile::default_remote_days()))
        .bind(now)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        self.read(user_id).await?.ok_or(Error::RowNotFound)
    }

    /// Legge il profilo creandolo se manca (utenti registrati prima dei profili)
    pub async fn read_or_create(&self, user_id: &i32) -> Result<Profile, Error> {
        match self.read(user_id).await? {
            Some(profile) => Ok(profile),
            None => self.create_default(user_id).await,
        }
    }
}

impl Read<Profile, i32> for ProfileRepository {
    async fn read(&self, id: &i32) -> Result<Option<Profile>, Error> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

impl Update<Profile, UpdateProfileDTO, i32> for ProfileRepository {
    async fn update(&self, id: &i32, data: &UpdateProfileDTO) -> Result<Profile, Error> {
        let current = self.read_or_create(id).await?;

        // Build dynamic UPDATE query using QueryBuilder
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE profiles SET ");
        let mut separated = query_builder.separated(", ");

        separated.push("updated_at = ");
        separated.push_bind_unseparated(Utc::now());
        if let Some(ref timetable) = data.timetable {
            separated.push("timetable = ");
            separated.push_bind_unseparated(Json(Profile::normalize_schedule(
                Some(timetable.clone()),
                Profile::default_timetable,
            )));
        }
        if let Some(ref remote_days) = data.remote_days {
            separated.push("remote_days = ");
            separated.push_bind_unseparated(Json(Profile::normalize_schedule(
                Some(remote_days.clone()),
                Profile::default_remote_days,
            )));
        }
        if let Some(count) = data.remote_days_count {
            separated.push("remote_days_count = ");
            separated.push_bind_unseparated(count);
        }
        if let Some(days) = data.vacation_days_remaining {
            separated.push("vacation_days_remaining = ");
            separated.push_bind_unseparated(days);
        }
        if let Some(start) = data.vacation_start {
            separated.push("vacation_start = ");
            separated.push_bind_unseparated(start);
        }
        if let Some(end) = data.vacation_end {
            separated.push("vacation_end = ");
            separated.push_bind_unseparated(end);
        }
        if let Some(ref looking_for) = data.looking_for {
            separated.push("looking_for = ");
            separated.push_bind_unseparated(looking_for.clone());
        }

        query_builder.push(" WHERE user_id = ");
        query_builder.push_bind(current.user_id);
        query_builder.build().execute(&self.connection_pool).await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}
