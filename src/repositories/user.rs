//! UserRepository - Repository per la gestione degli utenti

use super::{Create, PoolType, Read, ReadMany};
use crate::dtos::CreateUserDTO;
use crate::entities::User;
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite};

const USER_COLUMNS: &str = "user_id, username, email, password, created_at";

pub struct UserRepository {
    connection_pool: PoolType,
}

impl UserRepository {
    pub fn new(connection_pool: PoolType) -> UserRepository {
        Self { connection_pool }
    }

    /// Username univoco, confronto esatto
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.connection_pool)
        .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower(?)"
        ))
        .bind(email)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Utenti che condividono almeno una cerchia con `user_id` (escluso se stesso)
    pub async fn find_friends(
        &self,
        user_id: &i32,
        username_prefix: Option<&str>,
    ) -> Result<Vec<User>, Error> {
        let pattern = format!("{}%", username_prefix.unwrap_or(""));
        sqlx::query_as::<_, User>(
            r#"
            SELECT DISTINCT u.user_id, u.username, u.email, u.password, u.created_at
            FROM users u
            JOIN circle_members other ON other.user_id = u.user_id
            JOIN circle_members mine ON mine.circle_id = other.circle_id
            WHERE mine.user_id = ? AND u.user_id <> ? AND u.username LIKE ?
            ORDER BY u.username
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(pattern)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// true se i due utenti sono membri di almeno una cerchia comune
    pub async fn share_a_circle(&self, user_a: &i32, user_b: &i32) -> Result<bool, Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM circle_members a
            JOIN circle_members b ON a.circle_id = b.circle_id
            WHERE a.user_id = ? AND b.user_id = ?
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(count > 0)
    }
}

impl Create<User, CreateUserDTO> for UserRepository {
    /// `data.password` deve essere già l'hash bcrypt
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, email, password, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        Ok(User {
            user_id: result.last_insert_rowid() as i32,
            username: data.username.clone(),
            email: data.email.clone(),
            password: data.password.clone(),
            created_at: now,
        })
    }
}

impl Read<User, i32> for UserRepository {
    async fn read(&self, id: &i32) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

impl ReadMany<User, i32> for UserRepository {
    async fn read_many(&self, ids: &[i32]) -> Result<Vec<User>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE user_id IN ("));
        let mut separated = query_builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY username");

        query_builder
            .build_query_as::<User>()
            .fetch_all(&self.connection_pool)
            .await
    }
}
