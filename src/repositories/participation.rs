//! ParticipationRepository - Partecipazioni degli utenti agli eventi

use super::PoolType;
use crate::entities::{EventParticipation, User};
use chrono::Utc;
use sqlx::Error;

pub struct ParticipationRepository {
    connection_pool: PoolType,
}

impl ParticipationRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }

    pub async fn find(
        &self,
        event_id: &str,
        user_id: &i32,
    ) -> Result<Option<EventParticipation>, Error> {
        sqlx::query_as::<_, EventParticipation>(
            "SELECT event_id, user_id, created_at FROM event_participations WHERE event_id = ? AND user_id = ?",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Idempotente sulla coppia (evento, utente)
    pub async fn add(&self, event_id: &str, user_id: &i32) -> Result<(), Error> {
        sqlx::query(
            "INSERT OR IGNORE INTO event_participations (event_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(event_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.connection_pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, event_id: &str, user_id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM event_participations WHERE event_id = ? AND user_id = ?")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }

    pub async fn participants(&self, event_id: &str) -> Result<Vec<User>, Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.user_id, u.username, u.email, u.password, u.created_at
            FROM users u
            JOIN event_participations p ON p.user_id = u.user_id
            WHERE p.event_id = ?
            ORDER BY p.created_at, u.username
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn count(&self, event_id: &str) -> Result<i64, Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM event_participations WHERE event_id = ?")
            .bind(event_id)
            .fetch_one(&self.connection_pool)
            .await
    }
}
