//! PasswordResetRepository - Token monouso per il reset della password

use super::PoolType;
use crate::entities::PasswordResetToken;
use chrono::{DateTime, Utc};
use sqlx::Error;

pub struct PasswordResetRepository {
    connection_pool: PoolType,
}

impl PasswordResetRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }

    /// Salva un nuovo token, invalidando quelli precedenti dell'utente
    pub async fn replace_for_user(
        &self,
        user_id: &i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken, Error> {
        let mut tx = self.connection_pool.begin().await?;

        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO password_reset_tokens (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(PasswordResetToken {
            token: token.to_string(),
            user_id: *user_id,
            expires_at,
        })
    }

    pub async fn find(&self, token: &str) -> Result<Option<PasswordResetToken>, Error> {
        sqlx::query_as::<_, PasswordResetToken>(
            "SELECT token, user_id, expires_at FROM password_reset_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Aggiorna la password e consuma il token nella stessa transazione
    pub async fn consume(&self, reset: &PasswordResetToken, password_hash: &str) -> Result<(), Error> {
        let mut tx = self.connection_pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM password_reset_tokens WHERE token = ?")
            .bind(&reset.token)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            // già usato da una richiesta concorrente
            return Err(Error::RowNotFound);
        }

        sqlx::query("UPDATE users SET password = ? WHERE user_id = ?")
            .bind(password_hash)
            .bind(reset.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected())
    }
}
