//! EventInvitationRepository - Inviti a un evento spediti per email

use super::event::ensure_invitation_circle;
use super::{Create, Delete, PoolType, Read};
use crate::dtos::CreateEventInvitationDTO;
use crate::entities::{Circle, Event, EventInvitation};
use chrono::Utc;
use sqlx::Error;

const INVITATION_COLUMNS: &str = "i.invitation_id, i.event_id, i.email, i.token, i.invited_by, \
     i.created_at, i.accepted, i.accepted_at";

pub struct EventInvitationRepository {
    connection_pool: PoolType,
}

impl EventInvitationRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }

    /// Inviti degli eventi creati dall'utente più quelli indirizzati alla sua email
    pub async fn list_for_user(
        &self,
        user_id: &i32,
        email: &str,
    ) -> Result<Vec<EventInvitation>, Error> {
        sqlx::query_as::<_, EventInvitation>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM event_invitations i
            JOIN events e ON e.event_id = i.event_id
            WHERE e.creator_id = ? OR i.email = lower(?)
            ORDER BY i.created_at DESC, i.invitation_id DESC
            "#
        ))
        .bind(user_id)
        .bind(email)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<EventInvitation>, Error> {
        sqlx::query_as::<_, EventInvitation>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM event_invitations i WHERE i.token = ?"
        ))
        .bind(token)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Segna l'invito come accettato e porta l'utente nella cerchia di invito
    /// dell'evento, registrando la partecipazione. Idempotente.
    pub async fn accept(
        &self,
        invitation: &EventInvitation,
        event: &Event,
        user_id: &i32,
    ) -> Result<Circle, Error> {
        let mut tx = self.connection_pool.begin().await?;

        sqlx::query(
            "UPDATE event_invitations SET accepted = 1, accepted_at = COALESCE(accepted_at, ?) WHERE invitation_id = ?",
        )
        .bind(Utc::now())
        .bind(invitation.invitation_id)
        .execute(&mut *tx)
        .await?;

        let circle = ensure_invitation_circle(&mut tx, event, invitation.invited_by).await?;

        sqlx::query("INSERT OR IGNORE INTO circle_members (circle_id, user_id) VALUES (?, ?)")
            .bind(circle.circle_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT OR IGNORE INTO event_participations (event_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(&event.event_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(circle)
    }
}

impl Create<EventInvitation, CreateEventInvitationDTO> for EventInvitationRepository {
    async fn create(&self, data: &CreateEventInvitationDTO) -> Result<EventInvitation, Error> {
        let now = Utc::now();
        let email = data.email.trim().to_lowercase();

        let result = sqlx::query(
            r#"
            INSERT INTO event_invitations (event_id, email, token, invited_by, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.event_id)
        .bind(&email)
        .bind(&data.token)
        .bind(data.invited_by)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        Ok(EventInvitation {
            invitation_id: result.last_insert_rowid() as i32,
            event_id: data.event_id.clone(),
            email,
            token: data.token.clone(),
            invited_by: data.invited_by,
            created_at: now,
            accepted: false,
            accepted_at: None,
        })
    }
}

impl Read<EventInvitation, i32> for EventInvitationRepository {
    async fn read(&self, id: &i32) -> Result<Option<EventInvitation>, Error> {
        sqlx::query_as::<_, EventInvitation>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM event_invitations i WHERE i.invitation_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

impl Delete<i32> for EventInvitationRepository {
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM event_invitations WHERE invitation_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }
}
