//! EventRepository - Repository per eventi, cerchie associate e link di invito

use super::{Create, Delete, PoolType, Read, Update};
use crate::dtos::{CreateEventDTO, UpdateEventDTO};
use crate::entities::{BusySlot, Circle, Event};
use crate::policy::EventSnapshot;
use crate::policy::invitation::INVITATION_CATEGORY;
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqliteConnection};

const EVENT_COLUMNS: &str = "e.event_id, e.title, e.description, e.address_id, e.start_time, \
     e.end_time, e.creator_id, e.shareable_link, e.event_shared, e.invitation_token, \
     e.created_at, e.updated_at";

pub struct EventRepository {
    connection_pool: PoolType,
}

impl EventRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }

    /// Eventi creati dall'utente o associati a una cerchia di cui è membro.
    /// Con `tag_ids` non vuoto tiene solo gli eventi con almeno una cerchia
    /// etichettata con una di quelle categorie.
    pub async fn list_visible_for_user(
        &self,
        user_id: &i32,
        tag_ids: &[i32],
    ) -> Result<Vec<Event>, Error> {
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            r#"
            SELECT DISTINCT {EVENT_COLUMNS}
            FROM events e
            LEFT JOIN event_circles ec ON ec.event_id = e.event_id
            LEFT JOIN circle_members m ON m.circle_id = ec.circle_id
            WHERE (e.creator_id = "#
        ));
        query_builder.push_bind(*user_id);
        query_builder.push(" OR m.user_id = ");
        query_builder.push_bind(*user_id);
        query_builder.push(")");

        if !tag_ids.is_empty() {
            query_builder.push(
                r#"
                AND EXISTS (
                    SELECT 1 FROM event_circles ec2
                    JOIN circle_categories cc ON cc.circle_id = ec2.circle_id
                    WHERE ec2.event_id = e.event_id AND cc.tag_id IN ("#,
            );
            let mut separated = query_builder.separated(", ");
            for tag_id in tag_ids {
                separated.push_bind(*tag_id);
            }
            separated.push_unseparated("))");
        }
        query_builder.push(" ORDER BY e.start_time");

        query_builder
            .build_query_as::<Event>()
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Eventi creati o frequentati da almeno uno degli utenti indicati
    pub async fn busy_slots(&self, user_ids: &[i32]) -> Result<Vec<BusySlot>, Error> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT e.event_id, e.start_time, e.end_time, COUNT(DISTINCT b.user_id) AS busy_members
            FROM events e
            JOIN (
                SELECT event_id, creator_id AS user_id FROM events
                UNION
                SELECT event_id, user_id FROM event_participations
            ) b ON b.event_id = e.event_id
            WHERE b.user_id IN ("#,
        );
        let mut separated = query_builder.separated(", ");
        for user_id in user_ids {
            separated.push_bind(*user_id);
        }
        separated.push_unseparated(")");
        query_builder.push(" GROUP BY e.event_id, e.start_time, e.end_time ORDER BY e.start_time");

        query_builder
            .build_query_as::<BusySlot>()
            .fetch_all(&self.connection_pool)
            .await
    }

    pub async fn circles_of(&self, event_id: &str) -> Result<Vec<Circle>, Error> {
        sqlx::query_as::<_, Circle>(
            r#"
            SELECT c.circle_id, c.name, c.creator_id, c.is_invitation_circle, c.linked_event_id
            FROM circles c
            JOIN event_circles ec ON ec.circle_id = c.circle_id
            WHERE ec.event_id = ?
            ORDER BY c.circle_id
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Snapshot per le regole di `policy::event`
    pub async fn snapshot(&self, event: &Event) -> Result<EventSnapshot, Error> {
        let member_ids: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT m.user_id
            FROM event_circles ec
            JOIN circle_members m ON m.circle_id = ec.circle_id
            WHERE ec.event_id = ?
            "#,
        )
        .bind(&event.event_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(EventSnapshot {
            creator_id: event.creator_id,
            event_shared: event.event_shared,
            circle_member_ids: member_ids.into_iter().collect(),
        })
    }

    pub async fn find_by_invitation_token(&self, token: &str) -> Result<Option<Event>, Error> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events e WHERE e.invitation_token = ?"
        ))
        .bind(token)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Genera (o ruota) il link di invito.
    ///
    /// In un'unica transazione: salva il nuovo token, trova o crea la cerchia
    /// di invito dell'evento, la etichetta con la categoria di default, la
    /// collega all'evento e aggiunge `actor_id` come membro.
    pub async fn generate_invitation(
        &self,
        event: &Event,
        actor_id: &i32,
        token: &str,
    ) -> Result<Circle, Error> {
        let mut tx = self.connection_pool.begin().await?;

        // la prima istruzione scrive: la transazione prende subito il lock di
        // scrittura e le generazioni concorrenti sullo stesso evento si accodano
        let result =
            sqlx::query("UPDATE events SET invitation_token = ?, updated_at = ? WHERE event_id = ?")
                .bind(token)
                .bind(Utc::now())
                .bind(&event.event_id)
                .execute(&mut *tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }

        let circle = ensure_invitation_circle(&mut tx, event, *actor_id).await?;

        tx.commit().await?;
        Ok(circle)
    }

    /// Link attivo dell'evento; ne genera uno solo se manca
    pub async fn share_token(
        &self,
        event: &Event,
        actor_id: &i32,
        fresh_token: &str,
    ) -> Result<(String, Circle), Error> {
        let mut tx = self.connection_pool.begin().await?;

        sqlx::query(
            "UPDATE events SET invitation_token = ?, updated_at = ? WHERE event_id = ? AND invitation_token IS NULL",
        )
        .bind(fresh_token)
        .bind(Utc::now())
        .bind(&event.event_id)
        .execute(&mut *tx)
        .await?;

        let token: Option<String> =
            sqlx::query_scalar("SELECT invitation_token FROM events WHERE event_id = ?")
                .bind(&event.event_id)
                .fetch_one(&mut *tx)
                .await?;
        let token = token.ok_or(Error::RowNotFound)?;

        let circle = ensure_invitation_circle(&mut tx, event, *actor_id).await?;

        tx.commit().await?;
        Ok((token, circle))
    }

    /// Cancella il token; cerchia di invito e membri restano
    pub async fn revoke_invitation(&self, event_id: &str) -> Result<(), Error> {
        sqlx::query("UPDATE events SET invitation_token = NULL, updated_at = ? WHERE event_id = ?")
            .bind(Utc::now())
            .bind(event_id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }

    /// Aggiunge l'utente alla cerchia di invito e registra la partecipazione.
    /// Idempotente: ritorna `false` se l'utente era già membro.
    pub async fn accept_invitation(
        &self,
        event_id: &str,
        circle_id: &i32,
        user_id: &i32,
    ) -> Result<bool, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let joined = sqlx::query("INSERT OR IGNORE INTO circle_members (circle_id, user_id) VALUES (?, ?)")
            .bind(circle_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        sqlx::query(
            "INSERT OR IGNORE INTO event_participations (event_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(event_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(joined)
    }
}

/// Trova o crea la cerchia di invito dell'evento, collegata e con `member_id` tra i membri.
/// Va chiamata dopo una scrittura nella stessa transazione.
pub(crate) async fn ensure_invitation_circle(
    conn: &mut SqliteConnection,
    event: &Event,
    member_id: i32,
) -> Result<Circle, Error> {
    let existing = sqlx::query_as::<_, Circle>(
        r#"
        SELECT circle_id, name, creator_id, is_invitation_circle, linked_event_id
        FROM circles WHERE linked_event_id = ? AND is_invitation_circle = 1
        "#,
    )
    .bind(&event.event_id)
    .fetch_optional(&mut *conn)
    .await?;

    let circle = match existing {
        Some(circle) => circle,
        None => {
            let name = format!("Invitation: {}", event.title);
            let result = sqlx::query(
                "INSERT INTO circles (name, creator_id, is_invitation_circle, linked_event_id) VALUES (?, ?, 1, ?)",
            )
            .bind(&name)
            .bind(member_id)
            .bind(&event.event_id)
            .execute(&mut *conn)
            .await?;
            Circle {
                circle_id: result.last_insert_rowid() as i32,
                name,
                creator_id: Some(member_id),
                is_invitation_circle: true,
                linked_event_id: Some(event.event_id.clone()),
            }
        }
    };

    tag_circle(&mut *conn, circle.circle_id, INVITATION_CATEGORY).await?;

    sqlx::query("INSERT OR IGNORE INTO event_circles (event_id, circle_id) VALUES (?, ?)")
        .bind(&event.event_id)
        .bind(circle.circle_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("INSERT OR IGNORE INTO circle_members (circle_id, user_id) VALUES (?, ?)")
        .bind(circle.circle_id)
        .bind(member_id)
        .execute(&mut *conn)
        .await?;

    Ok(circle)
}

async fn tag_circle(conn: &mut SqliteConnection, circle_id: i32, tag_name: &str) -> Result<(), Error> {
    sqlx::query("INSERT OR IGNORE INTO tags (name) VALUES (?)")
        .bind(tag_name)
        .execute(&mut *conn)
        .await?;
    let tag_id: i32 = sqlx::query_scalar("SELECT tag_id FROM tags WHERE name = ?")
        .bind(tag_name)
        .fetch_one(&mut *conn)
        .await?;
    sqlx::query("INSERT OR IGNORE INTO circle_categories (circle_id, tag_id) VALUES (?, ?)")
        .bind(circle_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn attach_circles(
    conn: &mut SqliteConnection,
    event_id: &str,
    circle_ids: &[i32],
) -> Result<(), Error> {
    for circle_id in circle_ids {
        sqlx::query("INSERT OR IGNORE INTO event_circles (event_id, circle_id) VALUES (?, ?)")
            .bind(event_id)
            .bind(circle_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

impl Create<Event, CreateEventDTO> for EventRepository {
    async fn create(&self, data: &CreateEventDTO) -> Result<Event, Error> {
        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO events
                (event_id, title, description, address_id, start_time, end_time, creator_id,
                 shareable_link, event_shared, invitation_token, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(&data.event_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.address_id)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.creator_id)
        .bind(data.shareable_link)
        .bind(data.event_shared)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        attach_circles(&mut tx, &data.event_id, &data.circle_ids).await?;

        tx.commit().await?;

        Ok(Event {
            event_id: data.event_id.clone(),
            title: data.title.clone(),
            description: data.description.clone(),
            address_id: data.address_id,
            start_time: data.start_time,
            end_time: data.end_time,
            creator_id: data.creator_id,
            shareable_link: data.shareable_link,
            event_shared: data.event_shared,
            invitation_token: None,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Read<Event, String> for EventRepository {
    async fn read(&self, id: &String) -> Result<Option<Event>, Error> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events e WHERE e.event_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

impl Update<Event, UpdateEventDTO, String> for EventRepository {
    /// Applica solo i campi `Some(_)`; chi chiama ha già filtrato i campi
    /// tramite `policy::event::evaluate_update`.
    async fn update(&self, id: &String, data: &UpdateEventDTO) -> Result<Event, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE events SET ");
        let mut separated = query_builder.separated(", ");
        separated.push("updated_at = ");
        separated.push_bind_unseparated(Utc::now());

        if let Some(ref title) = data.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title.clone());
        }
        if let Some(ref description) = data.description {
            // stringa vuota = descrizione rimossa
            separated.push("description = ");
            separated.push_bind_unseparated(
                Some(description.clone()).filter(|d| !d.trim().is_empty()),
            );
        }
        if let Some(address_id) = data.address_id {
            // None = indirizzo rimosso
            separated.push("address_id = ");
            separated.push_bind_unseparated(address_id);
        }
        if let Some(start_time) = data.start_time {
            separated.push("start_time = ");
            separated.push_bind_unseparated(start_time);
        }
        if let Some(end_time) = data.end_time {
            separated.push("end_time = ");
            separated.push_bind_unseparated(end_time);
        }
        if let Some(shareable_link) = data.shareable_link {
            separated.push("shareable_link = ");
            separated.push_bind_unseparated(shareable_link);
            if !shareable_link {
                // disattivare il link chiude anche quello attivo
                separated.push("invitation_token = NULL");
            }
        }
        if let Some(event_shared) = data.event_shared {
            separated.push("event_shared = ");
            separated.push_bind_unseparated(event_shared);
        }

        query_builder.push(" WHERE event_id = ");
        query_builder.push_bind(id.clone());
        let result = query_builder.build().execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }

        if let Some(ref circle_ids) = data.circle_ids {
            // la cerchia di invito resta sempre collegata al suo evento
            sqlx::query(
                r#"
                DELETE FROM event_circles
                WHERE event_id = ?
                  AND circle_id NOT IN (
                      SELECT circle_id FROM circles
                      WHERE is_invitation_circle = 1 AND linked_event_id = ?
                  )
                "#,
            )
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
            attach_circles(&mut tx, id, circle_ids).await?;
        }

        tx.commit().await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<String> for EventRepository {
    /// La cerchia di invito sopravvive con `linked_event_id` a NULL
    async fn delete(&self, id: &String) -> Result<(), Error> {
        sqlx::query("DELETE FROM events WHERE event_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }
}
