//! CircleRepository - Repository per cerchie, membri e categorie

use super::{Create, Delete, PoolType, Read, Update};
use crate::dtos::{CreateCircleDTO, UpdateCircleDTO};
use crate::entities::{Circle, User};
use crate::policy::CircleSnapshot;
use sqlx::{Error, QueryBuilder, Sqlite};

const CIRCLE_COLUMNS: &str = "c.circle_id, c.name, c.creator_id, c.is_invitation_circle, c.linked_event_id";

pub struct CircleRepository {
    connection_pool: PoolType,
}

impl CircleRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }

    /// Cerchie in cui l'utente è creatore o membro
    pub async fn list_for_user(&self, user_id: &i32) -> Result<Vec<Circle>, Error> {
        sqlx::query_as::<_, Circle>(&format!(
            r#"
            SELECT DISTINCT {CIRCLE_COLUMNS}
            FROM circles c
            LEFT JOIN circle_members m ON m.circle_id = c.circle_id
            WHERE c.creator_id = ? OR m.user_id = ?
            ORDER BY lower(c.name)
            "#
        ))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn member_ids(&self, circle_id: &i32) -> Result<Vec<i32>, Error> {
        sqlx::query_scalar("SELECT user_id FROM circle_members WHERE circle_id = ? ORDER BY user_id")
            .bind(circle_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    pub async fn members(&self, circle_id: &i32) -> Result<Vec<User>, Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.user_id, u.username, u.email, u.password, u.created_at
            FROM users u
            JOIN circle_members m ON m.user_id = u.user_id
            WHERE m.circle_id = ?
            ORDER BY u.username
            "#,
        )
        .bind(circle_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Membri distinti di più cerchie
    pub async fn members_of_many(&self, circle_ids: &[i32]) -> Result<Vec<User>, Error> {
        if circle_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT DISTINCT u.user_id, u.username, u.email, u.password, u.created_at
            FROM users u
            JOIN circle_members m ON m.user_id = u.user_id
            WHERE m.circle_id IN ("#,
        );
        let mut separated = query_builder.separated(", ");
        for id in circle_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY u.username");

        query_builder
            .build_query_as::<User>()
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Snapshot per le regole di `policy::circle`
    pub async fn snapshot(&self, circle: &Circle) -> Result<CircleSnapshot, Error> {
        let member_ids = self.member_ids(&circle.circle_id).await?;
        Ok(CircleSnapshot {
            creator_id: circle.creator_id,
            member_ids: member_ids.into_iter().collect(),
            is_invitation_circle: circle.is_invitation_circle,
        })
    }

    /// Aggiunge membri, ignorando chi è già presente
    pub async fn add_members(&self, circle_id: &i32, user_ids: &[i32]) -> Result<(), Error> {
        let mut tx = self.connection_pool.begin().await?;
        for user_id in user_ids {
            sqlx::query("INSERT OR IGNORE INTO circle_members (circle_id, user_id) VALUES (?, ?)")
                .bind(circle_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await
    }

    pub async fn remove_members(&self, circle_id: &i32, user_ids: &[i32]) -> Result<(), Error> {
        let mut tx = self.connection_pool.begin().await?;
        for user_id in user_ids {
            sqlx::query("DELETE FROM circle_members WHERE circle_id = ? AND user_id = ?")
                .bind(circle_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await
    }

    pub async fn find_invitation_circle(&self, event_id: &str) -> Result<Option<Circle>, Error> {
        sqlx::query_as::<_, Circle>(&format!(
            "SELECT {CIRCLE_COLUMNS} FROM circles c WHERE c.linked_event_id = ? AND c.is_invitation_circle = 1"
        ))
        .bind(event_id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

impl Create<Circle, CreateCircleDTO> for CircleRepository {
    /// Inserisce cerchia, membri (creatore incluso) e categorie in una transazione
    async fn create(&self, data: &CreateCircleDTO) -> Result<Circle, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO circles (name, creator_id, is_invitation_circle, linked_event_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&data.name)
        .bind(data.creator_id)
        .bind(data.is_invitation_circle)
        .bind(&data.linked_event_id)
        .execute(&mut *tx)
        .await?;
        let circle_id = result.last_insert_rowid() as i32;

        let members = std::iter::once(&data.creator_id).chain(data.member_ids.iter());
        for user_id in members {
            sqlx::query("INSERT OR IGNORE INTO circle_members (circle_id, user_id) VALUES (?, ?)")
                .bind(circle_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        for tag_id in &data.category_ids {
            sqlx::query("INSERT OR IGNORE INTO circle_categories (circle_id, tag_id) VALUES (?, ?)")
                .bind(circle_id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Circle {
            circle_id,
            name: data.name.clone(),
            creator_id: Some(data.creator_id),
            is_invitation_circle: data.is_invitation_circle,
            linked_event_id: data.linked_event_id.clone(),
        })
    }
}

impl Read<Circle, i32> for CircleRepository {
    async fn read(&self, id: &i32) -> Result<Option<Circle>, Error> {
        sqlx::query_as::<_, Circle>(&format!(
            "SELECT {CIRCLE_COLUMNS} FROM circles c WHERE c.circle_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

impl Update<Circle, UpdateCircleDTO, i32> for CircleRepository {
    async fn update(&self, id: &i32, data: &UpdateCircleDTO) -> Result<Circle, Error> {
        let mut tx = self.connection_pool.begin().await?;

        if let Some(ref name) = data.name {
            let result = sqlx::query("UPDATE circles SET name = ? WHERE circle_id = ?")
                .bind(name)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(Error::RowNotFound);
            }
        }

        if let Some(ref category_ids) = data.category_ids {
            sqlx::query("DELETE FROM circle_categories WHERE circle_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for tag_id in category_ids {
                sqlx::query("INSERT OR IGNORE INTO circle_categories (circle_id, tag_id) VALUES (?, ?)")
                    .bind(id)
                    .bind(tag_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i32> for CircleRepository {
    /// Membri, categorie e collegamenti agli eventi vengono rimossi in cascata
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM circles WHERE circle_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }
}
