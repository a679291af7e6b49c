//! TagRepository - Categorie delle cerchie

use super::{PoolType, ReadMany};
use crate::entities::Tag;
use sqlx::{Error, QueryBuilder, Sqlite};

pub struct TagRepository {
    connection_pool: PoolType,
}

impl TagRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }

    pub async fn list_all(&self) -> Result<Vec<Tag>, Error> {
        sqlx::query_as::<_, Tag>("SELECT tag_id, name FROM tags ORDER BY name")
            .fetch_all(&self.connection_pool)
            .await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, Error> {
        sqlx::query_as::<_, Tag>("SELECT tag_id, name FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// Categorie di una cerchia
    pub async fn for_circle(&self, circle_id: &i32) -> Result<Vec<Tag>, Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.tag_id, t.name FROM tags t
            JOIN circle_categories cc ON cc.tag_id = t.tag_id
            WHERE cc.circle_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(circle_id)
        .fetch_all(&self.connection_pool)
        .await
    }
}

impl ReadMany<Tag, i32> for TagRepository {
    async fn read_many(&self, ids: &[i32]) -> Result<Vec<Tag>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT tag_id, name FROM tags WHERE tag_id IN (");
        let mut separated = query_builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        query_builder
            .build_query_as::<Tag>()
            .fetch_all(&self.connection_pool)
            .await
    }
}
