use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Serialize, Deserialize, Debug, Clone, FromRow, PartialEq)]
pub struct Tag {
    pub tag_id: i32,
    pub name: String,
}
