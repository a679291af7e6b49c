//! Circle DTOs

use crate::dtos::UserDTO;
use crate::entities::{BusySlot, Circle, Tag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TagDTO {
    pub id: i32,
    pub name: String,
}

impl From<Tag> for TagDTO {
    fn from(value: Tag) -> Self {
        Self {
            id: value.tag_id,
            name: value.name,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CircleDTO {
    pub id: i32,
    pub name: String,
    pub creator_id: Option<i32>,
    pub is_invitation_circle: bool,
    pub linked_event_id: Option<String>,
    pub categories: Vec<TagDTO>,
    pub members: Vec<UserDTO>,
}

impl CircleDTO {
    pub fn assemble(circle: Circle, categories: Vec<Tag>, members: Vec<UserDTO>) -> Self {
        Self {
            id: circle.circle_id,
            name: circle.name,
            creator_id: circle.creator_id,
            is_invitation_circle: circle.is_invitation_circle,
            linked_event_id: circle.linked_event_id,
            categories: categories.into_iter().map(TagDTO::from).collect(),
            members,
        }
    }
}

/// Body di POST /circles
#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct CreateCircleRequestDTO {
    #[validate(length(min = 1, max = 100, message = "Circle name must be between 1 and 100 characters"))]
    pub name: String,
    #[serde(default)]
    pub category_ids: Vec<i32>,
    #[serde(default)]
    pub member_ids: Vec<i32>,
}

/// DTO per creare una cerchia (senza circle_id)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateCircleDTO {
    pub name: String,
    pub creator_id: i32,
    pub category_ids: Vec<i32>,
    /// Il creatore viene aggiunto comunque
    pub member_ids: Vec<i32>,
    pub is_invitation_circle: bool,
    pub linked_event_id: Option<String>,
}

/// DTO per aggiornare una cerchia (solo i campi `Some(_)` vengono modificati)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateCircleDTO {
    #[validate(length(min = 1, max = 100, message = "Circle name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    /// Sostituisce l'intero insieme di categorie
    pub category_ids: Option<Vec<i32>>,
}

#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct CircleMembersDTO {
    #[validate(length(min = 1, message = "At least one user is required"))]
    pub user_ids: Vec<i32>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MultiCircleMembersDTO {
    pub circle_ids: Vec<i32>,
}

/// Fascia occupata da almeno un membro delle cerchie scelte, senza dettagli dell'evento
#[derive(Serialize, Deserialize, Debug)]
pub struct GreyEventDTO {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub busy_members: i64,
}

impl From<BusySlot> for GreyEventDTO {
    fn from(value: BusySlot) -> Self {
        Self {
            start_time: value.start_time,
            end_time: value.end_time,
            busy_members: value.busy_members,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GreyEventsDTO {
    pub grey_events: Vec<GreyEventDTO>,
    pub total_members: usize,
}
