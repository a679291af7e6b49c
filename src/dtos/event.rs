//! Event DTOs

use crate::dtos::{AddressDTO, TagDTO};
use crate::entities::{Circle, Event};
use crate::policy::{EventChangeSet, EventField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CircleSummaryDTO {
    pub id: i32,
    pub name: String,
    pub is_invitation_circle: bool,
    pub categories: Vec<TagDTO>,
}

impl CircleSummaryDTO {
    pub fn new(circle: Circle, categories: Vec<TagDTO>) -> Self {
        Self {
            id: circle.circle_id,
            name: circle.name,
            is_invitation_circle: circle.is_invitation_circle,
            categories,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct EventDTO {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub address: Option<AddressDTO>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub creator: i32,
    pub circles: Vec<CircleSummaryDTO>,
    pub shareable_link: bool,
    pub event_shared: bool,
    /// Presente solo per chi può gestire il link di invito
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_token: Option<String>,
    pub participants_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventDTO {
    pub fn assemble(
        event: Event,
        address: Option<AddressDTO>,
        circles: Vec<CircleSummaryDTO>,
        participants_count: i64,
        show_token: bool,
    ) -> Self {
        Self {
            id: event.event_id,
            title: event.title,
            description: event.description,
            address,
            start_time: event.start_time,
            end_time: event.end_time,
            creator: event.creator_id,
            circles,
            shareable_link: event.shareable_link,
            event_shared: event.event_shared,
            invitation_token: if show_token { event.invitation_token } else { None },
            participants_count,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// Body di POST /event
#[derive(Serialize, Deserialize, Debug, Validate)]
#[validate(schema(function = "validate_create_dates", skip_on_field_errors = false))]
pub struct CreateEventRequestDTO {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub address_id: Option<i32>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub circle_ids: Vec<i32>,
    #[serde(default = "default_true")]
    pub shareable_link: bool,
    #[serde(default)]
    pub event_shared: bool,
}

fn default_true() -> bool {
    true
}

fn validate_create_dates(dto: &CreateEventRequestDTO) -> Result<(), ValidationError> {
    check_dates(Some(dto.start_time), dto.end_time)
}

fn check_dates(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ValidationError::new("end_time_before_start_time"));
        }
    }
    Ok(())
}

/// DTO per creare un evento (senza event_id, generato lato server)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateEventDTO {
    pub event_id: String,
    pub title: String,
    pub description: Option<String>,
    pub address_id: Option<i32>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub creator_id: i32,
    pub circle_ids: Vec<i32>,
    pub shareable_link: bool,
    pub event_shared: bool,
}

/// DTO per aggiornare un evento (solo i campi `Some(_)` vengono modificati)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
#[validate(schema(function = "validate_update_dates", skip_on_field_errors = false))]
pub struct UpdateEventDTO {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` (JSON `null`) rimuove l'indirizzo, campo assente = invariato
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub address_id: Option<Option<i32>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Sostituisce le cerchie associate (la cerchia di invito resta sempre collegata)
    pub circle_ids: Option<Vec<i32>>,
    pub shareable_link: Option<bool>,
    pub event_shared: Option<bool>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i32>::deserialize(deserializer).map(Some)
}

fn validate_update_dates(dto: &UpdateEventDTO) -> Result<(), ValidationError> {
    check_dates(dto.start_time, dto.end_time)
}

impl UpdateEventDTO {
    /// Campi che la richiesta vuole modificare
    pub fn change_set(&self) -> EventChangeSet {
        let mut changes = EventChangeSet::new();
        if self.title.is_some() {
            changes.insert(EventField::Title);
        }
        if self.description.is_some() {
            changes.insert(EventField::Description);
        }
        if self.address_id.is_some() {
            changes.insert(EventField::Address);
        }
        if self.start_time.is_some() {
            changes.insert(EventField::StartTime);
        }
        if self.end_time.is_some() {
            changes.insert(EventField::EndTime);
        }
        if self.circle_ids.is_some() {
            changes.insert(EventField::Circles);
        }
        if self.shareable_link.is_some() {
            changes.insert(EventField::ShareableLink);
        }
        if let Some(shared) = self.event_shared {
            changes.set_sharing(shared);
        }
        changes
    }

    /// Tiene solo i campi elencati, azzerando gli altri
    pub fn retain(self, permitted: &std::collections::BTreeSet<EventField>) -> Self {
        let keep = |field: EventField| permitted.contains(&field);
        Self {
            title: self.title.filter(|_| keep(EventField::Title)),
            description: self.description.filter(|_| keep(EventField::Description)),
            address_id: self.address_id.filter(|_| keep(EventField::Address)),
            start_time: self.start_time.filter(|_| keep(EventField::StartTime)),
            end_time: self.end_time.filter(|_| keep(EventField::EndTime)),
            circle_ids: self.circle_ids.filter(|_| keep(EventField::Circles)),
            shareable_link: self.shareable_link.filter(|_| keep(EventField::ShareableLink)),
            event_shared: self.event_shared.filter(|_| keep(EventField::EventShared)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.change_set().is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct MarkersQueryDTO {
    /// Filtra per categorie delle cerchie associate
    #[serde(default)]
    pub tags: Vec<i32>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MarkerDTO {
    pub id: String,
    pub title: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MarkersDTO {
    pub private_markers: Vec<MarkerDTO>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ParticipationDTO {
    pub event_id: String,
    pub participating: bool,
    pub participants_count: i64,
}

/// Vista pubblica di un evento, senza dati personali
#[derive(Serialize, Deserialize, Debug)]
pub struct PublicEventDTO {
    pub id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub city: Option<String>,
    pub invited: bool,
}
