//! Invitation DTOs - Link di invito e inviti per email

use crate::entities::EventInvitation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Deserialize, Debug)]
pub struct InvitationLinkDTO {
    pub event_id: String,
    pub token: String,
    pub circle_id: i32,
    pub invitation_link: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AcceptInvitationDTO {
    pub event_id: Uuid,
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AcceptedInvitationDTO {
    pub event_id: String,
    pub circle_id: i32,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct VerifyInvitationDTO {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Body di POST /invitations: invito per email a un evento
#[derive(Serialize, Deserialize, Debug, Validate)]
pub struct CreateEventInvitationRequestDTO {
    pub event: Uuid,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// DTO per salvare un invito (token generato lato server)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateEventInvitationDTO {
    pub event_id: String,
    pub email: String,
    pub token: String,
    pub invited_by: i32,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct EventInvitationDTO {
    pub id: i32,
    pub event: String,
    pub email: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub accepted: bool,
    pub accepted_at: Option<DateTime<Utc>>,
    pub invitation_link: String,
}

impl EventInvitationDTO {
    pub fn new(invitation: EventInvitation, invitation_link: String) -> Self {
        Self {
            id: invitation.invitation_id,
            event: invitation.event_id,
            email: invitation.email,
            token: invitation.token,
            created_at: invitation.created_at,
            accepted: invitation.accepted,
            accepted_at: invitation.accepted_at,
            invitation_link,
        }
    }
}

/// Body di POST /event-share-token
#[derive(Serialize, Deserialize, Debug)]
pub struct ShareTokenRequestDTO {
    pub event: Uuid,
}
