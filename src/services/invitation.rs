//! Invitation services - Link di invito e inviti per email
//!
//! Il link vive in tre operazioni: generazione (o rotazione) del token,
//! revoca e accettazione. La cerchia di invito creata alla prima generazione
//! non viene mai eliminata dalla revoca.
//!
//! Gli inviti per email hanno un token uuid personale: chi lo accetta entra
//! nella stessa cerchia di invito del link.

use super::event::load_event;
use crate::core::mailer::OutgoingMail;
use crate::core::{AppError, AppState};
use crate::dtos::{
    AcceptInvitationDTO, AcceptedInvitationDTO, CreateEventInvitationDTO,
    CreateEventInvitationRequestDTO, EventInvitationDTO, InvitationLinkDTO, ShareTokenRequestDTO,
    VerifyInvitationDTO, VerifyInvitationQuery,
};
use crate::entities::{Event, EventInvitation, User};
use crate::policy::{InviteState, invitation};
use crate::repositories::{Create, Delete, Read};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

fn invitation_link(frontend_url: &str, event_id: &str, token: &str) -> String {
    format!(
        "{}/event/{}?invite={}",
        frontend_url.trim_end_matches('/'),
        event_id,
        token
    )
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, event_id = %event_id))]
pub async fn generate_invitation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<String>,
) -> Result<Json<InvitationLinkDTO>, AppError> {
    debug!("Generating invitation link");
    // 1. Verificare che l'utente possa gestire gli inviti (creatore o membro di un evento condiviso)
    // 2. L'evento deve permettere la condivisione tramite link
    // 3. Generare il token e, in una transazione, trovare o creare la cerchia di invito,
    //    collegarla all'evento, aggiungere l'utente come membro e salvare il token
    let (event, snapshot) = load_event(&state, &event_id).await?;
    let role = invitation::can_manage(current_user.user_id, &snapshot)
        .inspect_err(|denial| warn!("Invitation management denied: {}", denial))?;

    if !event.shareable_link {
        return Err(AppError::bad_request(
            "Invitation links are disabled for this event",
        ));
    }

    let previous = InviteState::of(event.invitation_token.as_deref());
    let token = invitation::generate_token();
    let circle = state
        .event
        .generate_invitation(&event, &current_user.user_id, &token)
        .await?;

    info!(
        circle_id = circle.circle_id,
        role = ?role,
        previous = ?previous,
        "Invitation link generated"
    );
    Ok(Json(InvitationLinkDTO {
        invitation_link: invitation_link(&state.config.frontend_url, &event.event_id, &token),
        event_id: event.event_id,
        token,
        circle_id: circle.circle_id,
    }))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, event_id = %event_id))]
pub async fn revoke_invitation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let (event, snapshot) = load_event(&state, &event_id).await?;
    invitation::can_manage(current_user.user_id, &snapshot)?;

    if InviteState::of(event.invitation_token.as_deref()) == InviteState::NoToken {
        debug!("No active invitation link, nothing to revoke");
        return Ok(StatusCode::NO_CONTENT);
    }

    state.event.revoke_invitation(&event.event_id).await?;
    info!("Invitation link revoked");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user, query), fields(user_id = %current_user.user_id))]
pub async fn verify_invitation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(query): Query<VerifyInvitationQuery>,
) -> Result<Json<VerifyInvitationDTO>, AppError> {
    let event = match state.event.find_by_invitation_token(&query.token).await? {
        Some(event) if event.shareable_link => Some(event),
        Some(_) => None,
        None => match state.event_invitation.find_by_token(&query.token).await? {
            Some(sent) => state.event.read(&sent.event_id).await?,
            None => None,
        },
    };
    let Some(event) = event else {
        debug!("Token does not match any live invitation");
        return Ok(Json(VerifyInvitationDTO::default()));
    };

    Ok(Json(VerifyInvitationDTO {
        valid: true,
        event_id: Some(event.event_id),
        title: Some(event.title),
    }))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, event_id = %body.event_id))]
pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<AcceptInvitationDTO>,
) -> Result<Json<AcceptedInvitationDTO>, AppError> {
    debug!("Accepting invitation");
    let event_id = body.event_id.to_string();
    let event = state
        .event
        .read(&event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event not found"))?;

    if let Some(sent) = state
        .event_invitation
        .find_by_token(&body.token)
        .await?
        .filter(|sent| sent.event_id == event_id)
    {
        return accept_email_invitation(&state, &current_user, sent, event).await;
    }

    let circle = state.circle.find_invitation_circle(&event_id).await?;
    invitation::check_accept(
        &body.token,
        event.invitation_token.as_deref(),
        circle.is_some(),
        event.shareable_link,
    )
    .inspect_err(|denial| warn!("Invitation rejected: {}", denial))?;
    let circle = circle.ok_or_else(|| AppError::not_found("This event has no invitation link."))?;

    let joined = state
        .event
        .accept_invitation(&event_id, &circle.circle_id, &current_user.user_id)
        .await?;

    info!(joined, circle_id = circle.circle_id, "Invitation accepted");
    Ok(Json(AcceptedInvitationDTO {
        event_id,
        circle_id: circle.circle_id,
    }))
}

/// Accettazione con il token personale di un invito per email
async fn accept_email_invitation(
    state: &AppState,
    current_user: &User,
    sent: EventInvitation,
    event: Event,
) -> Result<Json<AcceptedInvitationDTO>, AppError> {
    invitation::check_email_recipient(&sent.email, &current_user.email)
        .inspect_err(|denial| warn!("Email invitation rejected: {}", denial))?;

    let circle = state
        .event_invitation
        .accept(&sent, &event, &current_user.user_id)
        .await?;

    info!(
        invitation_id = sent.invitation_id,
        circle_id = circle.circle_id,
        "Email invitation accepted"
    );
    Ok(Json(AcceptedInvitationDTO {
        event_id: event.event_id,
        circle_id: circle.circle_id,
    }))
}

/// Link attivo dell'evento, generato solo se non ne esiste già uno
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, event_id = %body.event))]
pub async fn event_share_token(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<ShareTokenRequestDTO>,
) -> Result<Json<InvitationLinkDTO>, AppError> {
    let (event, snapshot) = load_event(&state, &body.event.to_string()).await?;
    invitation::can_manage(current_user.user_id, &snapshot)
        .inspect_err(|denial| warn!("Share token denied: {}", denial))?;

    if !event.shareable_link {
        return Err(AppError::bad_request(
            "Invitation links are disabled for this event",
        ));
    }

    let (token, circle) = state
        .event
        .share_token(&event, &current_user.user_id, &invitation::generate_token())
        .await?;

    debug!(circle_id = circle.circle_id, "Share token ready");
    Ok(Json(InvitationLinkDTO {
        invitation_link: invitation_link(&state.config.frontend_url, &event.event_id, &token),
        event_id: event.event_id,
        token,
        circle_id: circle.circle_id,
    }))
}

// ============================================================
// Inviti per email
// ============================================================

fn invitation_dto(state: &AppState, sent: EventInvitation) -> EventInvitationDTO {
    let link = invitation_link(&state.config.frontend_url, &sent.event_id, &sent.token);
    EventInvitationDTO::new(sent, link)
}

/// Legge un invito visibile all'utente: destinatario oppure gestore dell'evento.
/// Ritorna anche se l'utente può gestirlo.
async fn load_visible_invitation(
    state: &AppState,
    current_user: &User,
    invitation_id: i32,
) -> Result<(EventInvitation, bool), AppError> {
    let sent = state
        .event_invitation
        .read(&invitation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Invitation not found"))?;

    let (_, snapshot) = load_event(state, &sent.event_id).await?;
    let manages = invitation::can_manage(current_user.user_id, &snapshot).is_ok();
    let recipient = invitation::check_email_recipient(&sent.email, &current_user.email).is_ok();
    if !manages && !recipient {
        debug!("Invitation {} is not visible to the user", invitation_id);
        return Err(AppError::not_found("Invitation not found"));
    }
    Ok((sent, manages))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, event_id = %body.event))]
pub async fn create_event_invitation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateEventInvitationRequestDTO>,
) -> Result<(StatusCode, Json<EventInvitationDTO>), AppError> {
    debug!("Creating email invitation");
    // 1. Validare l'indirizzo email
    // 2. Verificare che l'utente possa gestire gli inviti dell'evento
    // 3. Salvare l'invito con un token uuid e spedire il link per email
    body.validate()?;
    let (event, snapshot) = load_event(&state, &body.event.to_string()).await?;
    invitation::can_manage(current_user.user_id, &snapshot)
        .inspect_err(|denial| warn!("Email invitation denied: {}", denial))?;

    let sent = state
        .event_invitation
        .create(&CreateEventInvitationDTO {
            event_id: event.event_id.clone(),
            email: body.email,
            token: Uuid::new_v4().to_string(),
            invited_by: current_user.user_id,
        })
        .await?;

    let dto = invitation_dto(&state, sent);
    let mail = OutgoingMail {
        to: dto.email.clone(),
        subject: format!("You're invited to {}", event.title),
        body: format!(
            "Hi,\n\n{} invited you to \"{}\" on {}.\n\nOpen the link below to join:\n\n{}\n",
            current_user.username,
            event.title,
            event.start_time.format("%Y-%m-%d %H:%M UTC"),
            dto.invitation_link
        ),
    };
    if let Err(e) = state.mailer.send(mail).await {
        // l'invito resta salvato e il link è nella risposta
        error!("Failed to send invitation mail: {}", e);
    }

    info!(invitation_id = dto.id, "Email invitation created");
    Ok((StatusCode::CREATED, Json(dto)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_event_invitations(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<EventInvitationDTO>>, AppError> {
    let invitations = state
        .event_invitation
        .list_for_user(&current_user.user_id, &current_user.email)
        .await?
        .into_iter()
        .map(|sent| invitation_dto(&state, sent))
        .collect();
    Ok(Json(invitations))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, invitation_id = %invitation_id))]
pub async fn get_event_invitation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(invitation_id): Path<i32>,
) -> Result<Json<EventInvitationDTO>, AppError> {
    let (sent, _) = load_visible_invitation(&state, &current_user, invitation_id).await?;
    Ok(Json(invitation_dto(&state, sent)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, invitation_id = %invitation_id))]
pub async fn delete_event_invitation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(invitation_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let (sent, manages) = load_visible_invitation(&state, &current_user, invitation_id).await?;
    if !manages {
        warn!("Recipient tried to delete invitation {}", invitation_id);
        return Err(AppError::forbidden(
            "Only who manages the event can delete its invitations",
        ));
    }

    state.event_invitation.delete(&sent.invitation_id).await?;
    info!("Email invitation deleted");
    Ok(StatusCode::NO_CONTENT)
}
