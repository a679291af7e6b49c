//! Event services - Eventi, partecipazioni e marker sulla mappa

use crate::core::{AppError, AppState};
use crate::dtos::{
    AddressDTO, CircleSummaryDTO, CreateEventDTO, CreateEventRequestDTO, EventDTO, MarkerDTO,
    MarkersDTO, MarkersQueryDTO, ParticipationDTO, PublicEventDTO, PublicEventQuery, TagDTO,
    UpdateEventDTO, UserDTO,
};
use crate::entities::{Event, User};
use crate::policy::circle as circle_policy;
use crate::policy::event as event_policy;
use crate::policy::{CircleAction, EventSnapshot, invitation};
use crate::repositories::{Create, Delete, Read, Update};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Legge l'evento insieme allo snapshot per le regole di permesso
pub(crate) async fn load_event(
    state: &AppState,
    event_id: &str,
) -> Result<(Event, EventSnapshot), AppError> {
    let event = state
        .event
        .read(&event_id.to_string())
        .await?
        .ok_or_else(|| AppError::not_found("Event not found"))?;
    let snapshot = state.event.snapshot(&event).await?;
    Ok((event, snapshot))
}

/// Costruisce il DTO completo; il token di invito è visibile solo a chi può gestirlo
pub(crate) async fn event_dto(
    state: &AppState,
    event: Event,
    snapshot: &EventSnapshot,
    viewer_id: i32,
) -> Result<EventDTO, AppError> {
    let address = match event.address_id {
        Some(address_id) => state.address.read(&address_id).await?.map(AddressDTO::from),
        None => None,
    };

    let mut circles = Vec::new();
    for circle in state.event.circles_of(&event.event_id).await? {
        let categories = state
            .tag
            .for_circle(&circle.circle_id)
            .await?
            .into_iter()
            .map(TagDTO::from)
            .collect();
        circles.push(CircleSummaryDTO::new(circle, categories));
    }

    let participants_count = state.participation.count(&event.event_id).await?;
    let show_token = invitation::can_manage(viewer_id, snapshot).is_ok();

    Ok(EventDTO::assemble(
        event,
        address,
        circles,
        participants_count,
        show_token,
    ))
}

/// Le cerchie associate a un evento devono essere visibili a chi lo modifica
async fn ensure_circles_visible(
    state: &AppState,
    user_id: i32,
    circle_ids: &[i32],
) -> Result<(), AppError> {
    for circle_id in circle_ids {
        let circle = state
            .circle
            .read(circle_id)
            .await?
            .ok_or_else(|| AppError::bad_request("Unknown circle"))?;
        let snapshot = state.circle.snapshot(&circle).await?;
        circle_policy::evaluate(user_id, &snapshot, CircleAction::View).map_err(|_| {
            warn!("Circle {} is not visible to user {}", circle_id, user_id);
            AppError::forbidden("You can only share events with your own circles")
        })?;
    }
    Ok(())
}

/// Un evento può usare solo uno degli indirizzi salvati dall'utente
async fn ensure_address_owned(
    state: &AppState,
    user_id: i32,
    address_id: Option<i32>,
) -> Result<(), AppError> {
    if let Some(address_id) = address_id {
        if state.address.read_owned(&user_id, &address_id).await?.is_none() {
            warn!("Address {} is not owned by user {}", address_id, user_id);
            return Err(AppError::bad_request("Unknown address"));
        }
    }
    Ok(())
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<EventDTO>>, AppError> {
    debug!("Listing events visible to user");
    let events = state
        .event
        .list_visible_for_user(&current_user.user_id, &[])
        .await?;

    let dtos = try_join_all(events.into_iter().map(|event| {
        let state = state.clone();
        let viewer_id = current_user.user_id;
        async move {
            let snapshot = state.event.snapshot(&event).await?;
            event_dto(&state, event, &snapshot, viewer_id).await
        }
    }))
    .await?;

    info!("Successfully retrieved {} events", dtos.len());
    Ok(Json(dtos))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateEventRequestDTO>,
) -> Result<(StatusCode, Json<EventDTO>), AppError> {
    debug!("Creating new event");
    // 1. Validare titolo e date (fine non prima dell'inizio)
    // 2. Verificare che l'indirizzo sia dell'utente e che le cerchie gli siano visibili
    // 3. Salvare evento e associazioni alle cerchie in una transazione
    body.validate()?;
    ensure_address_owned(&state, current_user.user_id, body.address_id).await?;
    ensure_circles_visible(&state, current_user.user_id, &body.circle_ids).await?;

    let created = state
        .event
        .create(&CreateEventDTO {
            event_id: Uuid::new_v4().to_string(),
            title: body.title,
            description: body.description.filter(|d| !d.trim().is_empty()),
            address_id: body.address_id,
            start_time: body.start_time,
            end_time: body.end_time,
            creator_id: current_user.user_id,
            circle_ids: body.circle_ids,
            shareable_link: body.shareable_link,
            event_shared: body.event_shared,
        })
        .await?;

    info!(event_id = %created.event_id, "Event created");
    let snapshot = state.event.snapshot(&created).await?;
    let dto = event_dto(&state, created, &snapshot, current_user.user_id).await?;
    Ok((StatusCode::CREATED, Json(dto)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, event_id = %event_id))]
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<String>,
) -> Result<Json<EventDTO>, AppError> {
    let (event, snapshot) = load_event(&state, &event_id).await?;
    event_policy::can_view(current_user.user_id, &snapshot)?;
    Ok(Json(
        event_dto(&state, event, &snapshot, current_user.user_id).await?,
    ))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, event_id = %event_id))]
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<String>,
    Json(body): Json<UpdateEventDTO>,
) -> Result<Json<EventDTO>, AppError> {
    debug!("Updating event");
    // 1. Validare il DTO
    // 2. Valutare la richiesta con le regole di permesso: chi non è il creatore
    //    riceve solo il sottoinsieme di campi permesso
    // 3. Verificare le date risultanti, l'indirizzo e le cerchie
    // 4. Applicare le modifiche e ritornare l'evento aggiornato
    body.validate()?;

    let (event, snapshot) = load_event(&state, &event_id).await?;
    let changes = body.change_set();
    if changes.is_empty() {
        event_policy::can_view(current_user.user_id, &snapshot)?;
        debug!("Empty update, nothing to apply");
        return Ok(Json(
            event_dto(&state, event, &snapshot, current_user.user_id).await?,
        ));
    }

    let decision = event_policy::evaluate_update(current_user.user_id, &snapshot, &changes)
        .inspect_err(|denial| warn!("Event update denied: {}", denial))?;
    if !decision.dropped.is_empty() {
        warn!(
            "Dropping fields reserved to the creator: {:?}",
            decision.dropped
        );
    }

    let update = body.retain(&decision.permitted);

    let start = update.start_time.unwrap_or(event.start_time);
    let end = update.end_time.or(event.end_time);
    if end.is_some_and(|end| end < start) {
        return Err(AppError::bad_request("End time cannot be before start time"));
    }
    ensure_address_owned(&state, current_user.user_id, update.address_id.flatten()).await?;
    if let Some(ref circle_ids) = update.circle_ids {
        ensure_circles_visible(&state, current_user.user_id, circle_ids).await?;
    }

    let updated = state.event.update(&event_id, &update).await?;
    info!(role = ?decision.role, "Event updated");

    let snapshot = state.event.snapshot(&updated).await?;
    Ok(Json(
        event_dto(&state, updated, &snapshot, current_user.user_id).await?,
    ))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, event_id = %event_id))]
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let (_, snapshot) = load_event(&state, &event_id).await?;
    event_policy::can_delete(current_user.user_id, &snapshot)?;

    state.event.delete(&event_id).await?;
    info!("Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, event_id = %event_id))]
pub async fn list_participants(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<UserDTO>>, AppError> {
    let (_, snapshot) = load_event(&state, &event_id).await?;
    event_policy::can_view(current_user.user_id, &snapshot)?;

    let participants = state
        .participation
        .participants(&event_id)
        .await?
        .into_iter()
        .map(UserDTO::from)
        .collect();
    Ok(Json(participants))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, event_id = %event_id))]
pub async fn toggle_participation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<String>,
) -> Result<Json<ParticipationDTO>, AppError> {
    let (_, snapshot) = load_event(&state, &event_id).await?;
    event_policy::can_view(current_user.user_id, &snapshot)?;

    let participating = match state
        .participation
        .find(&event_id, &current_user.user_id)
        .await?
    {
        Some(_) => {
            state
                .participation
                .remove(&event_id, &current_user.user_id)
                .await?;
            false
        }
        None => {
            state
                .participation
                .add(&event_id, &current_user.user_id)
                .await?;
            true
        }
    };

    let participants_count = state.participation.count(&event_id).await?;
    info!(participating, "Participation toggled");
    Ok(Json(ParticipationDTO {
        event_id,
        participating,
        participants_count,
    }))
}

/// Eventi visibili con coordinate, filtrabili per categoria delle cerchie
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn markers(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<MarkersQueryDTO>,
) -> Result<Json<MarkersDTO>, AppError> {
    let events = state
        .event
        .list_visible_for_user(&current_user.user_id, &body.tags)
        .await?;

    let mut private_markers = Vec::with_capacity(events.len());
    for event in events {
        let address = match event.address_id {
            Some(address_id) => state.address.read(&address_id).await?,
            None => None,
        };
        private_markers.push(MarkerDTO {
            id: event.event_id,
            title: event.title,
            lat: address.as_ref().map(|a| a.latitude),
            lng: address.as_ref().map(|a| a.longitude),
            description: event.description,
            start_date: event.start_time,
            end_date: event.end_time,
        });
    }

    debug!("Returning {} markers", private_markers.len());
    Ok(Json(MarkersDTO { private_markers }))
}

/// Vista pubblica di un evento aperto da un link di invito, senza autenticazione
#[instrument(skip(state, query), fields(event_id = %event_id))]
pub async fn public_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Query(query): Query<PublicEventQuery>,
) -> Result<Json<PublicEventDTO>, AppError> {
    let event = state
        .event
        .read(&event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event not found"))?;

    let presented = query.invite.as_deref().unwrap_or_default();
    if let Err(denial) = invitation::check_accept(
        presented,
        event.invitation_token.as_deref(),
        true,
        event.shareable_link,
    ) {
        warn!("Public view refused: {}", denial);
        return Err(AppError::forbidden("This event is private")
            .with_details("A valid invitation link is required to view this event"));
    }

    let city = match event.address_id {
        Some(address_id) => state
            .address
            .read(&address_id)
            .await?
            .and_then(|address| address.city),
        None => None,
    };

    Ok(Json(PublicEventDTO {
        id: event.event_id,
        title: event.title,
        start_time: event.start_time,
        end_time: event.end_time,
        city,
        invited: true,
    }))
}
