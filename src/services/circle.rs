//! Circle services - Gestione cerchie, membri e categorie

use crate::core::{AppError, AppState};
use crate::dtos::{
    CircleDTO, CircleMembersDTO, CreateCircleDTO, CreateCircleRequestDTO, GreyEventDTO,
    GreyEventsDTO, GreyEventsQuery, MultiCircleMembersDTO, TagDTO, UpdateCircleDTO, UserDTO,
};
use crate::entities::{Circle, User};
use crate::policy::CircleAction;
use crate::policy::circle as circle_policy;
use crate::repositories::{Create, Delete, Read, ReadMany, Update};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use futures::future::try_join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Carica categorie e membri e costruisce il DTO
async fn circle_dto(state: &AppState, circle: Circle) -> Result<CircleDTO, AppError> {
    let categories = state.tag.for_circle(&circle.circle_id).await?;
    let members = state
        .circle
        .members(&circle.circle_id)
        .await?
        .into_iter()
        .map(UserDTO::from)
        .collect();
    Ok(CircleDTO::assemble(circle, categories, members))
}

/// Legge la cerchia e verifica l'azione richiesta
async fn load_authorized(
    state: &AppState,
    user_id: i32,
    circle_id: i32,
    action: CircleAction<'_>,
) -> Result<Circle, AppError> {
    let circle = state
        .circle
        .read(&circle_id)
        .await?
        .ok_or_else(|| AppError::not_found("Circle not found"))?;
    let snapshot = state.circle.snapshot(&circle).await?;
    circle_policy::evaluate(user_id, &snapshot, action).inspect_err(|denial| {
        warn!("Circle action {:?} denied: {}", action, denial);
    })?;
    Ok(circle)
}

/// Utenti e categorie referenziati devono esistere
async fn ensure_known(state: &AppState, user_ids: &[i32], tag_ids: &[i32]) -> Result<(), AppError> {
    let mut wanted = user_ids.to_vec();
    wanted.sort_unstable();
    wanted.dedup();
    if state.user.read_many(&wanted).await?.len() != wanted.len() {
        return Err(AppError::bad_request("Unknown user"));
    }

    let mut wanted = tag_ids.to_vec();
    wanted.sort_unstable();
    wanted.dedup();
    if state.tag.read_many(&wanted).await?.len() != wanted.len() {
        return Err(AppError::bad_request("Unknown category"));
    }
    Ok(())
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_circles(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<CircleDTO>>, AppError> {
    debug!("Listing circles for user");
    let circles = state.circle.list_for_user(&current_user.user_id).await?;

    let dtos = try_join_all(circles.into_iter().map(|c| {
        let state = state.clone();
        async move { circle_dto(&state, c).await }
    }))
    .await?;

    info!("Successfully retrieved {} circles", dtos.len());
    Ok(Json(dtos))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_circle(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateCircleRequestDTO>,
) -> Result<(StatusCode, Json<CircleDTO>), AppError> {
    debug!("Creating new circle");
    body.validate()?;
    ensure_known(&state, &body.member_ids, &body.category_ids).await?;

    let created = state
        .circle
        .create(&CreateCircleDTO {
            name: body.name,
            creator_id: current_user.user_id,
            category_ids: body.category_ids,
            member_ids: body.member_ids,
            is_invitation_circle: false,
            linked_event_id: None,
        })
        .await?;

    info!(circle_id = created.circle_id, "Circle created");
    Ok((StatusCode::CREATED, Json(circle_dto(&state, created).await?)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, circle_id = %circle_id))]
pub async fn get_circle(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(circle_id): Path<i32>,
) -> Result<Json<CircleDTO>, AppError> {
    let circle =
        load_authorized(&state, current_user.user_id, circle_id, CircleAction::View).await?;
    Ok(Json(circle_dto(&state, circle).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, circle_id = %circle_id))]
pub async fn update_circle(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(circle_id): Path<i32>,
    Json(body): Json<UpdateCircleDTO>,
) -> Result<Json<CircleDTO>, AppError> {
    body.validate()?;
    load_authorized(&state, current_user.user_id, circle_id, CircleAction::Update).await?;
    if let Some(ref category_ids) = body.category_ids {
        ensure_known(&state, &[], category_ids).await?;
    }

    let updated = state.circle.update(&circle_id, &body).await?;
    info!("Circle updated");
    Ok(Json(circle_dto(&state, updated).await?))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, circle_id = %circle_id))]
pub async fn delete_circle(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(circle_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    load_authorized(&state, current_user.user_id, circle_id, CircleAction::Delete).await?;
    state.circle.delete(&circle_id).await?;
    info!("Circle deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, circle_id = %circle_id))]
pub async fn add_members(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(circle_id): Path<i32>,
    Json(body): Json<CircleMembersDTO>,
) -> Result<Json<CircleDTO>, AppError> {
    body.validate()?;
    let circle = load_authorized(
        &state,
        current_user.user_id,
        circle_id,
        CircleAction::AddMembers,
    )
    .await?;
    ensure_known(&state, &body.user_ids, &[]).await?;

    state.circle.add_members(&circle_id, &body.user_ids).await?;
    info!("Added {} members", body.user_ids.len());
    Ok(Json(circle_dto(&state, circle).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, circle_id = %circle_id))]
pub async fn remove_members(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(circle_id): Path<i32>,
    Json(body): Json<CircleMembersDTO>,
) -> Result<Json<CircleDTO>, AppError> {
    body.validate()?;
    let circle = load_authorized(
        &state,
        current_user.user_id,
        circle_id,
        CircleAction::RemoveMembers(&body.user_ids),
    )
    .await?;

    state
        .circle
        .remove_members(&circle_id, &body.user_ids)
        .await?;
    info!("Removed {} members", body.user_ids.len());
    Ok(Json(circle_dto(&state, circle).await?))
}

/// Membri distinti delle cerchie richieste; le cerchie non visibili vengono ignorate
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn circles_members(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<MultiCircleMembersDTO>,
) -> Result<Json<Vec<UserDTO>>, AppError> {
    let mut visible = Vec::with_capacity(body.circle_ids.len());
    for circle_id in &body.circle_ids {
        let Some(circle) = state.circle.read(circle_id).await? else {
            continue;
        };
        let snapshot = state.circle.snapshot(&circle).await?;
        if circle_policy::evaluate(current_user.user_id, &snapshot, CircleAction::View).is_ok() {
            visible.push(circle.circle_id);
        } else {
            debug!("Skipping circle {} not visible to the user", circle_id);
        }
    }

    let members = state
        .circle
        .members_of_many(&visible)
        .await?
        .into_iter()
        .map(UserDTO::from)
        .collect();
    Ok(Json(members))
}

/// Fasce occupate dai membri delle cerchie scelte, per pianificare un nuovo evento
#[instrument(skip(state, current_user, query), fields(user_id = %current_user.user_id))]
pub async fn grey_events(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(query): Query<GreyEventsQuery>,
) -> Result<Json<GreyEventsDTO>, AppError> {
    // 1. Leggere gli id delle cerchie dalla query string
    // 2. Ogni cerchia deve essere visibile all'utente
    // 3. Raccogliere i membri (escluso l'utente) e le loro fasce occupate
    let circle_ids = query
        .ids()
        .map_err(|_| AppError::bad_request("Invalid circle id"))?;
    if circle_ids.is_empty() {
        return Err(AppError::bad_request("Select at least one circle"));
    }

    let mut member_ids = BTreeSet::new();
    for circle_id in circle_ids {
        let circle =
            load_authorized(&state, current_user.user_id, circle_id, CircleAction::View).await?;
        member_ids.extend(state.circle.member_ids(&circle.circle_id).await?);
    }
    member_ids.remove(&current_user.user_id);
    let member_ids: Vec<i32> = member_ids.into_iter().collect();

    let grey_events: Vec<GreyEventDTO> = state
        .event
        .busy_slots(&member_ids)
        .await?
        .into_iter()
        .map(GreyEventDTO::from)
        .collect();

    debug!(
        "{} busy slots across {} members",
        grey_events.len(),
        member_ids.len()
    );
    Ok(Json(GreyEventsDTO {
        grey_events,
        total_members: member_ids.len(),
    }))
}

pub async fn list_tags(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TagDTO>>, AppError> {
    let tags = state
        .tag
        .list_all()
        .await?
        .into_iter()
        .map(TagDTO::from)
        .collect();
    Ok(Json(tags))
}
