//! User services - Profili e lista degli amici

use crate::core::{AppError, AppState};
use crate::dtos::{ProfileDTO, UpdateProfileDTO, UserDTO, UserSearchQuery};
use crate::entities::User;
use crate::repositories::Update;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<ProfileDTO>, AppError> {
    debug!("Fetching own profile");
    let profile = state.profile.read_or_create(&current_user.user_id).await?;
    Ok(Json(ProfileDTO::from_profile(profile, current_user.username)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdateProfileDTO>,
) -> Result<Json<ProfileDTO>, AppError> {
    debug!("Updating own profile");
    body.validate()?;

    let profile = state.profile.update(&current_user.user_id, &body).await?;

    info!("Profile updated");
    Ok(Json(ProfileDTO::from_profile(profile, current_user.username)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, target = %username))]
pub async fn get_user_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(username): Path<String>,
) -> Result<Json<ProfileDTO>, AppError> {
    debug!("Fetching profile by username");
    // 1. Cercare l'utente, 404 se non esiste
    // 2. Il profilo è visibile a se stessi o a chi condivide almeno una cerchia
    let target = state
        .user
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if target.user_id != current_user.user_id
        && !state
            .user
            .share_a_circle(&current_user.user_id, &target.user_id)
            .await?
    {
        warn!("Profile requested by a user sharing no circle");
        return Err(AppError::forbidden(
            "You can only view profiles of users in your circles",
        ));
    }

    let profile = state.profile.read_or_create(&target.user_id).await?;
    Ok(Json(ProfileDTO::from_profile(profile, target.username)))
}

/// Utenti che condividono almeno una cerchia con l'utente corrente
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_friends(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Vec<UserDTO>>, AppError> {
    let prefix = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let friends = state
        .user
        .find_friends(&current_user.user_id, prefix)
        .await?
        .into_iter()
        .map(UserDTO::from)
        .collect::<Vec<_>>();

    debug!("Found {} friends", friends.len());
    Ok(Json(friends))
}
