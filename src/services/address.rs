//! Address services - Indirizzi dell'utente

use crate::core::{AppError, AppState};
use crate::dtos::{AddressDTO, CreateAddressDTO, UpdateAddressDTO};
use crate::entities::User;
use crate::repositories::{Delete, Update};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_addresses(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<AddressDTO>>, AppError> {
    let addresses = state
        .address
        .list_for_user(&current_user.user_id)
        .await?
        .into_iter()
        .map(AddressDTO::from)
        .collect::<Vec<_>>();
    debug!("Found {} addresses", addresses.len());
    Ok(Json(addresses))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_address(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateAddressDTO>,
) -> Result<(StatusCode, Json<AddressDTO>), AppError> {
    body.validate()?;
    let created = state
        .address
        .create_for_user(&current_user.user_id, &body)
        .await?;
    info!(address_id = created.address.address_id, "Address created");
    Ok((StatusCode::CREATED, Json(AddressDTO::from(created))))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, address_id = %address_id))]
pub async fn update_address(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(address_id): Path<i32>,
    Json(body): Json<UpdateAddressDTO>,
) -> Result<Json<AddressDTO>, AppError> {
    body.validate()?;

    // indirizzi di altri utenti non esistono per il chiamante
    if state
        .address
        .read_owned(&current_user.user_id, &address_id)
        .await?
        .is_none()
    {
        warn!("Address not owned by the user");
        return Err(AppError::not_found("Address not found"));
    }

    state.address.update(&address_id, &body).await?;
    if let Some(ref label) = body.label {
        state
            .address
            .update_label(&current_user.user_id, &address_id, label)
            .await?;
    }

    let updated = state
        .address
        .read_owned(&current_user.user_id, &address_id)
        .await?
        .ok_or_else(|| AppError::not_found("Address not found"))?;

    info!("Address updated");
    Ok(Json(AddressDTO::from(updated)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, address_id = %address_id))]
pub async fn delete_address(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(address_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if state
        .address
        .read_owned(&current_user.user_id, &address_id)
        .await?
        .is_none()
    {
        warn!("Address not owned by the user");
        return Err(AppError::not_found("Address not found"));
    }

    state.address.delete(&address_id).await?;
    info!("Address deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Indirizzi dell'utente con coordinate, per la mappa
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn my_locations(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<AddressDTO>>, AppError> {
    let locations = state
        .address
        .list_for_user(&current_user.user_id)
        .await?
        .into_iter()
        .map(AddressDTO::from)
        .collect();
    Ok(Json(locations))
}
