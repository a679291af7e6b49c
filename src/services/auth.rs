//! Auth services - Registrazione, login e reset della password

use crate::core::{AppError, AppState, OutgoingMail, encode_jwt};
use crate::dtos::{
    AuthResponseDTO, CreateUserDTO, LoginDTO, PasswordResetConfirmDTO, PasswordResetRequestDTO,
    UserDTO,
};
use crate::entities::User;
use crate::repositories::Create;
use axum::{
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    debug!("Login attempt");
    // 1. Cercare l'utente nel database tramite username
    // 2. Se l'utente non esiste o la password non corrisponde, ritornare UNAUTHORIZED
    //    con lo stesso messaggio (nessuna enumerazione degli utenti)
    // 3. Generare il token JWT e ritornarlo sia nel body che nell'header Authorization

    let user = match state.user.find_by_username(&body.username).await? {
        Some(user) => user,
        None => {
            warn!("Login failed: unknown username");
            return Err(AppError::unauthorized(
                "No active account found with the given credentials",
            ));
        }
    };

    if !user.verify_password(&body.password) {
        warn!("Login failed: wrong password");
        return Err(AppError::unauthorized(
            "No active account found with the given credentials",
        ));
    }

    let token = encode_jwt(user.username.clone(), user.user_id, &state.jwt_secret)?;

    let mut headers = HeaderMap::new();
    let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| AppError::internal_server_error("Failed to build authorization header"))?;
    headers.insert(header::AUTHORIZATION, bearer);

    info!("User logged in");
    Ok((StatusCode::OK, headers, Json(json!({ "access": token }))))
}

#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    debug!("Registering new user");
    // 1. Validare il DTO (formato username, email, lunghezza password)
    // 2. Username ed email devono essere liberi, altrimenti CONFLICT
    // 3. Salvare l'utente con la password hashata e creare il profilo di default
    // 4. Ritornare utente e token di accesso

    body.validate()?;

    if state.user.find_by_username(&body.username).await?.is_some() {
        warn!("Username already taken");
        return Err(AppError::conflict("Username already exists"));
    }
    if state.user.find_by_email(&body.email).await?.is_some() {
        warn!("Email already registered");
        return Err(AppError::conflict("Email already registered"));
    }

    let password_hash = User::hash_password(&body.password).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        AppError::internal_server_error("Failed to hash password")
    })?;

    let new_user = CreateUserDTO {
        username: body.username,
        email: body.email.to_lowercase(),
        password: password_hash,
    };

    let created_user = state.user.create(&new_user).await?;
    state.profile.create_default(&created_user.user_id).await?;

    let access = encode_jwt(
        created_user.username.clone(),
        created_user.user_id,
        &state.jwt_secret,
    )?;

    info!(user_id = created_user.user_id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponseDTO {
            user: UserDTO::from(created_user),
            access,
        }),
    ))
}

fn reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[instrument(skip(state, body))]
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PasswordResetRequestDTO>,
) -> Result<Json<serde_json::Value>, AppError> {
    debug!("Password reset requested");
    body.validate()?;

    // la risposta è identica che l'utente esista o meno
    let response = Json(json!({
        "detail": "If an account exists for this email, a reset link has been sent."
    }));

    let Some(user) = state.user.find_by_email(&body.email).await? else {
        debug!("No account for the given email");
        return Ok(response);
    };

    state.password_reset.purge_expired(Utc::now()).await?;

    let token = reset_token();
    let expires_at = Utc::now() + Duration::minutes(state.config.password_reset_ttl_minutes);
    state
        .password_reset
        .replace_for_user(&user.user_id, &token, expires_at)
        .await?;

    let link = format!(
        "{}/password-reset/confirm?token={}",
        state.config.frontend_url.trim_end_matches('/'),
        token
    );
    let mail = OutgoingMail {
        to: user.email.clone(),
        subject: "Reset your zigzag password".to_string(),
        body: format!(
            "Hi {},\n\nuse the link below to choose a new password. It expires in {} minutes.\n\n{}\n",
            user.username, state.config.password_reset_ttl_minutes, link
        ),
    };
    if let Err(e) = state.mailer.send(mail).await {
        // il token resta valido: l'utente può ripetere la richiesta
        error!("Failed to send password reset mail: {}", e);
    }

    info!(user_id = user.user_id, "Password reset token issued");
    Ok(response)
}

#[instrument(skip(state, body))]
pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PasswordResetConfirmDTO>,
) -> Result<Json<serde_json::Value>, AppError> {
    debug!("Confirming password reset");
    body.validate()?;

    let reset = match state.password_reset.find(&body.token).await? {
        Some(reset) if !reset.is_expired(Utc::now()) => reset,
        _ => {
            warn!("Invalid or expired password reset token");
            return Err(AppError::bad_request("Invalid or expired token"));
        }
    };

    let password_hash = User::hash_password(&body.new_password).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        AppError::internal_server_error("Failed to hash password")
    })?;

    state
        .password_reset
        .consume(&reset, &password_hash)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::bad_request("Invalid or expired token"),
            other => AppError::from(other),
        })?;

    info!(user_id = reset.user_id, "Password reset completed");
    Ok(Json(json!({ "detail": "Password has been reset." })))
}
