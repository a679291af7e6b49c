//! Server library - espone i moduli principali per i test

pub mod calendar;
pub mod core;
pub mod dtos;
pub mod entities;
pub mod policy;
pub mod repositories;
pub mod services;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState, auth, config};
pub use services::healthz;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    use crate::core::security_middleware;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", configure_auth_routes(state.clone()))
        .nest(
            "/api/events",
            configure_event_routes(state.clone()).merge(configure_public_routes()),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Configura le routes di autenticazione (registrazione, login, reset password)
fn configure_auth_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::{ThrottleScope, throttle_middleware};
    use services::*;

    Router::new()
        .route(
            "/register/",
            post(register_user).layer(middleware::from_fn_with_state(
                (state.clone(), ThrottleScope::Register),
                throttle_middleware,
            )),
        )
        .route(
            "/token/",
            post(login_user).layer(middleware::from_fn_with_state(
                (state, ThrottleScope::Login),
                throttle_middleware,
            )),
        )
        .route("/password-reset/", post(request_password_reset))
        .route("/password-reset/confirm/", post(confirm_password_reset))
}

/// Routes raggiungibili senza header Authorization: il link pubblico usa il
/// token di invito, il calendario il JWT in query string
fn configure_public_routes() -> Router<Arc<AppState>> {
    use services::*;

    Router::new()
        .route("/public-event/{event_id}/", get(public_event))
        .route("/ical/download/", get(download_calendar))
        .route("/ical/feed/", get(calendar_feed))
}

/// Configura le routes autenticate di eventi, cerchie, profili e indirizzi
fn configure_event_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        // eventi
        .route("/event/", get(list_events).post(create_event))
        .route(
            "/event/{event_id}/",
            get(get_event).patch(update_event).delete(delete_event),
        )
        .route("/event/{event_id}/participants/", get(list_participants))
        .route(
            "/event/{event_id}/toggle_participation/",
            post(toggle_participation),
        )
        .route(
            "/event/{event_id}/invite/",
            post(generate_invitation).delete(revoke_invitation),
        )
        .route("/markers/", post(markers))
        .route("/verify-invitation/", get(verify_invitation))
        .route("/accept-invitation/", post(accept_invitation))
        .route("/event-share-token/", post(event_share_token))
        .route(
            "/invitations/",
            get(list_event_invitations).post(create_event_invitation),
        )
        .route(
            "/invitations/{invitation_id}/",
            get(get_event_invitation).delete(delete_event_invitation),
        )
        // cerchie
        .route("/circles/", get(list_circles).post(create_circle))
        .route("/circles/members/", post(circles_members))
        .route("/circles/grey-events/", get(grey_events))
        .route(
            "/circles/{circle_id}/",
            get(get_circle).patch(update_circle).delete(delete_circle),
        )
        .route("/circles/{circle_id}/add_members/", post(add_members))
        .route("/circles/{circle_id}/remove_members/", post(remove_members))
        .route("/tags/", get(list_tags))
        // profili e utenti
        .route(
            "/profile/me/",
            get(get_my_profile).patch(update_my_profile),
        )
        .route("/users/", get(list_friends))
        .route("/users/{username}/profile/", get(get_user_profile))
        // indirizzi
        .route(
            "/user/addresses/",
            get(list_addresses).post(create_address),
        )
        .route(
            "/user/addresses/{address_id}/",
            patch(update_address).delete(delete_address),
        )
        .route("/my/locations/", get(my_locations))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
