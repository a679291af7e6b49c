//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Questo modulo organizza i service handlers in sotto-moduli separati per una migliore manutenibilità.
//! Ogni modulo gestisce gli endpoint HTTP per una specifica funzionalità.

pub mod address;
pub mod auth;
pub mod calendar;
pub mod circle;
pub mod event;
pub mod invitation;
pub mod user;

// Re-exports per facilitare l'import
pub use address::{create_address, delete_address, list_addresses, my_locations, update_address};
pub use auth::{confirm_password_reset, login_user, register_user, request_password_reset};
pub use calendar::{calendar_feed, download_calendar};
pub use circle::{
    add_members, circles_members, create_circle, delete_circle, get_circle, grey_events,
    list_circles, list_tags, remove_members, update_circle,
};
pub use event::{
    create_event, delete_event, get_event, list_events, list_participants, markers, public_event,
    toggle_participation, update_event,
};
pub use invitation::{
    accept_invitation, create_event_invitation, delete_event_invitation, event_share_token,
    generate_invitation, get_event_invitation, list_event_invitations, revoke_invitation,
    verify_invitation,
};
pub use user::{get_my_profile, get_user_profile, list_friends, update_my_profile};

use axum::{http::StatusCode, response::IntoResponse};

/// Health check per il load balancer
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
