//! Ciclo di vita del link di invito
//!
//! ```text
//! NoToken --generate--> TokenActive --revoke--> NoToken
//!                       TokenActive --generate--> TokenActive (nuovo token)
//! ```
//!
//! La cerchia di invito, una volta creata, sopravvive a ogni transizione.

use super::Denial;
use super::event::{EditorRole, EventSnapshot, editor_role};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Byte casuali di un token (43 caratteri una volta codificato)
pub const TOKEN_BYTES: usize = 32;

/// Categoria assegnata a ogni cerchia di invito
pub const INVITATION_CATEGORY: &str = "Invitation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteState {
    NoToken,
    TokenActive,
}

impl InviteState {
    pub fn of(token: Option<&str>) -> Self {
        match token {
            Some(_) => InviteState::TokenActive,
            None => InviteState::NoToken,
        }
    }
}

/// Chi può generare o revocare il link: creatore, oppure membro di una
/// cerchia dell'evento se l'evento è condiviso.
pub fn can_manage(user_id: i32, event: &EventSnapshot) -> Result<EditorRole, Denial> {
    editor_role(user_id, event).ok_or(Denial::Forbidden(
        "You cannot manage invitations for this event.",
    ))
}

/// Verifica il token presentato contro quello attualmente attivo.
///
/// Senza cerchia di invito l'evento non ha mai avuto un link (`NotFound`);
/// con la condivisione via link disattivata nessun token vale (`Forbidden`);
/// un token diverso da quello attivo, anche se emesso in passato, è un
/// `BadRequest`.
pub fn check_accept(
    presented: &str,
    current: Option<&str>,
    has_invitation_circle: bool,
    shareable_link: bool,
) -> Result<(), Denial> {
    if !has_invitation_circle {
        return Err(Denial::NotFound("This event has no invitation link."));
    }
    if !shareable_link {
        return Err(Denial::Forbidden("Link sharing is disabled for this event."));
    }
    match current {
        Some(active) if tokens_match(active, presented) => Ok(()),
        _ => Err(Denial::BadRequest("Invalid or revoked invitation token.")),
    }
}

/// Un invito per email vale solo per l'indirizzo a cui è stato spedito
pub fn check_email_recipient(invited: &str, user_email: &str) -> Result<(), Denial> {
    if invited.trim().eq_ignore_ascii_case(user_email.trim()) {
        Ok(())
    } else {
        Err(Denial::Forbidden(
            "This invitation was sent to another email address.",
        ))
    }
}

/// Genera un token casuale URL-safe
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn tokens_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
