//! Policy - Regole di autorizzazione per eventi, cerchie e inviti
//!
//! Tutte le decisioni sono funzioni pure: ricevono l'utente che agisce, uno
//! snapshot dell'entità e l'insieme delle modifiche richieste, e non toccano
//! né il database né la richiesta HTTP. I service caricano gli snapshot dai
//! repository e applicano solo ciò che la decisione permette.

pub mod circle;
pub mod event;
pub mod invitation;

pub use circle::{CircleAction, CircleSnapshot};
pub use event::{EditorRole, EventChangeSet, EventField, EventSnapshot, UpdateDecision};
pub use invitation::InviteState;

/// Motivo per cui una richiesta viene rifiutata.
///
/// Distingue l'utente autenticato ma non autorizzato (`Forbidden`) da una
/// combinazione di campi non valida (`BadRequest`) e da una risorsa che non
/// esiste per l'evento (`NotFound`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("bad request: {0}")]
    BadRequest(&'static str),
    #[error("not found: {0}")]
    NotFound(&'static str),
}
