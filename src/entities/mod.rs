//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database.

pub mod address;
pub mod circle;
pub mod event;
pub mod event_invitation;
pub mod participation;
pub mod password_reset;
pub mod profile;
pub mod tag;
pub mod user;

// Re-exports per facilitare l'import
pub use address::{Address, OwnedAddress};
pub use circle::Circle;
pub use event::{BusySlot, Event};
pub use event_invitation::EventInvitation;
pub use participation::EventParticipation;
pub use password_reset::PasswordResetToken;
pub use profile::Profile;
pub use tag::Tag;
pub use user::User;
