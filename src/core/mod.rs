//! Core Module - Componenti infrastrutturali dell'applicazione
//!
//! Questo modulo contiene tutti i componenti "core" dell'applicazione:
//! - Autenticazione e JWT
//! - Configurazione
//! - Gestione errori
//! - Stato applicazione
//! - Rate limiting, filtro di sicurezza e invio email

pub mod auth;
pub mod config;
pub mod error;
pub mod mailer;
pub mod security;
pub mod state;
pub mod throttle;

// Re-exports per facilitare l'import
pub use auth::{Claims, authentication_middleware, decode_jwt, encode_jwt};
pub use config::Config;
pub use error::AppError;
pub use mailer::{LogMailer, Mailer, MemoryMailer, OutgoingMail};
pub use security::security_middleware;
pub use state::AppState;
pub use throttle::{Throttle, ThrottleScope, throttle_middleware};
