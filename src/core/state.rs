//! Application State - Stato globale dell'applicazione
//!
//! Contiene tutti i repository, configurazioni e stato condiviso
//! necessario per gestire l'applicazione.

use crate::core::Config;
use crate::core::mailer::{LogMailer, Mailer};
use crate::core::throttle::Throttle;
use crate::repositories::{
    AddressRepository, CircleRepository, EventInvitationRepository, EventRepository,
    ParticipationRepository, PasswordResetRepository, PoolType, ProfileRepository, TagRepository,
    UserRepository,
};
use std::sync::Arc;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    /// Repository per la gestione degli utenti
    pub user: UserRepository,

    pub profile: ProfileRepository,

    pub password_reset: PasswordResetRepository,

    /// Indirizzi degli utenti e degli eventi
    pub address: AddressRepository,

    pub tag: TagRepository,

    /// Repository per cerchie, membri e categorie
    pub circle: CircleRepository,

    /// Repository per eventi e link di invito
    pub event: EventRepository,

    /// Inviti per email
    pub event_invitation: EventInvitationRepository,

    pub participation: ParticipationRepository,

    /// Secret key per JWT token
    pub jwt_secret: String,

    pub config: Config,

    /// Contatori per il rate limiting di login e registrazione
    pub throttle: Throttle,

    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// con il pool di connessioni fornito. Le email vengono solo loggate.
    pub fn new(pool: PoolType, config: Config) -> Self {
        Self::with_mailer(pool, config, Arc::new(LogMailer))
    }

    pub fn with_mailer(pool: PoolType, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            user: UserRepository::new(pool.clone()),
            profile: ProfileRepository::new(pool.clone()),
            password_reset: PasswordResetRepository::new(pool.clone()),
            address: AddressRepository::new(pool.clone()),
            tag: TagRepository::new(pool.clone()),
            circle: CircleRepository::new(pool.clone()),
            event: EventRepository::new(pool.clone()),
            event_invitation: EventInvitationRepository::new(pool.clone()),
            participation: ParticipationRepository::new(pool),
            jwt_secret: config.jwt_secret.clone(),
            throttle: Throttle::new(config.login_rate_per_minute, config.register_rate_per_minute),
            config,
            mailer,
        }
    }
}
