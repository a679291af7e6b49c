//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Questo modulo organizza i repository in sotto-moduli separati per una migliore manutenibilità.
//! Ogni repository gestisce le operazioni di database per una specifica entità.

// ************************* NOTA SU SQLX ************************* //

/*
   Le query sono verificate a runtime con `sqlx::query_as::<_, Entity>(...)` e le entity
   derivano `FromRow`: in questo modo il crate compila anche senza un database raggiungibile.
   Scelta del metodo in base al numero di righe attese:
   Number of Rows   Method to Call
   None             .execute(...).await         (INSERT/UPDATE/DELETE)
   Zero or One      .fetch_optional(...).await
   Exactly One      .fetch_one(...).await       (aggregati, COUNT)
   Multiple         .fetch_all(...).await
   Le operazioni che toccano più tabelle aprono una transazione con `pool.begin()` e
   fanno commit solo alla fine: se una query fallisce il rollback avviene al drop.
*/

// ************************* MODULI REPOSITORY ************************* //

pub mod address;
pub mod circle;
pub mod event;
pub mod event_invitation;
pub mod participation;
pub mod password_reset;
pub mod profile;
pub mod tag;
pub mod traits;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Read, ReadMany, Update};

// Re-esportazione delle struct dei repository per facilitare l'import
pub use address::AddressRepository;
pub use circle::CircleRepository;
pub use event::EventRepository;
pub use event_invitation::EventInvitationRepository;
pub use participation::ParticipationRepository;
pub use password_reset::PasswordResetRepository;
pub use profile::ProfileRepository;
pub use tag::TagRepository;
pub use user::UserRepository;

use sqlx::SqlitePool;

// alias di tipo per il pool, per semplificare lo switch in caso in cui vogliamo usare un altro db
pub type PoolType = SqlitePool;
