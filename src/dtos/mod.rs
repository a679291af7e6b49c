//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod address;
pub mod circle;
pub mod event;
pub mod invitation;
pub mod profile;
pub mod query;
pub mod user;

// Re-exports per facilitare l'import
pub use address::{AddressDTO, CreateAddressDTO, UpdateAddressDTO};
pub use circle::{
    CircleDTO, CircleMembersDTO, CreateCircleDTO, CreateCircleRequestDTO, GreyEventDTO,
    GreyEventsDTO, MultiCircleMembersDTO, TagDTO, UpdateCircleDTO,
};
pub use event::{
    CircleSummaryDTO, CreateEventDTO, CreateEventRequestDTO, EventDTO, MarkerDTO, MarkersDTO,
    MarkersQueryDTO, ParticipationDTO, PublicEventDTO, UpdateEventDTO,
};
pub use invitation::{
    AcceptInvitationDTO, AcceptedInvitationDTO, CreateEventInvitationDTO,
    CreateEventInvitationRequestDTO, EventInvitationDTO, InvitationLinkDTO, ShareTokenRequestDTO,
    VerifyInvitationDTO,
};
pub use profile::{ProfileDTO, UpdateProfileDTO};
pub use query::{
    CalendarQuery, GreyEventsQuery, PublicEventQuery, UserSearchQuery, VerifyInvitationQuery,
};
pub use user::{
    AuthResponseDTO, CreateUserDTO, LoginDTO, PasswordResetConfirmDTO, PasswordResetRequestDTO,
    UserDTO,
};
