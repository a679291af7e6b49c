//! Valutazione dei permessi sugli eventi

use super::Denial;
use std::collections::{BTreeSet, HashSet};

/// Campi modificabili di un evento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventField {
    Title,
    Description,
    Address,
    StartTime,
    EndTime,
    Circles,
    ShareableLink,
    EventShared,
}

impl EventField {
    pub const ALL: [EventField; 8] = [
        EventField::Title,
        EventField::Description,
        EventField::Address,
        EventField::StartTime,
        EventField::EndTime,
        EventField::Circles,
        EventField::ShareableLink,
        EventField::EventShared,
    ];

    /// Campi che un membro può modificare su un evento condiviso
    pub const MEMBER_EDITABLE: [EventField; 3] = [
        EventField::Description,
        EventField::StartTime,
        EventField::EndTime,
    ];

    pub fn is_date(self) -> bool {
        matches!(self, EventField::StartTime | EventField::EndTime)
    }
}

/// Stato dell'evento rilevante per i permessi
#[derive(Debug, Clone, Default)]
pub struct EventSnapshot {
    pub creator_id: i32,
    pub event_shared: bool,
    /// Unione dei membri di tutte le cerchie associate all'evento
    pub circle_member_ids: HashSet<i32>,
}

impl EventSnapshot {
    pub fn is_creator(&self, user_id: i32) -> bool {
        self.creator_id == user_id
    }

    pub fn is_circle_member(&self, user_id: i32) -> bool {
        self.circle_member_ids.contains(&user_id)
    }
}

/// Insieme dei campi che una richiesta vuole modificare
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventChangeSet {
    fields: BTreeSet<EventField>,
    shared_target: Option<bool>,
}

impl EventChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: EventField) -> Self {
        self.insert(field);
        self
    }

    /// Aggiunge la modifica di `event_shared` con il valore richiesto
    pub fn sharing(mut self, target: bool) -> Self {
        self.set_sharing(target);
        self
    }

    pub fn insert(&mut self, field: EventField) {
        self.fields.insert(field);
    }

    pub fn set_sharing(&mut self, target: bool) {
        self.fields.insert(EventField::EventShared);
        self.shared_target = Some(target);
    }

    pub fn contains(&self, field: EventField) -> bool {
        self.fields.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeSet<EventField> {
        &self.fields
    }

    pub fn touches_dates(&self) -> bool {
        self.fields.iter().any(|f| f.is_date())
    }

    /// true se la richiesta porta `event_shared` da false a true
    pub fn turns_sharing_on(&self, event: &EventSnapshot) -> bool {
        !event.event_shared && self.shared_target == Some(true)
    }
}

/// Ruolo con cui l'utente modifica l'evento
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorRole {
    Creator,
    SharedMember,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDecision {
    pub role: EditorRole,
    /// Campi che possono essere applicati
    pub permitted: BTreeSet<EventField>,
    /// Campi richiesti ma scartati perché riservati al creatore
    pub dropped: BTreeSet<EventField>,
}

/// Ruolo di modifica dell'utente, se ne ha uno.
///
/// Il creatore modifica sempre; un membro di una cerchia dell'evento solo
/// quando l'evento è condiviso.
pub fn editor_role(user_id: i32, event: &EventSnapshot) -> Option<EditorRole> {
    if event.is_creator(user_id) {
        Some(EditorRole::Creator)
    } else if event.event_shared && event.is_circle_member(user_id) {
        Some(EditorRole::SharedMember)
    } else {
        None
    }
}

pub fn can_view(user_id: i32, event: &EventSnapshot) -> Result<(), Denial> {
    if event.is_creator(user_id) || event.is_circle_member(user_id) {
        Ok(())
    } else {
        Err(Denial::Forbidden("You cannot view this event."))
    }
}

pub fn can_delete(user_id: i32, event: &EventSnapshot) -> Result<(), Denial> {
    if event.is_creator(user_id) {
        Ok(())
    } else {
        Err(Denial::Forbidden("Only the creator can delete this event."))
    }
}

/// Valuta una richiesta di modifica.
///
/// Ordine di valutazione:
/// 1. condivisione attivata e date modificate nella stessa richiesta → `BadRequest`
/// 2. nessun ruolo di modifica → `Forbidden`
/// 3. date modificate su un evento non ancora condiviso → `BadRequest`
/// 4. il membro riceve solo descrizione e date, il resto viene scartato;
///    se non resta nulla da applicare → `Forbidden`
pub fn evaluate_update(
    user_id: i32,
    event: &EventSnapshot,
    changes: &EventChangeSet,
) -> Result<UpdateDecision, Denial> {
    if changes.turns_sharing_on(event) && changes.touches_dates() {
        return Err(Denial::BadRequest(
            "Share the event first, then change its dates in a separate request.",
        ));
    }

    let role = editor_role(user_id, event)
        .ok_or(Denial::Forbidden("You cannot modify this event."))?;

    if changes.touches_dates() && !event.event_shared {
        return Err(Denial::BadRequest(
            "Dates can only be changed once the event is shared.",
        ));
    }

    let (permitted, dropped): (BTreeSet<_>, BTreeSet<_>) = match role {
        EditorRole::Creator => (changes.fields().clone(), BTreeSet::new()),
        EditorRole::SharedMember => changes
            .fields()
            .iter()
            .copied()
            .partition(|f| EventField::MEMBER_EDITABLE.contains(f)),
    };

    if permitted.is_empty() && !dropped.is_empty() {
        return Err(Denial::Forbidden(
            "Only the creator can change these fields.",
        ));
    }

    Ok(UpdateDecision {
        role,
        permitted,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATOR: i32 = 1;
    const MEMBER: i32 = 2;
    const STRANGER: i32 = 3;

    fn event(shared: bool) -> EventSnapshot {
        EventSnapshot {
            creator_id: CREATOR,
            event_shared: shared,
            circle_member_ids: [CREATOR, MEMBER].into_iter().collect(),
        }
    }

    fn dates() -> EventChangeSet {
        EventChangeSet::new()
            .with(EventField::StartTime)
            .with(EventField::EndTime)
    }

    #[test]
    fn dates_change_only_when_shared_and_actor_belongs() {
        for shared in [false, true] {
            for user in [CREATOR, MEMBER, STRANGER] {
                let ev = event(shared);
                let allowed = evaluate_update(user, &ev, &dates())
                    .map(|d| d.permitted.contains(&EventField::StartTime))
                    .unwrap_or(false);
                let expected = shared && (user == CREATOR || ev.is_circle_member(user));
                assert_eq!(allowed, expected, "shared={shared} user={user}");
            }
        }
    }

    #[test]
    fn sharing_flip_with_dates_is_bad_request_for_everyone() {
        let changes = EventChangeSet::new()
            .sharing(true)
            .with(EventField::StartTime);
        for user in [CREATOR, MEMBER, STRANGER] {
            assert!(matches!(
                evaluate_update(user, &event(false), &changes),
                Err(Denial::BadRequest(_))
            ));
        }
    }

    #[test]
    fn sharing_then_dates_in_two_requests() {
        let mut ev = event(false);
        let first = evaluate_update(CREATOR, &ev, &EventChangeSet::new().sharing(true)).unwrap();
        assert!(first.permitted.contains(&EventField::EventShared));

        ev.event_shared = true;
        let second = evaluate_update(CREATOR, &ev, &dates()).unwrap();
        assert_eq!(second.permitted, dates().fields().clone());
    }

    #[test]
    fn creator_cannot_move_dates_of_unshared_event() {
        assert_eq!(
            evaluate_update(CREATOR, &event(false), &dates()),
            Err(Denial::BadRequest(
                "Dates can only be changed once the event is shared."
            ))
        );
    }

    #[test]
    fn stranger_is_forbidden_on_unshared_event() {
        let changes = EventChangeSet::new().with(EventField::Title);
        assert!(matches!(
            evaluate_update(STRANGER, &event(false), &changes),
            Err(Denial::Forbidden(_))
        ));
        assert!(matches!(
            evaluate_update(MEMBER, &event(false), &changes),
            Err(Denial::Forbidden(_))
        ));
    }

    #[test]
    fn stranger_is_forbidden_even_when_shared() {
        let changes = EventChangeSet::new().with(EventField::Description);
        assert!(matches!(
            evaluate_update(STRANGER, &event(true), &changes),
            Err(Denial::Forbidden(_))
        ));
    }

    #[test]
    fn member_gets_reduced_field_set() {
        let changes = EventChangeSet::new()
            .with(EventField::Title)
            .with(EventField::Description)
            .with(EventField::Address)
            .with(EventField::EndTime);

        let decision = evaluate_update(MEMBER, &event(true), &changes).unwrap();
        assert_eq!(decision.role, EditorRole::SharedMember);
        assert_eq!(
            decision.permitted,
            [EventField::Description, EventField::EndTime].into_iter().collect()
        );
        assert_eq!(
            decision.dropped,
            [EventField::Title, EventField::Address].into_iter().collect()
        );
    }

    #[test]
    fn address_is_creator_only() {
        let changes = EventChangeSet::new().with(EventField::Address);
        assert!(matches!(
            evaluate_update(MEMBER, &event(true), &changes),
            Err(Denial::Forbidden(_))
        ));
        for shared in [false, true] {
            let decision = evaluate_update(CREATOR, &event(shared), &changes).unwrap();
            assert!(decision.permitted.contains(&EventField::Address));
        }
    }

    #[test]
    fn unsharing_with_dates_is_allowed_for_creator() {
        let changes = dates().sharing(false);
        let decision = evaluate_update(CREATOR, &event(true), &changes).unwrap();
        assert!(decision.permitted.contains(&EventField::EventShared));
        assert!(decision.permitted.contains(&EventField::StartTime));
    }

    #[test]
    fn view_and_delete() {
        let ev = event(false);
        assert!(can_view(MEMBER, &ev).is_ok());
        assert!(can_view(STRANGER, &ev).is_err());
        assert!(can_delete(CREATOR, &ev).is_ok());
        assert!(can_delete(MEMBER, &ev).is_err());
    }
}
