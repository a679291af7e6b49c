//! Circle permission rules

use super::Denial;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct CircleSnapshot {
    pub creator_id: Option<i32>,
    pub member_ids: HashSet<i32>,
    pub is_invitation_circle: bool,
}

impl CircleSnapshot {
    pub fn is_creator(&self, user_id: i32) -> bool {
        self.creator_id == Some(user_id)
    }

    pub fn is_member(&self, user_id: i32) -> bool {
        self.member_ids.contains(&user_id)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CircleAction<'a> {
    View,
    Update,
    Delete,
    AddMembers,
    RemoveMembers(&'a [i32]),
}

pub fn evaluate(user_id: i32, circle: &CircleSnapshot, action: CircleAction<'_>) -> Result<(), Denial> {
    let is_creator = circle.is_creator(user_id);
    match action {
        CircleAction::View => {
            if is_creator || circle.is_member(user_id) {
                Ok(())
            } else {
                Err(Denial::Forbidden("You are not a member of this circle."))
            }
        }
        CircleAction::Update | CircleAction::AddMembers => {
            if is_creator {
                Ok(())
            } else {
                Err(Denial::Forbidden("Only the creator can manage this circle."))
            }
        }
        CircleAction::Delete => {
            if !is_creator {
                Err(Denial::Forbidden("Only the creator can delete this circle."))
            } else if circle.is_invitation_circle {
                Err(Denial::BadRequest("Invitation circles cannot be deleted."))
            } else {
                Ok(())
            }
        }
        CircleAction::RemoveMembers(user_ids) => {
            // a member may only remove themself
            if is_creator
                || (circle.is_member(user_id) && user_ids.iter().all(|id| *id == user_id))
            {
                Ok(())
            } else {
                Err(Denial::Forbidden("You can only remove yourself from this circle."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(invitation: bool) -> CircleSnapshot {
        CircleSnapshot {
            creator_id: Some(1),
            member_ids: [1, 2].into_iter().collect(),
            is_invitation_circle: invitation,
        }
    }

    #[test]
    fn members_view_strangers_do_not() {
        assert!(evaluate(2, &circle(false), CircleAction::View).is_ok());
        assert_eq!(
            evaluate(3, &circle(false), CircleAction::View),
            Err(Denial::Forbidden("You are not a member of this circle."))
        );
    }

    #[test]
    fn only_creator_updates() {
        assert!(evaluate(1, &circle(false), CircleAction::Update).is_ok());
        assert!(evaluate(2, &circle(false), CircleAction::AddMembers).is_err());
    }

    #[test]
    fn invitation_circle_is_never_deleted() {
        assert!(evaluate(1, &circle(false), CircleAction::Delete).is_ok());
        assert!(matches!(
            evaluate(1, &circle(true), CircleAction::Delete),
            Err(Denial::BadRequest(_))
        ));
        assert!(matches!(
            evaluate(2, &circle(true), CircleAction::Delete),
            Err(Denial::Forbidden(_))
        ));
    }

    #[test]
    fn member_can_leave_but_not_kick() {
        assert!(evaluate(2, &circle(false), CircleAction::RemoveMembers(&[2])).is_ok());
        assert!(evaluate(2, &circle(false), CircleAction::RemoveMembers(&[1])).is_err());
        assert!(evaluate(1, &circle(false), CircleAction::RemoveMembers(&[2])).is_ok());
    }

    #[test]
    fn circle_without_creator_is_read_only() {
        let orphan = CircleSnapshot {
            creator_id: None,
            ..circle(false)
        };
        assert!(evaluate(2, &orphan, CircleAction::View).is_ok());
        assert!(evaluate(2, &orphan, CircleAction::Update).is_err());
    }
}
