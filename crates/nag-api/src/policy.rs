use nag_types::api::Claims;

use crate::error::ApiError;

/// Who may do what. Checked after the target has been loaded, so a missing
/// target is reported as not-found before any ownership decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Any authenticated user may read, modify and delete any group or
    /// reminder.
    #[default]
    Permissive,
    /// Deleting a group requires being its creator; changing or deleting a
    /// reminder requires being its creator or the creator of its group.
    OwnerOnly,
}

/// An operation about to be performed, with the ownership facts it depends on.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    CreateGroup,
    ReadGroups,
    DeleteGroup {
        owner_id: i64,
    },
    CreateReminder,
    ReadReminders,
    ModifyReminder {
        creator_id: i64,
        group_owner_id: Option<i64>,
    },
}

impl Policy {
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::OwnerOnly } else { Self::Permissive }
    }

    pub fn authorize(&self, identity: &Claims, action: Action) -> Result<(), ApiError> {
        if *self == Self::Permissive {
            return Ok(());
        }

        let allowed = match action {
            Action::CreateGroup
            | Action::ReadGroups
            | Action::CreateReminder
            | Action::ReadReminders => true,
            Action::DeleteGroup { owner_id } => owner_id == identity.user_id,
            Action::ModifyReminder {
                creator_id,
                group_owner_id,
            } => creator_id == identity.user_id || group_owner_id == Some(identity.user_id),
        };

        if allowed { Ok(()) } else { Err(ApiError::Forbidden) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(user_id: i64) -> Claims {
        Claims {
            user_id,
            username: format!("user{user_id}"),
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn permissive_allows_everything() {
        let policy = Policy::Permissive;
        let stranger = identity(9);

        policy
            .authorize(&stranger, Action::DeleteGroup { owner_id: 1 })
            .unwrap();
        policy
            .authorize(
                &stranger,
                Action::ModifyReminder {
                    creator_id: 1,
                    group_owner_id: Some(1),
                },
            )
            .unwrap();
    }

    #[test]
    fn owner_only_gates_group_deletion() {
        let policy = Policy::OwnerOnly;

        policy
            .authorize(&identity(1), Action::DeleteGroup { owner_id: 1 })
            .unwrap();
        assert!(matches!(
            policy.authorize(&identity(2), Action::DeleteGroup { owner_id: 1 }),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn owner_only_lets_group_owner_manage_reminders() {
        let policy = Policy::OwnerOnly;
        let action = Action::ModifyReminder {
            creator_id: 2,
            group_owner_id: Some(1),
        };

        policy.authorize(&identity(1), action).unwrap();
        policy.authorize(&identity(2), action).unwrap();
        assert!(matches!(
            policy.authorize(&identity(3), action),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn owner_only_keeps_reads_open() {
        let policy = Policy::OwnerOnly;
        policy.authorize(&identity(5), Action::ReadGroups).unwrap();
        policy.authorize(&identity(5), Action::ReadReminders).unwrap();
        policy.authorize(&identity(5), Action::CreateReminder).unwrap();
    }

    #[test]
    fn strict_flag() {
        assert_eq!(Policy::from_strict(true), Policy::OwnerOnly);
        assert_eq!(Policy::from_strict(false), Policy::Permissive);
        assert_eq!(Policy::default(), Policy::Permissive);
    }
}
