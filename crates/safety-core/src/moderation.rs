//! Moderation lifecycle.
//!
//! A metrics row starts as [`ModerationStatus::NotRequested`]. The content
//! owner may ask for review of flagged content, which moves it to
//! [`ModerationStatus::Pending`]; a moderator or admin then approves or
//! declines it. Every channel that changes the status goes through
//! [`transition`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Review state of a metrics row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    #[default]
    NotRequested,
    Pending,
    Approved,
    Declined,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::NotRequested => "not_requested",
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Declined => "declined",
        }
    }

    /// Approved and declined are terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ModerationStatus::Approved | ModerationStatus::Declined)
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_requested" => Ok(ModerationStatus::NotRequested),
            "pending" => Ok(ModerationStatus::Pending),
            "approved" => Ok(ModerationStatus::Approved),
            "declined" => Ok(ModerationStatus::Declined),
            other => Err(format!("unknown moderation status: {}", other)),
        }
    }
}

/// Something a principal asks to happen to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    RequestReview,
    Approve,
    Decline,
}

impl ModerationAction {
    /// Parse the `action` parameter of an email link (`approved` / `declined`).
    pub fn from_decision(decision: &str) -> Option<Self> {
        match decision {
            "approved" => Some(ModerationAction::Approve),
            "declined" => Some(ModerationAction::Decline),
            _ => None,
        }
    }

    /// The status this action leads to.
    pub fn target(&self) -> ModerationStatus {
        match self {
            ModerationAction::RequestReview => ModerationStatus::Pending,
            ModerationAction::Approve => ModerationStatus::Approved,
            ModerationAction::Decline => ModerationStatus::Declined,
        }
    }
}

/// Role of the acting principal, as reported by the auth provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Constrained teacher account: may only request review of its own content.
    Educator,
    Moderator,
    Admin,
    /// Any other organization role.
    Member,
}

impl Role {
    /// Map an auth-provider role claim to a role. Unknown claims are members.
    pub fn from_claim(claim: &str) -> Self {
        match claim.trim().to_ascii_lowercase().as_str() {
            "org:admin" | "admin" => Role::Admin,
            "moderator" | "org:moderator" => Role::Moderator,
            "educator" | "org:educator" => Role::Educator,
            _ => Role::Member,
        }
    }

    /// Moderators and admins may decide on reviews.
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

/// Reasons a transition is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("only flagged content can be sent for review")]
    NotFlagged,

    #[error("content is not awaiting review")]
    NotPending,

    #[error("content has already been {0}")]
    AlreadyDecided(ModerationStatus),

    #[error("role is not allowed to moderate content")]
    Forbidden,
}

/// Decide the next status for `action` taken by `role` on a row in `current`.
///
/// Repeating the action that produced the current state is accepted and
/// returns the unchanged status, so replayed email links are harmless.
pub fn transition(
    current: ModerationStatus,
    flagged: bool,
    action: ModerationAction,
    role: Role,
) -> Result<ModerationStatus, TransitionError> {
    use ModerationStatus::*;

    match action {
        ModerationAction::RequestReview => {
            if !flagged {
                return Err(TransitionError::NotFlagged);
            }
            if current.is_terminal() {
                return Err(TransitionError::AlreadyDecided(current));
            }
            Ok(Pending)
        }
        ModerationAction::Approve | ModerationAction::Decline => {
            if !role.can_moderate() {
                return Err(TransitionError::Forbidden);
            }
            let target = action.target();
            match current {
                Pending => Ok(target),
                decided if decided == target => Ok(decided),
                decided if decided.is_terminal() => Err(TransitionError::AlreadyDecided(decided)),
                _ => Err(TransitionError::NotPending),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::ModerationStatus::*;

    #[test]
    fn test_request_review_from_not_requested() {
        let next = transition(NotRequested, true, ModerationAction::RequestReview, Role::Educator);
        assert_eq!(next, Ok(Pending));
    }

    #[test]
    fn test_request_review_requires_flag() {
        let next = transition(NotRequested, false, ModerationAction::RequestReview, Role::Educator);
        assert_eq!(next, Err(TransitionError::NotFlagged));
    }

    #[test]
    fn test_request_review_is_idempotent_while_pending() {
        let next = transition(Pending, true, ModerationAction::RequestReview, Role::Educator);
        assert_eq!(next, Ok(Pending));
    }

    #[test]
    fn test_request_review_after_decision_rejected() {
        let next = transition(Declined, true, ModerationAction::RequestReview, Role::Educator);
        assert_eq!(next, Err(TransitionError::AlreadyDecided(Declined)));
    }

    #[test]
    fn test_moderator_decides_pending() {
        assert_eq!(
            transition(Pending, true, ModerationAction::Approve, Role::Moderator),
            Ok(Approved)
        );
        assert_eq!(
            transition(Pending, true, ModerationAction::Decline, Role::Admin),
            Ok(Declined)
        );
    }

    #[test]
    fn test_educator_cannot_decide() {
        assert_eq!(
            transition(Pending, true, ModerationAction::Approve, Role::Educator),
            Err(TransitionError::Forbidden)
        );
        assert_eq!(
            transition(Pending, true, ModerationAction::Decline, Role::Member),
            Err(TransitionError::Forbidden)
        );
    }

    #[test]
    fn test_replayed_decision_is_noop() {
        assert_eq!(
            transition(Approved, true, ModerationAction::Approve, Role::Moderator),
            Ok(Approved)
        );
    }

    #[test]
    fn test_flipping_decision_rejected() {
        assert_eq!(
            transition(Approved, true, ModerationAction::Decline, Role::Moderator),
            Err(TransitionError::AlreadyDecided(Approved))
        );
    }

    #[test]
    fn test_decision_requires_pending() {
        assert_eq!(
            transition(NotRequested, true, ModerationAction::Approve, Role::Admin),
            Err(TransitionError::NotPending)
        );
    }

    #[test]
    fn test_role_from_claim() {
        assert_eq!(Role::from_claim("org:admin"), Role::Admin);
        assert_eq!(Role::from_claim("Moderator"), Role::Moderator);
        assert_eq!(Role::from_claim("educator"), Role::Educator);
        assert_eq!(Role::from_claim("org:member"), Role::Member);
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [NotRequested, Pending, Approved, Declined] {
            assert_eq!(status.as_str().parse::<ModerationStatus>().unwrap(), status);
        }
        assert!("open".parse::<ModerationStatus>().is_err());
    }

    #[test]
    fn test_action_from_decision() {
        assert_eq!(ModerationAction::from_decision("approved"), Some(ModerationAction::Approve));
        assert_eq!(ModerationAction::from_decision("declined"), Some(ModerationAction::Decline));
        assert_eq!(ModerationAction::from_decision("pending"), None);
    }
}
