//! Players, roles, and the actions available to each role.

use serde::{Deserialize, Serialize};

/// Unique player identifier.
///
/// Assigned by [`Game`](crate::Game) from a monotonically increasing
/// counter; never reused, even across voter-pool replacements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every action a player can record, across all three roles.
///
/// Which subset is valid depends on the player's current role and, for the
/// acting roles, on whether the player can fund the listing deposit. A
/// recorded action may go stale when roles or balances change; staleness is
/// resolved at evaluation time, never stored back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Apply,
    NotApply,
    Challenge,
    NotChallenge,
    Accept,
    Reject,
    Abstain,
}

/// A player's role in the round.
///
/// Resolved by id-equality against the game's candidate/challenger
/// assignments; every other player votes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Candidate,
    Challenger,
    Voter,
}

impl Role {
    /// Actions valid for this role, in canonical order: the positive action
    /// first, the null action last. `can_stake` gates the deposit-funded
    /// actions of the candidate and challenger.
    pub fn valid_actions(self, can_stake: bool) -> &'static [Action] {
        match (self, can_stake) {
            (Role::Candidate, true) => &[Action::Apply, Action::NotApply],
            (Role::Candidate, false) => &[Action::NotApply],
            (Role::Challenger, true) => &[Action::Challenge, Action::NotChallenge],
            (Role::Challenger, false) => &[Action::NotChallenge],
            (Role::Voter, _) => &[Action::Accept, Action::Reject, Action::Abstain],
        }
    }
}

/// One participant.
///
/// Plain mutable record: the caller pokes fields directly between queries
/// and the engine recomputes everything from scratch on the next read. Only
/// the id is fixed at creation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Player {
    id: PlayerId,
    /// Token balance. Deposit locking is applied on read, not stored here.
    pub tokens: f64,
    /// The candidate's private valuation of holding the listing.
    pub registry_value: f64,
    /// Listing quality, signed; drives token appreciation for everyone.
    pub quality: f64,
    /// Currently recorded action.
    pub action: Action,
}

impl Player {
    pub(crate) fn new(
        id: PlayerId,
        tokens: f64,
        registry_value: f64,
        quality: f64,
        action: Action,
    ) -> Self {
        Self {
            id,
            tokens,
            registry_value,
            quality,
            action,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_actions_order() {
        assert_eq!(
            Role::Candidate.valid_actions(true),
            &[Action::Apply, Action::NotApply]
        );
        assert_eq!(
            Role::Challenger.valid_actions(true),
            &[Action::Challenge, Action::NotChallenge]
        );
        assert_eq!(
            Role::Voter.valid_actions(true),
            &[Action::Accept, Action::Reject, Action::Abstain]
        );
    }

    #[test]
    fn test_deposit_gates_acting_roles_only() {
        assert_eq!(Role::Candidate.valid_actions(false), &[Action::NotApply]);
        assert_eq!(
            Role::Challenger.valid_actions(false),
            &[Action::NotChallenge]
        );
        // Voting is free; the gate changes nothing.
        assert_eq!(
            Role::Voter.valid_actions(false),
            Role::Voter.valid_actions(true)
        );
    }

    #[test]
    fn test_action_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Action::NotChallenge).unwrap(),
            "\"not_challenge\""
        );
        assert_eq!(
            serde_json::from_str::<Action>("\"abstain\"").unwrap(),
            Action::Abstain
        );
    }
}
