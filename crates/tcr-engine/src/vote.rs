//! Token-weighted vote tallying.

use serde::Serialize;

use crate::player::Action;

/// Accept/reject token totals for one (possibly hypothetical) vote.
///
/// The same tally type backs the round's real verdict and the per-voter
/// counterfactual verdicts in the voter payoff builder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct VoteTally {
    pub accept_tokens: f64,
    pub reject_tokens: f64,
}

impl VoteTally {
    /// Tally a set of `(action, tokens)` ballots.
    ///
    /// Anything other than an explicit accept or reject counts toward
    /// neither bloc.
    pub fn from_voters<I>(voters: I) -> Self
    where
        I: IntoIterator<Item = (Action, f64)>,
    {
        let mut tally = VoteTally::default();
        for (action, tokens) in voters {
            tally.record(action, tokens);
        }
        tally
    }

    pub fn record(&mut self, action: Action, tokens: f64) {
        match action {
            Action::Accept => self.accept_tokens += tokens,
            Action::Reject => self.reject_tokens += tokens,
            _ => {}
        }
    }

    /// Same tally with one more ballot recorded.
    pub fn with(mut self, action: Action, tokens: f64) -> Self {
        self.record(action, tokens);
        self
    }

    /// Whether the vote passes the quorum.
    ///
    /// No expressed vote at all is a vacuous pass: an uncontested listing is
    /// accepted. Otherwise the accept bloc must hold at least `quorum` of
    /// the expressed tokens; the exact boundary passes.
    pub fn passes(&self, quorum: f64) -> bool {
        let expressed = self.accept_tokens + self.reject_tokens;
        if expressed == 0.0 {
            return true;
        }
        self.accept_tokens / expressed >= quorum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_vacuous_pass() {
        let tally = VoteTally::default();
        assert!(tally.passes(0.5));
        assert!(tally.passes(1.0));
    }

    #[test]
    fn test_majority_partition() {
        let tally = VoteTally::from_voters(vec![
            (Action::Accept, 10.0),
            (Action::Reject, 15.0),
            (Action::Accept, 20.0),
        ]);
        assert_eq!(tally.accept_tokens, 30.0);
        assert_eq!(tally.reject_tokens, 15.0);
        assert!(tally.passes(0.5));
        assert!(!tally.passes(0.7));
    }

    #[test]
    fn test_abstain_counts_toward_neither_bloc() {
        let tally = VoteTally::from_voters(vec![
            (Action::Abstain, 100.0),
            (Action::Reject, 1.0),
            // A stale non-vote action contributes nothing either.
            (Action::Apply, 50.0),
        ]);
        assert_eq!(tally.accept_tokens, 0.0);
        assert_eq!(tally.reject_tokens, 1.0);
        assert!(!tally.passes(0.5));
    }

    #[test]
    fn test_quorum_boundary_passes() {
        // Accept tokens exactly quorum * expressed: >= means pass.
        let tally = VoteTally::from_voters(vec![(Action::Accept, 10.0), (Action::Reject, 10.0)]);
        assert!(tally.passes(0.5));
        assert!(!tally.passes(0.5000001));
    }

    #[test]
    fn test_all_rejects_fail_any_positive_quorum() {
        let tally = VoteTally::from_voters(vec![(Action::Reject, 35.0)]);
        assert!(!tally.passes(0.5));
        // With a zero quorum even an empty accept bloc passes.
        assert!(tally.passes(0.0));
    }

    proptest! {
        #[test]
        fn prop_verdict_monotone_in_accept_tokens(
            accept in 0.0f64..1_000.0,
            extra in 0.0f64..1_000.0,
            reject in 0.0f64..1_000.0,
            quorum in 0.0f64..=1.0,
        ) {
            let before = VoteTally { accept_tokens: accept, reject_tokens: reject };
            let after = VoteTally { accept_tokens: accept + extra, reject_tokens: reject };
            // Adding accept tokens never flips a passing verdict to failing.
            if before.passes(quorum) {
                prop_assert!(after.passes(quorum));
            }
        }

        #[test]
        fn prop_tally_order_irrelevant(
            a in 0.0f64..100.0,
            b in 0.0f64..100.0,
            r in 0.0f64..100.0,
        ) {
            let forward = VoteTally::from_voters(vec![
                (Action::Accept, a),
                (Action::Accept, b),
                (Action::Reject, r),
            ]);
            let backward = VoteTally::from_voters(vec![
                (Action::Reject, r),
                (Action::Accept, b),
                (Action::Accept, a),
            ]);
            prop_assert_eq!(forward, backward);
        }
    }
}
