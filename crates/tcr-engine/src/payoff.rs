//! Per-role payoff matrices and the best-response resolver.
//!
//! Each builder produces every valid action's payoff under every outcome
//! column, plus the column actually realized for that action given the other
//! players' choices. The voter builder re-tallies the vote once per
//! hypothetical action, so a voter's realized column reflects the outcome
//! *if they voted that way*, not their recorded vote.

use serde::Serialize;

use crate::game::Game;
use crate::player::{Action, Player, Role};
use crate::vote::VoteTally;

/// Outcome column of a payoff matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The vote accepted the listing (candidate and voter matrices).
    Accepted,
    /// The vote rejected the listing (candidate and voter matrices).
    Rejected,
    /// Nobody challenged; the listing goes through without a vote.
    NotChallenged,
    /// The challenge prevailed: the listing was rejected.
    Win,
    /// The challenge failed: the listing was accepted.
    Lose,
}

/// One matrix cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Cell {
    pub outcome: Outcome,
    pub payoff: f64,
}

/// One action row: its payoff under every outcome column, and the column
/// realized for this action.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Row {
    pub action: Action,
    pub selected: Outcome,
    pub cells: Vec<Cell>,
}

impl Row {
    fn new(action: Action, selected: Outcome, cells: Vec<(Outcome, f64)>) -> Self {
        Self {
            action,
            selected,
            cells: cells
                .into_iter()
                .map(|(outcome, payoff)| Cell { outcome, payoff })
                .collect(),
        }
    }

    /// Payoff in the realized column.
    pub fn realized(&self) -> f64 {
        self.cells
            .iter()
            .find(|cell| cell.outcome == self.selected)
            .map(|cell| cell.payoff)
            .expect("selected column present in every row")
    }
}

/// Action × outcome payoff table for one player.
///
/// Rows are in canonical action order and cover exactly the actions
/// currently valid for the player, so the table is never empty.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PayoffMatrix {
    rows: Vec<Row>,
}

impl PayoffMatrix {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.rows.iter().map(|row| row.action)
    }

    fn row(&self, action: Action) -> Option<&Row> {
        self.rows.iter().find(|row| row.action == action)
    }

    /// Payoff of `action` under a specific outcome column.
    pub fn payoff(&self, action: Action, outcome: Outcome) -> Option<f64> {
        self.row(action)?
            .cells
            .iter()
            .find(|cell| cell.outcome == outcome)
            .map(|cell| cell.payoff)
    }

    /// The column realized for `action`.
    pub fn selected(&self, action: Action) -> Option<Outcome> {
        self.row(action).map(|row| row.selected)
    }

    /// Payoff of `action` in its realized column.
    pub fn realized(&self, action: Action) -> Option<f64> {
        self.row(action).map(Row::realized)
    }

    /// The action with the highest realized payoff. Ties go to the earlier
    /// row, so the positive action wins an exact tie with the null action.
    pub fn best_strategy(&self) -> Action {
        self.rows
            .iter()
            .map(|row| (row.action, row.realized()))
            .reduce(|best, next| if next.1 > best.1 { next } else { best })
            .map(|(action, _)| action)
            .expect("payoff matrix has at least one row")
    }

    /// Whether `action` realizes the same payoff as the best strategy.
    ///
    /// Exact `f64` comparison: both sides come from the same arithmetic in
    /// the same pass. An action with no row is never a best strategy.
    pub fn is_best_strategy(&self, action: Action) -> bool {
        self.realized(action) == self.realized(self.best_strategy())
    }
}

// ── Matrix builders ──────────────────────────────────────────────────

/// Signed token-value delta from the round's listing quality.
fn value_change(tokens: f64, game: &Game) -> f64 {
    tokens * (game.appreciation_factor() - 1.0)
}

/// Whether a challenge is actually live: a challenger is assigned and their
/// effective action is to challenge.
fn challenge_is_live(game: &Game) -> bool {
    match game.challenger().and_then(|id| game.player(id).ok()) {
        Some(challenger) => game.effective_action(challenger) == Action::Challenge,
        None => false,
    }
}

/// Voter's token share of a bloc they join. A bloc holding no tokens at all
/// confers no share.
fn bloc_share(tokens: f64, other_bloc_tokens: f64) -> f64 {
    let total = other_bloc_tokens + tokens;
    if total > 0.0 {
        tokens / total
    } else {
        0.0
    }
}

/// Candidate matrix: `apply` (when the deposit is fundable) over
/// accepted/rejected/not-challenged, and the all-zero `not_apply` row.
pub fn candidate_matrix(game: &Game, player: &Player) -> PayoffMatrix {
    let p = &game.params;
    let selected = if !challenge_is_live(game) {
        Outcome::NotChallenged
    } else if game.verdict() {
        Outcome::Accepted
    } else {
        Outcome::Rejected
    };
    let can_stake = player.tokens >= p.min_deposit;
    let mut rows = Vec::new();
    for action in Role::Candidate.valid_actions(can_stake) {
        let cells = match action {
            Action::Apply => vec![
                (
                    Outcome::Accepted,
                    player.registry_value + p.min_deposit * p.dispensation_pct
                        - p.application_effort,
                ),
                (Outcome::Rejected, -p.min_deposit - p.application_effort),
                (
                    Outcome::NotChallenged,
                    player.registry_value - p.application_effort,
                ),
            ],
            _ => vec![
                (Outcome::Accepted, 0.0),
                (Outcome::Rejected, 0.0),
                (Outcome::NotChallenged, 0.0),
            ],
        };
        rows.push(Row::new(*action, selected, cells));
    }
    PayoffMatrix { rows }
}

/// Challenger matrix: `challenge` (when the deposit is fundable) over
/// win/lose, and `not_challenge` carrying only passive appreciation.
pub fn challenger_matrix(game: &Game, player: &Player) -> PayoffMatrix {
    let p = &game.params;
    let delta = value_change(player.tokens, game);
    // Listing accepted means the challenge failed.
    let selected = if game.verdict() {
        Outcome::Lose
    } else {
        Outcome::Win
    };
    let can_stake = player.tokens >= p.min_deposit;
    let mut rows = Vec::new();
    for action in Role::Challenger.valid_actions(can_stake) {
        let cells = match action {
            Action::Challenge => vec![
                (
                    Outcome::Win,
                    p.min_deposit * p.dispensation_pct - p.challenge_effort,
                ),
                (
                    Outcome::Lose,
                    delta - p.min_deposit - p.challenge_effort,
                ),
            ],
            _ => vec![(Outcome::Win, delta), (Outcome::Lose, delta)],
        };
        rows.push(Row::new(*action, selected, cells));
    }
    PayoffMatrix { rows }
}

/// Voter matrix over accepted/rejected.
///
/// The realized column of each row answers "what would the verdict be if
/// this voter voted that way": the other eligible voters' ballots stay
/// fixed and this voter's ballot is replaced (or omitted, for abstain)
/// before re-tallying.
pub fn voter_matrix(game: &Game, player: &Player) -> PayoffMatrix {
    let p = &game.params;
    let delta = value_change(player.tokens, game);
    let others = VoteTally::from_voters(
        game.eligible_voters()
            .filter(|v| v.id() != player.id())
            .map(|v| (v.action, v.tokens)),
    );

    let accept_share = bloc_share(player.tokens, others.accept_tokens);
    let reject_share = bloc_share(player.tokens, others.reject_tokens);
    let slashed = player.tokens * p.minority_bloc_slash;
    let voter_deposit_cut = (1.0 - p.dispensation_pct) * p.min_deposit;

    let column = |accepted: bool| {
        if accepted {
            Outcome::Accepted
        } else {
            Outcome::Rejected
        }
    };
    let if_accept = column(others.with(Action::Accept, player.tokens).passes(p.vote_quorum));
    let if_reject = column(others.with(Action::Reject, player.tokens).passes(p.vote_quorum));
    let if_abstain = column(others.passes(p.vote_quorum));

    PayoffMatrix {
        rows: vec![
            Row::new(
                Action::Accept,
                if_accept,
                vec![
                    (
                        Outcome::Accepted,
                        delta
                            + voter_deposit_cut * accept_share
                            + others.reject_tokens * p.minority_bloc_slash * accept_share
                            - p.vote_effort,
                    ),
                    (Outcome::Rejected, -slashed - p.vote_effort),
                ],
            ),
            Row::new(
                Action::Reject,
                if_reject,
                vec![
                    (Outcome::Accepted, delta - slashed - p.vote_effort),
                    (
                        Outcome::Rejected,
                        voter_deposit_cut * reject_share
                            + others.accept_tokens * p.minority_bloc_slash * reject_share
                            - p.vote_effort,
                    ),
                ],
            ),
            Row::new(
                Action::Abstain,
                if_abstain,
                vec![(Outcome::Accepted, delta), (Outcome::Rejected, 0.0)],
            ),
        ],
    }
}

/// Build the role-appropriate matrix for a player.
pub fn matrix_for(game: &Game, player: &Player) -> PayoffMatrix {
    match game.role_of(player.id()) {
        Role::Candidate => candidate_matrix(game, player),
        Role::Challenger => challenger_matrix(game, player),
        Role::Voter => voter_matrix(game, player),
    }
}
