//! Payoff and equilibrium engine for one round of a Token-Curated Registry
//! listing game.
//!
//! Three roles play: a candidate applying for a listing, a challenger who
//! may contest it, and token-holding voters who decide a contested round.
//! For each player the engine builds a payoff matrix over their currently
//! valid actions, resolves which outcome column each action would actually
//! realize, and tests whether the chosen action is a best response; the
//! game as a whole is in equilibrium when every player's is.
//!
//! The engine holds no hidden state: callers mutate players and parameters
//! directly and re-query, and every query recomputes from scratch.
//! This crate is compiled to:
//! - Native (for embedding and tests)
//! - WASM (for the browser playground)

mod game;
mod payoff;
mod player;
mod snapshot;
mod vote;

#[cfg(feature = "wasm")]
mod wasm;

pub use game::{parse_number, Game, GameConfig, GameError, Parameters, PlayerConfig};
pub use payoff::{
    candidate_matrix, challenger_matrix, matrix_for, voter_matrix, Cell, Outcome, PayoffMatrix,
    Row,
};
pub use player::{Action, Player, PlayerId, Role};
pub use snapshot::{is_equilibrium, GameData, PlayerReport};
pub use vote::VoteTally;

/// Baseline for the quality score: appreciation is `(100 + quality) / 100`.
pub const QUALITY_BASELINE: f64 = 100.0;

/// Multiplicative token-value factor from a listing of the given quality
/// (quality 1 ⇒ 1.01, quality −5 ⇒ 0.95).
pub fn appreciation(quality: f64) -> f64 {
    (QUALITY_BASELINE + quality) / QUALITY_BASELINE
}
