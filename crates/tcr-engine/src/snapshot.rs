//! Read-only snapshot of the whole game.
//!
//! This is the surface the UI queries after every mutation:
//! everything is recomputed from current state on each call, so the snapshot
//! is a pure function of the game and two captures without an intervening
//! mutation compare equal.

use serde::Serialize;

use crate::game::{Game, GameError};
use crate::payoff::{matrix_for, PayoffMatrix};
use crate::player::{Action, Player};
use crate::vote::VoteTally;

/// One player's view: their record, payoff matrix, and best response to the
/// other players' choices.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerReport {
    pub player: Player,
    pub payoffs: PayoffMatrix,
    pub best_strategy: Action,
}

impl PlayerReport {
    fn build(game: &Game, player: &Player) -> Self {
        let payoffs = matrix_for(game, player);
        let best_strategy = payoffs.best_strategy();
        Self {
            player: player.clone(),
            payoffs,
            best_strategy,
        }
    }

    /// Whether the player's recorded action is a best response.
    pub fn plays_best_strategy(&self) -> bool {
        self.payoffs.is_best_strategy(self.player.action)
    }
}

/// Full game snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameData {
    pub candidate: Option<PlayerReport>,
    pub challenger: Option<PlayerReport>,
    pub voters: Vec<PlayerReport>,
    /// Accept/reject token totals behind the verdict.
    pub tally: VoteTally,
    pub verdict: bool,
    pub is_equilibrium: bool,
}

impl GameData {
    /// Capture the current state. A `Some` candidate/challenger id that no
    /// longer resolves to a player is reported as [`GameError::PlayerNotFound`].
    pub fn capture(game: &Game) -> Result<Self, GameError> {
        let candidate = game
            .candidate()
            .map(|id| game.player(id))
            .transpose()?
            .map(|p| PlayerReport::build(game, p));
        let challenger = game
            .challenger()
            .map(|id| game.player(id))
            .transpose()?
            .map(|p| PlayerReport::build(game, p));
        let voters = game
            .eligible_voters()
            .map(|p| PlayerReport::build(game, p))
            .collect();
        let tally = game.vote_tally();
        Ok(Self {
            candidate,
            challenger,
            voters,
            verdict: tally.passes(game.params.vote_quorum),
            tally,
            is_equilibrium: is_equilibrium(game),
        })
    }
}

/// Whether every player's effective action is simultaneously a best
/// response. All players are visited on every call.
pub fn is_equilibrium(game: &Game) -> bool {
    game.players().iter().fold(true, |all_best, player| {
        let matrix = matrix_for(game, player);
        all_best & matrix.is_best_strategy(game.effective_action(player))
    })
}

impl Game {
    /// Snapshot the full game: per-role payoff reports, the vote verdict,
    /// and the equilibrium test.
    pub fn game_data(&self) -> Result<GameData, GameError> {
        GameData::capture(self)
    }
}
