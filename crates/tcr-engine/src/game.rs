//! Game state: parameters, the roster, role resolution, and token
//! availability.
//!
//! The engine owns no hidden state: everything a query returns is a pure
//! function of the fields held here, and callers mutate those fields
//! directly between queries.

use serde::{Deserialize, Deserializer, Serialize};

use crate::player::{Action, Player, PlayerId, Role};
use crate::vote::VoteTally;

// ── Errors ───────────────────────────────────────────────────────────

/// Errors surfaced at the engine's construction/query boundary.
///
/// Stale *actions* are never errors; they are silently substituted with the
/// role's first valid action wherever a realized payoff is computed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameError {
    /// A role assignment or lookup named an id not present in the roster.
    PlayerNotFound(PlayerId),
    /// A numeric field did not parse to a finite number.
    InvalidNumber { value: String },
    /// A config index did not refer to an entry in the player list.
    BadPlayerIndex { index: usize, len: usize },
}

impl core::fmt::Display for GameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GameError::PlayerNotFound(id) => write!(f, "no player with id {}", id),
            GameError::InvalidNumber { value } => {
                write!(f, "{:?} is not a finite number", value)
            }
            GameError::BadPlayerIndex { index, len } => {
                write!(f, "player index {} out of range ({} players)", index, len)
            }
        }
    }
}

impl std::error::Error for GameError {}

// ── Numeric coercion ─────────────────────────────────────────────────

/// Parse an externally supplied numeric field.
///
/// UI layers hand over raw text-input values; anything that is not a finite
/// number is rejected rather than coerced to zero.
pub fn parse_number(raw: &str) -> Result<f64, GameError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(GameError::InvalidNumber {
            value: raw.to_string(),
        }),
    }
}

/// Deserialize a number that may arrive as a JSON number or a numeric
/// string, rejecting non-finite values either way.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberOrText;

    impl serde::de::Visitor<'_> for NumberOrText {
        type Value = f64;

        fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
            f.write_str("a finite number or a numeric string")
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<f64, E> {
            if v.is_finite() {
                Ok(v)
            } else {
                Err(E::custom("number must be finite"))
            }
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<f64, E> {
            parse_number(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(NumberOrText)
}

// ── Parameters ───────────────────────────────────────────────────────

/// Tunable round parameters, mutated freely by the caller between queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Tokens a candidate or challenger must stake to act.
    #[serde(deserialize_with = "lenient_number")]
    pub min_deposit: f64,
    /// Fraction of the loser's forfeited deposit paid to the prevailing
    /// candidate/challenger; the rest goes to the winning voter bloc.
    #[serde(deserialize_with = "lenient_number")]
    pub dispensation_pct: f64,
    /// Fraction of a losing voter's tokens forfeited to the winning bloc.
    #[serde(deserialize_with = "lenient_number")]
    pub minority_bloc_slash: f64,
    /// Minimum accept-token fraction of the expressed vote required to pass.
    #[serde(deserialize_with = "lenient_number")]
    pub vote_quorum: f64,
    /// Fixed cost of applying, paid regardless of outcome.
    #[serde(deserialize_with = "lenient_number")]
    pub application_effort: f64,
    /// Fixed cost of challenging, paid regardless of outcome.
    #[serde(deserialize_with = "lenient_number")]
    pub challenge_effort: f64,
    /// Fixed cost of voting, paid regardless of outcome.
    #[serde(deserialize_with = "lenient_number")]
    pub vote_effort: f64,
}

impl Parameters {
    /// The original playground's starting parameters.
    pub fn playground() -> Self {
        Self {
            min_deposit: 5.0,
            dispensation_pct: 0.5,
            minority_bloc_slash: 0.1,
            vote_quorum: 0.5,
            application_effort: 0.0,
            challenge_effort: 0.0,
            vote_effort: 0.0,
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::playground()
    }
}

// ── Construction configs ─────────────────────────────────────────────

/// JSON-friendly player description; ids are assigned by the game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    #[serde(deserialize_with = "lenient_number")]
    pub tokens: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub registry_value: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub quality: f64,
    pub action: Action,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tokens: 0.0,
            registry_value: 0.0,
            quality: 0.0,
            action: Action::Abstain,
        }
    }
}

impl PlayerConfig {
    /// A standard voter entry: the pool-resizing default in the original UI.
    pub fn voter(tokens: f64) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }
}

/// Complete game description for one-shot construction.
///
/// The WASM boundary re-submits one of these after every UI mutation.
/// `candidate` / `challenger` are indexes into `players`; when omitted and
/// the roster has at least two entries, the playground convention applies:
/// the first listed player challenges and the second is the candidate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub params: Parameters,
    pub players: Vec<PlayerConfig>,
    pub candidate: Option<usize>,
    pub challenger: Option<usize>,
}

impl GameConfig {
    /// The scenario the original playground boots with: a challenged
    /// application decided by three 10-token abstaining voters.
    pub fn playground() -> Self {
        Self {
            params: Parameters::playground(),
            players: vec![
                PlayerConfig {
                    tokens: 5.0,
                    action: Action::Challenge,
                    ..PlayerConfig::default()
                },
                PlayerConfig {
                    tokens: 5.0,
                    registry_value: 100.0,
                    quality: 1.0,
                    action: Action::Apply,
                },
                PlayerConfig::voter(10.0),
                PlayerConfig::voter(10.0),
                PlayerConfig::voter(10.0),
            ],
            candidate: Some(1),
            challenger: Some(0),
        }
    }
}

// ── Game ─────────────────────────────────────────────────────────────

/// One round of the listing game: parameters, roster, role assignments, and
/// the cross-round registry of already-listed deposit holders.
#[derive(Clone, Debug, PartialEq)]
pub struct Game {
    pub params: Parameters,
    players: Vec<Player>,
    candidate: Option<PlayerId>,
    challenger: Option<PlayerId>,
    registry: Vec<PlayerId>,
    next_id: u64,
}

impl Game {
    pub fn new(params: Parameters) -> Self {
        Self {
            params,
            players: Vec::new(),
            candidate: None,
            challenger: None,
            registry: Vec::new(),
            next_id: 0,
        }
    }

    /// Build a full game from a config, resolving candidate/challenger
    /// indexes (or the first-challenges/second-applies convention) to ids.
    pub fn from_config(config: &GameConfig) -> Result<Self, GameError> {
        let mut game = Game::new(config.params.clone());
        let ids: Vec<PlayerId> = config
            .players
            .iter()
            .map(|p| game.add_player(p.clone()))
            .collect();
        let resolve = |index: Option<usize>, conventional: usize| match index {
            Some(i) => ids
                .get(i)
                .copied()
                .map(Some)
                .ok_or(GameError::BadPlayerIndex {
                    index: i,
                    len: ids.len(),
                }),
            None => Ok(ids.get(conventional).copied().filter(|_| ids.len() >= 2)),
        };
        game.challenger = resolve(config.challenger, 0)?;
        game.candidate = resolve(config.candidate, 1)?;
        Ok(game)
    }

    /// Add a player, assigning the next id.
    pub fn add_player(&mut self, config: PlayerConfig) -> PlayerId {
        let id = PlayerId(self.next_id);
        self.next_id += 1;
        self.players.push(Player::new(
            id,
            config.tokens,
            config.registry_value,
            config.quality,
            config.action,
        ));
        id
    }

    /// Replace the voter pool, keeping the candidate and challenger entries.
    ///
    /// New voters are appended with fresh ids; ids of dropped voters are
    /// never reissued.
    pub fn replace_voters(&mut self, voters: Vec<PlayerConfig>) {
        let candidate = self.candidate;
        let challenger = self.challenger;
        self.players
            .retain(|p| candidate == Some(p.id()) || challenger == Some(p.id()));
        for voter in voters {
            self.add_player(voter);
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.players
            .iter()
            .find(|p| p.id() == id)
            .ok_or(GameError::PlayerNotFound(id))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(GameError::PlayerNotFound(id))
    }

    pub fn candidate(&self) -> Option<PlayerId> {
        self.candidate
    }

    pub fn challenger(&self) -> Option<PlayerId> {
        self.challenger
    }

    /// Assign (or clear) the candidate. `None` means no listing is sought.
    pub fn set_candidate(&mut self, id: Option<PlayerId>) -> Result<(), GameError> {
        if let Some(id) = id {
            self.player(id)?;
        }
        self.candidate = id;
        Ok(())
    }

    /// Assign (or clear) the challenger. `None` means the listing is
    /// unopposed.
    pub fn set_challenger(&mut self, id: Option<PlayerId>) -> Result<(), GameError> {
        if let Some(id) = id {
            self.player(id)?;
        }
        self.challenger = id;
        Ok(())
    }

    /// Record a player as holding a listing deposit from an earlier round.
    pub fn add_to_registry(&mut self, id: PlayerId) -> Result<(), GameError> {
        self.player(id)?;
        if !self.registry.contains(&id) {
            self.registry.push(id);
        }
        Ok(())
    }

    pub fn registry(&self) -> &[PlayerId] {
        &self.registry
    }

    /// Role dispatch by id-equality. Candidate wins if one player somehow
    /// holds both assignments.
    pub fn role_of(&self, id: PlayerId) -> Role {
        if self.candidate == Some(id) {
            Role::Candidate
        } else if self.challenger == Some(id) {
            Role::Challenger
        } else {
            Role::Voter
        }
    }

    /// Spendable balance: the listing deposit is locked while a player is
    /// the acting candidate, the acting challenger, or an already-listed
    /// registry member. Floored at zero.
    pub fn available_tokens(&self, player: &Player) -> f64 {
        let staked = self.candidate == Some(player.id())
            || self.challenger == Some(player.id())
            || self.registry.contains(&player.id());
        let balance = if staked {
            player.tokens - self.params.min_deposit
        } else {
            player.tokens
        };
        balance.max(0.0)
    }

    /// Everyone except the candidate and the challenger.
    pub fn eligible_voters(&self) -> impl Iterator<Item = &Player> {
        self.players
            .iter()
            .filter(move |p| self.role_of(p.id()) == Role::Voter)
    }

    /// Actions currently valid for this player: role-dependent, and gated on
    /// the raw balance covering the deposit for the acting roles.
    pub fn valid_actions(&self, player: &Player) -> &'static [Action] {
        self.role_of(player.id())
            .valid_actions(player.tokens >= self.params.min_deposit)
    }

    /// The recorded action when valid for the player's current role, else
    /// the first valid action. Stale actions are substituted here, never
    /// surfaced as errors.
    pub fn effective_action(&self, player: &Player) -> Action {
        let valid = self.valid_actions(player);
        if valid.contains(&player.action) {
            player.action
        } else {
            valid[0]
        }
    }

    /// Outcome of the round's vote over the eligible voters' recorded
    /// actions.
    pub fn verdict(&self) -> bool {
        self.vote_tally().passes(self.params.vote_quorum)
    }

    /// Accept/reject token totals among the eligible voters.
    pub fn vote_tally(&self) -> VoteTally {
        VoteTally::from_voters(self.eligible_voters().map(|p| (p.action, p.tokens)))
    }

    /// Token appreciation multiplier from the live candidate's listing
    /// quality; 1.0 when the round has no candidate.
    pub fn appreciation_factor(&self) -> f64 {
        match self.candidate.and_then(|id| self.player(id).ok()) {
            Some(candidate) => crate::appreciation(candidate.quality),
            None => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn playground() -> Game {
        Game::from_config(&GameConfig::playground()).unwrap()
    }

    #[test]
    fn test_playground_roles_follow_convention() {
        let game = playground();
        assert_eq!(game.challenger(), Some(PlayerId(0)));
        assert_eq!(game.candidate(), Some(PlayerId(1)));
        assert_eq!(game.role_of(PlayerId(0)), Role::Challenger);
        assert_eq!(game.role_of(PlayerId(1)), Role::Candidate);
        assert_eq!(game.role_of(PlayerId(2)), Role::Voter);
        assert_eq!(game.eligible_voters().count(), 3);
    }

    #[test]
    fn test_convention_applies_when_indexes_omitted() {
        let config = GameConfig {
            players: vec![PlayerConfig::voter(5.0), PlayerConfig::voter(5.0)],
            candidate: None,
            challenger: None,
            ..GameConfig::default()
        };
        let game = Game::from_config(&config).unwrap();
        assert_eq!(game.challenger(), Some(PlayerId(0)));
        assert_eq!(game.candidate(), Some(PlayerId(1)));
    }

    #[test]
    fn test_no_roles_on_tiny_roster() {
        let config = GameConfig {
            players: vec![PlayerConfig::voter(5.0)],
            ..GameConfig::default()
        };
        let game = Game::from_config(&config).unwrap();
        assert_eq!(game.candidate(), None);
        assert_eq!(game.challenger(), None);
    }

    #[test]
    fn test_bad_player_index_rejected() {
        let config = GameConfig {
            players: vec![PlayerConfig::voter(5.0)],
            candidate: Some(3),
            ..GameConfig::default()
        };
        assert_eq!(
            Game::from_config(&config),
            Err(GameError::BadPlayerIndex { index: 3, len: 1 })
        );
    }

    #[test]
    fn test_ids_survive_voter_replacement() {
        let mut game = playground();
        game.replace_voters(vec![PlayerConfig::voter(10.0); 2]);
        let ids: Vec<PlayerId> = game.players().iter().map(|p| p.id()).collect();
        // Candidate and challenger keep their ids; new voters never reuse
        // the dropped voters' ids 2..=4.
        assert_eq!(ids, vec![PlayerId(0), PlayerId(1), PlayerId(5), PlayerId(6)]);
    }

    #[test]
    fn test_deposit_locking() {
        let mut game = playground();
        let challenger = game.player(PlayerId(0)).unwrap().clone();
        let candidate = game.player(PlayerId(1)).unwrap().clone();
        let voter = game.player(PlayerId(2)).unwrap().clone();
        // Acting roles have their 5-token deposit locked.
        assert_eq!(game.available_tokens(&challenger), 0.0);
        assert_eq!(game.available_tokens(&candidate), 0.0);
        assert_eq!(game.available_tokens(&voter), 10.0);
        // Registry members are locked too.
        game.add_to_registry(PlayerId(2)).unwrap();
        let voter = game.player(PlayerId(2)).unwrap().clone();
        assert_eq!(game.available_tokens(&voter), 5.0);
    }

    #[test]
    fn test_available_tokens_floors_at_zero() {
        let mut game = playground();
        game.player_mut(PlayerId(1)).unwrap().tokens = 2.0;
        let candidate = game.player(PlayerId(1)).unwrap().clone();
        assert_eq!(game.available_tokens(&candidate), 0.0);
    }

    #[test]
    fn test_effective_action_substitutes_stale_actions() {
        let mut game = playground();
        // A voter left holding an acting-role action falls back to the first
        // valid voter action.
        game.player_mut(PlayerId(2)).unwrap().action = Action::Apply;
        let voter = game.player(PlayerId(2)).unwrap().clone();
        assert_eq!(game.effective_action(&voter), Action::Accept);
        // A challenger who can no longer fund the deposit cannot challenge.
        game.player_mut(PlayerId(0)).unwrap().tokens = 4.0;
        let challenger = game.player(PlayerId(0)).unwrap().clone();
        assert_eq!(challenger.action, Action::Challenge);
        assert_eq!(game.effective_action(&challenger), Action::NotChallenge);
    }

    #[test]
    fn test_lookup_unknown_id() {
        let mut game = playground();
        assert_eq!(
            game.player(PlayerId(99)).err(),
            Some(GameError::PlayerNotFound(PlayerId(99)))
        );
        assert_eq!(
            game.set_candidate(Some(PlayerId(99))),
            Err(GameError::PlayerNotFound(PlayerId(99)))
        );
    }

    #[test]
    fn test_unopposed_round() {
        let mut game = playground();
        game.set_challenger(None).unwrap();
        assert_eq!(game.eligible_voters().count(), 4);
        assert_eq!(game.role_of(PlayerId(0)), Role::Voter);
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert_eq!(parse_number(" 2.5 "), Ok(2.5));
        assert!(parse_number("abc").is_err());
        assert!(parse_number("NaN").is_err());
        assert!(parse_number("inf").is_err());
        assert!(parse_number("").is_err());
    }

    #[test]
    fn test_config_accepts_numbers_as_text() {
        let config: GameConfig = serde_json::from_str(
            r#"{
                "params": {"min_deposit": "7", "vote_quorum": 0.6},
                "players": [
                    {"tokens": "12.5", "action": "abstain"},
                    {"tokens": 5, "registry_value": "100", "quality": "1", "action": "apply"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.params.min_deposit, 7.0);
        assert_eq!(config.params.vote_quorum, 0.6);
        // Omitted parameters keep their playground defaults.
        assert_eq!(config.params.dispensation_pct, 0.5);
        assert_eq!(config.players[0].tokens, 12.5);
        assert_eq!(config.players[1].registry_value, 100.0);
    }

    #[test]
    fn test_config_rejects_unparseable_text() {
        let result = serde_json::from_str::<GameConfig>(
            r#"{"params": {"min_deposit": "lots"}, "players": []}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_appreciation_factor_without_candidate() {
        let mut game = playground();
        game.set_candidate(None).unwrap();
        assert_eq!(game.appreciation_factor(), 1.0);
    }

    proptest! {
        #[test]
        fn prop_available_tokens_never_negative(
            tokens in 0.0f64..1_000.0,
            min_deposit in 0.0f64..1_000.0,
            listed in any::<bool>(),
        ) {
            let mut game = Game::new(Parameters {
                min_deposit,
                ..Parameters::playground()
            });
            let id = game.add_player(PlayerConfig::voter(tokens));
            if listed {
                game.add_to_registry(id).unwrap();
            }
            let player = game.player(id).unwrap().clone();
            prop_assert!(game.available_tokens(&player) >= 0.0);
        }

        #[test]
        fn prop_effective_action_is_always_valid(
            tokens in 0.0f64..20.0,
            action_index in 0usize..7,
        ) {
            let actions = [
                Action::Apply, Action::NotApply, Action::Challenge,
                Action::NotChallenge, Action::Accept, Action::Reject,
                Action::Abstain,
            ];
            let mut game = playground();
            game.player_mut(PlayerId(1)).unwrap().tokens = tokens;
            game.player_mut(PlayerId(1)).unwrap().action = actions[action_index];
            let candidate = game.player(PlayerId(1)).unwrap().clone();
            let effective = game.effective_action(&candidate);
            prop_assert!(game.valid_actions(&candidate).contains(&effective));
        }
    }
}
