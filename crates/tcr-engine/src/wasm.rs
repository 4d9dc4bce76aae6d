//! WASM bindings for the browser playground.

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;

use crate::{Game, GameConfig};

fn parse_config(config_json: &str) -> Result<GameConfig, JsError> {
    serde_json::from_str(config_json)
        .map_err(|e| JsError::new(&format!("Invalid game config: {}", e)))
}

/// Evaluate a full game description and return the snapshot: per-player
/// payoff matrices and best strategies, the vote verdict, and whether the
/// game is in equilibrium.
///
/// The frontend owns the mutable state; it re-submits the whole config
/// after every edit and re-renders from the returned snapshot.
#[wasm_bindgen]
pub fn evaluate_game(config_json: &str) -> Result<JsValue, JsError> {
    let config = parse_config(config_json)?;
    let game = Game::from_config(&config).map_err(|e| JsError::new(&e.to_string()))?;
    let data = game.game_data().map_err(|e| JsError::new(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&data)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// The playground's default scenario as config JSON: a challenged
/// application decided by three abstaining voters.
#[wasm_bindgen]
pub fn default_config() -> Result<String, JsError> {
    serde_json::to_string(&GameConfig::playground())
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Valid actions for the player at `player_index` in the config's list,
/// in canonical order.
#[wasm_bindgen]
pub fn valid_actions(config_json: &str, player_index: usize) -> Result<JsValue, JsError> {
    let config = parse_config(config_json)?;
    let game = Game::from_config(&config).map_err(|e| JsError::new(&e.to_string()))?;
    let player = game
        .players()
        .get(player_index)
        .ok_or_else(|| JsError::new(&format!("No player at index {}", player_index)))?;
    serde_wasm_bindgen::to_value(game.valid_actions(player))
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}
