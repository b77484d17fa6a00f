//! Rules-engine tools
//!
//! Thin adapters between model-facing JSON arguments and the [`Judge`].
//! Malformed arguments always come back as error outcomes so the model can
//! see what it got wrong and try again.

use super::Tool;
use crate::engine::{GameState, Judge, Permanent, Ruling};
use crate::transcript::ToolOutcome;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

fn render_rulings(rulings: &[Ruling]) -> String {
    rulings
        .iter()
        .map(Ruling::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Quick legality check for a single card entering the battlefield.
pub struct ValidateMoveTool {
    judge: Arc<Judge>,
}

impl ValidateMoveTool {
    pub fn new(judge: Arc<Judge>) -> Self {
        Self { judge }
    }
}

#[derive(Debug, Deserialize)]
struct ValidateMoveInput {
    card_name: String,
    battlefield: Vec<Permanent>,
}

#[async_trait]
impl Tool for ValidateMoveTool {
    fn name(&self) -> &str {
        "validate_move"
    }

    fn description(&self) -> String {
        "Check whether a named card can legally join the battlefield, \
         given the permanents already there. Catches legend rule conflicts. \
         Use this for quick 'can I play this card' questions."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["card_name", "battlefield"],
            "properties": {
                "card_name": {
                    "type": "string",
                    "description": "Name of the card entering the battlefield"
                },
                "battlefield": {
                    "type": "array",
                    "description": "Permanents currently on the battlefield",
                    "items": {
                        "type": "object",
                        "required": ["name"],
                        "properties": {
                            "name": {"type": "string"},
                            "controller": {"type": "string"},
                            "is_legendary": {"type": "boolean"},
                            "types": {"type": "array", "items": {"type": "string"}}
                        }
                    }
                }
            }
        })
    }

    async fn run(&self, arguments: Value) -> ToolOutcome {
        let input: ValidateMoveInput = match serde_json::from_value(arguments) {
            Ok(input) => input,
            Err(e) => return ToolOutcome::error(format!("Invalid arguments: {e}")),
        };

        let rulings = self.judge.assess_play(&input.battlefield, &input.card_name);
        ToolOutcome::ok(json!({
            "status": "success",
            "ruling": render_rulings(&rulings),
        }))
    }
}

/// Full legality review of a game state.
pub struct CheckBoardStateTool {
    judge: Arc<Judge>,
}

impl CheckBoardStateTool {
    pub fn new(judge: Arc<Judge>) -> Self {
        Self { judge }
    }
}

#[async_trait]
impl Tool for CheckBoardStateTool {
    fn name(&self) -> &str {
        "check_board_state"
    }

    fn description(&self) -> String {
        "Run a full legality review of a game state: legend rule violations \
         plus the pending action's timing, land-drop, and mana requirements. \
         Pass the complete game state JSON the user provided."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["active_player", "is_active_player", "phase", "battlefield", "stack", "lands_played"],
            "properties": {
                "active_player": {"type": "string"},
                "is_active_player": {"type": "boolean"},
                "phase": {
                    "type": "string",
                    "enum": ["Untap", "Upkeep", "Draw", "Main Phase 1", "Combat", "Main Phase 2", "End"]
                },
                "battlefield": {"type": "array", "items": {"type": "object"}},
                "stack": {"type": "array", "items": {"type": "string"}},
                "lands_played": {"type": "integer", "minimum": 0},
                "mana_pool": {"type": "object"},
                "pending_action": {"type": ["object", "null"]}
            }
        })
    }

    async fn run(&self, arguments: Value) -> ToolOutcome {
        let state: GameState = match serde_json::from_value(arguments) {
            Ok(state) => state,
            Err(e) => return ToolOutcome::error(format!("Invalid game state: {e}")),
        };

        let rulings = self.judge.assess_state(&state);
        match serde_json::to_value(&rulings) {
            Ok(value) => ToolOutcome::ok(json!({"rulings": value})),
            Err(e) => ToolOutcome::error(format!("Failed to encode rulings: {e}")),
        }
    }
}

/// Validate-and-resolve for a game state's pending action.
pub struct ApplyActionTool {
    judge: Arc<Judge>,
}

impl ApplyActionTool {
    pub fn new(judge: Arc<Judge>) -> Self {
        Self { judge }
    }
}

#[async_trait]
impl Tool for ApplyActionTool {
    fn name(&self) -> &str {
        "apply_action"
    }

    fn description(&self) -> String {
        "Validate and resolve the pending action of a game state. On success \
         returns the complete resulting state, which replaces the old one \
         wholesale. On denial returns the judge's reason and the state is \
         unchanged."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["active_player", "is_active_player", "phase", "battlefield", "stack", "lands_played", "pending_action"],
            "properties": {
                "active_player": {"type": "string"},
                "is_active_player": {"type": "boolean"},
                "phase": {"type": "string"},
                "battlefield": {"type": "array", "items": {"type": "object"}},
                "stack": {"type": "array", "items": {"type": "string"}},
                "lands_played": {"type": "integer", "minimum": 0},
                "mana_pool": {"type": "object"},
                "pending_action": {
                    "type": "object",
                    "required": ["type", "payload"],
                    "properties": {
                        "type": {"type": "string", "enum": ["CastSpell", "PlayLand"]},
                        "payload": {"type": "object"}
                    }
                }
            }
        })
    }

    async fn run(&self, arguments: Value) -> ToolOutcome {
        let state: GameState = match serde_json::from_value(arguments) {
            Ok(state) => state,
            Err(e) => return ToolOutcome::error(format!("Invalid game state: {e}")),
        };

        let outcome = self.judge.apply_action(&state);
        match serde_json::to_value(&outcome) {
            Ok(value) => ToolOutcome::ok(value),
            Err(e) => ToolOutcome::error(format!("Failed to encode outcome: {e}")),
        }
    }
}
