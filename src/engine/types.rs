//! Wire types for the rules engine.
//!
//! Everything here crosses the engine boundary as JSON, so the serde shapes
//! are part of the contract: phase names use their display form
//! ("Main Phase 1"), rulings tag on `status`, and mana-pool fields default to
//! zero when absent.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::White => "White",
            Color::Blue => "Blue",
            Color::Black => "Black",
            Color::Red => "Red",
            Color::Green => "Green",
            Color::Colorless => "Colorless",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum CardType {
    Artifact,
    Creature,
    Enchantment,
    Instant,
    Land,
    Planeswalker,
    Sorcery,
    Battle,
    /// Fallback for type labels this engine does not model.
    Unknown,
}

impl<'de> Deserialize<'de> for CardType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(match label.as_str() {
            "Artifact" => CardType::Artifact,
            "Creature" => CardType::Creature,
            "Enchantment" => CardType::Enchantment,
            "Instant" => CardType::Instant,
            "Land" => CardType::Land,
            "Planeswalker" => CardType::Planeswalker,
            "Sorcery" => CardType::Sorcery,
            "Battle" => CardType::Battle,
            _ => CardType::Unknown,
        })
    }
}

/// Turn phases, serialized under their table-talk names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Phase {
    Untap,
    Upkeep,
    Draw,
    #[serde(rename = "Main Phase 1")]
    Main1,
    #[serde(rename = "Combat")]
    Combat,
    #[serde(rename = "Main Phase 2")]
    Main2,
    End,
}

/// Verdict for one checked condition. `{"status":"legal"}` or
/// `{"status":"illegal","reason":...}` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Ruling {
    Legal,
    Illegal { reason: String },
}

impl Ruling {
    pub fn illegal(reason: impl Into<String>) -> Self {
        Ruling::Illegal {
            reason: reason.into(),
        }
    }

    pub fn is_legal(&self) -> bool {
        matches!(self, Ruling::Legal)
    }
}

impl fmt::Display for Ruling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ruling::Legal => f.write_str("Legal"),
            Ruling::Illegal { reason } => write!(f, "Illegal: {reason}"),
        }
    }
}

/// Result of an apply-action request. On success the caller replaces its
/// whole state with `new_state`; there is no field-level merge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApplyOutcome {
    Success { new_state: GameState },
    Denied { reason: String },
}

/// Floating mana available to pay costs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManaPool {
    #[serde(default)]
    pub white: u32,
    #[serde(default)]
    pub blue: u32,
    #[serde(default)]
    pub black: u32,
    #[serde(default)]
    pub red: u32,
    #[serde(default)]
    pub green: u32,
    #[serde(default)]
    pub colorless: u32,
}

impl ManaPool {
    /// Saturating total across all colors. Pool fields come straight off the
    /// wire, so the sum must not be allowed to wrap.
    pub fn total(&self) -> u32 {
        [
            self.white,
            self.blue,
            self.black,
            self.red,
            self.green,
            self.colorless,
        ]
        .into_iter()
        .fold(0, u32::saturating_add)
    }

    /// Deducts `cost` from this pool, or leaves it untouched on failure.
    ///
    /// Colored symbols must be covered by the matching colors; generic is
    /// then drained from whatever remains, colorless first so colored mana
    /// is kept when possible.
    pub fn pay(&mut self, cost: &ManaCost) -> Result<(), PaymentError> {
        let mut remaining = self.clone();

        for (pool, need, color) in [
            (&mut remaining.white, cost.colored.white, Color::White),
            (&mut remaining.blue, cost.colored.blue, Color::Blue),
            (&mut remaining.black, cost.colored.black, Color::Black),
            (&mut remaining.red, cost.colored.red, Color::Red),
            (&mut remaining.green, cost.colored.green, Color::Green),
            (
                &mut remaining.colorless,
                cost.colored.colorless,
                Color::Colorless,
            ),
        ] {
            if *pool < need {
                return Err(PaymentError::ShortColor {
                    color,
                    need,
                    have: *pool,
                });
            }
            *pool -= need;
        }

        let available = remaining.total();
        if available < cost.generic {
            return Err(PaymentError::ShortGeneric {
                need: cost.generic,
                have: available,
            });
        }

        let mut owed = cost.generic;
        for pool in [
            &mut remaining.colorless,
            &mut remaining.red,
            &mut remaining.green,
            &mut remaining.black,
            &mut remaining.blue,
            &mut remaining.white,
        ] {
            let take = (*pool).min(owed);
            *pool -= take;
            owed -= take;
            if owed == 0 {
                break;
            }
        }

        *self = remaining;
        Ok(())
    }
}

/// A parsed mana cost: the generic portion plus per-color requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManaCost {
    pub generic: u32,
    pub colored: ManaPool,
}

impl ManaCost {
    /// Parses cost strings like `{1}{U}{U}` or `{4}`. An empty string is a
    /// free spell. `{X}` contributes zero to the base cost.
    pub fn parse(cost: &str) -> Result<Self, CostParseError> {
        let mut parsed = ManaCost::default();
        if cost.is_empty() {
            return Ok(parsed);
        }

        for token in cost.split('}').filter(|t| !t.is_empty()) {
            let symbol = token.trim_start_matches('{');
            match symbol {
                "W" => parsed.colored.white += 1,
                "U" => parsed.colored.blue += 1,
                "B" => parsed.colored.black += 1,
                "R" => parsed.colored.red += 1,
                "G" => parsed.colored.green += 1,
                "C" => parsed.colored.colorless += 1,
                "X" => {}
                other => {
                    if let Ok(n) = other.parse::<u32>() {
                        parsed.generic = parsed
                            .generic
                            .checked_add(n)
                            .ok_or(CostParseError::TooLarge)?;
                    } else {
                        return Err(CostParseError::UnknownSymbol {
                            symbol: other.to_string(),
                        });
                    }
                }
            }
        }
        Ok(parsed)
    }

    #[allow(dead_code)] // used in tests
    pub fn total(&self) -> u32 {
        self.generic.saturating_add(self.colored.total())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CostParseError {
    #[error("unknown mana symbol '{symbol}'")]
    UnknownSymbol { symbol: String },
    #[error("generic cost is too large")]
    TooLarge,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Not enough {color} mana (need {need}, have {have})")]
    ShortColor { color: Color, need: u32, have: u32 },
    #[error("Not enough generic mana (need {need}, have {have})")]
    ShortGeneric { need: u32, have: u32 },
}

/// A card as it is being played, before it becomes a board object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub name: String,
    pub type_line: Vec<CardType>,
    #[serde(default)]
    pub mana_cost: String,
}

/// A card on the battlefield. Only `name` is required on the wire; the
/// remaining fields default so sparse board descriptors still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permanent {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub oracle_text: String,
    #[serde(default)]
    pub mana_value: u32,
    #[serde(default)]
    pub types: Vec<CardType>,
    #[serde(default)]
    pub colors: Vec<Color>,
    #[serde(default)]
    pub is_legendary: bool,
    #[serde(default)]
    pub controller: String,
    #[serde(default)]
    pub is_tapped: bool,
    #[serde(default)]
    pub damage_marked: u32,
}

impl Permanent {
    /// Builds the board object a resolved card becomes. Board-only fields
    /// start at their defaults; the id is derived from the card name and a
    /// caller-provided ordinal.
    pub fn from_card(card: &Card, controller: String, ordinal: usize) -> Self {
        Permanent {
            id: format!("{}-{ordinal}", card.name),
            name: card.name.clone(),
            oracle_text: String::new(),
            mana_value: 0,
            types: card.type_line.clone(),
            colors: Vec::new(),
            is_legendary: false,
            controller,
            is_tapped: false,
            damage_marked: 0,
        }
    }
}

/// Snapshot of the board from the asking player's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub active_player: String,
    pub is_active_player: bool,
    pub phase: Phase,
    pub battlefield: Vec<Permanent>,
    /// Last element is the top of the stack.
    pub stack: Vec<String>,
    pub lands_played: u8,
    #[serde(default)]
    pub mana_pool: ManaPool,
    /// What the player is trying to do, if anything.
    #[serde(default)]
    pub pending_action: Option<GameAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum GameAction {
    CastSpell(Card),
    PlayLand(Card),
}
