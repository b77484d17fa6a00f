//! Native rules-validation engine, "the Judge".
//!
//! The agent only ever talks to this module through the documented call
//! contracts: a legality pass over a full [`GameState`], the board-only play
//! check, and `apply_action`, which validates and then returns a full
//! replacement state.

mod rules;
mod types;

#[cfg(test)]
mod proptests;

pub use rules::Judge;
pub use types::{GameState, Permanent, Ruling};
