//! Legality checks and action execution.
//!
//! Pure board logic: data in, verdicts out. Nothing here touches the network
//! or the conversation layer.

use super::types::{
    ApplyOutcome, Card, CardType, GameAction, GameState, ManaCost, Permanent, Phase, Ruling,
};

/// Stateless rules-engine handle. Constructed once at startup and shared;
/// every check is a pure function of its inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Judge;

impl Judge {
    pub fn new() -> Self {
        Judge
    }

    /// Full legality pass: standing board violations first, then the pending
    /// action. Returns `[Legal]` when nothing is wrong.
    pub fn assess_state(&self, state: &GameState) -> Vec<Ruling> {
        let mut rulings = self.legend_rule_violations(&state.battlefield);

        if let Some(action) = &state.pending_action {
            match action {
                GameAction::PlayLand(card) => rulings.push(Self::check_land_drop(state, card)),
                GameAction::CastSpell(card) => {
                    let timing = Self::check_cast_timing(state, card);
                    if timing.is_legal() {
                        rulings.push(Self::check_mana_cost(state, card));
                    } else {
                        rulings.push(timing);
                    }
                }
            }
        }

        if rulings.is_empty() {
            vec![Ruling::Legal]
        } else {
            rulings
        }
    }

    /// Answers "may a card with this name be played onto this board":
    /// standing violations plus the incoming-copy legend check. The incoming
    /// copy is assumed to share the printed card's properties, so a same-named
    /// legendary permanent already on the battlefield rules it out.
    pub fn assess_play(&self, battlefield: &[Permanent], card_name: &str) -> Vec<Ruling> {
        let mut rulings = self.legend_rule_violations(battlefield);

        if battlefield
            .iter()
            .any(|p| p.is_legendary && p.name == card_name)
        {
            rulings.push(Ruling::illegal(format!(
                "Legend Rule: a legendary permanent named '{card_name}' is already on the battlefield"
            )));
        }

        if rulings.is_empty() {
            vec![Ruling::Legal]
        } else {
            rulings
        }
    }

    /// Validates and then executes the pending action, producing the full
    /// replacement state. Any illegal ruling denies the whole request.
    pub fn apply_action(&self, state: &GameState) -> ApplyOutcome {
        for ruling in self.assess_state(state) {
            if let Ruling::Illegal { reason } = ruling {
                return ApplyOutcome::Denied { reason };
            }
        }

        let mut next = state.clone();
        match next.pending_action.take() {
            Some(GameAction::PlayLand(card)) => {
                next.lands_played += 1;
                let permanent =
                    Permanent::from_card(&card, next.active_player.clone(), next.battlefield.len());
                next.battlefield.push(permanent);
            }
            Some(GameAction::CastSpell(card)) => {
                let cost = match ManaCost::parse(&card.mana_cost) {
                    Ok(cost) => cost,
                    Err(err) => {
                        return ApplyOutcome::Denied {
                            reason: format!("Invalid cost: {err}"),
                        }
                    }
                };
                if let Err(err) = next.mana_pool.pay(&cost) {
                    return ApplyOutcome::Denied {
                        reason: err.to_string(),
                    };
                }
                next.stack.push(card.name);
            }
            None => {}
        }

        ApplyOutcome::Success { new_state: next }
    }

    /// Legend rule (CR 704.5j): two legendary permanents sharing a name under
    /// one controller cannot coexist. Reports one ruling per offending pair.
    fn legend_rule_violations(&self, battlefield: &[Permanent]) -> Vec<Ruling> {
        let mut rulings = Vec::new();
        for (i, a) in battlefield.iter().enumerate() {
            if !a.is_legendary {
                continue;
            }
            for b in battlefield.iter().skip(i + 1) {
                if b.is_legendary && a.name == b.name && a.controller == b.controller {
                    rulings.push(Ruling::illegal(format!("Legend Rule: {}", a.name)));
                }
            }
        }
        rulings
    }

    /// Land drops (CR 305): one per turn, your own turn, main phase, empty
    /// stack.
    fn check_land_drop(state: &GameState, card: &Card) -> Ruling {
        if !card.type_line.contains(&CardType::Land) {
            return Ruling::illegal("Not a Land");
        }
        if !state.is_active_player {
            return Ruling::illegal("Not your turn");
        }
        if !state.stack.is_empty() {
            return Ruling::illegal("Stack not empty");
        }
        if state.lands_played >= 1 {
            return Ruling::illegal("Land limit reached");
        }
        match state.phase {
            Phase::Main1 | Phase::Main2 => Ruling::Legal,
            _ => Ruling::illegal("Wrong phase"),
        }
    }

    /// Instants go anywhere; everything else is sorcery speed.
    fn check_cast_timing(state: &GameState, card: &Card) -> Ruling {
        if card.type_line.contains(&CardType::Instant) {
            return Ruling::Legal;
        }
        if !state.is_active_player {
            return Ruling::illegal("Not your turn");
        }
        if !state.stack.is_empty() {
            return Ruling::illegal("Stack not empty");
        }
        match state.phase {
            Phase::Main1 | Phase::Main2 => Ruling::Legal,
            _ => Ruling::illegal("Wrong phase"),
        }
    }

    /// Simulates payment against a scratch pool so the caller's state is
    /// never touched by a check.
    fn check_mana_cost(state: &GameState, card: &Card) -> Ruling {
        let cost = match ManaCost::parse(&card.mana_cost) {
            Ok(cost) => cost,
            Err(err) => return Ruling::illegal(format!("Invalid cost: {err}")),
        };

        let mut scratch = state.mana_pool.clone();
        match scratch.pay(&cost) {
            Ok(()) => Ruling::Legal,
            Err(err) => Ruling::illegal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::ManaPool;

    fn base_state() -> GameState {
        GameState {
            active_player: "Hero".into(),
            is_active_player: true,
            phase: Phase::Main1,
            battlefield: Vec::new(),
            stack: Vec::new(),
            lands_played: 0,
            mana_pool: ManaPool::default(),
            pending_action: None,
        }
    }

    fn land(name: &str) -> Card {
        Card {
            name: name.into(),
            type_line: vec![CardType::Land],
            mana_cost: String::new(),
        }
    }

    fn spell(name: &str, types: Vec<CardType>, cost: &str) -> Card {
        Card {
            name: name.into(),
            type_line: types,
            mana_cost: cost.into(),
        }
    }

    fn legendary(name: &str, controller: &str) -> Permanent {
        Permanent {
            id: format!("{name}-0"),
            name: name.into(),
            oracle_text: String::new(),
            mana_value: 4,
            types: vec![CardType::Creature],
            colors: Vec::new(),
            is_legendary: true,
            controller: controller.into(),
            is_tapped: false,
            damage_marked: 0,
        }
    }

    #[test]
    fn empty_state_is_legal() {
        let rulings = Judge::new().assess_state(&base_state());
        assert_eq!(rulings, vec![Ruling::Legal]);
    }

    #[test]
    fn land_drop_in_main_phase_is_legal() {
        let mut state = base_state();
        state.pending_action = Some(GameAction::PlayLand(land("Mountain")));
        assert_eq!(Judge::new().assess_state(&state), vec![Ruling::Legal]);
    }

    #[test]
    fn land_drop_with_spell_on_stack_is_illegal() {
        let mut state = base_state();
        state.stack.push("Lightning Bolt".into());
        state.pending_action = Some(GameAction::PlayLand(land("Mountain")));
        let rulings = Judge::new().assess_state(&state);
        match &rulings[0] {
            Ruling::Illegal { reason } => assert!(!reason.is_empty()),
            Ruling::Legal => panic!("land drop under an occupied stack must be illegal"),
        }
    }

    #[test]
    fn second_land_drop_is_illegal() {
        let mut state = base_state();
        state.lands_played = 1;
        state.pending_action = Some(GameAction::PlayLand(land("Island")));
        let rulings = Judge::new().assess_state(&state);
        assert_eq!(rulings, vec![Ruling::illegal("Land limit reached")]);
    }

    #[test]
    fn land_drop_outside_main_phase_is_illegal() {
        let mut state = base_state();
        state.phase = Phase::Combat;
        state.pending_action = Some(GameAction::PlayLand(land("Swamp")));
        let rulings = Judge::new().assess_state(&state);
        assert_eq!(rulings, vec![Ruling::illegal("Wrong phase")]);
    }

    #[test]
    fn creature_cast_on_opponents_turn_is_illegal() {
        let mut state = base_state();
        state.is_active_player = false;
        state.pending_action = Some(GameAction::CastSpell(spell(
            "Grizzly Bears",
            vec![CardType::Creature],
            "",
        )));
        let rulings = Judge::new().assess_state(&state);
        assert_eq!(rulings, vec![Ruling::illegal("Not your turn")]);
    }

    #[test]
    fn instant_cast_on_opponents_turn_is_legal() {
        let mut state = base_state();
        state.is_active_player = false;
        state.mana_pool.blue = 2;
        state.pending_action = Some(GameAction::CastSpell(spell(
            "Counterspell",
            vec![CardType::Instant],
            "{U}{U}",
        )));
        assert_eq!(Judge::new().assess_state(&state), vec![Ruling::Legal]);
    }

    #[test]
    fn generic_cost_payable_with_colored_mana() {
        let mut state = base_state();
        state.mana_pool.red = 1;
        state.pending_action = Some(GameAction::CastSpell(spell(
            "Ornithopter of Paradise",
            vec![CardType::Artifact, CardType::Creature],
            "{1}",
        )));
        assert_eq!(Judge::new().assess_state(&state), vec![Ruling::Legal]);
    }

    #[test]
    fn mixed_cost_paid_from_single_color() {
        let mut state = base_state();
        state.mana_pool.blue = 3;
        state.pending_action = Some(GameAction::CastSpell(spell(
            "Counterspell",
            vec![CardType::Instant],
            "{1}{U}{U}",
        )));
        assert_eq!(Judge::new().assess_state(&state), vec![Ruling::Legal]);
    }

    #[test]
    fn insufficient_generic_mana_is_reported() {
        let mut state = base_state();
        state.mana_pool.red = 3;
        state.pending_action = Some(GameAction::CastSpell(spell(
            "Golem",
            vec![CardType::Artifact],
            "{4}",
        )));
        let rulings = Judge::new().assess_state(&state);
        match &rulings[0] {
            Ruling::Illegal { reason } => assert!(reason.contains("Not enough generic")),
            Ruling::Legal => panic!("should fail the generic check"),
        }
    }

    #[test]
    fn wrong_color_mana_is_reported() {
        let mut state = base_state();
        state.mana_pool.red = 10;
        state.pending_action = Some(GameAction::CastSpell(spell(
            "Unsummon",
            vec![CardType::Instant],
            "{U}",
        )));
        let rulings = Judge::new().assess_state(&state);
        match &rulings[0] {
            Ruling::Illegal { reason } => assert!(reason.contains("Not enough Blue")),
            Ruling::Legal => panic!("should fail the color check"),
        }
    }

    #[test]
    fn oversized_cost_draws_an_invalid_cost_ruling() {
        let mut state = base_state();
        state.mana_pool.blue = 2;
        state.pending_action = Some(GameAction::CastSpell(spell(
            "Absurd Engine",
            vec![CardType::Artifact],
            "{4294967295}{1}",
        )));
        let rulings = Judge::new().assess_state(&state);
        match &rulings[0] {
            Ruling::Illegal { reason } => assert!(reason.contains("Invalid cost")),
            Ruling::Legal => panic!("overflowing generic cost must be illegal"),
        }
    }

    #[test]
    fn exact_blue_cost_boundaries() {
        let judge = Judge::new();
        for (blue, expect_legal) in [(2, true), (1, false)] {
            let mut state = base_state();
            state.mana_pool.blue = blue;
            state.pending_action = Some(GameAction::CastSpell(spell(
                "Counterspell",
                vec![CardType::Instant],
                "{U}{U}",
            )));
            let rulings = judge.assess_state(&state);
            assert_eq!(rulings[0].is_legal(), expect_legal, "blue={blue}");
        }
    }

    #[test]
    fn duplicate_legendaries_trigger_the_legend_rule() {
        let mut state = base_state();
        state.battlefield = vec![
            legendary("Urza, Lord High Artificer", "Hero"),
            legendary("Urza, Lord High Artificer", "Hero"),
        ];
        let rulings = Judge::new().assess_state(&state);
        match &rulings[0] {
            Ruling::Illegal { reason } => assert!(reason.contains("Legend Rule")),
            Ruling::Legal => panic!("duplicate legendaries must be flagged"),
        }
    }

    #[test]
    fn same_name_different_controllers_is_fine() {
        let mut state = base_state();
        state.battlefield = vec![
            legendary("Urza, Lord High Artificer", "Hero"),
            legendary("Urza, Lord High Artificer", "Villain"),
        ];
        assert_eq!(Judge::new().assess_state(&state), vec![Ruling::Legal]);
    }

    #[test]
    fn assess_play_flags_incoming_duplicate() {
        let battlefield = vec![legendary("Urza, Lord High Artificer", "me")];
        let rulings = Judge::new().assess_play(&battlefield, "Urza, Lord High Artificer");
        match &rulings[0] {
            Ruling::Illegal { reason } => assert!(reason.contains("Legend Rule")),
            Ruling::Legal => panic!("second copy must be flagged"),
        }
    }

    #[test]
    fn assess_play_allows_fresh_names() {
        let battlefield = vec![legendary("Urza, Lord High Artificer", "me")];
        let rulings = Judge::new().assess_play(&battlefield, "Grizzly Bears");
        assert_eq!(rulings, vec![Ruling::Legal]);
    }

    #[test]
    fn assessment_is_deterministic() {
        let mut state = base_state();
        state.mana_pool.blue = 1;
        state.pending_action = Some(GameAction::CastSpell(spell(
            "Counterspell",
            vec![CardType::Instant],
            "{U}{U}",
        )));
        let judge = Judge::new();
        assert_eq!(judge.assess_state(&state), judge.assess_state(&state));
    }

    #[test]
    fn apply_land_drop_updates_the_board() {
        let mut state = base_state();
        state.pending_action = Some(GameAction::PlayLand(land("Mountain")));
        match Judge::new().apply_action(&state) {
            ApplyOutcome::Success { new_state } => {
                assert_eq!(new_state.lands_played, 1);
                assert_eq!(new_state.battlefield.len(), 1);
                assert_eq!(new_state.battlefield[0].name, "Mountain");
                assert!(new_state.pending_action.is_none());
            }
            ApplyOutcome::Denied { reason } => panic!("unexpected denial: {reason}"),
        }
    }

    #[test]
    fn apply_cast_pays_mana_and_stacks_the_spell() {
        let mut state = base_state();
        state.mana_pool.blue = 3;
        state.pending_action = Some(GameAction::CastSpell(spell(
            "Counterspell",
            vec![CardType::Instant],
            "{1}{U}{U}",
        )));
        match Judge::new().apply_action(&state) {
            ApplyOutcome::Success { new_state } => {
                assert_eq!(new_state.mana_pool.total(), 0);
                assert_eq!(new_state.stack, vec!["Counterspell".to_string()]);
                assert!(new_state.pending_action.is_none());
            }
            ApplyOutcome::Denied { reason } => panic!("unexpected denial: {reason}"),
        }
        assert_eq!(state.mana_pool.blue, 3, "input state must stay untouched");
    }

    #[test]
    fn apply_denies_illegal_actions_untouched() {
        let mut state = base_state();
        state.lands_played = 1;
        state.pending_action = Some(GameAction::PlayLand(land("Island")));
        match Judge::new().apply_action(&state) {
            ApplyOutcome::Denied { reason } => assert_eq!(reason, "Land limit reached"),
            ApplyOutcome::Success { .. } => panic!("second land drop must be denied"),
        }
    }
}
