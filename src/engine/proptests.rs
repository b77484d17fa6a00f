//! Property-based tests for the mana subsystem.
//!
//! Payment is the one place the engine does arithmetic rather than simple
//! predicate checks, so it gets generated coverage: whatever the pool and
//! cost, `pay` must agree with the affordability arithmetic and either
//! deduct exactly the cost or leave the pool untouched.

use super::types::{ManaCost, ManaPool};
use proptest::prelude::*;

fn arb_pool(max: u32) -> impl Strategy<Value = ManaPool> {
    (0..=max, 0..=max, 0..=max, 0..=max, 0..=max, 0..=max).prop_map(
        |(white, blue, black, red, green, colorless)| ManaPool {
            white,
            blue,
            black,
            red,
            green,
            colorless,
        },
    )
}

fn render(cost: &ManaCost) -> String {
    let mut out = String::new();
    if cost.generic > 0 {
        out.push_str(&format!("{{{}}}", cost.generic));
    }
    for (symbol, count) in [
        ("W", cost.colored.white),
        ("U", cost.colored.blue),
        ("B", cost.colored.black),
        ("R", cost.colored.red),
        ("G", cost.colored.green),
        ("C", cost.colored.colorless),
    ] {
        for _ in 0..count {
            out.push_str(&format!("{{{symbol}}}"));
        }
    }
    out
}

fn covers_colored(pool: &ManaPool, colored: &ManaPool) -> bool {
    pool.white >= colored.white
        && pool.blue >= colored.blue
        && pool.black >= colored.black
        && pool.red >= colored.red
        && pool.green >= colored.green
        && pool.colorless >= colored.colorless
}

proptest! {
    #[test]
    fn parse_counts_every_symbol(generic in 0u32..=12, colored in arb_pool(4)) {
        let cost = ManaCost { generic, colored };
        let parsed = ManaCost::parse(&render(&cost)).unwrap();
        prop_assert_eq!(parsed, cost);
    }

    #[test]
    fn payment_agrees_with_affordability(pool in arb_pool(6), generic in 0u32..=12, colored in arb_pool(4)) {
        let cost = ManaCost { generic, colored };
        let affordable = covers_colored(&pool, &cost.colored)
            && pool.total() - cost.colored.total() >= cost.generic;

        let mut paying = pool.clone();
        match paying.pay(&cost) {
            Ok(()) => {
                prop_assert!(affordable, "pay succeeded on an unaffordable cost");
                prop_assert_eq!(paying.total(), pool.total() - cost.total());
            }
            Err(_) => {
                prop_assert!(!affordable, "pay refused an affordable cost");
                prop_assert_eq!(paying, pool);
            }
        }
    }
}
