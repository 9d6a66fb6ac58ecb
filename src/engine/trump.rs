//! Trump ID consistency checks.
//!
//! A trump ID pairs exactly two rules: the rule holding `+k` beats the rule
//! holding `-k` whenever both complete on the same input. The compiler assigns
//! them; `validate_trump_ids` re-derives the pairing from a finished map and
//! reports every absolute ID that is not held by exactly one winner and one
//! distinct loser.
//!
//! Defects point at compiler bugs (or hand-edited maps), so they are logged and
//! returned as data rather than raised.

use super::store::{MeaningMap, RuleId};
use std::collections::BTreeMap;

bitflags::bitflags! {
    /// What is wrong with one absolute trump ID.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TrumpDefect: u8 {
        const MISSING_WINNER   = 1 << 0;
        const MISSING_LOSER    = 1 << 1;
        const DUPLICATE_WINNER = 1 << 2;
        const DUPLICATE_LOSER  = 1 << 3;
        const SELF_PAIRED      = 1 << 4;
        const ZERO_ID          = 1 << 5;
    }
}

#[derive(Default)]
struct Holders {
    winners: Vec<RuleId>,
    losers: Vec<RuleId>,
}

/// Check every trump ID in `map`; an empty result means the set is consistent.
pub fn validate_trump_ids(map: &MeaningMap) -> BTreeMap<u64, TrumpDefect> {
    let mut holders: BTreeMap<u64, Holders> = BTreeMap::new();
    let mut defects: BTreeMap<u64, TrumpDefect> = BTreeMap::new();

    for (_, rule) in map.iter() {
        for &id in &rule.trump_ids {
            let entry = holders.entry(id.unsigned_abs()).or_default();
            match id.signum() {
                1 => entry.winners.push(rule.id()),
                -1 => entry.losers.push(rule.id()),
                _ => {
                    defects.insert(0, TrumpDefect::ZERO_ID);
                }
            }
        }
    }

    for (id, holders) in holders {
        let mut defect = defects.get(&id).copied().unwrap_or(TrumpDefect::empty());
        match holders.winners.len() {
            0 => defect |= TrumpDefect::MISSING_WINNER,
            1 => {}
            _ => defect |= TrumpDefect::DUPLICATE_WINNER,
        }
        match holders.losers.len() {
            0 => defect |= TrumpDefect::MISSING_LOSER,
            1 => {}
            _ => defect |= TrumpDefect::DUPLICATE_LOSER,
        }
        if holders.winners.iter().any(|w| holders.losers.contains(w)) {
            defect |= TrumpDefect::SELF_PAIRED;
        }

        if defect.is_empty() {
            defects.remove(&id);
        } else {
            log::error!("trump id {id:x} is inconsistent: {defect:?}");
            defects.insert(id, defect);
        }
    }

    defects
}
