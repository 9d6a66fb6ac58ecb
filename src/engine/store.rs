//! The meaning map and its mutation API.
//!
//! A `MeaningMap` keys rules by their first match word:
//!
//! ```text
//! "add"  -> [ {following: [cart], meaning: 1} ]
//! "i"    -> [ {following: [],     meaning: 1, trump: [-1]} ]
//! "pit"  -> [ {following: [],     meaning: 2, trump: [+1]} ]
//! ```
//!
//! ## Rule identity
//!
//! Every inserted rule gets a `RuleId` that is unique within its map and never
//! reused. A `RuleRef` (`first_word` + `RuleId`) addresses a rule for removal
//! or update and stays valid as long as the rule stays under the same key.
//! Rule IDs are not persisted: importing a map allocates fresh ones.
//!
//! ## Invariants
//!
//! - No key maps to an empty rule list.
//! - No key holds two structurally identical rules (same following words and
//!   meaning): `add_rule` returns the existing one and
//!   `update_rule_match_words` merges into it.
//! - Structural equality of maps ignores rule IDs.
//!
//! Mutation takes `&mut self`; sharing one map between threads that mutate it
//! requires external locking.

use super::codec::PersistedMap;
use crate::MeaningId;
use crate::error::{MeaningMapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque, map-unique rule identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a rule inside a specific `MeaningMap`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleRef {
    pub first_word: String,
    pub rule_id: RuleId,
}

/// A single rule. The key (first) word is stored by the map, not the rule.
#[derive(Debug, Clone)]
pub struct MeaningMapRule {
    id: RuleId,
    pub following_words: Vec<String>,
    pub meaning_id: MeaningId,
    /// Signed pairing IDs; the positive holder of an ID beats the negative one.
    pub trump_ids: Vec<i64>,
}

impl MeaningMapRule {
    pub fn id(&self) -> RuleId {
        self.id
    }

    /// Number of match words including the key word.
    pub fn word_count(&self) -> usize {
        self.following_words.len() + 1
    }

    /// The trump ID shared with `other`, as held by `self`.
    pub fn shared_trump_id(&self, other: &MeaningMapRule) -> Option<i64> {
        self.trump_ids.iter().copied().find(|id| other.trump_ids.iter().any(|o| o.abs() == id.abs()))
    }

    fn has_shape<S: AsRef<str>>(&self, following_words: &[S], meaning_id: &MeaningId) -> bool {
        self.meaning_id == *meaning_id
            && self.following_words.len() == following_words.len()
            && self.following_words.iter().zip(following_words).all(|(a, b)| a == b.as_ref())
    }
}

impl PartialEq for MeaningMapRule {
    fn eq(&self, other: &Self) -> bool {
        self.following_words == other.following_words
            && self.meaning_id == other.meaning_id
            && self.trump_ids == other.trump_ids
    }
}

impl Eq for MeaningMapRule {}

/// Compiled rule set: first word → ordered rules.
///
/// Serializes to the persisted rule-string format (see `codec.rs`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "PersistedMap", into = "PersistedMap")]
pub struct MeaningMap {
    rules: BTreeMap<String, Vec<MeaningMapRule>>,
    next_id: u64,
}

impl PartialEq for MeaningMap {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules
    }
}

impl Eq for MeaningMap {}

impl MeaningMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rule for `match_words` unless a structurally identical rule
    /// already exists; either way return a reference to the rule in the map.
    pub fn add_rule<S: AsRef<str>>(&mut self, match_words: &[S], meaning_id: &MeaningId) -> Result<RuleRef> {
        let (first, following) = match_words.split_first().ok_or(MeaningMapError::EmptyMatchWords)?;
        let first_word = first.as_ref();

        if let Some(existing) = self.rules_for(first_word).iter().find(|r| r.has_shape(following, meaning_id)) {
            return Ok(RuleRef { first_word: first_word.to_string(), rule_id: existing.id });
        }

        let following_words = following.iter().map(|w| w.as_ref().to_string()).collect();
        Ok(self.insert(first_word, following_words, meaning_id.clone(), Vec::new()))
    }

    /// Remove the referenced rule and return it.
    ///
    /// Fails when the first word has no rules or the rule is not under it.
    pub fn remove_rule(&mut self, rule_ref: &RuleRef) -> Result<MeaningMapRule> {
        let position = self.position(rule_ref)?;
        let list = self
            .rules
            .get_mut(&rule_ref.first_word)
            .ok_or_else(|| MeaningMapError::UnknownFirstWord(rule_ref.first_word.clone()))?;
        let removed = list.remove(position);
        if list.is_empty() {
            self.rules.remove(&rule_ref.first_word);
        }
        Ok(removed)
    }

    /// Replace the match words of the referenced rule.
    ///
    /// With an unchanged first word the rule is edited in place and
    /// `rule_ref` stays valid. Otherwise the rule moves to the new key, keeping
    /// its meaning and trump IDs, and the returned reference must be used from
    /// then on. Either way, landing on a structurally identical rule merges the
    /// trump IDs into it and returns that rule's reference instead.
    pub fn update_rule_match_words<S: AsRef<str>>(
        &mut self,
        rule_ref: &RuleRef,
        new_match_words: &[S],
    ) -> Result<RuleRef> {
        let position = self.position(rule_ref)?;
        let (first, following) = new_match_words.split_first().ok_or(MeaningMapError::EmptyMatchWords)?;
        let following_words: Vec<String> = following.iter().map(|w| w.as_ref().to_string()).collect();

        if first.as_ref() == rule_ref.first_word {
            let list = self
                .rules
                .get_mut(&rule_ref.first_word)
                .ok_or_else(|| MeaningMapError::UnknownFirstWord(rule_ref.first_word.clone()))?;
            let meaning_id = list[position].meaning_id.clone();
            let sibling = list
                .iter()
                .position(|r| r.id != rule_ref.rule_id && r.has_shape(following_words.as_slice(), &meaning_id));

            let Some(sibling) = sibling else {
                list[position].following_words = following_words;
                return Ok(rule_ref.clone());
            };
            let merged = list.remove(position);
            let sibling = if sibling > position { sibling - 1 } else { sibling };
            list[sibling].trump_ids.extend(merged.trump_ids);
            return Ok(RuleRef { first_word: rule_ref.first_word.clone(), rule_id: list[sibling].id });
        }

        let moved = self.remove_rule(rule_ref)?;
        let first_word = first.as_ref();
        let existing = self
            .rules
            .get_mut(first_word)
            .and_then(|list| list.iter_mut().find(|r| r.has_shape(following_words.as_slice(), &moved.meaning_id)));
        if let Some(existing) = existing {
            existing.trump_ids.extend(moved.trump_ids);
            return Ok(RuleRef { first_word: first_word.to_string(), rule_id: existing.id });
        }
        Ok(self.insert(first_word, following_words, moved.meaning_id, moved.trump_ids))
    }

    pub fn get(&self, rule_ref: &RuleRef) -> Option<&MeaningMapRule> {
        self.rules_for(&rule_ref.first_word).iter().find(|r| r.id == rule_ref.rule_id)
    }

    pub(crate) fn get_mut(&mut self, rule_ref: &RuleRef) -> Option<&mut MeaningMapRule> {
        self.rules.get_mut(&rule_ref.first_word)?.iter_mut().find(|r| r.id == rule_ref.rule_id)
    }

    /// Full match words (key word first) of the referenced rule.
    pub fn match_words(&self, rule_ref: &RuleRef) -> Option<Vec<String>> {
        let rule = self.get(rule_ref)?;
        let mut words = Vec::with_capacity(rule.word_count());
        words.push(rule_ref.first_word.clone());
        words.extend(rule.following_words.iter().cloned());
        Some(words)
    }

    /// Rules keyed by `word`, in insertion order.
    pub fn rules_for(&self, word: &str) -> &[MeaningMapRule] {
        self.rules.get(word).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_words(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Every rule with its key word, keys in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MeaningMapRule)> {
        self.rules.iter().flat_map(|(word, list)| list.iter().map(move |rule| (word.as_str(), rule)))
    }

    pub fn rule_refs(&self) -> Vec<RuleRef> {
        self.iter().map(|(word, rule)| RuleRef { first_word: word.to_string(), rule_id: rule.id }).collect()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Append a rule without the duplicate check.
    pub(crate) fn insert(
        &mut self,
        first_word: &str,
        following_words: Vec<String>,
        meaning_id: MeaningId,
        trump_ids: Vec<i64>,
    ) -> RuleRef {
        let id = RuleId(self.next_id);
        self.next_id += 1;
        self.rules.entry(first_word.to_string()).or_default().push(MeaningMapRule {
            id,
            following_words,
            meaning_id,
            trump_ids,
        });
        RuleRef { first_word: first_word.to_string(), rule_id: id }
    }

    fn position(&self, rule_ref: &RuleRef) -> Result<usize> {
        let list = self
            .rules
            .get(&rule_ref.first_word)
            .ok_or_else(|| MeaningMapError::UnknownFirstWord(rule_ref.first_word.clone()))?;
        list.iter().position(|r| r.id == rule_ref.rule_id).ok_or_else(|| MeaningMapError::UnknownRule {
            first_word: rule_ref.first_word.clone(),
            rule: rule_ref.rule_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn meaning(id: &str) -> MeaningId {
        MeaningId::parse(id).unwrap()
    }

    #[test]
    fn add_rule_keys_by_first_word_and_dedups() {
        let mut map = MeaningMap::new();
        let a = map.add_rule(&["add", "cart"], &meaning("1")).unwrap();
        let b = map.add_rule(&["add", "cart"], &meaning("1")).unwrap();
        let c = map.add_rule(&["add", "cart"], &meaning("2")).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(map.len(), 2);
        assert_eq!(map.rules_for("add")[0].following_words, vec!["cart"]);
        assert_eq!(map.match_words(&a).unwrap(), vec!["add", "cart"]);
        assert!(matches!(map.add_rule::<&str>(&[], &meaning("1")), Err(MeaningMapError::EmptyMatchWords)));
    }

    #[test]
    fn dedup_ignores_trump_ids() {
        let mut map = MeaningMap::new();
        let a = map.add_rule(&["i"], &meaning("1")).unwrap();
        map.get_mut(&a).unwrap().trump_ids.push(-1);
        let b = map.add_rule(&["i"], &meaning("1")).unwrap();
        assert_eq!(a, b);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn remove_rule_errors_on_unknown_references() {
        let mut map = MeaningMap::new();
        let a = map.add_rule(&["add", "cart"], &meaning("1")).unwrap();

        let missing_word = RuleRef { first_word: "remove".to_string(), rule_id: a.rule_id };
        assert!(matches!(map.remove_rule(&missing_word), Err(MeaningMapError::UnknownFirstWord(w)) if w == "remove"));

        let mut other = MeaningMap::new();
        other.add_rule(&["x"], &meaning("1")).unwrap();
        let foreign = other.add_rule(&["add"], &meaning("1")).unwrap();
        assert!(matches!(map.remove_rule(&foreign), Err(MeaningMapError::UnknownRule { .. })));

        map.remove_rule(&a).unwrap();
        assert!(map.is_empty());
        assert!(matches!(map.remove_rule(&a), Err(MeaningMapError::UnknownFirstWord(_))));
    }

    #[test]
    fn remove_then_add_restores_the_map() {
        let mut map = MeaningMap::new();
        map.add_rule(&["add", "cart"], &meaning("1")).unwrap();
        map.add_rule(&["remove"], &meaning("2")).unwrap();
        let last = map.add_rule(&["add", "ITEMS"], &meaning("3")).unwrap();
        let before = map.clone();

        let removed = map.remove_rule(&last).unwrap();
        assert_ne!(map, before);
        let mut words = vec!["add".to_string()];
        words.extend(removed.following_words);
        map.add_rule(&words, &removed.meaning_id).unwrap();
        assert_eq!(map, before);
    }

    #[test]
    fn update_with_same_first_word_keeps_identity() {
        let mut map = MeaningMap::new();
        let a = map.add_rule(&["add", "cart"], &meaning("1")).unwrap();
        let updated = map.update_rule_match_words(&a, &["add", "to", "cart"]).unwrap();

        assert_eq!(updated, a);
        assert_eq!(map.match_words(&a).unwrap(), vec!["add", "to", "cart"]);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn update_with_new_first_word_moves_rule_and_trump_ids() {
        let mut map = MeaningMap::new();
        let a = map.add_rule(&["add", "cart"], &meaning("1")).unwrap();
        map.get_mut(&a).unwrap().trump_ids.push(3);

        let moved = map.update_rule_match_words(&a, &["put", "cart"]).unwrap();
        assert_eq!(moved.first_word, "put");
        assert!(map.get(&a).is_none());
        assert!(map.rules_for("add").is_empty());

        let rule = map.get(&moved).unwrap();
        assert_eq!(rule.meaning_id, meaning("1"));
        assert_eq!(rule.trump_ids, vec![3]);
        assert!(matches!(map.update_rule_match_words(&a, &["x"]), Err(MeaningMapError::UnknownFirstWord(_))));
    }

    #[test]
    fn update_onto_identical_rule_merges_trump_ids() {
        let mut map = MeaningMap::new();
        let target = map.add_rule(&["put", "cart"], &meaning("1")).unwrap();
        let a = map.add_rule(&["add", "cart"], &meaning("1")).unwrap();
        map.get_mut(&a).unwrap().trump_ids.push(-2);

        let moved = map.update_rule_match_words(&a, &["put", "cart"]).unwrap();
        assert_eq!(moved, target);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&target).unwrap().trump_ids, vec![-2]);
    }

    #[test]
    fn same_key_update_onto_sibling_merges() {
        let mut map = MeaningMap::new();
        let cart = map.add_rule(&["add", "cart"], &meaning("1")).unwrap();
        let basket = map.add_rule(&["add", "basket"], &meaning("1")).unwrap();
        map.get_mut(&basket).unwrap().trump_ids.push(-2);

        let updated = map.update_rule_match_words(&basket, &["add", "cart"]).unwrap();
        assert_eq!(updated, cart);
        assert_eq!(map.len(), 1);
        assert!(map.get(&basket).is_none());
        assert_eq!(map.get(&cart).unwrap().trump_ids, vec![-2]);

        let other = map.add_rule(&["add", "cart"], &meaning("2")).unwrap();
        assert_eq!(map.update_rule_match_words(&other, &["add", "cart", "now"]).unwrap(), other);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn shared_trump_id_uses_absolute_values() {
        let mut map = MeaningMap::new();
        let winner = map.add_rule(&["pit"], &meaning("2")).unwrap();
        let loser = map.add_rule(&["i"], &meaning("1")).unwrap();
        map.get_mut(&winner).unwrap().trump_ids.extend([4, 7]);
        map.get_mut(&loser).unwrap().trump_ids.push(-7);

        let (w, l) = (map.get(&winner).unwrap(), map.get(&loser).unwrap());
        assert_eq!(w.shared_trump_id(l), Some(7));
        assert_eq!(l.shared_trump_id(w), Some(-7));
    }
}
