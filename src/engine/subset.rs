//! Subset/superset detection.
//!
//! Utterance A is a *subset* of utterance B (labeled with a different meaning)
//! when all of A's words occur in B in the same order, gaps allowed:
//!
//! ```text
//! A: i love you
//! B: i love you falling in a pit
//!    ^ ^    ^
//! ```
//!
//! No choice of A's words can ever exclude B, so such pairs are recorded in a
//! `SubsetIndex` and resolved later with trump IDs instead of word choice.
//!
//! The relation is acyclic: utterances are unique, so a superset always has
//! strictly more words than its subset.

use crate::{Classification, MeaningId, Utterance};
use std::collections::HashMap;

/// True when `match_words` occur in `utterance_words` in order, gaps allowed.
pub fn do_match_words_match_utterance<M, U>(match_words: &[M], utterance_words: &[U]) -> bool
where
    M: AsRef<str>,
    U: AsRef<str>,
{
    let mut cursor = 0;
    for word in utterance_words {
        if cursor == match_words.len() {
            break;
        }
        if match_words[cursor].as_ref() == word.as_ref() {
            cursor += 1;
        }
    }
    cursor == match_words.len()
}

/// Utterances of meanings other than `exclude_meaning_id` that contain every
/// word of `utterance` in order.
pub fn find_supersets<'c>(
    utterance: &Utterance,
    exclude_meaning_id: &MeaningId,
    classification: &'c Classification,
) -> Vec<&'c Utterance> {
    let words = utterance.words();
    classification
        .utterances()
        .filter(|(meaning_id, _)| *meaning_id != exclude_meaning_id)
        .filter(|(_, candidate)| do_match_words_match_utterance(&words, &candidate.words()))
        .map(|(_, candidate)| candidate)
        .collect()
}

/// Every subset utterance of a classification with its supersets.
#[derive(Debug, Clone, Default)]
pub struct SubsetIndex<'c> {
    entries: Vec<(&'c Utterance, Vec<&'c Utterance>)>,
    by_utterance: HashMap<&'c str, usize>,
}

impl<'c> SubsetIndex<'c> {
    /// Supersets recorded for `utterance`, if it is a subset.
    pub fn supersets_of(&self, utterance: &Utterance) -> Option<&[&'c Utterance]> {
        self.by_utterance.get(utterance.as_str()).map(|&i| self.entries[i].1.as_slice())
    }

    pub fn is_subset(&self, utterance: &Utterance) -> bool {
        self.by_utterance.contains_key(utterance.as_str())
    }

    /// `(subset, supersets)` entries in classification order.
    pub fn iter(&self) -> impl Iterator<Item = (&'c Utterance, &[&'c Utterance])> {
        self.entries.iter().map(|(subset, supersets)| (*subset, supersets.as_slice()))
    }

    /// Every `(subset, superset)` pair, in classification order.
    pub fn pairs(&self) -> impl Iterator<Item = (&'c Utterance, &'c Utterance)> + '_ {
        self.entries.iter().flat_map(|(subset, supersets)| supersets.iter().map(move |superset| (*subset, *superset)))
    }

    /// Number of subset utterances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Run [`find_supersets`] for every utterance and keep the non-empty results.
pub fn build_subset_index(classification: &Classification) -> SubsetIndex<'_> {
    let mut index = SubsetIndex::default();
    for (meaning_id, utterance) in classification.utterances() {
        let supersets = find_supersets(utterance, meaning_id, classification);
        if !supersets.is_empty() {
            index.by_utterance.insert(utterance.as_str(), index.entries.len());
            index.entries.push((utterance, supersets));
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ordered_subsequence_with_gaps() {
        let utterance = ["i", "love", "you", "very", "much"];
        assert!(do_match_words_match_utterance(&["love", "much"], &utterance));
        assert!(do_match_words_match_utterance(&["i"], &utterance));
        assert!(do_match_words_match_utterance::<&str, &str>(&[], &utterance));
        assert!(!do_match_words_match_utterance(&["much", "love"], &utterance));
        assert!(!do_match_words_match_utterance(&["love", "love"], &utterance));
        assert!(!do_match_words_match_utterance(&["hate"], &utterance));
    }

    #[test]
    fn finds_supersets_in_other_meanings_only() {
        let c = classification! {
            "1" => ["i love you", "i love you too"],
            "2" => ["i love you falling in a pit"],
            "3" => ["you love i"],
        }
        .unwrap();
        let u = Utterance::parse("i love you").unwrap();
        let found: Vec<&str> =
            find_supersets(&u, &MeaningId::parse("1").unwrap(), &c).into_iter().map(Utterance::as_str).collect();
        assert_eq!(found, vec!["i love you falling in a pit"]);
    }

    #[test]
    fn subset_index_records_chains() {
        let c = classification! {
            "1" => ["love"],
            "2" => ["love you"],
            "3" => ["i love you"],
            "4" => ["goodbye"],
        }
        .unwrap();
        let index = build_subset_index(&c);

        assert_eq!(index.len(), 2);
        let love = Utterance::parse("love").unwrap();
        let supersets: Vec<&str> = index.supersets_of(&love).unwrap().iter().map(|u| u.as_str()).collect();
        assert_eq!(supersets, vec!["love you", "i love you"]);

        assert!(index.is_subset(&Utterance::parse("love you").unwrap()));
        assert!(!index.is_subset(&Utterance::parse("i love you").unwrap()));
        assert!(!index.is_subset(&Utterance::parse("goodbye").unwrap()));
        assert_eq!(index.pairs().count(), 3);
    }
}
