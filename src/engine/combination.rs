//! Candidate match-word enumeration.
//!
//! For one utterance the compiler needs to try subsets of its words, smallest
//! and rarest first, until one subset is exclusive to the utterance's meaning.
//! A `TryCombination` is one point in that search:
//!
//! ```text
//! words:        [add, ITEMS, to, cart]
//! word_indexes: [0, 3, 2]            plain word positions, rarest first
//! enablements:  [true, false, true]  bit i toggles words[word_indexes[i]]
//! match words:  [add, ITEMS, to]     original order, parameters always kept
//! ```
//!
//! ## Ordering
//!
//! `next_combination` treats `enablements` as a bit vector with bit 0 as the
//! least significant bit (the rarest word). Vectors are visited by increasing
//! population count, then by increasing binary value, ending at the
//! all-enabled vector. Without a parameter the empty vector is skipped since a
//! rule needs at least one concrete word.
//!
//! ## Invariants
//!
//! - `enablements.len() == word_indexes.len()`.
//! - Every plain word position appears exactly once in `word_indexes`;
//!   `slots` is its inverse.
//! - The search is bounded: utterances with more plain words than the
//!   configured ceiling are rejected up front.

use super::word_usage::WordUsageMap;
use crate::error::{MeaningMapError, Result};
use crate::{Utterance, is_parameter};

/// One candidate subset of an utterance's words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryCombination<'u> {
    words: Vec<&'u str>,
    word_indexes: Vec<usize>,
    enablements: Vec<bool>,
    /// Bit position for each word, `None` for parameters.
    slots: Vec<Option<usize>>,
}

impl<'u> TryCombination<'u> {
    /// Original utterance tokens.
    pub fn words(&self) -> &[&'u str] {
        &self.words
    }

    /// Plain word positions ordered by ascending usage.
    pub fn word_indexes(&self) -> &[usize] {
        &self.word_indexes
    }

    pub fn enablements(&self) -> &[bool] {
        &self.enablements
    }

    /// Number of enabled plain words.
    pub fn population(&self) -> usize {
        self.enablements.iter().filter(|&&bit| bit).count()
    }

    pub fn is_all_enabled(&self) -> bool {
        self.enablements.iter().all(|&bit| bit)
    }

    /// The combination that follows this one in search order, or `None` once
    /// the all-enabled vector has been produced.
    pub fn next_combination(&self) -> Option<TryCombination<'u>> {
        let mut next = self.clone();
        if advance(&mut next.enablements) { Some(next) } else { None }
    }

    /// The selected words in original utterance order.
    pub fn to_match_words(&self) -> Vec<String> {
        self.words
            .iter()
            .zip(&self.slots)
            .filter(|(_, slot)| slot.is_none_or(|bit| self.enablements[bit]))
            .map(|(word, _)| word.to_string())
            .collect()
    }
}

/// Start the search for `utterance`.
///
/// Fails with `SearchLimitExceeded` when the utterance has more than
/// `max_search_words` plain words.
pub fn first_combination<'u>(
    utterance: &'u Utterance,
    word_usage: &WordUsageMap,
    max_search_words: usize,
) -> Result<TryCombination<'u>> {
    let words = utterance.words();

    let mut word_indexes: Vec<usize> = (0..words.len()).filter(|&i| !is_parameter(words[i])).collect();
    if word_indexes.len() > max_search_words {
        return Err(MeaningMapError::SearchLimitExceeded {
            utterance: utterance.to_string(),
            words: word_indexes.len(),
            limit: max_search_words,
        });
    }
    // Stable: equally common words keep their original order.
    word_indexes.sort_by_key(|&i| word_usage.get(words[i]).map_or(0, |usage| usage.usage_count));

    let mut slots = vec![None; words.len()];
    for (bit, &position) in word_indexes.iter().enumerate() {
        slots[position] = Some(bit);
    }

    let mut enablements = vec![false; word_indexes.len()];
    let has_parameter = word_indexes.len() < words.len();
    if !has_parameter {
        if let Some(first) = enablements.first_mut() {
            *first = true;
        }
    }

    Ok(TryCombination { words, word_indexes, enablements, slots })
}

/// Iterator over every combination of an utterance, in search order.
#[derive(Debug, Clone)]
pub struct Combinations<'u> {
    current: Option<TryCombination<'u>>,
}

impl<'u> Iterator for Combinations<'u> {
    type Item = TryCombination<'u>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        self.current = current.next_combination();
        Some(current)
    }
}

/// Lazily enumerate the combinations of `utterance`, starting with
/// [`first_combination`].
pub fn combinations<'u>(
    utterance: &'u Utterance,
    word_usage: &WordUsageMap,
    max_search_words: usize,
) -> Result<Combinations<'u>> {
    Ok(Combinations { current: Some(first_combination(utterance, word_usage, max_search_words)?) })
}

/// Step `bits` to the next vector (same population, next larger value; or the
/// smallest vector with one more bit). Returns false past the all-set vector.
fn advance(bits: &mut [bool]) -> bool {
    let len = bits.len();
    let mut below = 0;

    for i in 0..len {
        if !bits[i] {
            continue;
        }
        if i + 1 < len && !bits[i + 1] {
            bits[i] = false;
            bits[i + 1] = true;
            for (j, bit) in bits[..i].iter_mut().enumerate() {
                *bit = j < below;
            }
            return true;
        }
        below += 1;
    }

    // Set bits are packed at the top: grow the population by one.
    if below == len {
        return false;
    }
    for (j, bit) in bits.iter_mut().enumerate() {
        *bit = j <= below;
    }
    true
}
