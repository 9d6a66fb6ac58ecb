//! Word usage statistics.
//!
//! One pass over the classification counts how often each word is used and
//! which meanings use it. The combination search orders an utterance's words
//! by this count so that rare (likely exclusive) words are tried first.

use crate::{Classification, MeaningId};
use std::collections::{BTreeSet, HashMap};

/// Usage of a single word across the whole classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordUsage {
    pub usage_count: usize,
    pub meaning_ids: BTreeSet<MeaningId>,
}

pub type WordUsageMap = HashMap<String, WordUsage>;

/// Count every word of every utterance and record its owning meanings.
pub fn build_word_usage(classification: &Classification) -> WordUsageMap {
    let mut usage = WordUsageMap::new();
    for (meaning_id, utterance) in classification.utterances() {
        for word in utterance.words() {
            let entry = usage.entry(word.to_string()).or_default();
            entry.usage_count += 1;
            entry.meaning_ids.insert(meaning_id.clone());
        }
    }
    usage
}
