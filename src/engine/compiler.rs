//! Rule compilation.
//!
//! The compiler turns a `Classification` into a `MeaningMap` in three stages:
//!
//! ```text
//! classification ─┬─ build_word_usage     (word_usage.rs)
//!                 └─ build_subset_index   (subset.rs)
//!                          │
//!                          v
//!        per utterance: combinations() until exclusive  (combination.rs)
//!                          │  add_rule                   (store.rs)
//!                          v
//!        per (subset, superset) pair: trump IDs          (trump.rs)
//! ```
//!
//! ## Exclusivity
//!
//! A combination is accepted for utterance U (meaning M) when its match words,
//! read as an ordered subsequence, match no utterance of another meaning,
//! except U's recorded supersets. Supersets are never excluded by word choice;
//! their conflict is settled by trump IDs afterwards.
//!
//! ## Order
//!
//! Utterances are processed from a worklist so that an utterance is compiled
//! only once all of its supersets are. The worklist fails instead of spinning
//! if a full rotation makes no progress.

use super::combination::combinations;
use super::metrics::{CompileMetrics, CompileRun};
use super::store::{MeaningMap, RuleRef};
use super::subset::{SubsetIndex, build_subset_index, do_match_words_match_utterance};
use super::trump::validate_trump_ids;
use super::word_usage::{WordUsageMap, build_word_usage};
use crate::error::{MeaningMapError, Result};
use crate::{Classification, MeaningId, Utterance};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

/// A classification entry with its words split once up front.
struct Entry<'c> {
    meaning_id: &'c MeaningId,
    utterance: &'c Utterance,
    words: Vec<&'c str>,
}

/// Compiler state for one run.
///
/// Usage: `Compiler::new(&classification, max_search_words).run()`.
pub struct Compiler<'c> {
    entries: Vec<Entry<'c>>,
    word_usage: WordUsageMap,
    subsets: SubsetIndex<'c>,
    max_search_words: usize,
    map: MeaningMap,
    /// Rule produced for each compiled utterance.
    rule_of: HashMap<&'c str, RuleRef>,
    unresolved: Vec<Utterance>,
    metrics: CompileMetrics,
}

impl<'c> Compiler<'c> {
    /// Build the word usage and subset indexes for `classification`.
    pub fn new(classification: &'c Classification, max_search_words: usize) -> Self {
        let mut metrics = CompileMetrics::default();

        let start = Instant::now();
        let word_usage = build_word_usage(classification);
        metrics.word_usage = start.elapsed();

        let start = Instant::now();
        let subsets = build_subset_index(classification);
        metrics.subset_index = start.elapsed();
        metrics.subset_pairs = subsets.pairs().count();

        let entries = classification
            .utterances()
            .map(|(meaning_id, utterance)| Entry { meaning_id, utterance, words: utterance.words() })
            .collect();

        Compiler {
            entries,
            word_usage,
            subsets,
            max_search_words,
            map: MeaningMap::new(),
            rule_of: HashMap::new(),
            unresolved: Vec::new(),
            metrics,
        }
    }

    /// Compile every utterance, assign trump IDs and validate them.
    pub fn run(mut self) -> Result<CompileRun> {
        let total_start = Instant::now();

        let search_start = Instant::now();
        self.compile_all()?;
        self.metrics.search = search_start.elapsed();

        let trump_start = Instant::now();
        self.assign_trump_ids();
        let trump_defects = validate_trump_ids(&self.map);
        self.metrics.trump = trump_start.elapsed();

        self.metrics.utterances = self.entries.len();
        self.metrics.total = total_start.elapsed() + self.metrics.word_usage + self.metrics.subset_index;

        log::debug!(
            "compiled {} utterances into {} rules ({} combinations tried, {} unresolved)",
            self.metrics.utterances,
            self.map.len(),
            self.metrics.combinations_tried,
            self.unresolved.len()
        );

        Ok(CompileRun { map: self.map, unresolved: self.unresolved, trump_defects, metrics: self.metrics })
    }

    /// Drain the worklist, compiling supersets before their subsets.
    fn compile_all(&mut self) -> Result<()> {
        let mut queue: VecDeque<usize> = (0..self.entries.len()).collect();
        let mut done: HashSet<&'c str> = HashSet::new();
        let mut stalled = 0;

        while let Some(idx) = queue.pop_front() {
            let utterance = self.entries[idx].utterance;
            let waiting = self
                .subsets
                .supersets_of(utterance)
                .is_some_and(|supersets| supersets.iter().any(|s| !done.contains(s.as_str())));

            if waiting {
                queue.push_back(idx);
                stalled += 1;
                if stalled >= queue.len() {
                    return Err(MeaningMapError::SubsetCycle { remaining: queue.len() });
                }
                continue;
            }

            stalled = 0;
            self.compile_entry(idx)?;
            done.insert(utterance.as_str());
        }

        Ok(())
    }

    /// Find the first exclusive combination for one entry and insert its rule.
    fn compile_entry(&mut self, idx: usize) -> Result<()> {
        let entry = &self.entries[idx];
        let excluded = self.subsets.supersets_of(entry.utterance).unwrap_or(&[]);

        let mut accepted = None;
        let mut tried = 0;
        for combination in combinations(entry.utterance, &self.word_usage, self.max_search_words)? {
            tried += 1;
            let match_words = combination.to_match_words();
            if is_exclusive(&self.entries, &match_words, entry.meaning_id, excluded) {
                accepted = Some(match_words);
                break;
            }
        }
        self.metrics.combinations_tried += tried;

        let (meaning_id, utterance) = (entry.meaning_id, entry.utterance);
        match accepted {
            Some(match_words) => {
                log::debug!("rule {:?} -> {} for \"{}\"", match_words, meaning_id, utterance);
                let rule_ref = self.map.add_rule(&match_words, meaning_id)?;
                self.rule_of.insert(utterance.as_str(), rule_ref);
                Ok(())
            }
            None if self.subsets.is_subset(utterance) => {
                log::warn!("no distinguishing combination for subset utterance \"{utterance}\" ({meaning_id}); rule omitted");
                self.unresolved.push(utterance.clone());
                Ok(())
            }
            None => Err(MeaningMapError::NoDistinguishingCombination {
                utterance: utterance.to_string(),
                meaning_id: meaning_id.to_string(),
            }),
        }
    }

    /// Pair each subset rule with its superset rules where the subset could
    /// otherwise tie or outscore the superset.
    fn assign_trump_ids(&mut self) {
        let mut next_id: i64 = 1;

        for (subset, superset) in self.subsets.pairs() {
            let (Some(subset_ref), Some(superset_ref)) =
                (self.rule_of.get(subset.as_str()), self.rule_of.get(superset.as_str()))
            else {
                log::warn!("cannot pair \"{subset}\" with superset \"{superset}\": missing rule");
                continue;
            };
            if subset_ref == superset_ref {
                continue;
            }
            let (Some(subset_rule), Some(superset_rule)) = (self.map.get(subset_ref), self.map.get(superset_ref))
            else {
                continue;
            };
            if superset_rule.shared_trump_id(subset_rule).is_some() {
                continue;
            }
            if subset_rule.following_words.len() < superset_rule.following_words.len() {
                // The superset already wins on score.
                continue;
            }

            let id = next_id;
            next_id += 1;
            if let Some(rule) = self.map.get_mut(superset_ref) {
                rule.trump_ids.push(id);
            }
            if let Some(rule) = self.map.get_mut(subset_ref) {
                rule.trump_ids.push(-id);
            }
            self.metrics.trump_pairs += 1;
            log::debug!("trump {id:x}: \"{superset}\" beats \"{subset}\"");
        }
    }
}

/// True when `match_words` match no entry of another meaning outside `excluded`.
fn is_exclusive(entries: &[Entry<'_>], match_words: &[String], meaning_id: &MeaningId, excluded: &[&Utterance]) -> bool {
    !entries.iter().any(|other| {
        other.meaning_id != meaning_id
            && !excluded.contains(&other.utterance)
            && do_match_words_match_utterance(match_words, &other.words)
    })
}
