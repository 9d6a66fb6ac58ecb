//! Single-pass runtime matcher.
//!
//! The matcher scans an utterance once, left to right, and keeps a list of
//! `ActiveMatch`es: rules whose key word has been seen and whose following
//! words are being consumed in order.
//!
//! ```text
//! utterance: i  love  you  very  much
//! rule:         love -> [you]
//!               start  +5
//!                      +5   (matched, score frozen at 10)
//! ```
//!
//! ## Scoring
//!
//! - `MATCH_WEIGHT` per consumed expected word, the key word included.
//! - `GAP_WEIGHT` subtracted for every word seen while a match is pending and
//!   that word is not the next expected one.
//!
//! A pending match is dropped as soon as it needs more words than are left,
//! and a rule is never started when its following words cannot fit.
//!
//! ## Selection
//!
//! Trump relations are not transitive, so they are applied as a filter, not
//! as a pairwise comparison:
//!
//! 1. Drop every completed match holding `-k` while another completed rule
//!    holds `+k`.
//! 2. Among the rest, the highest score wins; ties go to the match started
//!    first.
//!
//! If step 1 drops everything (only possible with an inconsistent trump set),
//! all completed matches stay in the running.

use super::metrics::MatchMetrics;
use super::store::{MeaningMap, MeaningMapRule, RuleRef};
use crate::{MeaningId, Utterance};
use std::time::Instant;

/// Reward per consumed expected word.
pub const MATCH_WEIGHT: i32 = 5;
/// Penalty per skipped word while a match is pending.
pub const GAP_WEIGHT: i32 = 1;

/// A successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeaningMatch {
    pub meaning_id: MeaningId,
    pub rule_ref: RuleRef,
    /// Parameter values supplied by the caller, passed through untouched.
    pub param_values: Vec<String>,
    pub score: i32,
}

/// A completed match considered during selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub rule_ref: RuleRef,
    pub meaning_id: MeaningId,
    pub score: i32,
}

/// Runtime state of one rule during a scan.
struct ActiveMatch<'a> {
    first_word: &'a str,
    rule: &'a MeaningMapRule,
    /// Index of the next expected following word.
    next_idx: usize,
    matched: bool,
    score: i32,
}

impl ActiveMatch<'_> {
    fn remaining(&self) -> usize {
        self.rule.following_words.len() - self.next_idx
    }

    fn rule_ref(&self) -> RuleRef {
        RuleRef { first_word: self.first_word.to_string(), rule_id: self.rule.id() }
    }
}

/// Matcher bound to a meaning map. The map is only read.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'m> {
    map: &'m MeaningMap,
}

impl<'m> Matcher<'m> {
    pub fn new(map: &'m MeaningMap) -> Self {
        Matcher { map }
    }

    /// Scan `words` and return completed matches in start order.
    fn scan<'a>(&self, words: &[&'a str], metrics: &mut MatchMetrics) -> Vec<ActiveMatch<'a>>
    where
        'm: 'a,
    {
        let map: &'m MeaningMap = self.map;
        let mut active: Vec<ActiveMatch<'a>> = Vec::new();

        for (i, &word) in words.iter().enumerate() {
            let after = words.len() - i - 1;

            for m in active.iter_mut().filter(|m| !m.matched) {
                if m.rule.following_words[m.next_idx] == word {
                    m.next_idx += 1;
                    m.score += MATCH_WEIGHT;
                    m.matched = m.next_idx == m.rule.following_words.len();
                } else {
                    m.score -= GAP_WEIGHT;
                }
            }

            let before = active.len();
            active.retain(|m| m.matched || m.remaining() <= after);
            metrics.matches_discarded += before - active.len();

            for rule in map.rules_for(word) {
                if rule.following_words.len() > after {
                    continue;
                }
                log::trace!("start {word} -> {:?} ({})", rule.following_words, rule.meaning_id);
                active.push(ActiveMatch {
                    first_word: word,
                    rule,
                    next_idx: 0,
                    matched: rule.following_words.is_empty(),
                    score: MATCH_WEIGHT,
                });
                metrics.matches_started += 1;
            }
        }

        metrics.words_scanned = words.len();
        active.retain(|m| m.matched);
        metrics.matches_completed = active.len();
        active
    }

    /// Classify `utterance`; `None` means unclassified.
    pub fn run(&self, utterance: &Utterance, param_values: Vec<String>) -> Option<MeaningMatch> {
        self.run_with_metrics(utterance, param_values).0
    }

    /// Classify `utterance` and also return every completed candidate and the
    /// scan metrics.
    pub fn run_with_metrics(
        &self,
        utterance: &Utterance,
        param_values: Vec<String>,
    ) -> (Option<MeaningMatch>, Vec<Candidate>, MatchMetrics) {
        let start = Instant::now();
        let mut metrics = MatchMetrics::default();
        let words = utterance.words();
        let matched = self.scan(&words, &mut metrics);

        let best = select(&matched).map(|m| MeaningMatch {
            meaning_id: m.rule.meaning_id.clone(),
            rule_ref: m.rule_ref(),
            param_values,
            score: m.score,
        });
        let candidates = matched
            .iter()
            .map(|m| Candidate { rule_ref: m.rule_ref(), meaning_id: m.rule.meaning_id.clone(), score: m.score })
            .collect();

        metrics.total = start.elapsed();
        if let Some(found) = &best {
            log::debug!("\"{utterance}\" -> {} (score {})", found.meaning_id, found.score);
        }
        (best, candidates, metrics)
    }
}

/// True when another completed rule holds the positive side of one of
/// `m`'s negative trump IDs.
fn is_trumped(m: &ActiveMatch<'_>, matched: &[ActiveMatch<'_>]) -> bool {
    m.rule.trump_ids.iter().filter(|&&id| id < 0).any(|&id| {
        matched.iter().any(|other| other.rule.id() != m.rule.id() && other.rule.trump_ids.contains(&-id))
    })
}

/// Pick the winning match; see "Selection" in the module docs.
fn select<'s, 'a>(matched: &'s [ActiveMatch<'a>]) -> Option<&'s ActiveMatch<'a>> {
    let survivors: Vec<&ActiveMatch<'a>> = matched
        .iter()
        .filter(|m| {
            let trumped = is_trumped(m, matched);
            if trumped {
                log::trace!("{} -> {} loses on trump", m.first_word, m.rule.meaning_id);
            }
            !trumped
        })
        .collect();
    let pool = if survivors.is_empty() { matched.iter().collect() } else { survivors };

    let mut best: Option<&ActiveMatch<'a>> = None;
    for candidate in pool {
        if best.is_none_or(|current| candidate.score > current.score) {
            best = Some(candidate);
        }
    }
    best
}
