//! Compile and match run metrics.
//!
//! Small structs used to observe compiler and matcher behavior. Timings are
//! always collected (they are cheap); the per-candidate lists live in
//! [`MatchDetails`](crate::MatchDetails) and are only built by the verbose
//! matcher entry point.
//!
//! ## Design notes
//!
//! - `CompileMetrics::combinations_tried` is the best single indicator of search
//!   cost: it grows with `2^words` for utterances whose rare words are shared.
//! - Counters are plain `usize`s; nothing here is synchronized.

use super::store::MeaningMap;
use super::trump::TrumpDefect;
use crate::Utterance;
use std::collections::BTreeMap;
use std::time::Duration;

// --- Metrics -----------------------------------------------------------------

/// Timings and counters for one compilation.
#[derive(Debug, Default, Clone)]
pub struct CompileMetrics {
    /// Total elapsed time for the compilation.
    pub total: Duration,
    /// Time spent building the word usage index.
    pub word_usage: Duration,
    /// Time spent building the subset index.
    pub subset_index: Duration,
    /// Time spent searching combinations and inserting rules.
    pub search: Duration,
    /// Time spent assigning and validating trump IDs.
    pub trump: Duration,
    /// Number of utterances compiled.
    pub utterances: usize,
    /// Number of candidate combinations tested for exclusivity.
    pub combinations_tried: usize,
    /// Number of `(subset, superset)` pairs in the subset index.
    pub subset_pairs: usize,
    /// Number of trump ID pairs assigned.
    pub trump_pairs: usize,
}

/// Counters for a single matcher scan.
#[derive(Debug, Default, Clone)]
pub struct MatchMetrics {
    /// Total elapsed time for the scan and selection.
    pub total: Duration,
    /// Number of words scanned.
    pub words_scanned: usize,
    /// Number of active matches started.
    pub matches_started: usize,
    /// Number of pending matches dropped because they could no longer complete.
    pub matches_discarded: usize,
    /// Number of active matches that completed.
    pub matches_completed: usize,
}

/// Compiler output bundled with diagnostics.
#[derive(Debug, Clone)]
pub struct CompileRun {
    pub map: MeaningMap,
    /// Subset utterances whose rule had to be omitted.
    pub unresolved: Vec<Utterance>,
    /// Trump consistency defects by absolute trump ID.
    pub trump_defects: BTreeMap<u64, TrumpDefect>,
    pub metrics: CompileMetrics,
}
