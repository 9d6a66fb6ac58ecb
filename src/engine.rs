//! Rule compiler and runtime matcher.
//!
//! This module is the entry point for the meaning-map engine. It is split into
//! focused submodules under `src/engine/` while keeping public paths flat (for
//! example `crate::engine::MeaningMap` and `crate::engine::Compiler`).
//!
//! ## How the parts work together
//!
//! ```text
//! Classification ──┬─ build_word_usage          (word_usage.rs)
//!                  └─ build_subset_index        (subset.rs)
//!                               │
//!                               v
//!                     Compiler::run             (compiler.rs)
//!                       - combinations()        (combination.rs)
//!                       - exclusivity test      (subset.rs)
//!                       - add_rule              (store.rs)
//!                       - trump assignment      (compiler.rs)
//!                       - validate_trump_ids    (trump.rs)
//!                               │
//!                               v
//!                          MeaningMap ── to/from JSON (codec.rs)
//!                               │
//! utterance ────────────────────┤
//!                               v
//!                     Matcher::run              (matcher.rs)
//!                               │
//!                               v
//!                     Option<MeaningMatch>
//! ```
//!
//! ## Responsibilities by module
//!
//! - `word_usage.rs`: per-word usage counts and owning meanings.
//! - `combination.rs`: enumerates rule candidates, rarest words first.
//! - `subset.rs`: ordered-subsequence test and the subset index.
//! - `compiler.rs`: picks the first exclusive combination per utterance and
//!   pairs subset rules with their supersets.
//! - `store.rs`: the `MeaningMap` and its mutation API.
//! - `trump.rs`: trump ID consistency checks.
//! - `codec.rs`: persisted rule-string format.
//! - `matcher.rs`: single-pass scoring and selection.
//! - `metrics.rs`: timings and counters for compile and match runs.
//!
//! ## Debugging
//!
//! Everything logs through the `log` facade. `RUST_LOG=meaning_map=debug` shows
//! rule selection and trump pairing; `trace` adds matcher steps.

#[path = "engine/codec.rs"]
mod codec;
#[path = "engine/combination.rs"]
mod combination;
#[path = "engine/compiler.rs"]
mod compiler;
#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/store.rs"]
mod store;
#[path = "engine/subset.rs"]
mod subset;
#[path = "engine/trump.rs"]
mod trump;
#[path = "engine/word_usage.rs"]
mod word_usage;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use combination::{Combinations, TryCombination, combinations, first_combination};
pub use compiler::Compiler;
pub use matcher::{Candidate, GAP_WEIGHT, MATCH_WEIGHT, Matcher, MeaningMatch};
pub use metrics::{CompileMetrics, CompileRun, MatchMetrics};
pub use store::{MeaningMap, MeaningMapRule, RuleId, RuleRef};
pub use subset::{SubsetIndex, build_subset_index, do_match_words_match_utterance, find_supersets};
pub use trump::{TrumpDefect, validate_trump_ids};
pub use word_usage::{WordUsage, WordUsageMap, build_word_usage};
