use crate::engine::{self, Candidate, CompileMetrics, MatchMetrics, MeaningMap, MeaningMatch, TrumpDefect};
use crate::error::Result;
use crate::{Classification, Utterance};
use std::collections::BTreeMap;

/// Default ceiling on the number of non-parameter words searched per
/// utterance. The search visits up to `2^n - 1` combinations.
pub const DEFAULT_MAX_SEARCH_WORDS: usize = 24;

/// Options that affect compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Utterances with more searchable words fail with
    /// [`SearchLimitExceeded`](crate::MeaningMapError::SearchLimitExceeded).
    pub max_search_words: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { max_search_words: DEFAULT_MAX_SEARCH_WORDS }
    }
}

/// Result from [`compile`] and [`compile_with`].
#[derive(Debug, Clone)]
pub struct Compilation {
    /// The compiled rule set.
    pub map: MeaningMap,
    /// Subset utterances no exclusive combination was found for. They have no
    /// rule and match through their supersets' rules, if at all.
    pub unresolved: Vec<Utterance>,
    /// Trump ID consistency defects; empty for a healthy compilation.
    pub trump_defects: BTreeMap<u64, TrumpDefect>,
    pub metrics: CompileMetrics,
}

/// Extra information returned by [`match_verbose`].
#[derive(Debug, Clone)]
pub struct MatchDetails {
    /// The selected match, as [`match_utterance`] would return it.
    pub best: Option<MeaningMatch>,
    /// Every completed match in the order it was started.
    pub candidates: Vec<Candidate>,
    pub metrics: MatchMetrics,
}

/// Compile `classification` with default [`CompileOptions`].
///
/// # Example
/// ```
/// use meaning_map::{Classification, compile};
///
/// let corpus = Classification::new([("1", vec!["i love you"]), ("2", vec!["i love you falling in a pit"])]).unwrap();
/// let compiled = compile(&corpus).unwrap();
/// assert!(compiled.trump_defects.is_empty());
/// ```
pub fn compile(classification: &Classification) -> Result<Compilation> {
    compile_with(classification, &CompileOptions::default())
}

/// Compile `classification` with explicit options.
pub fn compile_with(classification: &Classification, options: &CompileOptions) -> Result<Compilation> {
    let run = engine::Compiler::new(classification, options.max_search_words).run()?;

    Ok(Compilation { map: run.map, unresolved: run.unresolved, trump_defects: run.trump_defects, metrics: run.metrics })
}

/// Classify `utterance` against `map`. `None` means unclassified.
///
/// `param_values` are the values of the utterance's parameter tokens; they are
/// passed through to the result untouched.
pub fn match_utterance(utterance: &Utterance, map: &MeaningMap, param_values: Vec<String>) -> Option<MeaningMatch> {
    engine::Matcher::new(map).run(utterance, param_values)
}

/// Classify `utterance` and return every completed candidate and the scan
/// metrics along with the selected match.
pub fn match_verbose(utterance: &Utterance, map: &MeaningMap, param_values: Vec<String>) -> MatchDetails {
    let (best, candidates, metrics) = engine::Matcher::new(map).run_with_metrics(utterance, param_values);
    MatchDetails { best, candidates, metrics }
}
