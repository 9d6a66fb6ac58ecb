use crate::engine::RuleId;
use thiserror::Error;

/// The common error type used by this crate.
#[derive(Error, Debug)]
pub enum MeaningMapError {
    /// An utterance is not normalized (empty, badly spaced, or mixed-case tokens).
    #[error("Invalid utterance \"{utterance}\": {reason}")]
    InvalidUtterance { utterance: String, reason: &'static str },

    /// A meaning ID is empty or has an empty/forbidden path segment.
    #[error("Invalid meaning id \"{0}\"")]
    InvalidMeaningId(String),

    /// The same utterance was assigned twice within one classification.
    #[error("Utterance \"{utterance}\" appears under both \"{first}\" and \"{second}\"")]
    DuplicateUtterance { utterance: String, first: String, second: String },

    /// A rule needs at least one match word to use as its key.
    #[error("A rule needs at least one match word")]
    EmptyMatchWords,

    /// A rule reference names a first word with no rules under it.
    #[error("No rules are keyed by \"{0}\"")]
    UnknownFirstWord(String),

    /// A rule reference names a rule that is not under its first word.
    #[error("Rule {rule} not found under \"{first_word}\"")]
    UnknownRule { first_word: String, rule: RuleId },

    /// The combination search ran out of candidates for an utterance that is
    /// not a subset of any other meaning's utterance.
    #[error("No distinguishing word combination for \"{utterance}\" (meaning {meaning_id})")]
    NoDistinguishingCombination { utterance: String, meaning_id: String },

    /// An utterance has too many plain words to search exhaustively.
    #[error("Utterance \"{utterance}\" has {words} searchable words (limit {limit})")]
    SearchLimitExceeded { utterance: String, words: usize, limit: usize },

    /// The subset worklist stopped making progress.
    #[error("Subset dependencies form a cycle ({remaining} utterances left)")]
    SubsetCycle { remaining: usize },

    /// A persisted rule string could not be decoded.
    #[error("Malformed rule {index} under \"{first_word}\": {reason}")]
    MalformedRule { first_word: String, index: usize, reason: String },

    /// The persisted map is not valid JSON of the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = MeaningMapError> = std::result::Result<T, E>;
