//! Compile a labeled utterance corpus into a compact *meaning map* and
//! classify new utterances against it.
//!
//! ```
//! use meaning_map::{Utterance, classification, compile, match_utterance};
//!
//! let corpus = classification! {
//!     "1" => ["add to cart"],
//!     "2" => ["remove from cart"],
//! }
//! .unwrap();
//! let compiled = compile(&corpus).unwrap();
//!
//! let input = Utterance::parse("add to cart").unwrap();
//! let found = match_utterance(&input, &compiled.map, Vec::new()).unwrap();
//! assert_eq!(found.meaning_id.as_str(), "1");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;

pub use api::{
    CompileOptions, Compilation, DEFAULT_MAX_SEARCH_WORDS, MatchDetails, compile, compile_with, match_utterance,
    match_verbose,
};
pub use engine::{
    Candidate, Combinations, CompileMetrics, CompileRun, Compiler, GAP_WEIGHT, MATCH_WEIGHT, MatchMetrics, Matcher,
    MeaningMap, MeaningMapRule, MeaningMatch, RuleId, RuleRef, SubsetIndex, TrumpDefect, TryCombination, WordUsage,
    WordUsageMap, build_subset_index, build_word_usage, combinations, do_match_words_match_utterance, find_supersets,
    first_combination, validate_trump_ids,
};
pub use error::{MeaningMapError, Result};

// --- Utterances --------------------------------------------------------------

/// True when `word` is a parameter token (`ITEMS`, `NUMBER`, `ITEM_2`, ...).
///
/// Parameters are produced upstream by the replacer and are treated as opaque
/// literal words: the compiler always keeps them as match words.
pub fn is_parameter(word: &str) -> bool {
    regex!(r"^\p{Lu}[\p{Lu}\p{N}_]*$").is_match(word)
}

/// True when `word` is a valid utterance token: a parameter, or a plain word
/// without uppercase letters.
pub(crate) fn is_token(word: &str) -> bool {
    is_parameter(word) || regex!(r"^[^\p{Lu}\s]+$").is_match(word)
}

/// A normalized utterance: lowercase words separated by single spaces, with
/// optional ALL-CAPS parameter tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Utterance(String);

impl Utterance {
    /// Validate an already normalized utterance.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason| MeaningMapError::InvalidUtterance { utterance: text.to_string(), reason };

        if text.is_empty() {
            return Err(invalid("empty"));
        }
        if text.split_whitespace().collect::<Vec<_>>().join(" ") != text {
            return Err(invalid("whitespace is not collapsed"));
        }
        for word in text.split(' ') {
            if !is_token(word) {
                return Err(invalid("token mixes upper and lower case"));
            }
        }

        Ok(Utterance(text.to_string()))
    }

    /// Normalize free text into a plain utterance (no parameter tokens):
    /// lowercase every word and collapse whitespace.
    pub fn plain(text: &str) -> Result<Self> {
        let normalized: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        Self::parse(&normalized.join(" "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Words in original order.
    pub fn words(&self) -> Vec<&str> {
        self.0.split(' ').collect()
    }

    pub fn has_parameters(&self) -> bool {
        self.0.split(' ').any(is_parameter)
    }
}

impl TryFrom<String> for Utterance {
    type Error = MeaningMapError;

    fn try_from(value: String) -> Result<Self> {
        Utterance::parse(&value)
    }
}

impl From<Utterance> for String {
    fn from(value: Utterance) -> Self {
        value.0
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Meaning IDs -------------------------------------------------------------

/// Hierarchical meaning identifier such as `"1.2.3"`; `"0"` is reserved for
/// "unclassified".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MeaningId(String);

impl MeaningId {
    pub const UNCLASSIFIED: &'static str = "0";

    pub fn parse(text: &str) -> Result<Self> {
        if !regex!(r"^[^\s.:!,]+(?:\.[^\s.:!,]+)*$").is_match(text) {
            return Err(MeaningMapError::InvalidMeaningId(text.to_string()));
        }
        Ok(MeaningId(text.to_string()))
    }

    pub fn unclassified() -> Self {
        MeaningId(Self::UNCLASSIFIED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unclassified(&self) -> bool {
        self.0 == Self::UNCLASSIFIED
    }

    /// The enclosing meaning, found by trimming the trailing `.segment`.
    pub fn parent(&self) -> Option<MeaningId> {
        self.0.rsplit_once('.').map(|(parent, _)| MeaningId(parent.to_string()))
    }
}

impl TryFrom<String> for MeaningId {
    type Error = MeaningMapError;

    fn try_from(value: String) -> Result<Self> {
        MeaningId::parse(&value)
    }
}

impl From<MeaningId> for String {
    fn from(value: MeaningId) -> Self {
        value.0
    }
}

impl fmt::Display for MeaningId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Classification ----------------------------------------------------------

/// Labeled training corpus: meaning ID → ordered utterances.
///
/// Utterances are unique across the whole classification. Iteration order is
/// the sorted order of meaning IDs, then the order utterances were given in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<MeaningId, Vec<Utterance>>", into = "BTreeMap<MeaningId, Vec<Utterance>>")]
pub struct Classification {
    meanings: BTreeMap<MeaningId, Vec<Utterance>>,
}

impl Classification {
    /// Build a classification from raw strings, validating every meaning ID
    /// and utterance. Repeated meaning IDs are merged.
    pub fn new<I, M, U>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (M, Vec<U>)>,
        M: AsRef<str>,
        U: AsRef<str>,
    {
        let mut meanings: BTreeMap<MeaningId, Vec<Utterance>> = BTreeMap::new();
        for (meaning, utterances) in entries {
            let meaning = MeaningId::parse(meaning.as_ref())?;
            let parsed = utterances.iter().map(|u| Utterance::parse(u.as_ref())).collect::<Result<Vec<_>>>()?;
            meanings.entry(meaning).or_default().extend(parsed);
        }
        Self::try_from(meanings)
    }

    pub fn meanings(&self) -> impl Iterator<Item = (&MeaningId, &[Utterance])> {
        self.meanings.iter().map(|(id, list)| (id, list.as_slice()))
    }

    /// Every `(meaning, utterance)` pair in classification order.
    pub fn utterances(&self) -> impl Iterator<Item = (&MeaningId, &Utterance)> {
        self.meanings.iter().flat_map(|(id, list)| list.iter().map(move |u| (id, u)))
    }

    pub fn get(&self, meaning_id: &MeaningId) -> Option<&[Utterance]> {
        self.meanings.get(meaning_id).map(Vec::as_slice)
    }

    /// Number of utterances.
    pub fn len(&self) -> usize {
        self.meanings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TryFrom<BTreeMap<MeaningId, Vec<Utterance>>> for Classification {
    type Error = MeaningMapError;

    fn try_from(meanings: BTreeMap<MeaningId, Vec<Utterance>>) -> Result<Self> {
        let mut owners: HashMap<&str, &MeaningId> = HashMap::new();
        for (id, list) in &meanings {
            for utterance in list {
                if let Some(first) = owners.insert(utterance.as_str(), id) {
                    return Err(MeaningMapError::DuplicateUtterance {
                        utterance: utterance.to_string(),
                        first: first.to_string(),
                        second: id.to_string(),
                    });
                }
            }
        }
        Ok(Classification { meanings })
    }
}

impl From<Classification> for BTreeMap<MeaningId, Vec<Utterance>> {
    fn from(value: Classification) -> Self {
        value.meanings
    }
}
