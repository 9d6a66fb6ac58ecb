//! Persisted meaning map format.
//!
//! A meaning map is stored as a JSON object keyed by first word; every value is
//! a list of rule strings:
//!
//! ```text
//! "<following words>:<meaning id>[!<trump ids>]"
//!
//! {"add": ["ITEMS:1"], "to": ["NUMBER:1!-3a,7f"], "i": [":2!1"]}
//! ```
//!
//! Trump IDs are comma-joined, lowercase hexadecimal, optionally negative. An
//! empty following-word list leaves nothing before the colon.
//!
//! Decoding validates every rule and reports the offending first word and rule
//! index. Rule IDs are not part of the format; decoding allocates new ones.

use super::store::{MeaningMap, MeaningMapRule};
use crate::error::{MeaningMapError, Result};
use crate::{MeaningId, is_token};
use std::collections::BTreeMap;

/// The JSON shape of a persisted map.
pub(crate) type PersistedMap = BTreeMap<String, Vec<String>>;

/// Encode one rule (without its key word).
pub(crate) fn encode_rule(rule: &MeaningMapRule) -> String {
    let mut out = format!("{}:{}", rule.following_words.join(" "), rule.meaning_id);
    if !rule.trump_ids.is_empty() {
        let ids: Vec<String> = rule
            .trump_ids
            .iter()
            .map(|&id| if id < 0 { format!("-{:x}", id.unsigned_abs()) } else { format!("{id:x}") })
            .collect();
        out.push('!');
        out.push_str(&ids.join(","));
    }
    out
}

/// A decoded rule string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecodedRule {
    pub following_words: Vec<String>,
    pub meaning_id: MeaningId,
    pub trump_ids: Vec<i64>,
}

/// Decode the rule at `index` under `first_word`.
pub(crate) fn decode_rule(first_word: &str, index: usize, text: &str) -> Result<DecodedRule> {
    let malformed = |reason: String| MeaningMapError::MalformedRule { first_word: first_word.to_string(), index, reason };

    let Some(caps) = regex!(r"^(?P<following>[^:]*):(?P<meaning>[^:!]*)(?:!(?P<trumps>.*))?$").captures(text) else {
        let reason = if text.contains(':') { "unexpected ':' or '!'" } else { "missing ':' separator" };
        return Err(malformed(reason.to_string()));
    };

    let following = &caps["following"];
    let following_words: Vec<String> =
        if following.is_empty() { Vec::new() } else { following.split(' ').map(str::to_string).collect() };
    if following_words.iter().any(String::is_empty) {
        return Err(malformed(format!("empty word in \"{following}\"")));
    }
    if let Some(word) = following_words.iter().find(|w| !is_token(w)) {
        return Err(malformed(format!("invalid word \"{word}\"")));
    }

    let meaning = &caps["meaning"];
    if meaning.is_empty() {
        return Err(malformed("empty meaning id".to_string()));
    }
    let meaning_id = MeaningId::parse(meaning).map_err(|_| malformed(format!("invalid meaning id \"{meaning}\"")))?;

    let mut trump_ids = Vec::new();
    if let Some(trumps) = caps.name("trumps") {
        for part in trumps.as_str().split(',') {
            if !regex!(r"^-?[0-9a-f]+$").is_match(part) {
                return Err(malformed(format!("malformed trump id \"{part}\"")));
            }
            let id = i64::from_str_radix(part, 16).map_err(|e| malformed(format!("trump id \"{part}\": {e}")))?;
            trump_ids.push(id);
        }
    }

    Ok(DecodedRule { following_words, meaning_id, trump_ids })
}

impl From<MeaningMap> for PersistedMap {
    fn from(map: MeaningMap) -> Self {
        let mut out = PersistedMap::new();
        for (word, rule) in map.iter() {
            out.entry(word.to_string()).or_default().push(encode_rule(rule));
        }
        out
    }
}

impl TryFrom<PersistedMap> for MeaningMap {
    type Error = MeaningMapError;

    fn try_from(persisted: PersistedMap) -> Result<Self> {
        let mut map = MeaningMap::new();
        for (first_word, rules) in persisted {
            if !is_token(&first_word) {
                return Err(MeaningMapError::MalformedRule {
                    first_word,
                    index: 0,
                    reason: "first word must be a single valid word".to_string(),
                });
            }
            for (index, text) in rules.iter().enumerate() {
                let rule = decode_rule(&first_word, index, text)?;
                map.insert(&first_word, rule.following_words, rule.meaning_id, rule.trump_ids);
            }
        }
        Ok(map)
    }
}

impl MeaningMap {
    /// Serialize to the persisted JSON form.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse the persisted JSON form, reporting malformed rules by first word
    /// and index.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let persisted: PersistedMap = serde_json::from_str(json)?;
        MeaningMap::try_from(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn meaning(id: &str) -> MeaningId {
        MeaningId::parse(id).unwrap()
    }

    #[test]
    fn decodes_the_documented_example() {
        let rule = decode_rule("add", 0, "to NUMBER:1!-3a,7f").unwrap();
        assert_eq!(rule.following_words, vec!["to", "NUMBER"]);
        assert_eq!(rule.meaning_id, meaning("1"));
        assert_eq!(rule.trump_ids, vec![-0x3a, 0x7f]);

        let bare = decode_rule("i", 0, ":2.1").unwrap();
        assert!(bare.following_words.is_empty());
        assert_eq!(bare.meaning_id, meaning("2.1"));
        assert!(bare.trump_ids.is_empty());
    }

    #[test]
    fn rejects_malformed_rules_with_location() {
        let cases = [
            ("cart", "missing ':' separator"),
            ("cart:", "empty meaning id"),
            ("cart:1!", "malformed trump id \"\""),
            ("cart:1!zz", "malformed trump id \"zz\""),
            ("cart:1!3,", "malformed trump id \"\""),
            ("a:b:1", "unexpected ':' or '!'"),
            ("a  b:1", "empty word in \"a  b\""),
            ("Add!x:1", "invalid word \"Add!x\""),
            ("to Cart:1", "invalid word \"Cart\""),
        ];
        for (text, expected) in cases {
            match decode_rule("add", 4, text) {
                Err(MeaningMapError::MalformedRule { first_word, index, reason }) => {
                    assert_eq!(first_word, "add");
                    assert_eq!(index, 4);
                    assert_eq!(reason, expected, "for {text:?}");
                }
                other => panic!("expected malformed rule for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn encodes_following_words_meaning_and_trumps() {
        let mut map = MeaningMap::new();
        let r = map.add_rule(&["add", "to", "NUMBER"], &meaning("1")).unwrap();
        map.get_mut(&r).unwrap().trump_ids.extend([-0x3a, 0x7f]);
        map.add_rule(&["i"], &meaning("2")).unwrap();

        let json = map.to_json_string().unwrap();
        assert_eq!(json, r#"{"add":["to NUMBER:1!-3a,7f"],"i":[":2"]}"#);
    }

    #[test]
    fn json_round_trip_preserves_structure() {
        let mut map = MeaningMap::new();
        map.add_rule(&["add", "ITEMS"], &meaning("1.1")).unwrap();
        map.add_rule(&["add", "cart"], &meaning("1.2")).unwrap();
        let pit = map.add_rule(&["pit"], &meaning("2")).unwrap();
        map.get_mut(&pit).unwrap().trump_ids.push(11);

        let restored = MeaningMap::from_json_str(&map.to_json_string_pretty().unwrap()).unwrap();
        assert_eq!(restored, map);
        assert_eq!(restored.rules_for("add").len(), 2);
    }

    #[test]
    fn import_reports_the_offending_rule() {
        let err = MeaningMap::from_json_str(r#"{"add":["ITEMS:1","cart"]}"#).unwrap_err();
        assert!(matches!(err, MeaningMapError::MalformedRule { ref first_word, index: 1, .. } if first_word == "add"));
        assert_eq!(err.to_string(), "Malformed rule 1 under \"add\": missing ':' separator");

        assert!(matches!(MeaningMap::from_json_str("[1, 2]"), Err(MeaningMapError::Json(_))));
        assert!(matches!(
            MeaningMap::from_json_str(r#"{"two words":[":1"]}"#),
            Err(MeaningMapError::MalformedRule { .. })
        ));
        assert!(matches!(
            MeaningMap::from_json_str(r#"{"Add":[":1"]}"#),
            Err(MeaningMapError::MalformedRule { ref first_word, index: 0, .. }) if first_word == "Add"
        ));
        assert!(MeaningMap::from_json_str(r#"{"add":["ITEMS to NUMBER_2:1","what's:2"]}"#).is_ok());
    }
}
