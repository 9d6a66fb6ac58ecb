use crate::{
    Classification, MATCH_WEIGHT, MeaningId, MeaningMap, MeaningMapError, Utterance, compile, match_utterance,
    validate_trump_ids,
};
use crate::{GAP_WEIGHT, first_combination};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

fn utterance(text: &str) -> Utterance {
    Utterance::parse(text).unwrap()
}

fn meaning(id: &str) -> MeaningId {
    MeaningId::parse(id).unwrap()
}

fn classify(map: &MeaningMap, text: &str) -> Option<String> {
    match_utterance(&utterance(text), map, Vec::new()).map(|m| m.meaning_id.to_string())
}

fn shop() -> Classification {
    classification! {
        "1" => ["add ITEMS to cart", "put ITEMS in my cart"],
        "2" => ["remove ITEMS from cart", "take ITEMS out of my cart"],
        "3" => ["show my cart", "what is in my cart"],
        "4" => ["hello", "hello there"],
        "5.1" => ["check out", "check out now please"],
        "6" => ["i love you"],
        "7" => ["i love you falling in a pit"],
    }
    .unwrap()
}

#[test]
fn add_and_remove_from_cart() {
    let corpus = classification! {
        "1" => ["add to cart"],
        "2" => ["remove from cart"],
    }
    .unwrap();
    let compiled = compile(&corpus).unwrap();

    assert_eq!(classify(&compiled.map, "add to cart"), Some("1".to_string()));
    assert_eq!(classify(&compiled.map, "remove from cart"), Some("2".to_string()));
}

#[test]
fn subset_and_superset_both_classify() {
    let corpus = classification! {
        "1" => ["i love you"],
        "2" => ["i love you falling in a pit"],
    }
    .unwrap();
    let compiled = compile(&corpus).unwrap();

    assert_eq!(classify(&compiled.map, "i love you"), Some("1".to_string()));
    assert_eq!(classify(&compiled.map, "i love you falling in a pit"), Some("2".to_string()));
    assert_ne!(classify(&compiled.map, "i love you falling"), Some("1".to_string()));
    assert!(validate_trump_ids(&compiled.map).is_empty());
}

#[test]
fn fewer_gap_words_score_higher() {
    let mut map = MeaningMap::new();
    map.add_rule(&["love", "you"], &meaning("1")).unwrap();

    let scores: Vec<i32> = ["i love you very much", "i love very you much", "i love very much you"]
        .iter()
        .map(|text| match_utterance(&utterance(text), &map, Vec::new()).unwrap().score)
        .collect();

    assert_eq!(scores, vec![2 * MATCH_WEIGHT, 2 * MATCH_WEIGHT - GAP_WEIGHT, 2 * MATCH_WEIGHT - 2 * GAP_WEIGHT]);
}

#[test]
fn parameters_are_always_match_words() {
    let corpus = classification! {
        "1" => ["add ITEMS to NUMBER"],
        "2" => ["remove ITEMS from NUMBER"],
    }
    .unwrap();
    let add = utterance("add ITEMS to NUMBER");

    let usage = crate::build_word_usage(&corpus);
    let mut combination = Some(first_combination(&add, &usage, 24).unwrap());
    while let Some(current) = combination {
        let words = current.to_match_words();
        assert!(words.contains(&"ITEMS".to_string()) && words.contains(&"NUMBER".to_string()), "{words:?}");
        combination = current.next_combination();
    }

    let compiled = compile(&corpus).unwrap();
    assert_eq!(compiled.map.rules_for("add")[0].following_words, vec!["ITEMS", "NUMBER"]);

    let params = vec!["two apples".to_string(), "3".to_string()];
    let found = match_utterance(&add, &compiled.map, params.clone()).unwrap();
    assert_eq!(found.meaning_id, meaning("1"));
    assert_eq!(found.param_values, params);
}

#[test]
fn remove_rule_rejects_stale_references() {
    let mut map = MeaningMap::new();
    let first = map.add_rule(&["add", "cart"], &meaning("1")).unwrap();
    map.add_rule(&["add", "basket"], &meaning("1")).unwrap();

    map.remove_rule(&first).unwrap();
    assert!(matches!(map.remove_rule(&first), Err(MeaningMapError::UnknownRule { .. })));

    let elsewhere = crate::RuleRef { first_word: "remove".to_string(), rule_id: first.rule_id };
    assert!(matches!(map.remove_rule(&elsewhere), Err(MeaningMapError::UnknownFirstWord(w)) if w == "remove"));
}

#[test]
fn every_utterance_classifies_as_its_own_meaning() {
    let corpus = shop();
    let compiled = compile(&corpus).unwrap();
    assert!(compiled.unresolved.is_empty());

    for (meaning_id, u) in corpus.utterances() {
        let found = match_utterance(u, &compiled.map, Vec::new());
        assert_eq!(found.map(|m| m.meaning_id), Some(meaning_id.clone()), "for \"{u}\"");
    }
}

fn assert_round_trip(corpus: &Classification) -> usize {
    let compiled = compile(corpus).unwrap();
    let mut checked = 0;
    for (meaning_id, u) in corpus.utterances() {
        if compiled.unresolved.contains(u) {
            continue;
        }
        let found = match_utterance(u, &compiled.map, Vec::new()).map(|m| m.meaning_id);
        assert_eq!(found.as_ref(), Some(meaning_id), "for \"{u}\" in {corpus:?}");
        checked += 1;
    }
    checked
}

#[test]
fn trump_winner_beats_a_higher_scoring_loser() {
    let corpus = classification! {
        "1" => ["d b", "e e f"],
        "2" => ["d d d", "f c d b d"],
        "3" => ["a b e a", "d a e e"],
    }
    .unwrap();
    let compiled = compile(&corpus).unwrap();

    assert_eq!(compiled.map.rules_for("c")[0].trump_ids, vec![1]);
    let d_b = compiled.map.rules_for("d").iter().find(|r| r.following_words == ["b"]).unwrap();
    assert_eq!(d_b.trump_ids, vec![-1]);

    assert_eq!(classify(&compiled.map, "f c d b d"), Some("2".to_string()));
    assert_eq!(assert_round_trip(&corpus), 6);
}

#[test]
fn subset_chain_round_trips() {
    let corpus = classification! {
        "1" => ["love"],
        "2" => ["love you"],
        "3" => ["i love you"],
    }
    .unwrap();
    let compiled = compile(&corpus).unwrap();

    assert_eq!(compiled.metrics.trump_pairs, 3);
    assert_eq!(assert_round_trip(&corpus), 3);
    assert_eq!(classify(&compiled.map, "oh i love you"), Some("3".to_string()));
}

#[test]
fn overlapping_trump_pairs_round_trip() {
    let corpus = classification! {
        "1" => ["stop"],
        "2" => ["stop the music"],
        "3" => ["the music", "play the music"],
        "4" => ["stop the music now please"],
    }
    .unwrap();
    let compiled = compile(&corpus).unwrap();

    assert!(compiled.trump_defects.is_empty());
    assert!(compiled.metrics.subset_pairs >= 4);
    assert_eq!(assert_round_trip(&corpus), 5);
}

/// Three meanings with two short utterances each over a six-word vocabulary,
/// or `None` when the draw repeats an utterance.
fn generated_corpus(rng: &mut StdRng) -> Option<Classification> {
    const WORDS: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

    let mut entries: Vec<(String, Vec<String>)> = Vec::new();
    for meaning in 1..=3 {
        let mut utterances = Vec::new();
        for _ in 0..2 {
            let len = rng.gen_range(2..=5);
            let words: Vec<&str> = (0..len).map(|_| WORDS[rng.gen_range(0..WORDS.len())]).collect();
            utterances.push(words.join(" "));
        }
        entries.push((meaning.to_string(), utterances));
    }
    Classification::new(entries).ok()
}

#[test]
fn generated_corpora_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x6d61_7073);
    let mut corpora = 0;
    let mut checked = 0;

    for _ in 0..500 {
        let Some(corpus) = generated_corpus(&mut rng) else {
            continue;
        };
        checked += assert_round_trip(&corpus);
        corpora += 1;
    }

    assert!(corpora > 100, "only {corpora} corpora generated");
    assert!(checked > 0);
}

#[test]
fn rules_are_ordered_subsequences_of_their_utterances() {
    let corpus = shop();
    let compiled = compile(&corpus).unwrap();

    let mut by_meaning: HashMap<&MeaningId, Vec<&Utterance>> = HashMap::new();
    for (meaning_id, u) in corpus.utterances() {
        by_meaning.entry(meaning_id).or_default().push(u);
    }

    for rule_ref in compiled.map.rule_refs() {
        let rule = compiled.map.get(&rule_ref).unwrap();
        let words = compiled.map.match_words(&rule_ref).unwrap();
        let sources = &by_meaning[&rule.meaning_id];
        assert!(
            sources.iter().any(|u| crate::do_match_words_match_utterance(&words, &u.words())),
            "{words:?} does not come from meaning {}",
            rule.meaning_id
        );
    }
}

#[test]
fn compiled_trump_set_is_consistent() {
    let compiled = compile(&shop()).unwrap();

    assert!(compiled.trump_defects.is_empty());
    assert_eq!(compiled.metrics.trump_pairs, 1);
    assert_eq!(compiled.map.rules_for("falling")[0].trump_ids, vec![1]);
    assert_eq!(compiled.map.rules_for("i")[0].trump_ids, vec![-1]);
}

#[test]
fn persisted_map_classifies_identically() {
    let corpus = shop();
    let compiled = compile(&corpus).unwrap();

    let restored = MeaningMap::from_json_str(&compiled.map.to_json_string().unwrap()).unwrap();
    assert_eq!(restored, compiled.map);

    for (_, u) in corpus.utterances() {
        let before = match_utterance(u, &compiled.map, Vec::new()).map(|m| (m.meaning_id, m.score));
        let after = match_utterance(u, &restored, Vec::new()).map(|m| (m.meaning_id, m.score));
        assert_eq!(before, after, "for \"{u}\"");
    }
}

#[test]
fn rekeyed_rule_keeps_its_trump() {
    let mut compiled = compile(&shop()).unwrap();
    let falling = compiled.map.rule_refs().into_iter().find(|r| r.first_word == "falling").unwrap();

    let pit = compiled.map.update_rule_match_words(&falling, &["pit"]).unwrap();
    assert_eq!(compiled.map.get(&pit).unwrap().trump_ids, vec![1]);
    assert!(validate_trump_ids(&compiled.map).is_empty());

    assert_eq!(classify(&compiled.map, "i love you in a pit"), Some("7".to_string()));
    assert_eq!(classify(&compiled.map, "i love you"), Some("6".to_string()));
}

#[test]
fn unrelated_input_is_unclassified() {
    let compiled = compile(&shop()).unwrap();
    assert_eq!(classify(&compiled.map, "the weather is nice"), None);
}
