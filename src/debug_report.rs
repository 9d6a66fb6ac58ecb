use meaning_map::{Compilation, MatchDetails, MeaningMap};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

/// Print the compile summary.
pub fn print_compilation(compiled: &Compilation, color: bool) {
    let palette = ansi::Palette::new(color);
    let metrics = &compiled.metrics;

    println!("\n{}", palette.paint("━━━ Compilation ━━━", ansi::GRAY));
    println!(
        "  {} utterances → {} rules  {} {} combinations tried",
        palette.paint(metrics.utterances.to_string(), ansi::BLUE),
        palette.paint(compiled.map.len().to_string(), ansi::GREEN),
        palette.dim("│"),
        palette.paint(metrics.combinations_tried.to_string(), ansi::CYAN),
    );
    println!(
        "  {} subset pairs  {} {} trump pairs",
        palette.paint(metrics.subset_pairs.to_string(), ansi::BLUE),
        palette.dim("│"),
        palette.paint(metrics.trump_pairs.to_string(), ansi::BLUE),
    );

    for utterance in &compiled.unresolved {
        println!("  {} {}", palette.paint("⚠ unresolved:", ansi::YELLOW), utterance);
    }
    for (id, defect) in &compiled.trump_defects {
        println!("  {} {:x}: {:?}", palette.paint("✗ trump", ansi::RED), id, defect);
    }

    println!(
        "  Total: {}  │  Search: {}  │  Trump: {}",
        palette.paint(format!("{:?}", metrics.total), ansi::GREEN),
        palette.paint(format!("{:?}", metrics.search), ansi::CYAN),
        palette.dim(format!("{:?}", metrics.trump)),
    );
}

pub fn print_match(input: &str, map: &MeaningMap, details: &MatchDetails, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Matching: \"{}\"", input), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Candidates ━━━", ansi::GRAY));
    if details.candidates.is_empty() {
        println!("{}", palette.dim("  No rule completed"));
        println!("\n{}", palette.dim("  Tip: Set RUST_LOG=meaning_map=trace to see every started match"));
    } else {
        for (idx, candidate) in details.candidates.iter().enumerate() {
            let words = map.match_words(&candidate.rule_ref).unwrap_or_default().join(" ");
            println!(
                "  {} {} {} {} {}",
                palette.paint(format!("[{}]", idx), ansi::GRAY),
                palette.bold(palette.paint(candidate.meaning_id.as_str(), ansi::GREEN)),
                palette.dim("│"),
                palette.paint(format!("score {}", candidate.score), ansi::YELLOW),
                palette.dim(format!("│ rule: {words}")),
            );
        }
    }

    println!("\n{}", palette.paint("━━━ Result ━━━", ansi::GRAY));
    match &details.best {
        Some(found) => {
            println!(
                "  {} {}  {}",
                palette.paint("✓", ansi::GREEN),
                palette.bold(palette.paint(found.meaning_id.as_str(), ansi::GREEN)),
                palette.dim(format!("(score {}, rule {} {})", found.score, found.rule_ref.first_word, found.rule_ref.rule_id)),
            );
        }
        None => println!("  {} {}", palette.dim("✗"), palette.dim("unclassified")),
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Words: {}  │  Started: {}  │  Discarded: {}",
        palette.paint(format!("{:?}", details.metrics.total), ansi::GREEN),
        palette.paint(details.metrics.words_scanned.to_string(), ansi::CYAN),
        palette.paint(details.metrics.matches_started.to_string(), ansi::BLUE),
        palette.dim(details.metrics.matches_discarded.to_string()),
    );
    println!();
}
