// src/enrich/fallback.rs
//! Deterministic local enrichment used when the backend is absent or failing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Character budget of the local summary.
pub const SUMMARY_BUDGET: usize = 200;
pub const MAX_TAGS: usize = 5;
pub const DEFAULT_TAG: &str = "technology";

struct KeywordGroup {
    name: &'static str,
    patterns: Vec<Regex>,
}

/// Keywords are matched at a word start. Stems longer than three letters
/// also match their inflections ("hack" hits "hackers"); short ones such as
/// "ai" or "app" only take a plural "s" so "aid" and "apple" stay out.
fn keyword_pattern(kw: &str) -> String {
    let kw_re = regex::escape(kw);
    if kw.chars().count() <= 3 {
        format!(r"(?i)\b{kw_re}s?\b")
    } else {
        format!(r"(?i)\b{kw_re}\w*")
    }
}

fn group(name: &'static str, keywords: &[&str]) -> KeywordGroup {
    let patterns = keywords
        .iter()
        .map(|kw| Regex::new(&keyword_pattern(kw)).expect("keyword regex"))
        .collect();
    KeywordGroup { name, patterns }
}

static CATEGORY_KEYWORDS: Lazy<Vec<KeywordGroup>> = Lazy::new(|| {
    vec![
        group(
            "AI",
            &[
                "ai",
                "artificial intelligence",
                "machine learning",
                "neural network",
                "gpt",
                "llm",
            ],
        ),
        group(
            "Gadgets",
            &["gadget", "device", "hardware", "phone", "laptop", "wearable"],
        ),
        group(
            "Software",
            &["software", "app", "application", "program", "code", "developer"],
        ),
        group(
            "Cybersecurity",
            &["security", "hack", "breach", "vulnerability", "encrypt", "protect"],
        ),
        group(
            "Blockchain",
            &["blockchain", "crypto", "bitcoin", "ethereum", "nft", "web3"],
        ),
        group(
            "Quantum Computing",
            &["quantum", "qubit", "superposition", "entanglement"],
        ),
        group(
            "Hardware",
            &["hardware", "chip", "processor", "gpu", "semiconductor"],
        ),
    ]
});

static TAG_GROUPS: Lazy<Vec<KeywordGroup>> = Lazy::new(|| {
    vec![
        group(
            "ai",
            &[
                "ai",
                "artificial intelligence",
                "machine learning",
                "neural",
                "gpt",
                "llm",
            ],
        ),
        group(
            "blockchain",
            &["blockchain", "crypto", "bitcoin", "ethereum", "web3", "nft"],
        ),
        group(
            "cybersecurity",
            &["security", "hack", "vulnerability", "password", "encryption", "privacy"],
        ),
        group("cloud", &["cloud", "aws", "azure", "google cloud", "serverless"]),
        group("hardware", &["hardware", "chip", "processor", "gpu", "device"]),
        group("mobile", &["mobile", "iphone", "android", "smartphone", "app"]),
        group("software", &["software", "programming", "code", "developer", "app"]),
        group("gaming", &["game", "gaming", "playstation", "xbox", "nintendo"]),
        group(
            "vr",
            &["vr", "virtual reality", "ar", "augmented reality", "metaverse"],
        ),
    ]
});

static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence regex"));

/// Leading sentences until the running length passes `SUMMARY_BUDGET`.
pub fn summarize(text: &str) -> String {
    let mut out = String::new();
    let mut chars = 0usize;
    for sentence in SENTENCE_SPLIT.split(text) {
        let s = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
        if s.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&s);
        out.push('.');
        chars += s.chars().count() + 1;
        if chars > SUMMARY_BUDGET {
            break;
        }
    }
    out
}

/// Scores each candidate by keyword occurrences in title + text and returns the
/// best one. Ties and zero matches resolve to the earliest candidate.
pub fn categorize(title: &str, text: &str, candidates: &[String]) -> String {
    let Some(first) = candidates.first() else {
        return String::new();
    };
    let haystack = format!("{title} {text}");

    let mut best = first;
    let mut best_score = 0usize;
    for candidate in candidates {
        let score = CATEGORY_KEYWORDS
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(candidate.trim()))
            .map(|g| {
                g.patterns
                    .iter()
                    .map(|re| re.find_iter(&haystack).count())
                    .sum::<usize>()
            })
            .unwrap_or(0);
        if score > best_score {
            best = candidate;
            best_score = score;
        }
    }
    best.clone()
}

/// Topic groups whose keywords appear in title + text, at most `MAX_TAGS`.
pub fn tags(title: &str, text: &str) -> Vec<String> {
    let haystack = format!("{title} {text}");
    let mut out: Vec<String> = TAG_GROUPS
        .iter()
        .filter(|g| g.patterns.iter().any(|re| re.is_match(&haystack)))
        .map(|g| g.name.to_string())
        .take(MAX_TAGS)
        .collect();
    if out.is_empty() {
        out.push(DEFAULT_TAG.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn summary_stops_after_budget() {
        // 49 chars + the appended period
        let sentence = "This sentence is exactly fifty characters long ok";
        let text = [sentence; 10].join(". ");
        let s = summarize(&text);
        // 4 * 50 == 200 is still within budget; the fifth crosses it
        assert_eq!(s.matches('.').count(), 5);
        assert!(s.ends_with('.'));
    }

    #[test]
    fn summary_of_short_text_keeps_everything() {
        assert_eq!(
            summarize("  First one!  Second\n one?  "),
            "First one. Second one."
        );
        assert_eq!(summarize("   "), "");
    }

    #[test]
    fn categorize_picks_highest_score() {
        let cats = names(&["AI", "Gadgets", "Quantum Computing"]);
        let got = categorize(
            "New qubit design",
            "Quantum researchers report stable qubits and entanglement.",
            &cats,
        );
        assert_eq!(got, "Quantum Computing");
    }

    #[test]
    fn categorize_defaults_to_first_on_zero_or_tie() {
        let cats = names(&["Gadgets", "AI"]);
        assert_eq!(categorize("Weather", "Sunny all week", &cats), "Gadgets");
        // one hit each => tie => first
        assert_eq!(categorize("AI phone", "", &cats), "Gadgets");
        assert_eq!(categorize("x", "y", &[]), "");
    }

    #[test]
    fn keywords_match_whole_words_only() {
        // "said" and "are" must not count as "ai" / "ar"
        let t = tags("Officials said prices are stable", "");
        assert_eq!(t, vec![DEFAULT_TAG.to_string()]);
    }

    #[test]
    fn inflected_forms_count_as_keywords() {
        let t = tags(
            "Nvidia ships new AI chips",
            "Hackers exploited devices running old encryption keys.",
        );
        assert_eq!(t, names(&["ai", "cybersecurity", "hardware"]));

        let cats = names(&["AI", "Gadgets", "Cybersecurity"]);
        let got = categorize(
            "Hackers breached millions of devices",
            "Attackers hacked phones; protection was encrypted poorly.",
            &cats,
        );
        assert_eq!(got, "Cybersecurity");
    }

    #[test]
    fn short_keywords_only_take_a_plural() {
        assert_eq!(tags("Three new apps", ""), names(&["mobile", "software"]));
        assert_eq!(tags("Apple raises aid for the airline", ""), vec![DEFAULT_TAG.to_string()]);
    }

    #[test]
    fn tags_follow_group_order_and_cap() {
        let t = tags(
            "GPT on the cloud",
            "A bitcoin wallet app leaks a password on a GPU, then the Xbox metaverse.",
        );
        assert_eq!(t.len(), MAX_TAGS);
        assert_eq!(&t[..3], &["ai", "blockchain", "cybersecurity"]);
    }
}
