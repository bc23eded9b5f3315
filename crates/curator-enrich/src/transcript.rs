//! Transcript validation and grounding checks for the video flow.

use std::collections::HashSet;

/// Minimum character count before a transcript is considered at all.
const MIN_CHARS: usize = 200;
/// Minimum distinct normalized words.
const MIN_DISTINCT_WORDS: usize = 10;
/// Minimum distinct/total word ratio; repeated filler below this means the
/// transcript carries no signal.
const MIN_UNIQUENESS: f64 = 0.1;

/// Phrases the service tends to produce from priors rather than from the
/// transcript in front of it.
const GENERIC_PHRASES: [&str; 5] = [
    "in this video",
    "the video explains",
    "the speaker discusses",
    "welcome to the channel",
    "like and subscribe",
];

fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Decide whether fetched transcript content is trustworthy enough to
/// drive analysis. Below threshold the caller falls back to whatever
/// metadata it has.
pub fn is_usable_transcript(text: &str) -> bool {
    let text = text.trim();
    if text.len() < MIN_CHARS {
        return false;
    }

    let all = words(text);
    if all.is_empty() {
        return false;
    }

    let distinct: HashSet<&String> = all.iter().collect();
    if distinct.len() < MIN_DISTINCT_WORDS {
        return false;
    }

    if !all.iter().any(|w| w.chars().any(|c| c.is_alphabetic())) {
        return false;
    }

    (distinct.len() as f64 / all.len() as f64) >= MIN_UNIQUENESS
}

/// Heuristic check that a transcript-grounded result actually reflects the
/// transcript. Advisory only: flags are logged and attached, never block
/// saving.
pub fn grounding_advisories(
    topic: &str,
    tags: &[String],
    summary_html: &str,
    transcript: &str,
) -> Vec<String> {
    let mut advisories = Vec::new();

    let transcript_words: HashSet<String> = words(transcript).into_iter().collect();
    let summary_text = strip_tags(summary_html);

    let mut answer_words: Vec<String> = words(topic);
    for tag in tags {
        answer_words.extend(words(tag));
    }
    answer_words.extend(words(&summary_text));

    let meaningful: Vec<&String> = answer_words.iter().filter(|w| w.len() > 3).collect();
    if !meaningful.is_empty() && !meaningful.iter().any(|w| transcript_words.contains(w.as_str())) {
        advisories
            .push("No lexical overlap between analysis and transcript".to_string());
    }

    let summary_lower = summary_text.to_lowercase();
    let transcript_lower = transcript.to_lowercase();
    for phrase in GENERIC_PHRASES {
        if summary_lower.contains(phrase) && !transcript_lower.contains(phrase) {
            advisories.push(format!("Summary contains generic phrase: \"{phrase}\""));
        }
    }

    advisories
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_transcript() -> String {
        "we walk through building a parser in rust covering lexing tokens \
         grammars recursive descent and error recovery with concrete examples \
         from a real compiler project including benchmarks and profiling notes "
            .repeat(3)
    }

    #[test]
    fn test_short_transcript_rejected() {
        assert!(!is_usable_transcript("too short"));
    }

    #[test]
    fn test_repetitive_transcript_rejected() {
        let noise = "la ".repeat(200);
        assert!(!is_usable_transcript(&noise));
    }

    #[test]
    fn test_numeric_only_transcript_rejected() {
        let numbers: String = (0..120).map(|n| format!("{n} ")).collect();
        assert!(!is_usable_transcript(&numbers));
    }

    #[test]
    fn test_real_transcript_accepted() {
        assert!(is_usable_transcript(&long_transcript()));
    }

    #[test]
    fn test_grounded_answer_has_no_advisories() {
        let advisories = grounding_advisories(
            "Rust parsing",
            &["compiler".to_string()],
            "<p>Building a parser in Rust with error recovery.</p>",
            &long_transcript(),
        );
        assert!(advisories.is_empty());
    }

    #[test]
    fn test_unrelated_answer_flagged() {
        let advisories = grounding_advisories(
            "Cooking",
            &["sourdough".to_string()],
            "<p>Baking bread at home.</p>",
            &long_transcript(),
        );
        assert!(!advisories.is_empty());
    }

    #[test]
    fn test_generic_phrase_flagged() {
        let advisories = grounding_advisories(
            "Rust parsing",
            &[],
            "<p>In this video the author covers parser tokens and grammars.</p>",
            &long_transcript(),
        );
        assert!(advisories.iter().any(|a| a.contains("in this video")));
    }
}
