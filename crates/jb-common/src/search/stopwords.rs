use std::collections::HashSet;
use std::sync::OnceLock;

/// Words the full-text index would match but that carry no search signal.
/// Seniority qualifiers are included so "Senior Engineer" and "Engineer"
/// resolve to the same token set. "it" stays indexable: it collides with
/// the Information Technology abbreviation.
const STOPWORDS: &[&str] = &[
    "a", "about", "an", "are", "as", "at", "be", "by", "com", "de", "en", "for", "from", "how",
    "i", "in", "is", "la", "of", "on", "or", "that", "the", "this", "to", "was", "what", "when",
    "where", "who", "will", "with", "und", "www", "senior", "junior", "assistants", "assistant",
    "asst", "snr", "sr",
];

fn stopword_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Reduce a raw search string to the ordered tokens the full-text index
/// can actually match: non-word characters act as separators, tokens
/// shorter than two characters and stopwords are dropped.
pub fn indexable_tokens(input: &str) -> Vec<String> {
    input
        .split(|c: char| !is_word_char(c))
        .filter(|token| token.len() >= 2)
        .filter(|token| !stopword_set().contains(token.to_ascii_lowercase().as_str()))
        .map(|token| token.to_string())
        .collect()
}
