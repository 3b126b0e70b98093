//! Boolean-mode full-text operand construction.
//!
//! The searchable store evaluates `MATCH ... AGAINST (? IN BOOLEAN MODE)`
//! where a leading `+` marks a required token and double quotes mark an
//! exact phrase. Operands are always built from sanitized text so user
//! input cannot smuggle quote or escape characters into the operator.

/// Strip characters that would alter boolean-mode parsing.
pub fn sanitize_fulltext(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| *c != '"' && *c != '\\')
        .collect()
}

/// `"two word phrase"` — scores only rows containing the exact phrase.
pub fn exact_phrase(search: &str) -> String {
    format!("\"{search}\"")
}

/// `+"tok1" +"tok2"` — every token must be present.
pub fn required_tokens(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|token| format!("+\"{token}\""))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `"tok1" "tok2"` — natural-language relevance over the token set.
pub fn quoted_tokens(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|token| format!("\"{token}\""))
        .collect::<Vec<_>>()
        .join(" ")
}
