//! Whitespace tokenizer: split on ASCII whitespace, strip leading and
//! trailing ASCII punctuation, lowercase. Empty tokens are dropped.
//! No stopword list — every token that survives cleaning is indexed,
//! including common words.

pub fn tokenize(text: &str) -> Vec<String> {
    text.split_ascii_whitespace()
        .filter_map(clean_token)
        .collect()
}

fn clean_token(word: &str) -> Option<String> {
    let trimmed = word.trim_matches(|c: char| c.is_ascii_punctuation());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}
