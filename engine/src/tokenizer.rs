//! Word splitting for document and query text. Tokenization is exact:
//! whitespace-delimited, case-sensitive, no normalization or stemming.

/// Split text on ASCII whitespace. Consecutive separators produce no empty
/// tokens.
pub fn split_into_words(text: &str) -> impl Iterator<Item = &str> {
    text.split_ascii_whitespace()
}

/// A word is valid unless it contains a control character (code point below
/// the space character).
pub fn is_valid_word(word: &str) -> bool {
    word.chars().all(|c| c >= ' ')
}
