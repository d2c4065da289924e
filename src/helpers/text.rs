//! Text helpers: word counting and reading time

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\S+").unwrap();
}

/// Count whitespace-delimited words
pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Minutes needed to read `words` at `words_per_minute`, rounded up
pub fn reading_time(words: usize, words_per_minute: usize) -> usize {
    words.div_ceil(words_per_minute.max(1))
}
