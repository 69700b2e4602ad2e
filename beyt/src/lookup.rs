//! Dictionary lookup for selected verse text

use once_cell::sync::Lazy;
use regex::Regex;
use url::form_urlencoded;

const DICTIONARY_BASE: &str = "https://vajehyab.com/";

/// Persian and Latin punctuation plus whitespace, collapsed to a single space
static SEPARATOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[،,؛;:：。.؟?！!()\[\]{}«»"“”'‘’\s]+"#).unwrap()
});

fn is_word_char(c: char) -> bool {
    matches!(c,
        '\u{0600}'..='\u{06FF}'
        | '\u{0750}'..='\u{077F}'
        | '\u{08A0}'..='\u{08FF}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}'
    ) || c.is_ascii_alphanumeric()
}

/// First word of a selection, stripped to Arabic-script letters and ASCII
/// alphanumerics. `None` when nothing usable remains.
#[uniffi::export]
pub fn extract_lookup_word(selection: String) -> Option<String> {
    let trimmed = selection.trim();
    if trimmed.is_empty() {
        return None;
    }

    let spaced = SEPARATOR_REGEX.replace_all(trimmed, " ");
    let first = spaced.split_whitespace().next()?;
    let word: String = first.chars().filter(|c| is_word_char(*c)).collect();

    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}

/// Dictionary page for a word, or `None` for a blank word
#[uniffi::export]
pub fn dictionary_url(word: String) -> Option<String> {
    let word = word.trim();
    if word.is_empty() {
        return None;
    }
    // Form encoding writes spaces as '+'; the dictionary expects %20
    let query: String = form_urlencoded::byte_serialize(word.as_bytes()).collect();
    Some(format!("{DICTIONARY_BASE}?q={}&d=", query.replace('+', "%20")))
}
