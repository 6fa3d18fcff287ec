/// Cleanup of raw generator output into a single candidate step phrase.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[#*]+").unwrap());
static LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\n\r]+").unwrap());
static INLINE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());
// A terminator run, any closing quotes, then whitespace or the end.
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.?!]+["']*(?:\s|$)"#).unwrap());

const TERMINATORS: [char; 3] = ['.', '?', '!'];

/// Reduce raw generated text to a lower-case-initial phrase with no
/// trailing punctuation, or `""` if nothing usable is left.
///
/// Text without any sentence terminator is treated as a runaway
/// generation and discarded.
pub fn clean_generated(raw: &str) -> String {
    let text: String = raw.nfkc().collect();
    let text = MARKUP.replace_all(&text, "");
    let text = LINE_BREAKS.replace_all(&text, "\n");
    let text = INLINE_SPACE.replace_all(&text, " ");
    let text = standardize_punctuation(&text.replace(".\"", "\"."));

    let text = cut_trailing_sentence(&text);
    let text = cut_trailing_quotes(&text);
    let text = text.trim_matches(|c: char| matches!(c, '\n' | ' ' | '.' | '?' | '!'));
    if text.is_empty() {
        return String::new();
    }

    lower_first_letter(text).trim().to_string()
}

/// Curly quotes and backticks to their ASCII forms.
pub fn standardize_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2019}' | '`' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            other => other,
        })
        .collect()
}

/// Keep only the first sentence, without its final terminator and cut at
/// any `<` or `>` marker. Returns `""` if the text has no terminator.
pub fn cut_trailing_sentence(text: &str) -> String {
    if !text.contains(TERMINATORS) {
        return String::new();
    }

    let text = text.trim_start();
    let sentence = match SENTENCE_END.find(text) {
        Some(m) => text[..m.end()].trim_end(),
        None => text.trim_end(),
    };

    let mut end = sentence.len();
    if sentence.ends_with(TERMINATORS) {
        end -= 1;
    }
    for marker in ['<', '>'] {
        if let Some(pos) = sentence.find(marker) {
            if pos > 0 {
                end = end.min(pos);
            }
        }
    }
    sentence[..end].trim().to_string()
}

/// Balance double quotes: a lone quote is removed, an odd count is
/// truncated at the last quote, an even count is left alone.
pub fn cut_trailing_quotes(text: &str) -> String {
    let quotes = text.matches('"').count();
    if quotes == 1 {
        text.replace('"', "")
    } else if quotes % 2 == 0 {
        text.to_string()
    } else {
        match text.rfind('"') {
            Some(last) => text[..last].to_string(),
            None => text.to_string(),
        }
    }
}

fn lower_first_letter(text: &str) -> String {
    match text.find(|c: char| c.is_ascii_alphabetic()) {
        Some(idx) => {
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..idx]);
            out.push_str(&text[idx..idx + 1].to_ascii_lowercase());
            out.push_str(&text[idx + 1..]);
            out
        }
        None => text.to_string(),
    }
}
