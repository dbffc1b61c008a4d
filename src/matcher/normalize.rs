/// Canonicalize a product or item name for comparison: lowercase, drop everything that is not
/// a letter, digit or whitespace, collapse whitespace runs and trim.
///
/// Punctuation is removed rather than replaced, so `"3,5%"` becomes `"35"` and
/// `"Чери-домати"` becomes `"черидомати"`.
pub fn normalize(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut space_pending = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if is_letter_or_digit(ch) {
            if space_pending && !normalized.is_empty() {
                normalized.push(' ');
            }
            space_pending = false;
            normalized.push(ch);
        } else if is_separator(ch) {
            space_pending = true;
        }
    }

    normalized
}

/// Enclosed and squared letters are symbols (`So`) that still carry the Alphabetic property.
const ENCLOSED_LETTERS: [(char, char); 4] = [
    ('\u{24B6}', '\u{24E9}'),
    ('\u{1F130}', '\u{1F149}'),
    ('\u{1F150}', '\u{1F169}'),
    ('\u{1F170}', '\u{1F189}'),
];

// Combining marks that are Alphabetic (mostly Indic vowel signs) are still kept.
fn is_letter_or_digit(ch: char) -> bool {
    if ch.is_numeric() {
        return true;
    }
    ch.is_alphabetic()
        && !ENCLOSED_LETTERS
            .iter()
            .any(|&(first, last)| (first..=last).contains(&ch))
}

/// Whitespace as a browser regex `\s` sees it: NEL is not a separator, the BOM is.
fn is_separator(ch: char) -> bool {
    ch == '\u{FEFF}' || (ch.is_whitespace() && ch != '\u{85}')
}
