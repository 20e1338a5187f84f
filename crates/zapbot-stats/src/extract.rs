//! Word and emoji extraction from raw chat text.
//!
//! Pure functions; no shared state.

/// Prefixes that mark a message as a bot command.
pub const COMMAND_PREFIXES: &[char] = &['/', '!'];

/// Portuguese function words excluded from word frequency.
pub const STOP_WORDS: &[&str] = &[
    "a", "o", "e", "de", "do", "da", "em", "um", "uma", "para", "com", "não", "na", "por", "que",
    "se", "te", "ao", "os", "as", "dos", "das", "no", "mas", "ou", "este", "esta", "eu", "tu",
    "ele", "ela", "nós", "vós", "eles", "elas", "meu", "minha", "seu", "sua", "é", "são", "foi",
    "tem", "ter", "só", "já", "mais", "muito", "bem", "vai", "vou",
];

/// Accented letters kept as part of a word.
const ACCENTED: &str = "áàâãéèêíìîóòôõúùûç";

/// Emoji code point ranges (inclusive).
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F), // emoticons
    (0x1F300, 0x1F5FF), // symbols & pictographs
    (0x1F680, 0x1F6FF), // transport & map
    (0x1F700, 0x1F77F), // alchemical
    (0x1F780, 0x1F7FF), // geometric shapes extended
    (0x1F800, 0x1F8FF), // supplemental arrows-c
    (0x2600, 0x26FF),   // misc symbols
    (0x2700, 0x27BF),   // dingbats
];

/// Whether `text` is a bot command and must stay out of the statistics.
///
/// Leading whitespace is skipped, as the dispatcher trims before matching.
pub fn is_command(text: &str) -> bool {
    text.trim_start().starts_with(COMMAND_PREFIXES)
}

/// Whether `word` is a Portuguese stop-word.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Whether a token is worth counting in word frequency.
pub fn is_significant(word: &str) -> bool {
    word.chars().count() > 2 && !is_stop_word(word)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || ACCENTED.contains(c)
}

/// Lower-cased word tokens of `text`.
///
/// Anything other than ASCII letters, digits, `_`, whitespace or the
/// Portuguese accented letters acts as a separator.
pub fn extract_words(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if is_word_char(c) || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Whether a single character falls in one of the emoji ranges.
pub fn is_emoji(c: char) -> bool {
    let cp = c as u32;
    EMOJI_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&cp))
}

/// Emoji glyphs of `text` in order of appearance, duplicates kept.
pub fn extract_emojis(text: &str) -> Vec<String> {
    text.chars()
        .filter(|&c| is_emoji(c))
        .map(String::from)
        .collect()
}
