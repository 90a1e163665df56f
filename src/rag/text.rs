//! Character-safe text helpers shared by the pipeline stages

/// Truncate to at most `max_chars` characters (not bytes), appending `...` when cut
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated.trim_end())
    } else {
        s.to_string()
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub const fn is_hiragana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}')
}

/// Scripts written without spaces between words
pub const fn is_cjk(c: char) -> bool {
    matches!(
        c,
        '\u{3040}'..='\u{30FF}'     // hiragana, katakana
            | '\u{3400}'..='\u{4DBF}' // CJK extension A
            | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
            | '\u{F900}'..='\u{FAFF}' // compatibility ideographs
            | '\u{FF66}'..='\u{FF9F}' // halfwidth katakana
            | '\u{AC00}'..='\u{D7AF}' // hangul syllables
    )
}

/// Split on whitespace and punctuation, case-folded.
///
/// Single-character tokens are dropped unless they are CJK (one kanji is a word).
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .filter(|token| token.chars().count() > 1 || token.chars().any(is_cjk))
        .map(str::to_lowercase)
        .collect()
}

/// Character bigrams of a CJK token, skipping pure-hiragana pairs (mostly particles)
#[must_use]
pub fn cjk_bigrams(token: &str) -> Vec<String> {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 3 {
        return Vec::new();
    }

    chars
        .windows(2)
        .filter(|pair| pair.iter().all(|c| is_cjk(*c)))
        .filter(|pair| !pair.iter().all(|c| is_hiragana(*c)))
        .map(|pair| pair.iter().collect())
        .collect()
}
