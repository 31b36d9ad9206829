use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static INLINE_CHORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[ch\](.*?)\[/ch\]").expect("valid regex"));

static TAB_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[/?tab\]").expect("valid regex"));

/// Normalize Unicode text to NFC form and clean up whitespace.
///
/// Keeps accented characters in one consistent representation and drops
/// trailing whitespace left over from HTML extraction. Leading whitespace
/// is kept since it positions chords over lyrics.
pub fn normalize_text(input: &str) -> String {
    let nfc: String = input.nfc().collect();

    nfc.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Strip Ultimate Guitar's inline markup: `[ch]Em[/ch]` becomes `Em` and
/// `[tab]`/`[/tab]` block markers disappear. Section markers such as
/// `[Verse]` are left alone.
pub fn strip_ug_markup(input: &str) -> String {
    let unwrapped = INLINE_CHORD_RE.replace_all(input, "$1");
    TAB_BLOCK_RE.replace_all(&unwrapped, "").into_owned()
}

/// Keep only the lines for which `is_noise` is false, judged on the trimmed
/// line.
pub fn drop_lines(input: &str, is_noise: impl Fn(&str) -> bool) -> String {
    input
        .lines()
        .filter(|line| !is_noise(line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_nfc() {
        // e + combining acute accent -> é (precomposed)
        let decomposed = "cancio\u{0301}n";
        assert_eq!(normalize_text(decomposed), "canción");
    }

    #[test]
    fn test_trailing_whitespace_and_trim() {
        let input = "\n\n   Em     G   \nToday is gonna be   \n\n";
        assert_eq!(normalize_text(input), "Em     G\nToday is gonna be");
    }

    #[test]
    fn test_keeps_chord_indent() {
        let input = "Intro\n    Em   G\n  Today";
        assert_eq!(normalize_text(input), "Intro\n    Em   G\n  Today");
    }

    #[test]
    fn test_strip_inline_chords() {
        let input = "[tab][ch]Em7[/ch]        [ch]G[/ch]\nToday is gonna be the day[/tab]";
        assert_eq!(strip_ug_markup(input), "Em7        G\nToday is gonna be the day");
    }

    #[test]
    fn test_section_markers_kept() {
        let input = "[Verse]\n[ch]C[/ch] la\n[Chorus]";
        let out = strip_ug_markup(input);
        assert_eq!(out, "[Verse]\nC la\n[Chorus]");
        assert!(!out.contains("[ch]"));
        assert!(!out.contains("[/ch]"));
    }

    #[test]
    fn test_drop_lines() {
        let input = "keep\n  drop me\nkeep too";
        assert_eq!(drop_lines(input, |l| l.starts_with("drop")), "keep\nkeep too");
    }
}
