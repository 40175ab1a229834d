use std::sync::LazyLock;

use regex::Regex;

/// Pictographs plus the joiners, selectors, modifiers and flag letters that
/// glue emoji sequences together. ASCII is excluded because `#`, `*` and the
/// digits carry the Emoji_Component property.
static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\p{Emoji_Component}\x{FE0E}--\p{ASCII}]")
        .expect("emoji pattern is valid")
});

pub fn has_emoji(text: &str) -> bool {
    EMOJI.is_match(text)
}

pub fn strip_emoji(text: &str) -> String {
    EMOJI.replace_all(text, "").into_owned()
}

/// Grouping key for a payee name: emoji removed, all whitespace removed,
/// lowercased. May be empty.
pub fn normalize(name: &str) -> String {
    strip_emoji(name)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}
