//! Mention markup removal.
//!
//! Slack delivers mentions as `<@U0123ABCD>` (optionally `<@U0123ABCD|name>`). Every such token is
//! removed in one substitution; the rest of the text is kept as typed, apart from outer whitespace.

use regex::Regex;
use std::sync::LazyLock;

static MENTION_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@[A-Z0-9]+(?:\|[^>]*)?>").expect("mention pattern is valid"));

/// Strips user-mention markup and returns the trimmed question. May be empty.
pub fn strip_mentions(text: &str) -> String {
    MENTION_MARKUP.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_leading_mention() {
        assert_eq!(strip_mentions("<@U012ABCDEF> how are you"), "how are you");
    }

    #[test]
    fn test_strips_every_mention() {
        assert_eq!(
            strip_mentions("<@U1> ask <@W2|alice> about it"),
            "ask  about it"
        );
    }

    #[test]
    fn test_mention_only_is_empty() {
        assert_eq!(strip_mentions("  <@U012ABCDEF>  "), "");
    }

    #[test]
    fn test_other_markup_is_kept() {
        assert_eq!(
            strip_mentions("<@U1> see <#C123|general> and <https://example.com>"),
            "see <#C123|general> and <https://example.com>"
        );
    }
}
