//! Markup normalization pipeline.
//!
//! Turns a raw etymology body into plain prose. Each stage is a pure
//! `&str -> String` function applied in the order listed in
//! [`normalize`]:
//!
//! 1. Expand templates (derivation, compound/affix/root, mention) and
//!    strip the rest
//! 2. Resolve `[[target|display]]` links
//! 3. Strip `<!-- -->` comments
//! 4. Strip `<ref>` blocks, HTML tags and bold/italic quotes
//! 5. Collapse whitespace
//! 6. Tidy punctuation left behind by removed markup

use std::sync::LazyLock;

use regex::Regex;

use crate::template::expand_templates;

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?(?:-->|$)").expect("valid regex"));

static REF_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<ref[^>]*/>|<ref[^>]*>.*?</ref\s*>").expect("valid regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").expect("valid regex"));

static QUOTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'{2,}").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static EMPTY_PARENS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*[,;:]?\s*\)").expect("valid regex"));

static SPACE_BEFORE_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.;:!?)])").expect("valid regex"));

/// Link namespaces whose links carry no prose.
const DROPPED_LINK_PREFIXES: &[&str] = &["category:", "file:", "image:"];

/// Runs the full pipeline over a raw etymology body.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let text = expand_templates(raw);
    let text = resolve_links(&text);
    let text = strip_comments(&text);
    let text = strip_inline_markup(&text);
    let text = collapse_whitespace(&text);
    tidy_punctuation(&text)
}

/// Replaces `[[target|display]]` with `display` and `[[target]]` with
/// `target` (minus any `#Section` anchor). Category and file links are
/// dropped.
#[must_use]
pub fn resolve_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find("[[") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("]]") else {
            out.push_str(&rest[open..]);
            return out;
        };

        out.push_str(&link_text(&after[..close]));
        rest = &after[close + 2..];
    }

    out.push_str(rest);
    out
}

fn link_text(inner: &str) -> String {
    let (target, display) = match inner.split_once('|') {
        Some((target, display)) => (target.trim(), Some(display.trim())),
        None => (inner.trim(), None),
    };

    let lower = target.to_lowercase();
    if DROPPED_LINK_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return String::new();
    }

    if let Some(display) = display.filter(|d| !d.is_empty()) {
        return display.to_string();
    }

    let target = target.split_once('#').map_or(target, |(page, _)| page);
    target.trim_start_matches(':').to_string()
}

/// Removes `<!-- ... -->` comments, including an unterminated trailing one.
#[must_use]
pub fn strip_comments(text: &str) -> String {
    COMMENT_RE.replace_all(text, "").into_owned()
}

/// Removes reference blocks, HTML tags and bold/italic quote runs.
#[must_use]
pub fn strip_inline_markup(text: &str) -> String {
    let text = REF_BLOCK_RE.replace_all(text, "");
    let text = TAG_RE.replace_all(&text, "");
    QUOTES_RE.replace_all(&text, "").into_owned()
}

/// Collapses whitespace runs (including newlines) to a single space and
/// trims both ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Removes empty parentheses and spaces before punctuation, then strips
/// leading and trailing `,` `;` `:` and whitespace.
#[must_use]
pub fn tidy_punctuation(text: &str) -> String {
    let text = EMPTY_PARENS_RE.replace_all(text, "");
    let text = SPACE_BEFORE_PUNCT_RE.replace_all(&text, "$1");
    let text = collapse_whitespace(&text);
    text.trim_matches(|c: char| matches!(c, ',' | ';' | ':') || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn links_prefer_display_text() {
        assert_eq!(resolve_links("from [[origo|origō]]"), "from origō");
        assert_eq!(resolve_links("see [[hubris]]."), "see hubris.");
        assert_eq!(resolve_links("[[origo#Latin]]"), "origo");
    }

    #[test]
    fn category_and_file_links_are_dropped() {
        assert_eq!(resolve_links("a[[Category:English terms]]b"), "ab");
        assert_eq!(resolve_links("a[[File:x.png|thumb]]b"), "ab");
    }

    #[test]
    fn unterminated_link_is_kept() {
        assert_eq!(resolve_links("a [[b"), "a [[b");
    }

    #[test]
    fn comments_are_stripped() {
        assert_eq!(strip_comments("a<!-- note -->b"), "ab");
        assert_eq!(strip_comments("a<!-- multi\nline -->b"), "ab");
        assert_eq!(strip_comments("a<!-- unterminated"), "a");
    }

    #[test]
    fn inline_markup_is_stripped() {
        assert_eq!(
            strip_inline_markup("'''bold''' and ''it''<ref name=\"x\">cite</ref><ref name=\"y\"/><sup>1</sup>"),
            "bold and it1"
        );
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(collapse_whitespace("  a \n\n b\t c  "), "a b c");
    }

    #[test]
    fn punctuation_artifacts_are_tidied() {
        assert_eq!(tidy_punctuation(", from Latin origo () ;"), "from Latin origo");
        assert_eq!(tidy_punctuation("From Latin origo , from x ."), "From Latin origo, from x.");
    }

    #[test]
    fn full_pipeline_produces_prose() {
        let raw = "{{root|en|ine-pro|*h₃er-}}\nFrom {{bor|en|la|origo}}, from {{m|la|orior||to rise}} <!-- check -->+ [[-o|-ō]].\n";
        assert_eq!(
            normalize(raw),
            "from root *h₃er- From Latin origo, from orior + -ō."
        );
    }

    #[test]
    fn commented_braces_do_not_leak_templates() {
        assert_eq!(
            normalize("<!-- see {{ -->From {{bor|en|la|origo}}, from {{m|la|orior}}.\n"),
            "From Latin origo, from orior."
        );
        assert_eq!(normalize("{{m|la|orior<!-- }} -->}} + x"), "orior + x");
    }

    #[test]
    fn unterminated_template_is_removed() {
        assert_eq!(
            normalize("From {{bor|en|la|origo}}, {{cog|fr|origine\n"),
            "From Latin origo"
        );
    }

    #[test]
    fn stray_punctuation_normalizes_to_almost_nothing() {
        assert_eq!(normalize("{{rfe|en}}.;\n"), ".");
    }
}
