//! `{{...}}` template scanning and prose rendering.
//!
//! Templates are located with a brace-depth scanner rather than a regex
//! so that nested templates (`{{der|en|la|{{m|la|x}}}}`) close at the
//! right place. Delimiters are ASCII, so byte offsets found here are
//! always valid `str` boundaries.

use crate::languages::language_name;

/// Derivation markers: borrowings, inheritances and plain derivations.
const DERIVATION: &[&str] = &[
    "bor",
    "bor+",
    "bor-lite",
    "lbor",
    "obor",
    "slbor",
    "ubor",
    "der",
    "der+",
    "der-lite",
    "inh",
    "inh+",
    "inh-lite",
    "borrowed",
    "derived",
    "inherited",
];

const COGNATE: &[&str] = &["cog", "cognate", "noncog", "ncog"];

const MENTION: &[&str] = &["m", "mention", "l", "ll", "l-self", "m-self", "lang"];

const COMPOUND: &[&str] = &["com", "compound", "af", "affix", "confix", "blend"];

/// A parsed template invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Lowercased template name.
    pub name: String,
    /// Positional parameters, trimmed, in order.
    pub positional: Vec<String>,
    /// `key=value` parameters.
    pub named: Vec<(String, String)>,
}

impl Template {
    /// Parses the text between `{{` and `}}`.
    #[must_use]
    pub fn parse(inner: &str) -> Self {
        let mut parts = split_top_level(inner).into_iter();
        let name = parts.next().unwrap_or_default().trim().to_lowercase();

        let mut positional = Vec::new();
        let mut named = Vec::new();
        for part in parts {
            match named_param(part) {
                Some((key, value)) => named.push((key.to_string(), value.trim().to_string())),
                None => positional.push(part.trim().to_string()),
            }
        }

        Self {
            name,
            positional,
            named,
        }
    }

    /// Returns the positional parameter at `index` if present and
    /// non-empty.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.positional
            .get(index)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    fn is_any(&self, names: &[&str]) -> bool {
        names.contains(&self.name.as_str())
    }
}

enum Segment<'a> {
    Text(&'a str),
    Template(&'a str),
}

/// Expands every template in `text` into prose, dropping the ones with
/// no prose rendering.
#[must_use]
pub fn expand_templates(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Text(s) => out.push_str(s),
            Segment::Template(inner) => {
                let rendered = render(&Template::parse(inner), &out);
                out.push_str(&rendered);
            }
        }
    }
    out
}

/// Returns the templates at nesting depth zero, in document order.
#[must_use]
pub fn top_level_templates(text: &str) -> Vec<Template> {
    segments(text)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Template(inner) => Some(Template::parse(inner)),
            Segment::Text(_) => None,
        })
        .collect()
}

/// Splits `text` into prose and template bodies. `<!-- -->` comments are
/// passed through as prose so braces inside them never open a template.
/// An unmatched `{{` is dropped along with the text up to the next `{{`.
fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while let Some(offset) = next_marker(&text[i..]) {
        let at = i + offset;
        if text[at..].starts_with(COMMENT_OPEN) {
            i = comment_end(text, at);
            continue;
        }

        if at > text_start {
            segments.push(Segment::Text(&text[text_start..at]));
        }
        let after = at + 2;
        match matching_close(&text[after..]) {
            Some(close) => {
                segments.push(Segment::Template(&text[after..after + close]));
                i = after + close + 2;
            }
            None => {
                i = text[after..].find("{{").map_or(text.len(), |next| after + next);
            }
        }
        text_start = i;
    }

    if text_start < text.len() {
        segments.push(Segment::Text(&text[text_start..]));
    }
    segments
}

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Offset of the next `{{` or `<!--` in `text`.
fn next_marker(text: &str) -> Option<usize> {
    match (text.find("{{"), text.find(COMMENT_OPEN)) {
        (Some(brace), Some(comment)) => Some(brace.min(comment)),
        (brace, comment) => brace.or(comment),
    }
}

/// Offset just past the comment opening at `start`, or the end of `text`
/// when it is unterminated.
fn comment_end(text: &str, start: usize) -> usize {
    let body = start + COMMENT_OPEN.len();
    text[body..]
        .find(COMMENT_CLOSE)
        .map_or(text.len(), |end| body + end + COMMENT_CLOSE.len())
}

/// Finds the `}}` closing a template whose `{{` was just consumed.
/// Braces inside comments are ignored.
fn matching_close(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    let mut i = 0;

    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'{', b'{') => {
                depth += 1;
                i += 2;
            }
            (b'}', b'}') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 2;
            }
            (b'<', b'!') if text[i..].starts_with(COMMENT_OPEN) => {
                i = comment_end(text, i);
            }
            _ => i += 1,
        }
    }

    None
}

/// Splits template contents on `|`, ignoring pipes inside nested
/// templates and links.
fn split_top_level(inner: &str) -> Vec<&str> {
    let bytes = inner.as_bytes();
    let mut parts = Vec::new();
    let mut braces = 0usize;
    let mut brackets = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let pair = bytes.get(i + 1).map(|next| (bytes[i], *next));
        match pair {
            Some((b'{', b'{')) => {
                braces += 1;
                i += 2;
                continue;
            }
            Some((b'}', b'}')) => {
                braces = braces.saturating_sub(1);
                i += 2;
                continue;
            }
            Some((b'[', b'[')) => {
                brackets += 1;
                i += 2;
                continue;
            }
            Some((b']', b']')) => {
                brackets = brackets.saturating_sub(1);
                i += 2;
                continue;
            }
            _ => {}
        }

        if bytes[i] == b'|' && braces == 0 && brackets == 0 {
            parts.push(&inner[start..i]);
            start = i + 1;
        }
        i += 1;
    }

    parts.push(&inner[start..]);
    parts
}

fn named_param(part: &str) -> Option<(&str, &str)> {
    let (key, value) = part.split_once('=')?;
    let key = key.trim();
    let is_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    is_key.then_some((key, value))
}

/// Renders a template as prose. `preceding` is the text already emitted
/// before it, used to avoid doubling a leading "from".
fn render(template: &Template, preceding: &str) -> String {
    if template.is_any(DERIVATION) {
        return with_from(preceding, &language_phrase(template, 1, 2));
    }
    if template.is_any(COGNATE) {
        return language_phrase(template, 1, 2);
    }
    if template.is_any(MENTION) {
        return word_arg(template, 1).unwrap_or_default();
    }
    if template.is_any(COMPOUND) {
        return template
            .positional
            .iter()
            .skip(1)
            .map(|part| clean_arg(part))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" + ");
    }

    match template.name.as_str() {
        "term" => word_arg(template, 0).unwrap_or_default(),
        "w" | "wikipedia" => word_arg(template, 1)
            .or_else(|| word_arg(template, 0))
            .unwrap_or_default(),
        "suffix" | "suf" => {
            let base = word_arg(template, 1);
            let suffix = word_arg(template, 2).map(|s| {
                if s.starts_with('-') {
                    s
                } else {
                    format!("-{s}")
                }
            });
            join_parts([base, suffix])
        }
        "prefix" | "pre" => {
            let prefix = word_arg(template, 1).map(|p| {
                if p.ends_with('-') {
                    p
                } else {
                    format!("{p}-")
                }
            });
            join_parts([prefix, word_arg(template, 2)])
        }
        "root" => {
            let mut roots: Vec<String> = template
                .positional
                .iter()
                .skip(2)
                .map(|r| clean_arg(r))
                .filter(|r| !r.is_empty())
                .collect();
            if roots.is_empty() {
                roots.extend(word_arg(template, 1));
            }
            if roots.is_empty() {
                return String::new();
            }
            with_from(preceding, &format!("root {}", roots.join(", ")))
        }
        _ => String::new(),
    }
}

/// `<LanguageName> <word>`, falling back to the raw code for languages
/// outside the table.
fn language_phrase(template: &Template, lang_index: usize, word_index: usize) -> String {
    let code = template.arg(lang_index).unwrap_or_default();
    let mut phrase = language_name(code).unwrap_or(code).to_string();
    if let Some(word) = word_arg(template, word_index) {
        if !phrase.is_empty() {
            phrase.push(' ');
        }
        phrase.push_str(&word);
    }
    phrase
}

/// The word at `index`, or the alternate display form right after it
/// when the word slot is empty (`{{der|en|la||origo}}`).
fn word_arg(template: &Template, index: usize) -> Option<String> {
    template
        .arg(index)
        .or_else(|| {
            template
                .positional
                .get(index)
                .filter(|s| s.is_empty())
                .and_then(|_| template.arg(index + 1))
        })
        .map(clean_arg)
        .filter(|word| !word.is_empty())
}

fn clean_arg(arg: &str) -> String {
    expand_templates(arg).trim().to_string()
}

fn join_parts<const N: usize>(parts: [Option<String>; N]) -> String {
    parts.into_iter().flatten().collect::<Vec<_>>().join(" + ")
}

fn with_from(preceding: &str, phrase: &str) -> String {
    if phrase.is_empty() || ends_with_from(preceding) {
        phrase.to_string()
    } else {
        format!("from {phrase}")
    }
}

fn ends_with_from(text: &str) -> bool {
    let trimmed = text.trim_end();
    let Some(split) = trimmed.len().checked_sub(4) else {
        return false;
    };
    if !trimmed.is_char_boundary(split) {
        return false;
    }
    let (head, tail) = trimmed.split_at(split);
    tail.eq_ignore_ascii_case("from") && head.chars().next_back().is_none_or(|c| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_positional_and_named_params() {
        let t = Template::parse("bor|en|la|origo|t=origin");
        assert_eq!(t.name, "bor");
        assert_eq!(t.positional, vec!["en", "la", "origo"]);
        assert_eq!(t.named, vec![("t".to_string(), "origin".to_string())]);
    }

    #[test]
    fn nested_pipes_stay_in_their_param() {
        let t = Template::parse("der|en|la|[[origo|origō]]|{{m|la|x|y}}");
        assert_eq!(t.positional, vec!["en", "la", "[[origo|origō]]", "{{m|la|x|y}}"]);
    }

    #[test]
    fn derivation_renders_language_and_word() {
        assert_eq!(expand_templates("{{bor|en|la|origo}}"), "from Latin origo");
        assert_eq!(
            expand_templates("{{inh|en|ine-pro|*h₁ed-}}"),
            "from Proto-Indo-European *h₁ed-"
        );
        assert_eq!(expand_templates("{{der+|en|grc|ὕβρις}}"), "from Ancient Greek ὕβρις");
    }

    #[test]
    fn derivation_after_from_does_not_repeat_it() {
        assert_eq!(
            expand_templates("From {{bor|en|la|origo}}."),
            "From Latin origo."
        );
        assert_eq!(
            expand_templates("from {{der|en|fr|fauner}}, from {{inh|en|la|faunus}}"),
            "from French fauner, from Latin faunus"
        );
    }

    #[test]
    fn word_ending_in_from_is_not_the_word_from() {
        assert!(!ends_with_from("wherefrom"));
        assert!(ends_with_from("Borrowed from "));
        assert!(ends_with_from("FROM"));
    }

    #[test]
    fn unknown_language_code_passes_through() {
        assert_eq!(expand_templates("{{bor|en|xqa|word}}"), "from xqa word");
    }

    #[test]
    fn empty_word_slot_uses_display_form() {
        assert_eq!(expand_templates("{{der|en|la||origō}}"), "from Latin origō");
    }

    #[test]
    fn compound_affix_and_root_shapes() {
        assert_eq!(expand_templates("{{com|en|even|handed}}"), "even + handed");
        assert_eq!(expand_templates("{{af|en|un-|do|-able}}"), "un- + do + -able");
        assert_eq!(expand_templates("{{suffix|en|fawn|ing}}"), "fawn + -ing");
        assert_eq!(expand_templates("{{prefix|en|un|do}}"), "un- + do");
        assert_eq!(
            expand_templates("{{root|en|ine-pro|*bʰer-}}"),
            "from root *bʰer-"
        );
    }

    #[test]
    fn mention_and_cognate_templates_keep_their_word() {
        assert_eq!(expand_templates("{{m|la|origo}}"), "origo");
        assert_eq!(expand_templates("{{l|en|hubris}}"), "hubris");
        assert_eq!(expand_templates("{{cog|de|Ursprung}}"), "German Ursprung");
    }

    #[test]
    fn other_templates_are_stripped() {
        assert_eq!(expand_templates("a{{rfe|en}}b{{wp}}c"), "abc");
    }

    #[test]
    fn nested_templates_are_expanded_inside_params() {
        assert_eq!(
            expand_templates("{{der|en|la|{{m|la|nūgātōrius}}}}"),
            "from Latin nūgātōrius"
        );
    }

    #[test]
    fn unterminated_template_is_dropped() {
        assert_eq!(expand_templates("From {{bor|en|la"), "From ");
        assert_eq!(
            expand_templates("From {{bor|en|la|origo}}, {{cog|fr|origine\n"),
            "From Latin origo, "
        );
    }

    #[test]
    fn unterminated_template_keeps_later_templates() {
        assert_eq!(
            expand_templates("{{cog|fr {{bor|en|la|origo}}."),
            "from Latin origo."
        );
    }

    #[test]
    fn braces_inside_comments_do_not_open_templates() {
        assert_eq!(
            expand_templates("<!-- see {{ -->From {{bor|en|la|origo}}."),
            "<!-- see {{ -->From Latin origo."
        );
        assert_eq!(
            expand_templates("{{m|la|orior<!-- }} -->}} here"),
            "orior<!-- }} --> here"
        );
    }

    #[test]
    fn lists_top_level_templates() {
        let templates = top_level_templates("* {{a|en}} {{IPA|en|/x/}} text");
        let names: Vec<_> = templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "ipa"]);
    }
}
