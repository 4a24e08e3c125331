//! Heading-delimited section isolation.
//!
//! Wikitext documents are split into sections by heading lines of the
//! form `==Title==`, where the number of `=` characters is the heading
//! level. Everything here slices the input; nothing is copied.

/// A parsed heading line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading<'a> {
    /// Number of `=` on each side (`==English==` is level 2).
    pub level: usize,
    /// Heading text with surrounding whitespace removed.
    pub title: &'a str,
}

/// A subsection located inside a larger section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subsection<'a> {
    /// The heading that opened the subsection.
    pub heading: Heading<'a>,
    /// Everything after the heading line up to the next heading of equal
    /// or higher level (fewer `=`), or the end of the enclosing section.
    pub body: &'a str,
}

impl<'a> Subsection<'a> {
    /// Returns the subsection's lead: the text before its first nested
    /// heading of any level.
    #[must_use]
    pub fn lead(&self) -> &'a str {
        lines(self.body)
            .find(|(_, line)| parse_heading(line).is_some())
            .map_or(self.body, |(offset, _)| &self.body[..offset])
    }
}

/// Parses a single line as a heading.
///
/// Requires at least two `=` on each side and a non-empty title. When
/// the sides are unbalanced the smaller count wins, matching how the
/// source renders them. Trailing `<!-- -->` comments are ignored.
#[must_use]
pub fn parse_heading(line: &str) -> Option<Heading<'_>> {
    let line = strip_trailing_comments(line);
    let open = line.bytes().take_while(|b| *b == b'=').count();
    let close = line.bytes().rev().take_while(|b| *b == b'=').count();
    if open < 2 || close < 2 || line.len() <= open + close {
        return None;
    }

    let level = open.min(close);
    let title = line[level..line.len() - level].trim();
    if title.is_empty() {
        return None;
    }

    Some(Heading { level, title })
}

fn strip_trailing_comments(line: &str) -> &str {
    let mut line = line.trim_end();
    while line.ends_with("-->") {
        let Some(open) = line.rfind("<!--") else {
            break;
        };
        line = line[..open].trim_end();
    }
    line
}

/// Iterates over `(byte_offset, line)` pairs. Lines exclude their
/// terminator (`\n` or `\r\n`).
pub fn lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        let line = line.strip_suffix('\r').unwrap_or(line);
        (start, line)
    })
}

/// Isolates the top-level section for `language`.
///
/// The section opens at the first `==<language>==` line and runs until
/// the next level-2 heading whose title starts with an uppercase letter
/// and differs from `language`, or the end of the document. Deeper
/// headings (`===Noun===`, `====Synonyms====`) never terminate it.
///
/// Level-2 headings that are not language names (a misplaced
/// `==Noun==`) still terminate the section, and lowercase level-2
/// titles do not. Both are known limitations of the boundary rule.
#[must_use]
pub fn isolate_language_section<'a>(document: &'a str, language: &str) -> Option<&'a str> {
    let mut start = None;

    for (offset, line) in lines(document) {
        let Some(heading) = parse_heading(line) else {
            continue;
        };
        if heading.level != 2 {
            continue;
        }

        match start {
            None if heading.title == language => {
                start = Some(offset + line_span(document, offset));
            }
            Some(begin) if is_language_boundary(heading.title, language) => {
                return Some(&document[begin..offset]);
            }
            _ => {}
        }
    }

    start.map(|begin| &document[begin..])
}

/// Finds the first subsection whose heading title satisfies `matches`.
#[must_use]
pub fn find_subsection<'a>(
    section: &'a str,
    matches: impl Fn(&str) -> bool,
) -> Option<Subsection<'a>> {
    let mut opened: Option<(Heading<'a>, usize)> = None;

    for (offset, line) in lines(section) {
        let Some(heading) = parse_heading(line) else {
            continue;
        };

        match opened {
            None if matches(heading.title) => {
                opened = Some((heading, offset + line_span(section, offset)));
            }
            Some((open, begin)) if heading.level <= open.level => {
                return Some(Subsection {
                    heading: open,
                    body: &section[begin..offset],
                });
            }
            _ => {}
        }
    }

    opened.map(|(heading, begin)| Subsection {
        heading,
        body: &section[begin..],
    })
}

/// Returns `true` for `Etymology` and numbered variants (`Etymology 2`).
#[must_use]
pub fn is_etymology_title(title: &str) -> bool {
    numbered_title(title, "Etymology")
}

/// Returns `true` for `Pronunciation` and numbered variants.
#[must_use]
pub fn is_pronunciation_title(title: &str) -> bool {
    numbered_title(title, "Pronunciation")
}

fn numbered_title(title: &str, base: &str) -> bool {
    let Some(rest) = title.strip_prefix(base) else {
        return false;
    };
    let rest = rest.trim_start();
    rest.is_empty() || rest.bytes().all(|b| b.is_ascii_digit())
}

fn is_language_boundary(title: &str, language: &str) -> bool {
    title != language && title.chars().next().is_some_and(char::is_uppercase)
}

/// Byte length of the line starting at `offset`, including its newline.
fn line_span(text: &str, offset: usize) -> usize {
    text[offset..].find('\n').map_or(text.len() - offset, |i| i + 1)
}
