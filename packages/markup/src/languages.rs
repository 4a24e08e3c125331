//! Language code to display name table used when expanding derivation
//! templates.

/// Returns the display name for a source-language code, or `None` for
/// codes outside the table (callers pass those through verbatim).
#[must_use]
pub fn language_name(code: &str) -> Option<&'static str> {
    Some(match code {
        "la" => "Latin",
        "la-lat" => "Late Latin",
        "la-med" | "ML." => "Medieval Latin",
        "la-new" | "NL." => "New Latin",
        "LL." => "Late Latin",
        "grc" => "Ancient Greek",
        "el" => "Greek",
        "fr" => "French",
        "frm" => "Middle French",
        "fro" => "Old French",
        "xno" => "Anglo-Norman",
        "de" => "German",
        "gml" => "Middle Low German",
        "es" => "Spanish",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        "en" => "English",
        "enm" => "Middle English",
        "ang" => "Old English",
        "non" => "Old Norse",
        "gem-pro" => "Proto-Germanic",
        "ine-pro" => "Proto-Indo-European",
        "ar" => "Arabic",
        "sa" => "Sanskrit",
        _ => return None,
    })
}
