//! IPA pronunciation lookup.

use crate::section::{find_subsection, is_pronunciation_title};
use crate::template::top_level_templates;

/// Returns the transcriptions of the first `{{IPA|<lang>|...}}` template
/// in the section's pronunciation subsection, joined with `", "`.
#[must_use]
pub fn extract_ipa(language_section: &str) -> Option<String> {
    let subsection = find_subsection(language_section, is_pronunciation_title)?;

    top_level_templates(subsection.body)
        .into_iter()
        .find(|t| t.name == "ipa")
        .map(|t| {
            t.positional
                .into_iter()
                .skip(1)
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|ipa| !ipa.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_all_transcriptions() {
        let section = "===Pronunciation===\n* {{a|UK}} {{IPA|en|/ɪˈfɛm(ə)ɹəl/|/əˈfɛməɹəl/|a=RP}}\n===Adjective===\n";
        assert_eq!(
            extract_ipa(section).as_deref(),
            Some("/ɪˈfɛm(ə)ɹəl/, /əˈfɛməɹəl/")
        );
    }

    #[test]
    fn none_without_pronunciation_section() {
        assert!(extract_ipa("===Etymology===\nFrom Latin.\n").is_none());
    }

    #[test]
    fn none_without_ipa_template() {
        assert!(extract_ipa("===Pronunciation===\n* {{audio|en|x.ogg}}\n").is_none());
    }
}
