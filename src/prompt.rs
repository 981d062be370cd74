//! Prompt construction.

use crate::styles::StyleConfig;

/// Stands in for a missing celebrity name.
const CELEBRITY_FALLBACK: &str = "a celebrity";

/// Per-request values substituted into a style template.
#[derive(Clone, Debug, Default)]
pub struct PromptParams<'a> {
    /// Name used by the two-image style
    pub celebrity_name: Option<&'a str>,
}

/// Builds the exact prompt sent to the image API.
///
/// The base template is returned verbatim when `extra_details` is blank,
/// otherwise the details are appended under the style's own heading.
pub fn build_prompt(style: &StyleConfig, params: &PromptParams<'_>, extra_details: &str) -> String {
    let celebrity = params
        .celebrity_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(CELEBRITY_FALLBACK);
    let mut prompt = style.template.replace("{celebrity}", celebrity);

    if !extra_details.trim().is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(style.details_label);
        prompt.push_str(": ");
        prompt.push_str(extra_details);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_details_return_the_template() {
        for style in StyleConfig::all() {
            let prompt = build_prompt(style, &PromptParams::default(), "");
            let expected = style.template.replace("{celebrity}", CELEBRITY_FALLBACK);
            assert_eq!(prompt, expected, "style {}", style.id);
            assert!(!prompt.ends_with(':'));
            assert!(!prompt.ends_with('\n'));
        }
    }

    #[test]
    fn whitespace_details_count_as_empty() {
        let style = StyleConfig::get("chibi-sticker").unwrap();
        assert_eq!(
            build_prompt(style, &PromptParams::default(), "  \n\t"),
            style.template
        );
    }

    #[test]
    fn details_are_appended_under_the_style_heading() {
        for style in StyleConfig::all() {
            let base = build_prompt(style, &PromptParams::default(), "");
            let prompt = build_prompt(style, &PromptParams::default(), "X");
            let suffix = prompt.strip_prefix(&base).unwrap();
            assert_eq!(suffix, format!("\n\n{}: X", style.details_label));
        }
    }

    #[test]
    fn celebrity_name_is_substituted() {
        let style = StyleConfig::get("que-paso-ayer-fiesta").unwrap();
        let params = PromptParams {
            celebrity_name: Some("Keanu"),
        };
        let prompt = build_prompt(style, &params, "");
        assert!(prompt.contains("of me and Keanu at"));
        assert!(!prompt.contains("{celebrity}"));

        let blank = PromptParams {
            celebrity_name: Some("   "),
        };
        assert!(build_prompt(style, &blank, "").contains("a celebrity"));
    }

    #[test]
    fn same_inputs_same_prompt() {
        let style = StyleConfig::get("lego-collection").unwrap();
        let a = build_prompt(style, &PromptParams::default(), "with a red cape");
        let b = build_prompt(style, &PromptParams::default(), "with a red cape");
        assert_eq!(a, b);
    }
}
