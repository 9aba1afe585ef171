use crate::models::ProviderKind;

pub const ILLUSTRATIVE: &str = include_str!("../data/prompts/illustrative.txt");
pub const PHOTOREALISTIC: &str = include_str!("../data/prompts/photorealistic.txt");

/// Visual register a prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    Illustrative,
    Photorealistic,
}

impl PromptStyle {
    pub fn for_provider(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::Gemini => PromptStyle::Illustrative,
            ProviderKind::Freepik => PromptStyle::Photorealistic,
        }
    }

    fn template(&self) -> &'static str {
        match self {
            PromptStyle::Illustrative => ILLUSTRATIVE,
            PromptStyle::Photorealistic => PHOTOREALISTIC,
        }
    }
}

/// Build the generation prompt for `subject_name` working as `role`.
pub fn build(subject_name: &str, role: &str, style: PromptStyle) -> String {
    render(
        style.template(),
        &[("subject", subject_name), ("role", role)],
    )
}

/// Replace `{{key}}` placeholders in a template string.
///
/// Substitution is a single left-to-right pass: inserted values are never
/// scanned for placeholders. Unknown placeholders are left as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let replacement = after_open.find("}}").and_then(|end| {
            let key = &after_open[..end];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, end))
        });

        match replacement {
            Some((value, end)) => {
                result.push_str(value);
                rest = &after_open[end + 2..];
            }
            None => {
                result.push_str("{{");
                rest = after_open;
            }
        }
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("Hello {{name}}!", &[("name", "world")]),
            "Hello world!"
        );
    }

    #[test]
    fn test_render_multiple_vars() {
        assert_eq!(
            render("{{a}} and {{b}}", &[("a", "cats"), ("b", "dogs")]),
            "cats and dogs"
        );
    }

    #[test]
    fn test_render_does_not_expand_inserted_values() {
        assert_eq!(
            render("{{a}} / {{b}}", &[("a", "{{b}}"), ("b", "x")]),
            "{{b}} / x"
        );
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        assert_eq!(render("{{missing}} {{a}", &[("a", "x")]), "{{missing}} {{a}");
    }

    #[test]
    fn test_templates_have_placeholders() {
        for template in [ILLUSTRATIVE, PHOTOREALISTIC] {
            assert!(template.contains("{{subject}}"));
            assert!(template.contains("{{role}}"));
        }
    }

    #[test]
    fn test_build_embeds_inputs_verbatim() {
        let inputs = [
            ("Emma", "Scientist"),
            ("Lucas", "Astronaut"),
            ("Zoë {{role}}", "Marine \"biologist\""),
        ];

        for (subject, role) in inputs {
            for style in [PromptStyle::Illustrative, PromptStyle::Photorealistic] {
                let prompt = build(subject, role, style);
                assert!(prompt.contains(subject), "{style:?} missing {subject}");
                assert!(prompt.contains(role), "{style:?} missing {role}");
                assert!(!prompt.contains("{{subject}}"));
            }
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let first = build("Emma", "Doctor", PromptStyle::Photorealistic);
        let second = build("Emma", "Doctor", PromptStyle::Photorealistic);
        assert_eq!(first, second);
    }

    #[test]
    fn test_styles_produce_different_prompts() {
        let illustrative = build("Emma", "Doctor", PromptStyle::Illustrative);
        let photo = build("Emma", "Doctor", PromptStyle::Photorealistic);
        assert_ne!(illustrative, photo);
        assert!(photo.contains("PHOTOREALISTIC"));
        assert_eq!(
            PromptStyle::for_provider(ProviderKind::Gemini),
            PromptStyle::Illustrative
        );
    }
}
