//! Prompt construction for card generation

use crate::flashcards::{GenerationParameters, TemplateSpec, BACK_KEY, FRONT_KEY};
use crate::segmenter::TextUnit;

/// System and user messages for one generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

fn quoted_list(fields: &[String]) -> String {
    let quoted: Vec<String> = fields.iter().map(|f| format!("\"{}\"", f)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Build the prompt pair asking the model for cards about `unit`.
pub fn build_prompt(unit: &TextUnit, template: &TemplateSpec, params: &GenerationParameters) -> PromptPair {
    let instructions = format!(
        "Generate AT LEAST ONE flashcard for Anki from the text above.\n\n\
         Answer with a JSON array of objects. Each object must contain EXACTLY these two keys:\n\n\
         - \"{FRONT_KEY}\": a list of strings, one per front field, in this order: {front}\n\
         - \"{BACK_KEY}\": a list of strings, one per back field, in this order: {back}\n\n\
         IMPORTANT:\n\
         - Every element of both lists must be a string.\n\
         - The output must be strictly valid JSON. Never add explanations or comments outside the JSON.\n\
         - Return ONLY the JSON, without code fences or any other text.",
        front = quoted_list(&template.front),
        back = quoted_list(&template.back),
    );

    let user = format!(
        "EXTRACTED TEXT:\n{}\n\nINSTRUCTIONS:\n{}",
        unit.content, instructions
    );

    PromptPair {
        system: params.system_prompt.trim().to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> TemplateSpec {
        TemplateSpec::new(
            42,
            "Vocabulary",
            vec!["Word".to_string(), "Hint".to_string()],
            vec!["Meaning".to_string()],
        )
    }

    #[test]
    fn test_embeds_unit_and_field_names() {
        let unit = TextUnit::new(0, "Mitochondria  produce ATP.\n\nIndented   text.");
        let params = GenerationParameters::new("  You write flashcards.\n", 0.5, 100);

        let prompt = build_prompt(&unit, &template(), &params);

        assert_eq!(prompt.system, "You write flashcards.");
        assert!(prompt.user.contains("Mitochondria  produce ATP.\n\nIndented   text."));
        assert!(prompt.user.contains(r#"["Word", "Hint"]"#));
        assert!(prompt.user.contains(r#"["Meaning"]"#));
        assert!(prompt.user.contains("\"campos_anverso\""));
        assert!(prompt.user.contains("\"campo_reverso\""));
        assert!(prompt.user.contains("code fences"));
    }

    #[test]
    fn test_is_deterministic() {
        let unit = TextUnit::new(3, "Same input");
        let params = GenerationParameters::new("sys", 0.7, 2048);
        assert_eq!(
            build_prompt(&unit, &template(), &params),
            build_prompt(&unit, &template(), &params)
        );
    }
}
