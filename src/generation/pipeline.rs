//! End-to-end card generation runs.

use crate::error::{PipelineError, Result};
use crate::flashcards::{GeneratedCard, GenerationParameters, TemplateSpec};
use crate::llm::ModelClient;
use crate::segmenter::{self, ChunkConfig, DocumentFormat, TextUnit};

use super::prompt::build_prompt;
use super::sanitizer::{parse_response, SanitizePolicy};

/// Drives segmentation, prompting and sanitizing against one model client.
pub struct FlashcardGenerator<C> {
    client: C,
    chunk_config: ChunkConfig,
}

impl<C: ModelClient> FlashcardGenerator<C> {
    pub fn new(client: C, chunk_config: ChunkConfig) -> Self {
        Self { client, chunk_config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Generate cards from a document. Model output is kept as raw objects.
    pub fn generate_from_document(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
        template: &TemplateSpec,
        params: &GenerationParameters,
    ) -> Result<Vec<GeneratedCard>> {
        let units = segmenter::segment_document(bytes, format, &self.chunk_config)?;
        self.generate_batch(&units, template, params, SanitizePolicy::Lenient)
    }

    /// Generate cards from a topic. Only complete front/back records are kept.
    pub fn generate_from_topic(
        &self,
        topic: &str,
        template: &TemplateSpec,
        params: &GenerationParameters,
    ) -> Result<Vec<GeneratedCard>> {
        let units = segmenter::expand_topic(&self.client, topic)?;
        self.generate_batch(&units, template, params, SanitizePolicy::Strict)
    }

    /// Generate cards for one unit.
    pub fn generate_unit(
        &self,
        unit: &TextUnit,
        template: &TemplateSpec,
        params: &GenerationParameters,
        policy: SanitizePolicy,
    ) -> Result<Vec<GeneratedCard>> {
        let prompt = build_prompt(unit, template, params);
        let response = self.client.query(&prompt.system, &prompt.user, params)?;
        parse_response(&response, policy)
    }

    /// Run every unit in order, skipping the ones that fail.
    ///
    /// Fails only when the whole batch produces no cards.
    pub fn generate_batch(
        &self,
        units: &[TextUnit],
        template: &TemplateSpec,
        params: &GenerationParameters,
        policy: SanitizePolicy,
    ) -> Result<Vec<GeneratedCard>> {
        let mut cards = Vec::new();

        for unit in units {
            log::info!("Processing unit {}/{}", unit.index + 1, units.len());

            match self.generate_unit(unit, template, params, policy) {
                Ok(generated) if generated.is_empty() => {
                    log::warn!("Unit {} produced no usable cards, skipping", unit.index + 1);
                }
                Ok(generated) => cards.extend(generated),
                Err(e) => {
                    log::warn!("Unit {} discarded: {}", unit.index + 1, e);
                }
            }
        }

        if cards.is_empty() {
            return Err(PipelineError::NoCardsGenerated);
        }

        log::info!("Generated {} cards from {} units", cards.len(), units.len());
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedClient;

    const ONE_CARD: &str = r#"Here: [{"campos_anverso": ["Q"], "campo_reverso": ["A"]}]"#;

    fn template() -> TemplateSpec {
        TemplateSpec::new(1 << 40, "Basic", vec!["Front".to_string()], vec!["Back".to_string()])
    }

    fn params() -> GenerationParameters {
        GenerationParameters::new("You write flashcards.", 0.7, 2048)
    }

    fn units(n: usize) -> Vec<TextUnit> {
        (0..n).map(|i| TextUnit::new(i, format!("chunk {}", i))).collect()
    }

    #[test]
    fn test_batch_skips_failed_units() {
        let client = ScriptedClient::new(vec![
            Ok(ONE_CARD),
            Ok("I cannot help with that."),
            Ok(ONE_CARD),
            Ok("[not json]"),
            Ok(ONE_CARD),
        ]);
        let generator = FlashcardGenerator::new(client, ChunkConfig::default());

        let cards = generator
            .generate_batch(&units(5), &template(), &params(), SanitizePolicy::Lenient)
            .unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!(generator.client().requests().len(), 5);
    }

    #[test]
    fn test_batch_with_no_cards_fails() {
        let client = ScriptedClient::new(vec![Ok("nope"), Err("overloaded"), Ok("[]")]);
        let generator = FlashcardGenerator::new(client, ChunkConfig::default());

        assert!(matches!(
            generator.generate_batch(&units(3), &template(), &params(), SanitizePolicy::Lenient),
            Err(PipelineError::NoCardsGenerated)
        ));
    }

    #[test]
    fn test_strict_unit_with_zero_records_is_skipped() {
        let client = ScriptedClient::new(vec![
            Ok(r#"[{"campos_anverso": ["lonely front"]}]"#),
            Ok(ONE_CARD),
        ]);
        let generator = FlashcardGenerator::new(client, ChunkConfig::default());

        let cards = generator
            .generate_batch(&units(2), &template(), &params(), SanitizePolicy::Strict)
            .unwrap();
        assert_eq!(cards.len(), 1);
        assert!(matches!(cards[0], GeneratedCard::Record(_)));
    }

    #[test]
    fn test_document_run_keeps_raw_objects() {
        let client = ScriptedClient::new(vec![Ok(r#"[{"pregunta_anverso": ["Q"], "x": 1}]"#)]);
        let generator = FlashcardGenerator::new(client, ChunkConfig::default());

        let cards = generator
            .generate_from_document(b"Short document.", DocumentFormat::Text, &template(), &params())
            .unwrap();
        assert_eq!(cards.len(), 1);
        assert!(matches!(cards[0], GeneratedCard::Raw(_)));

        let requests = generator.client().requests();
        assert_eq!(requests[0].messages[0].content, "You write flashcards.");
        assert!(requests[0].messages[1].content.contains("Short document."));
    }

    #[test]
    fn test_topic_run_validates_records() {
        let client = ScriptedClient::new(vec![
            Ok("Concept A\nConcept B"),
            Ok("All about A."),
            Ok("All about B."),
            Ok(ONE_CARD),
            Ok(r#"[{"campos_anverso": "Q2", "campo_reverso": "A2"}, {"x": 1}]"#),
        ]);
        let generator = FlashcardGenerator::new(client, ChunkConfig::default());

        let cards = generator.generate_from_topic("Letters", &template(), &params()).unwrap();
        assert_eq!(cards.len(), 2);
        assert!(cards.iter().all(|c| matches!(c, GeneratedCard::Record(_))));

        let requests = generator.client().requests();
        assert!(requests[3].messages[1].content.contains("All about A."));
        assert_eq!(requests[3].temperature, 0.7);
    }

    #[test]
    fn test_topic_expansion_failure_aborts() {
        let client = ScriptedClient::new(vec![Ok("Concept A"), Err("boom")]);
        let generator = FlashcardGenerator::new(client, ChunkConfig::default());

        assert!(matches!(
            generator.generate_from_topic("Letters", &template(), &params()),
            Err(PipelineError::ConceptExpansion { index: 1, .. })
        ));
    }
}
