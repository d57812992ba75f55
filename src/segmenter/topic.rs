//! Expanding a free-text topic into study material.
//!
//! The model first drafts an outline of the topic. Every outline line is
//! then developed into a passage of its own, and those passages become the
//! units fed to card generation.

use crate::error::{PipelineError, Result};
use crate::flashcards::GenerationParameters;
use crate::llm::ModelClient;

use super::models::TextUnit;

const OUTLINE_SYSTEM_PROMPT: &str = "Act as an academic expert. Produce a master outline of the \
essential foundations, structures and key themes at the core of the given topic. Be rigorous, \
precise and exhaustive.";

const EXPANSION_SYSTEM_PROMPT: &str = "Develop the following key concept in depth as if writing \
a chapter of an academic text. Explain it clearly, in detail and with precision, in a structured \
way that advanced students can follow.";

/// Sampling settings for the outline request
pub fn outline_parameters() -> GenerationParameters {
    GenerationParameters::new(OUTLINE_SYSTEM_PROMPT, 0.3, 512)
}

/// Sampling settings for each concept expansion request
pub fn expansion_parameters() -> GenerationParameters {
    GenerationParameters::new(EXPANSION_SYSTEM_PROMPT, 0.4, 512)
}

fn outline_prompt(topic: &str) -> String {
    format!(
        "You are an expert in this field with long experience teaching and breaking down complex subjects.\n\n\
         Your task is to build a deep, hierarchical master outline of the topic: \"{topic}\".\n\n\
         The outline must cover the fundamentals, key concepts, pillars and essential relationships \
         needed to understand this topic thoroughly.\n\n\
         Organise it clearly and logically, like a mind map or a detailed index, highlighting the \
         elements that support everything else.\n\n\
         Do not include explanations. Return only the outline as text, one entry per line, so each \
         entry can later be developed in detail."
    )
}

fn expansion_prompt(concept: &str) -> String {
    format!(
        "You are an expert in this field and an excellent communicator.\n\n\
         Develop the following concept or outline entry in detail:\n\n\
         \"{concept}\"\n\n\
         Explain:\n\
         - Its definition and purpose.\n\
         - Why it matters.\n\
         - Its key components or elements.\n\
         - Concrete examples or applications.\n\
         - How it relates to other parts of the main topic, where relevant.\n\n\
         Write clearly and coherently for an audience that wants to learn the subject thoroughly, \
         without oversimplifying."
    )
}

/// Ask the model for an outline of `topic` and split it into entries.
pub fn build_outline(client: &dyn ModelClient, topic: &str) -> Result<Vec<String>> {
    let params = outline_parameters();
    let response = client.query(params.system_prompt.trim(), &outline_prompt(topic.trim()), &params)?;

    let entries: Vec<String> = response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if entries.is_empty() {
        return Err(PipelineError::EmptyOutline);
    }

    log::info!("Outline for {:?} has {} entries", topic.trim(), entries.len());
    Ok(entries)
}

/// Expand a topic into one text unit per outline entry.
///
/// A failed expansion aborts the whole run; blank expansions are skipped.
pub fn expand_topic(client: &dyn ModelClient, topic: &str) -> Result<Vec<TextUnit>> {
    let entries = build_outline(client, topic)?;
    let params = expansion_parameters();

    let mut units = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        log::info!("Expanding concept {}/{}", i + 1, entries.len());

        let expansion = client
            .query(params.system_prompt.trim(), &expansion_prompt(entry), &params)
            .map_err(|source| PipelineError::ConceptExpansion { index: i + 1, source })?;

        let expansion = expansion.trim();
        if expansion.is_empty() {
            log::warn!("Concept {} expanded to nothing, skipping", i + 1);
            continue;
        }
        units.push(TextUnit::new(units.len(), expansion));
    }

    if units.is_empty() {
        return Err(PipelineError::EmptyExpansion);
    }

    Ok(units)
}
