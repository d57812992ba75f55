use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use cardsmith::flashcards::{DeckSpec, MarkerFields};
use cardsmith::llm::ModelClient;
use cardsmith::segmenter::DocumentFormat;

use crate::app::App;
use crate::{DraftArgs, OutputFormat, PromptArgs, TemplateArgs};

pub fn run_document(
    app: &App,
    file: &Path,
    template: &TemplateArgs,
    prompt: &PromptArgs,
    draft: &DraftArgs,
    format: &OutputFormat,
) -> Result<()> {
    let doc_format = DocumentFormat::from_path(file)
        .context(format!("Unsupported document type: {}", file.display()))?;
    let bytes = fs::read(file).context(format!("Failed to read {}", file.display()))?;

    let spec = app.resolve_template(template)?;
    let cards = app
        .generator()?
        .generate_from_document(&bytes, doc_format, &spec, &prompt.parameters())
        .context("Card generation failed")?;

    let default_name = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Deck".to_string());

    let deck = DeckSpec {
        name: draft.deck_name.clone().unwrap_or(default_name),
        template: spec,
        cards,
    };
    write_draft(&deck, draft, format)
}

pub fn run_topic(
    app: &App,
    topic: &str,
    template: &TemplateArgs,
    prompt: &PromptArgs,
    draft: &DraftArgs,
    format: &OutputFormat,
) -> Result<()> {
    let spec = app.resolve_template(template)?;
    let cards = app
        .generator()?
        .generate_from_topic(topic, &spec, &prompt.parameters())
        .context("Card generation failed")?;

    let deck = DeckSpec {
        name: draft.deck_name.clone().unwrap_or_else(|| topic.trim().to_string()),
        template: spec,
        cards,
    };
    write_draft(&deck, draft, format)
}

pub fn run_query(app: &App, prompt: &str, settings: &PromptArgs, format: &OutputFormat) -> Result<()> {
    let params = settings.parameters();
    let reply = app
        .config
        .model_client()?
        .query(params.system_prompt.trim(), prompt, &params)
        .context("Model query failed")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "response": reply });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("{}", reply),
    }

    Ok(())
}

fn write_draft(deck: &DeckSpec, draft: &DraftArgs, format: &OutputFormat) -> Result<()> {
    if let Some(path) = &draft.output {
        fs::write(path, serde_json::to_string_pretty(deck)?)
            .context(format!("Failed to write {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&deck.cards)?);
        }
        OutputFormat::Plain => {
            let raw = MarkerFields::default();
            for (i, card) in deck.cards.iter().enumerate() {
                let sides = card.sides(&raw);
                println!("{:>3}. {}", i + 1, sides.front.join(" | "));
                println!("     {}", sides.back.join(" | "));
            }

            println!("\n{} cards generated for {:?}", deck.cards.len(), deck.name);
            if let Some(path) = &draft.output {
                println!("Draft saved to {}; review it, then run `cardsmith confirm {}`", path.display(), path.display());
            }
        }
    }

    Ok(())
}
