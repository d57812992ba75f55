use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use cardsmith::flashcards::DeckSpec;

use crate::app::App;
use crate::OutputFormat;

pub fn run_confirm(app: &App, draft: &Path, format: &OutputFormat) -> Result<()> {
    let content = fs::read_to_string(draft).context(format!("Failed to read {}", draft.display()))?;
    let deck: DeckSpec = serde_json::from_str(&content).context("Invalid draft file")?;

    let artifact = app.packager().confirm(&deck).context("Failed to package deck")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&artifact)?),
        OutputFormat::Plain => {
            println!("Packaged {:?} ({} cards)", artifact.deck_name, deck.cards.len());
            println!("  id:   {}", artifact.deck_id);
            println!("  file: {}", artifact.file_path.display());
        }
    }

    Ok(())
}

pub fn run_list(app: &App, format: &OutputFormat) -> Result<()> {
    let mut decks = app.packager().list().context("Failed to list decks")?;
    decks.sort_by(|a, b| a.deck_name.to_lowercase().cmp(&b.deck_name.to_lowercase()));

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&decks)?),
        OutputFormat::Plain => {
            if decks.is_empty() {
                println!("No decks found.");
                return Ok(());
            }

            let max_name_len = decks.iter().map(|d| d.deck_name.len()).max().unwrap_or(4).max(4);

            println!("{:<width$} {:<16} Template", "Name", "Id", width = max_name_len);
            println!("{} {} {}", "\u{2500}".repeat(max_name_len), "\u{2500}".repeat(16), "\u{2500}".repeat(8));
            for deck in &decks {
                println!("{:<width$} {:<16} {}", deck.deck_name, deck.deck_id, deck.template_name, width = max_name_len);
            }

            println!("\n{} decks total", decks.len());
        }
    }

    Ok(())
}

pub fn run_delete(app: &App, id: i64, format: &OutputFormat) -> Result<()> {
    if !app.packager().delete(id) {
        bail!("Deck {} or its metadata not found", id);
    }

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "deleted": id });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("Deck {} and metadata deleted.", id),
    }

    Ok(())
}
