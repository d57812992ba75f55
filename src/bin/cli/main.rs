mod app;
mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cardsmith", about = "Generate Anki decks with a local language model", version)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Field template selection, either stored or given inline
#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Use a stored template by id
    #[arg(long, conflicts_with_all = ["front", "back"])]
    template: Option<i64>,
    /// Comma-separated front field names
    #[arg(long, value_delimiter = ',')]
    front: Vec<String>,
    /// Comma-separated back field names
    #[arg(long, value_delimiter = ',')]
    back: Vec<String>,
    /// Name for an inline template
    #[arg(long, default_value = "Basic")]
    template_name: String,
}

/// Model instruction and sampling settings
#[derive(Args, Debug)]
pub struct PromptArgs {
    /// System instruction sent with every request
    #[arg(long, default_value = commands::DEFAULT_SYSTEM_PROMPT)]
    system_prompt: String,
    /// Sampling temperature (0.0 - 1.0)
    #[arg(long, default_value = "0.7")]
    temperature: f32,
    /// Maximum tokens per reply
    #[arg(long, default_value = "2048")]
    max_tokens: u32,
}

/// Where the generated cards go for review
#[derive(Args, Debug)]
pub struct DraftArgs {
    /// Deck name recorded in the draft
    #[arg(long)]
    deck_name: Option<String>,
    /// Write the draft deck to this file for `confirm`
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate cards from a PDF or text document
    Generate {
        /// Document to read
        file: PathBuf,
        #[command(flatten)]
        template: TemplateArgs,
        #[command(flatten)]
        prompt: PromptArgs,
        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Generate cards about a topic
    Topic {
        /// Topic to study
        topic: String,
        #[command(flatten)]
        template: TemplateArgs,
        #[command(flatten)]
        prompt: PromptArgs,
        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Package a reviewed draft into an .apkg deck
    Confirm {
        /// Draft file written by `generate` or `topic`
        draft: PathBuf,
    },

    /// Send one prompt to the model and print the reply
    Query {
        /// User message
        prompt: String,
        #[command(flatten)]
        settings: PromptArgs,
    },

    /// Packaged decks
    #[command(subcommand)]
    Decks(DecksCommand),

    /// Field templates
    #[command(subcommand)]
    Templates(TemplatesCommand),

    /// Share decks and templates over WebDAV
    #[command(subcommand)]
    Sync(SyncCommand),
}

#[derive(Subcommand)]
enum DecksCommand {
    /// List packaged decks
    List,
    /// Delete a deck and its metadata
    Delete {
        /// Deck id
        id: i64,
    },
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// Create a template
    Create {
        /// Template name
        name: String,
        /// Comma-separated front field names
        #[arg(long, value_delimiter = ',', required = true)]
        front: Vec<String>,
        /// Comma-separated back field names
        #[arg(long, value_delimiter = ',', required = true)]
        back: Vec<String>,
    },
    /// List templates
    List,
    /// Show one template
    Show {
        /// Template id
        id: i64,
    },
    /// Delete a template
    Delete {
        /// Template id
        id: i64,
    },
}

#[derive(Subcommand)]
enum SyncCommand {
    /// Push local items missing on the server
    Upload,
    /// Pull server items missing locally
    Download,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let app = app::App::new()?;

    match cli.command {
        Command::Generate { file, template, prompt, draft } => {
            commands::generate::run_document(&app, &file, &template, &prompt, &draft, &cli.format)?;
        }
        Command::Topic { topic, template, prompt, draft } => {
            commands::generate::run_topic(&app, &topic, &template, &prompt, &draft, &cli.format)?;
        }
        Command::Confirm { draft } => {
            commands::decks::run_confirm(&app, &draft, &cli.format)?;
        }
        Command::Query { prompt, settings } => {
            commands::generate::run_query(&app, &prompt, &settings, &cli.format)?;
        }
        Command::Decks(subcmd) => match subcmd {
            DecksCommand::List => commands::decks::run_list(&app, &cli.format)?,
            DecksCommand::Delete { id } => commands::decks::run_delete(&app, id, &cli.format)?,
        },
        Command::Templates(subcmd) => match subcmd {
            TemplatesCommand::Create { name, front, back } => {
                commands::templates::run_create(&app, name, front, back, &cli.format)?;
            }
            TemplatesCommand::List => commands::templates::run_list(&app, &cli.format)?,
            TemplatesCommand::Show { id } => commands::templates::run_show(&app, id, &cli.format)?,
            TemplatesCommand::Delete { id } => commands::templates::run_delete(&app, id, &cli.format)?,
        },
        Command::Sync(subcmd) => match subcmd {
            SyncCommand::Upload => commands::sync::run_upload(&app, &cli.format)?,
            SyncCommand::Download => commands::sync::run_download(&app, &cli.format)?,
        },
    }

    Ok(())
}
