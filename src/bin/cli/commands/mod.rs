pub mod decks;
pub mod generate;
pub mod sync;
pub mod templates;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an expert teacher who writes clear, accurate and self-contained flashcards.";
