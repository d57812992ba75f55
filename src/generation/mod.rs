//! Card generation: prompting the model and cleaning up what it returns.

mod pipeline;
mod prompt;
mod sanitizer;

pub use pipeline::FlashcardGenerator;
pub use prompt::{build_prompt, PromptPair};
pub use sanitizer::{extract_valid_json, parse_response, sanitize, SanitizePolicy};
