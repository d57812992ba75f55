//! Language model access.

mod client;
mod models;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{HttpModelClient, ModelBackendError, ModelClient};
pub use models::{ChatMessage, ChatRequest, Role};
