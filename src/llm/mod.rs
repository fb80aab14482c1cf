//! Answer generation on top of retrieved context.
//!
//! Providers all speak chat-completion APIs: OpenAI and Together share the
//! OpenAI wire format (Together is the same client pointed at a different
//! base URL), and Ollama has its own local `/api/chat` endpoint. Selection
//! is an explicit [`Provider`] value; [`Provider::create_client`] returns
//! the boxed [`GenerationProvider`] for it.

pub mod chat;
pub mod client;
pub mod ollama;
pub mod prompt;

pub use chat::ChatCompletionClient;
pub use client::{GeneratedAnswer, GenerationOptions, GenerationProvider, Provider};
pub use ollama::OllamaClient;
pub use prompt::build_prompt;
