//! LLM integration for registry fact extraction.
//!
//! Uses a local LLM (via Ollama) or an OpenAI-compatible API to answer the
//! extraction prompts.

mod client;

pub use client::{
    CompletionService, LlmClient, LlmConfig, LlmError, LlmProvider, DEFAULT_ADDRESSES_PROMPT,
    DEFAULT_OFFICE_PROMPT,
};
