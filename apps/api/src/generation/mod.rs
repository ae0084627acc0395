// Content generation: staged LLM pipeline, JSON recovery, HTTP handler.

pub mod extract;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
