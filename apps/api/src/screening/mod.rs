// Resume screening pipeline: folder listing, text extraction, identity
// resolution, LLM match analysis, with per-document failure isolation and
// streamed progress. All LLM calls go through llm_client, no direct API
// calls here.

pub mod analyzer;
pub mod extractor;
pub mod handlers;
pub mod identity;
pub mod pipeline;
pub mod progress;
pub mod prompts;
