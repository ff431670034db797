// Resume ↔ job description matching.
// All LLM calls go through llm_client; every reply passes through the normalizer.

pub mod handlers;
pub mod matcher;
pub mod prompts;
