// Job description generation.
// prompt_builder renders the request, pipeline drives the completion and the single write,
// structured parses and renders the JSON form. All completion calls go through llm_client.

pub mod handlers;
pub mod pipeline;
pub mod prompt_builder;
pub mod prompts;
pub mod structured;
