use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::generation::pipeline::DescriptionPipeline;
use crate::llm_client::{GenerationParams, TextGenerator};
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Used directly by the CRUD handlers.
    pub db: PgPool,
    /// Lookups and the description write used by the description pipeline.
    pub store: Arc<dyn RecordStore>,
    /// Completion backend. Default: LlmClient against an OpenAI-compatible API.
    pub generator: Arc<dyn TextGenerator>,
    pub config: Config,
}

impl AppState {
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            model: self.config.openai_model.clone(),
            temperature: self.config.generation_temperature,
            max_tokens: self.config.generation_max_tokens,
        }
    }

    pub fn description_pipeline(&self) -> DescriptionPipeline {
        DescriptionPipeline::new(
            self.store.clone(),
            self.generator.clone(),
            self.generation_params(),
        )
    }
}
