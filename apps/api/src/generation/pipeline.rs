//! Description pipeline — generates a job description and saves it exactly once.
//!
//! Flow: look up job + company → build prompt → stream (or block on) the completion →
//!       relay fragments while accumulating → optional structured parse → one write.
//!
//! Nothing is written unless the completion finished. A caller that disconnects
//! mid-stream cancels the run and the partial text is dropped.

use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::generation::prompt_builder::{build_prompt, GenerationRequest};
use crate::generation::structured::{parse_structured, render_description};
use crate::llm_client::{
    GenerationFragment, GenerationParams, LlmError, PromptSpec, TextGenerator,
};
use crate::store::RecordStore;

// ────────────────────────────────────────────────────────────────────────────
// Request / response types
// ────────────────────────────────────────────────────────────────────────────

/// Body of both description endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescriptionRequest {
    #[serde(default, alias = "requiredTools")]
    pub required_tools: Vec<String>,
    #[serde(default, alias = "companyCulture")]
    pub company_culture: Option<String>,
    /// Overrides the configured default output mode.
    #[serde(default)]
    pub structured: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DescriptionResponse {
    pub job_id: i32,
    pub description: String,
    pub company_name: String,
    pub job_title: String,
}

/// A run whose prompt is built and whose records are known to exist.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub job_id: i32,
    pub job_title: String,
    pub company_name: String,
    pub structured: bool,
    pub prompt: PromptSpec,
}

/// What the streaming caller receives, in order. `Completed` and `Failed` are terminal.
#[derive(Debug)]
pub enum PipelineEvent {
    Fragment(GenerationFragment),
    Completed(CompletedDescription),
    Failed(PipelineFailure),
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedDescription {
    pub job_id: i32,
    /// True when the saved text is the rendered structured form.
    pub structured: bool,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineFailure {
    pub code: &'static str,
    pub message: String,
}

impl From<&AppError> for PipelineFailure {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code(),
            message: err.public_message(),
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(CompletedDescription),
    Failed(AppError),
    /// The caller went away before the completion finished.
    Cancelled,
}

// ────────────────────────────────────────────────────────────────────────────
// Stage tracking
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    PromptBuilt,
    /// Waiting on the completion service. Blocking runs pass through here too.
    Streaming,
    Accumulated,
    Parsed,
    Persisted,
    Done,
    Failed,
}

impl Stage {
    pub fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Idle, PromptBuilt)
            | (PromptBuilt, Streaming)
            | (Streaming, Accumulated)
            | (Accumulated, Parsed)
            | (Accumulated, Persisted)
            | (Parsed, Persisted)
            | (Persisted, Done) => true,
            _ => false,
        }
    }
}

struct StageTracker {
    job_id: i32,
    stage: Stage,
}

impl StageTracker {
    fn new(job_id: i32, stage: Stage) -> Self {
        Self { job_id, stage }
    }

    fn advance(&mut self, next: Stage) {
        if self.stage.can_advance_to(next) {
            debug!("Job {}: {:?} -> {:?}", self.job_id, self.stage, next);
        } else {
            error!(
                "Job {}: illegal stage transition {:?} -> {:?}",
                self.job_id, self.stage, next
            );
        }
        self.stage = next;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// One pipeline per request; holds no state across runs.
pub struct DescriptionPipeline {
    store: Arc<dyn RecordStore>,
    generator: Arc<dyn TextGenerator>,
    params: GenerationParams,
}

impl DescriptionPipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        generator: Arc<dyn TextGenerator>,
        params: GenerationParams,
    ) -> Self {
        Self {
            store,
            generator,
            params,
        }
    }

    /// `Idle -> PromptBuilt`. Fails with `NotFound` before any completion call when
    /// the job posting or its company is missing.
    pub async fn prepare(
        &self,
        job_id: i32,
        request: DescriptionRequest,
        structured: bool,
    ) -> Result<PreparedRun, AppError> {
        let job = self
            .store
            .get_job_posting(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job posting {job_id} not found")))?;

        let company = self
            .store
            .get_company(job.company_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Company {} not found", job.company_id)))?;

        let title = job.title.clone().ok_or_else(|| {
            AppError::Validation(format!("Job posting {job_id} has no title to describe"))
        })?;

        let generation = GenerationRequest::new(
            title,
            company.name.clone(),
            job.location.clone(),
            request.required_tools,
            request.company_culture,
        )?;
        let prompt = build_prompt(&generation, structured);

        debug!("Job {job_id}: {:?} -> {:?}", Stage::Idle, Stage::PromptBuilt);

        Ok(PreparedRun {
            job_id,
            job_title: generation.subject_title().to_string(),
            company_name: generation.organization_name().to_string(),
            structured,
            prompt,
        })
    }

    /// Whole-response mode: one completion call, one write, then the response.
    pub async fn run_blocking(&self, run: PreparedRun) -> Result<DescriptionResponse, AppError> {
        let mut stage = StageTracker::new(run.job_id, Stage::PromptBuilt);
        stage.advance(Stage::Streaming);

        let text = match self
            .generator
            .complete_blocking(&run.prompt, &self.params)
            .await
        {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                stage.advance(Stage::Failed);
                warn!("Job {}: completion finished without text", run.job_id);
                return Err(LlmError::EmptyContent.into());
            }
            Err(e) => {
                stage.advance(Stage::Failed);
                warn!("Job {}: completion failed: {e}", run.job_id);
                return Err(e.into());
            }
        };
        stage.advance(Stage::Accumulated);

        let (description, _) = self.finalize(&mut stage, text, run.structured);

        if let Err(e) = self
            .store
            .update_job_posting_description(run.job_id, &description)
            .await
        {
            stage.advance(Stage::Failed);
            return Err(e);
        }
        stage.advance(Stage::Persisted);
        stage.advance(Stage::Done);

        info!(
            "Generated description for job {} ({} chars)",
            run.job_id,
            description.len()
        );

        Ok(DescriptionResponse {
            job_id: run.job_id,
            description,
            company_name: run.company_name,
            job_title: run.job_title,
        })
    }

    /// Streaming mode. Every fragment is sent on `events` as it arrives, then exactly one
    /// terminal event. The channel closes when this returns.
    pub async fn run_streaming(
        &self,
        run: PreparedRun,
        events: mpsc::Sender<PipelineEvent>,
    ) -> RunOutcome {
        let mut stage = StageTracker::new(run.job_id, Stage::PromptBuilt);

        let mut fragments = match self
            .generator
            .complete_streaming(&run.prompt, &self.params)
            .await
        {
            Ok(fragments) => fragments,
            Err(e) => return fail(&mut stage, &events, e.into()).await,
        };
        stage.advance(Stage::Streaming);

        let mut accumulated = String::new();
        let mut relayed: u64 = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = events.closed() => {
                    return cancel(&mut stage, relayed);
                }
                next = fragments.next() => next,
            };

            match next {
                Some(Ok(fragment)) => {
                    accumulated.push_str(&fragment.text);
                    if events.send(PipelineEvent::Fragment(fragment)).await.is_err() {
                        return cancel(&mut stage, relayed);
                    }
                    relayed += 1;
                }
                Some(Err(e)) => return fail(&mut stage, &events, e.into()).await,
                None => break,
            }
        }
        // Dropping the upstream stream here releases the HTTP connection.
        drop(fragments);

        // An empty completion must not overwrite the stored description.
        if accumulated.trim().is_empty() {
            return fail(&mut stage, &events, LlmError::EmptyContent.into()).await;
        }
        stage.advance(Stage::Accumulated);

        let (description, structured) = self.finalize(&mut stage, accumulated, run.structured);

        if let Err(e) = self
            .store
            .update_job_posting_description(run.job_id, &description)
            .await
        {
            return fail(&mut stage, &events, e).await;
        }
        stage.advance(Stage::Persisted);

        info!(
            "Streamed description for job {} ({} fragments, {} chars)",
            run.job_id,
            relayed,
            description.len()
        );

        let completed = CompletedDescription {
            job_id: run.job_id,
            structured,
            description,
        };

        // The write already happened; a caller that left just misses the confirmation.
        let _ = events
            .send(PipelineEvent::Completed(completed.clone()))
            .await;
        stage.advance(Stage::Done);

        RunOutcome::Completed(completed)
    }

    /// Picks the text to persist. In structured mode a parse failure falls back to the
    /// raw text unchanged.
    fn finalize(&self, stage: &mut StageTracker, text: String, structured: bool) -> (String, bool) {
        if !structured {
            return (text, false);
        }

        match parse_structured(&text) {
            Ok(description) => {
                stage.advance(Stage::Parsed);
                (render_description(&description), true)
            }
            Err(e) => {
                warn!(
                    "Job {}: structured output did not parse ({e}); saving raw text",
                    stage.job_id
                );
                (text, false)
            }
        }
    }
}

async fn fail(
    stage: &mut StageTracker,
    events: &mpsc::Sender<PipelineEvent>,
    err: AppError,
) -> RunOutcome {
    stage.advance(Stage::Failed);
    warn!("Job {}: description run failed: {err}", stage.job_id);
    let _ = events
        .send(PipelineEvent::Failed(PipelineFailure::from(&err)))
        .await;
    RunOutcome::Failed(err)
}

fn cancel(stage: &mut StageTracker, relayed: u64) -> RunOutcome {
    stage.advance(Stage::Failed);
    info!(
        "Job {}: caller disconnected after {relayed} fragments; discarding partial text",
        stage.job_id
    );
    RunOutcome::Cancelled
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
