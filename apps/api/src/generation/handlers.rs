//! Axum route handlers for the description endpoints.

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info};

use crate::errors::AppError;
use crate::generation::pipeline::{
    DescriptionRequest, DescriptionResponse, PipelineEvent, RunOutcome,
};
use crate::state::AppState;

/// Fragments buffered between the pipeline task and a slow client.
const EVENT_BUFFER: usize = 32;

/// POST /jobs/:id/description
///
/// Generates the full description, saves it, then returns it.
pub async fn handle_generate_description(
    State(state): State<AppState>,
    Path(job_id): Path<i32>,
    Json(request): Json<DescriptionRequest>,
) -> Result<Json<DescriptionResponse>, AppError> {
    let structured = request.structured.unwrap_or(state.config.structured_output);
    let pipeline = state.description_pipeline();

    let run = pipeline.prepare(job_id, request, structured).await?;
    let response = pipeline.run_blocking(run).await?;

    Ok(Json(response))
}

/// POST /jobs/:id/description/stream
///
/// Streams fragments as `fragment` events, then one `done` or `error` event.
/// Unknown job or company ids fail with a plain 404 before the stream opens.
pub async fn handle_stream_description(
    State(state): State<AppState>,
    Path(job_id): Path<i32>,
    Json(request): Json<DescriptionRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let structured = request.structured.unwrap_or(state.config.structured_output);
    let pipeline = state.description_pipeline();

    let run = pipeline.prepare(job_id, request, structured).await?;
    info!("Streaming description for job {job_id} (structured: {structured})");

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    tokio::spawn(async move {
        match pipeline.run_streaming(run, tx).await {
            RunOutcome::Completed(done) => debug!(
                "Stream for job {job_id} finished (structured: {}, {} chars)",
                done.structured,
                done.description.len()
            ),
            RunOutcome::Failed(e) => debug!("Stream for job {job_id} ended with {}", e.code()),
            RunOutcome::Cancelled => debug!("Stream for job {job_id} cancelled by caller"),
        }
    });

    let events = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(to_sse_event(event)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: PipelineEvent) -> Event {
    let encoded = match &event {
        PipelineEvent::Fragment(fragment) => Event::default().event("fragment").json_data(fragment),
        PipelineEvent::Completed(done) => Event::default().event("done").json_data(done),
        PipelineEvent::Failed(failure) => Event::default().event("error").json_data(failure),
    };

    encoded.unwrap_or_else(|e| {
        error!("Failed to encode SSE event: {e}");
        Event::default()
            .event("error")
            .data(r#"{"code":"INTERNAL_ERROR","message":"An internal server error occurred"}"#)
    })
}
