//! SSE response -> [`FragmentStream`] adapter for OpenAI-compatible streaming completions.

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use super::{ApiErrorBody, FragmentStream, GenerationFragment, LlmError};

/// What one SSE `data:` payload means for the fragment sequence.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum StreamPayload {
    /// Text delta; `None` for role-only or finish chunks.
    Delta(Option<String>),
    Done,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

pub(crate) fn parse_stream_data(data: &str) -> Result<StreamPayload, LlmError> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(StreamPayload::Delta(None));
    }
    if data == "[DONE]" {
        return Ok(StreamPayload::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data)?;
    if let Some(error) = chunk.error {
        return Err(LlmError::Stream(format!(
            "upstream reported an error mid-stream: {}",
            error.message
        )));
    }

    Ok(StreamPayload::Delta(
        chunk.choices.into_iter().next().and_then(|c| c.delta.content),
    ))
}

/// Converts the body of a streaming completion response into numbered fragments.
pub fn fragment_stream(response: reqwest::Response) -> FragmentStream {
    fragments_from_bytes(response.bytes_stream())
}

/// Ends normally only after `[DONE]`; a transport error, a bad payload, or the body
/// closing early ends the sequence with one error.
fn fragments_from_bytes<S, B, E>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let mut events = Box::pin(bytes.eventsource());

    let stream = async_stream::stream! {
        let mut sequence: u64 = 0;

        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    yield Err(LlmError::Stream(e.to_string()));
                    return;
                }
            };

            match parse_stream_data(&event.data) {
                Ok(StreamPayload::Done) => return,
                Ok(StreamPayload::Delta(Some(text))) if !text.is_empty() => {
                    yield Ok(GenerationFragment { sequence, text });
                    sequence += 1;
                }
                Ok(StreamPayload::Delta(_)) => {}
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        yield Err(LlmError::Stream(
            "upstream closed the stream before signalling completion".to_string(),
        ));
    };

    Box::pin(stream)
}
