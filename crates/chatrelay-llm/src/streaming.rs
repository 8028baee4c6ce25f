use futures::{Stream, StreamExt};
use serde::Deserialize;

use crate::buffer_utils::LineBuffer;
use crate::error::LlmError;
use crate::traits::FragmentStream;

const DONE_MARKER: &str = "[DONE]";

/// One `data:` payload of a streamed chat completion
///
/// Only the fields the relay reads are modelled; everything else is ignored.
/// Azure prepends chunks with an empty `choices` array (content filter
/// results), hence the defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
}

impl ChatStreamChunk {
    /// Text at `choices[0].delta.content`, if any
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
            .filter(|c| !c.is_empty())
    }
}

/// What a single SSE line contributes to the fragment sequence
#[derive(Debug, PartialEq)]
pub enum SseLine {
    Fragment(String),
    Done,
    Skip,
}

/// Interpret one line of an SSE body
///
/// Lines that are not `data:` fields, chunks without content, and malformed
/// JSON all map to [`SseLine::Skip`]; malformed payloads are logged.
pub fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();

    if data == DONE_MARKER {
        return SseLine::Done;
    }
    if data.is_empty() {
        return SseLine::Skip;
    }

    match serde_json::from_str::<ChatStreamChunk>(data) {
        Ok(chunk) => match chunk.content() {
            Some(content) => SseLine::Fragment(content.to_string()),
            None => SseLine::Skip,
        },
        Err(e) => {
            tracing::warn!(error = %e, payload = %data, "Skipping malformed stream fragment");
            SseLine::Skip
        }
    }
}

/// Turn a chat-completions SSE body into a stream of content fragments
///
/// The stream ends at `data: [DONE]` or when the body ends. A transport error
/// is yielded once and terminates the stream.
pub fn parse_chat_sse_stream<S, B, E>(byte_stream: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<LlmError> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(byte_stream);
        let mut buffer = LineBuffer::with_capacity(8192);

        'body: while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(bytes.as_ref());

                    while let Some(line_result) = buffer.next_line() {
                        let line = match line_result {
                            Ok(line) => line,
                            Err(e) => {
                                tracing::warn!(error = %e, "Skipping non UTF-8 stream line");
                                continue;
                            }
                        };

                        match parse_sse_line(&line) {
                            SseLine::Fragment(text) => yield Ok(text),
                            SseLine::Done => break 'body,
                            SseLine::Skip => {}
                        }
                    }
                }
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            }
        }

        if let Some(Ok(line)) = buffer.take_remainder() {
            if let SseLine::Fragment(text) = parse_sse_line(&line) {
                yield Ok(text);
            }
        }
    })
}
