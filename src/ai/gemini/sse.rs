//! Server-sent-event framing for `alt=sse` responses.

use futures_util::stream::{self, BoxStream};
use futures_util::TryStreamExt;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::io::StreamReader;

/// Upper bounds on a single line and a single event payload.
///
/// Gemini puts a whole base64 image on one `data:` line, so the defaults
/// leave room for multi-megabyte images.
#[derive(Debug, Clone, Copy)]
pub struct SseLimits {
    pub max_line_bytes: usize,
    pub max_event_bytes: usize,
}

impl Default for SseLimits {
    fn default() -> Self {
        Self {
            max_line_bytes: 32 * 1024 * 1024,
            max_event_bytes: 32 * 1024 * 1024,
        }
    }
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Reads one line (newline included) into `out`. Returns `false` at EOF
/// with nothing read.
async fn read_line_limited<R>(
    reader: &mut R,
    out: &mut Vec<u8>,
    max_bytes: usize,
) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    out.clear();

    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(!out.is_empty());
        }

        let newline = buf.iter().position(|b| *b == b'\n');
        let take = newline.map(|pos| pos + 1).unwrap_or(buf.len());

        if out.len().saturating_add(take) > max_bytes {
            return Err(invalid_data(format!("SSE line exceeds {} bytes", max_bytes)));
        }

        out.extend_from_slice(&buf[..take]);
        reader.consume(take);

        if newline.is_some() {
            return Ok(true);
        }
    }
}

async fn next_event<R>(
    reader: &mut R,
    line: &mut Vec<u8>,
    buffer: &mut String,
    limits: SseLimits,
) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buffer.clear();

    loop {
        if !read_line_limited(reader, line, limits.max_line_bytes).await? {
            if buffer.is_empty() || buffer == "[DONE]" {
                return Ok(None);
            }
            return Ok(Some(std::mem::take(buffer)));
        }

        let text = std::str::from_utf8(line)
            .map_err(|e| invalid_data(format!("invalid SSE UTF-8: {}", e)))?;
        let text = text.trim_end_matches(['\r', '\n']);

        if text.is_empty() {
            if buffer.is_empty() {
                continue;
            }
            if buffer == "[DONE]" {
                return Ok(None);
            }
            return Ok(Some(std::mem::take(buffer)));
        }

        if let Some(rest) = text.strip_prefix("data:") {
            let rest = rest.trim_start();
            let separator = usize::from(!buffer.is_empty());
            if buffer.len() + separator + rest.len() > limits.max_event_bytes {
                return Err(invalid_data(format!(
                    "SSE event exceeds {} bytes",
                    limits.max_event_bytes
                )));
            }
            if separator == 1 {
                buffer.push('\n');
            }
            buffer.push_str(rest);
        }
    }
}

/// Yields the `data:` payload of each event. Multi-line payloads are joined
/// with `\n`; other fields (`event:`, `id:`, comments) are ignored. A trailing
/// event without a blank line is still yielded. `[DONE]` ends the stream.
pub fn data_stream<R>(reader: R) -> BoxStream<'static, io::Result<String>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    data_stream_with_limits(reader, SseLimits::default())
}

/// [`data_stream`] with explicit size limits; exceeding one ends the stream
/// with an `InvalidData` error.
pub fn data_stream_with_limits<R>(
    reader: R,
    limits: SseLimits,
) -> BoxStream<'static, io::Result<String>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    Box::pin(stream::try_unfold(
        (reader, Vec::new(), String::new()),
        move |(mut reader, mut line, mut buffer)| async move {
            match next_event(&mut reader, &mut line, &mut buffer, limits).await? {
                Some(data) => Ok(Some((data, (reader, line, buffer)))),
                None => Ok(None),
            }
        },
    ))
}

pub fn data_stream_from_response(
    response: reqwest::Response,
) -> BoxStream<'static, io::Result<String>> {
    let bytes = response.bytes_stream().map_err(io::Error::other);
    data_stream(StreamReader::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    async fn collect(input: &'static str) -> Vec<String> {
        data_stream(input.as_bytes())
            .map(|item| item.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_parses_data_lines() {
        let events = collect(concat!(
            "event: message\n",
            "data: {\"a\":1}\r\n\r\n",
            ": keep-alive\n",
            "data: line1\n",
            "data: line2\n\n",
        ))
        .await;

        assert_eq!(events, vec!["{\"a\":1}", "line1\nline2"]);
    }

    #[tokio::test]
    async fn test_trailing_event_without_blank_line() {
        let events = collect("data: first\n\ndata: last").await;
        assert_eq!(events, vec!["first", "last"]);
    }

    #[tokio::test]
    async fn test_done_marker_ends_stream() {
        let events = collect("data: one\n\ndata: [DONE]\n\ndata: never\n\n").await;
        assert_eq!(events, vec!["one"]);
    }

    #[tokio::test]
    async fn test_oversized_event_is_rejected() {
        let limits = SseLimits {
            max_line_bytes: 1024,
            max_event_bytes: 8,
        };
        let mut events = data_stream_with_limits(
            "data: ok\n\ndata: 0123456789\n\n".as_bytes(),
            limits,
        );

        assert_eq!(events.next().await.unwrap().unwrap(), "ok");
        let err = events.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_unterminated_line_is_bounded() {
        let limits = SseLimits {
            max_line_bytes: 16,
            max_event_bytes: 1024,
        };
        let payload: &'static str = "data: aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let mut events = data_stream_with_limits(payload.as_bytes(), limits);

        let err = events.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("16 bytes"));
    }
}
