use encoding_rs::{CoderResult, Decoder, UTF_8};
use futures_util::StreamExt;
use notes_logging::{notes_debug, notes_info, notes_trace};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::client::map_reqwest_error;
use crate::{JobStatus, ServiceClient, ServiceError, StatusEvent, StreamEnd};

/// Marker of a significant record on the status stream.
pub const DATA_PREFIX: &str = "data:";

/// Longest unterminated fragment kept between reads.
pub const MAX_PENDING_LEN: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct StatusRecord {
    status: JobStatus,
}

/// Incremental UTF-8 line splitter.
///
/// Bytes are decoded with a streaming decoder, so a multi-byte character split
/// across two reads is joined, and the unterminated tail is kept until the
/// next read completes it. A fragment longer than [`MAX_PENDING_LEN`] is
/// dropped together with the rest of its line.
pub struct RecordDecoder {
    decoder: Decoder,
    pending: String,
    /// Skipping the remainder of an oversized line.
    discarding: bool,
}

impl Default for RecordDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder(),
            pending: String::new(),
            discarding: false,
        }
    }

    /// Feeds one read and returns every line it completed, without terminators.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode(chunk, false);
        let lines = self.drain_lines();
        if self.pending.len() > MAX_PENDING_LEN {
            notes_trace!("Dropping unterminated record of {} bytes", self.pending.len());
            self.pending.clear();
            self.discarding = true;
        }
        lines
    }

    /// Flushes the decoder at end of stream and returns the unterminated tail.
    /// The decoder is reset afterwards and can be reused.
    pub fn finish(&mut self) -> Option<String> {
        self.decode(&[], true);
        self.decoder = UTF_8.new_decoder();
        let tail = std::mem::take(&mut self.pending);
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        (!tail.trim().is_empty()).then_some(tail)
    }

    /// Bytes of the unterminated tail currently buffered.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn decode(&mut self, mut input: &[u8], last: bool) {
        loop {
            if let Some(needed) = self.decoder.max_utf8_buffer_length(input.len()) {
                self.pending.reserve(needed);
            }
            let (result, read, _replaced) =
                self.decoder.decode_to_string(input, &mut self.pending, last);
            input = &input[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let mut line: String = self.pending.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            if std::mem::take(&mut self.discarding) {
                notes_trace!("Dropping tail of oversized record ({} bytes)", line.len());
                continue;
            }
            lines.push(line);
        }
        lines
    }
}

/// Status carried by one record, or `None` for comments, blank lines and
/// malformed payloads.
pub fn parse_record(line: &str) -> Option<JobStatus> {
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    match serde_json::from_str::<StatusRecord>(payload) {
        Ok(record) => Some(record.status),
        Err(err) => {
            notes_trace!("Dropping malformed status record {:?}: {}", payload, err);
            None
        }
    }
}

/// Reads `GET /notes/{video_id}/events` until a terminal status arrives.
#[derive(Clone)]
pub struct EventStreamConsumer {
    client: ServiceClient,
}

impl EventStreamConsumer {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// Forwards every parsed status to `on_status` in arrival order.
    ///
    /// Returns once a terminal status was forwarded, the producer closed the
    /// stream, or `cancel` fired. The connection is dropped on every exit path.
    pub async fn consume<F>(
        &self,
        video_id: &str,
        cancel: &CancellationToken,
        mut on_status: F,
    ) -> Result<StreamEnd, ServiceError>
    where
        F: FnMut(StatusEvent) + Send,
    {
        let url = self.client.job_endpoint(video_id, "events")?;
        let request = self.client.get(url);
        let response = tokio::select! {
            _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
            response = self.client.open_stream(request) => response?,
        };
        notes_info!("Status stream open video_id={}", video_id);

        let mut body = response.bytes_stream();
        let mut decoder = RecordDecoder::new();
        let mut forward = |line: &str| -> Option<JobStatus> {
            let status = parse_record(line)?;
            notes_debug!("Status video_id={} status={}", video_id, status);
            on_status(StatusEvent {
                video_id: video_id.to_string(),
                status: status.clone(),
            });
            status.is_terminal().then_some(status)
        };

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    notes_info!("Status stream cancelled video_id={}", video_id);
                    return Ok(StreamEnd::Cancelled);
                }
                next = body.next() => next,
            };
            let chunk = match next {
                Some(chunk) => chunk.map_err(map_reqwest_error)?,
                None => {
                    if let Some(status) = decoder.finish().and_then(|tail| forward(&tail)) {
                        return Ok(StreamEnd::Terminal(status));
                    }
                    notes_info!(
                        "Status stream closed without terminal status video_id={}",
                        video_id
                    );
                    return Ok(StreamEnd::Closed);
                }
            };
            for line in decoder.feed(&chunk) {
                if let Some(status) = forward(&line) {
                    notes_info!("Status stream finished video_id={} status={}", video_id, status);
                    return Ok(StreamEnd::Terminal(status));
                }
            }
        }
    }
}
