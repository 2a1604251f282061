//! Lazy chunk sequence over a response body

use super::decoder::{SseDecoder, SseLine};
use crate::cancel::CancellationToken;
use crate::error::ChatResult;
use crate::http::ByteStream;
use crate::protocol::ChatStreamChunk;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use tracing::debug;

/// Finite, non-restartable sequence of [`ChatStreamChunk`]s.
///
/// The token is checked before every read and before every chunk is handed
/// out, so at most one in-flight read separates a cancel request from the
/// observable stop.
pub struct ChunkStream {
    bytes: ByteStream,
    decoder: SseDecoder,
    pending: VecDeque<ChatStreamChunk>,
    cancel: CancellationToken,
    finished: bool,
    cancelled: bool,
}

impl ChunkStream {
    pub fn new(bytes: ByteStream, cancel: CancellationToken) -> Self {
        Self {
            bytes,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            cancel,
            finished: false,
            cancelled: false,
        }
    }

    /// Next decoded chunk; `None` once the stream ended or was cancelled.
    ///
    /// Read errors are returned once; errors observed after cancellation
    /// are swallowed and the stream reports [`was_cancelled`](Self::was_cancelled).
    pub async fn next_chunk(&mut self) -> Option<ChatResult<ChatStreamChunk>> {
        loop {
            if self.cancelled {
                return None;
            }
            if self.cancel.is_cancelled() {
                debug!("Chunk stream observed cancellation");
                self.stop(true);
                return None;
            }

            if let Some(chunk) = self.pending.pop_front() {
                return Some(Ok(chunk));
            }
            if self.finished {
                return None;
            }

            match self.bytes.next().await {
                Some(Ok(bytes)) => self.absorb(&bytes),
                Some(Err(e)) => {
                    if self.cancel.is_cancelled() {
                        debug!("Read error after cancellation ignored: {}", e);
                        self.stop(true);
                        return None;
                    }
                    self.stop(false);
                    return Some(Err(e));
                }
                None => {
                    if self.decoder.pending_bytes() > 0 {
                        debug!(
                            "Discarding {} bytes of unterminated trailing line",
                            self.decoder.pending_bytes()
                        );
                    }
                    self.finished = true;
                }
            }
        }
    }

    /// True when the sequence stopped because the token was cancelled
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Lines skipped because their payload did not decode
    pub fn malformed_lines(&self) -> usize {
        self.decoder.malformed_lines()
    }

    /// Pull-style adapter over [`next_chunk`](Self::next_chunk)
    pub fn into_stream(self) -> impl Stream<Item = ChatResult<ChatStreamChunk>> + Send {
        futures::stream::unfold(self, |mut chunks| async move {
            chunks.next_chunk().await.map(|item| (item, chunks))
        })
    }

    fn absorb(&mut self, bytes: &[u8]) {
        for line in self.decoder.feed(bytes) {
            match line {
                SseLine::Chunk(chunk) => self.pending.push_back(chunk),
                SseLine::Done => {
                    // Anything after the sentinel is ignored
                    self.finished = true;
                    break;
                }
            }
        }
    }

    fn stop(&mut self, cancelled: bool) {
        self.pending.clear();
        self.finished = true;
        self.cancelled = cancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use bytes::Bytes;

    fn byte_stream(parts: Vec<ChatResult<&'static str>>) -> ByteStream {
        Box::pin(futures::stream::iter(
            parts
                .into_iter()
                .map(|p| p.map(|s| Bytes::from_static(s.as_bytes())))
                .collect::<Vec<_>>(),
        ))
    }

    #[tokio::test]
    async fn test_stops_at_done() {
        let bytes = byte_stream(vec![Ok(concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n",
            "data: [DONE]\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
        ))]);
        let mut chunks = ChunkStream::new(bytes, CancellationToken::new());

        assert_eq!(chunks.next_chunk().await.unwrap().unwrap().content(), "a");
        assert!(chunks.next_chunk().await.is_none());
        assert!(chunks.next_chunk().await.is_none());
        assert!(!chunks.was_cancelled());
    }

    #[tokio::test]
    async fn test_read_error_surfaces_once() {
        let bytes = byte_stream(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n"),
            Err(ChatError::Transport("connection reset".to_string())),
        ]);
        let mut chunks = ChunkStream::new(bytes, CancellationToken::new());

        assert!(chunks.next_chunk().await.unwrap().is_ok());
        assert!(matches!(
            chunks.next_chunk().await,
            Some(Err(ChatError::Transport(_)))
        ));
        assert!(chunks.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn test_read_error_after_cancel_is_swallowed() {
        let token = CancellationToken::new();
        let bytes = byte_stream(vec![Err(ChatError::Transport("aborted".to_string()))]);
        let mut chunks = ChunkStream::new(bytes, token.clone());

        // Cancel lands while the read is in flight
        let reader = token.clone();
        let mut stream = ChunkStream::new(
            Box::pin(futures::stream::once(async move {
                reader.cancel();
                Err::<Bytes, ChatError>(ChatError::Transport("aborted".to_string()))
            })),
            token.clone(),
        );
        assert!(stream.next_chunk().await.is_none());
        assert!(stream.was_cancelled());

        // Token already set: no read is attempted at all
        assert!(chunks.next_chunk().await.is_none());
        assert!(chunks.was_cancelled());
    }

    #[tokio::test]
    async fn test_into_stream_yields_all_chunks() {
        let bytes = byte_stream(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\ndata: {\"choi"),
            Ok("ces\":[{\"delta\":{\"content\":\"y\"}}]}\n"),
        ]);
        let collected: Vec<String> = ChunkStream::new(bytes, CancellationToken::new())
            .into_stream()
            .map(|c| c.unwrap().content())
            .collect()
            .await;
        assert_eq!(collected, vec!["x", "y"]);
    }
}
