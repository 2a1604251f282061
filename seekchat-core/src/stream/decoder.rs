//! Line framing for `text/event-stream` chat responses

use crate::protocol::ChatStreamChunk;
use tracing::warn;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// A meaningful line produced by [`SseDecoder::feed`]
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// A decoded `data:` payload
    Chunk(ChatStreamChunk),
    /// The `[DONE]` sentinel
    Done,
}

/// Incremental decoder from raw response bytes to stream chunks.
///
/// Bytes are buffered until a `\n` arrives; the trailing incomplete segment
/// stays in the buffer. Splitting happens on bytes, before UTF-8 decoding,
/// so characters cut across reads are reassembled intact.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    malformed: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one read and decode every line it completes
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseLine> {
        // The retained segment holds no newline, so only the new bytes need scanning
        let scan_from = self.buffer.len();
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut cursor = scan_from;
        while let Some(offset) = self.buffer[cursor..].iter().position(|b| *b == b'\n') {
            let end = cursor + offset;
            let raw = &self.buffer[start..end];
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = String::from_utf8_lossy(raw).into_owned();
            if let Some(decoded) = self.decode_line(&line) {
                lines.push(decoded);
            }
            start = end + 1;
            cursor = start;
        }
        self.buffer.drain(..start);

        lines
    }

    /// Bytes of the incomplete trailing segment
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Number of `data:` lines skipped because they did not decode
    pub fn malformed_lines(&self) -> usize {
        self.malformed
    }

    fn decode_line(&mut self, line: &str) -> Option<SseLine> {
        // Comments, `event:` fields and blank separators carry no payload
        let payload = line.strip_prefix(DATA_PREFIX)?;

        if payload.trim() == DONE_SENTINEL {
            return Some(SseLine::Done);
        }

        if payload.trim().is_empty() {
            self.malformed += 1;
            warn!("Skipping stream line with empty payload");
            return None;
        }

        match serde_json::from_str::<ChatStreamChunk>(payload) {
            Ok(chunk) => Some(SseLine::Chunk(chunk)),
            Err(e) => {
                self.malformed += 1;
                warn!("Failed to parse stream chunk: {} ({})", e, payload);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(lines: &[SseLine]) -> Vec<String> {
        lines
            .iter()
            .filter_map(|l| match l {
                SseLine::Chunk(c) => Some(c.content()),
                SseLine::Done => None,
            })
            .collect()
    }

    #[test]
    fn test_incomplete_line_is_retained() {
        let mut decoder = SseDecoder::new();
        let lines = decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}");
        assert!(lines.is_empty());
        assert!(decoder.pending_bytes() > 0);

        let lines = decoder.feed(b"\n");
        assert_eq!(contents(&lines), vec!["Hi"]);
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn test_done_sentinel() {
        let mut decoder = SseDecoder::new();
        let lines = decoder.feed(b"data: [DONE]\n");
        assert_eq!(lines, vec![SseLine::Done]);

        let lines = decoder.feed(b"data:  [DONE]  \r\n");
        assert_eq!(lines, vec![SseLine::Done]);
    }

    #[test]
    fn test_non_data_lines_are_ignored() {
        let mut decoder = SseDecoder::new();
        let lines = decoder.feed(b": keep-alive\n\nevent: message\nretry: 10\n");
        assert!(lines.is_empty());
        assert_eq!(decoder.malformed_lines(), 0);
    }

    #[test]
    fn test_empty_payload_is_malformed() {
        let mut decoder = SseDecoder::new();
        let lines = decoder.feed(b"data: \ndata:    \n");
        assert!(lines.is_empty());
        assert_eq!(decoder.malformed_lines(), 2);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut decoder = SseDecoder::new();
        let lines = decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\r\n\r\n");
        assert_eq!(contents(&lines), vec!["a"]);
    }

    #[test]
    fn test_multibyte_character_split_across_reads() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"你好\"}}]}\n".as_bytes();
        let split = line.iter().position(|b| *b >= 0x80).unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(&line[..split]).is_empty());
        let lines = decoder.feed(&line[split..]);
        assert_eq!(contents(&lines), vec!["你好"]);
    }

    #[test]
    fn test_long_line_in_small_reads() {
        let text = "x".repeat(4096);
        let line = format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{}\"}}}}]}}\ndata: [DONE]\n",
            text
        );

        let mut decoder = SseDecoder::new();
        let mut lines = Vec::new();
        for part in line.as_bytes().chunks(3) {
            lines.extend(decoder.feed(part));
        }

        assert_eq!(contents(&lines), vec![text]);
        assert_eq!(lines.last(), Some(&SseLine::Done));
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn test_several_lines_in_one_read_after_partial() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]").is_empty());

        let lines = decoder.feed(b"}\ndata: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\ndata: [DO");
        assert_eq!(contents(&lines), vec!["a", "b"]);
        assert_eq!(decoder.pending_bytes(), "data: [DO".len());
    }
}
