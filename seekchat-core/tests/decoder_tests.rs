//! Property and scenario tests for the event-stream decoder

use proptest::prelude::*;
use seekchat_core::stream::{SseDecoder, SseLine};
use serde_json::json;

fn data_line(content: &str) -> String {
    format!(
        "data: {}\n",
        json!({"choices": [{"index": 0, "delta": {"content": content}}]})
    )
}

fn decode_in_reads(bytes: &[u8], cuts: &[usize]) -> Vec<SseLine> {
    let mut decoder = SseDecoder::new();
    let mut lines = Vec::new();
    let mut start = 0;
    for &cut in cuts {
        lines.extend(decoder.feed(&bytes[start..cut]));
        start = cut;
    }
    lines.extend(decoder.feed(&bytes[start..]));
    lines
}

fn texts(lines: &[SseLine]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|l| match l {
            SseLine::Chunk(c) => Some(c.content()),
            SseLine::Done => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn split_line_decodes_like_single_read(
        content in "[a-zA-Z0-9 .,!?éü你好🙂]{0,32}",
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let line = data_line(&content);
        let bytes = line.as_bytes();

        let mut cuts = vec![a.index(bytes.len() + 1), b.index(bytes.len() + 1)];
        cuts.sort_unstable();

        let whole = SseDecoder::new().feed(bytes);
        let split = decode_in_reads(bytes, &cuts);

        prop_assert_eq!(texts(&whole), vec![content]);
        prop_assert_eq!(whole, split);
    }

    #[test]
    fn separate_decoders_agree(contents in prop::collection::vec("[a-z ]{0,12}", 0..8)) {
        let body: String = contents.iter().map(|c| data_line(c)).collect();

        let first = SseDecoder::new().feed(body.as_bytes());
        let second = SseDecoder::new().feed(body.as_bytes());

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(texts(&first), contents);
    }

    #[test]
    fn byte_at_a_time_matches_single_read(contents in prop::collection::vec("[a-z你]{1,6}", 1..5)) {
        let body: String = contents.iter().map(|c| data_line(c)).collect();
        let cuts: Vec<usize> = (1..body.len()).collect();

        prop_assert_eq!(
            decode_in_reads(body.as_bytes(), &cuts),
            SseDecoder::new().feed(body.as_bytes())
        );
    }
}

#[test]
fn test_sentinel_produces_no_chunk() {
    let mut decoder = SseDecoder::new();
    let lines = decoder.feed(format!("{}data: [DONE]\n", data_line("last")).as_bytes());

    assert_eq!(lines.len(), 2);
    assert_eq!(texts(&lines), vec!["last"]);
    assert_eq!(lines[1], SseLine::Done);
}

#[test]
fn test_malformed_line_between_valid_lines() {
    let body = format!(
        "{}data: {{\"choices\": [\n{}",
        data_line("before"),
        data_line("after")
    );
    let mut decoder = SseDecoder::new();
    let lines = decoder.feed(body.as_bytes());

    assert_eq!(texts(&lines), vec!["before", "after"]);
    assert_eq!(decoder.malformed_lines(), 1);
}

#[test]
fn test_trailing_partial_line_is_not_decoded() {
    let line = data_line("tail");
    let trimmed = line.trim_end_matches('\n');

    let mut decoder = SseDecoder::new();
    assert!(decoder.feed(trimmed.as_bytes()).is_empty());
    assert_eq!(decoder.pending_bytes(), trimmed.len());
}

#[test]
fn test_deepseek_keep_alive_comments() {
    let body = format!(": keep-alive\n\n{}\n", data_line("x"));
    let lines = SseDecoder::new().feed(body.as_bytes());
    assert_eq!(texts(&lines), vec!["x"]);
}
