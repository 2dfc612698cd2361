use anyhow::Result;
use bytes::Bytes;

use super::ChatStream;
use super::FrameDecoder;
use crate::domain::models::StreamFrame;

fn frame_bytes(payload: &str) -> String {
    return format!("data: {payload}\n\n");
}

fn decode_all(chunks: Vec<&[u8]>) -> Vec<StreamFrame> {
    let mut decoder = FrameDecoder::default();
    let mut frames = vec![];
    for chunk in chunks {
        frames.extend(decoder.feed(chunk));
    }
    return frames;
}

#[test]
fn it_decodes_a_complete_frame() {
    let body = frame_bytes(r#"{"type":"chunk","content":"X"}"#);
    let frames = decode_all(vec![body.as_bytes()]);
    assert_eq!(frames, vec![StreamFrame::Chunk {
        content: "X".to_string(),
    }]);
}

#[test]
fn it_decodes_frames_split_mid_record() {
    let frames = decode_all(vec![
        b"data: {\"typ",
        b"e\":\"chunk\",\"content\":\"X\"}\n\n",
    ]);
    assert_eq!(frames, vec![StreamFrame::Chunk {
        content: "X".to_string(),
    }]);
}

#[test]
fn it_decodes_frames_split_inside_the_delimiter() {
    let frames = decode_all(vec![
        b"data: {\"type\":\"chunk\",\"content\":\"X\"}\n",
        b"\ndata: {\"type\":\"done\",\"session_id\":42}\n\n",
    ]);
    assert_eq!(frames, vec![
        StreamFrame::Chunk {
            content: "X".to_string(),
        },
        StreamFrame::Done { session_id: 42 },
    ]);
}

#[test]
fn it_is_invariant_under_single_byte_chunking() {
    let body = [
        frame_bytes(r#"{"type":"session","session_id":7}"#),
        frame_bytes(r#"{"type":"chunk","content":"Hi"}"#),
        frame_bytes(r#"{"type":"chunk","content":" there"}"#),
        frame_bytes(r#"{"type":"done","session_id":7}"#),
    ]
    .join("");

    let unsplit = decode_all(vec![body.as_bytes()]);

    let mut decoder = FrameDecoder::default();
    let mut byte_by_byte = vec![];
    for byte in body.as_bytes() {
        byte_by_byte.extend(decoder.feed(std::slice::from_ref(byte)));
    }

    assert_eq!(unsplit, byte_by_byte);
    assert_eq!(unsplit.len(), 4);
}

#[test]
fn it_survives_chunk_boundaries_inside_multibyte_characters() {
    let body = frame_bytes(r#"{"type":"chunk","content":"héllo ✓"}"#);
    let bytes = body.as_bytes();

    let mut decoder = FrameDecoder::default();
    let mut frames = vec![];
    for byte in bytes {
        frames.extend(decoder.feed(std::slice::from_ref(byte)));
    }

    assert_eq!(frames, vec![StreamFrame::Chunk {
        content: "héllo ✓".to_string(),
    }]);
}

#[test]
fn it_skips_malformed_frames_without_aborting() {
    let body = [
        frame_bytes(r#"{"type":"chunk","content":"A"}"#),
        "data: {not json}\n\n".to_string(),
        frame_bytes(r#"{"type":"chunk","content":"B"}"#),
    ]
    .join("");

    let frames = decode_all(vec![body.as_bytes()]);
    assert_eq!(frames, vec![
        StreamFrame::Chunk {
            content: "A".to_string(),
        },
        StreamFrame::Chunk {
            content: "B".to_string(),
        },
    ]);
}

#[test]
fn it_skips_frames_without_a_data_field() {
    let body = [
        ": keep-alive\n\n".to_string(),
        frame_bytes(r#"{"type":"chunk","content":"A"}"#),
    ]
    .join("");

    let frames = decode_all(vec![body.as_bytes()]);
    assert_eq!(frames, vec![StreamFrame::Chunk {
        content: "A".to_string(),
    }]);
}

#[test]
fn it_retains_the_trailing_fragment() {
    let mut decoder = FrameDecoder::default();
    let frames = decoder.feed(b"data: {\"type\":\"chunk\",\"content\":\"A\"}");
    assert!(frames.is_empty());

    let frames = decoder.feed(b"\n\n");
    assert_eq!(frames, vec![StreamFrame::Chunk {
        content: "A".to_string(),
    }]);
}

#[tokio::test]
async fn it_pulls_frames_until_stream_closure() -> Result<()> {
    let chunks: Vec<Result<Bytes, reqwest::Error>> = vec![
        Ok(Bytes::from(frame_bytes(r#"{"type":"chunk","content":"Hi"}"#))),
        Ok(Bytes::from(frame_bytes(r#"{"type":"done","session_id":3}"#))),
    ];

    let mut stream = ChatStream::new(futures::stream::iter(chunks));

    assert_eq!(
        stream.next_frame().await?,
        Some(StreamFrame::Chunk {
            content: "Hi".to_string(),
        })
    );
    assert_eq!(
        stream.next_frame().await?,
        Some(StreamFrame::Done { session_id: 3 })
    );
    assert_eq!(stream.next_frame().await?, None);
    // Closed streams stay closed.
    assert_eq!(stream.next_frame().await?, None);

    return Ok(());
}

#[tokio::test]
async fn it_reports_closure_without_a_terminal_frame() -> Result<()> {
    let chunks: Vec<Result<Bytes, reqwest::Error>> = vec![Ok(Bytes::from(frame_bytes(
        r#"{"type":"chunk","content":"partial"}"#,
    )))];

    let mut stream = ChatStream::new(futures::stream::iter(chunks));

    assert!(stream.next_frame().await?.is_some());
    assert_eq!(stream.next_frame().await?, None);

    return Ok(());
}

#[test]
fn it_marks_terminal_frames() {
    assert!(StreamFrame::Done { session_id: 1 }.is_terminal());
    assert!(StreamFrame::Error {
        error: "boom".to_string(),
    }
    .is_terminal());
    assert!(!StreamFrame::Session { session_id: 1 }.is_terminal());
    assert!(!StreamFrame::Chunk {
        content: "".to_string(),
    }
    .is_terminal());
}
