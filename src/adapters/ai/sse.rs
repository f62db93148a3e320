//! Incremental Server-Sent Events decoder.
//!
//! Network chunks do not align with event boundaries, so bytes are buffered
//! until a blank line terminates a frame.

/// One decoded SSE frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, if any.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
}

/// Buffers bytes and yields complete frames.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(frame) = parse_block(&block[..end]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flushes a trailing frame that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let block = std::mem::take(&mut self.buffer);
        parse_block(&block)
    }
}

fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &[u8]) -> Option<SseFrame> {
    let text = String::from_utf8_lossy(block);
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if event.is_none() && data.is_empty() {
        return None;
    }
    Some(SseFrame {
        event,
        data: data.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_complete_frame() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"event: thread.run.created\ndata: {\"id\":\"run_1\"}\n\n");

        assert_eq!(
            frames,
            vec![SseFrame {
                event: Some("thread.run.created".to_string()),
                data: r#"{"id":"run_1"}"#.to_string(),
            }]
        );
    }

    #[test]
    fn buffers_frames_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: done\nda").is_empty());
        let frames = decoder.push(b"ta: [DONE]\n\nevent: ping");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("done"));
        assert_eq!(frames[0].data, "[DONE]");

        let trailing = decoder.finish().unwrap();
        assert_eq!(trailing.event.as_deref(), Some("ping"));
    }

    #[test]
    fn handles_crlf_and_comments() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b": keep-alive\r\n\r\nevent: a\r\ndata: 1\r\ndata: 2\r\n\r\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "1\n2");
    }

    #[test]
    fn multibyte_text_split_mid_character() {
        let payload = "data: héllo\n\n".as_bytes();
        let split = payload.iter().position(|b| *b == 0xc3).unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&payload[..split]).is_empty());
        let frames = decoder.push(&payload[split..]);
        assert_eq!(frames[0].data, "héllo");
    }
}
