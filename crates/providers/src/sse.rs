//! Line framing for server-sent event bodies.
//!
//! Both backends stream `text/event-stream` responses whose lines may be
//! split arbitrarily across network chunks. [`LineBuffer`] reassembles
//! them; each backend interprets the lines itself.

/// Accumulates raw bytes and yields complete, non-empty SSE lines.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buffer: Vec<u8>,
}

/// One meaningful SSE line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseLine {
    /// `event: <name>`
    Event(String),
    /// `data: <payload>`
    Data(String),
}

impl LineBuffer {
    /// Append a chunk and drain every complete line it finished.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<SseLine> {
        self.buffer.extend_from_slice(bytes);

        // Only whole lines are decoded, so a character split across
        // chunks is reassembled before it reaches UTF-8.
        let mut lines = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw);
            if let Some(parsed) = parse_line(line.trim_end_matches(['\r', '\n'])) {
                lines.push(parsed);
            }
        }
        lines
    }
}

fn parse_line(line: &str) -> Option<SseLine> {
    // Blank separators and `:` comments carry nothing.
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    if let Some(name) = line.strip_prefix("event:") {
        return Some(SseLine::Event(name.trim().to_string()));
    }
    line.strip_prefix("data:")
        .map(|data| SseLine::Data(data.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_lines_split_across_chunks() {
        let mut buf = LineBuffer::default();
        assert!(buf.push(b"data: {\"a\"").is_empty());
        let lines = buf.push(b":1}\n\ndata: [DONE]\n");
        assert_eq!(
            lines,
            vec![
                SseLine::Data("{\"a\":1}".into()),
                SseLine::Data("[DONE]".into())
            ]
        );
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let line = "data: 🔥 take\n".as_bytes();
        let mut buf = LineBuffer::default();
        assert!(buf.push(&line[..8]).is_empty());
        let lines = buf.push(&line[8..]);
        assert_eq!(lines, vec![SseLine::Data("🔥 take".into())]);
    }

    #[test]
    fn skips_comments_and_handles_crlf() {
        let mut buf = LineBuffer::default();
        let lines = buf.push(b": keep-alive\r\nevent: message_stop\r\n\r\n");
        assert_eq!(lines, vec![SseLine::Event("message_stop".into())]);
    }
}
